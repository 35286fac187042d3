//! Reader for the GDML geometry description format.
//!
//! A [`GdmlDocument`] is parsed in one pass into an owned description:
//! constants are evaluated, references are checked, and shapes are
//! validated. [`GdmlDocument::build`] then installs the volumes of a chosen
//! setup into a [`GeometryStore`].
//!
//! Names carrying a pointer suffix such as `World0x7f3a9c` (as written by
//! exporters) are kept verbatim in the document, where references resolve.
//! Objects placed in the store get the stripped name `World` unless another
//! object of the same kind already has it.

mod evaluator;
mod materials;
mod solids;
mod structure;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use glam::{DQuat, DVec3};
use roxmltree::Node;

use crate::error::{GeometryError, Result};
use crate::store::GeometryStore;
use crate::volume::{PhysicalVolume, PhysicalVolumeId, VisAttributes};

pub use evaluator::{Evaluator, G_PER_CM3};
pub use materials::{is_known_material, Component, Material, MaterialKind, NIST_PREFIX};
pub use solids::{SolidDef, SolidKind};
pub use structure::{PhysvolDef, Setup, VolumeDef};

/// Name of the setup used when none is configured.
pub const DEFAULT_SETUP: &str = "Default";

/// Strips an exporter pointer suffix (`0x` followed by hex digits).
pub fn strip_pointer(name: &str) -> &str {
    match name.rfind("0x") {
        Some(pos)
            if pos > 0
                && name.len() > pos + 2
                && name[pos + 2..].bytes().all(|b| b.is_ascii_hexdigit()) =>
        {
            &name[..pos]
        }
        _ => name,
    }
}

/// Placement rotation for GDML frame angles.
///
/// GDML rotations describe the frame: X first, then Y, then Z. Volumes are
/// placed with the inverse.
pub fn placement_rotation(angles: DVec3) -> DQuat {
    let frame = DQuat::from_rotation_z(angles.z)
        * DQuat::from_rotation_y(angles.y)
        * DQuat::from_rotation_x(angles.x);
    frame.inverse()
}

/// Evaluation state shared by the section readers.
#[derive(Debug, Default)]
pub(crate) struct Context {
    pub evaluator: Evaluator,
    pub positions: HashMap<String, DVec3>,
    pub rotations: HashMap<String, DVec3>,
}

impl Context {
    /// Reads a required attribute.
    pub fn attr<'a>(node: Node<'a, '_>, attribute: &str) -> Result<&'a str> {
        node.attribute(attribute)
            .ok_or_else(|| GeometryError::MissingAttribute {
                element: node.tag_name().name().to_string(),
                attribute: attribute.to_string(),
            })
    }

    /// Reads a name-valued attribute as written.
    pub fn name_attr(node: Node<'_, '_>, attribute: &str) -> Result<String> {
        Self::attr(node, attribute).map(str::to_string)
    }

    /// Evaluates an optional numeric attribute.
    pub fn eval_opt(&self, node: Node<'_, '_>, attribute: &str) -> Result<Option<f64>> {
        node.attribute(attribute)
            .map(|expression| self.evaluator.evaluate(expression))
            .transpose()
    }

    /// Evaluates a required numeric attribute.
    pub fn eval(&self, node: Node<'_, '_>, attribute: &str) -> Result<f64> {
        self.evaluator.evaluate(Self::attr(node, attribute)?)
    }

    /// Evaluates the unit attribute, falling back to `default`.
    pub fn unit(&self, node: Node<'_, '_>, attribute: &str, default: &str) -> Result<f64> {
        self.evaluator
            .evaluate(node.attribute(attribute).unwrap_or(default))
    }

    /// Reads `x`, `y`, `z` scaled by the element's `unit`.
    pub fn vector(&self, node: Node<'_, '_>, default_unit: &str) -> Result<DVec3> {
        let unit = self.unit(node, "unit", default_unit)?;
        let component = |axis| Ok::<_, GeometryError>(self.eval_opt(node, axis)?.unwrap_or(0.0));
        Ok(DVec3::new(component("x")?, component("y")?, component("z")?) * unit)
    }

    /// Resolves an inline `<position>` or a `<positionref>` child.
    pub fn placement_position(&self, parent: Node<'_, '_>) -> Result<DVec3> {
        self.child_vector(parent, "position", "positionref", "mm", &self.positions, "position")
    }

    /// Resolves an inline `<rotation>` or a `<rotationref>` child to angles.
    pub fn placement_angles(&self, parent: Node<'_, '_>) -> Result<DVec3> {
        self.child_vector(parent, "rotation", "rotationref", "rad", &self.rotations, "rotation")
    }

    fn child_vector(
        &self,
        parent: Node<'_, '_>,
        inline: &str,
        reference: &str,
        default_unit: &str,
        defined: &HashMap<String, DVec3>,
        kind: &'static str,
    ) -> Result<DVec3> {
        for child in parent.children().filter(Node::is_element) {
            let tag = child.tag_name().name();
            if tag == inline {
                return self.vector(child, default_unit);
            }
            if tag == reference {
                let name = Self::name_attr(child, "ref")?;
                return defined
                    .get(&name)
                    .copied()
                    .ok_or(GeometryError::UndefinedReference { kind, name });
            }
        }
        Ok(DVec3::ZERO)
    }

    fn read_defines(&mut self, section: Node<'_, '_>) -> Result<()> {
        for node in section.children().filter(Node::is_element) {
            let name = Self::name_attr(node, "name")?;
            match node.tag_name().name() {
                "constant" | "variable" => {
                    let value = self.eval(node, "value")?;
                    self.evaluator.define(&name, value)?;
                }
                "quantity" => {
                    let value = self.eval(node, "value")? * self.unit(node, "unit", "1")?;
                    self.evaluator.define(&name, value)?;
                }
                "position" => {
                    let position = self.vector(node, "mm")?;
                    insert_unique(&mut self.positions, "position", name, position)?;
                }
                "rotation" => {
                    let angles = self.vector(node, "rad")?;
                    insert_unique(&mut self.rotations, "rotation", name, angles)?;
                }
                other => log::debug!("ignoring <{other}> in <define>"),
            }
        }
        Ok(())
    }
}

fn insert_unique<V>(
    map: &mut HashMap<String, V>,
    kind: &'static str,
    name: String,
    value: V,
) -> Result<()> {
    if map.contains_key(&name) {
        return Err(GeometryError::DuplicateName { kind, name });
    }
    map.insert(name, value);
    Ok(())
}

/// Store names for the document names of one kind of object.
#[derive(Debug, Clone, Default)]
pub struct StoreNames(HashMap<String, String>);

impl StoreNames {
    /// Assigns stripped names, keeping the suffix where stripping collides.
    ///
    /// Names without a suffix are reserved first so they never change.
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let names: Vec<&str> = names.into_iter().collect();
        let mut taken: HashSet<&str> = names
            .iter()
            .copied()
            .filter(|name| strip_pointer(name) == *name)
            .collect();
        let mut assigned = HashMap::new();
        for name in names {
            let stripped = strip_pointer(name);
            if stripped == name {
                continue;
            }
            let store_name = if taken.insert(stripped) {
                stripped
            } else {
                log::debug!("keeping '{name}': '{stripped}' is already taken");
                name
            };
            assigned.insert(name.to_string(), store_name.to_string());
        }
        Self(assigned)
    }

    /// The store name for a document name.
    pub fn get<'a>(&'a self, name: &'a str) -> &'a str {
        self.0.get(name).map_or(name, String::as_str)
    }
}

/// A parsed GDML document.
#[derive(Debug, Clone, Default)]
pub struct GdmlDocument {
    materials: Vec<Material>,
    solids: Vec<SolidDef>,
    volumes: Vec<VolumeDef>,
    setups: Vec<Setup>,
}

impl GdmlDocument {
    /// Parses a GDML document from text.
    pub fn parse_str(text: &str) -> Result<Self> {
        let xml = roxmltree::Document::parse(text)?;
        let root = xml.root_element();
        if root.tag_name().name() != "gdml" {
            return Err(GeometryError::NotGdml(root.tag_name().name().to_string()));
        }

        let mut context = Context::default();
        let mut document = Self::default();
        for section in root.children().filter(Node::is_element) {
            match section.tag_name().name() {
                "define" => context.read_defines(section)?,
                "materials" => {
                    materials::read_materials(&context, section, &mut document.materials)?;
                }
                "solids" => solids::read_solids(&context, section, &mut document.solids)?,
                "structure" => structure::read_structure(
                    &context,
                    section,
                    &document.materials,
                    &document.solids,
                    &mut document.volumes,
                )?,
                "setup" => {
                    let setup = structure::read_setup(section, &document.volumes)?;
                    document.setups.push(setup);
                }
                other => log::debug!("ignoring GDML section <{other}>"),
            }
        }
        Ok(document)
    }

    /// Reads and parses a GDML file.
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GeometryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = Self::parse_str(&text)?;
        log::info!(
            "read '{}': {} materials, {} solids, {} volumes, {} setups",
            path.display(),
            document.materials.len(),
            document.solids.len(),
            document.volumes.len(),
            document.setups.len()
        );
        Ok(document)
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn solids(&self) -> &[SolidDef] {
        &self.solids
    }

    pub fn volumes(&self) -> &[VolumeDef] {
        &self.volumes
    }

    pub fn setups(&self) -> &[Setup] {
        &self.setups
    }

    /// Finds the setup to build.
    ///
    /// An absent `"Default"` setup falls back to the first one declared.
    pub fn select_setup(&self, name: &str) -> Result<&Setup> {
        if let Some(setup) = self.setups.iter().find(|s| s.name == name) {
            return Ok(setup);
        }
        if name == DEFAULT_SETUP {
            return self.setups.first().ok_or(GeometryError::NoSetup);
        }
        Err(GeometryError::SetupNotFound(name.to_string()))
    }

    /// Installs every solid and volume into `store` and places the world of
    /// the selected setup.
    ///
    /// The world logical volume is marked invisible.
    pub fn build(&self, store: &mut GeometryStore, setup_name: &str) -> Result<PhysicalVolumeId> {
        let setup = self.select_setup(setup_name)?;
        let solid_names = StoreNames::new(self.solids.iter().map(|s| s.name.as_str()));
        let volume_names = StoreNames::new(self.volumes.iter().map(|v| v.name.as_str()));

        for def in &self.solids {
            let solid = def.resolve(store, &solid_names)?;
            store.add_solid(solid)?;
        }
        for def in &self.volumes {
            def.install(store, &solid_names, &volume_names)?;
        }

        let world_name = volume_names.get(&setup.world);
        let world_lv = store
            .find_logical_volume(world_name)
            .ok_or_else(|| GeometryError::UndefinedReference {
                kind: "volume",
                name: setup.world.clone(),
            })?;
        store
            .logical_volume_mut(world_lv)
            .set_vis_attributes(Some(VisAttributes::invisible()));
        let world = store.add_physical_volume(PhysicalVolume::world(world_name.to_string(), world_lv));
        log::debug!("placed world '{world_name}' from setup '{}'", setup.name);
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_pointer() {
        assert_eq!(strip_pointer("World0x7f3a9c"), "World");
        assert_eq!(strip_pointer("World"), "World");
        assert_eq!(strip_pointer("Box0x"), "Box0x");
        assert_eq!(strip_pointer("0x12"), "0x12");
        assert_eq!(strip_pointer("Det0xzz"), "Det0xzz");
    }

    #[test]
    fn test_placement_rotation_inverts_frame() {
        let angles = DVec3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        let rotated = placement_rotation(angles) * DVec3::X;
        assert!((rotated - DVec3::new(0.0, -1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_rejects_non_gdml_root() {
        let err = GdmlDocument::parse_str("<scene/>").unwrap_err();
        assert!(matches!(err, GeometryError::NotGdml(tag) if tag == "scene"));
    }

    #[test]
    fn test_malformed_xml() {
        let err = GdmlDocument::parse_str("<gdml><define></gdml>").unwrap_err();
        assert!(matches!(err, GeometryError::Xml(_)));
    }

    #[test]
    fn test_defines() {
        let text = r#"<gdml>
            <define>
                <constant name="HALF" value="5"/>
                <quantity name="len" value="2*HALF" unit="cm"/>
                <position name="p0x1f" x="1" y="2" z="len" unit="mm"/>
                <rotation name="r" z="90" unit="deg"/>
            </define>
        </gdml>"#;
        let xml = roxmltree::Document::parse(text).unwrap();
        let mut context = Context::default();
        let define = xml.root_element().first_element_child().unwrap();
        context.read_defines(define).unwrap();
        assert_eq!(context.evaluator.get("len"), Some(100.0));
        assert!(!context.positions.contains_key("p"));
        assert_eq!(context.positions["p0x1f"], DVec3::new(1.0, 2.0, 100.0));
        assert!((context.rotations["r"].z - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_position() {
        let text = r#"<gdml><define>
            <position name="p" x="1"/>
            <position name="p" x="2"/>
        </define></gdml>"#;
        let err = GdmlDocument::parse_str(text).unwrap_err();
        assert!(matches!(err, GeometryError::DuplicateName { kind: "position", .. }));
    }

    #[test]
    fn test_store_names() {
        let names = StoreNames::new(["Layer0x1a", "Layer0x2b", "Box0x3c", "Box", "Plain"]);
        assert_eq!(names.get("Layer0x1a"), "Layer");
        assert_eq!(names.get("Layer0x2b"), "Layer0x2b");
        assert_eq!(names.get("Box0x3c"), "Box0x3c");
        assert_eq!(names.get("Box"), "Box");
        assert_eq!(names.get("Plain"), "Plain");
    }
}
