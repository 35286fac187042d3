//! The `<structure>` and `<setup>` sections.

use glam::{DQuat, DVec3};
use roxmltree::Node;

use super::materials::{is_known_material, Material};
use super::solids::SolidDef;
use super::{placement_rotation, strip_pointer, Context, StoreNames};
use crate::error::{GeometryError, Result};
use crate::store::GeometryStore;
use crate::volume::{LogicalVolume, PhysicalVolume};

/// A daughter placement inside a volume.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysvolDef {
    pub name: String,
    pub volume: String,
    pub translation: DVec3,
    pub rotation: DQuat,
    pub copy_number: i32,
}

/// A `<volume>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeDef {
    pub name: String,
    pub solid: String,
    pub material: String,
    pub physvols: Vec<PhysvolDef>,
}

impl VolumeDef {
    /// Adds the logical volume and its daughter placements to `store`.
    ///
    /// Daughter volumes must already be in the store. `solids` and `volumes`
    /// map document names to store names.
    pub fn install(
        &self,
        store: &mut GeometryStore,
        solids: &StoreNames,
        volumes: &StoreNames,
    ) -> Result<()> {
        let solid = store
            .find_solid(solids.get(&self.solid))
            .ok_or_else(|| GeometryError::UndefinedReference {
                kind: "solid",
                name: self.solid.clone(),
            })?;
        let mother = store.add_logical_volume(LogicalVolume::new(
            volumes.get(&self.name).to_string(),
            solid,
            strip_pointer(&self.material).to_string(),
        ))?;

        for physvol in &self.physvols {
            let daughter = store
                .find_logical_volume(volumes.get(&physvol.volume))
                .ok_or_else(|| GeometryError::UndefinedReference {
                    kind: "volume",
                    name: physvol.volume.clone(),
                })?;
            store.add_physical_volume(PhysicalVolume::placement(
                physvol.name.clone(),
                daughter,
                mother,
                physvol.translation,
                physvol.rotation,
                physvol.copy_number,
            ));
        }
        Ok(())
    }
}

/// A `<setup>` element naming a world volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup {
    pub name: String,
    pub world: String,
}

pub(crate) fn read_structure(
    context: &Context,
    section: Node<'_, '_>,
    materials: &[Material],
    solids: &[SolidDef],
    out: &mut Vec<VolumeDef>,
) -> Result<()> {
    for node in section.children().filter(Node::is_element) {
        if !node.has_tag_name("volume") {
            log::debug!("ignoring <{}> in <structure>", node.tag_name().name());
            continue;
        }
        let volume = read_volume(context, node, materials, solids, out)?;
        if out.iter().any(|v| v.name == volume.name) {
            return Err(GeometryError::DuplicateName {
                kind: "volume",
                name: volume.name,
            });
        }
        out.push(volume);
    }
    Ok(())
}

fn child_ref(node: Node<'_, '_>, tag: &str) -> Result<String> {
    let child = node
        .children()
        .find(|c| c.has_tag_name(tag))
        .ok_or_else(|| GeometryError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute: tag.to_string(),
        })?;
    Context::name_attr(child, "ref")
}

fn read_volume(
    context: &Context,
    node: Node<'_, '_>,
    materials: &[Material],
    solids: &[SolidDef],
    declared: &[VolumeDef],
) -> Result<VolumeDef> {
    let name = Context::name_attr(node, "name")?;

    let material = child_ref(node, "materialref")?;
    if !is_known_material(materials, &material) {
        return Err(GeometryError::UndefinedReference {
            kind: "material",
            name: material,
        });
    }
    let solid = child_ref(node, "solidref")?;
    if !solids.iter().any(|s| s.name == solid) {
        return Err(GeometryError::UndefinedReference {
            kind: "solid",
            name: solid,
        });
    }

    let mut physvols = Vec::new();
    for child in node.children().filter(|c| c.has_tag_name("physvol")) {
        let volume = child_ref(child, "volumeref")?;
        if !declared.iter().any(|v| v.name == volume) {
            return Err(GeometryError::UndefinedReference {
                kind: "volume",
                name: volume,
            });
        }
        let copy_number = match context.eval_opt(child, "copynumber")? {
            #[allow(clippy::cast_possible_truncation)]
            Some(n) => n as i32,
            None => 0,
        };
        let name = child.attribute("name").map_or_else(
            || format!("{}_PV", strip_pointer(&volume)),
            |n| strip_pointer(n).to_string(),
        );
        physvols.push(PhysvolDef {
            name,
            volume,
            translation: context.placement_position(child)?,
            rotation: placement_rotation(context.placement_angles(child)?),
            copy_number,
        });
    }

    Ok(VolumeDef {
        name,
        solid,
        material,
        physvols,
    })
}

pub(crate) fn read_setup(node: Node<'_, '_>, volumes: &[VolumeDef]) -> Result<Setup> {
    let name = Context::attr(node, "name")?.to_string();
    let world = child_ref(node, "world")?;
    if !volumes.iter().any(|v| v.name == world) {
        return Err(GeometryError::UndefinedReference {
            kind: "volume",
            name: world,
        });
    }
    Ok(Setup { name, world })
}
