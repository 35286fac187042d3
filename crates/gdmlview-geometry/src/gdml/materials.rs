//! The `<materials>` section: isotopes, elements and materials.

use roxmltree::Node;
use serde::Serialize;

use super::{Context, G_PER_CM3};
use crate::error::{GeometryError, Result};

/// Prefix of materials provided by the NIST database.
pub const NIST_PREFIX: &str = "G4_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MaterialKind {
    Isotope,
    Element,
    Material,
}

impl MaterialKind {
    fn label(self) -> &'static str {
        match self {
            Self::Isotope => "isotope",
            Self::Element => "element",
            Self::Material => "material",
        }
    }
}

/// One constituent of an element or material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Component {
    /// Mass fraction (or isotope abundance).
    Fraction { reference: String, fraction: f64 },
    /// Number of atoms per molecule.
    Composite { reference: String, atoms: u32 },
}

impl Component {
    pub fn reference(&self) -> &str {
        match self {
            Self::Fraction { reference, .. } | Self::Composite { reference, .. } => reference,
        }
    }
}

/// An isotope, element or material declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    pub z: Option<f64>,
    /// Density in g/cm3.
    pub density: Option<f64>,
    pub components: Vec<Component>,
}

/// Returns whether `name` is usable as a volume's `materialref`.
pub fn is_known_material(materials: &[Material], name: &str) -> bool {
    name.starts_with(NIST_PREFIX)
        || materials
            .iter()
            .any(|m| m.name == name && m.kind != MaterialKind::Isotope)
}

pub(crate) fn read_materials(
    context: &Context,
    section: Node<'_, '_>,
    out: &mut Vec<Material>,
) -> Result<()> {
    for node in section.children().filter(Node::is_element) {
        let kind = match node.tag_name().name() {
            "isotope" => MaterialKind::Isotope,
            "element" => MaterialKind::Element,
            "material" => MaterialKind::Material,
            other => {
                log::debug!("ignoring <{other}> in <materials>");
                continue;
            }
        };
        let material = read_one(context, node, kind, out)?;
        if out
            .iter()
            .any(|m| m.kind == kind && m.name == material.name)
        {
            return Err(GeometryError::DuplicateName {
                kind: kind.label(),
                name: material.name,
            });
        }
        out.push(material);
    }
    Ok(())
}

fn read_one(
    context: &Context,
    node: Node<'_, '_>,
    kind: MaterialKind,
    declared: &[Material],
) -> Result<Material> {
    let mut material = Material {
        name: Context::name_attr(node, "name")?,
        kind,
        z: context.eval_opt(node, "Z")?,
        density: None,
        components: Vec::new(),
    };

    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "D" => {
                let unit = context.unit(child, "unit", "g/cm3")?;
                material.density = Some(context.eval(child, "value")? * unit / G_PER_CM3);
            }
            "fraction" => {
                let reference = referenced(child, declared)?;
                let fraction = context.eval(child, "n")?;
                material.components.push(Component::Fraction { reference, fraction });
            }
            "composite" => {
                let reference = referenced(child, declared)?;
                let atoms = context.eval(child, "n")?;
                if atoms < 1.0 || atoms.fract() != 0.0 {
                    return Err(GeometryError::Expression {
                        expression: atoms.to_string(),
                        reason: "composite atom count must be a positive integer".to_string(),
                    });
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                material.components.push(Component::Composite {
                    reference,
                    atoms: atoms as u32,
                });
            }
            _ => {}
        }
    }

    if kind == MaterialKind::Material && material.density.is_none() {
        return Err(GeometryError::MissingAttribute {
            element: format!("material '{}'", material.name),
            attribute: "D".to_string(),
        });
    }

    let fractions: Vec<f64> = material
        .components
        .iter()
        .filter_map(|c| match c {
            Component::Fraction { fraction, .. } => Some(*fraction),
            Component::Composite { .. } => None,
        })
        .collect();
    if !fractions.is_empty() {
        let total: f64 = fractions.iter().sum();
        if (total - 1.0).abs() > 1e-6 {
            log::warn!(
                "{} '{}' fractions sum to {total}, not 1",
                kind.label(),
                material.name
            );
        }
    }

    Ok(material)
}

fn referenced(node: Node<'_, '_>, declared: &[Material]) -> Result<String> {
    let name = Context::name_attr(node, "ref")?;
    if name.starts_with(NIST_PREFIX) || declared.iter().any(|m| m.name == name) {
        Ok(name)
    } else {
        Err(GeometryError::UndefinedReference {
            kind: "material",
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Vec<Material>> {
        let xml = roxmltree::Document::parse(text).unwrap();
        let mut out = Vec::new();
        read_materials(&Context::default(), xml.root_element(), &mut out)?;
        Ok(out)
    }

    #[test]
    fn test_water() {
        let materials = parse(
            r#"<materials>
                <element name="Hydrogen" formula="H" Z="1"><atom value="1.008"/></element>
                <element name="Oxygen0x55" formula="O" Z="8"><atom value="16.0"/></element>
                <material name="Water" state="liquid">
                    <D value="1.0"/>
                    <composite n="2" ref="Hydrogen"/>
                    <composite n="1" ref="Oxygen0x55"/>
                </material>
            </materials>"#,
        )
        .unwrap();
        assert_eq!(materials.len(), 3);
        let water = &materials[2];
        assert_eq!(water.kind, MaterialKind::Material);
        assert_eq!(water.density, Some(1.0));
        assert_eq!(water.components[1].reference(), "Oxygen0x55");
        assert!(is_known_material(&materials, "Water"));
        assert!(is_known_material(&materials, "G4_AIR"));
        assert!(!is_known_material(&materials, "Steel"));
    }

    #[test]
    fn test_density_units() {
        let materials = parse(
            r#"<materials>
                <material name="Gas" Z="1"><D value="0.09" unit="mg/cm3"/><atom value="1"/></material>
            </materials>"#,
        )
        .unwrap();
        let density = materials[0].density.unwrap();
        assert!((density - 9.0e-5).abs() < 1e-15);
    }

    #[test]
    fn test_material_requires_density() {
        let err = parse(r#"<materials><material name="Air"><fraction n="1" ref="G4_N"/></material></materials>"#)
            .unwrap_err();
        assert!(matches!(err, GeometryError::MissingAttribute { attribute, .. } if attribute == "D"));
    }

    #[test]
    fn test_undefined_component() {
        let err = parse(
            r#"<materials><material name="Mix"><D value="1"/><fraction n="1" ref="Unobtainium"/></material></materials>"#,
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::UndefinedReference { kind: "material", .. }));
    }
}
