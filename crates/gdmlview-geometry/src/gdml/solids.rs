//! The `<solids>` section.

use glam::{DQuat, DVec3};
use roxmltree::Node;

use super::{placement_rotation, Context, StoreNames};
use crate::error::{GeometryError, Result};
use crate::solid::{BooleanOp, Shape, Solid};
use crate::store::GeometryStore;

/// Parsed form of a solid; booleans still refer to their operands by name.
#[derive(Debug, Clone, PartialEq)]
pub enum SolidKind {
    Primitive(Shape),
    Boolean {
        op: BooleanOp,
        first: String,
        second: String,
        translation: DVec3,
        rotation: DQuat,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolidDef {
    pub name: String,
    pub kind: SolidKind,
}

impl SolidDef {
    /// Converts to a store solid, looking boolean operands up in `store`.
    ///
    /// `names` maps document names to the names solids were stored under.
    pub fn resolve(&self, store: &GeometryStore, names: &StoreNames) -> Result<Solid> {
        let shape = match &self.kind {
            SolidKind::Primitive(shape) => shape.clone(),
            SolidKind::Boolean {
                op,
                first,
                second,
                translation,
                rotation,
            } => {
                let lookup = |name: &String| {
                    store
                        .find_solid(names.get(name))
                        .ok_or_else(|| GeometryError::UndefinedReference {
                            kind: "solid",
                            name: name.clone(),
                        })
                };
                Shape::Boolean {
                    op: *op,
                    first: lookup(first)?,
                    second: lookup(second)?,
                    translation: *translation,
                    rotation: *rotation,
                }
            }
        };
        Ok(Solid::new(names.get(&self.name).to_string(), shape))
    }
}

pub(crate) fn read_solids(
    context: &Context,
    section: Node<'_, '_>,
    out: &mut Vec<SolidDef>,
) -> Result<()> {
    for node in section.children().filter(Node::is_element) {
        let def = read_solid(context, node, out)?;
        if out.iter().any(|s| s.name == def.name) {
            return Err(GeometryError::DuplicateName {
                kind: "solid",
                name: def.name,
            });
        }
        log::debug!("solid '{}'", def.name);
        out.push(def);
    }
    Ok(())
}

fn read_solid(context: &Context, node: Node<'_, '_>, declared: &[SolidDef]) -> Result<SolidDef> {
    let name = Context::name_attr(node, "name")?;
    let tag = node.tag_name().name();

    let op = match tag {
        "union" => Some(BooleanOp::Union),
        "subtraction" => Some(BooleanOp::Subtraction),
        "intersection" => Some(BooleanOp::Intersection),
        _ => None,
    };
    if let Some(op) = op {
        let kind = read_boolean(context, node, op, declared)?;
        return Ok(SolidDef { name, kind });
    }

    let lunit = context.unit(node, "lunit", "mm")?;
    let aunit = context.unit(node, "aunit", "rad")?;
    let length = |attribute| Ok::<_, GeometryError>(context.eval(node, attribute)? * lunit);
    let length_or_zero =
        |attribute| Ok::<_, GeometryError>(context.eval_opt(node, attribute)?.unwrap_or(0.0) * lunit);
    let angle = |attribute| Ok::<_, GeometryError>(context.eval(node, attribute)? * aunit);
    let angle_or_zero =
        |attribute| Ok::<_, GeometryError>(context.eval_opt(node, attribute)?.unwrap_or(0.0) * aunit);

    let shape = match tag {
        "box" => Shape::Box {
            half: DVec3::new(length("x")?, length("y")?, length("z")?) / 2.0,
        },
        "tube" => Shape::Tube {
            rmin: length_or_zero("rmin")?,
            rmax: length("rmax")?,
            half_z: length("z")? / 2.0,
            start_phi: angle_or_zero("startphi")?,
            delta_phi: angle("deltaphi")?,
        },
        "cone" => Shape::Cone {
            rmin1: length_or_zero("rmin1")?,
            rmax1: length("rmax1")?,
            rmin2: length_or_zero("rmin2")?,
            rmax2: length("rmax2")?,
            half_z: length("z")? / 2.0,
            start_phi: angle_or_zero("startphi")?,
            delta_phi: angle("deltaphi")?,
        },
        "sphere" => Shape::Sphere {
            rmin: length_or_zero("rmin")?,
            rmax: length("rmax")?,
            start_phi: angle_or_zero("startphi")?,
            delta_phi: angle("deltaphi")?,
            start_theta: angle_or_zero("starttheta")?,
            delta_theta: angle("deltatheta")?,
        },
        "orb" => Shape::Orb { r: length("r")? },
        "trd" => Shape::Trd {
            x1: length("x1")? / 2.0,
            x2: length("x2")? / 2.0,
            y1: length("y1")? / 2.0,
            y2: length("y2")? / 2.0,
            half_z: length("z")? / 2.0,
        },
        other => return Err(GeometryError::UnsupportedSolid(other.to_string())),
    };

    shape
        .validate()
        .map_err(|reason| GeometryError::InvalidDimensions {
            name: name.clone(),
            reason,
        })?;
    Ok(SolidDef {
        name,
        kind: SolidKind::Primitive(shape),
    })
}

fn read_boolean(
    context: &Context,
    node: Node<'_, '_>,
    op: BooleanOp,
    declared: &[SolidDef],
) -> Result<SolidKind> {
    let operand = |tag: &str| -> Result<String> {
        let child = node
            .children()
            .find(|c| c.has_tag_name(tag))
            .ok_or_else(|| GeometryError::MissingAttribute {
                element: node.tag_name().name().to_string(),
                attribute: tag.to_string(),
            })?;
        let name = Context::name_attr(child, "ref")?;
        if declared.iter().any(|s| s.name == name) {
            Ok(name)
        } else {
            Err(GeometryError::UndefinedReference {
                kind: "solid",
                name,
            })
        }
    };

    Ok(SolidKind::Boolean {
        op,
        first: operand("first")?,
        second: operand("second")?,
        translation: context.placement_position(node)?,
        rotation: placement_rotation(context.placement_angles(node)?),
    })
}
