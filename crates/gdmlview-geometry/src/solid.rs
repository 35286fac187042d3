//! Solids: the shapes logical volumes are made of.
//!
//! Lengths are in millimetres and angles in radians. Dimensions are stored
//! as half lengths, the way the GDML reader converts them.

use glam::{DQuat, DVec3};
use serde::Serialize;

use crate::volume::SolidId;

/// Boolean combination of two solids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BooleanOp {
    Union,
    Subtraction,
    Intersection,
}

/// Shape parameters of a solid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Shape {
    Box {
        half: DVec3,
    },
    Tube {
        rmin: f64,
        rmax: f64,
        half_z: f64,
        start_phi: f64,
        delta_phi: f64,
    },
    Cone {
        rmin1: f64,
        rmax1: f64,
        rmin2: f64,
        rmax2: f64,
        half_z: f64,
        start_phi: f64,
        delta_phi: f64,
    },
    Sphere {
        rmin: f64,
        rmax: f64,
        start_phi: f64,
        delta_phi: f64,
        start_theta: f64,
        delta_theta: f64,
    },
    Orb {
        r: f64,
    },
    Trd {
        x1: f64,
        x2: f64,
        y1: f64,
        y2: f64,
        half_z: f64,
    },
    Boolean {
        op: BooleanOp,
        first: SolidId,
        second: SolidId,
        translation: DVec3,
        rotation: DQuat,
    },
}

impl Shape {
    /// Short type name used in listings.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Tube { .. } => "tube",
            Self::Cone { .. } => "cone",
            Self::Sphere { .. } => "sphere",
            Self::Orb { .. } => "orb",
            Self::Trd { .. } => "trd",
            Self::Boolean { op, .. } => match op {
                BooleanOp::Union => "union",
                BooleanOp::Subtraction => "subtraction",
                BooleanOp::Intersection => "intersection",
            },
        }
    }

    /// Checks that the dimensions describe a real shape.
    pub fn validate(&self) -> Result<(), String> {
        fn positive(what: &str, value: f64) -> Result<(), String> {
            if value > 0.0 {
                Ok(())
            } else {
                Err(format!("{what} must be positive, got {value}"))
            }
        }
        fn radii(rmin: f64, rmax: f64) -> Result<(), String> {
            positive("rmax", rmax)?;
            if rmin < 0.0 || rmin >= rmax {
                return Err(format!("need 0 <= rmin < rmax, got {rmin} and {rmax}"));
            }
            Ok(())
        }

        match *self {
            Self::Box { half } => {
                positive("x", half.x)?;
                positive("y", half.y)?;
                positive("z", half.z)
            }
            Self::Tube { rmin, rmax, half_z, delta_phi, .. } => {
                radii(rmin, rmax)?;
                positive("z", half_z)?;
                positive("deltaphi", delta_phi)
            }
            Self::Cone { rmin1, rmax1, rmin2, rmax2, half_z, delta_phi, .. } => {
                if rmin1 < 0.0 || rmin2 < 0.0 || rmin1 > rmax1 || rmin2 > rmax2 {
                    return Err("inner radii must lie within outer radii".to_string());
                }
                if rmax1 <= 0.0 && rmax2 <= 0.0 {
                    return Err("at least one outer radius must be positive".to_string());
                }
                positive("z", half_z)?;
                positive("deltaphi", delta_phi)
            }
            Self::Sphere { rmin, rmax, delta_phi, delta_theta, .. } => {
                radii(rmin, rmax)?;
                positive("deltaphi", delta_phi)?;
                positive("deltatheta", delta_theta)
            }
            Self::Orb { r } => positive("r", r),
            Self::Trd { x1, x2, y1, y2, half_z } => {
                if x1 < 0.0 || x2 < 0.0 || y1 < 0.0 || y2 < 0.0 {
                    return Err("trd half lengths must not be negative".to_string());
                }
                positive("z", half_z)
            }
            Self::Boolean { .. } => Ok(()),
        }
    }

    /// Local bounding box of a primitive shape.
    ///
    /// Phi and theta segments are ignored, so the box may be larger than the
    /// shape. Boolean shapes return `None`; their extent depends on their
    /// operands and is computed by the store.
    pub fn primitive_extent(&self) -> Option<(DVec3, DVec3)> {
        let half = match *self {
            Self::Box { half } => half,
            Self::Tube { rmax, half_z, .. } => DVec3::new(rmax, rmax, half_z),
            Self::Cone { rmax1, rmax2, half_z, .. } => {
                let r = rmax1.max(rmax2);
                DVec3::new(r, r, half_z)
            }
            Self::Sphere { rmax, .. } => DVec3::splat(rmax),
            Self::Orb { r } => DVec3::splat(r),
            Self::Trd { x1, x2, y1, y2, half_z } => DVec3::new(x1.max(x2), y1.max(y2), half_z),
            Self::Boolean { .. } => return None,
        };
        Some((-half, half))
    }
}

/// A named solid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solid {
    name: String,
    shape: Shape,
}

impl Solid {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

/// Transforms an axis-aligned box and returns the box enclosing the result.
pub fn transform_extent(
    (min, max): (DVec3, DVec3),
    rotation: DQuat,
    translation: DVec3,
) -> (DVec3, DVec3) {
    let mut out_min = DVec3::splat(f64::MAX);
    let mut out_max = DVec3::splat(f64::MIN);
    for i in 0..8 {
        let corner = DVec3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        );
        let moved = rotation * corner + translation;
        out_min = out_min.min(moved);
        out_max = out_max.max(moved);
    }
    (out_min, out_max)
}
