//! Logical and physical volumes.
//!
//! A [`LogicalVolume`] binds a solid to a material and owns the placements
//! of its daughters. A [`PhysicalVolume`] places a logical volume inside a
//! mother logical volume; the world is the one physical volume without a
//! mother.

use std::fmt;

use glam::{DQuat, DVec3};
use serde::Serialize;

macro_rules! store_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(usize);

        impl $name {
            /// Wraps a raw store index.
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Raw store index.
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

store_id!(
    /// Index of a solid in the geometry store.
    SolidId
);
store_id!(
    /// Index of a logical volume in the geometry store.
    LogicalVolumeId
);
store_id!(
    /// Index of a physical volume in the geometry store.
    PhysicalVolumeId
);

/// Visualization attributes of a logical volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisAttributes {
    pub visible: bool,
    pub colour: Option<[f64; 4]>,
}

impl VisAttributes {
    /// Attributes hiding the volume from viewers.
    pub const fn invisible() -> Self {
        Self {
            visible: false,
            colour: None,
        }
    }
}

impl Default for VisAttributes {
    fn default() -> Self {
        Self {
            visible: true,
            colour: None,
        }
    }
}

/// A solid bound to a material, with its placed daughters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogicalVolume {
    name: String,
    solid: SolidId,
    material: String,
    vis_attributes: Option<VisAttributes>,
    daughters: Vec<PhysicalVolumeId>,
}

impl LogicalVolume {
    pub fn new(name: impl Into<String>, solid: SolidId, material: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            solid,
            material: material.into(),
            vis_attributes: None,
            daughters: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn solid(&self) -> SolidId {
        self.solid
    }

    pub fn material(&self) -> &str {
        &self.material
    }

    pub fn vis_attributes(&self) -> Option<&VisAttributes> {
        self.vis_attributes.as_ref()
    }

    /// Sets or clears the visualization attributes.
    ///
    /// A volume without attributes is drawn with viewer defaults.
    pub fn set_vis_attributes(&mut self, attributes: Option<VisAttributes>) {
        self.vis_attributes = attributes;
    }

    /// Returns whether viewers should draw this volume.
    pub fn is_visible(&self) -> bool {
        self.vis_attributes.map_or(true, |vis| vis.visible)
    }

    pub fn daughters(&self) -> &[PhysicalVolumeId] {
        &self.daughters
    }

    pub(crate) fn add_daughter(&mut self, daughter: PhysicalVolumeId) {
        self.daughters.push(daughter);
    }
}

/// A positioned instance of a logical volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicalVolume {
    name: String,
    logical: LogicalVolumeId,
    mother: Option<LogicalVolumeId>,
    translation: DVec3,
    rotation: DQuat,
    copy_number: i32,
}

impl PhysicalVolume {
    /// Creates the world placement: no mother, at the origin.
    pub fn world(name: impl Into<String>, logical: LogicalVolumeId) -> Self {
        Self {
            name: name.into(),
            logical,
            mother: None,
            translation: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
            copy_number: 0,
        }
    }

    /// Creates a placement of `logical` inside `mother`.
    pub fn placement(
        name: impl Into<String>,
        logical: LogicalVolumeId,
        mother: LogicalVolumeId,
        translation: DVec3,
        rotation: DQuat,
        copy_number: i32,
    ) -> Self {
        Self {
            name: name.into(),
            logical,
            mother: Some(mother),
            translation,
            rotation,
            copy_number,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logical(&self) -> LogicalVolumeId {
        self.logical
    }

    pub fn mother(&self) -> Option<LogicalVolumeId> {
        self.mother
    }

    pub fn translation(&self) -> DVec3 {
        self.translation
    }

    pub fn rotation(&self) -> DQuat {
        self.rotation
    }

    pub fn copy_number(&self) -> i32 {
        self.copy_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_defaults() {
        let mut lv = LogicalVolume::new("World", SolidId::new(0), "G4_AIR");
        assert!(lv.is_visible());
        lv.set_vis_attributes(Some(VisAttributes::invisible()));
        assert!(!lv.is_visible());
        lv.set_vis_attributes(None);
        assert!(lv.is_visible());
    }

    #[test]
    fn test_world_placement() {
        let pv = PhysicalVolume::world("World", LogicalVolumeId::new(3));
        assert!(pv.mother().is_none());
        assert_eq!(pv.translation(), DVec3::ZERO);
        assert_eq!(pv.logical().index(), 3);
        assert_eq!(pv.logical().to_string(), "#3");
    }
}
