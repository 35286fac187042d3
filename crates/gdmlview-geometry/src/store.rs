//! Volume store holding the live scene graph.
//!
//! The store owns every solid, logical volume and physical volume built for
//! the current world. Solids and logical volumes are indexed by unique name;
//! physical volumes by store identity. [`GeometryStore::clean`] purges
//! everything before a rebuild so stale volumes never coexist with new ones.

use std::collections::HashMap;

use glam::DVec3;
use serde::Serialize;

use crate::error::{GeometryError, Result};
use crate::solid::{transform_extent, BooleanOp, Shape, Solid};
use crate::volume::{LogicalVolume, LogicalVolumeId, PhysicalVolume, PhysicalVolumeId, SolidId};

/// Storage for solids and volumes.
#[derive(Debug, Default)]
pub struct GeometryStore {
    solids: Vec<Solid>,
    solid_index: HashMap<String, SolidId>,
    logical_volumes: Vec<LogicalVolume>,
    logical_index: HashMap<String, LogicalVolumeId>,
    physical_volumes: Vec<PhysicalVolume>,
    closed: bool,
    generation: u64,
}

impl GeometryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a solid.
    ///
    /// Returns an error if a solid with the same name already exists.
    pub fn add_solid(&mut self, solid: Solid) -> Result<SolidId> {
        if self.solid_index.contains_key(solid.name()) {
            return Err(GeometryError::DuplicateName {
                kind: "solid",
                name: solid.name().to_string(),
            });
        }
        let id = SolidId::new(self.solids.len());
        self.solid_index.insert(solid.name().to_string(), id);
        self.solids.push(solid);
        Ok(id)
    }

    /// Registers a logical volume.
    ///
    /// Returns an error if a logical volume with the same name already exists.
    pub fn add_logical_volume(&mut self, volume: LogicalVolume) -> Result<LogicalVolumeId> {
        if self.logical_index.contains_key(volume.name()) {
            return Err(GeometryError::DuplicateName {
                kind: "volume",
                name: volume.name().to_string(),
            });
        }
        let id = LogicalVolumeId::new(self.logical_volumes.len());
        self.logical_index.insert(volume.name().to_string(), id);
        self.logical_volumes.push(volume);
        Ok(id)
    }

    /// Registers a physical volume and attaches it to its mother.
    pub fn add_physical_volume(&mut self, volume: PhysicalVolume) -> PhysicalVolumeId {
        let id = PhysicalVolumeId::new(self.physical_volumes.len());
        if let Some(mother) = volume.mother() {
            self.logical_volumes[mother.index()].add_daughter(id);
        }
        self.physical_volumes.push(volume);
        id
    }

    pub fn solid(&self, id: SolidId) -> &Solid {
        &self.solids[id.index()]
    }

    pub fn logical_volume(&self, id: LogicalVolumeId) -> &LogicalVolume {
        &self.logical_volumes[id.index()]
    }

    pub fn logical_volume_mut(&mut self, id: LogicalVolumeId) -> &mut LogicalVolume {
        &mut self.logical_volumes[id.index()]
    }

    pub fn physical_volume(&self, id: PhysicalVolumeId) -> &PhysicalVolume {
        &self.physical_volumes[id.index()]
    }

    /// Gets a solid by name.
    pub fn find_solid(&self, name: &str) -> Option<SolidId> {
        self.solid_index.get(name).copied()
    }

    /// Gets a logical volume by name.
    pub fn find_logical_volume(&self, name: &str) -> Option<LogicalVolumeId> {
        self.logical_index.get(name).copied()
    }

    /// Gets the first physical volume with the given name.
    pub fn find_physical_volume(&self, name: &str) -> Option<PhysicalVolumeId> {
        self.physical_volumes
            .iter()
            .position(|pv| pv.name() == name)
            .map(PhysicalVolumeId::new)
    }

    pub fn num_solids(&self) -> usize {
        self.solids.len()
    }

    pub fn num_logical_volumes(&self) -> usize {
        self.logical_volumes.len()
    }

    pub fn num_physical_volumes(&self) -> usize {
        self.physical_volumes.len()
    }

    /// Returns true if the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.solids.is_empty() && self.logical_volumes.is_empty() && self.physical_volumes.is_empty()
    }

    /// Number of purges performed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Marks the geometry closed for event processing.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Opens the geometry and removes every physical volume, logical volume
    /// and solid.
    ///
    /// Safe to call on an empty store.
    pub fn clean(&mut self) {
        if !self.is_empty() {
            log::debug!(
                "purging {} physical volumes, {} logical volumes, {} solids",
                self.physical_volumes.len(),
                self.logical_volumes.len(),
                self.solids.len()
            );
        }
        self.closed = false;
        self.physical_volumes.clear();
        self.logical_volumes.clear();
        self.logical_index.clear();
        self.solids.clear();
        self.solid_index.clear();
        self.generation += 1;
    }

    /// Bounding box of a solid in its own frame.
    pub fn solid_extent(&self, id: SolidId) -> (DVec3, DVec3) {
        let shape = self.solid(id).shape();
        if let Some(extent) = shape.primitive_extent() {
            return extent;
        }
        match *shape {
            Shape::Boolean {
                op,
                first,
                second,
                translation,
                rotation,
            } => {
                let first_extent = self.solid_extent(first);
                match op {
                    BooleanOp::Union => {
                        let (min, max) =
                            transform_extent(self.solid_extent(second), rotation, translation);
                        (first_extent.0.min(min), first_extent.1.max(max))
                    }
                    // Removing or intersecting never grows the first operand.
                    _ => first_extent,
                }
            }
            _ => (DVec3::ZERO, DVec3::ZERO),
        }
    }

    /// Bounding box of the world placed at `world`.
    pub fn world_extent(&self, world: PhysicalVolumeId) -> (DVec3, DVec3) {
        let pv = self.physical_volume(world);
        let solid = self.logical_volume(pv.logical()).solid();
        transform_extent(self.solid_extent(solid), pv.rotation(), pv.translation())
    }

    /// Depth-first walk of the placement tree below `root`.
    ///
    /// Yields `(depth, id)` pairs with the root at depth zero.
    pub fn walk(&self, root: PhysicalVolumeId) -> Vec<(usize, PhysicalVolumeId)> {
        let mut out = Vec::new();
        let mut stack = vec![(0, root)];
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            let lv = self.logical_volume(self.physical_volume(id).logical());
            for &daughter in lv.daughters().iter().rev() {
                stack.push((depth + 1, daughter));
            }
        }
        out
    }

    /// Serializable snapshot of the tree below `root`.
    pub fn snapshot(&self, root: PhysicalVolumeId) -> VolumeNode {
        let pv = self.physical_volume(root);
        let lv = self.logical_volume(pv.logical());
        let solid = self.solid(lv.solid());
        VolumeNode {
            name: pv.name().to_string(),
            copy_number: pv.copy_number(),
            logical_volume: lv.name().to_string(),
            solid: solid.name().to_string(),
            shape: solid.shape().type_name(),
            material: lv.material().to_string(),
            visible: lv.is_visible(),
            translation: pv.translation().to_array(),
            daughters: lv.daughters().iter().map(|&d| self.snapshot(d)).collect(),
        }
    }
}

/// One placement in a [`GeometryStore::snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeNode {
    pub name: String,
    pub copy_number: i32,
    pub logical_volume: String,
    pub solid: String,
    pub shape: &'static str,
    pub material: String,
    pub visible: bool,
    pub translation: [f64; 3],
    pub daughters: Vec<VolumeNode>,
}

impl VolumeNode {
    /// Number of placements in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.daughters.iter().map(VolumeNode::count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use glam::DQuat;

    use super::*;

    fn cube(name: &str, half: f64) -> Solid {
        Solid::new(
            name,
            Shape::Box {
                half: DVec3::splat(half),
            },
        )
    }

    fn nested_store() -> (GeometryStore, PhysicalVolumeId) {
        let mut store = GeometryStore::new();
        let world_solid = store.add_solid(cube("WorldBox", 100.0)).unwrap();
        let inner_solid = store.add_solid(cube("InnerBox", 10.0)).unwrap();
        let inner = store
            .add_logical_volume(LogicalVolume::new("Inner", inner_solid, "G4_Si"))
            .unwrap();
        let world_lv = store
            .add_logical_volume(LogicalVolume::new("World", world_solid, "G4_AIR"))
            .unwrap();
        for copy in 0..2 {
            store.add_physical_volume(PhysicalVolume::placement(
                "Inner",
                inner,
                world_lv,
                DVec3::new(f64::from(copy) * 30.0, 0.0, 0.0),
                DQuat::IDENTITY,
                copy,
            ));
        }
        let world = store.add_physical_volume(PhysicalVolume::world("World", world_lv));
        (store, world)
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut store = GeometryStore::new();
        store.add_solid(cube("A", 1.0)).unwrap();
        let err = store.add_solid(cube("A", 2.0)).unwrap_err();
        assert!(matches!(err, GeometryError::DuplicateName { kind: "solid", .. }));
        assert_eq!(store.num_solids(), 1);
    }

    #[test]
    fn test_daughters_attached() {
        let (store, world) = nested_store();
        let world_lv = store.logical_volume(store.physical_volume(world).logical());
        assert_eq!(world_lv.daughters().len(), 2);
        assert_eq!(store.num_physical_volumes(), 3);
        assert_eq!(store.find_physical_volume("World"), Some(world));
    }

    #[test]
    fn test_walk_depth_first() {
        let (store, world) = nested_store();
        let walk = store.walk(world);
        let depths: Vec<usize> = walk.iter().map(|(d, _)| *d).collect();
        assert_eq!(depths, vec![0, 1, 1]);
        let copies: Vec<i32> = walk
            .iter()
            .skip(1)
            .map(|(_, id)| store.physical_volume(*id).copy_number())
            .collect();
        assert_eq!(copies, vec![0, 1]);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let (mut store, _) = nested_store();
        store.close();
        store.clean();
        assert!(store.is_empty());
        assert!(!store.is_closed());
        assert!(store.find_solid("WorldBox").is_none());
        store.clean();
        assert!(store.is_empty());
        assert_eq!(store.generation(), 2);

        // Names are free again after a purge.
        store.add_solid(cube("WorldBox", 1.0)).unwrap();
    }

    #[test]
    fn test_snapshot() {
        let (store, world) = nested_store();
        let node = store.snapshot(world);
        assert_eq!(node.name, "World");
        assert_eq!(node.count(), 3);
        assert_eq!(node.daughters[1].translation, [30.0, 0.0, 0.0]);
        assert_eq!(node.daughters[0].material, "G4_Si");
    }

    #[test]
    fn test_union_extent() {
        let mut store = GeometryStore::new();
        let a = store.add_solid(cube("a", 1.0)).unwrap();
        let b = store.add_solid(cube("b", 1.0)).unwrap();
        let shape = |op| Shape::Boolean {
            op,
            first: a,
            second: b,
            translation: DVec3::new(5.0, 0.0, 0.0),
            rotation: DQuat::IDENTITY,
        };
        let union = store.add_solid(Solid::new("u", shape(BooleanOp::Union))).unwrap();
        let sub = store
            .add_solid(Solid::new("s", shape(BooleanOp::Subtraction)))
            .unwrap();

        let (min, max) = store.solid_extent(union);
        assert_eq!(min, DVec3::splat(-1.0));
        assert_eq!(max, DVec3::new(6.0, 1.0, 1.0));
        assert_eq!(store.solid_extent(sub), (DVec3::splat(-1.0), DVec3::splat(1.0)));
    }
}
