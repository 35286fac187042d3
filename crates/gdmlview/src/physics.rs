//! Physics lists.
//!
//! The viewer only transports geantinos, so the list is small; it exists so
//! the run manager can be initialized the same way a full simulation would.

use serde::Serialize;

/// Particles, processes and production cut built by a physics list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicsTable {
    pub particles: Vec<String>,
    pub processes: Vec<String>,
    /// Production cut in mm.
    pub production_cut: f64,
}

pub trait PhysicsList {
    fn name(&self) -> &str;

    fn construct(&mut self) -> PhysicsTable;
}

/// Geantinos with transportation only.
#[derive(Debug, Clone, Copy)]
pub struct GeantinoPhysicsList {
    default_cut_value: f64,
}

impl Default for GeantinoPhysicsList {
    fn default() -> Self {
        Self {
            default_cut_value: 1.0,
        }
    }
}

impl PhysicsList for GeantinoPhysicsList {
    fn name(&self) -> &str {
        "geantino"
    }

    fn construct(&mut self) -> PhysicsTable {
        log::debug!("constructing geantino physics, cut {} mm", self.default_cut_value);
        PhysicsTable {
            particles: vec!["geantino".to_string()],
            processes: vec!["Transportation".to_string()],
            production_cut: self.default_cut_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geantino_table() {
        let table = GeantinoPhysicsList::default().construct();
        assert_eq!(table.particles, ["geantino"]);
        assert_eq!(table.processes, ["Transportation"]);
        assert_eq!(table.production_cut, 1.0);
    }
}
