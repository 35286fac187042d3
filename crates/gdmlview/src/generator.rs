//! Primary event generation.
//!
//! [`PrimaryGeneratorAction`] owns one [`PrimaryGenerator`], chosen by name
//! from a [`GeneratorRegistry`]. Selecting an unknown name keeps the current
//! generator.

use std::f64::consts::PI;

use gdmlview_core::{Command, FactoryRegistry, GdmlviewError, Messenger, Parameter, ParameterKind};
use glam::DVec3;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;

use crate::app::Kernel;
use crate::run::RunError;

/// A primary particle: where it starts and where it goes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrimaryVertex {
    pub particle: String,
    /// Kinetic energy in MeV.
    pub energy: f64,
    pub position: DVec3,
    /// Unit vector.
    pub direction: DVec3,
}

/// One generated event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: u64,
    pub primaries: Vec<PrimaryVertex>,
}

pub trait PrimaryGenerator {
    fn name(&self) -> &str;

    fn generate_primary_vertex(&mut self, rng: &mut StdRng) -> PrimaryVertex;
}

/// Isotropic point source of geantinos at the origin.
#[derive(Debug, Clone)]
pub struct GeneralParticleSource {
    pub particle: String,
    pub energy: f64,
    pub centre: DVec3,
}

impl Default for GeneralParticleSource {
    fn default() -> Self {
        Self {
            particle: "geantino".to_string(),
            energy: 1.0,
            centre: DVec3::ZERO,
        }
    }
}

impl PrimaryGenerator for GeneralParticleSource {
    fn name(&self) -> &str {
        "gps"
    }

    fn generate_primary_vertex(&mut self, rng: &mut StdRng) -> PrimaryVertex {
        let cos_theta: f64 = rng.gen_range(-1.0..=1.0);
        let phi: f64 = rng.gen_range(0.0..2.0 * PI);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
        PrimaryVertex {
            particle: self.particle.clone(),
            energy: self.energy,
            position: self.centre,
            direction: DVec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta),
        }
    }
}

/// Fixed-direction particle gun.
#[derive(Debug, Clone)]
pub struct ParticleGun {
    pub particle: String,
    pub energy: f64,
    pub position: DVec3,
    pub direction: DVec3,
}

impl Default for ParticleGun {
    fn default() -> Self {
        Self {
            particle: "geantino".to_string(),
            energy: 1.0,
            position: DVec3::ZERO,
            direction: DVec3::Z,
        }
    }
}

impl PrimaryGenerator for ParticleGun {
    fn name(&self) -> &str {
        "gun"
    }

    fn generate_primary_vertex(&mut self, _rng: &mut StdRng) -> PrimaryVertex {
        PrimaryVertex {
            particle: self.particle.clone(),
            energy: self.energy,
            position: self.position,
            direction: self.direction.normalize_or_zero(),
        }
    }
}

pub type GeneratorRegistry = FactoryRegistry<(), dyn PrimaryGenerator>;

/// Registers the built-in generators.
pub fn build_generator_registry() -> GeneratorRegistry {
    let mut registry = GeneratorRegistry::new();
    registry.register("gps", |_: &()| -> Box<dyn PrimaryGenerator> {
        Box::new(GeneralParticleSource::default())
    });
    registry.register("gun", |_: &()| -> Box<dyn PrimaryGenerator> {
        Box::new(ParticleGun::default())
    });
    registry
}

/// Owns the active primary generator.
pub struct PrimaryGeneratorAction {
    registry: GeneratorRegistry,
    generator: Box<dyn PrimaryGenerator>,
}

impl Default for PrimaryGeneratorAction {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimaryGeneratorAction {
    /// Starts with the general particle source.
    pub fn new() -> Self {
        Self {
            registry: build_generator_registry(),
            generator: Box::new(GeneralParticleSource::default()),
        }
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    pub fn generator_ids(&self) -> Vec<&str> {
        self.registry.ids()
    }

    /// Replaces the generator with a new one created from the registry.
    ///
    /// An unknown `id` leaves the current generator in place.
    pub fn select_primary_generator(&mut self, id: &str) -> Result<(), RunError> {
        let generator = self
            .registry
            .create(id, &())
            .ok_or_else(|| RunError::UnknownGenerator(id.to_string()))?;
        log::info!("primary generator '{}' replaced by '{id}'", self.generator.name());
        self.generator = generator;
        Ok(())
    }

    pub fn generate_primaries(&mut self, id: u64, rng: &mut StdRng) -> Event {
        let vertex = self.generator.generate_primary_vertex(rng);
        log::debug!(
            "event {id}: {} at {:?} along {:?}",
            vertex.particle,
            vertex.position,
            vertex.direction
        );
        Event {
            id,
            primaries: vec![vertex],
        }
    }
}

/// Handles `/generator/select` and `/generator/list`.
#[derive(Debug, Default)]
pub struct GeneratorMessenger;

impl Messenger<Kernel> for GeneratorMessenger {
    fn directories(&self) -> Vec<(String, String)> {
        vec![("/generator/".to_string(), "Primary generator control".to_string())]
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("/generator/select")
                .guidance("Replace the primary generator.")
                .parameter(Parameter::new("id", ParameterKind::String)),
            Command::new("/generator/list").guidance("List the available primary generators."),
        ]
    }

    fn set_new_value(
        &self,
        target: &mut Kernel,
        command: &Command,
        args: &[String],
    ) -> gdmlview_core::Result<()> {
        let generator = target.generator_mut();
        match command.path() {
            "/generator/select" => generator
                .select_primary_generator(&args[0])
                .map_err(|err| GdmlviewError::command_failed(command.path(), err)),
            "/generator/list" => {
                let current = generator.generator_name();
                let lines: Vec<String> = generator
                    .generator_ids()
                    .into_iter()
                    .map(|id| {
                        let marker = if id == current { " (active)" } else { "" };
                        format!("  {id}{marker}")
                    })
                    .collect();
                for line in lines {
                    target.print(&line)?;
                }
                Ok(())
            }
            other => Err(GdmlviewError::CommandNotFound(other.to_string())),
        }
    }
}
