//! Visualization: scenes, viewers and graphics drivers.
//!
//! Drivers are created by name from a [`DriverRegistry`]. Two are built in:
//! `ATree`, an indented text listing of the placement tree, and `JSON`, a
//! serialized scene dump. A flush renders the live world into the current
//! viewer and keeps the frame.

use std::fmt::Write as _;

use gdmlview_core::{ApplicationState, Command, FactoryRegistry, GdmlviewError, Messenger, Parameter, ParameterKind};
use gdmlview_geometry::{GeometryStore, PhysicalVolumeId};
use serde::Serialize;
use thiserror::Error;

use crate::app::Kernel;
use crate::generator::{Event, PrimaryVertex};

/// Errors raised by the visualization manager.
#[derive(Error, Debug)]
pub enum VisError {
    #[error("graphics driver '{0}' not found - see /vis/list")]
    UnknownDriver(String),

    #[error("invalid window size '{0}' - expected WIDTHxHEIGHT")]
    InvalidSize(String),

    #[error("no current viewer - use /vis/open")]
    NoViewer,

    #[error("no current scene - use /vis/scene/create")]
    NoScene,

    #[error("no world volume to draw")]
    NoWorld,

    #[error("failed to serialize scene")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VisError>;

/// Parses `800x600` (or `800`, meaning square) into a width and height.
pub fn parse_size(text: &str) -> Result<(u32, u32)> {
    let invalid = || VisError::InvalidSize(text.to_string());
    let (width, height) = match text.split_once(['x', 'X']) {
        Some((w, h)) => (w.parse().map_err(|_| invalid())?, h.parse().map_err(|_| invalid())?),
        None => {
            let side = text.parse().map_err(|_| invalid())?;
            (side, side)
        }
    };
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

/// A straight-line trajectory seeded by a primary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub event: u64,
    pub particle: String,
    pub start: [f64; 3],
    pub direction: [f64; 3],
}

impl Trajectory {
    fn from_vertex(event: u64, vertex: &PrimaryVertex) -> Self {
        Self {
            event,
            particle: vertex.particle.clone(),
            start: vertex.position.to_array(),
            direction: vertex.direction.to_array(),
        }
    }
}

/// What a viewer draws besides the world.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scene {
    pub name: String,
    pub draw_trajectories: bool,
    pub trajectories: Vec<Trajectory>,
}

/// Everything a driver needs to draw a frame.
pub struct FrameContext<'a> {
    pub store: &'a GeometryStore,
    pub world: PhysicalVolumeId,
    pub scene: &'a Scene,
    pub width: u32,
    pub height: u32,
}

/// Renders a frame to text.
pub trait GraphicsDriver {
    fn name(&self) -> &str;

    fn render(&mut self, frame: &FrameContext<'_>) -> Result<String>;
}

/// Indented listing of the placement tree.
#[derive(Debug, Default)]
pub struct ATreeDriver;

impl GraphicsDriver for ATreeDriver {
    fn name(&self) -> &str {
        "ATree"
    }

    fn render(&mut self, frame: &FrameContext<'_>) -> Result<String> {
        let store = frame.store;
        let placements = store.walk(frame.world);
        let mut out = String::new();
        let world_name = store.physical_volume(frame.world).name();
        let _ = writeln!(
            out,
            "#  Now dumping the geometry tree of world \"{world_name}\" ({} physical volumes)",
            placements.len()
        );
        for (depth, id) in placements {
            let pv = store.physical_volume(id);
            let lv = store.logical_volume(pv.logical());
            let solid = store.solid(lv.solid());
            let _ = write!(
                out,
                "{:indent$}\"{}\":{} / \"{}\" / \"{}\"({}), {}",
                "",
                pv.name(),
                pv.copy_number(),
                lv.name(),
                solid.name(),
                solid.shape().type_name(),
                lv.material(),
                indent = depth * 2
            );
            if !lv.is_visible() {
                out.push_str("  [invisible]");
            }
            out.push('\n');
        }
        if frame.scene.draw_trajectories {
            let _ = writeln!(out, "#  {} trajectories", frame.scene.trajectories.len());
        }
        Ok(out)
    }
}

#[derive(Serialize)]
struct SceneDump<'a> {
    scene: &'a str,
    width: u32,
    height: u32,
    extent: [[f64; 3]; 2],
    world: gdmlview_geometry::VolumeNode,
    trajectories: &'a [Trajectory],
}

/// Pretty-printed JSON scene dump.
#[derive(Debug, Default)]
pub struct JsonDriver;

impl GraphicsDriver for JsonDriver {
    fn name(&self) -> &str {
        "JSON"
    }

    fn render(&mut self, frame: &FrameContext<'_>) -> Result<String> {
        let (min, max) = frame.store.world_extent(frame.world);
        let trajectories: &[Trajectory] = if frame.scene.draw_trajectories {
            &frame.scene.trajectories
        } else {
            &[]
        };
        let dump = SceneDump {
            scene: &frame.scene.name,
            width: frame.width,
            height: frame.height,
            extent: [min.to_array(), max.to_array()],
            world: frame.store.snapshot(frame.world),
            trajectories,
        };
        Ok(serde_json::to_string_pretty(&dump)?)
    }
}

pub type DriverRegistry = FactoryRegistry<(), dyn GraphicsDriver>;

/// Registers the built-in drivers.
pub fn build_driver_registry() -> DriverRegistry {
    let mut registry = DriverRegistry::new();
    registry.register("ATree", |_: &()| -> Box<dyn GraphicsDriver> { Box::new(ATreeDriver) });
    registry.register("JSON", |_: &()| -> Box<dyn GraphicsDriver> { Box::new(JsonDriver) });
    registry
}

/// An open viewer.
pub struct Viewer {
    driver: Box<dyn GraphicsDriver>,
    width: u32,
    height: u32,
    frames: usize,
}

impl Viewer {
    pub fn driver_name(&self) -> &str {
        self.driver.name()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of frames drawn so far.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

/// Owns the driver registry, the current scene and the current viewer.
pub struct VisManager {
    drivers: DriverRegistry,
    scene: Option<Scene>,
    viewer: Option<Viewer>,
    scenes_created: usize,
    last_frame: Option<String>,
}

impl Default for VisManager {
    fn default() -> Self {
        Self::new()
    }
}

impl VisManager {
    pub fn new() -> Self {
        let drivers = build_driver_registry();
        log::info!("graphics drivers: {}", drivers.ids().join(", "));
        Self {
            drivers,
            scene: None,
            viewer: None,
            scenes_created: 0,
            last_frame: None,
        }
    }

    pub fn driver_names(&self) -> Vec<&str> {
        self.drivers.ids()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    /// The most recently rendered frame.
    pub fn last_frame(&self) -> Option<&str> {
        self.last_frame.as_deref()
    }

    /// Replaces the current scene with an empty one.
    ///
    /// An empty `name` gets a generated one.
    pub fn create_scene(&mut self, name: &str) {
        let name = if name.is_empty() {
            format!("scene-{}", self.scenes_created)
        } else {
            name.to_string()
        };
        self.scenes_created += 1;
        log::info!("scene '{name}' created");
        self.scene = Some(Scene {
            name,
            ..Scene::default()
        });
    }

    /// Opens a viewer on `driver`, creating a scene if there is none.
    pub fn open(&mut self, driver: &str, size: &str) -> Result<()> {
        let (width, height) = parse_size(size)?;
        let driver = self
            .drivers
            .create(driver, &())
            .ok_or_else(|| VisError::UnknownDriver(driver.to_string()))?;
        if self.scene.is_none() {
            self.create_scene("");
        }
        log::info!("viewer opened: {} {width}x{height}", driver.name());
        self.viewer = Some(Viewer {
            driver,
            width,
            height,
            frames: 0,
        });
        Ok(())
    }

    pub fn enable_trajectories(&mut self) -> Result<()> {
        let scene = self.scene.as_mut().ok_or(VisError::NoScene)?;
        scene.draw_trajectories = true;
        Ok(())
    }

    /// Keeps the primaries of a run as trajectories if the scene draws them.
    pub fn record_events(&mut self, events: &[Event]) {
        let Some(scene) = self.scene.as_mut().filter(|s| s.draw_trajectories) else {
            return;
        };
        scene.trajectories = events
            .iter()
            .flat_map(|event| {
                event
                    .primaries
                    .iter()
                    .map(|vertex| Trajectory::from_vertex(event.id, vertex))
            })
            .collect();
    }

    /// Renders the world into the current viewer and returns the frame.
    pub fn flush(&mut self, store: &GeometryStore, world: Option<PhysicalVolumeId>) -> Result<&str> {
        let viewer = self.viewer.as_mut().ok_or(VisError::NoViewer)?;
        let scene = self.scene.as_ref().ok_or(VisError::NoScene)?;
        let world = world.ok_or(VisError::NoWorld)?;
        let frame = viewer.driver.render(&FrameContext {
            store,
            world,
            scene,
            width: viewer.width,
            height: viewer.height,
        })?;
        viewer.frames += 1;
        log::debug!("frame {} drawn by {}", viewer.frames, viewer.driver.name());
        Ok(self.last_frame.insert(frame).as_str())
    }
}

/// Handles the `/vis/` commands.
#[derive(Debug, Default)]
pub struct VisMessenger;

impl Messenger<Kernel> for VisMessenger {
    fn directories(&self) -> Vec<(String, String)> {
        vec![
            ("/vis/".to_string(), "Visualization commands".to_string()),
            ("/vis/scene/".to_string(), "Scene control".to_string()),
            ("/vis/viewer/".to_string(), "Viewer control".to_string()),
        ]
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("/vis/scene/create")
                .guidance("Create an empty scene and make it current.")
                .parameter(Parameter::new("name", ParameterKind::String).omittable("")),
            Command::new("/vis/open")
                .guidance("Open a viewer on a graphics driver.")
                .parameter(Parameter::new("driver", ParameterKind::String))
                .parameter(Parameter::new("size", ParameterKind::String).omittable("600x600")),
            Command::new("/vis/viewer/flush")
                .guidance("Draw the world into the current viewer.")
                .available_for(&[ApplicationState::Idle]),
            Command::new("/vis/scene/add/trajectories")
                .guidance("Draw trajectories of the primaries of each run."),
            Command::new("/vis/list").guidance("List the available graphics drivers."),
        ]
    }

    fn set_new_value(
        &self,
        target: &mut Kernel,
        command: &Command,
        args: &[String],
    ) -> gdmlview_core::Result<()> {
        let fail = |err: VisError| GdmlviewError::command_failed(command.path(), err);
        match command.path() {
            "/vis/scene/create" => {
                target.vis_mut().create_scene(&args[0]);
                Ok(())
            }
            "/vis/open" => target.vis_mut().open(&args[0], &args[1]).map_err(fail),
            "/vis/viewer/flush" => {
                let frame = target.flush().map_err(fail)?.trim_end().to_string();
                target.print(&frame)
            }
            "/vis/scene/add/trajectories" => target.vis_mut().enable_trajectories().map_err(fail),
            "/vis/list" => {
                let names: Vec<String> = target
                    .vis()
                    .driver_names()
                    .into_iter()
                    .map(|name| format!("  {name}"))
                    .collect();
                for name in names {
                    target.print(&name)?;
                }
                Ok(())
            }
            other => Err(GdmlviewError::CommandNotFound(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("800x600").unwrap(), (800, 600));
        assert_eq!(parse_size("640").unwrap(), (640, 640));
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("wide").is_err());
        assert!(parse_size("10x").is_err());
    }

    #[test]
    fn test_open_requires_known_driver() {
        let mut vis = VisManager::new();
        assert!(matches!(
            vis.open("OGLSQt", "800x600"),
            Err(VisError::UnknownDriver(name)) if name == "OGLSQt"
        ));
        assert!(vis.scene().is_none());

        vis.open("ATree", "800x600").unwrap();
        assert_eq!(vis.scene().unwrap().name, "scene-0");
        assert_eq!(vis.viewer().unwrap().size(), (800, 600));
        assert_eq!(vis.driver_names(), ["ATree", "JSON"]);
    }

    #[test]
    fn test_flush_without_viewer_or_world() {
        let mut vis = VisManager::new();
        let store = GeometryStore::new();
        assert!(matches!(vis.flush(&store, None), Err(VisError::NoViewer)));
        vis.open("ATree", "10x10").unwrap();
        assert!(matches!(vis.flush(&store, None), Err(VisError::NoWorld)));
        assert!(vis.last_frame().is_none());
    }

    #[test]
    fn test_trajectories_follow_scene_flag() {
        let mut vis = VisManager::new();
        let event = Event {
            id: 0,
            primaries: vec![PrimaryVertex {
                particle: "geantino".into(),
                energy: 1.0,
                position: glam::DVec3::ZERO,
                direction: glam::DVec3::X,
            }],
        };
        assert!(matches!(vis.enable_trajectories(), Err(VisError::NoScene)));
        vis.create_scene("main");
        vis.record_events(std::slice::from_ref(&event));
        assert!(vis.scene().unwrap().trajectories.is_empty());

        vis.enable_trajectories().unwrap();
        vis.record_events(&[event]);
        assert_eq!(vis.scene().unwrap().trajectories.len(), 1);
    }
}
