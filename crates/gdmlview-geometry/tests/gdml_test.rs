//! Reading the GDML fixtures under `tests/data/` into a store.

use std::path::PathBuf;

use gdmlview_geometry::gdml::{GdmlDocument, MaterialKind};
use gdmlview_geometry::{GeometryError, GeometryStore, Shape};
use glam::DVec3;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn approx(a: DVec3, b: DVec3) -> bool {
    (a - b).length() < 1e-9
}

#[test]
fn test_detector_document() {
    let document = GdmlDocument::read_file(data("detector.gdml")).expect("read failed");

    assert_eq!(document.solids().len(), 5);
    assert_eq!(document.volumes().len(), 3);
    let setups: Vec<_> = document.setups().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(setups, ["Default", "Calorimeter"]);

    let scintillator = &document.materials()[2];
    assert_eq!(scintillator.name, "Scintillator");
    assert_eq!(scintillator.kind, MaterialKind::Material);
    assert_eq!(scintillator.density, Some(1.032));

    // The document keeps names as written; the store gets stripped ones.
    assert_eq!(document.volumes()[2].name, "World0x1a2c");
    assert_eq!(document.volumes()[2].solid, "WorldBox0x1a2b");
}

#[test]
fn test_build_default_setup() {
    let document = GdmlDocument::read_file(data("detector.gdml")).unwrap();
    let mut store = GeometryStore::new();
    let world = document.build(&mut store, "Default").unwrap();

    assert_eq!(store.num_solids(), 5);
    assert_eq!(store.num_logical_volumes(), 3);
    assert_eq!(store.num_physical_volumes(), 4);

    let world_pv = store.physical_volume(world);
    assert_eq!(world_pv.name(), "World");
    assert!(world_pv.mother().is_none());

    // The reader hides the world volume.
    let world_lv = store.logical_volume(world_pv.logical());
    assert!(!world_lv.is_visible());
    assert_eq!(world_lv.daughters().len(), 3);

    let (min, max) = store.world_extent(world);
    assert!(approx(min, DVec3::splat(-1000.0)));
    assert!(approx(max, DVec3::splat(1000.0)));

    let tracker2 = store.find_physical_volume("Tracker2").unwrap();
    let tracker2 = store.physical_volume(tracker2);
    assert_eq!(tracker2.copy_number(), 2);
    assert!(approx(tracker2.translation(), DVec3::new(0.0, 0.0, -200.0)));
    assert!(tracker2.rotation().angle_between(glam::DQuat::IDENTITY) > 0.5);

    // Unnamed placements are named after their volume.
    assert!(store.find_physical_volume("Calo_PV").is_some());

    let tree = store.snapshot(world);
    assert_eq!(tree.count(), 4);
    assert_eq!(tree.daughters[2].material, "Scintillator");
    assert_eq!(tree.daughters[2].shape, "subtraction");
}

#[test]
fn test_same_base_names_stay_distinct() {
    let document = GdmlDocument::parse_str(
        r#"<gdml>
            <solids>
                <box name="World0x7a" x="1000" y="1000" z="1000"/>
                <box name="Layer0x1a" x="100" y="100" z="10"/>
                <orb name="Layer0x2b" r="50"/>
            </solids>
            <structure>
                <volume name="Layer0x4d"><materialref ref="G4_Si"/><solidref ref="Layer0x1a"/></volume>
                <volume name="Layer0x5e"><materialref ref="G4_Pb"/><solidref ref="Layer0x2b"/></volume>
                <volume name="World0x6f">
                    <materialref ref="G4_AIR"/><solidref ref="World0x7a"/>
                    <physvol><volumeref ref="Layer0x4d"/></physvol>
                    <physvol><volumeref ref="Layer0x5e"/><position name="up" z="100"/></physvol>
                </volume>
            </structure>
            <setup name="Default" version="1.0"><world ref="World0x6f"/></setup>
        </gdml>"#,
    )
    .expect("same base names must not collide");
    assert_eq!(document.solids().len(), 3);
    assert_eq!(document.volumes().len(), 3);

    let mut store = GeometryStore::new();
    let world = document.build(&mut store, "Default").unwrap();
    assert_eq!(store.num_solids(), 3);
    assert_eq!(store.num_logical_volumes(), 3);
    assert_eq!(store.physical_volume(world).name(), "World");

    // The first of a colliding pair gets the stripped name.
    let box_layer = store.find_solid("Layer").unwrap();
    let orb_layer = store.find_solid("Layer0x2b").unwrap();
    assert_eq!(store.solid(box_layer).shape().type_name(), "box");
    assert_eq!(store.solid(orb_layer).shape().type_name(), "orb");
    assert!(store.find_logical_volume("Layer").is_some());
    assert!(store.find_logical_volume("Layer0x5e").is_some());

    let tree = store.snapshot(world);
    assert_eq!(tree.count(), 3);
    assert_eq!(tree.daughters[0].logical_volume, "Layer");
    assert_eq!(tree.daughters[0].solid, "Layer");
    assert_eq!(tree.daughters[1].logical_volume, "Layer0x5e");
    assert_eq!(tree.daughters[1].solid, "Layer0x2b");
    assert_eq!(tree.daughters[1].material, "G4_Pb");
}

#[test]
fn test_build_named_setup() {
    let document = GdmlDocument::read_file(data("detector.gdml")).unwrap();
    let mut store = GeometryStore::new();
    let world = document.build(&mut store, "Calorimeter").unwrap();

    assert_eq!(store.physical_volume(world).name(), "Calo");
    assert_eq!(store.walk(world).len(), 1);
    let (_, max) = store.world_extent(world);
    assert!(approx(max, DVec3::new(300.0, 300.0, 200.0)));
}

#[test]
fn test_unknown_setup() {
    let document = GdmlDocument::read_file(data("detector.gdml")).unwrap();
    let mut store = GeometryStore::new();
    let err = document.build(&mut store, "Muon").unwrap_err();
    assert!(matches!(err, GeometryError::SetupNotFound(name) if name == "Muon"));
    assert!(store.is_empty());
}

#[test]
fn test_default_falls_back_to_first_setup() {
    let document = GdmlDocument::read_file(data("sphere.gdml")).unwrap();
    let mut store = GeometryStore::new();
    let world = document.build(&mut store, "Default").unwrap();
    assert_eq!(store.physical_volume(world).name(), "Vacuum");

    let shapes: Vec<_> = store
        .walk(world)
        .into_iter()
        .map(|(depth, id)| {
            let lv = store.logical_volume(store.physical_volume(id).logical());
            (depth, store.solid(lv.solid()).shape().type_name())
        })
        .collect();
    assert_eq!(
        shapes,
        [(0, "orb"), (1, "sphere"), (1, "cone"), (1, "trd")]
    );

    let nozzle = store.find_solid("Nozzle").unwrap();
    match store.solid(nozzle).shape() {
        Shape::Cone { rmax2, half_z, .. } => {
            assert_eq!(*rmax2, 100.0);
            assert_eq!(*half_z, 150.0);
        }
        other => panic!("expected a cone, got {other:?}"),
    }
}

#[test]
fn test_broken_document() {
    let err = GdmlDocument::read_file(data("broken.gdml")).unwrap_err();
    assert!(
        matches!(&err, GeometryError::UndefinedReference { kind: "solid", name } if name == "MissingBox"),
        "unexpected error: {err}"
    );
}

#[test]
fn test_document_without_setup() {
    let document = GdmlDocument::parse_str(
        r#"<gdml><solids><orb name="O" r="1"/></solids>
           <structure><volume name="V"><materialref ref="G4_AIR"/><solidref ref="O"/></volume></structure>
        </gdml>"#,
    )
    .unwrap();
    let mut store = GeometryStore::new();
    assert!(matches!(
        document.build(&mut store, "Default"),
        Err(GeometryError::NoSetup)
    ));
}
