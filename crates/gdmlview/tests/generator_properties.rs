use gdmlview::generator::{GeneralParticleSource, PrimaryGenerator};
use gdmlview::vis::parse_size;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

proptest! {
    #[test]
    fn gps_directions_are_unit_vectors(seed in any::<u64>(), draws in 1usize..32) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut gps = GeneralParticleSource::default();
        for _ in 0..draws {
            let vertex = gps.generate_primary_vertex(&mut rng);
            prop_assert!((vertex.direction.length() - 1.0).abs() < 1e-9);
            prop_assert_eq!(vertex.position, glam::DVec3::ZERO);
        }
    }

    #[test]
    fn viewer_sizes_parse(width in 1u32..10_000, height in 1u32..10_000) {
        prop_assert_eq!(parse_size(&format!("{width}x{height}")).unwrap(), (width, height));
        let zero_height = format!("{width}x0");
        prop_assert!(parse_size(&zero_height).is_err());
    }
}
