//! Property tests for command path resolution.

use gdmlview_ui::{resolve_directory, resolve_path};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(".".to_string()),
        Just("..".to_string()),
        Just(String::new()),
        "[a-zA-Z]{1,6}",
    ]
}

fn path() -> impl Strategy<Value = String> {
    (any::<bool>(), prop::collection::vec(segment(), 0..6)).prop_map(|(absolute, segments)| {
        let joined = segments.join("/");
        if absolute {
            format!("/{joined}")
        } else {
            joined
        }
    })
}

proptest! {
    #[test]
    fn resolved_paths_are_normal(current in path(), relative in path()) {
        let directory = resolve_directory("/", &current);
        let resolved = resolve_path(&directory, &relative);

        prop_assert!(resolved.starts_with('/'));
        prop_assert!(resolved == "/" || !resolved.ends_with('/'));
        for segment in resolved.split('/').skip(1) {
            prop_assert!(segment != "." && segment != "..");
            prop_assert!(resolved == "/" || !segment.is_empty());
        }
        // Resolving an absolute result again changes nothing.
        prop_assert_eq!(resolve_path(&directory, &resolved), resolved.clone());
    }

    #[test]
    fn directories_end_with_slash(current in path(), relative in path()) {
        let directory = resolve_directory(&resolve_directory("/", &current), &relative);
        prop_assert!(directory.starts_with('/'));
        prop_assert!(directory.ends_with('/'));
    }
}
