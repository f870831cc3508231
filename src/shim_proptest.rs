//! Property-based tests for shim rendering and template substitution.
//!
//! These check that rendering is stable for any manifest and that arbitrary
//! identifiers and paths can never escape the string literals they are
//! embedded in.

#[cfg(test)]
mod proptest_tests {
    use crate::manifest::Manifest;
    use crate::shim::{js_string, ShimGenerator};
    use crate::transaction::render_text;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn generator(folders: BTreeMap<String, String>, modules: Vec<String>) -> ShimGenerator {
        let mut generator = ShimGenerator::new("/opt/app/out").with_home(Some(PathBuf::from("/home/u")));
        generator.set_manifest(Manifest {
            main_process_modules: modules.clone(),
            browser_modules: modules,
            folder_map: folders
                .into_iter()
                .map(|(k, v)| (k, PathBuf::from(v)))
                .collect(),
        });
        generator
    }

    // ============================================================================
    // js_string property tests
    // ============================================================================

    proptest! {
        /// Property: a JS literal always parses back to the original text
        #[test]
        fn js_string_round_trips_through_json(input in "\\PC*") {
            let literal = js_string(&input);
            let parsed: String = serde_json::from_str(&literal).unwrap();
            prop_assert_eq!(parsed, input);
        }

        /// Property: a JS literal never contains a raw line break
        #[test]
        fn js_string_is_single_line(input in ".*") {
            let literal = js_string(&input);
            prop_assert!(!literal.contains('\n'), "raw newline in {}", literal);
            prop_assert!(!literal.contains('\r'), "raw carriage return in {}", literal);
            prop_assert!(!literal.contains('\u{2028}'), "raw U+2028 in {}", literal);
            prop_assert!(!literal.contains('\u{2029}'), "raw U+2029 in {}", literal);
        }
    }

    // ============================================================================
    // ShimGenerator property tests
    // ============================================================================

    proptest! {
        /// Property: rendering the same manifest twice gives identical bytes
        #[test]
        fn rendering_is_deterministic(
            folders in prop::collection::btree_map("[a-z]{1,8}", "/[a-z/]{1,20}", 0..6),
            modules in prop::collection::vec("[a-z]{1,8}/[a-z]{1,8}", 0..6),
        ) {
            let generator = generator(folders, modules);
            prop_assert_eq!(generator.render_main_process_shim(), generator.render_main_process_shim());
            prop_assert_eq!(generator.render_ui_process_shim(), generator.render_ui_process_shim());
        }

        /// Property: the folder table lists keys in ascending order
        #[test]
        fn folder_table_is_sorted(
            folders in prop::collection::btree_map("[a-z]{1,8}", "/[a-z]{1,10}", 1..6),
        ) {
            let keys: Vec<String> = folders.keys().cloned().collect();
            let shim = generator(folders, Vec::new()).render_main_process_shim();

            let positions: Vec<usize> = keys
                .iter()
                .map(|k| shim.find(&format!("{} : ", js_string(k))).unwrap())
                .collect();
            let mut sorted = positions.clone();
            sorted.sort_unstable();
            prop_assert_eq!(positions, sorted);
        }

        /// Property: hostile folder names stay inside their literal
        #[test]
        fn hostile_names_do_not_add_lines(name in "\\PC{1,20}") {
            let mut folders = BTreeMap::new();
            folders.insert(name, "/p".to_string());
            let shim = generator(folders, Vec::new()).render_main_process_shim();

            // header, require.config, paths, one entry, two closers, blank, define
            prop_assert_eq!(shim.lines().count(), 8);
        }
    }

    // ============================================================================
    // render_text property tests
    // ============================================================================

    proptest! {
        /// Property: with no substitutions the text is unchanged
        #[test]
        fn render_text_without_substitutions_is_identity(input in ".*") {
            prop_assert_eq!(render_text(&input, &[]), input);
        }

        /// Property: a token absent from the text leaves it unchanged
        #[test]
        fn render_text_missing_token_is_identity(input in "[a-z ]*", replacement in ".*") {
            let subs = vec![("[[TOKEN]]".to_string(), replacement)];
            prop_assert_eq!(render_text(&input, &subs), input);
        }
    }
}
