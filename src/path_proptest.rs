//! Property-based tests for path resolution and property naming.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{
        alternate_version_property_name, join, package_version_property_name, resolve,
        ManifestFile, ALTERNATE_VERSION_SUFFIX, PACKAGE_VERSION_SUFFIX,
    };
    use proptest::prelude::*;

    const FILES: [ManifestFile; 5] = [
        ManifestFile::VersionDetailsXml,
        ManifestFile::VersionsProps,
        ManifestFile::VersionDetailsProps,
        ManifestFile::GlobalJson,
        ManifestFile::DotnetToolsJson,
    ];

    // ============================================================================
    // property name tests
    // ============================================================================

    proptest! {
        /// Property: property names never contain '.' or '-'
        #[test]
        fn property_names_have_no_separators(name in "[A-Za-z0-9.-]{0,40}") {
            for property in [package_version_property_name(&name), alternate_version_property_name(&name)] {
                prop_assert!(!property.contains('.'), "'{}' contains '.'", property);
                prop_assert!(!property.contains('-'), "'{}' contains '-'", property);
            }
        }

        /// Property: both names share the same stem
        #[test]
        fn property_names_share_stem(name in "[A-Za-z0-9.-]{0,40}") {
            let primary = package_version_property_name(&name);
            let alternate = alternate_version_property_name(&name);
            let primary_stem = primary.strip_suffix(PACKAGE_VERSION_SUFFIX);
            let alternate_stem = alternate.strip_suffix(ALTERNATE_VERSION_SUFFIX);
            prop_assert!(primary_stem.is_some());
            prop_assert_eq!(primary_stem, alternate_stem);
        }

        /// Property: names without separators are kept verbatim
        #[test]
        fn property_names_keep_plain_names(name in "[A-Za-z0-9]{1,40}") {
            prop_assert_eq!(package_version_property_name(&name), format!("{}PackageVersion", name));
        }
    }

    // ============================================================================
    // path resolution tests
    // ============================================================================

    proptest! {
        /// Property: without a base path every file resolves to its canonical path
        #[test]
        fn resolve_without_base_is_canonical(index in 0usize..5) {
            let file = FILES[index];
            prop_assert_eq!(resolve(file, None), file.canonical());
            prop_assert_eq!(resolve(file, Some("")), file.canonical());
        }

        /// Property: a base path is a '/'-separated prefix of the resolved path
        #[test]
        fn resolve_with_base_prefixes(base in "[a-z]{1,8}(/[a-z]{1,8}){0,3}", index in 0usize..5) {
            let file = FILES[index];
            let resolved = resolve(file, Some(&base));
            prop_assert_eq!(resolved, format!("{}/{}", base, file.canonical()));
        }

        /// Property: trailing slashes on the base path never double up
        #[test]
        fn join_ignores_trailing_slashes(base in "[a-z]{1,8}", slashes in "/{0,3}", suffix in "[a-z]{1,8}") {
            let joined = join(Some(&format!("{}{}", base, slashes)), &suffix);
            prop_assert!(!joined.contains("//"), "'{}' contains '//'", joined);
            prop_assert_eq!(joined, format!("{}/{}", base, suffix));
        }
    }
}
