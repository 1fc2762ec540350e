//! Property tests for whole scans.

use proptest::prelude::*;

use license_compat::models::DependencyNode;
use license_compat::{detect_conflicts, ScanConfig};

use crate::strategies::{context, tree};

fn config(context: license_compat::models::ProjectContext, strict: bool) -> ScanConfig {
    ScanConfig {
        strict_mode: strict,
        project: context,
        ..ScanConfig::default()
    }
}

fn shipped(node: &DependencyNode) -> usize {
    node.children
        .iter()
        .filter(|c| !c.dev_only)
        .map(|c| 1 + shipped(c))
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: scanning the same input twice gives the same result.
    #[test]
    fn property_scan_is_idempotent(
        tree in tree(),
        context in context(),
        strict in any::<bool>(),
    ) {
        let cfg = config(context, strict);
        let first = detect_conflicts(&tree, &cfg).unwrap();
        let second = detect_conflicts(&tree, &cfg).unwrap();
        prop_assert_eq!(first, second);
    }

    /// PROPERTY: score, summary and conflict records stay consistent.
    #[test]
    fn property_scan_is_consistent(
        tree in tree(),
        context in context(),
        strict in any::<bool>(),
    ) {
        let result = detect_conflicts(&tree, &config(context, strict)).unwrap();

        let penalty: u32 = result.conflicts.iter().map(|c| c.conflict.severity.penalty()).sum();
        prop_assert_eq!(result.risk_score, 100u32.saturating_sub(penalty));
        prop_assert!(result.risk_score <= 100);

        prop_assert_eq!(result.summary.total_conflicts(), result.conflicts.len());
        prop_assert_eq!(result.summary.total_dependencies, tree.descendant_count());
        prop_assert_eq!(
            result.summary.total_dependencies - result.summary.dev_only_skipped,
            shipped(&tree)
        );
        prop_assert!(result.conflicts.len() <= shipped(&tree));
        prop_assert_eq!(result.paths.len(), result.conflicts.len());

        for (i, enhanced) in result.conflicts.iter().enumerate() {
            let conflict = &enhanced.conflict;
            prop_assert_eq!(&conflict.id, &format!("conflict-{}", i + 1));
            prop_assert!(!enhanced.fixes.is_empty());

            let path = &conflict.contamination_path;
            prop_assert!(path.len() >= 2);
            prop_assert_eq!(&path[0].name, &tree.name);
            prop_assert!(path[path.len() - 1].is_conflict_point);
            prop_assert_eq!(path.iter().filter(|e| e.is_conflict_point).count(), 1);
            let resolved = &result.paths[&conflict.id];
            prop_assert!(resolved.resolved);
            let names = |entries: &[license_compat::models::PathEntry]| {
                entries.iter().map(|e| e.name.clone()).collect::<Vec<_>>()
            };
            prop_assert_eq!(names(&resolved.path[..]), names(&path[..]));
        }
    }

    /// PROPERTY: strict mode never removes a conflict found without it.
    #[test]
    fn property_strict_scan_finds_at_least_as_much(
        tree in tree(),
        context in context(),
    ) {
        let lenient = detect_conflicts(&tree, &config(context.clone(), false)).unwrap();
        let strict = detect_conflicts(&tree, &config(context, true)).unwrap();
        prop_assert!(strict.conflicts.len() >= lenient.conflicts.len());
    }
}
