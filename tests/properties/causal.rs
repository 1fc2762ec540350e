//! Property tests for causal impact attribution.

use proptest::prelude::*;

use license_compat::analyze_impact;
use license_compat::models::{Conflict, DependencyNode};
use license_compat::{detect_conflicts, ScanConfig};

use crate::strategies::{context, tree};

fn repeated_gpl_conflicts(count: usize) -> Vec<Conflict> {
    let mut tree = DependencyNode::new("app", "1.0.0", "MIT");
    for _ in 0..count {
        tree = tree.with_child(DependencyNode::new("readline", "8.0.0", "GPL-3.0"));
    }
    let mut cfg = ScanConfig::default();
    cfg.project.license = Some("MIT".to_string());
    detect_conflicts(&tree, &cfg)
        .unwrap()
        .conflicts
        .into_iter()
        .map(|c| c.conflict)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: repeated identical conflicts never push a package past 100%.
    #[test]
    fn property_contribution_is_clamped(
        count in 1usize..8,
        score in 0u32..100,
    ) {
        let conflicts = repeated_gpl_conflicts(count);
        for impact in analyze_impact(&conflicts, score) {
            prop_assert!(impact.contribution_pct <= 100.0);
            prop_assert!(impact.contribution_pct > 0.0);
            prop_assert!(impact.risk_score_without <= 100);
            prop_assert_eq!(impact.conflicts_removed, count);
        }
    }

    /// PROPERTY: impacts from a real scan are ordered and bounded.
    #[test]
    fn property_scan_impacts_sorted(
        tree in tree(),
        context in context(),
    ) {
        let cfg = ScanConfig { project: context, ..ScanConfig::default() };
        let result = detect_conflicts(&tree, &cfg).unwrap();
        for pair in result.impacts.windows(2) {
            prop_assert!(pair[0].contribution_pct >= pair[1].contribution_pct);
        }
        for impact in &result.impacts {
            prop_assert!((0.0..=100.0).contains(&impact.contribution_pct));
            prop_assert!(impact.risk_score_without >= result.risk_score);
        }
    }
}

#[test]
fn single_conflict_matching_baseline_is_full_share() {
    let conflicts = repeated_gpl_conflicts(1);
    let impacts = analyze_impact(&conflicts, 70);
    assert_eq!(impacts.len(), 1);
    assert_eq!(impacts[0].contribution_pct, 100.0);
}
