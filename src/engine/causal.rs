use std::collections::{HashMap, HashSet};

use crate::models::{CausalImpact, Conflict, SeverityBreakdown};

#[derive(Default)]
struct Tally {
    weight: u32,
    conflicts: usize,
    breakdown: SeverityBreakdown,
}

/// Attribute the aggregate risk penalty to every package that appears on a
/// conflict's contamination path.
///
/// Each package receives the full weight of every conflict whose path runs
/// through it, so overlapping paths count once per package and the
/// percentages do not sum to 100. A percentage answers "how much of the
/// penalty goes away if this package is removed".
///
/// Returns an empty list when there are no conflicts or no penalty.
pub fn analyze(conflicts: &[Conflict], risk_score: u32) -> Vec<CausalImpact> {
    let baseline = 100u32.saturating_sub(risk_score);
    if conflicts.is_empty() || baseline == 0 {
        return Vec::new();
    }

    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    for conflict in conflicts {
        let weight = conflict.severity.penalty();
        let mut seen = HashSet::new();
        // The first entry is the project root and is never removable.
        for entry in conflict.contamination_path.iter().skip(1) {
            if !seen.insert(entry.name.as_str()) {
                continue;
            }
            let tally = tallies.entry(entry.name.as_str()).or_default();
            tally.weight += weight;
            tally.conflicts += 1;
            tally.breakdown.record(conflict.severity);
        }
    }

    let mut impacts: Vec<CausalImpact> = tallies
        .into_iter()
        .map(|(package, tally)| CausalImpact {
            package: package.to_string(),
            contribution_pct: (100.0 * f64::from(tally.weight) / f64::from(baseline)).min(100.0),
            conflicts_removed: tally.conflicts,
            breakdown: tally.breakdown,
            risk_score_without: (risk_score + tally.weight).min(100),
        })
        .collect();

    impacts.sort_by(|a, b| {
        b.contribution_pct
            .total_cmp(&a.contribution_pct)
            .then_with(|| b.conflicts_removed.cmp(&a.conflicts_removed))
            .then_with(|| a.package.cmp(&b.package))
    });
    impacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConflictDependency, LinkingModel, PathEntry, Severity, TriggeredRule};

    fn conflict(severity: Severity, chain: &[&str]) -> Conflict {
        let path: Vec<PathEntry> = chain
            .iter()
            .enumerate()
            .map(|(i, name)| PathEntry {
                name: name.to_string(),
                version: "1.0.0".to_string(),
                license: "MIT".to_string(),
                is_conflict_point: i + 1 == chain.len(),
            })
            .collect();
        let last = chain[chain.len() - 1];
        Conflict {
            id: format!("conflict-{}", last),
            severity,
            dependency: ConflictDependency {
                name: last.to_string(),
                version: "1.0.0".to_string(),
                license: "GPL-3.0".to_string(),
                path: chain.iter().map(|s| s.to_string()).collect(),
                linking: LinkingModel::Static,
            },
            reason: String::new(),
            contamination_path: path,
            candidate_fixes: vec![],
            rule: TriggeredRule {
                id: "TEST".to_string(),
                reference: None,
                is_heuristic: false,
            },
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(analyze(&[], 100).is_empty());
        assert!(analyze(&[], 40).is_empty());
    }

    #[test]
    fn test_zero_penalty() {
        let conflicts = vec![conflict(Severity::Low, &["app", "a"])];
        assert!(analyze(&conflicts, 100).is_empty());
    }

    #[test]
    fn test_single_conflict_is_full_contribution() {
        let conflicts = vec![conflict(Severity::Critical, &["app", "gpl"])];
        let impacts = analyze(&conflicts, 70);
        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].package, "gpl");
        assert_eq!(impacts[0].contribution_pct, 100.0);
        assert_eq!(impacts[0].risk_score_without, 100);
        assert_eq!(impacts[0].breakdown.critical, 1);
    }

    #[test]
    fn test_intermediate_nodes_share_weight() {
        let conflicts = vec![
            conflict(Severity::Critical, &["app", "http", "gpl-a"]),
            conflict(Severity::High, &["app", "http", "gpl-b"]),
        ];
        // baseline = 45
        let impacts = analyze(&conflicts, 55);
        let names: Vec<_> = impacts.iter().map(|i| i.package.as_str()).collect();
        assert_eq!(names, vec!["http", "gpl-a", "gpl-b"]);

        assert_eq!(impacts[0].contribution_pct, 100.0);
        assert_eq!(impacts[0].conflicts_removed, 2);
        assert_eq!(impacts[0].risk_score_without, 100);
        assert!((impacts[1].contribution_pct - 100.0 * 30.0 / 45.0).abs() < 1e-9);
        assert_eq!(impacts[1].risk_score_without, 85);
        assert_eq!(impacts[2].risk_score_without, 70);
    }

    #[test]
    fn test_ties_break_on_count_then_name() {
        let conflicts = vec![
            conflict(Severity::Medium, &["app", "zeta"]),
            conflict(Severity::Medium, &["app", "alpha"]),
        ];
        let impacts = analyze(&conflicts, 90);
        assert_eq!(impacts[0].package, "alpha");
        assert_eq!(impacts[1].package, "zeta");
        assert_eq!(impacts[0].contribution_pct, 50.0);
    }

    #[test]
    fn test_repeated_conflicts_clamped() {
        let conflicts: Vec<_> = (0..4)
            .map(|_| conflict(Severity::Critical, &["app", "gpl"]))
            .collect();
        let impacts = analyze(&conflicts, 0);
        assert_eq!(impacts[0].contribution_pct, 100.0);
        assert_eq!(impacts[0].conflicts_removed, 4);
        assert_eq!(impacts[0].risk_score_without, 100);
    }
}
