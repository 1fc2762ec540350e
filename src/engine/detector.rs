use tracing::{debug, info};

use crate::engine::matrix::CompatibilityMatrix;
use crate::models::{
    CandidateFix, CompatibilityVerdict, Conflict, ConflictDependency, DependencyNode,
    DistributionModel, LicenseCategory, LinkingModel, PathEntry, ProjectContext, ScanSummary,
    TriggeredRule,
};

/// Conflicts found in one tree, with their summary and aggregate score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub conflicts: Vec<Conflict>,
    pub summary: ScanSummary,
    pub risk_score: u32,
}

/// Aggregate risk score: 100 minus each conflict's severity penalty, clamped
/// to `0..=100`.
pub fn risk_score(conflicts: &[Conflict]) -> u32 {
    let penalty: u32 = conflicts.iter().map(|c| c.severity.penalty()).sum();
    100u32.saturating_sub(penalty)
}

/// Walks a dependency tree and evaluates every shipped node against the
/// compatibility matrix.
pub struct ConflictDetector<'a> {
    matrix: &'a CompatibilityMatrix,
    context: &'a ProjectContext,
    strict_mode: bool,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(matrix: &'a CompatibilityMatrix, context: &'a ProjectContext, strict_mode: bool) -> Self {
        Self {
            matrix,
            context,
            strict_mode,
        }
    }

    /// Depth-first scan. The root is the project itself and is not evaluated;
    /// dev-only nodes are not shipped and are skipped along with their subtree.
    pub fn scan(&self, root: &DependencyNode) -> Detection {
        let mut summary = ScanSummary {
            total_dependencies: root.descendant_count(),
            ..Default::default()
        };
        let mut conflicts = Vec::new();
        let mut trail = vec![path_entry(root, root.license.to_string())];

        for child in &root.children {
            self.visit(child, &mut trail, &mut conflicts, &mut summary);
        }

        let risk_score = risk_score(&conflicts);
        info!(
            conflicts = conflicts.len(),
            dependencies = summary.total_dependencies,
            risk_score,
            "scan complete"
        );

        Detection {
            conflicts,
            summary,
            risk_score,
        }
    }

    fn visit(
        &self,
        node: &DependencyNode,
        trail: &mut Vec<PathEntry>,
        conflicts: &mut Vec<Conflict>,
        summary: &mut ScanSummary,
    ) {
        if node.dev_only {
            summary.dev_only_skipped += 1 + node.descendant_count();
            return;
        }

        trail.push(path_entry(node, node.license.to_string()));

        if let Some((license, verdict)) = self.evaluate(node) {
            let conflict = self.conflict(node, license, verdict, trail, conflicts.len() + 1);
            debug!(
                id = %conflict.id,
                package = %node.name,
                license = %conflict.dependency.license,
                severity = %conflict.severity,
                "conflict"
            );
            summary.record(conflict.severity);
            conflicts.push(conflict);
        }

        for child in &node.children {
            self.visit(child, trail, conflicts, summary);
        }

        trail.pop();
    }

    fn linking_for(&self, node: &DependencyNode) -> LinkingModel {
        node.linking.unwrap_or(self.context.linking)
    }

    /// The worst verdict when no alternative is compatible, `None` otherwise.
    ///
    /// Ties keep the first alternative in declaration order.
    fn evaluate(&self, node: &DependencyNode) -> Option<(String, CompatibilityVerdict)> {
        let project = self.context.license.as_deref().unwrap_or("");
        let linking = self.linking_for(node);

        let mut worst: Option<(String, CompatibilityVerdict)> = None;
        for alternative in node.license.alternatives() {
            let verdict = self.matrix.is_compatible(
                project,
                alternative,
                linking,
                self.context.distribution,
                self.strict_mode,
            );
            if verdict.compatible {
                return None;
            }
            if worst
                .as_ref()
                .map_or(true, |(_, w)| verdict.severity > w.severity)
            {
                worst = Some((self.matrix.catalog().normalize(alternative), verdict));
            }
        }
        worst
    }

    fn conflict(
        &self,
        node: &DependencyNode,
        license: String,
        verdict: CompatibilityVerdict,
        trail: &[PathEntry],
        sequence: usize,
    ) -> Conflict {
        let mut contamination_path = trail.to_vec();
        if let Some(last) = contamination_path.last_mut() {
            last.license = license.clone();
            last.is_conflict_point = true;
        }

        let mut reason = verdict.reason;
        if node.license.is_choice() {
            reason = format!(
                "{} (none of the {} license alternatives is compatible)",
                reason,
                node.license.alternatives().len()
            );
        }

        Conflict {
            id: format!("conflict-{}", sequence),
            severity: verdict.severity,
            dependency: ConflictDependency {
                name: node.name.clone(),
                version: node.version.clone(),
                license: license.clone(),
                path: trail.iter().map(|e| e.name.clone()).collect(),
                linking: self.linking_for(node),
            },
            reason,
            contamination_path,
            candidate_fixes: self.candidate_fixes(&license, self.linking_for(node)),
            rule: TriggeredRule {
                id: verdict.rule_id,
                reference: verdict.legal_reference,
                is_heuristic: verdict.is_heuristic,
            },
        }
    }

    fn candidate_fixes(&self, license: &str, linking: LinkingModel) -> Vec<CandidateFix> {
        let mut fixes = Vec::new();
        if self.matrix.catalog().category(license) == LicenseCategory::StrongCopyleft {
            fixes.push(CandidateFix::Replace);
        }
        if linking == LinkingModel::Static {
            fixes.push(CandidateFix::IsolateProcessBoundary);
        }
        if self.context.distribution == DistributionModel::OpenSource {
            fixes.push(CandidateFix::Relicense);
        }
        fixes
    }
}

fn path_entry(node: &DependencyNode, license: String) -> PathEntry {
    PathEntry {
        name: node.name.clone(),
        version: node.version.clone(),
        license,
        is_conflict_point: false,
    }
}
