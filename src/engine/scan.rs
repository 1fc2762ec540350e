use std::collections::BTreeMap;

use tracing::debug;

use crate::config::ScanConfig;
use crate::engine::causal;
use crate::engine::detector::ConflictDetector;
use crate::engine::fixes::FixEngine;
use crate::engine::matrix::CompatibilityMatrix;
use crate::engine::path::PathResolver;
use crate::engine::risk::DynamicRiskEngine;
use crate::error::{CompatError, CompatResult};
use crate::models::{
    DependencyNode, EnhancedConflict, ProjectContext, ScanMetadata, ScanResult,
};

/// Runs one complete scan: detection, path reconstruction, context grading,
/// fix ranking and causal attribution.
///
/// Holds no state between calls; the same tree and config always produce
/// the same result.
pub struct ScanOrchestrator {
    matrix: CompatibilityMatrix,
    context: ProjectContext,
    strict_mode: bool,
    metadata: ScanMetadata,
}

impl ScanOrchestrator {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            matrix: config.matrix(),
            context: config.project.clone(),
            strict_mode: config.strict_mode,
            metadata: config.scan.clone(),
        }
    }

    pub fn scan(&self, tree: &DependencyNode) -> CompatResult<ScanResult> {
        if tree.name.trim().is_empty() {
            return Err(CompatError::UnnamedRoot);
        }

        let catalog = self.matrix.catalog();
        let project_license = self.context.license.as_deref().unwrap_or("");

        let detection = ConflictDetector::new(&self.matrix, &self.context, self.strict_mode).scan(tree);

        let resolver = PathResolver::new(catalog);
        let grader = DynamicRiskEngine::new(catalog);
        let fixer = FixEngine::new(catalog);

        let mut paths = BTreeMap::new();
        let mut conflicts = Vec::with_capacity(detection.conflicts.len());
        for conflict in &detection.conflicts {
            let dependency = &conflict.dependency;
            paths.insert(
                conflict.id.clone(),
                resolver.build_conflict_path(tree, dependency, project_license),
            );

            let context = ProjectContext {
                linking: dependency.linking,
                ..self.context.clone()
            };
            let dynamic_severity =
                grader.calculate_severity(project_license, &dependency.license, &context);
            debug!(
                id = %conflict.id,
                static_severity = %conflict.severity,
                dynamic = %dynamic_severity.level,
                "graded"
            );

            conflicts.push(EnhancedConflict {
                conflict: conflict.clone(),
                dynamic_severity,
                fixes: fixer.generate_fixes(&dependency.name, &dependency.license, project_license),
            });
        }

        let impacts = causal::analyze(&detection.conflicts, detection.risk_score);

        Ok(ScanResult {
            metadata: self.metadata.clone(),
            context: self.context.clone(),
            conflicts,
            summary: detection.summary,
            risk_score: detection.risk_score,
            paths,
            impacts,
        })
    }
}
