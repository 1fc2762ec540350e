//! `license_compat`: classify license-compatibility risk across a dependency
//! tree and rank remediation options.
//!
//! # Flow
//! 1. An external parser materializes the dependency tree ([`models::DependencyNode`]).
//! 2. [`config::load_config`] supplies project context, strict mode and custom rules.
//! 3. [`detect_conflicts`] walks the tree against the compatibility matrix
//!    ([`engine::matrix`]), rebuilds each contamination path, regrades it for
//!    the project's intent, ranks fixes and attributes the risk score.
//!
//! Each scan is a pure, single-threaded computation over its inputs.

pub mod config;
pub mod engine;
pub mod error;
pub mod license;
pub mod models;

pub use config::{load_config, ScanConfig};
pub use error::{CompatError, CompatResult};

use engine::{DynamicRiskEngine, FixEngine, ScanOrchestrator};
use license::LicenseCatalog;
use models::{
    CausalImpact, Conflict, DependencyNode, DynamicSeverity, FixSuggestion, ProjectContext,
    ScanResult,
};

/// Scan a dependency tree.
///
/// Fails only when the tree's root has no name.
pub fn detect_conflicts(tree: &DependencyNode, config: &ScanConfig) -> CompatResult<ScanResult> {
    ScanOrchestrator::new(config).scan(tree)
}

/// Grade one license pair against the project context. An empty
/// `project_license` means the project has not declared one.
pub fn calculate_severity(
    project_license: &str,
    dependency_license: &str,
    context: &ProjectContext,
) -> DynamicSeverity {
    let catalog = LicenseCatalog::builtin();
    DynamicRiskEngine::new(&catalog).calculate_severity(project_license, dependency_license, context)
}

/// Rank packages by how much of the risk penalty disappears with them.
pub fn analyze_impact(conflicts: &[Conflict], risk_score: u32) -> Vec<CausalImpact> {
    engine::causal::analyze(conflicts, risk_score)
}

/// Effort-ranked remediation options for one conflicting package.
pub fn generate_fixes(
    package: &str,
    dependency_license: &str,
    project_license: &str,
) -> Vec<FixSuggestion> {
    let catalog = LicenseCatalog::builtin();
    FixEngine::new(&catalog).generate_fixes(package, dependency_license, project_license)
}
