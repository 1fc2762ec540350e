use crate::license::LicenseCatalog;
use crate::models::{Effort, FixStrategy, FixSuggestion};

pub struct FixEngine<'a> {
    catalog: &'a LicenseCatalog,
}

impl<'a> FixEngine<'a> {
    pub fn new(catalog: &'a LicenseCatalog) -> Self {
        Self { catalog }
    }

    /// Remediation options for one conflicting package, cheapest first.
    ///
    /// Replace, isolate, remove and boundary-refactor are always offered, so
    /// the list is never empty.
    pub fn generate_fixes(
        &self,
        package: &str,
        dependency_license: &str,
        project_license: &str,
    ) -> Vec<FixSuggestion> {
        let dep = self.catalog.normalize(dependency_license);
        let project = project_license.trim();

        let mut fixes = vec![
            suggestion(
                FixStrategy::Replace,
                format!("Replace {} with a permissively licensed alternative", package),
                Effort::Low,
                &[
                    "Alternative may lack features or maturity",
                    "Call sites need to move to the new API",
                ],
                "1-3 days",
            ),
            suggestion(
                FixStrategy::Isolate,
                format!(
                    "Run {} behind a process or plugin boundary and talk to it over IPC",
                    package
                ),
                Effort::Medium,
                &[
                    "Adds serialization and process management overhead",
                    "Boundary must hold up to legal review",
                ],
                "1-2 weeks",
            ),
            suggestion(
                FixStrategy::Remove,
                format!("Remove {} and implement the functionality in-house", package),
                Effort::High,
                &[
                    "Full development and maintenance cost moves to the team",
                    "Clean-room process needed to avoid derived code",
                ],
                "2-6 weeks",
            ),
            suggestion(
                FixStrategy::BoundaryRefactor,
                format!(
                    "Restructure the architecture so {} only runs in a separately distributed component",
                    package
                ),
                Effort::High,
                &[
                    "Large refactor touching deployment and packaging",
                    "Separate component still carries the dependency's obligations",
                ],
                "3-8 weeks",
            ),
        ];

        if dep == "GPL-2.0" {
            fixes.push(suggestion(
                FixStrategy::Upgrade,
                format!(
                    "Upgrade {} to a release under a more compatible license, or use the \"or later\" grant to take it under GPL-3.0",
                    package
                ),
                Effort::Low,
                &[
                    "Newer release may not exist or may break the API",
                    "GPL-3.0 is still copyleft",
                ],
                "hours to 2 days",
            ));
        }

        if dep.to_uppercase().contains("GPL")
            && !project.is_empty()
            && !self.catalog.normalize(project).to_uppercase().contains("GPL")
        {
            fixes.push(suggestion(
                FixStrategy::DualLicense,
                format!(
                    "Ask the {} maintainers for a commercial or dual license compatible with {}",
                    package, project
                ),
                Effort::Low,
                &[
                    "May involve licensing fees",
                    "Depends on the copyright holders agreeing",
                ],
                "1-4 weeks (negotiation)",
            ));
        }

        fixes.sort_by_key(|f| f.effort);
        fixes
    }
}

fn suggestion(
    strategy: FixStrategy,
    description: String,
    effort: Effort,
    tradeoffs: &[&str],
    time_estimate: &str,
) -> FixSuggestion {
    FixSuggestion {
        strategy,
        description,
        effort,
        tradeoffs: tradeoffs.iter().map(|t| t.to_string()).collect(),
        time_estimate: time_estimate.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategies(dep: &str, project: &str) -> Vec<FixStrategy> {
        let catalog = LicenseCatalog::builtin();
        FixEngine::new(&catalog)
            .generate_fixes("pkg", dep, project)
            .into_iter()
            .map(|f| f.strategy)
            .collect()
    }

    #[test]
    fn test_baseline_fixes() {
        assert_eq!(
            strategies("MPL-2.0", "MIT"),
            vec![
                FixStrategy::Replace,
                FixStrategy::Isolate,
                FixStrategy::Remove,
                FixStrategy::BoundaryRefactor,
            ]
        );
    }

    #[test]
    fn test_gpl2_gets_upgrade_and_dual_license() {
        let s = strategies("GPL-2.0", "MIT");
        assert_eq!(
            s,
            vec![
                FixStrategy::Replace,
                FixStrategy::Upgrade,
                FixStrategy::DualLicense,
                FixStrategy::Isolate,
                FixStrategy::Remove,
                FixStrategy::BoundaryRefactor,
            ]
        );
    }

    #[test]
    fn test_upgrade_for_gpl2_aliases() {
        assert!(strategies("GPL-2.0-only", "").contains(&FixStrategy::Upgrade));
        assert!(strategies("GPLv2", "").contains(&FixStrategy::Upgrade));
        assert!(!strategies("GPL-3.0", "").contains(&FixStrategy::Upgrade));
    }

    #[test]
    fn test_no_dual_license_without_project_license() {
        assert!(!strategies("GPL-3.0", "").contains(&FixStrategy::DualLicense));
        assert!(!strategies("GPL-3.0", "  ").contains(&FixStrategy::DualLicense));
    }

    #[test]
    fn test_no_dual_license_for_gpl_project() {
        assert!(!strategies("AGPL-3.0", "GPL-3.0").contains(&FixStrategy::DualLicense));
        assert!(strategies("AGPL-3.0", "Apache-2.0").contains(&FixStrategy::DualLicense));
    }

    #[test]
    fn test_sorted_by_effort_and_annotated() {
        let catalog = LicenseCatalog::builtin();
        let fixes = FixEngine::new(&catalog).generate_fixes("readline", "GPL-2.0", "MIT");
        assert!(fixes.windows(2).all(|w| w[0].effort <= w[1].effort));
        for f in &fixes {
            assert!(!f.tradeoffs.is_empty());
            assert!(!f.time_estimate.is_empty());
        }
        assert!(fixes[0].description.contains("readline"));
    }
}
