use std::collections::HashMap;

use tracing::{debug, warn};

use crate::engine::rules::{builtin_rules, CompatibilityRule};
use crate::license::{LicenseCatalog, UNKNOWN_LICENSE};
use crate::models::{
    CompatibilityVerdict, DistributionModel, LicenseCategory, LinkingModel, Severity,
};

pub const STRICT_MODE_VIOLATION: &str = "STRICT_MODE_VIOLATION";

type RuleKey = (String, String, LinkingModel, DistributionModel);

/// License-pair compatibility lookup.
///
/// Precedence:
/// 1. exact `(project, dependency, linking, distribution)` rule
/// 2. rule with a wildcarded license field; dependency-specific beats
///    project-specific beats fully wildcarded
/// 3. strict mode: incompatible / HIGH, tagged [`STRICT_MODE_VIOLATION`]
/// 4. heuristic by dependency category
///
/// The lookup is total: every input yields a fully populated verdict.
#[derive(Debug, Clone)]
pub struct CompatibilityMatrix {
    catalog: LicenseCatalog,
    rules: Vec<CompatibilityRule>,
    /// Index of fully specified rules; the first rule for a key wins.
    exact: HashMap<RuleKey, usize>,
}

impl Default for CompatibilityMatrix {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CompatibilityMatrix {
    pub fn new(catalog: LicenseCatalog, rules: Vec<CompatibilityRule>) -> Self {
        let mut exact = HashMap::new();
        for (index, rule) in rules.iter().enumerate() {
            if rule.is_exact() {
                exact.entry(key(rule)).or_insert(index);
            }
        }
        Self {
            catalog,
            rules,
            exact,
        }
    }

    pub fn builtin() -> Self {
        Self::new(LicenseCatalog::builtin(), builtin_rules())
    }

    /// Built-in table with `custom` rules taking precedence over it.
    pub fn with_custom_rules(catalog: LicenseCatalog, custom: Vec<CompatibilityRule>) -> Self {
        let mut rules = custom;
        rules.extend(builtin_rules());
        Self::new(catalog, rules)
    }

    pub fn catalog(&self) -> &LicenseCatalog {
        &self.catalog
    }

    /// Decide whether `dependency_license` may be used by a project licensed
    /// under `project_license`. An empty project license means "undeclared".
    pub fn is_compatible(
        &self,
        project_license: &str,
        dependency_license: &str,
        linking: LinkingModel,
        distribution: DistributionModel,
        strict_mode: bool,
    ) -> CompatibilityVerdict {
        let project = self.catalog.normalize(project_license);
        let dependency = self.catalog.normalize(dependency_license);

        if let Some(rule) = self.exact_rule(&project, &dependency, linking, distribution) {
            debug!(rule = %rule.rule_id, %project, %dependency, "exact rule matched");
            return rule.verdict();
        }

        if let Some(rule) = self.wildcard_rule(&project, &dependency, linking, distribution) {
            debug!(rule = %rule.rule_id, %project, %dependency, "wildcard rule matched");
            return rule.verdict();
        }

        if strict_mode {
            debug!(%project, %dependency, "no rule in strict mode");
            return CompatibilityVerdict {
                compatible: false,
                severity: Severity::High,
                reason: format!(
                    "No explicit rule covers {} under {} ({} linking, {} distribution); strict \
                     mode requires one",
                    dependency,
                    display_project(&project),
                    linking,
                    distribution
                ),
                rule_id: STRICT_MODE_VIOLATION.to_string(),
                is_heuristic: true,
                legal_reference: None,
                legal_basis: None,
            };
        }

        self.heuristic(&dependency, linking, distribution)
    }

    fn exact_rule(
        &self,
        project: &str,
        dependency: &str,
        linking: LinkingModel,
        distribution: DistributionModel,
    ) -> Option<&CompatibilityRule> {
        let key = (
            project.to_lowercase(),
            dependency.to_lowercase(),
            linking,
            distribution,
        );
        self.exact.get(&key).map(|&i| &self.rules[i])
    }

    fn wildcard_rule(
        &self,
        project: &str,
        dependency: &str,
        linking: LinkingModel,
        distribution: DistributionModel,
    ) -> Option<&CompatibilityRule> {
        let candidates = || {
            self.rules.iter().filter(move |r| {
                !r.is_exact()
                    && r.linking == linking
                    && r.distribution == distribution
                    && r.project_license.matches(project)
                    && r.dependency_license.matches(dependency)
            })
        };

        candidates()
            .find(|r| r.project_license.is_wildcard() && !r.dependency_license.is_wildcard())
            .or_else(|| {
                candidates().find(|r| {
                    !r.project_license.is_wildcard() && r.dependency_license.is_wildcard()
                })
            })
            .or_else(|| candidates().next())
    }

    fn heuristic(
        &self,
        dependency: &str,
        linking: LinkingModel,
        distribution: DistributionModel,
    ) -> CompatibilityVerdict {
        let category = self.catalog.category(dependency);
        let (compatible, severity, rule_id, reason) = match category {
            LicenseCategory::Unknown => {
                warn!(license = %dependency, "unrecognized license, assuming compatible");
                (
                    true,
                    Severity::Low,
                    "HEURISTIC_UNKNOWN_LICENSE",
                    if dependency == UNKNOWN_LICENSE {
                        "No license declared; manual review required before shipping".to_string()
                    } else {
                        format!(
                            "Unrecognized license '{}'; manual review required before shipping",
                            dependency
                        )
                    },
                )
            }
            LicenseCategory::Permissive => (
                true,
                Severity::Low,
                "HEURISTIC_PERMISSIVE",
                format!("{} is permissive; preserve notices", dependency),
            ),
            LicenseCategory::StrongCopyleft if distribution == DistributionModel::Proprietary => (
                false,
                Severity::Critical,
                "HEURISTIC_STRONG_COPYLEFT_PROPRIETARY",
                format!(
                    "{} is strong copyleft and the project is distributed as proprietary software",
                    dependency
                ),
            ),
            LicenseCategory::WeakCopyleft if linking == LinkingModel::Dynamic => (
                true,
                Severity::Low,
                "HEURISTIC_WEAK_COPYLEFT_DYNAMIC",
                format!("{} is weak copyleft and only dynamically linked", dependency),
            ),
            _ => (
                false,
                Severity::Medium,
                "HEURISTIC_MANUAL_REVIEW",
                format!(
                    "{} ({}) has no explicit rule for {} linking with {} distribution; manual \
                     review recommended",
                    dependency, category, linking, distribution
                ),
            ),
        };

        debug!(rule = rule_id, %dependency, "heuristic fallback");
        CompatibilityVerdict {
            compatible,
            severity,
            reason,
            rule_id: rule_id.to_string(),
            is_heuristic: true,
            legal_reference: None,
            legal_basis: None,
        }
    }
}

fn key(rule: &CompatibilityRule) -> RuleKey {
    (
        rule.project_license.to_string().to_lowercase(),
        rule.dependency_license.to_string().to_lowercase(),
        rule.linking,
        rule.distribution,
    )
}

fn display_project(project: &str) -> &str {
    if project == UNKNOWN_LICENSE {
        "an undeclared project license"
    } else {
        project
    }
}
