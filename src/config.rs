use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::engine::rules::{CompatibilityRule, LicensePattern};
use crate::engine::CompatibilityMatrix;
use crate::error::{CompatError, CompatResult};
use crate::license::{LicenseCatalog, LicenseRecord};
use crate::models::{
    CopyleftScope, DistributionModel, LicenseCategory, LinkingModel, ProjectContext,
    ScanMetadata, Severity,
};

/// SPDX `idstring` charset, plus `+` for the "or later" suffix.
const LICENSE_ID_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9.+-]*$";

/// Scan configuration, deserialized from `.license-compat/config.toml`.
///
/// ```toml
/// strict_mode = false
/// fail_on = "high"
///
/// [project]
/// intent = "proprietary"
/// distribution = "saas"
/// linking = "dynamic"
/// license = "MIT"
///
/// [licenses]
/// "Acme-EULA-1.0" = "proprietary"
///
/// [aliases]
/// "acme license" = "Acme-EULA-1.0"
///
/// [[rules]]
/// project = "*"
/// dependency = "Acme-EULA-1.0"
/// compatible = true
/// severity = "low"
/// reason = "Covered by the Acme enterprise agreement"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Reject license pairs that no explicit rule covers.
    pub strict_mode: bool,
    /// Lowest static severity that makes the CLI exit with code 1.
    pub fail_on: Severity,
    pub project: ProjectContext,
    /// Extra catalog entries keyed by license id.
    pub licenses: BTreeMap<String, LicenseCategory>,
    /// Extra alias → license id mappings.
    pub aliases: BTreeMap<String, String>,
    pub rules: Vec<RuleConfig>,
    /// Caller-supplied identifiers echoed back in the result.
    pub scan: ScanMetadata,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            strict_mode: false,
            fail_on: Severity::High,
            project: ProjectContext::default(),
            licenses: BTreeMap::new(),
            aliases: BTreeMap::new(),
            rules: Vec::new(),
            scan: ScanMetadata::default(),
        }
    }
}

/// A compatibility rule as written in config. Omitted linking or
/// distribution means the rule applies to every model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Project license id, or `*`.
    #[serde(default = "wildcard")]
    pub project: String,
    /// Dependency license id, or `*`.
    pub dependency: String,
    #[serde(default)]
    pub linking: Option<LinkingModel>,
    #[serde(default)]
    pub distribution: Option<DistributionModel>,
    pub compatible: bool,
    #[serde(default = "default_rule_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

fn wildcard() -> String {
    "*".to_string()
}

fn default_rule_severity() -> Severity {
    Severity::Medium
}

impl ScanConfig {
    /// Check that every custom license id is a well-formed identifier.
    pub fn validate(&self) -> CompatResult<()> {
        let id = Regex::new(LICENSE_ID_PATTERN)?;
        let check = |value: &str| {
            if id.is_match(value) {
                Ok(())
            } else {
                Err(CompatError::InvalidLicenseId(value.to_string()))
            }
        };

        for license in self.licenses.keys() {
            check(license)?;
        }
        for target in self.aliases.values() {
            check(target)?;
        }
        for rule in &self.rules {
            for field in [&rule.project, &rule.dependency] {
                if field.trim() != "*" {
                    check(field.trim())?;
                }
            }
        }
        Ok(())
    }

    /// Built-in catalog extended with the configured licenses and aliases.
    pub fn catalog(&self) -> LicenseCatalog {
        let mut catalog = LicenseCatalog::builtin();
        for (id, category) in &self.licenses {
            let scope = match category {
                LicenseCategory::StrongCopyleft => CopyleftScope::Program,
                LicenseCategory::WeakCopyleft => CopyleftScope::Library,
                _ => CopyleftScope::None,
            };
            catalog.insert(LicenseRecord::new(id, *category, scope));
        }
        for (alias, id) in &self.aliases {
            catalog.add_alias(alias, id);
        }
        catalog
    }

    /// Compatibility matrix with the configured rules ahead of the built-in
    /// table.
    pub fn matrix(&self) -> CompatibilityMatrix {
        let catalog = self.catalog();
        let mut custom = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            custom.extend(rule.expand(index, &catalog));
        }
        CompatibilityMatrix::with_custom_rules(catalog, custom)
    }
}

impl RuleConfig {
    fn expand(&self, index: usize, catalog: &LicenseCatalog) -> Vec<CompatibilityRule> {
        let pattern = |raw: &str| match LicensePattern::from(raw) {
            LicensePattern::Any => LicensePattern::Any,
            LicensePattern::Id(id) => LicensePattern::Id(catalog.normalize(&id)),
        };
        let project = pattern(&self.project);
        let dependency = pattern(&self.dependency);

        let linkings: Vec<LinkingModel> = match self.linking {
            Some(l) => vec![l],
            None => LinkingModel::ALL.to_vec(),
        };
        let distributions: Vec<DistributionModel> = match self.distribution {
            Some(d) => vec![d],
            None => DistributionModel::ALL.to_vec(),
        };

        let rule_id = self
            .id
            .clone()
            .unwrap_or_else(|| format!("CUSTOM_RULE_{}", index + 1));
        let reason = self.reason.clone().unwrap_or_else(|| {
            format!(
                "{} under {} is {} by project policy",
                dependency,
                project,
                if self.compatible { "allowed" } else { "forbidden" }
            )
        });

        let mut rules = Vec::new();
        for &linking in &linkings {
            for &distribution in &distributions {
                rules.push(CompatibilityRule {
                    project_license: project.clone(),
                    dependency_license: dependency.clone(),
                    linking,
                    distribution,
                    compatible: self.compatible,
                    severity: self.severity,
                    reason: reason.clone(),
                    rule_id: rule_id.clone(),
                    legal_reference: self.reference.clone(),
                    legal_basis: Some("Project policy".to_string()),
                });
            }
        }
        rules
    }
}

/// Load the scan configuration, searching in order:
///
/// 1. `config_override`: path passed via `--config`
/// 2. `<project_path>/.license-compat/config.toml`
/// 3. `~/.config/license-compat/config.toml`
/// 4. Built-in [`ScanConfig::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> CompatResult<ScanConfig> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".license-compat").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("license-compat")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(ScanConfig::default())
}

fn read_config(path: &Path) -> CompatResult<ScanConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| CompatError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ScanConfig = toml::from_str(&content).map_err(|source| CompatError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Intent;

    fn write_project_config(dir: &Path, body: &str) {
        let config_dir = dir.join(".license-compat");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("config.toml"), body).unwrap();
    }

    #[test]
    fn test_defaults() {
        let cfg = ScanConfig::default();
        assert!(!cfg.strict_mode);
        assert_eq!(cfg.fail_on, Severity::High);
        assert_eq!(cfg.project.intent, Intent::Proprietary);
        assert!(cfg.rules.is_empty());
    }

    #[test]
    fn test_project_config_found() {
        let dir = tempfile::tempdir().unwrap();
        write_project_config(
            dir.path(),
            r#"
strict_mode = true
fail_on = "medium"

[project]
intent = "open-source"
distribution = "saas"
license = "Apache-2.0"

[scan]
scan_id = "scan-42"
"#,
        );

        let cfg = load_config(dir.path(), None).unwrap();
        assert!(cfg.strict_mode);
        assert_eq!(cfg.fail_on, Severity::Medium);
        assert_eq!(cfg.project.intent, Intent::OpenSource);
        assert_eq!(cfg.project.distribution, DistributionModel::Saas);
        assert_eq!(cfg.project.linking, LinkingModel::Static);
        assert_eq!(cfg.project.license.as_deref(), Some("Apache-2.0"));
        assert_eq!(cfg.scan.scan_id.as_deref(), Some("scan-42"));
        assert_eq!(cfg.scan.timestamp, None);
    }

    #[test]
    fn test_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        write_project_config(dir.path(), "strict_mode = true\n");
        let override_path = dir.path().join("other.toml");
        std::fs::write(&override_path, "fail_on = \"critical\"\n").unwrap();

        let cfg = load_config(dir.path(), Some(&override_path)).unwrap();
        assert!(!cfg.strict_mode);
        assert_eq!(cfg.fail_on, Severity::Critical);
    }

    #[test]
    fn test_missing_override_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_config(dir.path(), Some(&missing)).unwrap_err();
        assert!(matches!(err, CompatError::ConfigRead { .. }));
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write_project_config(dir.path(), "fail_on = \"sometimes\"\n");
        let err = load_config(dir.path(), None).unwrap_err();
        assert!(matches!(err, CompatError::ConfigParse { .. }));
    }

    #[test]
    fn test_invalid_license_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_project_config(dir.path(), "[licenses]\n\"Acme EULA!\" = \"proprietary\"\n");
        let err = load_config(dir.path(), None).unwrap_err();
        assert!(matches!(err, CompatError::InvalidLicenseId(id) if id == "Acme EULA!"));
    }

    #[test]
    fn test_custom_licenses_and_aliases() {
        let cfg: ScanConfig = toml::from_str(
            r#"
[licenses]
"Acme-EULA-1.0" = "proprietary"
"Acme-Share-1.0" = "strong-copyleft"

[aliases]
"acme license" = "Acme-EULA-1.0"
"#,
        )
        .unwrap();
        cfg.validate().unwrap();

        let catalog = cfg.catalog();
        assert_eq!(catalog.normalize("Acme License"), "Acme-EULA-1.0");
        assert_eq!(catalog.category("acme license"), LicenseCategory::Proprietary);
        assert_eq!(catalog.category("Acme-Share-1.0"), LicenseCategory::StrongCopyleft);
        assert_eq!(catalog.category("MIT"), LicenseCategory::Permissive);
    }

    #[test]
    fn test_custom_rule_overrides_builtin() {
        let cfg: ScanConfig = toml::from_str(
            r#"
[[rules]]
project = "MIT"
dependency = "GPLv3"
linking = "static"
compatible = true
severity = "low"
reason = "Vendor granted a linking exception"
id = "ACME_GPL_EXCEPTION"
"#,
        )
        .unwrap();
        cfg.validate().unwrap();

        let matrix = cfg.matrix();
        let v = matrix.is_compatible(
            "MIT",
            "GPL-3.0",
            LinkingModel::Static,
            DistributionModel::Proprietary,
            false,
        );
        assert!(v.compatible);
        assert_eq!(v.rule_id, "ACME_GPL_EXCEPTION");

        let v = matrix.is_compatible(
            "MIT",
            "GPL-3.0",
            LinkingModel::Dynamic,
            DistributionModel::Proprietary,
            false,
        );
        assert!(!v.compatible);
    }

    #[test]
    fn test_wildcard_rule_gets_generated_id() {
        let cfg: ScanConfig = toml::from_str(
            r#"
[[rules]]
dependency = "WTFPL"
compatible = false
severity = "high"
"#,
        )
        .unwrap();
        let matrix = cfg.matrix();
        let v = matrix.is_compatible(
            "Apache-2.0",
            "WTFPL",
            LinkingModel::Runtime,
            DistributionModel::Internal,
            false,
        );
        assert!(!v.compatible);
        assert_eq!(v.severity, Severity::High);
        assert_eq!(v.rule_id, "CUSTOM_RULE_1");
        assert!(v.reason.contains("forbidden"));
    }
}
