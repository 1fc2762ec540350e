//! Built-in compatibility rules.
//!
//! Rules are flat records keyed by
//! `(project license, dependency license, linking, distribution)`. License
//! fields may be the wildcard `*`; linking and distribution never are.
//! Groups are generated from small license families so the table stays
//! readable while still covering every linking/distribution combination.

use serde::{Deserialize, Serialize};

use crate::models::{CompatibilityVerdict, DistributionModel, LinkingModel, Severity};

/// A license field in a rule: a concrete normalized id or the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicensePattern {
    Any,
    Id(String),
}

impl LicensePattern {
    pub fn matches(&self, id: &str) -> bool {
        match self {
            LicensePattern::Any => true,
            LicensePattern::Id(pattern) => pattern.eq_ignore_ascii_case(id),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, LicensePattern::Any)
    }
}

impl From<&str> for LicensePattern {
    fn from(s: &str) -> Self {
        match s.trim() {
            "*" | "" => LicensePattern::Any,
            id => LicensePattern::Id(id.to_string()),
        }
    }
}

impl std::fmt::Display for LicensePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicensePattern::Any => write!(f, "*"),
            LicensePattern::Id(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityRule {
    pub project_license: LicensePattern,
    pub dependency_license: LicensePattern,
    pub linking: LinkingModel,
    pub distribution: DistributionModel,
    pub compatible: bool,
    pub severity: Severity,
    pub reason: String,
    pub rule_id: String,
    pub legal_reference: Option<String>,
    pub legal_basis: Option<String>,
}

impl CompatibilityRule {
    pub fn is_exact(&self) -> bool {
        !self.project_license.is_wildcard() && !self.dependency_license.is_wildcard()
    }

    pub fn verdict(&self) -> CompatibilityVerdict {
        CompatibilityVerdict {
            compatible: self.compatible,
            severity: self.severity,
            reason: self.reason.clone(),
            rule_id: self.rule_id.clone(),
            is_heuristic: false,
            legal_reference: self.legal_reference.clone(),
            legal_basis: self.legal_basis.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// License families used to generate the table
// ---------------------------------------------------------------------------

const ANY: &[&str] = &["*"];

const PERMISSIVE: &[&str] = &[
    "MIT",
    "MIT-0",
    "Apache-2.0",
    "BSD-2-Clause",
    "BSD-3-Clause",
    "ISC",
    "0BSD",
    "Unlicense",
    "Zlib",
    "CC0-1.0",
    "BSL-1.0",
    "Python-2.0",
    "Unicode-DFS-2016",
    "Unicode-3.0",
];

const GPL: &[&str] = &["GPL-2.0", "GPL-3.0"];
const NETWORK: &[&str] = &["AGPL-3.0", "SSPL-1.0"];
const LGPL: &[&str] = &["LGPL-2.0", "LGPL-2.1", "LGPL-3.0"];
const FILE_SCOPED: &[&str] = &["MPL-2.0", "EPL-1.0", "EPL-2.0", "CDDL-1.0", "CDDL-1.1"];
const PROPRIETARY: &[&str] = &["Proprietary", "BUSL-1.1", "Elastic-2.0"];

const LINKED: &[LinkingModel] = &[LinkingModel::Static, LinkingModel::Dynamic];
const RUNTIME: &[LinkingModel] = &[LinkingModel::Runtime];
const ALL_LINKS: &[LinkingModel] = &LinkingModel::ALL;

const ALL_DISTS: &[DistributionModel] = &DistributionModel::ALL;
const CONVEYED: &[DistributionModel] = &[
    DistributionModel::Proprietary,
    DistributionModel::OpenSource,
    DistributionModel::Cli,
    DistributionModel::Library,
];
const CONVEYED_OPEN: &[DistributionModel] = &[
    DistributionModel::OpenSource,
    DistributionModel::Cli,
    DistributionModel::Library,
];
const CLOSED_CONVEYED: &[DistributionModel] = &[
    DistributionModel::Proprietary,
    DistributionModel::Cli,
    DistributionModel::Library,
];
const UNCONVEYED: &[DistributionModel] = &[DistributionModel::Saas, DistributionModel::Internal];
const NOT_SAAS: &[DistributionModel] = &[
    DistributionModel::Proprietary,
    DistributionModel::OpenSource,
    DistributionModel::Cli,
    DistributionModel::Library,
    DistributionModel::Internal,
];

/// The clause that carries a copyleft license's reciprocity requirement.
fn copyleft_clause(id: &str) -> Option<String> {
    let clause = match id {
        "GPL-2.0" => "GPL-2.0 §2(b)",
        "GPL-3.0" => "GPL-3.0 §5(c)",
        "AGPL-3.0" => "AGPL-3.0 §13",
        "SSPL-1.0" => "SSPL-1.0 §13",
        "LGPL-2.0" | "LGPL-2.1" => "LGPL-2.1 §6",
        "LGPL-3.0" => "LGPL-3.0 §4(d)",
        "MPL-2.0" => "MPL-2.0 §3.2",
        "EPL-1.0" => "EPL-1.0 §3",
        "EPL-2.0" => "EPL-2.0 §3",
        "CDDL-1.0" | "CDDL-1.1" => "CDDL-1.0 §3.1",
        _ => return None,
    };
    Some(clause.to_string())
}

/// Verdict fields shared by every rule a single `add` call generates.
struct Outcome<'a> {
    rule_id: &'a str,
    compatible: bool,
    severity: Severity,
    reason: String,
    legal_reference: Option<String>,
    legal_basis: Option<&'a str>,
}

#[derive(Default)]
struct RuleSet {
    rules: Vec<CompatibilityRule>,
}

impl RuleSet {
    /// Add the cartesian product of the given keys, all with one outcome.
    fn add(
        &mut self,
        projects: &[&str],
        dependencies: &[&str],
        linkings: &[LinkingModel],
        distributions: &[DistributionModel],
        outcome: Outcome<'_>,
    ) {
        for project in projects {
            for dependency in dependencies {
                for &linking in linkings {
                    for &distribution in distributions {
                        self.rules.push(CompatibilityRule {
                            project_license: LicensePattern::from(*project),
                            dependency_license: LicensePattern::from(*dependency),
                            linking,
                            distribution,
                            compatible: outcome.compatible,
                            severity: outcome.severity,
                            reason: outcome.reason.clone(),
                            rule_id: outcome.rule_id.to_string(),
                            legal_reference: outcome.legal_reference.clone(),
                            legal_basis: outcome.legal_basis.map(str::to_string),
                        });
                    }
                }
            }
        }
    }
}

/// The built-in rule table, most specific groups first.
pub fn builtin_rules() -> Vec<CompatibilityRule> {
    let mut set = RuleSet::default();

    same_license_rules(&mut set);
    gpl_family_rules(&mut set);
    gpl_incompatibility_rules(&mut set);
    network_copyleft_rules(&mut set);
    strong_copyleft_rules(&mut set);
    lgpl_rules(&mut set);
    file_scoped_rules(&mut set);
    permissive_rules(&mut set);
    proprietary_rules(&mut set);

    set.rules
}

fn same_license_rules(set: &mut RuleSet) {
    for &id in GPL.iter().chain(LGPL).chain(FILE_SCOPED) {
        set.add(&[id], &[id], ALL_LINKS, ALL_DISTS, Outcome {
            rule_id: "SAME_LICENSE",
            compatible: true,
            severity: Severity::Low,
            reason: format!("Project and dependency are both licensed under {}", id),
            legal_reference: None,
            legal_basis: None,
        });
    }
    // A network-copyleft project may still not run a network-copyleft
    // dependency as a service without offering its source.
    for &id in NETWORK {
        set.add(&[id], &[id], ALL_LINKS, NOT_SAAS, Outcome {
            rule_id: "SAME_LICENSE",
            compatible: true,
            severity: Severity::Low,
            reason: format!("Project and dependency are both licensed under {}", id),
            legal_reference: None,
            legal_basis: None,
        });
    }
}

fn gpl_family_rules(set: &mut RuleSet) {
    for &dep in &["LGPL-2.1", "LGPL-3.0", "MPL-2.0"] {
        set.add(&["GPL-3.0", "AGPL-3.0"], &[dep], ALL_LINKS, ALL_DISTS, Outcome {
            rule_id: "GPL_FAMILY_COMPATIBLE",
            compatible: true,
            severity: Severity::Low,
            reason: format!("{} code may be combined into a GPL-3.0-family work", dep),
            legal_reference: copyleft_clause(dep),
            legal_basis: Some("FSF license compatibility list"),
        });
    }
    for &dep in &["LGPL-2.1", "MPL-2.0"] {
        set.add(&["GPL-2.0"], &[dep], ALL_LINKS, ALL_DISTS, Outcome {
            rule_id: "GPL_FAMILY_COMPATIBLE",
            compatible: true,
            severity: Severity::Low,
            reason: format!("{} code may be combined into a GPL-2.0 work", dep),
            legal_reference: copyleft_clause(dep),
            legal_basis: Some("FSF license compatibility list"),
        });
    }
    set.add(&["GPL-3.0"], &["AGPL-3.0"], ALL_LINKS, NOT_SAAS, Outcome {
        rule_id: "GPL3_AGPL_COMBINATION",
        compatible: true,
        severity: Severity::Medium,
        reason: "GPL-3.0 permits combination with AGPL-3.0 code; the AGPL part keeps its \
                 network-use terms"
            .to_string(),
        legal_reference: Some("GPL-3.0 §13".to_string()),
        legal_basis: None,
    });
    set.add(&["AGPL-3.0"], &["GPL-3.0"], ALL_LINKS, ALL_DISTS, Outcome {
        rule_id: "GPL3_AGPL_COMBINATION",
        compatible: true,
        severity: Severity::Low,
        reason: "AGPL-3.0 permits combination with GPL-3.0 code".to_string(),
        legal_reference: Some("AGPL-3.0 §13".to_string()),
        legal_basis: None,
    });
}

fn gpl_incompatibility_rules(set: &mut RuleSet) {
    set.add(&["GPL-2.0"], &["Apache-2.0"], LINKED, CONVEYED, Outcome {
        rule_id: "GPL2_APACHE_PATENT",
        compatible: false,
        severity: Severity::High,
        reason: "Apache-2.0 patent termination and indemnity terms are further restrictions \
                 that GPL-2.0 does not allow"
            .to_string(),
        legal_reference: Some("GPL-2.0 §6".to_string()),
        legal_basis: Some("FSF license compatibility list"),
    });
    set.add(&["GPL-2.0"], &["GPL-3.0", "AGPL-3.0", "LGPL-3.0"], LINKED, CONVEYED, Outcome {
        rule_id: "GPL2_GPL3_VERSION_MISMATCH",
        compatible: false,
        severity: Severity::High,
        reason: "GPL-2.0-only code cannot be combined with code that requires version 3 terms"
            .to_string(),
        legal_reference: Some("GPL-2.0 §6".to_string()),
        legal_basis: None,
    });
    set.add(&["GPL-3.0", "AGPL-3.0"], &["GPL-2.0"], LINKED, CONVEYED, Outcome {
        rule_id: "GPL2_GPL3_VERSION_MISMATCH",
        compatible: false,
        severity: Severity::High,
        reason: "A GPL-2.0-only dependency cannot be relicensed under version 3 terms"
            .to_string(),
        legal_reference: Some("GPL-2.0 §9".to_string()),
        legal_basis: None,
    });
    for &dep in &["EPL-1.0", "CDDL-1.0", "CDDL-1.1"] {
        set.add(&["GPL-2.0", "GPL-3.0", "AGPL-3.0"], &[dep], LINKED, CONVEYED, Outcome {
            rule_id: "GPL_FILE_COPYLEFT_CONFLICT",
            compatible: false,
            severity: Severity::High,
            reason: format!("{} imposes terms that conflict with the GPL's same-license requirement", dep),
            legal_reference: copyleft_clause(dep),
            legal_basis: Some("FSF license compatibility list"),
        });
    }
    set.add(&["GPL-2.0", "GPL-3.0", "AGPL-3.0"], &["EPL-2.0"], LINKED, CONVEYED, Outcome {
        rule_id: "GPL_EPL2_SECONDARY_LICENSE",
        compatible: false,
        severity: Severity::Medium,
        reason: "EPL-2.0 is GPL-compatible only when the dependency designates GPL as a \
                 Secondary License"
            .to_string(),
        legal_reference: Some("EPL-2.0 Exhibit A".to_string()),
        legal_basis: None,
    });
}

fn network_copyleft_rules(set: &mut RuleSet) {
    set.add(ANY, NETWORK, ALL_LINKS, &[DistributionModel::Saas], Outcome {
        rule_id: "NETWORK_COPYLEFT_SAAS",
        compatible: false,
        severity: Severity::Critical,
        reason: "Users interacting with the service over a network must be offered the complete \
                 corresponding source of the service"
            .to_string(),
        legal_reference: Some("AGPL-3.0 §13".to_string()),
        legal_basis: Some("Remote network interaction clause"),
    });
    set.add(ANY, NETWORK, ALL_LINKS, &[DistributionModel::Internal], Outcome {
        rule_id: "NETWORK_COPYLEFT_INTERNAL",
        compatible: true,
        severity: Severity::Low,
        reason: "Internal use without outside network users does not trigger source disclosure"
            .to_string(),
        legal_reference: Some("AGPL-3.0 §13".to_string()),
        legal_basis: None,
    });
}

fn strong_copyleft_rules(set: &mut RuleSet) {
    for &dep in GPL.iter().chain(NETWORK) {
        set.add(ANY, &[dep], LINKED, &[DistributionModel::Proprietary], Outcome {
            rule_id: "STRONG_COPYLEFT_PROPRIETARY",
            compatible: false,
            severity: Severity::Critical,
            reason: format!(
                "Linking {} code into closed-source software creates a derivative work that must \
                 be released under {}",
                dep, dep
            ),
            legal_reference: copyleft_clause(dep),
            legal_basis: Some("Derivative work doctrine"),
        });
        set.add(ANY, &[dep], RUNTIME, &[DistributionModel::Proprietary], Outcome {
            rule_id: "STRONG_COPYLEFT_PROCESS_BOUNDARY",
            compatible: true,
            severity: Severity::Medium,
            reason: format!(
                "A separate process communicating at arm's length is generally a separate work; \
                 ship {} source for the component itself",
                dep
            ),
            legal_reference: copyleft_clause(dep),
            legal_basis: Some("FSF GPL FAQ: mere aggregation"),
        });
        set.add(ANY, &[dep], LINKED, CONVEYED_OPEN, Outcome {
            rule_id: "STRONG_COPYLEFT_COMBINED_WORK",
            compatible: false,
            severity: Severity::High,
            reason: format!(
                "The combined work must be distributed under {}, overriding the declared project \
                 license",
                dep
            ),
            legal_reference: copyleft_clause(dep),
            legal_basis: Some("Derivative work doctrine"),
        });
        set.add(ANY, &[dep], RUNTIME, CONVEYED_OPEN, Outcome {
            rule_id: "STRONG_COPYLEFT_PROCESS_BOUNDARY",
            compatible: true,
            severity: Severity::Low,
            reason: format!(
                "{} code runs as a separate program; only the component itself carries its terms",
                dep
            ),
            legal_reference: copyleft_clause(dep),
            legal_basis: Some("FSF GPL FAQ: mere aggregation"),
        });
    }
    set.add(ANY, GPL, ALL_LINKS, UNCONVEYED, Outcome {
        rule_id: "STRONG_COPYLEFT_NOT_CONVEYED",
        compatible: true,
        severity: Severity::Low,
        reason: "No copies are conveyed to users, so source obligations are not triggered"
            .to_string(),
        legal_reference: Some("GPL-3.0 §0 (\"convey\")".to_string()),
        legal_basis: None,
    });
}

fn lgpl_rules(set: &mut RuleSet) {
    for &dep in LGPL {
        set.add(ANY, &[dep], &[LinkingModel::Dynamic], ALL_DISTS, Outcome {
            rule_id: "WEAK_COPYLEFT_DYNAMIC",
            compatible: true,
            severity: Severity::Low,
            reason: format!("{} permits dynamic linking as long as the library stays replaceable", dep),
            legal_reference: copyleft_clause(dep),
            legal_basis: None,
        });
        set.add(ANY, &[dep], &[LinkingModel::Static], CLOSED_CONVEYED, Outcome {
            rule_id: "WEAK_COPYLEFT_STATIC_CLOSED",
            compatible: false,
            severity: Severity::High,
            reason: format!(
                "Statically linking {} into a closed binary requires shipping object files so \
                 users can relink against a modified library",
                dep
            ),
            legal_reference: copyleft_clause(dep),
            legal_basis: None,
        });
        set.add(ANY, &[dep], &[LinkingModel::Static], &[DistributionModel::OpenSource], Outcome {
            rule_id: "WEAK_COPYLEFT_STATIC_OPEN",
            compatible: true,
            severity: Severity::Low,
            reason: format!("Published source satisfies the {} relinking requirement", dep),
            legal_reference: copyleft_clause(dep),
            legal_basis: None,
        });
        set.add(ANY, &[dep], &[LinkingModel::Static], UNCONVEYED, Outcome {
            rule_id: "WEAK_COPYLEFT_NOT_CONVEYED",
            compatible: true,
            severity: Severity::Low,
            reason: "No copies are conveyed to users, so relinking obligations are not triggered"
                .to_string(),
            legal_reference: copyleft_clause(dep),
            legal_basis: None,
        });
        set.add(ANY, &[dep], RUNTIME, ALL_DISTS, Outcome {
            rule_id: "WEAK_COPYLEFT_PROCESS_BOUNDARY",
            compatible: true,
            severity: Severity::Low,
            reason: format!("{} code runs in a separate process", dep),
            legal_reference: copyleft_clause(dep),
            legal_basis: None,
        });
    }
}

fn file_scoped_rules(set: &mut RuleSet) {
    for &dep in FILE_SCOPED {
        for &distribution in ALL_DISTS {
            for &linking in ALL_LINKS {
                let closed_static = linking == LinkingModel::Static
                    && distribution == DistributionModel::Proprietary;
                set.add(ANY, &[dep], &[linking], &[distribution], Outcome {
                    rule_id: "FILE_SCOPED_COPYLEFT",
                    compatible: true,
                    severity: if closed_static { Severity::Medium } else { Severity::Low },
                    reason: format!(
                        "{} copyleft is limited to its own files; modified covered files must stay \
                         under {}",
                        dep, dep
                    ),
                    legal_reference: copyleft_clause(dep),
                    legal_basis: None,
                });
            }
        }
    }
}

fn permissive_rules(set: &mut RuleSet) {
    set.add(ANY, PERMISSIVE, ALL_LINKS, ALL_DISTS, Outcome {
        rule_id: "PERMISSIVE_NOTICE",
        compatible: true,
        severity: Severity::Low,
        reason: "Permissive license; preserve copyright and license notices".to_string(),
        legal_reference: None,
        legal_basis: None,
    });
}

fn proprietary_rules(set: &mut RuleSet) {
    set.add(ANY, PROPRIETARY, ALL_LINKS, &[DistributionModel::OpenSource], Outcome {
        rule_id: "PROPRIETARY_IN_OPEN_SOURCE",
        compatible: false,
        severity: Severity::High,
        reason: "Proprietary terms do not allow redistribution under an open-source license"
            .to_string(),
        legal_reference: None,
        legal_basis: Some("Vendor license agreement"),
    });
    let other: Vec<DistributionModel> = ALL_DISTS
        .iter()
        .copied()
        .filter(|d| *d != DistributionModel::OpenSource)
        .collect();
    set.add(ANY, PROPRIETARY, ALL_LINKS, &other, Outcome {
        rule_id: "PROPRIETARY_TERMS",
        compatible: true,
        severity: Severity::Medium,
        reason: "Commercial terms govern; confirm the license grant covers this use".to_string(),
        legal_reference: None,
        legal_basis: Some("Vendor license agreement"),
    });
}
