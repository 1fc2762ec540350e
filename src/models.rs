use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::license::LicenseExpr;

// ---------------------------------------------------------------------------
// License classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LicenseCategory {
    Permissive,
    WeakCopyleft,
    StrongCopyleft,
    Proprietary,
    Unknown,
}

impl std::fmt::Display for LicenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseCategory::Permissive => write!(f, "Permissive"),
            LicenseCategory::WeakCopyleft => write!(f, "Weak Copyleft"),
            LicenseCategory::StrongCopyleft => write!(f, "Strong Copyleft"),
            LicenseCategory::Proprietary => write!(f, "Proprietary"),
            LicenseCategory::Unknown => write!(f, "Unknown"),
        }
    }
}

/// How far a license's copyleft reaches into the consuming work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CopyleftScope {
    None,
    /// Modified files only (MPL, EPL, CDDL).
    File,
    /// The library itself; relinking must stay possible (LGPL).
    Library,
    /// The whole combined program (GPL).
    Program,
    /// The whole program, triggered by network use as well (AGPL, SSPL).
    Network,
}

// ---------------------------------------------------------------------------
// Severity scales
// ---------------------------------------------------------------------------

/// Static severity attached to a compatibility verdict or conflict.
///
/// Ordering is total: `Critical > High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Points subtracted from the aggregate risk score for one conflict.
    pub fn penalty(self) -> u32 {
        match self {
            Severity::Critical => 30,
            Severity::High => 15,
            Severity::Medium => 5,
            Severity::Low => 2,
        }
    }

    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// Context-aware risk level produced by the dynamic risk grader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Safe => write!(f, "safe"),
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

// ---------------------------------------------------------------------------
// Project context
// ---------------------------------------------------------------------------

/// How dependency code is combined with the consuming project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkingModel {
    #[default]
    Static,
    Dynamic,
    /// Separate process (subprocess, IPC, network call).
    Runtime,
}

impl LinkingModel {
    pub const ALL: [LinkingModel; 3] = [
        LinkingModel::Static,
        LinkingModel::Dynamic,
        LinkingModel::Runtime,
    ];
}

impl std::fmt::Display for LinkingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkingModel::Static => write!(f, "static"),
            LinkingModel::Dynamic => write!(f, "dynamic"),
            LinkingModel::Runtime => write!(f, "runtime"),
        }
    }
}

impl FromStr for LinkingModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(LinkingModel::Static),
            "dynamic" => Ok(LinkingModel::Dynamic),
            "runtime" | "process" => Ok(LinkingModel::Runtime),
            other => Err(format!("unknown linking model '{}'", other)),
        }
    }
}

/// How the consuming project reaches its end users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistributionModel {
    /// Closed-source software shipped to customers.
    #[default]
    Proprietary,
    /// Source published under an open-source license.
    OpenSource,
    /// Hosted service; users interact over a network, nothing is conveyed.
    Saas,
    /// Command-line tool or binary handed to users.
    Cli,
    /// Library consumed by other developers.
    Library,
    /// Used only inside the organization.
    Internal,
}

impl DistributionModel {
    pub const ALL: [DistributionModel; 6] = [
        DistributionModel::Proprietary,
        DistributionModel::OpenSource,
        DistributionModel::Saas,
        DistributionModel::Cli,
        DistributionModel::Library,
        DistributionModel::Internal,
    ];

    /// Whether copies of the software leave the organization.
    pub fn conveys_copies(self) -> bool {
        !matches!(self, DistributionModel::Saas | DistributionModel::Internal)
    }
}

impl std::fmt::Display for DistributionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionModel::Proprietary => write!(f, "proprietary"),
            DistributionModel::OpenSource => write!(f, "open-source"),
            DistributionModel::Saas => write!(f, "saas"),
            DistributionModel::Cli => write!(f, "cli"),
            DistributionModel::Library => write!(f, "library"),
            DistributionModel::Internal => write!(f, "internal"),
        }
    }
}

impl FromStr for DistributionModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proprietary" | "commercial" => Ok(DistributionModel::Proprietary),
            "open-source" | "opensource" | "oss" => Ok(DistributionModel::OpenSource),
            "saas" | "service" => Ok(DistributionModel::Saas),
            "cli" | "binary" => Ok(DistributionModel::Cli),
            "library" | "lib" => Ok(DistributionModel::Library),
            "internal" => Ok(DistributionModel::Internal),
            other => Err(format!("unknown distribution model '{}'", other)),
        }
    }
}

/// What the project owners intend to do with the project's own license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    OpenSource,
    #[default]
    Proprietary,
    Undecided,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::OpenSource => write!(f, "open-source"),
            Intent::Proprietary => write!(f, "proprietary"),
            Intent::Undecided => write!(f, "undecided"),
        }
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open-source" | "opensource" | "oss" => Ok(Intent::OpenSource),
            "proprietary" | "commercial" => Ok(Intent::Proprietary),
            "undecided" => Ok(Intent::Undecided),
            other => Err(format!("unknown intent '{}'", other)),
        }
    }
}

/// Immutable per-scan description of the consuming project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectContext {
    #[serde(default)]
    pub intent: Intent,
    #[serde(default)]
    pub distribution: DistributionModel,
    #[serde(default)]
    pub linking: LinkingModel,
    /// Declared project license, if any.
    #[serde(default)]
    pub license: Option<String>,
    /// The owners want to keep relicensing options open.
    #[serde(default)]
    pub future_flexibility: bool,
}

// ---------------------------------------------------------------------------
// Dependency tree
// ---------------------------------------------------------------------------

/// One package in an already-materialized dependency tree.
///
/// The parent owns its children; there are no back-pointers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyNode {
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Missing or `null` reads as an undeclared license.
    #[serde(default)]
    pub license: LicenseExpr,
    #[serde(default)]
    pub depth: usize,
    /// Root-to-node name chain as reported by the parser.
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub children: Vec<DependencyNode>,
    #[serde(default)]
    pub dev_only: bool,
    /// Overrides the project-wide linking model for this package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linking: Option<LinkingModel>,
}

impl DependencyNode {
    pub fn new(name: &str, version: &str, license: impl Into<LicenseExpr>) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            license: license.into(),
            depth: 0,
            path: vec![name.to_string()],
            children: Vec::new(),
            dev_only: false,
            linking: None,
        }
    }

    pub fn with_child(mut self, child: DependencyNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn dev(mut self) -> Self {
        self.dev_only = true;
        self
    }

    pub fn linked(mut self, linking: LinkingModel) -> Self {
        self.linking = Some(linking);
        self
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Compatibility verdicts and conflicts
// ---------------------------------------------------------------------------

/// Answer of a compatibility lookup. Always fully populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityVerdict {
    pub compatible: bool,
    pub severity: Severity,
    pub reason: String,
    pub rule_id: String,
    pub is_heuristic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_basis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictDependency {
    pub name: String,
    pub version: String,
    /// The alternative that produced the conflict, normalized.
    pub license: String,
    pub path: Vec<String>,
    /// Linking model the pair was evaluated under (node override or project default).
    pub linking: LinkingModel,
}

/// One hop on a contamination path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub name: String,
    pub version: String,
    pub license: String,
    pub is_conflict_point: bool,
}

/// Remediation kinds seeded by the detector before full fix ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateFix {
    Replace,
    IsolateProcessBoundary,
    Relicense,
}

impl std::fmt::Display for CandidateFix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateFix::Replace => write!(f, "replace"),
            CandidateFix::IsolateProcessBoundary => write!(f, "isolate via process boundary"),
            CandidateFix::Relicense => write!(f, "relicense"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredRule {
    pub id: String,
    pub reference: Option<String>,
    pub is_heuristic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub id: String,
    pub severity: Severity,
    pub dependency: ConflictDependency,
    pub reason: String,
    pub contamination_path: Vec<PathEntry>,
    pub candidate_fixes: Vec<CandidateFix>,
    pub rule: TriggeredRule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total_dependencies: usize,
    /// Nodes not evaluated because they (or an ancestor) are dev-only.
    pub dev_only_skipped: usize,
}

impl ScanSummary {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn total_conflicts(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

// ---------------------------------------------------------------------------
// Component outputs
// ---------------------------------------------------------------------------

/// Which kind of rule the license pair trips, for the narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleTrigger {
    CopyleftContamination,
    NetworkCopyleft,
    WeakCopyleftStaticLink,
    LicenseMismatch,
}

impl std::fmt::Display for RuleTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleTrigger::CopyleftContamination => write!(f, "copyleft-contamination"),
            RuleTrigger::NetworkCopyleft => write!(f, "network-copyleft"),
            RuleTrigger::WeakCopyleftStaticLink => write!(f, "weak-copyleft-static-link"),
            RuleTrigger::LicenseMismatch => write!(f, "license-mismatch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictPath {
    pub path: Vec<PathEntry>,
    pub rule_triggered: RuleTrigger,
    pub explanation: String,
    pub obligations: Vec<String>,
    /// False when the node could not be found and a one-hop path was used.
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicSeverity {
    pub level: RiskLevel,
    pub reason: String,
    pub obligation: String,
    pub explanation: String,
    pub applies_when: Vec<String>,
    pub intent_impact: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityBreakdown {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalImpact {
    pub package: String,
    /// Share of the baseline penalty removed with this package, 0-100.
    pub contribution_pct: f64,
    pub conflicts_removed: usize,
    pub breakdown: SeverityBreakdown,
    pub risk_score_without: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Effort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effort::Low => write!(f, "low"),
            Effort::Medium => write!(f, "medium"),
            Effort::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixStrategy {
    Replace,
    Upgrade,
    DualLicense,
    Isolate,
    Remove,
    BoundaryRefactor,
}

impl std::fmt::Display for FixStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixStrategy::Replace => write!(f, "replace"),
            FixStrategy::Upgrade => write!(f, "upgrade"),
            FixStrategy::DualLicense => write!(f, "dual-license"),
            FixStrategy::Isolate => write!(f, "isolate"),
            FixStrategy::Remove => write!(f, "remove"),
            FixStrategy::BoundaryRefactor => write!(f, "boundary-refactor"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixSuggestion {
    pub strategy: FixStrategy,
    pub description: String,
    pub effort: Effort,
    pub tradeoffs: Vec<String>,
    pub time_estimate: String,
}

/// A conflict together with its context-aware grading and ranked fixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancedConflict {
    #[serde(flatten)]
    pub conflict: Conflict,
    pub dynamic_severity: DynamicSeverity,
    pub fixes: Vec<FixSuggestion>,
}

/// Opaque identifiers supplied by the caller and echoed back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub metadata: ScanMetadata,
    pub context: ProjectContext,
    pub conflicts: Vec<EnhancedConflict>,
    pub summary: ScanSummary,
    pub risk_score: u32,
    pub paths: BTreeMap<String, ConflictPath>,
    pub impacts: Vec<CausalImpact>,
}
