use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::license::expression::{conjuncts, LicenseExpr};
use crate::models::{CopyleftScope, LicenseCategory};

/// Normalized id for empty, `NOASSERTION` and similar placeholder strings.
pub const UNKNOWN_LICENSE: &str = "UNKNOWN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    CommercialUse,
    Modification,
    Distribution,
    PrivateUse,
    PatentUse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Obligation {
    IncludeNotice,
    StateChanges,
    DiscloseSource,
    SameLicense,
    NetworkDisclosure,
    FileLevelDisclosure,
    AllowRelinking,
}

impl std::fmt::Display for Obligation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Obligation::IncludeNotice => write!(f, "Preserve copyright and license notices"),
            Obligation::StateChanges => write!(f, "State significant changes"),
            Obligation::DiscloseSource => write!(f, "Disclose source code"),
            Obligation::SameLicense => write!(f, "License derivative works under the same terms"),
            Obligation::NetworkDisclosure => {
                write!(f, "Offer source to users interacting over a network")
            }
            Obligation::FileLevelDisclosure => {
                write!(f, "Publish modifications to covered files")
            }
            Obligation::AllowRelinking => {
                write!(f, "Allow users to relink against a modified library")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Limitation {
    Liability,
    Warranty,
    TrademarkUse,
    Redistribution,
}

/// What the catalog knows about one license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub id: String,
    pub category: LicenseCategory,
    pub scope: CopyleftScope,
    pub permissions: Vec<Permission>,
    pub obligations: Vec<Obligation>,
    pub limitations: Vec<Limitation>,
}

impl LicenseRecord {
    /// Build a record whose permissions, obligations and limitations follow
    /// from its category and copyleft scope.
    pub fn new(id: &str, category: LicenseCategory, scope: CopyleftScope) -> Self {
        use Obligation::*;
        use Permission::*;

        let open = [CommercialUse, Modification, Distribution, PrivateUse].to_vec();
        let (permissions, obligations, limitations) = match (category, scope) {
            (LicenseCategory::Proprietary, _) => {
                (vec![PrivateUse], vec![], vec![Limitation::Redistribution, Limitation::Liability])
            }
            (LicenseCategory::Unknown, _) => (vec![], vec![], vec![]),
            (_, CopyleftScope::None) => (
                open,
                vec![IncludeNotice],
                vec![Limitation::Liability, Limitation::Warranty],
            ),
            (_, CopyleftScope::File) => (
                open,
                vec![IncludeNotice, DiscloseSource, FileLevelDisclosure],
                vec![Limitation::Liability, Limitation::Warranty, Limitation::TrademarkUse],
            ),
            (_, CopyleftScope::Library) => (
                open,
                vec![IncludeNotice, DiscloseSource, SameLicense, AllowRelinking],
                vec![Limitation::Liability, Limitation::Warranty],
            ),
            (_, CopyleftScope::Program) => (
                open,
                vec![IncludeNotice, StateChanges, DiscloseSource, SameLicense],
                vec![Limitation::Liability, Limitation::Warranty],
            ),
            (_, CopyleftScope::Network) => (
                open,
                vec![IncludeNotice, StateChanges, DiscloseSource, SameLicense, NetworkDisclosure],
                vec![Limitation::Liability, Limitation::Warranty],
            ),
        };

        Self {
            id: id.to_string(),
            category,
            scope,
            permissions,
            obligations,
            limitations,
        }
    }

    fn with_patent_grant(mut self) -> Self {
        self.permissions.push(Permission::PatentUse);
        self.obligations.push(Obligation::StateChanges);
        self.limitations.push(Limitation::TrademarkUse);
        self
    }

    pub fn is_network_copyleft(&self) -> bool {
        self.scope == CopyleftScope::Network
    }

    pub fn is_file_scoped(&self) -> bool {
        self.scope == CopyleftScope::File
    }
}

/// Normalized license id → [`LicenseRecord`], with alias resolution.
///
/// Lookups are case-insensitive. Unrecognized ids resolve to
/// [`LicenseCategory::Unknown`] rather than failing.
#[derive(Debug, Clone)]
pub struct LicenseCatalog {
    /// Keyed by lowercase id.
    records: HashMap<String, LicenseRecord>,
    /// Lowercase alias → canonical id.
    aliases: HashMap<String, String>,
}

impl Default for LicenseCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LicenseCatalog {
    pub fn empty() -> Self {
        Self {
            records: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// The built-in catalog of common SPDX licenses and their aliases.
    pub fn builtin() -> Self {
        use CopyleftScope as S;
        use LicenseCategory as C;

        let mut catalog = Self::empty();

        for id in [
            "MIT",
            "MIT-0",
            "BSD-2-Clause",
            "BSD-3-Clause",
            "BSD-4-Clause",
            "ISC",
            "0BSD",
            "Unlicense",
            "Zlib",
            "CC0-1.0",
            "CC-BY-4.0",
            "BSL-1.0",
            "Python-2.0",
            "PSF-2.0",
            "WTFPL",
            "Artistic-2.0",
            "BlueOak-1.0.0",
            "Unicode-DFS-2016",
            "Unicode-3.0",
        ] {
            catalog.insert(LicenseRecord::new(id, C::Permissive, S::None));
        }
        catalog.insert(LicenseRecord::new("Apache-2.0", C::Permissive, S::None).with_patent_grant());

        for id in ["LGPL-2.0", "LGPL-2.1", "LGPL-3.0"] {
            catalog.insert(LicenseRecord::new(id, C::WeakCopyleft, S::Library));
        }
        for id in [
            "MPL-1.1", "MPL-2.0", "EPL-1.0", "EPL-2.0", "CDDL-1.0", "CDDL-1.1", "EUPL-1.2",
            "APSL-2.0", "MS-RL",
        ] {
            catalog.insert(LicenseRecord::new(id, C::WeakCopyleft, S::File));
        }

        for id in ["GPL-2.0", "GPL-3.0", "EUPL-1.1", "CC-BY-SA-4.0"] {
            catalog.insert(LicenseRecord::new(id, C::StrongCopyleft, S::Program));
        }
        for id in ["AGPL-3.0", "SSPL-1.0", "OSL-3.0"] {
            catalog.insert(LicenseRecord::new(id, C::StrongCopyleft, S::Network));
        }

        for id in ["Proprietary", "BUSL-1.1", "Elastic-2.0", "CC-BY-NC-4.0"] {
            catalog.insert(LicenseRecord::new(id, C::Proprietary, S::None));
        }

        for (alias, id) in BUILTIN_ALIASES {
            catalog.add_alias(alias, id);
        }

        catalog
    }

    pub fn insert(&mut self, record: LicenseRecord) {
        self.records.insert(record.id.to_lowercase(), record);
    }

    pub fn add_alias(&mut self, alias: &str, id: &str) {
        self.aliases.insert(alias.trim().to_lowercase(), id.to_string());
    }

    /// Resolve a raw license string to its canonical id.
    ///
    /// - empty / `unknown` / `NOASSERTION` → [`UNKNOWN_LICENSE`]
    /// - `OR` choices → the least restrictive alternative
    /// - `AND` conjunctions → the most restrictive member
    /// - `WITH` exceptions are dropped
    /// - aliases (`Apache`, `GPLv3`, `The MIT License`) and SPDX suffixes
    ///   (`-only`, `-or-later`, `+`) are folded onto the base id
    /// - anything else is returned trimmed, as written
    pub fn normalize(&self, raw: &str) -> String {
        if is_placeholder(raw) {
            return UNKNOWN_LICENSE.to_string();
        }

        let expr = LicenseExpr::parse(raw);
        if expr.is_choice() {
            let ids: Vec<String> = expr.alternatives().iter().map(|a| self.normalize(a)).collect();
            return self.least_restrictive(ids);
        }

        let alternative = expr.alternatives()[0].to_string();
        let parts = conjuncts(&alternative);
        if parts.len() > 1 {
            let ids: Vec<String> = parts.iter().map(|p| self.normalize(p)).collect();
            return self.most_restrictive(ids);
        }

        self.normalize_id(&alternative)
    }

    fn normalize_id(&self, id: &str) -> String {
        let trimmed = id.trim();
        if is_placeholder(trimmed) {
            return UNKNOWN_LICENSE.to_string();
        }
        let lower = trimmed.to_lowercase();

        if let Some(canonical) = self.canonical(&lower) {
            return canonical;
        }

        let base = strip_suffix(&lower);
        if let Some(canonical) = self.canonical(base) {
            return canonical;
        }

        if lower.contains("proprietary") || lower.contains("commercial") {
            return "Proprietary".to_string();
        }

        trimmed.to_string()
    }

    fn canonical(&self, lower: &str) -> Option<String> {
        if let Some(record) = self.records.get(lower) {
            return Some(record.id.clone());
        }
        self.aliases.get(lower).map(|id| {
            self.records
                .get(&id.to_lowercase())
                .map(|r| r.id.clone())
                .unwrap_or_else(|| id.clone())
        })
    }

    /// The record for a raw license string, after normalization.
    pub fn lookup(&self, raw: &str) -> Option<&LicenseRecord> {
        self.records.get(&self.normalize(raw).to_lowercase())
    }

    pub fn category(&self, raw: &str) -> LicenseCategory {
        self.lookup(raw)
            .map(|r| r.category)
            .unwrap_or(LicenseCategory::Unknown)
    }

    pub fn scope(&self, raw: &str) -> CopyleftScope {
        self.lookup(raw).map(|r| r.scope).unwrap_or(CopyleftScope::None)
    }

    pub fn is_network_copyleft(&self, raw: &str) -> bool {
        self.lookup(raw).is_some_and(LicenseRecord::is_network_copyleft)
    }

    pub fn is_file_scoped(&self, raw: &str) -> bool {
        self.lookup(raw).is_some_and(LicenseRecord::is_file_scoped)
    }

    /// Restrictiveness rank used to reduce `AND`/`OR` expressions.
    ///
    /// Proprietary > network copyleft > strong copyleft > weak copyleft >
    /// unknown > permissive.
    fn rank(&self, id: &str) -> u8 {
        match self.lookup(id) {
            Some(r) if r.category == LicenseCategory::Proprietary => 5,
            Some(r) if r.scope == CopyleftScope::Network => 4,
            Some(r) if r.category == LicenseCategory::StrongCopyleft => 3,
            Some(r) if r.category == LicenseCategory::WeakCopyleft => 2,
            Some(_) => 0,
            None => 1,
        }
    }

    fn most_restrictive(&self, ids: Vec<String>) -> String {
        let mut best: Option<(u8, String)> = None;
        for id in ids {
            let rank = self.rank(&id);
            if best.as_ref().map_or(true, |(r, _)| rank > *r) {
                best = Some((rank, id));
            }
        }
        best.map(|(_, id)| id)
            .unwrap_or_else(|| UNKNOWN_LICENSE.to_string())
    }

    fn least_restrictive(&self, ids: Vec<String>) -> String {
        let mut best: Option<(u8, String)> = None;
        for id in ids {
            let rank = self.rank(&id);
            if best.as_ref().map_or(true, |(r, _)| rank < *r) {
                best = Some((rank, id));
            }
        }
        best.map(|(_, id)| id)
            .unwrap_or_else(|| UNKNOWN_LICENSE.to_string())
    }
}

pub(crate) fn is_placeholder(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "" | "unknown" | "noassertion" | "none" | "n/a"
    )
}

fn strip_suffix(lower: &str) -> &str {
    lower
        .trim_end_matches('+')
        .trim_end_matches("-or-later")
        .trim_end_matches("-only")
}

/// Common non-SPDX spellings found in manifests and registries.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("apache", "Apache-2.0"),
    ("apache 2", "Apache-2.0"),
    ("apache 2.0", "Apache-2.0"),
    ("apache-2", "Apache-2.0"),
    ("apache2", "Apache-2.0"),
    ("apache license 2.0", "Apache-2.0"),
    ("apache license, version 2.0", "Apache-2.0"),
    ("apache software license", "Apache-2.0"),
    ("asl 2.0", "Apache-2.0"),
    ("mit license", "MIT"),
    ("the mit license", "MIT"),
    ("expat", "MIT"),
    ("bsd", "BSD-3-Clause"),
    ("bsd license", "BSD-3-Clause"),
    ("new bsd", "BSD-3-Clause"),
    ("modified bsd", "BSD-3-Clause"),
    ("bsd 3-clause", "BSD-3-Clause"),
    ("bsd-3", "BSD-3-Clause"),
    ("bsd 2-clause", "BSD-2-Clause"),
    ("simplified bsd", "BSD-2-Clause"),
    ("freebsd", "BSD-2-Clause"),
    ("isc license", "ISC"),
    ("isc license (iscl)", "ISC"),
    ("cc0", "CC0-1.0"),
    ("public domain", "CC0-1.0"),
    ("boost", "BSL-1.0"),
    ("boost software license 1.0", "BSL-1.0"),
    ("zlib license", "Zlib"),
    ("gpl", "GPL-2.0"),
    ("gplv2", "GPL-2.0"),
    ("gpl v2", "GPL-2.0"),
    ("gpl-2", "GPL-2.0"),
    ("gnu gpl v2", "GPL-2.0"),
    ("gnu general public license v2", "GPL-2.0"),
    ("gnu general public license v2 (gplv2)", "GPL-2.0"),
    ("gplv3", "GPL-3.0"),
    ("gpl v3", "GPL-3.0"),
    ("gpl-3", "GPL-3.0"),
    ("gnu gpl v3", "GPL-3.0"),
    ("gnu general public license v3", "GPL-3.0"),
    ("gnu general public license v3 (gplv3)", "GPL-3.0"),
    ("lgpl", "LGPL-2.1"),
    ("lgplv2.1", "LGPL-2.1"),
    ("lgpl v2.1", "LGPL-2.1"),
    ("gnu lgpl v2.1", "LGPL-2.1"),
    ("lgplv3", "LGPL-3.0"),
    ("lgpl v3", "LGPL-3.0"),
    ("gnu lgpl v3", "LGPL-3.0"),
    ("gnu lesser general public license v3 (lgplv3)", "LGPL-3.0"),
    ("agpl", "AGPL-3.0"),
    ("agplv3", "AGPL-3.0"),
    ("agpl v3", "AGPL-3.0"),
    ("gnu agpl v3", "AGPL-3.0"),
    ("gnu affero general public license v3", "AGPL-3.0"),
    ("sspl", "SSPL-1.0"),
    ("mpl", "MPL-2.0"),
    ("mpl 2.0", "MPL-2.0"),
    ("mplv2", "MPL-2.0"),
    ("mozilla public license 2.0", "MPL-2.0"),
    ("mozilla public license 2.0 (mpl 2.0)", "MPL-2.0"),
    ("epl", "EPL-2.0"),
    ("eclipse public license 2.0", "EPL-2.0"),
    ("unlicensed", "Proprietary"),
    ("all rights reserved", "Proprietary"),
];
