//! Context-aware severity grading.
//!
//! The static severity on a conflict answers "does this pair clash"; the
//! grade here answers "how much does that matter for what this project is
//! trying to do". Every intent has its own decision table and every table
//! is total.

use crate::license::LicenseCatalog;
use crate::models::{
    CopyleftScope, DynamicSeverity, Intent, LicenseCategory, LinkingModel, ProjectContext,
    RiskLevel,
};

/// Project license → dependency licenses that may be combined into it
/// without changing the project's terms.
const FAMILY: &[(&str, &[&str])] = &[
    ("GPL-3.0", &["AGPL-3.0", "LGPL-3.0"]),
    ("GPL-2.0", &["LGPL-2.1"]),
    ("AGPL-3.0", &["GPL-3.0", "AGPL-3.0"]),
];

const GPL_PROJECTS: &[&str] = &["GPL-2.0", "GPL-3.0"];

pub struct DynamicRiskEngine<'a> {
    catalog: &'a LicenseCatalog,
}

impl<'a> DynamicRiskEngine<'a> {
    pub fn new(catalog: &'a LicenseCatalog) -> Self {
        Self { catalog }
    }

    /// Grade a license pair against the project context. An empty
    /// `project_license` means the project has not declared one.
    pub fn calculate_severity(
        &self,
        project_license: &str,
        dependency_license: &str,
        context: &ProjectContext,
    ) -> DynamicSeverity {
        let dep = self.catalog.normalize(dependency_license);
        match context.intent {
            Intent::Proprietary => self.proprietary(&dep, context),
            Intent::OpenSource => self.open_source(project_license, &dep, context),
            Intent::Undecided => self.undecided(&dep, context),
        }
    }

    fn proprietary(&self, dep: &str, context: &ProjectContext) -> DynamicSeverity {
        let category = self.catalog.category(dep);
        let scope = self.catalog.scope(dep);
        let distributed = format!("distribution is {}", context.distribution);
        let linked = format!("linking is {}", context.linking);

        match (category, scope) {
            (LicenseCategory::StrongCopyleft, _) => grade(
                RiskLevel::Critical,
                format!("{} is strong copyleft and the project is closed source", dep),
                "Release the combined work's source under the same license",
                format!(
                    "Shipping {} inside proprietary software requires publishing the whole program under {}.",
                    dep, dep
                ),
                vec![distributed, "project intent is proprietary".to_string()],
                "Incompatible with keeping the project proprietary",
            ),
            (LicenseCategory::WeakCopyleft, CopyleftScope::File) => grade(
                RiskLevel::Medium,
                format!("{} is file-scoped copyleft", dep),
                "Publish changes made to the dependency's own files",
                format!(
                    "{} obligations stop at the files it covers; proprietary code stays private if those files are kept unmodified or their changes are published.",
                    dep
                ),
                vec![distributed],
                "Manageable while the dependency's files are kept separate",
            ),
            (LicenseCategory::WeakCopyleft, _) if context.linking == LinkingModel::Static => grade(
                RiskLevel::High,
                format!("{} is statically linked into a proprietary binary", dep),
                "Allow users to relink the application against a modified library",
                format!(
                    "Static linking of {} requires shipping object files or another means to relink; most proprietary vendors avoid this.",
                    dep
                ),
                vec![linked, distributed],
                "Static linking conflicts with proprietary distribution; switch to dynamic linking",
            ),
            (LicenseCategory::WeakCopyleft, _) => grade(
                RiskLevel::Medium,
                format!("{} is weak copyleft used through {} linking", dep, context.linking),
                "Keep the library replaceable and publish changes to it",
                format!(
                    "{} permits use from proprietary code when the library stays a separate, replaceable component.",
                    dep
                ),
                vec![linked],
                "Compatible with proprietary intent if the library boundary is preserved",
            ),
            (LicenseCategory::Permissive, _) => grade(
                RiskLevel::Safe,
                format!("{} is permissive", dep),
                "Preserve copyright and license notices",
                format!("{} allows use in proprietary software with attribution.", dep),
                vec![],
                "No impact on proprietary intent",
            ),
            (LicenseCategory::Proprietary, _) | (LicenseCategory::Unknown, _) => grade(
                RiskLevel::Medium,
                format!("{} is not a recognized open-source license", dep),
                "Verify the license terms manually",
                format!(
                    "The terms of {} could not be classified; confirm redistribution rights before shipping.",
                    dep
                ),
                vec![distributed],
                "Unknown until the license terms are reviewed",
            ),
        }
    }

    fn open_source(&self, project: &str, dep: &str, context: &ProjectContext) -> DynamicSeverity {
        let project = project.trim();
        if project.is_empty() {
            return grade(
                RiskLevel::Low,
                "the project has not declared a license".to_string(),
                "Declare a project license",
                format!(
                    "Compatibility with {} cannot be confirmed until the project picks its own license.",
                    dep
                ),
                vec!["project license is undeclared".to_string()],
                self.flexibility_note(context, "Choosing a license will settle this"),
            );
        }

        let project = self.catalog.normalize(project);
        if project.eq_ignore_ascii_case(dep) {
            return grade(
                RiskLevel::Safe,
                format!("{} matches the project license", dep),
                "Preserve copyright and license notices",
                format!("The dependency and the project share {}.", dep),
                vec![],
                "No impact on open-source intent",
            );
        }

        if dep == "Apache-2.0" && GPL_PROJECTS.contains(&project.as_str()) {
            return grade(
                RiskLevel::High,
                format!("Apache-2.0 patent terms conflict with {}", project),
                "Check that the patent termination clause is acceptable under the project license",
                format!(
                    "Apache-2.0 adds patent termination and indemnity terms that {} treats as further restrictions; GPL-2.0 cannot accept them and GPL-3.0 combinations need the whole work to move to GPL-3.0.",
                    project
                ),
                vec![format!("project license is {}", project)],
                "May require relicensing the combined work",
            );
        }

        let category = self.catalog.category(dep);
        if category == LicenseCategory::Permissive {
            return grade(
                RiskLevel::Safe,
                format!("{} is permissive", dep),
                "Preserve copyright and license notices",
                format!("{} can be included in a {} project with attribution.", dep, project),
                vec![],
                "No impact on open-source intent",
            );
        }

        if accepts(&project, dep) {
            return grade(
                RiskLevel::Safe,
                format!("{} is in the {} license family", dep, project),
                "Distribute the combined work under the project license",
                format!("{} explicitly permits combination with {}.", project, dep),
                vec![format!("project license is {}", project)],
                "No impact on open-source intent",
            );
        }

        if category == LicenseCategory::StrongCopyleft {
            return grade(
                RiskLevel::High,
                format!("{} cannot be combined with {}", dep, project),
                format!("Relicense the project under {} or replace the dependency", dep),
                format!(
                    "{} requires the combined work to be distributed under {}, which {} does not allow.",
                    dep, dep, project
                ),
                vec![format!("project license is {}", project)],
                self.flexibility_note(context, "Forces a relicensing decision"),
            );
        }

        grade(
            RiskLevel::Medium,
            format!("{} and {} need review", dep, project),
            "Review both licenses for conflicting terms",
            format!(
                "No family rule covers combining {} with a {} project; check the terms by hand.",
                dep, project
            ),
            vec![format!("project license is {}", project)],
            "Likely workable after review",
        )
    }

    fn undecided(&self, dep: &str, context: &ProjectContext) -> DynamicSeverity {
        match self.catalog.category(dep) {
            LicenseCategory::StrongCopyleft => grade(
                RiskLevel::Medium,
                format!("{} reduces future flexibility", dep),
                "Adopt a compatible copyleft license if the dependency is kept",
                format!(
                    "Keeping {} commits the project to a copyleft license; a proprietary route would require replacing it.",
                    dep
                ),
                vec!["project intent is undecided".to_string()],
                self.flexibility_note(context, "Narrows the licensing options still open"),
            ),
            LicenseCategory::WeakCopyleft => grade(
                RiskLevel::Low,
                format!("{} is weak copyleft", dep),
                "Keep the library separate and publish changes to it",
                format!("{} works under both open-source and proprietary routes with care.", dep),
                vec!["project intent is undecided".to_string()],
                "Leaves most options open",
            ),
            LicenseCategory::Permissive => grade(
                RiskLevel::Safe,
                format!("{} is permissive", dep),
                "Preserve copyright and license notices",
                format!("{} fits any licensing route the project may choose.", dep),
                vec![],
                "No impact on future options",
            ),
            LicenseCategory::Proprietary | LicenseCategory::Unknown => grade(
                RiskLevel::Low,
                format!("{} is not a recognized open-source license", dep),
                "Verify the license terms manually",
                format!("The terms of {} should be reviewed before the project commits to a license.", dep),
                vec!["project intent is undecided".to_string()],
                "Unknown until the license terms are reviewed",
            ),
        }
    }

    fn flexibility_note(&self, context: &ProjectContext, note: &str) -> String {
        if context.future_flexibility {
            format!("{}; conflicts with the goal of keeping relicensing options open", note)
        } else {
            note.to_string()
        }
    }
}

fn accepts(project: &str, dep: &str) -> bool {
    FAMILY
        .iter()
        .find(|(p, _)| p.eq_ignore_ascii_case(project))
        .is_some_and(|(_, deps)| deps.iter().any(|d| d.eq_ignore_ascii_case(dep)))
}

fn grade(
    level: RiskLevel,
    reason: String,
    obligation: impl Into<String>,
    explanation: String,
    applies_when: Vec<String>,
    intent_impact: impl Into<String>,
) -> DynamicSeverity {
    DynamicSeverity {
        level,
        reason,
        obligation: obligation.into(),
        explanation,
        applies_when,
        intent_impact: intent_impact.into(),
    }
}
