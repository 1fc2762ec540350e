use std::collections::HashSet;

use tracing::warn;

use crate::license::{LicenseCatalog, Obligation};
use crate::models::{
    ConflictDependency, ConflictPath, DependencyNode, LicenseCategory, LinkingModel, PathEntry,
    RuleTrigger,
};

/// Rebuilds the root-to-conflict chain for a detected conflict and explains
/// how the dependency's terms reach the project.
pub struct PathResolver<'a> {
    catalog: &'a LicenseCatalog,
}

impl<'a> PathResolver<'a> {
    pub fn new(catalog: &'a LicenseCatalog) -> Self {
        Self { catalog }
    }

    pub fn build_conflict_path(
        &self,
        root: &DependencyNode,
        dependency: &ConflictDependency,
        project_license: &str,
    ) -> ConflictPath {
        let (mut path, resolved) = match find_path(root, dependency) {
            Some(nodes) => (nodes, true),
            None => {
                warn!(
                    package = %dependency.name,
                    root = %root.name,
                    "conflict node not found in tree, using direct path"
                );
                let direct = vec![
                    entry(&root.name, &root.version, root.license.to_string()),
                    entry(&dependency.name, &dependency.version, dependency.license.clone()),
                ];
                (direct, false)
            }
        };

        if let Some(last) = path.last_mut() {
            last.license = dependency.license.clone();
            last.is_conflict_point = true;
        }

        let rule_triggered = self.classify(&dependency.license, dependency.linking);
        let explanation = self.explain(&path, rule_triggered, project_license);
        let obligations = self.obligations(&dependency.license);

        ConflictPath {
            path,
            rule_triggered,
            explanation,
            obligations,
            resolved,
        }
    }

    fn classify(&self, license: &str, linking: LinkingModel) -> RuleTrigger {
        if self.catalog.is_network_copyleft(license) {
            return RuleTrigger::NetworkCopyleft;
        }
        match self.catalog.category(license) {
            LicenseCategory::StrongCopyleft => RuleTrigger::CopyleftContamination,
            LicenseCategory::WeakCopyleft if linking == LinkingModel::Static => {
                RuleTrigger::WeakCopyleftStaticLink
            }
            _ => RuleTrigger::LicenseMismatch,
        }
    }

    fn explain(&self, path: &[PathEntry], trigger: RuleTrigger, project_license: &str) -> String {
        let chain = path
            .iter()
            .map(|e| format!("{} ({})", e.name, e.license))
            .collect::<Vec<_>>()
            .join(" -> ");

        let project = if project_license.trim().is_empty() {
            "the project".to_string()
        } else {
            format!("the {} project", project_license)
        };

        let (name, license) = match path.last() {
            Some(last) => (last.name.as_str(), last.license.as_str()),
            None => ("dependency", "unknown"),
        };
        let hops = path.len().saturating_sub(1);
        let via = if hops == 1 {
            "directly".to_string()
        } else {
            format!("through {} hops", hops)
        };

        let effect = match trigger {
            RuleTrigger::NetworkCopyleft => format!(
                "{} copyleft in {} reaches {} {}; serving it over a network triggers source disclosure",
                license, name, project, via
            ),
            RuleTrigger::CopyleftContamination => format!(
                "{} copyleft in {} extends to {} {}; the combined work must carry the same license",
                license, name, project, via
            ),
            RuleTrigger::WeakCopyleftStaticLink => format!(
                "{} is statically linked into {} {}; the library must remain replaceable by the user",
                name, project, via
            ),
            RuleTrigger::LicenseMismatch => format!(
                "{} terms of {} are not compatible with {}, reached {}",
                license, name, project, via
            ),
        };

        format!("{}: {}", chain, effect)
    }

    /// Obligations the conflicting license imposes, from catalog facts with
    /// a substring fallback for ids the catalog does not know.
    fn obligations(&self, license: &str) -> Vec<String> {
        let mut found: Vec<Obligation> = match self.catalog.lookup(license) {
            Some(record) => record.obligations.clone(),
            None => {
                let upper = license.to_uppercase();
                let mut guessed = Vec::new();
                if upper.contains("GPL") || upper.contains("SSPL") {
                    guessed.extend([
                        Obligation::IncludeNotice,
                        Obligation::DiscloseSource,
                        Obligation::SameLicense,
                    ]);
                }
                if upper.contains("AGPL") || upper.contains("SSPL") {
                    guessed.push(Obligation::NetworkDisclosure);
                }
                if ["MPL", "EPL", "CDDL"].iter().any(|f| upper.contains(f)) {
                    guessed.extend([Obligation::IncludeNotice, Obligation::FileLevelDisclosure]);
                }
                guessed
            }
        };

        let mut seen = HashSet::new();
        found.retain(|o| seen.insert(*o));

        let mut out: Vec<String> = found.iter().map(|o| o.to_string()).collect();
        if self.catalog.category(license) == LicenseCategory::Proprietary {
            out.push("Obtain a commercial license from the copyright holder".to_string());
        }
        out
    }
}

/// Root-to-node chain for the conflicting package.
///
/// When the detector recorded a name chain, only children that continue that
/// chain are followed and the final node must also match the version, so
/// shared or same-named packages elsewhere in the tree are never picked.
/// Without a chain the first node with the target name wins, and names already
/// on the current branch are not expanded again.
fn find_path<'t>(root: &'t DependencyNode, target: &ConflictDependency) -> Option<Vec<PathEntry>> {
    if target.path.first().is_some_and(|first| *first != root.name) {
        return None;
    }

    let mut branch: Vec<&'t DependencyNode> = Vec::new();
    if !descend(root, target, &mut branch) {
        return None;
    }
    Some(
        branch
            .iter()
            .map(|node| entry(&node.name, &node.version, node.license.to_string()))
            .collect(),
    )
}

fn descend<'t>(
    node: &'t DependencyNode,
    target: &ConflictDependency,
    branch: &mut Vec<&'t DependencyNode>,
) -> bool {
    branch.push(node);
    let chain = &target.path;

    if branch.len() > 1 && node.name == target.name {
        let found = if chain.is_empty() {
            true
        } else {
            branch.len() == chain.len() && node.version == target.version
        };
        if found {
            return true;
        }
    }

    for child in node.children.iter().filter(|c| !c.dev_only) {
        let follow = if chain.is_empty() {
            !branch.iter().any(|ancestor| ancestor.name == child.name)
        } else {
            chain.get(branch.len()) == Some(&child.name)
        };
        if follow && descend(child, target, branch) {
            return true;
        }
    }

    branch.pop();
    false
}

fn entry(name: &str, version: &str, license: String) -> PathEntry {
    PathEntry {
        name: name.to_string(),
        version: version.to_string(),
        license,
        is_conflict_point: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dependency(name: &str, license: &str) -> ConflictDependency {
        linked_dependency(name, license, LinkingModel::Static)
    }

    fn linked_dependency(name: &str, license: &str, linking: LinkingModel) -> ConflictDependency {
        ConflictDependency {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            license: license.to_string(),
            path: vec![],
            linking,
        }
    }

    fn chained(name: &str, version: &str, license: &str, chain: &[&str]) -> ConflictDependency {
        ConflictDependency {
            version: version.to_string(),
            path: chain.iter().map(|s| s.to_string()).collect(),
            ..dependency(name, license)
        }
    }

    fn names(path: &ConflictPath) -> Vec<&str> {
        path.path.iter().map(|e| e.name.as_str()).collect()
    }

    fn tree() -> DependencyNode {
        DependencyNode::new("app", "1.0.0", "MIT")
            .with_child(DependencyNode::new("log", "0.4.0", "MIT"))
            .with_child(
                DependencyNode::new("http", "2.0.0", "Apache-2.0")
                    .with_child(DependencyNode::new("gpl-core", "0.1.0", "GPL-3.0")),
            )
    }

    #[test]
    fn test_transitive_path() {
        let catalog = LicenseCatalog::builtin();
        let resolver = PathResolver::new(&catalog);
        let path = resolver.build_conflict_path(&tree(), &dependency("gpl-core", "GPL-3.0"), "MIT");

        assert!(path.resolved);
        let names: Vec<_> = path.path.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["app", "http", "gpl-core"]);
        assert!(path.path[2].is_conflict_point);
        assert!(!path.path[1].is_conflict_point);
        assert_eq!(path.rule_triggered, RuleTrigger::CopyleftContamination);
        assert!(path.explanation.starts_with("app (MIT) -> http (Apache-2.0) -> gpl-core (GPL-3.0)"));
        assert!(path.explanation.contains("through 2 hops"));
        assert!(path
            .obligations
            .contains(&"Disclose source code".to_string()));
        assert!(path
            .obligations
            .contains(&"License derivative works under the same terms".to_string()));
    }

    #[test]
    fn test_missing_node_falls_back_to_direct_path() {
        let catalog = LicenseCatalog::builtin();
        let resolver = PathResolver::new(&catalog);
        let path = resolver.build_conflict_path(&tree(), &dependency("ghost", "GPL-2.0"), "MIT");

        assert!(!path.resolved);
        assert_eq!(path.path.len(), 2);
        assert_eq!(path.path[0].name, "app");
        assert_eq!(path.path[1].name, "ghost");
        assert!(path.path[1].is_conflict_point);
        assert!(path.explanation.contains("directly"));
    }

    #[test]
    fn test_repeated_names_terminate() {
        // "a" reappears below itself; the search must not loop and must
        // still reach the target in the other branch.
        let tree = DependencyNode::new("app", "1.0.0", "MIT")
            .with_child(
                DependencyNode::new("a", "1.0.0", "MIT").with_child(
                    DependencyNode::new("a", "1.0.0", "MIT")
                        .with_child(DependencyNode::new("a", "1.0.0", "MIT")),
                ),
            )
            .with_child(DependencyNode::new("target", "1.0.0", "AGPL-3.0"));

        let catalog = LicenseCatalog::builtin();
        let resolver = PathResolver::new(&catalog);
        let path = resolver.build_conflict_path(&tree, &dependency("target", "AGPL-3.0"), "");

        assert!(path.resolved);
        assert_eq!(path.path.len(), 2);
        assert_eq!(path.rule_triggered, RuleTrigger::NetworkCopyleft);
        assert!(path
            .obligations
            .contains(&"Offer source to users interacting over a network".to_string()));
        assert!(path.explanation.contains("the project"));
    }

    #[test]
    fn test_weak_copyleft_trigger_depends_on_linking() {
        let tree = DependencyNode::new("app", "1.0.0", "MIT")
            .with_child(DependencyNode::new("glib", "2.0.0", "LGPL-2.1"));
        let catalog = LicenseCatalog::builtin();

        let resolver = PathResolver::new(&catalog);

        let static_path = resolver.build_conflict_path(&tree, &dependency("glib", "LGPL-2.1"), "MIT");
        assert_eq!(static_path.rule_triggered, RuleTrigger::WeakCopyleftStaticLink);

        let dynamic_path = resolver.build_conflict_path(
            &tree,
            &linked_dependency("glib", "LGPL-2.1", LinkingModel::Dynamic),
            "MIT",
        );
        assert_eq!(dynamic_path.rule_triggered, RuleTrigger::LicenseMismatch);
    }

    #[test]
    fn test_file_scoped_obligations() {
        let catalog = LicenseCatalog::builtin();
        let resolver = PathResolver::new(&catalog);
        let path = resolver.build_conflict_path(&tree(), &dependency("ghost", "MPL-2.0"), "MIT");
        assert!(path
            .obligations
            .contains(&"Publish modifications to covered files".to_string()));
    }

    #[test]
    fn test_unknown_id_substring_obligations() {
        let catalog = LicenseCatalog::builtin();
        let resolver = PathResolver::new(&catalog);
        let path = resolver.build_conflict_path(&tree(), &dependency("x", "AGPL-1.0"), "MIT");
        assert!(path
            .obligations
            .contains(&"Offer source to users interacting over a network".to_string()));
        assert!(path
            .obligations
            .contains(&"Disclose source code".to_string()));
    }

    #[test]
    fn test_shared_intermediate_reached_through_second_branch() {
        let tree = DependencyNode::new("app", "1.0.0", "MIT")
            .with_child(
                DependencyNode::new("a", "1.0.0", "MIT")
                    .with_child(DependencyNode::new("shared", "1.0.0", "MIT")),
            )
            .with_child(
                DependencyNode::new("b", "1.0.0", "MIT").with_child(
                    DependencyNode::new("shared", "1.0.0", "MIT")
                        .with_child(DependencyNode::new("gpl", "1.0.0", "GPL-3.0")),
                ),
            );

        let catalog = LicenseCatalog::builtin();
        let resolver = PathResolver::new(&catalog);
        let dep = chained("gpl", "1.0.0", "GPL-3.0", &["app", "b", "shared", "gpl"]);
        let path = resolver.build_conflict_path(&tree, &dep, "MIT");

        assert!(path.resolved);
        assert_eq!(names(&path), vec!["app", "b", "shared", "gpl"]);
        assert!(path.path[3].is_conflict_point);
    }

    #[test]
    fn test_same_name_resolved_by_chain_and_version() {
        let tree = DependencyNode::new("app", "1.0.0", "MIT")
            .with_child(
                DependencyNode::new("audio", "1.0.0", "MIT")
                    .with_child(DependencyNode::new("codec", "1.0.0", "MIT")),
            )
            .with_child(
                DependencyNode::new("video", "1.0.0", "MIT")
                    .with_child(DependencyNode::new("codec", "2.0.0", "GPL-3.0")),
            );

        let catalog = LicenseCatalog::builtin();
        let resolver = PathResolver::new(&catalog);
        let dep = chained("codec", "2.0.0", "GPL-3.0", &["app", "video", "codec"]);
        let path = resolver.build_conflict_path(&tree, &dep, "MIT");

        assert!(path.resolved);
        assert_eq!(names(&path), vec!["app", "video", "codec"]);
        assert_eq!(path.path[2].version, "2.0.0");
        assert!(!path.path[1].is_conflict_point);
    }

    #[test]
    fn test_chain_with_wrong_version_falls_back() {
        let catalog = LicenseCatalog::builtin();
        let resolver = PathResolver::new(&catalog);
        let dep = chained("gpl-core", "9.9.9", "GPL-3.0", &["app", "http", "gpl-core"]);
        let path = resolver.build_conflict_path(&tree(), &dep, "MIT");
        assert!(!path.resolved);
        assert_eq!(names(&path), vec!["app", "gpl-core"]);
    }
}
