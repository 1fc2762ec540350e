//! Shared generators.

use proptest::prelude::*;

use license_compat::models::{
    DependencyNode, DistributionModel, Intent, LinkingModel, ProjectContext,
};

/// Known ids, aliases, expressions and junk, so every lookup path is hit.
pub const LICENSES: &[&str] = &[
    "MIT",
    "Apache-2.0",
    "BSD-3-Clause",
    "ISC",
    "BlueOak-1.0.0",
    "LGPL-2.1",
    "LGPL-3.0",
    "MPL-2.0",
    "EPL-2.0",
    "EUPL-1.2",
    "GPL-2.0",
    "GPL-3.0-or-later",
    "GPLv3",
    "AGPL-3.0",
    "SSPL-1.0",
    "EUPL-1.1",
    "BUSL-1.1",
    "Proprietary",
    "UNLICENSED",
    "NOASSERTION",
    "",
    "MIT OR GPL-3.0",
    "GPL-2.0/BSD-3-Clause",
    "MIT AND LGPL-2.1",
    "Apache-2.0 WITH LLVM-exception",
    "Some-Custom-License",
];

pub fn license() -> impl Strategy<Value = String> {
    prop::sample::select(LICENSES).prop_map(str::to_string)
}

pub fn linking() -> impl Strategy<Value = LinkingModel> {
    prop::sample::select(LinkingModel::ALL.to_vec())
}

pub fn distribution() -> impl Strategy<Value = DistributionModel> {
    prop::sample::select(DistributionModel::ALL.to_vec())
}

pub fn intent() -> impl Strategy<Value = Intent> {
    prop::sample::select(vec![Intent::OpenSource, Intent::Proprietary, Intent::Undecided])
}

pub fn context() -> impl Strategy<Value = ProjectContext> {
    (
        intent(),
        distribution(),
        linking(),
        prop::option::of(license()),
        any::<bool>(),
    )
        .prop_map(|(intent, distribution, linking, license, future_flexibility)| ProjectContext {
            intent,
            distribution,
            linking,
            license,
            future_flexibility,
        })
}

fn node() -> impl Strategy<Value = DependencyNode> {
    let name = proptest::string::string_regex("[a-z][a-z0-9-]{0,8}").unwrap();
    (
        name,
        license(),
        prop::bool::weighted(0.15),
        prop::option::weighted(0.2, linking()),
    )
        .prop_map(|(name, license, dev_only, linking)| {
            let mut node = DependencyNode::new(&name, "1.0.0", license.as_str());
            node.dev_only = dev_only;
            node.linking = linking;
            node
        })
}

/// A project root with a random dependency forest below it.
pub fn tree() -> impl Strategy<Value = DependencyNode> {
    let subtree = node().prop_recursive(3, 32, 4, |inner| {
        (node(), prop::collection::vec(inner, 0..4)).prop_map(|(mut parent, children)| {
            parent.children = children;
            parent
        })
    });
    prop::collection::vec(subtree, 0..6).prop_map(|children| {
        let mut root = DependencyNode::new("app", "1.0.0", "MIT");
        root.children = children;
        root
    })
}
