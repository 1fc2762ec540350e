//! Property tests for the compatibility matrix.

use proptest::prelude::*;

use license_compat::engine::CompatibilityMatrix;
use license_compat::models::{DistributionModel, LinkingModel, Severity};

use crate::strategies::{distribution, license, linking};

const PERMISSIVE: &[&str] = &["MIT", "Apache-2.0", "BSD-3-Clause", "ISC"];
const STRONG_COPYLEFT: &[&str] = &["GPL-2.0", "GPL-3.0", "GPL-2.0-only", "GPL-3.0-or-later"];
const PERMISSIVE_PROJECTS: &[&str] = &["MIT", "Apache-2.0", "BSD-2-Clause", "BSD-3-Clause", "ISC", "0BSD"];

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: every lookup yields a fully populated verdict.
    #[test]
    fn property_lookup_is_total(
        project in license(),
        dependency in license(),
        linking in linking(),
        distribution in distribution(),
        strict in any::<bool>(),
    ) {
        let matrix = CompatibilityMatrix::builtin();
        let v = matrix.is_compatible(&project, &dependency, linking, distribution, strict);
        prop_assert!(!v.rule_id.is_empty());
        prop_assert!(!v.reason.is_empty());
        prop_assert!(Severity::ALL.contains(&v.severity));
    }

    /// PROPERTY: strict mode never turns an incompatible pair compatible.
    #[test]
    fn property_strict_mode_only_tightens(
        project in license(),
        dependency in license(),
        linking in linking(),
        distribution in distribution(),
    ) {
        let matrix = CompatibilityMatrix::builtin();
        let strict = matrix.is_compatible(&project, &dependency, linking, distribution, true);
        let lenient = matrix.is_compatible(&project, &dependency, linking, distribution, false);
        if strict.compatible {
            prop_assert!(lenient.compatible);
        }
    }

    /// PROPERTY: permissive dependencies fit any permissive project in a
    /// statically linked proprietary product.
    #[test]
    fn property_permissive_always_compatible(
        project in prop::sample::select(PERMISSIVE_PROJECTS),
        dependency in prop::sample::select(PERMISSIVE),
        strict in any::<bool>(),
    ) {
        let matrix = CompatibilityMatrix::builtin();
        let v = matrix.is_compatible(
            project,
            dependency,
            LinkingModel::Static,
            DistributionModel::Proprietary,
            strict,
        );
        prop_assert!(v.compatible, "{} under {}: {}", dependency, project, v.reason);
    }

    /// PROPERTY: GPL in a statically linked proprietary product is critical
    /// whichever permissive license the project carries.
    #[test]
    fn property_strong_copyleft_always_critical(
        project in prop::sample::select(PERMISSIVE_PROJECTS),
        dependency in prop::sample::select(STRONG_COPYLEFT),
        strict in any::<bool>(),
    ) {
        let matrix = CompatibilityMatrix::builtin();
        let v = matrix.is_compatible(
            project,
            dependency,
            LinkingModel::Static,
            DistributionModel::Proprietary,
            strict,
        );
        prop_assert!(!v.compatible);
        prop_assert_eq!(v.severity, Severity::Critical);
    }

    /// PROPERTY: arbitrary license text never panics the lookup.
    #[test]
    fn property_arbitrary_text_never_panics(
        project in ".{0,48}",
        dependency in ".{0,48}",
        linking in linking(),
        distribution in distribution(),
    ) {
        let matrix = CompatibilityMatrix::builtin();
        let _ = matrix.is_compatible(&project, &dependency, linking, distribution, false);
        let _ = matrix.catalog().normalize(&dependency);
    }
}
