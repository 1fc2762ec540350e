//! License compatibility analysis.
//!
//! - [`matrix`] — license-pair verdicts from [`rules`], with wildcard,
//!   strict-mode and heuristic fallback.
//! - [`detector`] — tree walk producing conflicts and the aggregate score.
//! - [`path`] — contamination path, narrative and obligations per conflict.
//! - [`risk`] — severity regraded against project intent.
//! - [`causal`] — per-package share of the risk penalty.
//! - [`fixes`] — effort-ranked remediation options.
//! - [`scan`] — composes the above into one call.

pub mod causal;
pub mod detector;
pub mod fixes;
pub mod matrix;
pub mod path;
pub mod risk;
pub mod rules;
pub mod scan;

pub use detector::{ConflictDetector, Detection};
pub use fixes::FixEngine;
pub use matrix::{CompatibilityMatrix, STRICT_MODE_VIOLATION};
pub use path::PathResolver;
pub use risk::DynamicRiskEngine;
pub use scan::ScanOrchestrator;
