use std::path::{Path, PathBuf};

use clap::Parser;

use license_compat::models::{DistributionModel, Intent, LinkingModel, Severity};
use license_compat::ScanConfig;

#[derive(Parser, Debug)]
#[command(
    name = "license-compat",
    about = "Check license compatibility across a dependency tree and rank fixes",
    version
)]
pub struct Cli {
    /// Dependency tree JSON produced by a lockfile parser
    pub tree: PathBuf,

    /// Project directory searched for .license-compat/config.toml [default: directory of TREE]
    #[arg(long, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Scan config file [default: <project>/.license-compat/config.toml, fallback ~/.config/license-compat/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Reject license pairs that no explicit rule covers
    #[arg(long)]
    pub strict: bool,

    /// Project intent: open-source, proprietary, undecided
    #[arg(long)]
    pub intent: Option<Intent>,

    /// Distribution model: proprietary, open-source, saas, cli, library, internal
    #[arg(long)]
    pub distribution: Option<DistributionModel>,

    /// Default linking model: static, dynamic, runtime
    #[arg(long)]
    pub linking: Option<LinkingModel>,

    /// Declared project license (SPDX id)
    #[arg(long, value_name = "SPDX")]
    pub project_license: Option<String>,

    /// Exit with code 1 when a conflict reaches this severity: low, medium, high, critical
    #[arg(long, value_name = "SEVERITY")]
    pub fail_on: Option<Severity>,

    /// Show paths, obligations, fixes and causal impact for every conflict
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}

impl Cli {
    /// Directory used for the project-level config lookup.
    pub fn project_dir(&self) -> PathBuf {
        if let Some(dir) = &self.project {
            return dir.clone();
        }
        self.tree
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Command-line flags win over config values.
    pub fn apply_overrides(&self, config: &mut ScanConfig) {
        if self.strict {
            config.strict_mode = true;
        }
        if let Some(intent) = self.intent {
            config.project.intent = intent;
        }
        if let Some(distribution) = self.distribution {
            config.project.distribution = distribution;
        }
        if let Some(linking) = self.linking {
            config.project.linking = linking;
        }
        if let Some(license) = &self.project_license {
            config.project.license = Some(license.clone());
        }
        if let Some(fail_on) = self.fail_on {
            config.fail_on = fail_on;
        }
    }
}
