//! Error types for the compatibility engine.
//!
//! Irregular input (unknown licenses, missing rules, nodes that cannot be
//! located) never produces an error; only broken call contracts and config
//! loading failures do.

use std::path::PathBuf;

use thiserror::Error;

pub type CompatResult<T> = Result<T, CompatError>;

#[derive(Error, Debug)]
pub enum CompatError {
    /// The tree handed to a scan has no root package name.
    #[error("dependency tree root has no name")]
    UnnamedRoot,

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A custom license id in the config is not a valid SPDX-style identifier.
    #[error("invalid license identifier '{0}' in config")]
    InvalidLicenseId(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
