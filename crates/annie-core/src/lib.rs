pub mod app_config;
pub mod config;
pub mod corrections;
pub mod sales;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use corrections::{load_corrections, CorrectionRule, CorrectionTable};
pub use sales::{UnitMetric, UnitsBundle};

use thiserror::Error;

/// Errors raised while building configuration, before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read corrections file {path}: {source}")]
    CorrectionsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse corrections file: {0}")]
    CorrectionsFileParse(#[from] serde_yaml::Error),

    #[error("corrections validation error: {0}")]
    Validation(String),
}
