use thiserror::Error;

use ferrocast_core::{PipelineError, SettingsError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ferrocast_core::ValidationError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Settings(_) => 2,
            Self::Pipeline(error) => match error {
                PipelineError::Validation(_) => 2,
                PipelineError::DataUnavailable { .. } => 3,
                PipelineError::InsufficientData { .. } => 4,
                PipelineError::SchemaMismatch(_) => 5,
                PipelineError::Model(_) | PipelineError::StageOrder { .. } => 10,
            },
            Self::Serialization(_) | Self::Io(_) => 10,
        }
    }

    /// Stable machine-readable code written to JSON error envelopes.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Pipeline(error) => error.code(),
            Self::Validation(_) => "cli.validation",
            Self::Settings(_) => "cli.settings",
            Self::Serialization(_) => "cli.serialization",
            Self::Io(_) => "cli.io",
        }
    }
}
