//! Error type shared by every stage of the listing pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal pipeline failures. Nothing in the crate retries; every variant
/// propagates to the run driver.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The store configuration is malformed, or a column mapping points past
    /// the columns a feed actually has.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A catalog, feed or artifact file is not in the expected tabular shape.
    #[error("input format error in {}: {reason}", path.display())]
    InputFormat { path: PathBuf, reason: String },

    /// A stage was started before the artifact it consumes was produced.
    #[error("stage '{stage}' requires missing upstream artifact {}", path.display())]
    MissingUpstreamArtifact { stage: String, path: PathBuf },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to parse store configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

impl PipelineError {
    pub(crate) fn input_format(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PipelineError::InputFormat {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
