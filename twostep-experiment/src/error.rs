use std::path::PathBuf;
use thiserror::Error;
use twostep_core::GeneratorError;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse generator parameters in {path}: {source}")]
    Params {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid generator: {0}")]
    Generator(#[from] GeneratorError),
}
