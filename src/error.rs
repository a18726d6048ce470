use std::path::PathBuf;

use thiserror::Error;

/// Error surfaced by the `rev` binary.
///
/// Exit codes follow a small convention:
/// - `2`: bad input (missing file, malformed JSON/CSV, unwritable output)
/// - `4`: computation failed (e.g. model training could not solve)
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// A comparable-sales source could not produce candidates.
///
/// Provider errors never abort a comps run; the chain logs them and moves on.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to open comps file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read comps file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("comps provider unavailable: {0}")]
    Unavailable(String),
}

/// The market prediction artifact could not be used.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model artifact not found at '{0}'")]
    Missing(PathBuf),

    #[error("failed to read model artifact '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// Training the linear market model failed.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("failed to read training CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("training CSV is missing column '{0}'")]
    MissingColumn(String),

    #[error("not enough rows to fit {features} features (got {rows})")]
    TooFewRows { rows: usize, features: usize },

    #[error("least squares solve failed for target '{0}'")]
    Solve(String),
}

impl From<TrainError> for AppError {
    fn from(value: TrainError) -> Self {
        let code = match value {
            TrainError::Solve(_) => 4,
            _ => 2,
        };
        AppError::new(code, value.to_string())
    }
}
