use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The crate's result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort a training run.
///
/// Apart from `Io`/`Json` (which only ever come out of persistence and
/// dataset reading), every variant is a configuration error: retrying the
/// same deterministic computation cannot make it go away.
#[derive(Debug, Error)]
pub enum Error {
    /// A tensor did not have the shape its consumer requires.
    #[error("shape mismatch for {what}: got {got:?}, expected {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        got: (usize, usize),
        expected: (usize, usize),
    },

    /// The gradient set and the parameter set have different lengths.
    #[error("parameter count mismatch: got {got} gradients for {expected} parameters")]
    ParameterCount { got: usize, expected: usize },

    /// A batch was built from inputs and labels of different lengths.
    #[error("batch has {inputs} inputs but {labels} labels")]
    BatchLength { inputs: usize, labels: usize },

    #[error("label {label} is out of range for {classes} classes")]
    LabelOutOfRange { label: usize, classes: usize },

    #[error("cannot measure accuracy over an empty batch sequence")]
    EmptySequence,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed dataset {}: {message}", path.display())]
    Dataset { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn dataset(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Dataset {
            path: path.into(),
            message: message.into(),
        }
    }
}
