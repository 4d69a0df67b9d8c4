use std::{error, fmt};

/// Error type for fitting.
///
/// We have to define a specific type because the generic dyn Error is not Sync, so it can't be used
/// with Rayon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FitError {
    /// The training set has no rows.
    EmptyDataset,
    /// The number of targets doesn't match the number of feature rows.
    DimensionMismatch { expected: usize, got: usize },
    /// A hyper-parameter is outside its allowed range.
    InvalidParameter(String),
    /// The input data can't be used (parse failure, NaN, ...).
    InvalidData(String),
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FitError::EmptyDataset => f.write_str("the training set is empty"),
            FitError::DimensionMismatch { expected, got } => write!(
                f,
                "dimension mismatch: expected {} rows, got {}",
                expected, got
            ),
            FitError::InvalidParameter(msg) => write!(f, "invalid parameter: {}", msg),
            FitError::InvalidData(msg) => write!(f, "invalid data: {}", msg),
        }
    }
}

impl error::Error for FitError {}

impl std::convert::From<std::num::ParseFloatError> for FitError {
    fn from(e: std::num::ParseFloatError) -> Self {
        FitError::InvalidData(e.to_string())
    }
}

pub type FitResult<T> = Result<T, FitError>;

pub(crate) static SHOULD_NOT_HAPPEN: &str =
    "There is an unexpected error in cartboost. Please raise a bug.";
