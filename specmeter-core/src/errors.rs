use thiserror::Error;

/// Errors produced by the DSP core. All of these indicate a programmer
/// error in buffer sizing, not a transient condition: nothing is retried
/// internally, and a failed call leaves no partial results.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DspError {
    #[error("transform size {0} is not a positive power of two")]
    InvalidSize(usize),
    #[error("buffer of {actual} samples does not match configured size {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("sample block is empty")]
    EmptyInput,
}

pub type Result<T> = core::result::Result<T, DspError>;
