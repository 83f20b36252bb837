use assembly_formats::{DocumentError, UploadError};
use thiserror::Error;

/// User-input problems; the triggering action is aborted with no state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("step name must not be empty")]
    EmptyStepName,
    #[error("select at least one part for the step")]
    EmptyPartSelection,
    #[error("step index {index} is out of range for {len} steps")]
    StepIndexOutOfRange { index: usize, len: usize },
    #[error("{0}")]
    Upload(#[from] UploadError),
}

/// Failures surfaced by the engine's boundary handlers.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("could not read instructions: {0}")]
    Parse(#[from] DocumentError),
    #[error("{0}")]
    Resource(String),
}

impl AssemblyError {
    pub fn resource(message: impl Into<String>) -> Self {
        AssemblyError::Resource(message.into())
    }
}

impl From<UploadError> for AssemblyError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::UnsupportedExtension(_) => {
                AssemblyError::Validation(ValidationError::Upload(err))
            }
            UploadError::MissingModel | UploadError::Extraction(_) => {
                AssemblyError::Resource(err.to_string())
            }
        }
    }
}

pub type AssemblyResult<T> = std::result::Result<T, AssemblyError>;
