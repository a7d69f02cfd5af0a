//! Error taxonomy of a pipeline run

use crate::loader::LoaderError;
use crate::store::StoreError;

#[derive(Debug)]
pub enum PipelineError {
    /// Input file rejected before any insert
    Loader(LoaderError),

    /// Record store failure; the failed batch was rolled back
    Store(StoreError),

    /// One or more validation checks failed while strict mode was on
    Validation { failed_checks: Vec<String> },

    /// A stage exceeded its deadline
    StageTimeout {
        stage: &'static str,
        deadline_secs: u64,
    },
}

impl From<LoaderError> for PipelineError {
    fn from(err: LoaderError) -> Self {
        PipelineError::Loader(err)
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        PipelineError::Store(err)
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Loader(e) => write!(f, "Load failed: {}", e),
            PipelineError::Store(e) => write!(f, "Store failed: {}", e),
            PipelineError::Validation { failed_checks } => write!(
                f,
                "Validation failed in strict mode: {}",
                failed_checks.join(", ")
            ),
            PipelineError::StageTimeout {
                stage,
                deadline_secs,
            } => write!(
                f,
                "Stage '{}' exceeded its {}s deadline",
                stage, deadline_secs
            ),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Loader(e) => Some(e),
            PipelineError::Store(e) => Some(e),
            _ => None,
        }
    }
}
