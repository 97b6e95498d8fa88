use thiserror::Error;

use crate::dataloader::error::DataLoaderError;

#[derive(Error, Debug)]
pub enum ScoreError {
    // Caller-correctable, never retried
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Missing, corrupt or mis-shaped classifier weights
    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(String),

    #[error("Data loader error: {0}")]
    DataLoader(#[from] DataLoaderError),
}

impl ScoreError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ScoreError::InvalidInput(_))
    }

    pub fn is_model_load(&self) -> bool {
        matches!(self, ScoreError::ModelLoad(_))
    }
}

impl From<safetensors::SafeTensorError> for ScoreError {
    fn from(err: safetensors::SafeTensorError) -> Self {
        ScoreError::ModelLoad(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for ScoreError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        ScoreError::ThreadPool(err.to_string())
    }
}
