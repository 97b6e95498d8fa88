use crate::error::ScoreError;

pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const DEFAULT_NUM_SPLITS: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreConfig {
    // Images per classifier forward pass
    pub batch_size: usize,
    pub num_splits: usize,
    // Worker threads for mini-batch inference
    pub threads: usize,
}

impl ScoreConfig {
    pub fn build(self) -> Result<Self, ScoreError> {
        if self.batch_size == 0 {
            return Err(ScoreError::InvalidInput("batch_size must be greater than 0".into()));
        }
        if self.num_splits == 0 {
            return Err(ScoreError::InvalidInput("num_splits must be at least 1".into()));
        }
        if self.threads == 0 {
            return Err(ScoreError::InvalidInput("threads must be at least 1".into()));
        }
        Ok(self)
    }
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            num_splits: DEFAULT_NUM_SPLITS,
            threads: num_cpus::get(),
        }
    }
}
