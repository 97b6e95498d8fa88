//! Inception-Score-style quality/diversity metric for generated MNIST digits.
//!
//! Images are standardised with the MNIST statistics, classified in
//! mini-batches by a pretrained CPU digit classifier loaded from safetensors,
//! and the resulting class probabilities are scored split by split.
//!
//! ```no_run
//! use digit_score::{score, ImageDirLoader};
//!
//! let images = ImageDirLoader::new("mnist_png/test", None)?.load_batch(Some(500))?;
//! let result = score(&images, "classifier.safetensors", 32, 10)?;
//! println!("{}", result);
//! # Ok::<(), digit_score::ScoreError>(())
//! ```

pub mod compute;
pub mod dataloader;
pub mod error;
pub mod model;
pub mod score;
pub mod tensor;

pub use compute::classifier::Classifier;
pub use dataloader::{config::DataLoaderConfig, image_batch::ImageBatch, image_dir::ImageDirLoader};
pub use error::ScoreError;
pub use model::{model::ModelDesc, params::ModelParams};
pub use score::{
    config::{ScoreConfig, DEFAULT_BATCH_SIZE, DEFAULT_NUM_SPLITS},
    inception::{score_probabilities, split_scores, ClassProbabilities, ScoreResult},
    scorer::{score, InceptionScorer, MNIST_MEAN, MNIST_STD},
};
