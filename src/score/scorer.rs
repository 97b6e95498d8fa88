use std::path::Path;

use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::slice::ParallelSlice;
use tracing::{debug, info};

use crate::{
    compute::classifier::Classifier,
    dataloader::image_batch::ImageBatch,
    error::ScoreError,
    model::model::{IMAGE_CHANNELS, IMAGE_HEIGHT, IMAGE_WIDTH},
    tensor::{tensor::Tensor, tensor_desc::TensorDesc},
};

use super::{
    config::ScoreConfig,
    inception::{self, ClassProbabilities, ScoreResult},
};

// Statistics the classifier was trained under
pub const MNIST_MEAN: f32 = 0.1307;
pub const MNIST_STD: f32 = 0.3081;

/// Scores image batches against a loaded classifier.
///
/// Holds no state between calls apart from the classifier and a worker pool,
/// so repeated calls on the same input return identical results.
pub struct InceptionScorer {
    classifier: Classifier,
    config: ScoreConfig,
    pool: rayon::ThreadPool,
}

impl InceptionScorer {
    pub fn new(classifier: Classifier, config: ScoreConfig) -> Result<Self, ScoreError> {
        let config = config.build()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()?;

        Ok(Self {
            classifier,
            config,
            pool,
        })
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Number of images out of `n` that contribute to the score.
    pub fn scored_count(&self, n: usize) -> usize {
        inception::scored_count(n, self.config.num_splits)
    }

    pub fn score_images(&self, images: &ImageBatch) -> Result<ScoreResult, ScoreError> {
        let probs = self.class_probabilities(images)?;
        let result = inception::score_probabilities(&probs, self.config.num_splits)?;
        info!(
            "Inception score over {} of {} images in {} splits: {}",
            self.scored_count(images.len()),
            images.len(),
            self.config.num_splits,
            result
        );
        Ok(result)
    }

    /// Softmax outputs for every image, in input order.
    pub fn class_probabilities(&self, images: &ImageBatch) -> Result<Vec<ClassProbabilities>, ScoreError> {
        validate_images(images, self.classifier.desc().input_shape, &self.config)?;

        let chunk_len = self.config.batch_size * images.image_len();
        let batches = self.pool.install(|| {
            images
                .as_slice()
                .par_chunks(chunk_len)
                .enumerate()
                .map(|(batch_number, raw)| self.infer_batch(batch_number, raw, images.image_shape()))
                .collect::<Result<Vec<_>, ScoreError>>()
        })?;

        Ok(batches.into_iter().flatten().collect())
    }

    fn infer_batch(
        &self,
        batch_number: usize,
        raw: &[f32],
        (channels, height, width): (usize, usize, usize),
    ) -> Result<Vec<ClassProbabilities>, ScoreError> {
        let count = raw.len() / (channels * height * width);
        let desc = TensorDesc::new_tensor4d(count, channels, height, width);
        let input = Tensor::new(desc, normalize(raw))?;

        let probs = self.classifier.predict_proba(&input)?;
        debug!("Classified batch {} ({} images)", batch_number, count);

        Ok(probs
            .data
            .chunks_exact(self.classifier.num_classes())
            .map(<[f32]>::to_vec)
            .collect())
    }
}

/// Scores `images` against the classifier weights stored at `classifier_path`.
///
/// Inputs are validated before the weights are read.
pub fn score(
    images: &ImageBatch,
    classifier_path: impl AsRef<Path>,
    batch_size: usize,
    num_splits: usize,
) -> Result<ScoreResult, ScoreError> {
    let config = ScoreConfig {
        batch_size,
        num_splits,
        ..Default::default()
    }
    .build()?;
    validate_images(images, (IMAGE_CHANNELS, IMAGE_HEIGHT, IMAGE_WIDTH), &config)?;

    let classifier = Classifier::load(classifier_path)?;
    InceptionScorer::new(classifier, config)?.score_images(images)
}

/// Copy of `raw` standardised with the MNIST statistics.
pub fn normalize(raw: &[f32]) -> Vec<f32> {
    raw.iter().map(|x| (x - MNIST_MEAN) / MNIST_STD).collect()
}

fn validate_images(
    images: &ImageBatch,
    expected_shape: (usize, usize, usize),
    config: &ScoreConfig,
) -> Result<(), ScoreError> {
    if images.image_shape() != expected_shape {
        return Err(ScoreError::InvalidInput(format!(
            "Expected images of shape {:?}, got {:?}",
            expected_shape,
            images.image_shape()
        )));
    }
    if images.len() <= config.batch_size {
        return Err(ScoreError::InvalidInput(format!(
            "Need more images ({}) than batch_size ({})",
            images.len(),
            config.batch_size
        )));
    }
    if config.num_splits > images.len() {
        return Err(ScoreError::InvalidInput(format!(
            "num_splits ({}) exceeds the number of images ({})",
            config.num_splits,
            images.len()
        )));
    }
    Ok(())
}
