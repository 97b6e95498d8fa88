use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ScoreError;
use crate::model::model::{IMAGE_CHANNELS, IMAGE_HEIGHT, IMAGE_WIDTH};

use super::config::DataLoaderConfig;
use super::error::DataLoaderError;
use super::image_batch::ImageBatch;

/// Reads a flat directory of digit images into [`ImageBatch`]es.
///
/// Images are converted to 8-bit luma and scaled to `[0, 1]`; every image
/// must be 28×28.
pub struct ImageDirLoader {
    dir: PathBuf,
    dataset: Vec<Box<str>>,
    dataset_indices: Vec<usize>,
    valid_extensions: HashSet<String>,
    config: DataLoaderConfig,
}

impl ImageDirLoader {
    pub fn new(dir: impl AsRef<Path>, config: Option<DataLoaderConfig>) -> Result<Self, DataLoaderError> {
        let path = dir.as_ref();
        if !path.is_dir() {
            return Err(DataLoaderError::DirectoryNotFound(path.display().to_string()));
        }

        let valid_extensions = image::ImageFormat::all()
            .flat_map(|format| format.extensions_str())
            .map(|ext| ext.to_string())
            .collect();

        let mut loader = ImageDirLoader {
            dir: path.to_owned(),
            dataset: Vec::new(),
            dataset_indices: Vec::new(),
            valid_extensions,
            config: config.unwrap_or_default(),
        };

        loader.load_dataset()?;

        info!("Found {} images in {:?}", loader.len(), loader.dir);
        Ok(loader)
    }

    fn load_dataset(&mut self) -> Result<(), DataLoaderError> {
        self.dataset = std::fs::read_dir(&self.dir)?
            .filter_map(Result::ok)
            .filter(|entry| self.is_valid_extension(&entry.path()))
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|s| s.to_owned().into_boxed_str())
            })
            .collect();

        if self.dataset.is_empty() {
            return Err(DataLoaderError::EmptyDataset);
        }

        // read_dir order depends on the filesystem
        if self.config.sort_dataset {
            self.dataset.sort_unstable();
        }

        self.dataset_indices = (0..self.dataset.len()).collect();

        if self.config.shuffle {
            let seed = *self
                .config
                .shuffle_seed
                .get_or_insert_with(|| rand::thread_rng().gen());
            debug!("Shuffling dataset with seed {}", seed);
            self.dataset_indices.shuffle(&mut StdRng::seed_from_u64(seed));
        }

        Ok(())
    }

    fn is_valid_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.valid_extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Seed used for shuffling, generated on construction when not configured.
    pub fn shuffle_seed(&self) -> Option<u64> {
        self.config.shuffle_seed
    }

    /// Image paths in load order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.dataset_indices
            .iter()
            .map(|&idx| self.dir.join(&*self.dataset[idx]))
            .collect()
    }

    /// Decodes the first `limit` images (all of them when `None`) in parallel.
    pub fn load_batch(&self, limit: Option<usize>) -> Result<ImageBatch, ScoreError> {
        let count = limit.map_or(self.len(), |limit| limit.min(self.len()));
        let paths: Vec<PathBuf> = self.paths().into_iter().take(count).collect();
        let image_len = IMAGE_CHANNELS * IMAGE_HEIGHT * IMAGE_WIDTH;

        let mut pixels = vec![0.0f32; count * image_len];
        pixels
            .par_chunks_exact_mut(image_len)
            .zip(paths.par_iter())
            .try_for_each(|(chunk, path)| Self::path_to_buffer_copy(path, chunk))?;

        debug!("Decoded {} images from {:?}", count, self.dir);
        ImageBatch::new(pixels, &[count, IMAGE_CHANNELS, IMAGE_HEIGHT, IMAGE_WIDTH])
    }

    fn path_to_buffer_copy(path: &Path, slice: &mut [f32]) -> Result<(), DataLoaderError> {
        let img = image::open(path)?.to_luma8();
        let (width, height) = img.dimensions();
        if width as usize != IMAGE_WIDTH || height as usize != IMAGE_HEIGHT {
            return Err(DataLoaderError::UnexpectedImageSize {
                path: path.display().to_string(),
                width,
                height,
                expected_width: IMAGE_WIDTH as u32,
                expected_height: IMAGE_HEIGHT as u32,
            });
        }

        for (dst, src) in slice.iter_mut().zip(img.as_raw()) {
            *dst = *src as f32 / 255.0;
        }
        Ok(())
    }
}
