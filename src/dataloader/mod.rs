pub mod config;
pub mod error;
pub mod image_batch;
pub mod image_dir;
