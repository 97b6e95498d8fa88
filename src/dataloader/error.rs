use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataLoaderError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("No images found in the dataset")]
    EmptyDataset,

    #[error("Image {path} is {width}x{height}, expected {expected_width}x{expected_height}")]
    UnexpectedImageSize {
        path: String,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
}
