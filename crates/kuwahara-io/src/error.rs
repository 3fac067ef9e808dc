use std::path::PathBuf;

/// Failures while reading or writing image files.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// The input path does not exist.
    #[error("No such file: {0}")]
    FileDoesNotExist(PathBuf),

    /// Opening, creating or writing the file failed.
    #[error("File access failed. {0}")]
    FileError(#[from] std::io::Error),

    /// The decoded samples do not form a valid image.
    #[error("Invalid decoded image. {0}")]
    ImageCreationError(#[from] kuwahara_image::ImageError),

    /// The generic decoder rejected the file.
    #[error("Could not decode the image. {0}")]
    ImageDecodeError(#[from] image::ImageError),

    /// The png encoder failed.
    #[error("Could not encode the png. {0}")]
    PngEncodingError(String),
}
