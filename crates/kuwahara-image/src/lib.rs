#![deny(missing_docs)]
//! Image types used across the kuwahara stylization pipeline

/// image representation for filtering purposes.
pub mod image;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
