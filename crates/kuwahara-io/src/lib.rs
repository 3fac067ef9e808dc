#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the io module.
pub mod error;

/// High-level read functions for any image format.
pub mod functional;

/// PNG image encoding.
pub mod png;

pub use crate::error::IoError;
