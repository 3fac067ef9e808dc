//! Filter operations
//!
//! This module provides the brute force gaussian blur and the steerable sector kernels built
//! on top of it.

/// Filter kernels
pub mod kernels;

/// Filter operations
mod ops;
pub use ops::*;
