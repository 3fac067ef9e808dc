#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// pixel format conversions between storage and working types.
pub mod color;

/// orientation visualization via colormaps.
pub mod colormap;

/// image filtering module.
pub mod filter;

/// image flipping module.
pub mod flip;

/// utilities for texture style sampling.
pub mod interpolation;

/// the Kuwahara filter family.
pub mod kuwahara;

/// line integral convolution.
pub mod lic;

/// deterministic noise generation.
pub mod noise;

/// module containing parallization utilities.
pub mod parallel;

/// structure tensor and tensor field estimation.
pub mod structure;
