#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// The compute backend contract and the CPU implementation.
pub mod backend;

/// Named buffers and their storage.
pub mod buffer;

/// Pipeline parameters and configuration files.
pub mod config;

/// Error types for the pipeline.
pub mod error;

/// The pipeline orchestrator.
pub mod pipeline;

/// The catalogue of stages a backend executes.
pub mod stage;

pub use crate::backend::{ComputeBackend, CpuBackend};
pub use crate::buffer::{Buffer, BufferKind, BufferRole};
pub use crate::config::{FilterVariant, PipelineParams, MIN_KERNEL_SIZE};
pub use crate::error::{BackendError, ConfigError, PipelineError};
pub use crate::pipeline::{BufferState, Pipeline, PipelineContext};
pub use crate::stage::{Dispatch, Stage};
