use kuwahara_image::ImageError;
use kuwahara_imgproc::{filter::kernels::KernelError, parallel::ParallelError};

use crate::buffer::{BufferKind, BufferRole};

/// Errors raised by a compute backend.
#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    /// The backend could not be initialized.
    #[error("failed to initialize the compute backend. {0}")]
    Init(#[from] ParallelError),

    /// The buffer was never uploaded nor written.
    #[error("buffer {0} is not allocated")]
    MissingBuffer(BufferRole),

    /// A buffer of the wrong kind was stored in, or requested from, a role.
    #[error("buffer {role} holds {expected} data, got {found}")]
    KindMismatch {
        /// The role of the buffer.
        role: BufferRole,
        /// The kind declared by the role.
        expected: BufferKind,
        /// The kind that was provided or requested.
        found: BufferKind,
    },

    /// A dispatch did not bind a slot the stage reads.
    #[error("stage {stage} requires slot {slot}")]
    MissingSlot {
        /// The stage name.
        stage: &'static str,
        /// The slot name.
        slot: &'static str,
    },

    /// A dispatch bound a slot the stage does not know, or bound it twice.
    #[error("stage {stage} does not accept slot {slot}")]
    UnknownSlot {
        /// The stage name.
        stage: &'static str,
        /// The slot name.
        slot: String,
    },

    /// The buffer was written by a dispatch that has not been synchronized yet.
    #[error("buffer {0} has pending writes, synchronize first")]
    NotSynchronized(BufferRole),

    /// A stage failed to execute.
    #[error("stage {stage} failed. {source}")]
    Stage {
        /// The stage name.
        stage: &'static str,
        /// The underlying error.
        #[source]
        source: ImageError,
    },
}

/// Errors raised while validating or loading the pipeline parameters.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A parameter is outside its valid range.
    #[error("parameter {name} = {value} is outside {range}")]
    OutOfRange {
        /// The parameter name.
        name: &'static str,
        /// The offending value.
        value: f64,
        /// The valid range.
        range: &'static str,
    },

    /// The filter variant name is not known.
    #[error("unknown filter variant: {0}")]
    UnknownVariant(String),

    /// The configuration file could not be read.
    #[error("failed to read the configuration file. {0}")]
    FileError(#[from] std::io::Error),

    /// The configuration file could not be parsed.
    #[error("failed to parse the configuration. {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Errors raised by the pipeline orchestrator.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Invalid parameters.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backend failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The sector kernels could not be built.
    #[error(transparent)]
    Kernel(#[from] KernelError),

    /// An image operation failed.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// A dispatch reads a buffer whose writer has not completed.
    #[error("stage {stage} reads {role} before it is ready")]
    DependencyNotReady {
        /// The stage name.
        stage: &'static str,
        /// The buffer that is not ready.
        role: BufferRole,
    },

    /// A dispatch reads the buffer it writes.
    #[error("stage {stage} reads and writes {role}")]
    ReadWriteConflict {
        /// The stage name.
        stage: &'static str,
        /// The buffer read and written.
        role: BufferRole,
    },

    /// The buffer has not been produced in the current run.
    #[error("buffer {0} has not been computed")]
    NotComputed(BufferRole),
}
