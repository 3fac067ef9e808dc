use std::fmt;

use kuwahara_image::{Image, ImageError, ImageSize};
use kuwahara_imgproc::flip::vertical_flip;

use crate::error::BackendError;

/// The element layout of a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    /// One `f32` per pixel.
    Scalar,
    /// Four `f32` per pixel.
    Rgba,
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferKind::Scalar => write!(f, "scalar"),
            BufferKind::Rgba => write!(f, "rgba"),
        }
    }
}

/// The named buffers threaded between the pipeline stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferRole {
    /// The input image.
    Source,
    /// The filtered output.
    Destination,
    /// Raw structure tensor, first scratch buffer.
    StructureTensor,
    /// Smoothed structure tensor, second scratch buffer.
    SmoothedTensor,
    /// The tensor field `(t.x, t.y, phi, A)`.
    TensorField,
    /// The correlated noise field.
    Noise,
    /// Line integral convolution of the noise along the tensor field.
    Lic,
    /// The anisotropy mapped through the colormap.
    Colorized,
    /// The colormap lookup table.
    ColorMap,
    /// Sector kernel 0.
    Kernel,
    /// The first sector kernels packed as channels.
    PackedKernel,
}

impl BufferRole {
    /// Number of roles.
    pub const COUNT: usize = 11;

    /// Every role, in declaration order.
    pub const ALL: [BufferRole; Self::COUNT] = [
        BufferRole::Source,
        BufferRole::Destination,
        BufferRole::StructureTensor,
        BufferRole::SmoothedTensor,
        BufferRole::TensorField,
        BufferRole::Noise,
        BufferRole::Lic,
        BufferRole::Colorized,
        BufferRole::ColorMap,
        BufferRole::Kernel,
        BufferRole::PackedKernel,
    ];

    /// Position of the role in [`BufferRole::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// The kind of data the role holds.
    pub fn kind(self) -> BufferKind {
        match self {
            BufferRole::Noise | BufferRole::Lic | BufferRole::Kernel => BufferKind::Scalar,
            _ => BufferKind::Rgba,
        }
    }

    /// A short name for logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            BufferRole::Source => "source",
            BufferRole::Destination => "destination",
            BufferRole::StructureTensor => "structure-tensor",
            BufferRole::SmoothedTensor => "smoothed-tensor",
            BufferRole::TensorField => "tensor-field",
            BufferRole::Noise => "noise",
            BufferRole::Lic => "lic",
            BufferRole::Colorized => "colorized",
            BufferRole::ColorMap => "colormap",
            BufferRole::Kernel => "kernel",
            BufferRole::PackedKernel => "packed-kernel",
        }
    }
}

impl fmt::Display for BufferRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A 2D buffer of normalized floats.
#[derive(Clone, Debug, PartialEq)]
pub enum Buffer {
    /// One channel per pixel.
    Scalar(Image<f32, 1>),
    /// Four channels per pixel.
    Rgba(Image<f32, 4>),
}

impl Buffer {
    /// The kind of the buffer.
    pub fn kind(&self) -> BufferKind {
        match self {
            Buffer::Scalar(_) => BufferKind::Scalar,
            Buffer::Rgba(_) => BufferKind::Rgba,
        }
    }

    /// The size of the buffer in pixels.
    pub fn size(&self) -> ImageSize {
        match self {
            Buffer::Scalar(img) => img.size(),
            Buffer::Rgba(img) => img.size(),
        }
    }

    /// The buffer with its rows in reverse order.
    pub fn flipped(&self) -> Result<Self, ImageError> {
        Ok(match self {
            Buffer::Scalar(img) => Buffer::Scalar(vertical_flip(img)?),
            Buffer::Rgba(img) => Buffer::Rgba(vertical_flip(img)?),
        })
    }
}

impl From<Image<f32, 1>> for Buffer {
    fn from(image: Image<f32, 1>) -> Self {
        Buffer::Scalar(image)
    }
}

impl From<Image<f32, 4>> for Buffer {
    fn from(image: Image<f32, 4>) -> Self {
        Buffer::Rgba(image)
    }
}

/// Storage of one optional buffer per role.
#[derive(Debug)]
pub struct BufferSet {
    slots: [Option<Buffer>; BufferRole::COUNT],
}

impl Default for BufferSet {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferSet {
    /// An empty set.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Store a buffer, returning the previous one.
    ///
    /// # Errors
    ///
    /// Fails when the kind of the buffer differs from the kind of the role.
    pub fn insert(
        &mut self,
        role: BufferRole,
        buffer: Buffer,
    ) -> Result<Option<Buffer>, BackendError> {
        if buffer.kind() != role.kind() {
            return Err(BackendError::KindMismatch {
                role,
                expected: role.kind(),
                found: buffer.kind(),
            });
        }
        Ok(self.slots[role.index()].replace(buffer))
    }

    /// Whether the role holds a buffer.
    pub fn contains(&self, role: BufferRole) -> bool {
        self.slots[role.index()].is_some()
    }

    /// The buffer of a role.
    pub fn get(&self, role: BufferRole) -> Result<&Buffer, BackendError> {
        self.slots[role.index()]
            .as_ref()
            .ok_or(BackendError::MissingBuffer(role))
    }

    /// The scalar image of a role.
    pub fn scalar(&self, role: BufferRole) -> Result<&Image<f32, 1>, BackendError> {
        match self.get(role)? {
            Buffer::Scalar(img) => Ok(img),
            Buffer::Rgba(_) => Err(BackendError::KindMismatch {
                role,
                expected: BufferKind::Rgba,
                found: BufferKind::Scalar,
            }),
        }
    }

    /// The RGBA image of a role.
    pub fn rgba(&self, role: BufferRole) -> Result<&Image<f32, 4>, BackendError> {
        match self.get(role)? {
            Buffer::Rgba(img) => Ok(img),
            Buffer::Scalar(_) => Err(BackendError::KindMismatch {
                role,
                expected: BufferKind::Scalar,
                found: BufferKind::Rgba,
            }),
        }
    }

    /// Drop every buffer.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }
}
