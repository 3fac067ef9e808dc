use kuwahara_image::{Image, ImageError, ImageSize};
use thiserror::Error;

use super::gaussian_blur;

/// Maximum number of kernels packed into the multi-channel kernel image.
pub const MAX_PACKED_CHANNELS: usize = 4;

/// Edge size in pixels of the kernels used by the pipeline.
pub const DEFAULT_KERNEL_SIZE: usize = 32;

/// Errors raised while building sector kernels.
#[derive(Error, Debug, PartialEq)]
pub enum KernelError {
    /// The number of sectors must be at least one.
    #[error("sector count must be > 0, got {0}")]
    InvalidSectorCount(usize),

    /// The sector index must be smaller than the sector count.
    #[error("sector index {0} is out of bounds for {1} sectors")]
    InvalidSector(usize, usize),

    /// The kernel edge must be even and non-zero.
    #[error("kernel size must be even and > 0, got {0}")]
    InvalidKernelSize(usize),

    /// The wedge of a sector did not contain any pixel.
    #[error("sector {0} has no support at this kernel size")]
    EmptySector(usize),

    /// Error from the underlying image operations.
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Index of the angular sector that contains the offset `(x, y)`.
///
/// Sector `k` of `n` holds the offsets whose wrapped angle `0.5 * atan2(y, x) / PI + k / n`
/// falls in `[-0.5 / n, 0.5 / n)`. Every offset belongs to exactly one sector, so the
/// sectors tile the plane around the origin.
///
/// # Example
///
/// ```
/// use kuwahara_imgproc::filter::kernels::sector_index;
///
/// assert_eq!(sector_index(1.0, 0.1, 4), 0);
/// // a quarter turn counter clockwise lands in sector 3 of 4
/// assert_eq!(sector_index(0.1, 1.0, 4), 3);
/// ```
pub fn sector_index(x: f32, y: f32, n: usize) -> usize {
    let turn = 0.5 * y.atan2(x) / std::f32::consts::PI;
    let k = (-turn * n as f32 - 0.5).ceil() as i64;
    k.rem_euclid(n as i64) as usize
}

/// Offset of the kernel pixel `(row, col)` from the kernel center, xy-ordered.
fn kernel_offset(row: usize, col: usize, size: usize) -> (f32, f32) {
    let half = 0.5 * size as f32;
    (col as f32 - half + 0.5, row as f32 - half + 0.5)
}

/// Binary mask of one sector, clipped to the disk inscribed in the kernel.
///
/// # Arguments
///
/// * `k` - The sector index.
/// * `n` - The number of sectors.
/// * `size` - The kernel edge size in pixels.
pub fn sector_mask(k: usize, n: usize, size: usize) -> Result<Image<f32, 1>, KernelError> {
    if n == 0 {
        return Err(KernelError::InvalidSectorCount(n));
    }
    if k >= n {
        return Err(KernelError::InvalidSector(k, n));
    }
    if size == 0 || size % 2 != 0 {
        return Err(KernelError::InvalidKernelSize(size));
    }

    let radius = 0.5 * size as f32;
    let mask = Image::from_fn([size, size].into(), |row, col| {
        let (x, y) = kernel_offset(row, col, size);
        let inside = x.hypot(y) < radius && sector_index(x, y, n) == k;
        [if inside { 1.0 } else { 0.0 }]
    })?;

    Ok(mask)
}

/// Build the weights of one sector of a steerable sector filter.
///
/// The binary wedge of the sector is softened with a gaussian of `sigma_s`, weighted by a
/// radial gaussian falloff of `sigma_r`, and normalized so that its peak is exactly `1.0`.
///
/// # Arguments
///
/// * `k` - The sector index.
/// * `n` - The number of sectors.
/// * `size` - The kernel edge size in pixels, must be even.
/// * `sigma_r` - The radial falloff sigma.
/// * `sigma_s` - The smoothing sigma of the wedge boundary.
///
/// # Returns
///
/// A `size x size` single channel kernel.
pub fn sector_kernel(
    k: usize,
    n: usize,
    size: usize,
    sigma_r: f32,
    sigma_s: f32,
) -> Result<Image<f32, 1>, KernelError> {
    let mask = sector_mask(k, n, size)?;

    let mut kernel = Image::from_size_val(mask.size(), 0.0)?;
    gaussian_blur(&mask, &mut kernel, sigma_s)?;

    let mut max = 0.0f32;
    for (idx, w) in kernel.as_slice_mut().iter_mut().enumerate() {
        let (x, y) = kernel_offset(idx / size, idx % size, size);
        *w *= (-0.5 * (x * x + y * y) / (sigma_r * sigma_r)).exp();
        max = max.max(*w);
    }

    if max <= 0.0 || !max.is_finite() {
        return Err(KernelError::EmptySector(k));
    }

    kernel.as_slice_mut().iter_mut().for_each(|w| *w /= max);

    Ok(kernel)
}

/// The full steerable basis: one kernel per sector plus the packed multi-channel variant.
///
/// Channel `c` of the packed kernel holds kernel `c`, for the first
/// [`MAX_PACKED_CHANNELS`] sectors. Unused channels are zero.
#[derive(Clone, Debug)]
pub struct KernelSet {
    kernels: Vec<Image<f32, 1>>,
    packed: Image<f32, MAX_PACKED_CHANNELS>,
    packed_channels: usize,
}

impl KernelSet {
    /// Build the kernel set used by the anisotropic filter.
    ///
    /// The radial sigma is derived from the kernel size as `0.25 * (size - 1)` and the
    /// smoothing sigma as `smoothing` times the radial sigma.
    ///
    /// # Example
    ///
    /// ```
    /// use kuwahara_imgproc::filter::kernels::KernelSet;
    ///
    /// let set = KernelSet::new(8, 32, 0.5).unwrap();
    ///
    /// assert_eq!(set.num_sectors(), 8);
    /// assert_eq!(set.packed_channels(), 4);
    /// assert_eq!(set.size().width, 32);
    /// ```
    pub fn new(n: usize, size: usize, smoothing: f32) -> Result<Self, KernelError> {
        let sigma_r = 0.25 * (size as f32 - 1.0);
        Self::with_sigmas(n, size, sigma_r, smoothing * sigma_r)
    }

    /// Build the kernel set from explicit radial and smoothing sigmas.
    pub fn with_sigmas(
        n: usize,
        size: usize,
        sigma_r: f32,
        sigma_s: f32,
    ) -> Result<Self, KernelError> {
        let kernels = (0..n)
            .map(|k| sector_kernel(k, n, size, sigma_r, sigma_s))
            .collect::<Result<Vec<_>, _>>()?;

        if kernels.is_empty() {
            return Err(KernelError::InvalidSectorCount(n));
        }

        let packed_channels = n.min(MAX_PACKED_CHANNELS);
        let packed = Image::from_fn([size, size].into(), |row, col| {
            let mut texel = [0.0; MAX_PACKED_CHANNELS];
            for (ch, kernel) in kernels.iter().take(packed_channels).enumerate() {
                texel[ch] = kernel.as_slice()[row * size + col];
            }
            texel
        })?;

        Ok(Self {
            kernels,
            packed,
            packed_channels,
        })
    }

    /// Number of sectors, i.e. number of kernels.
    pub fn num_sectors(&self) -> usize {
        self.kernels.len()
    }

    /// Size of every kernel.
    pub fn size(&self) -> ImageSize {
        self.packed.size()
    }

    /// The kernel of sector `k`.
    pub fn kernel(&self, k: usize) -> Option<&Image<f32, 1>> {
        self.kernels.get(k)
    }

    /// All the kernels, in sector order.
    pub fn kernels(&self) -> &[Image<f32, 1>] {
        &self.kernels
    }

    /// The packed kernel image.
    pub fn packed(&self) -> &Image<f32, MAX_PACKED_CHANNELS> {
        &self.packed
    }

    /// Number of meaningful channels in the packed kernel image.
    pub fn packed_channels(&self) -> usize {
        self.packed_channels
    }
}
