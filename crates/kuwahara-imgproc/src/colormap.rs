use kuwahara_image::{Image, ImageError};

use crate::parallel;

/// Number of entries of the colormap used to visualize anisotropy.
pub const DEFAULT_COLORMAP_LEN: usize = 256;

/// The classic jet colormap evaluated at `v` in `[0, 1]`.
pub fn jet(v: f32) -> [f32; 3] {
    let v = v.clamp(0.0, 1.0);
    let channel = |center: f32| (1.5 - (4.0 * v - center).abs()).clamp(0.0, 1.0);
    [channel(3.0), channel(2.0), channel(1.0)]
}

/// Build a `len x 1` RGBA lookup image of the jet colormap, blue to red.
///
/// # Example
///
/// ```
/// use kuwahara_imgproc::colormap::jet_colormap;
///
/// let lut = jet_colormap(256).unwrap();
///
/// assert_eq!(lut.width(), 256);
/// assert_eq!(lut.height(), 1);
/// ```
pub fn jet_colormap(len: usize) -> Result<Image<f32, 4>, ImageError> {
    if len == 0 {
        return Err(ImageError::EmptyImage(len, 1));
    }
    let denom = (len - 1).max(1) as f32;
    Image::from_fn([len, 1].into(), |_, col| {
        let [r, g, b] = jet(col as f32 / denom);
        [r, g, b, 1.0]
    })
}

/// Linear lookup into a `len x 1` colormap at `v` in `[0, 1]`.
fn lookup(lut: &Image<f32, 4>, v: f32) -> [f32; 4] {
    let len = lut.cols();
    let x = (v * len as f32 - 0.5).clamp(0.0, (len - 1) as f32);
    let i0 = x.floor() as usize;
    let i1 = (i0 + 1).min(len - 1);
    let f = x - i0 as f32;

    let mut out = [0.0; 4];
    if let (Some(a), Some(b)) = (lut.pixel(0, i0), lut.pixel(0, i1)) {
        for ch in 0..4 {
            out[ch] = a[ch] * (1.0 - f) + b[ch] * f;
        }
    }
    out
}

/// Colorize the anisotropy of a tensor field through a colormap.
///
/// # Arguments
///
/// * `tfm` - The tensor field with `(t.x, t.y, phi, A)` per pixel.
/// * `lut` - A `len x 1` RGBA colormap.
/// * `dst` - The destination RGBA image.
pub fn colorize_anisotropy(
    tfm: &Image<f32, 4>,
    lut: &Image<f32, 4>,
    dst: &mut Image<f32, 4>,
) -> Result<(), ImageError> {
    if tfm.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            tfm.width(),
            tfm.height(),
            dst.width(),
            dst.height(),
        ));
    }
    if lut.cols() == 0 || lut.rows() == 0 {
        return Err(ImageError::EmptyImage(lut.cols(), lut.rows()));
    }

    parallel::par_iter_pixels(dst, |row, col, out| {
        let a = tfm.pixel_clamped(row as isize, col as isize)[3];
        out.copy_from_slice(&lookup(lut, a));
    });

    Ok(())
}
