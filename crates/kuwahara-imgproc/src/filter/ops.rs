use kuwahara_image::{Image, ImageError};

use crate::parallel;

/// Half width of the sampling window used by [`gaussian_blur`] for a given sigma.
pub fn gaussian_half_width(sigma: f32) -> usize {
    (2.0 * sigma).ceil() as usize
}

fn check_sigma(sigma: f32) -> Result<(), ImageError> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(ImageError::InvalidParameter("sigma", sigma));
    }
    Ok(())
}

/// Blur an image with a brute force 2D gaussian window.
///
/// Every output sample is the weighted mean of the input samples inside a square window of
/// half width `ceil(2 * sigma)`, weighted by `exp(-r^2 / (2 * sigma^2))` where `r` is the
/// distance to the window center. Window cells that fall outside the image are dropped from
/// both the sum and the normalizer, so flat regions keep their value up to the border.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `sigma` - The standard deviation of the gaussian. Zero copies the input.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
///
/// # Example
///
/// ```
/// use kuwahara_image::Image;
/// use kuwahara_imgproc::filter::gaussian_blur;
///
/// let src = Image::<f32, 1>::from_size_val([5, 5].into(), 0.25).unwrap();
/// let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0).unwrap();
///
/// gaussian_blur(&src, &mut dst, 1.5).unwrap();
///
/// assert!(dst.as_slice().iter().all(|&v| (v - 0.25).abs() < 1e-6));
/// ```
pub fn gaussian_blur<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    sigma: f32,
) -> Result<(), ImageError> {
    check_sigma(sigma)?;

    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }

    let half = gaussian_half_width(sigma);
    if half == 0 {
        dst.as_slice_mut().copy_from_slice(src.as_slice());
        return Ok(());
    }

    // weights of the (2 * half + 1)^2 window, row-major
    let side = 2 * half + 1;
    let two_sigma2 = 2.0 * sigma * sigma;
    let weights = (0..side * side)
        .map(|idx| {
            let dy = (idx / side) as f32 - half as f32;
            let dx = (idx % side) as f32 - half as f32;
            (-(dx * dx + dy * dy) / two_sigma2).exp()
        })
        .collect::<Vec<_>>();

    let (rows, cols) = (src.rows(), src.cols());
    let src_data = src.as_slice();

    parallel::par_iter_pixels(dst, |row, col, pixel| {
        let r0 = row.saturating_sub(half);
        let r1 = (row + half).min(rows - 1);
        let c0 = col.saturating_sub(half);
        let c1 = (col + half).min(cols - 1);

        let mut sum = [0.0f32; C];
        let mut norm = 0.0f32;
        for r in r0..=r1 {
            let w_row = (r + half - row) * side;
            for c in c0..=c1 {
                let w = weights[w_row + c + half - col];
                let base = (r * cols + c) * C;
                for (acc, v) in sum.iter_mut().zip(&src_data[base..base + C]) {
                    *acc += w * v;
                }
                norm += w;
            }
        }

        for (p, acc) in pixel.iter_mut().zip(sum) {
            *p = acc / norm;
        }
    });

    Ok(())
}

/// Blur an image in place with [`gaussian_blur`].
///
/// The input is copied first so that unprocessed cells are never read after being written.
pub fn gaussian_blur_inplace<const C: usize>(
    image: &mut Image<f32, C>,
    sigma: f32,
) -> Result<(), ImageError> {
    let src = image.clone();
    gaussian_blur(&src, image, sigma)
}
