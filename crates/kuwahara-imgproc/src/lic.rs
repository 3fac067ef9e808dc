use kuwahara_image::{Image, ImageError};

use crate::{interpolation::nearest_clamped, parallel};

/// Integration sigma used by the pipeline for the LIC visualization.
pub const DEFAULT_LIC_SIGMA: f32 = 3.0;

// state of one streamline walk, in pixel units
struct Streamline {
    p: [f32; 2],
    t: [f32; 2],
    arc: f32,
}

impl Streamline {
    // move to the next cell boundary crossing along the field, `None` on a null direction
    fn step(&mut self, tfm: &Image<f32, 4>) -> Option<f32> {
        let texel = nearest_clamped(tfm, self.p[0], self.p[1]);
        let mut t = [texel[0], texel[1]];
        if t[0] * self.t[0] + t[1] * self.t[1] < 0.0 {
            t = [-t[0], -t[1]];
        }
        self.t = t;

        let axis = if t[0].abs() > t[1].abs() { 0 } else { 1 };
        if t[axis] == 0.0 {
            return None;
        }
        let frac = self.p[axis] - self.p[axis].floor();
        let dw = ((frac - 0.5 - t[axis].signum()) / t[axis]).abs();

        self.p[0] += t[0] * dw;
        self.p[1] += t[1] * dw;
        self.arc += dw;
        Some(dw)
    }
}

/// Line integral convolution of a scalar field along a tensor field.
///
/// For every pixel, two streamlines are traced from the pixel center along `+t` and `-t` of
/// the tensor field, stepping from cell to cell until an arc length of `2 * sigma`. Samples
/// along the way are accumulated with a gaussian weight of the arc length, so the output
/// shows `src` smeared along the local orientation.
///
/// # Arguments
///
/// * `tfm` - The tensor field with `(t.x, t.y, phi, A)` per pixel.
/// * `src` - The scalar field to convolve, usually noise.
/// * `dst` - The destination scalar image.
/// * `sigma` - The integration sigma in pixels. Zero copies `src`.
pub fn line_integral_convolution(
    tfm: &Image<f32, 4>,
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    sigma: f32,
) -> Result<(), ImageError> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(ImageError::InvalidParameter("sigma", sigma));
    }
    for size in [tfm.size(), dst.size()] {
        if size != src.size() {
            return Err(ImageError::InvalidImageSize(
                src.width(),
                src.height(),
                size.width,
                size.height,
            ));
        }
    }

    let half_width = 2.0 * sigma;
    let two_sigma2 = 2.0 * sigma * sigma;

    parallel::par_iter_pixels(dst, |row, col, out| {
        let center = [col as f32 + 0.5, row as f32 + 0.5];
        let mut c = nearest_clamped(src, center[0], center[1])[0];
        let mut w = 1.0;

        let t0 = nearest_clamped(tfm, center[0], center[1]);
        for sign in [1.0f32, -1.0] {
            let mut s = Streamline {
                p: center,
                t: [sign * t0[0], sign * t0[1]],
                arc: 0.0,
            };
            while s.arc < half_width {
                let Some(dw) = s.step(tfm) else {
                    break;
                };
                let k = dw * (-s.arc * s.arc / two_sigma2).exp();
                c += k * nearest_clamped(src, s.p[0], s.p[1])[0];
                w += k;
            }
        }

        out[0] = c / w;
    });

    Ok(())
}
