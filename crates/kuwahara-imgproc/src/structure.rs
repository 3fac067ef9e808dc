use kuwahara_image::{Image, ImageError};

use crate::parallel;

/// Tensors with a trace at or below this are treated as isotropic.
pub const ISOTROPIC_TRACE: f32 = f32::EPSILON;

fn check_same_size<const C1: usize, const C2: usize>(
    src: &Image<f32, C1>,
    dst: &Image<f32, C2>,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }
    Ok(())
}

/// Estimate the per pixel structure tensor of a color image.
///
/// The x and y derivatives of the color channels are taken with a 3x3 Sobel operator scaled
/// by `1/4`, clamping at the borders. The output holds `(E, G, F, 1)` where `E = gx.gx`,
/// `G = gy.gy` and `F = gx.gy`, the dot products running over the color channels.
///
/// # Arguments
///
/// * `src` - The source RGBA image; the alpha channel is ignored.
/// * `dst` - The destination tensor image.
pub fn structure_tensor(src: &Image<f32, 4>, dst: &mut Image<f32, 4>) -> Result<(), ImageError> {
    check_same_size(src, dst)?;

    parallel::par_iter_pixels(dst, |row, col, out| {
        let (r, c) = (row as isize, col as isize);
        let px = |dr: isize, dc: isize| src.pixel_clamped(r + dr, c + dc);

        let mut gx = [0.0f32; 3];
        let mut gy = [0.0f32; 3];
        for ch in 0..3 {
            // paired differences, exactly zero on flat input
            gx[ch] = ((px(-1, 1)[ch] - px(-1, -1)[ch])
                + 2.0 * (px(0, 1)[ch] - px(0, -1)[ch])
                + (px(1, 1)[ch] - px(1, -1)[ch]))
                / 4.0;
            gy[ch] = ((px(1, -1)[ch] - px(-1, -1)[ch])
                + 2.0 * (px(1, 0)[ch] - px(-1, 0)[ch])
                + (px(1, 1)[ch] - px(-1, 1)[ch]))
                / 4.0;
        }

        let dot = |a: &[f32; 3], b: &[f32; 3]| a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
        out[0] = dot(&gx, &gx);
        out[1] = dot(&gy, &gy);
        out[2] = dot(&gx, &gy);
        out[3] = 1.0;
    });

    Ok(())
}

/// Encode a (smoothed) structure tensor into the tensor field that steers the filter.
///
/// The output holds `(t.x, t.y, phi, A)`:
/// - `t` is the unit eigenvector of the minor eigenvalue, i.e. the direction along the local
///   edge. Isotropic pixels get `(0, 1)`.
/// - `phi` is the angle of `t`.
/// - `A = (l1 - l2) / (l1 + l2)` is the anisotropy in `[0, 1]`, zero when the trace is at most
///   [`ISOTROPIC_TRACE`].
///
/// # Arguments
///
/// * `src` - The tensor image with `(E, G, F, _)` per pixel.
/// * `dst` - The destination tensor field.
pub fn tensor_field(src: &Image<f32, 4>, dst: &mut Image<f32, 4>) -> Result<(), ImageError> {
    check_same_size(src, dst)?;

    parallel::par_iter_pixels(dst, |row, col, out| {
        let g = src.pixel_clamped(row as isize, col as isize);
        let (e, gg, f) = (g[0], g[1], g[2]);

        let trace = e + gg;
        if trace <= ISOTROPIC_TRACE {
            out.copy_from_slice(&[0.0, 1.0, std::f32::consts::FRAC_PI_2, 0.0]);
            return;
        }

        // angle of the major eigenvector (the gradient), the edge runs perpendicular to it
        let theta = 0.5 * (2.0 * f).atan2(e - gg);
        let (t_x, t_y) = (-theta.sin(), theta.cos());

        let root = (e - gg).hypot(2.0 * f);
        let anisotropy = (root / trace).clamp(0.0, 1.0);

        out[0] = t_x;
        out[1] = t_y;
        out[2] = t_y.atan2(t_x);
        out[3] = anisotropy;
    });

    Ok(())
}
