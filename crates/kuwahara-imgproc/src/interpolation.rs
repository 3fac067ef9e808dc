use kuwahara_image::Image;

/// Sample an image at normalized texture coordinates with bilinear filtering.
///
/// `(u, v)` span `[0, 1]` over the whole image, `u` along the columns and `v` along the rows,
/// with texel centers at `(i + 0.5) / width`. Taps that fall outside the image read as zero,
/// like a texture with a black border.
///
/// # Arguments
///
/// * `image` - The image to sample.
/// * `u` - The horizontal texture coordinate.
/// * `v` - The vertical texture coordinate.
///
/// # Returns
///
/// The interpolated pixel values.
pub fn bilinear_zero_border<const C: usize>(image: &Image<f32, C>, u: f32, v: f32) -> [f32; C] {
    let x = u * image.cols() as f32 - 0.5;
    let y = v * image.rows() as f32 - 0.5;

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as isize, y0 as isize);

    let mut pixel = [0.0; C];
    let taps = [
        (y0, x0, (1.0 - fx) * (1.0 - fy)),
        (y0, x0 + 1, fx * (1.0 - fy)),
        (y0 + 1, x0, (1.0 - fx) * fy),
        (y0 + 1, x0 + 1, fx * fy),
    ];
    for (row, col, w) in taps {
        if row < 0 || col < 0 || w == 0.0 {
            continue;
        }
        if let Some(texel) = image.pixel(row as usize, col as usize) {
            for (p, t) in pixel.iter_mut().zip(texel) {
                *p += w * t;
            }
        }
    }

    pixel
}

/// Sample an image at pixel coordinates with nearest filtering, clamping to the edge.
///
/// `(x, y)` are continuous pixel coordinates where pixel `(row, col)` covers
/// `[col, col + 1) x [row, row + 1)`.
pub fn nearest_clamped<const C: usize>(image: &Image<f32, C>, x: f32, y: f32) -> &[f32] {
    image.pixel_clamped(y.floor() as isize, x.floor() as isize)
}
