use kuwahara_image::{Image, ImageError};

/// Convert an 8-bit RGB image to a normalized RGBA working image with opaque alpha.
///
/// # Example
///
/// ```
/// use kuwahara_image::Image;
/// use kuwahara_imgproc::color::rgb8_to_rgbaf32;
///
/// let rgb = Image::<u8, 3>::new([1, 1].into(), vec![255, 0, 255]).unwrap();
/// let rgba = rgb8_to_rgbaf32(&rgb).unwrap();
///
/// assert_eq!(rgba.as_slice(), &[1.0, 0.0, 1.0, 1.0]);
/// ```
pub fn rgb8_to_rgbaf32(src: &Image<u8, 3>) -> Result<Image<f32, 4>, ImageError> {
    let rgb = src.cast_and_scale::<f32>(1.0 / 255.0)?;
    let data = rgb
        .as_slice()
        .chunks_exact(3)
        .flat_map(|px| [px[0], px[1], px[2], 1.0])
        .collect();
    Image::new(src.size(), data)
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Quantize a normalized RGBA working image to 8-bit RGB, dropping alpha.
///
/// Values are clamped to `[0, 1]` before quantization.
pub fn rgbaf32_to_rgb8(src: &Image<f32, 4>) -> Result<Image<u8, 3>, ImageError> {
    let data = src
        .as_slice()
        .chunks_exact(4)
        .flat_map(|px| [to_u8(px[0]), to_u8(px[1]), to_u8(px[2])])
        .collect();
    Image::new(src.size(), data)
}

/// Quantize a normalized scalar image to 8-bit gray, clamping to `[0, 1]`.
pub fn grayf32_to_gray8(src: &Image<f32, 1>) -> Result<Image<u8, 1>, ImageError> {
    let data = src.as_slice().iter().map(|&v| to_u8(v)).collect();
    Image::new(src.size(), data)
}
