use kuwahara_image::{Image, ImageError, ImageSize};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Seed used by the pipeline so that the noise, and the LIC built from it, is reproducible.
pub const DEFAULT_NOISE_SEED: u64 = 1;

/// Generate a locally correlated noise field.
///
/// Every sample starts as `0.5 + 2 * (u - 0.5)` with `u` uniform in `[0, 1)` drawn from a
/// generator seeded with `seed`. The field is then low-passed once along the rows and once
/// along the columns with a `[1, 2, 1] / 4` tap, using `[3, 1] / 4` and `[1, 3] / 4` at the
/// first and last sample. Each pass runs in place, left to right (top to bottom), so a sample
/// sees the already smoothed value of its predecessor.
///
/// # Arguments
///
/// * `size` - The size of the field, usually the size of the source image.
/// * `seed` - The seed of the random generator.
///
/// # Example
///
/// ```
/// use kuwahara_imgproc::noise::{noise_field, DEFAULT_NOISE_SEED};
///
/// let a = noise_field([16, 8].into(), DEFAULT_NOISE_SEED).unwrap();
/// let b = noise_field([16, 8].into(), DEFAULT_NOISE_SEED).unwrap();
///
/// assert_eq!(a, b);
/// ```
pub fn noise_field(size: ImageSize, seed: u64) -> Result<Image<f32, 1>, ImageError> {
    if size.width == 0 || size.height == 0 {
        return Err(ImageError::EmptyImage(size.width, size.height));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..size.area())
        .map(|_| 0.5 + 2.0 * (rng.random::<f32>() - 0.5))
        .collect::<Vec<_>>();
    let mut noise = Image::new(size, data)?;

    let (w, h) = (size.width, size.height);
    let values = noise.as_slice_mut();
    for row in 0..h {
        smooth_strided(values, row * w, 1, w);
    }
    for col in 0..w {
        smooth_strided(values, col, w, h);
    }

    Ok(noise)
}

// one in place pass of the 3-tap low pass over `len` samples spaced by `stride`
fn smooth_strided(values: &mut [f32], start: usize, stride: usize, len: usize) {
    if len < 2 {
        return;
    }
    let at = |i: usize| start + i * stride;

    values[at(0)] = (3.0 * values[at(0)] + values[at(1)]) / 4.0;
    for i in 1..len - 1 {
        values[at(i)] = (values[at(i - 1)] + 2.0 * values[at(i)] + values[at(i + 1)]) / 4.0;
    }
    values[at(len - 1)] = (values[at(len - 2)] + 3.0 * values[at(len - 1)]) / 4.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_noise_is_deterministic() -> Result<(), ImageError> {
        let a = noise_field([33, 17].into(), DEFAULT_NOISE_SEED)?;
        let b = noise_field([33, 17].into(), DEFAULT_NOISE_SEED)?;
        assert_eq!(a.as_slice(), b.as_slice());

        let c = noise_field([33, 17].into(), 7)?;
        assert_ne!(a.as_slice(), c.as_slice());
        Ok(())
    }

    #[test]
    fn test_noise_range() -> Result<(), ImageError> {
        let noise = noise_field([64, 64].into(), DEFAULT_NOISE_SEED)?;
        assert!(noise.as_slice().iter().all(|v| (-0.5..1.5).contains(v)));
        let mean = noise.as_slice().iter().sum::<f32>() / noise.as_slice().len() as f32;
        assert_relative_eq!(mean, 0.5, epsilon = 0.05);
        Ok(())
    }

    #[test]
    fn test_smooth_strided_boundaries() {
        let mut values = vec![4.0, 0.0, 0.0, 8.0];
        smooth_strided(&mut values, 0, 1, 4);
        // first: (3 * 4 + 0) / 4, then each tap sees the updated predecessor
        assert_eq!(values[0], 3.0);
        assert_eq!(values[1], 0.75);
        assert_eq!(values[2], 2.1875);
        assert_eq!(values[3], (2.1875 + 24.0) / 4.0);
    }

    #[test]
    fn test_smooth_strided_column() {
        // 2x3 image, smoothing the second column
        let mut values = vec![0.0, 4.0, 0.0, 0.0, 0.0, 0.0];
        smooth_strided(&mut values, 1, 3, 2);
        assert_eq!(values, vec![0.0, 3.0, 0.0, 0.0, 0.75, 0.0]);
    }

    #[test]
    fn test_noise_degenerate_sizes() -> Result<(), ImageError> {
        let row = noise_field([5, 1].into(), DEFAULT_NOISE_SEED)?;
        assert_eq!(row.size(), [5, 1].into());
        assert_eq!(
            noise_field([0, 3].into(), DEFAULT_NOISE_SEED),
            Err(ImageError::EmptyImage(0, 3))
        );
        Ok(())
    }
}
