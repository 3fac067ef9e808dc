//! The Kuwahara filter family.
//!
//! All filters work on normalized RGBA images, use the RGB channels for the statistics and
//! write an opaque alpha. Source reads clamp to the image edge.

use std::f32::consts::PI;

use kuwahara_image::{Image, ImageError};

use crate::{filter::kernels::MAX_PACKED_CHANNELS, interpolation::bilinear_zero_border, parallel};

/// Parameters of the anisotropic and generalized Kuwahara filters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectorFilterParams {
    /// Sampling radius in pixels.
    pub radius: f32,
    /// Sharpness of the sector weighting, larger values favor the flattest sector.
    pub q: f32,
    /// Controls how much the filter shape follows the anisotropy, must be >= 1.
    pub alpha: f32,
}

impl Default for SectorFilterParams {
    fn default() -> Self {
        Self {
            radius: 10.0,
            q: 8.0,
            alpha: 1.0,
        }
    }
}

/// Where the per sector weights come from.
#[derive(Clone, Copy, Debug)]
pub enum SectorWeights<'a> {
    /// One kernel, rotated for every sector.
    Single(&'a Image<f32, 1>),
    /// Up to [`MAX_PACKED_CHANNELS`] kernels packed as channels, sampled in one lookup and
    /// rotated as a group for the remaining sectors.
    Packed {
        /// The packed kernel image.
        kernels: &'a Image<f32, MAX_PACKED_CHANNELS>,
        /// The number of meaningful channels.
        channels: usize,
    },
}

impl SectorWeights<'_> {
    fn kernel_is_empty(&self) -> bool {
        match self {
            SectorWeights::Single(k) => k.cols() == 0 || k.rows() == 0,
            SectorWeights::Packed { kernels, channels } => {
                kernels.cols() == 0 || kernels.rows() == 0 || *channels == 0
            }
        }
    }
}

// running weighted statistics of one sector
#[derive(Clone, Copy, Default)]
struct SectorStats {
    sum: [f32; 3],
    sum_sq: [f32; 3],
    weight: f32,
}

impl SectorStats {
    fn add(&mut self, c: &[f32], w: f32) {
        for ch in 0..3 {
            self.sum[ch] += c[ch] * w;
            self.sum_sq[ch] += c[ch] * c[ch] * w;
        }
        self.weight += w;
    }
}

// blend the sector means, favoring low variance sectors
fn combine_sectors(stats: &[SectorStats], q: f32, fallback: &[f32], out: &mut [f32]) {
    let mut acc = [0.0f32; 3];
    let mut total = 0.0f32;
    for s in stats.iter().filter(|s| s.weight > 0.0) {
        let mut sigma2 = 0.0;
        let mut mean = [0.0f32; 3];
        for ch in 0..3 {
            mean[ch] = s.sum[ch] / s.weight;
            sigma2 += (s.sum_sq[ch] / s.weight - mean[ch] * mean[ch]).abs();
        }
        let w = 1.0 / (1.0 + (255.0 * sigma2).powf(0.5 * q));
        for ch in 0..3 {
            acc[ch] += mean[ch] * w;
        }
        total += w;
    }

    if total > 0.0 {
        for ch in 0..3 {
            out[ch] = acc[ch] / total;
        }
    } else {
        out[..3].copy_from_slice(&fallback[..3]);
    }
    out[3] = 1.0;
}

fn rotate(v: [f32; 2], (cos, sin): (f32, f32)) -> [f32; 2] {
    [v[0] * cos - v[1] * sin, v[0] * sin + v[1] * cos]
}

// accumulate one sample with normalized kernel offset `v` into the sector statistics
fn accumulate(
    weights: &SectorWeights,
    rotations: &[(f32, f32)],
    v: [f32; 2],
    c: &[f32],
    stats: &mut [SectorStats],
) {
    let n = stats.len();
    match weights {
        SectorWeights::Single(kernel) => {
            for (k, rot) in rotations.iter().enumerate() {
                let r = rotate(v, *rot);
                let w = bilinear_zero_border(kernel, 0.5 + r[0], 0.5 + r[1])[0];
                stats[k].add(c, w);
            }
        }
        SectorWeights::Packed { kernels, channels } => {
            for (group, rot) in rotations.iter().enumerate() {
                let r = rotate(v, *rot);
                let texel = bilinear_zero_border(kernels, 0.5 + r[0], 0.5 + r[1]);
                for (ch, w) in texel.iter().take(*channels).enumerate() {
                    let k = group * channels + ch;
                    if k < n {
                        stats[k].add(c, *w);
                    }
                }
            }
        }
    }
}

// rotations that map the offsets of every sector (or group of packed sectors) onto kernel 0
fn sector_rotations(weights: &SectorWeights, sectors: usize) -> Vec<(f32, f32)> {
    let (count, step) = match weights {
        SectorWeights::Single(_) => (sectors, 1),
        SectorWeights::Packed { channels, .. } => (sectors.div_ceil(*channels), *channels),
    };
    (0..count)
        .map(|g| {
            let angle = 2.0 * PI * (g * step) as f32 / sectors as f32;
            (angle.cos(), angle.sin())
        })
        .collect()
}

fn check_sizes(src: &Image<f32, 4>, others: &[&Image<f32, 4>]) -> Result<(), ImageError> {
    for other in others {
        if other.size() != src.size() {
            return Err(ImageError::InvalidImageSize(
                src.width(),
                src.height(),
                other.width(),
                other.height(),
            ));
        }
    }
    Ok(())
}

fn check_params(params: &SectorFilterParams, sectors: usize) -> Result<(), ImageError> {
    if sectors == 0 {
        return Err(ImageError::InvalidParameter("sectors", 0.0));
    }
    if !(params.radius.is_finite() && params.radius > 0.0) {
        return Err(ImageError::InvalidParameter("radius", params.radius));
    }
    if !(params.q.is_finite() && params.q > 0.0) {
        return Err(ImageError::InvalidParameter("q", params.q));
    }
    if !(params.alpha.is_finite() && params.alpha > 0.0) {
        return Err(ImageError::InvalidParameter("alpha", params.alpha));
    }
    Ok(())
}

/// Anisotropic Kuwahara filter steered by a tensor field.
///
/// Around each pixel an ellipse with axes `a = radius * clamp((alpha + A) / alpha, 0.1, 2)`
/// along the local edge direction and `b = radius * clamp(alpha / (alpha + A), 0.1, 2)`
/// across it is mapped onto the unit disk of the sector kernels. Every sample inside the
/// ellipse adds its color to the weighted mean and variance of each sector. The output is the
/// mean of the sector means weighted by `1 / (1 + (255 * sigma^2)^(q / 2))`.
///
/// # Arguments
///
/// * `src` - The source RGBA image.
/// * `tfm` - The tensor field with `(t.x, t.y, phi, A)` per pixel.
/// * `weights` - The sector kernels.
/// * `sectors` - The number of sectors.
/// * `params` - The filter parameters.
/// * `dst` - The destination RGBA image.
pub fn anisotropic_kuwahara(
    src: &Image<f32, 4>,
    tfm: &Image<f32, 4>,
    weights: SectorWeights,
    sectors: usize,
    params: &SectorFilterParams,
    dst: &mut Image<f32, 4>,
) -> Result<(), ImageError> {
    check_sizes(src, &[tfm, dst])?;
    check_params(params, sectors)?;
    if weights.kernel_is_empty() {
        return Err(ImageError::EmptyImage(0, 0));
    }

    let rotations = sector_rotations(&weights, sectors);
    let SectorFilterParams { radius, q, alpha } = *params;

    parallel::par_iter_rows(dst, |row, out_row| {
        let mut stats = vec![SectorStats::default(); sectors];
        for (col, out) in out_row.chunks_exact_mut(4).enumerate() {
            stats.fill(SectorStats::default());
            let (r, c) = (row as isize, col as isize);

            let t = tfm.pixel_clamped(r, c);
            let anisotropy = t[3];
            let a = radius * ((alpha + anisotropy) / alpha).clamp(0.1, 2.0);
            let b = radius * (alpha / (alpha + anisotropy)).clamp(0.1, 2.0);
            let (sin_phi, cos_phi) = t[2].sin_cos();

            let max_x = (a * a * cos_phi * cos_phi + b * b * sin_phi * sin_phi).sqrt() as isize;
            let max_y = (a * a * sin_phi * sin_phi + b * b * cos_phi * cos_phi).sqrt() as isize;

            for j in -max_y..=max_y {
                for i in -max_x..=max_x {
                    let (x, y) = (i as f32, j as f32);
                    // project onto the ellipse axes and scale to the unit kernel disk
                    let v = [
                        0.5 * (cos_phi * x + sin_phi * y) / a,
                        0.5 * (-sin_phi * x + cos_phi * y) / b,
                    ];
                    if v[0] * v[0] + v[1] * v[1] <= 0.25 {
                        let color = src.pixel_clamped(r + j, c + i);
                        accumulate(&weights, &rotations, v, color, &mut stats);
                    }
                }
            }

            combine_sectors(&stats, q, src.pixel_clamped(r, c), out);
        }
    });

    Ok(())
}

/// Generalized (isotropic) Kuwahara filter with smooth sector kernels.
///
/// The disk of `radius` pixels around each pixel is split into `sectors` sectors weighted by
/// the rotated `kernel`; the sector statistics are blended as in [`anisotropic_kuwahara`].
pub fn generalized_kuwahara(
    src: &Image<f32, 4>,
    kernel: &Image<f32, 1>,
    sectors: usize,
    params: &SectorFilterParams,
    dst: &mut Image<f32, 4>,
) -> Result<(), ImageError> {
    check_sizes(src, &[dst])?;
    check_params(params, sectors)?;

    let weights = SectorWeights::Single(kernel);
    if weights.kernel_is_empty() {
        return Err(ImageError::EmptyImage(kernel.cols(), kernel.rows()));
    }
    let rotations = sector_rotations(&weights, sectors);
    let radius = params.radius.floor().max(1.0);
    let extent = radius as isize;

    parallel::par_iter_rows(dst, |row, out_row| {
        let mut stats = vec![SectorStats::default(); sectors];
        for (col, out) in out_row.chunks_exact_mut(4).enumerate() {
            stats.fill(SectorStats::default());
            let (r, c) = (row as isize, col as isize);
            for j in -extent..=extent {
                for i in -extent..=extent {
                    let v = [0.5 * i as f32 / radius, 0.5 * j as f32 / radius];
                    if v[0] * v[0] + v[1] * v[1] <= 0.25 {
                        let color = src.pixel_clamped(r + j, c + i);
                        accumulate(&weights, &rotations, v, color, &mut stats);
                    }
                }
            }
            combine_sectors(&stats, params.q, src.pixel_clamped(r, c), out);
        }
    });

    Ok(())
}

/// Classic Kuwahara filter over four square quadrants.
///
/// Each output pixel takes the mean of the `(radius + 1)^2` quadrant, among the four that
/// share the pixel as a corner, with the lowest summed RGB variance.
pub fn kuwahara(
    src: &Image<f32, 4>,
    radius: usize,
    dst: &mut Image<f32, 4>,
) -> Result<(), ImageError> {
    check_sizes(src, &[dst])?;
    if radius == 0 {
        return Err(ImageError::InvalidParameter("radius", 0.0));
    }

    let r = radius as isize;
    // (row range, col range) of the quadrants, relative to the pixel
    let quadrants = [((-r, 0), (-r, 0)), ((-r, 0), (0, r)), ((0, r), (0, r)), ((0, r), (-r, 0))];

    parallel::par_iter_pixels(dst, |row, col, out| {
        let (pr, pc) = (row as isize, col as isize);
        let mut best = (f32::INFINITY, [0.0f32; 3]);
        for ((j0, j1), (i0, i1)) in quadrants {
            let mut stats = SectorStats::default();
            for j in j0..=j1 {
                for i in i0..=i1 {
                    stats.add(src.pixel_clamped(pr + j, pc + i), 1.0);
                }
            }
            let mut sigma2 = 0.0;
            let mut mean = [0.0f32; 3];
            for ch in 0..3 {
                mean[ch] = stats.sum[ch] / stats.weight;
                sigma2 += (stats.sum_sq[ch] / stats.weight - mean[ch] * mean[ch]).abs();
            }
            if sigma2 < best.0 {
                best = (sigma2, mean);
            }
        }
        out[..3].copy_from_slice(&best.1);
        out[3] = 1.0;
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::kernels::KernelSet;
    use kuwahara_image::ImageSize;

    fn flat(size: ImageSize, v: f32) -> Result<Image<f32, 4>, ImageError> {
        Image::from_fn(size, |_, _| [v, v, v, 1.0])
    }

    fn isotropic_field(size: ImageSize) -> Result<Image<f32, 4>, ImageError> {
        Image::from_fn(size, |_, _| [0.0, 1.0, PI / 2.0, 0.0])
    }

    fn split(size: ImageSize) -> Result<Image<f32, 4>, ImageError> {
        Image::from_fn(size, |_, col| {
            let v = if col < size.width / 2 { 0.0 } else { 1.0 };
            [v, v, v, 1.0]
        })
    }

    #[test]
    fn test_flat_image_is_preserved() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 6,
            height: 5,
        };
        let src = flat(size, 0.5)?;
        let tfm = isotropic_field(size)?;
        let set = KernelSet::new(8, 32, 0.5)?;
        let params = SectorFilterParams::default();

        let mut single = Image::from_size_val(size, 0.0)?;
        anisotropic_kuwahara(
            &src,
            &tfm,
            SectorWeights::Single(&set.kernels()[0]),
            8,
            &params,
            &mut single,
        )?;

        let mut packed = Image::from_size_val(size, 0.0)?;
        anisotropic_kuwahara(
            &src,
            &tfm,
            SectorWeights::Packed {
                kernels: set.packed(),
                channels: set.packed_channels(),
            },
            8,
            &params,
            &mut packed,
        )?;

        for img in [&single, &packed] {
            for px in img.as_slice().chunks_exact(4) {
                for ch in 0..3 {
                    assert!((px[ch] - 0.5).abs() < 1e-4, "{px:?}");
                }
                assert_eq!(px[3], 1.0);
            }
        }
        Ok(())
    }

    #[test]
    fn test_packed_groups_match_single() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 10,
            height: 9,
        };
        let src = Image::from_fn(size, |r, c| {
            let v = ((r * 5 + c * 3) % 7) as f32 / 7.0;
            [v, 1.0 - v, 0.5, 1.0]
        })?;
        let tfm = Image::from_fn(size, |_, _| [0.6, 0.8, 0.2, 0.4])?;
        let set = KernelSet::new(8, 32, 0.5)?;
        let k0 = &set.kernels()[0];
        // one kernel per group rotates exactly like the single kernel path
        let packed = Image::from_fn(k0.size(), |r, c| {
            [k0.as_slice()[r * k0.cols() + c], 0.0, 0.0, 0.0]
        })?;
        let params = SectorFilterParams {
            radius: 3.0,
            ..Default::default()
        };

        let mut single_dst = Image::from_size_val(size, 0.0)?;
        let mut packed_dst = Image::from_size_val(size, 0.0)?;
        anisotropic_kuwahara(&src, &tfm, SectorWeights::Single(k0), 8, &params, &mut single_dst)?;
        anisotropic_kuwahara(
            &src,
            &tfm,
            SectorWeights::Packed {
                kernels: &packed,
                channels: 1,
            },
            8,
            &params,
            &mut packed_dst,
        )?;

        for (a, b) in single_dst.as_slice().iter().zip(packed_dst.as_slice()) {
            assert!((a - b).abs() < 1e-5, "{a} vs {b}");
        }
        Ok(())
    }

    #[test]
    fn test_anisotropic_keeps_edges() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 16,
            height: 8,
        };
        let src = split(size)?;
        let tfm = isotropic_field(size)?;
        let set = KernelSet::new(8, 32, 0.5)?;
        let params = SectorFilterParams {
            radius: 3.0,
            ..Default::default()
        };
        let mut dst = Image::from_size_val(size, 0.0)?;
        anisotropic_kuwahara(
            &src,
            &tfm,
            SectorWeights::Packed {
                kernels: set.packed(),
                channels: set.packed_channels(),
            },
            8,
            &params,
            &mut dst,
        )?;

        // next to the edge the flat side wins over the mixed sectors
        for row in 0..size.height {
            let left = dst.get([row, 5, 0]).copied().unwrap_or(-1.0);
            let right = dst.get([row, 10, 0]).copied().unwrap_or(-1.0);
            assert!(left < 0.1, "{left}");
            assert!(right > 0.9, "{right}");
        }
        Ok(())
    }

    #[test]
    fn test_generalized_flat_and_edge() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 12,
            height: 6,
        };
        let set = KernelSet::new(8, 32, 0.33)?;
        let params = SectorFilterParams {
            radius: 3.0,
            ..Default::default()
        };

        let src = flat(size, 0.25)?;
        let mut dst = Image::from_size_val(size, 0.0)?;
        generalized_kuwahara(&src, &set.kernels()[0], 8, &params, &mut dst)?;
        assert!(dst.as_slice().chunks_exact(4).all(|px| (px[0] - 0.25).abs() < 1e-4));

        let src = split(size)?;
        generalized_kuwahara(&src, &set.kernels()[0], 8, &params, &mut dst)?;
        assert!(dst.get([3, 0, 0]).is_some_and(|v| *v < 1e-4));
        assert!(dst.get([3, 11, 0]).is_some_and(|v| *v > 1.0 - 1e-4));
        Ok(())
    }

    #[test]
    fn test_classic_kuwahara_edge() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 8,
            height: 4,
        };
        let src = split(size)?;
        let mut dst = Image::from_size_val(size, 0.0)?;
        kuwahara(&src, 2, &mut dst)?;
        // quadrants fully on one side have zero variance, so the edge stays crisp
        assert_eq!(dst, src);
        Ok(())
    }

    #[test]
    fn test_invalid_params() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 4,
            height: 4,
        };
        let src = flat(size, 0.5)?;
        let tfm = isotropic_field(size)?;
        let set = KernelSet::new(4, 16, 0.5)?;
        let mut dst = Image::from_size_val(size, 0.0)?;
        let params = SectorFilterParams {
            radius: 0.0,
            ..Default::default()
        };
        let res = anisotropic_kuwahara(
            &src,
            &tfm,
            SectorWeights::Single(&set.kernels()[0]),
            4,
            &params,
            &mut dst,
        );
        assert_eq!(res, Err(ImageError::InvalidParameter("radius", 0.0)));
        assert!(kuwahara(&src, 0, &mut dst).is_err());
        Ok(())
    }
}
