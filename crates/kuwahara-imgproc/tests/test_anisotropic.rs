use kuwahara_image::{Image, ImageError, ImageSize};
use kuwahara_imgproc::{
    filter::{gaussian_blur, kernels::KernelSet},
    kuwahara::{anisotropic_kuwahara, SectorFilterParams, SectorWeights},
    structure::{structure_tensor, tensor_field},
};

fn vertical_edge(size: ImageSize) -> Result<Image<f32, 4>, ImageError> {
    Image::from_fn(size, |_, col| {
        let v = if col < size.width / 2 { 0.0 } else { 1.0 };
        [v, v, v, 1.0]
    })
}

fn steer(src: &Image<f32, 4>, sigma_t: f32) -> Result<Image<f32, 4>, ImageError> {
    let mut sst = Image::from_size_val(src.size(), 0.0)?;
    let mut smoothed = sst.clone();
    let mut tfm = sst.clone();
    structure_tensor(src, &mut sst)?;
    gaussian_blur(&sst, &mut smoothed, sigma_t)?;
    tensor_field(&smoothed, &mut tfm)?;
    Ok(tfm)
}

#[test]
fn test_edge_orientation_follows_edge() -> Result<(), ImageError> {
    let src = vertical_edge([16, 12].into())?;
    let tfm = steer(&src, 2.0)?;

    // next to the edge the field runs along the columns with full anisotropy
    let px = tfm
        .pixel(6, 7)
        .ok_or(ImageError::PixelIndexOutOfBounds(7, 6, 16, 12))?;
    assert!(px[0].abs() < 1e-6);
    assert!((px[1] - 1.0).abs() < 1e-6);
    assert!((px[3] - 1.0).abs() < 1e-6);

    // far from it the tensor vanishes and the field is isotropic
    let px = tfm
        .pixel(6, 0)
        .ok_or(ImageError::PixelIndexOutOfBounds(0, 6, 16, 12))?;
    assert_eq!(px[3], 0.0);
    Ok(())
}

#[test]
fn test_anisotropic_filter_keeps_edge_sharp() -> Result<(), Box<dyn std::error::Error>> {
    let size = ImageSize {
        width: 16,
        height: 12,
    };
    let src = vertical_edge(size)?;
    let tfm = steer(&src, 2.0)?;
    let kernels = KernelSet::new(8, 32, 0.5)?;
    let params = SectorFilterParams {
        radius: 3.0,
        q: 8.0,
        alpha: 1.0,
    };

    let mut dst = Image::from_size_val(size, 0.0)?;
    anisotropic_kuwahara(
        &src,
        &tfm,
        SectorWeights::Packed {
            kernels: kernels.packed(),
            channels: kernels.packed_channels(),
        },
        8,
        &params,
        &mut dst,
    )?;

    for row in 0..size.height {
        for col in 0..size.width {
            let v = dst.get([row, col, 0]).copied().unwrap_or(-1.0);
            let expected = if col < size.width / 2 { 0.0 } else { 1.0 };
            if col == 7 || col == 8 {
                // the only columns whose ellipse straddles the edge
                assert!((-1e-4..=1.0 + 1e-4).contains(&v), "({row}, {col}): {v}");
            } else {
                assert!((v - expected).abs() < 1e-4, "({row}, {col}): {v}");
            }
            assert_eq!(dst.get([row, col, 3]).copied(), Some(1.0));
        }
    }
    Ok(())
}
