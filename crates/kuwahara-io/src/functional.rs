use std::path::Path;

use kuwahara_image::{Image, ImageSize};

use crate::error::IoError;

/// Reads an image from the given file path as 8-bit RGB.
///
/// The format is guessed from the file contents and may be anything the image crate decodes.
/// Grayscale, alpha and 16-bit inputs are converted to rgb8; alpha is dropped.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// A RGB image with three channels (rgb8).
pub fn read_image_any_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let file_path = file_path.as_ref();

    // verify the file exists
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let img = image::ImageReader::open(file_path)?
        .with_guessed_format()?
        .decode()?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    Ok(Image::new(size, img.into_rgb8().into_raw())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::png::{write_image_png_gray8, write_image_png_rgb8};

    #[test]
    fn read_any_png_rgb8() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("image.png");

        let image = Image::<u8, 3>::from_fn([5, 4].into(), |r, c| [r as u8, c as u8, 200])?;
        write_image_png_rgb8(&file_path, &image)?;

        let image_back = read_image_any_rgb8(&file_path)?;
        assert_eq!(image_back, image);
        Ok(())
    }

    #[test]
    fn read_any_expands_gray() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        // the format is detected from the contents, not the extension
        let file_path = tmp_dir.path().join("image.bin");

        let image = Image::<u8, 1>::from_fn([3, 2].into(), |r, c| [(r * 3 + c) as u8 * 40])?;
        write_image_png_gray8(&file_path, &image)?;

        let image_back = read_image_any_rgb8(&file_path)?;
        assert_eq!(image_back.size(), image.size());
        for (rgb, gray) in image_back.as_slice().chunks_exact(3).zip(image.as_slice()) {
            assert_eq!(rgb, &[*gray; 3]);
        }
        Ok(())
    }

    #[test]
    fn read_any_missing_file() {
        let res = read_image_any_rgb8("/definitely/not/here.png");
        assert!(matches!(res, Err(IoError::FileDoesNotExist(_))));
    }
}
