use kuwahara_image::{Image, ImageError};
use rayon::{iter::IndexedParallelIterator, iter::ParallelIterator, slice::ParallelSliceMut};

/// Flip the input image vertically.
///
/// Used to convert between bottom-up (texture) and top-down (file) row order.
///
/// # Arguments
///
/// * `src` - The input image with shape (H, W, C).
///
/// # Returns
///
/// The flipped image.
///
/// # Example
///
/// ```
/// use kuwahara_image::{Image, ImageSize};
/// use kuwahara_imgproc::flip::vertical_flip;
///
/// let image = Image::<u8, 1>::new(
///     ImageSize {
///         width: 2,
///         height: 3,
///     },
///     vec![0, 1, 2, 3, 4, 5],
/// )
/// .unwrap();
///
/// let flipped = vertical_flip(&image).unwrap();
///
/// assert_eq!(flipped.as_slice(), &[4, 5, 2, 3, 0, 1]);
/// ```
pub fn vertical_flip<T, const C: usize>(src: &Image<T, C>) -> Result<Image<T, C>, ImageError>
where
    T: Clone + Send + Sync,
{
    let mut dst = src.clone();
    let stride = src.cols() * C;
    if stride == 0 {
        return Ok(dst);
    }

    let rows = src.rows();
    let src_data = src.as_slice();
    dst.as_slice_mut()
        .par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(row, dst_row)| {
            let src_row = rows - 1 - row;
            dst_row.clone_from_slice(&src_data[src_row * stride..(src_row + 1) * stride]);
        });

    Ok(dst)
}
