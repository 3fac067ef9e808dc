use crate::error::ImageError;

/// Width and height of an image, in pixels.
///
/// # Examples
///
/// ```
/// use kuwahara_image::ImageSize;
///
/// let size: ImageSize = [64, 48].into();
///
/// assert_eq!(size.area(), 3072);
/// assert_eq!(size.to_string(), "64x48");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageSize {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl ImageSize {
    /// Number of pixels covered by the size.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from([width, height]: [usize; 2]) -> Self {
        ImageSize { width, height }
    }
}

/// A 2D raster of `CHANNELS` samples per pixel.
///
/// The pixels are stored row-major and interleaved, with shape (H, W, C). All accessors take
/// `[row, col, channel]` indices and are bounds checked.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Wrap interleaved samples of the given size.
    ///
    /// Fails with [`ImageError::InvalidChannelShape`] unless `data` holds exactly
    /// `width * height * CHANNELS` samples.
    ///
    /// # Examples
    ///
    /// ```
    /// use kuwahara_image::Image;
    ///
    /// let image = Image::<u8, 3>::new([2, 1].into(), vec![255, 0, 0, 0, 0, 255]).unwrap();
    ///
    /// assert_eq!(image.pixel(0, 1), Some(&[0, 0, 255][..]));
    /// assert!(Image::<u8, 3>::new([2, 1].into(), vec![0; 5]).is_err());
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        if data.len() != size.area() * CHANNELS {
            return Err(ImageError::InvalidChannelShape(
                data.len(),
                size.area() * CHANNELS,
            ));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with the given size and every sample set to `val`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kuwahara_image::{Image, ImageSize};
    ///
    /// let image = Image::<f32, 4>::from_size_val([4, 2].into(), 0.5).unwrap();
    ///
    /// assert_eq!(image.width(), 4);
    /// assert_eq!(image.height(), 2);
    /// assert_eq!(image.get([1, 3, 2]), Some(&0.5));
    /// ```
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        Image::new(size, vec![val; size.area() * CHANNELS])
    }

    /// Create a new image by evaluating `f(row, col)` for every pixel.
    pub fn from_fn(
        size: ImageSize,
        mut f: impl FnMut(usize, usize) -> [T; CHANNELS],
    ) -> Result<Self, ImageError> {
        let mut data = Vec::with_capacity(size.area() * CHANNELS);
        for row in 0..size.height {
            for col in 0..size.width {
                data.extend(f(row, col));
            }
        }
        Image::new(size, data)
    }

    /// The image size.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Alias of [`Image::width`].
    pub fn cols(&self) -> usize {
        self.size.width
    }

    /// Alias of [`Image::height`].
    pub fn rows(&self) -> usize {
        self.size.height
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// The raw interleaved samples.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The raw interleaved samples, mutable.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    fn offset(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.size.height && col < self.size.width {
            Some((row * self.size.width + col) * CHANNELS)
        } else {
            None
        }
    }

    /// Get a sample at `[row, col, channel]`, or `None` when out of bounds.
    pub fn get(&self, index: [usize; 3]) -> Option<&T> {
        let [row, col, ch] = index;
        if ch >= CHANNELS {
            return None;
        }
        self.offset(row, col).map(|o| &self.data[o + ch])
    }

    /// All the channels of one pixel.
    pub fn pixel(&self, row: usize, col: usize) -> Option<&[T]> {
        self.offset(row, col)
            .map(|o| &self.data[o..o + CHANNELS])
    }

    /// The pixel at `(row, col)` with both coordinates clamped to the image.
    ///
    /// PRECONDITION: the image is not empty.
    pub fn pixel_clamped(&self, row: isize, col: isize) -> &[T] {
        let row = row.clamp(0, self.size.height as isize - 1) as usize;
        let col = col.clamp(0, self.size.width as isize - 1) as usize;
        let o = (row * self.size.width + col) * CHANNELS;
        &self.data[o..o + CHANNELS]
    }

    /// Convert every sample to `U` and multiply it by `scale`.
    ///
    /// Fails with [`ImageError::CastError`] when a sample does not fit in `U`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kuwahara_image::Image;
    ///
    /// let gray = Image::<u8, 1>::new([3, 1].into(), vec![0, 255, 0]).unwrap();
    /// let unit = gray.cast_and_scale::<f32>(1.0 / 255.0).unwrap();
    ///
    /// assert_eq!(unit.as_slice(), &[0.0, 1.0, 0.0]);
    /// ```
    pub fn cast_and_scale<U>(&self, scale: U) -> Result<Image<U, CHANNELS>, ImageError>
    where
        U: num_traits::NumCast + std::ops::Mul<Output = U> + Copy,
        T: num_traits::NumCast + Copy,
    {
        let data = self
            .data
            .iter()
            .map(|&v| U::from(v).map(|v| v * scale).ok_or(ImageError::CastError))
            .collect::<Result<Vec<_>, _>>()?;

        Image::new(self.size, data)
    }
}

#[cfg(test)]
mod tests {
    use crate::image::{Image, ImageError, ImageSize};

    #[test]
    fn image_size_from_array() {
        let size = ImageSize::from([7, 5]);
        assert_eq!(
            size,
            ImageSize {
                width: 7,
                height: 5
            }
        );
        assert_eq!(size.area(), 35);
        assert_eq!(format!("{size}"), "7x5");
    }

    #[test]
    fn image_from_fn_row_major() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::from_fn([3, 2].into(), |r, c| [r as u8, c as u8, 9])?;
        assert_eq!((image.cols(), image.rows()), (3, 2));
        assert_eq!(&image.as_slice()[9..12], &[1, 0, 9]);
        assert_eq!(image.as_slice().len(), 18);

        Ok(())
    }

    #[test]
    fn image_wrong_length() {
        let res = Image::<f32, 4>::new([2, 2].into(), vec![0.0; 15]);
        assert_eq!(res.unwrap_err(), ImageError::InvalidChannelShape(15, 16));
    }

    #[test]
    fn image_bounds_checked() -> Result<(), ImageError> {
        let image = Image::<f32, 2>::from_fn([3, 2].into(), |r, c| [r as f32, c as f32])?;
        assert_eq!(image.get([1, 2, 0]), Some(&1.0));
        assert_eq!(image.get([1, 2, 1]), Some(&2.0));
        assert_eq!(image.get([2, 0, 0]), None);
        assert_eq!(image.get([0, 3, 0]), None);
        assert_eq!(image.get([0, 0, 2]), None);
        assert_eq!(image.pixel(0, 1), Some(&[0.0, 1.0][..]));
        assert_eq!(image.pixel_clamped(-4, 9), &[0.0, 2.0][..]);

        Ok(())
    }

    #[test]
    fn image_cast_and_scale() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::new([2, 1].into(), vec![0, 255])?;
        let image_f32 = image.cast_and_scale::<f32>(1.0 / 255.0)?;
        assert_eq!(image_f32.as_slice(), &[0.0, 1.0]);

        Ok(())
    }
}
