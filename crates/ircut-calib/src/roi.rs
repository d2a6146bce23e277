use ircut_image::{Image, ImageSize};
use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

use crate::error::CalibError;

/// An axis-aligned rectangle of valid pixels within a corrected frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roi {
    /// The x coordinate of the top-left corner.
    pub x: usize,
    /// The y coordinate of the top-left corner.
    pub y: usize,
    /// The width of the rectangle.
    pub width: usize,
    /// The height of the rectangle.
    pub height: usize,
}

impl Roi {
    /// The rectangle area in pixels.
    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Whether the rectangle is fully contained in a frame of the given size.
    #[inline]
    pub fn fits_within(&self, size: ImageSize) -> bool {
        self.x + self.width <= size.width && self.y + self.height <= size.height
    }

    /// Whether the rectangle covers a frame of the given size entirely.
    #[inline]
    pub fn covers(&self, size: ImageSize) -> bool {
        self.x == 0 && self.y == 0 && self.width == size.width && self.height == size.height
    }
}

impl std::fmt::Display for Roi {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({}, {}, {}x{})", self.x, self.y, self.width, self.height)
    }
}

/// Crop a frame to the given region of interest.
///
/// Returns an unmodified copy when the region covers the whole frame.
///
/// # Arguments
///
/// * `src` - The frame to crop.
/// * `roi` - The region to keep.
///
/// # Errors
///
/// Fails with [`CalibError::RoiOutOfBounds`] when the region is not fully
/// contained in the frame; the rectangle is never clamped, since an
/// oversized region means it was computed for a different resolution.
///
/// # Examples
///
/// ```rust
/// use ircut_calib::roi::{crop_to_roi, Roi};
/// use ircut_image::{Image, ImageSize};
///
/// let image = Image::<u8, 1>::new(ImageSize { width: 4, height: 4 }, vec![
///     0u8, 1, 2, 3,
///     4u8, 5, 6, 7,
///     8u8, 9, 10, 11,
///     12u8, 13, 14, 15,
/// ]).unwrap();
///
/// let roi = Roi { x: 1, y: 1, width: 2, height: 2 };
/// let cropped = crop_to_roi(&image, &roi).unwrap();
///
/// assert_eq!(cropped.as_slice(), &[5u8, 6, 9, 10]);
/// ```
pub fn crop_to_roi<T, const C: usize>(
    src: &Image<T, C>,
    roi: &Roi,
) -> Result<Image<T, C>, CalibError>
where
    T: Copy + Send + Sync,
{
    if !roi.fits_within(src.size()) {
        return Err(CalibError::RoiOutOfBounds {
            x: roi.x,
            y: roi.y,
            width: roi.width,
            height: roi.height,
            frame_width: src.width(),
            frame_height: src.height(),
        });
    }

    if roi.covers(src.size()) {
        return Ok(src.clone());
    }

    let dst_size = ImageSize {
        width: roi.width,
        height: roi.height,
    };
    let Some(&fill) = src.as_slice().first() else {
        return Ok(Image::new(dst_size, Vec::new())?);
    };
    let mut dst = Image::from_size_val(dst_size, fill)?;

    let src_cols = src.cols();
    let src_slice = src.as_slice();
    dst.as_slice_mut()
        .par_chunks_exact_mut(roi.width * C)
        .enumerate()
        .for_each(|(i, dst_row)| {
            // get the slice at the top left corner of the row
            let offset = ((roi.y + i) * src_cols + roi.x) * C;
            dst_row.copy_from_slice(&src_slice[offset..offset + roi.width * C]);
        });

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ircut_image::{Image, ImageSize};

    #[test]
    fn crop_basic() -> Result<(), CalibError> {
        let image_size = ImageSize {
            width: 2,
            height: 3,
        };

        #[rustfmt::skip]
        let image = Image::<_, 3>::new(
            image_size,
            vec![
                0u8, 1, 2, 3, 4, 5,
                6u8, 7, 8, 9, 10, 11,
                12u8, 13, 14, 15, 16, 17,
            ],
        )?;

        let cropped = crop_to_roi(
            &image,
            &Roi {
                x: 1,
                y: 1,
                width: 1,
                height: 2,
            },
        )?;

        assert_eq!(cropped.as_slice(), &[9u8, 10, 11, 15, 16, 17]);

        Ok(())
    }

    #[test]
    fn crop_full_frame_is_noop() -> Result<(), CalibError> {
        let image = Image::<u8, 1>::new(
            ImageSize {
                width: 3,
                height: 2,
            },
            vec![1, 2, 3, 4, 5, 6],
        )?;

        let cropped = crop_to_roi(
            &image,
            &Roi {
                x: 0,
                y: 0,
                width: 3,
                height: 2,
            },
        )?;
        assert_eq!(cropped, image);

        Ok(())
    }

    #[test]
    fn crop_out_of_bounds() {
        let image = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 8,
                height: 8,
            },
            0,
        )
        .unwrap();

        let res = crop_to_roi(
            &image,
            &Roi {
                x: 9,
                y: 0,
                width: 10,
                height: 10,
            },
        );
        assert!(matches!(res, Err(CalibError::RoiOutOfBounds { .. })));
    }
}
