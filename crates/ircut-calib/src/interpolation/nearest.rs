use ircut_image::{Image, ImageDtype};

/// Kernel for nearest neighbor interpolation with a constant zero border.
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
///
/// # Returns
///
/// The interpolated pixel values.
pub(crate) fn nearest_neighbor_interpolation<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f32,
    v: f32,
) -> [f32; C] {
    let (rows, cols) = (image.rows() as i64, image.cols() as i64);

    let iu = u.round() as i64;
    let iv = v.round() as i64;

    let mut pixel = [0.0; C];
    if iu < 0 || iv < 0 || iu >= cols || iv >= rows {
        return pixel;
    }

    let base = ((iv * cols + iu) as usize) * C;
    let src = &image.as_slice()[base..base + C];
    for k in 0..C {
        pixel[k] = src[k].into();
    }

    pixel
}
