use ircut_image::{Image, ImageDtype};

/// Kernel for bilinear interpolation with a constant zero border.
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
pub(crate) fn bilinear_interpolation<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f32,
    v: f32,
) -> [f32; C] {
    let (rows, cols) = (image.rows() as i64, image.cols() as i64);

    let iu0 = u.floor() as i64;
    let iv0 = v.floor() as i64;
    let iu1 = iu0 + 1;
    let iv1 = iv0 + 1;

    let frac_u = u - iu0 as f32;
    let frac_v = v - iv0 as f32;

    let w00 = (1.0 - frac_u) * (1.0 - frac_v);
    let w01 = frac_u * (1.0 - frac_v);
    let w10 = (1.0 - frac_u) * frac_v;
    let w11 = frac_u * frac_v;

    let data = image.as_slice();

    let mut pixel = [0.0; C];
    for (w, x, y) in [
        (w00, iu0, iv0),
        (w01, iu1, iv0),
        (w10, iu0, iv1),
        (w11, iu1, iv1),
    ] {
        if x < 0 || y < 0 || x >= cols || y >= rows {
            // outside the source: contributes the constant border
            continue;
        }
        let base = ((y * cols + x) as usize) * C;
        let p = &data[base..base + C];
        for k in 0..C {
            pixel[k] += p[k].into() * w;
        }
    }

    pixel
}

#[cfg(test)]
mod tests {
    use super::*;
    use ircut_image::{Image, ImageSize};

    #[test]
    fn interpolates_between_pixels() {
        let image = Image::<f32, 1>::new(
            ImageSize {
                width: 2,
                height: 1,
            },
            vec![0.0, 1.0],
        )
        .unwrap();

        let [p] = bilinear_interpolation(&image, 0.5, 0.0);
        assert!((p - 0.5).abs() < 1e-6);
    }

    #[test]
    fn outside_samples_are_black() {
        let image = Image::<u8, 1>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![200u8; 4],
        )
        .unwrap();

        let [p] = bilinear_interpolation(&image, -5.0, 0.0);
        assert_eq!(p, 0.0);

        // half a pixel outside blends with the border
        let [p] = bilinear_interpolation(&image, -0.5, 0.0);
        assert!((p - 100.0).abs() < 1e-4);
    }
}
