use ircut_image::{Image, ImageError, ImageSize};

/// Create a pair of sampling maps by evaluating a function on every grid
/// coordinate.
///
/// # Arguments
///
/// * `cols` - The number of columns indicating the width of the grid
/// * `rows` - The number of rows indicating the height of the grid
/// * `f` - Maps a destination coordinate `(x, y)` to source coordinates.
///
/// # Returns
///
/// A pair of single-channel images of shape (rows, cols) containing the x
/// and y source coordinates.
pub fn meshgrid_from_fn(
    cols: usize,
    rows: usize,
    f: impl Fn(usize, usize) -> (f32, f32),
) -> Result<(Image<f32, 1>, Image<f32, 1>), ImageError> {
    let mut map_x = Vec::with_capacity(rows * cols);
    let mut map_y = Vec::with_capacity(rows * cols);

    for y in 0..rows {
        for x in 0..cols {
            let (sx, sy) = f(x, y);
            map_x.push(sx);
            map_y.push(sy);
        }
    }

    let size = ImageSize {
        width: cols,
        height: rows,
    };
    Ok((Image::new(size, map_x)?, Image::new(size, map_y)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meshgrid_identity() -> Result<(), ImageError> {
        let (map_x, map_y) = meshgrid_from_fn(3, 2, |x, y| (x as f32, y as f32))?;

        assert_eq!(map_x.size().width, 3);
        assert_eq!(map_x.size().height, 2);
        assert_eq!(map_x.as_slice(), &[0.0, 1.0, 2.0, 0.0, 1.0, 2.0]);
        assert_eq!(map_y.as_slice(), &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);

        Ok(())
    }
}
