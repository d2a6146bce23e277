use std::collections::HashMap;

use ircut_image::{Image, ImageDtype, ImageSize};

use crate::camera::{CameraMatrix, CameraModel};
use crate::distortion::{compute_optimal_camera_matrix, distort_point_polynomial};
use crate::error::CalibError;
use crate::interpolation::grid::meshgrid_from_fn;
use crate::interpolation::{remap, InterpolationMode};
use crate::roi::Roi;

/// Generate the sampling map that removes lens distortion.
///
/// For every destination pixel the map holds the source location to sample
/// from: the pixel is normalized through the target matrix, pushed through
/// the forward distortion model and projected back through the model's own
/// matrix.
///
/// # Arguments
///
/// * `model` - The calibrated camera model.
/// * `target` - The camera matrix of the corrected frame; `None` reuses
///   the model's own matrix.
/// * `size` - The size of the frames to correct.
///
/// # Returns
///
/// * `map_x` - The x map for undistorting the image.
/// * `map_y` - The y map for undistorting the image.
pub fn generate_correction_map(
    model: &CameraModel,
    target: Option<&CameraMatrix>,
    size: &ImageSize,
) -> Result<(Image<f32, 1>, Image<f32, 1>), CalibError> {
    if size.width == 0 || size.height == 0 {
        return Err(CalibError::EmptyFrame(size.width, size.height));
    }

    let k = &model.matrix;
    let target = target.unwrap_or(k);

    let (map_x, map_y) = meshgrid_from_fn(size.width, size.height, |u, v| {
        let x = (u as f64 - target.cx) / target.fx;
        let y = (v as f64 - target.cy) / target.fy;
        let (xd, yd) = distort_point_polynomial(x, y, &model.distortion);
        ((k.fx * xd + k.cx) as f32, (k.fy * yd + k.cy) as f32)
    })?;

    Ok((map_x, map_y))
}

/// Remove lens distortion from a single frame.
///
/// The output frame has the input's dimensions; the input is not
/// modified. Passing `None` as the target matrix corrects into the
/// geometry of the model's own matrix.
///
/// # Errors
///
/// Fails with [`CalibError::EmptyFrame`] when the input has zero area and
/// with a size error when `dst` does not match the input dimensions.
pub fn undistort_image<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    model: &CameraModel,
    target: Option<&CameraMatrix>,
) -> Result<(), CalibError> {
    if src.is_empty() {
        return Err(CalibError::EmptyFrame(src.width(), src.height()));
    }

    let (map_x, map_y) = generate_correction_map(model, target, &src.size())?;
    remap(src, dst, &map_x, &map_y, InterpolationMode::Bilinear)?;

    Ok(())
}

/// Everything derived from the model for one frame geometry.
struct CachedMap {
    map_x: Image<f32, 1>,
    map_y: Image<f32, 1>,
    roi: Option<Roi>,
}

/// Applies a fixed camera model to a stream of frames.
///
/// The refined matrix, region of interest and sampling maps depend only on
/// the frame geometry, not its content. They are computed once per
/// distinct frame size and reused for every following frame. When `alpha`
/// is `None` the region-of-interest machinery is disabled and the
/// correction uses the model's own matrix directly.
pub struct Undistorter {
    model: CameraModel,
    alpha: Option<f64>,
    cache: HashMap<(usize, usize, u64), CachedMap>,
}

impl Undistorter {
    /// Create an undistorter for the given model.
    ///
    /// # Arguments
    ///
    /// * `model` - The calibrated camera model, validated at load time.
    /// * `alpha` - The free scaling parameter for the refined matrix and
    ///   crop rectangle, or `None` to correct with the original matrix and
    ///   no crop.
    pub fn new(model: CameraModel, alpha: Option<f64>) -> Self {
        Self {
            model,
            alpha,
            cache: HashMap::new(),
        }
    }

    /// The camera model in use.
    pub fn model(&self) -> &CameraModel {
        &self.model
    }

    /// The crop rectangle for frames of the given size, if enabled.
    pub fn roi(&mut self, size: ImageSize) -> Result<Option<Roi>, CalibError> {
        Ok(self.entry(size)?.roi)
    }

    /// Correct one frame into `dst`, which must have the frame's size.
    pub fn correct<T: ImageDtype, const C: usize>(
        &mut self,
        src: &Image<T, C>,
        dst: &mut Image<T, C>,
    ) -> Result<(), CalibError> {
        if src.is_empty() {
            return Err(CalibError::EmptyFrame(src.width(), src.height()));
        }

        let entry = self.entry(src.size())?;
        remap(
            src,
            dst,
            &entry.map_x,
            &entry.map_y,
            InterpolationMode::Bilinear,
        )?;

        Ok(())
    }

    fn cache_key(&self, size: ImageSize) -> (usize, usize, u64) {
        (
            size.width,
            size.height,
            self.alpha.map_or(u64::MAX, f64::to_bits),
        )
    }

    fn entry(&mut self, size: ImageSize) -> Result<&CachedMap, CalibError> {
        let key = self.cache_key(size);
        if !self.cache.contains_key(&key) {
            log::debug!(
                "computing correction map for {}x{} (alpha: {:?})",
                size.width,
                size.height,
                self.alpha
            );

            let (target, roi) = match self.alpha {
                Some(alpha) => {
                    let (matrix, roi) = compute_optimal_camera_matrix(&self.model, &size, alpha)?;
                    (Some(matrix), Some(roi))
                }
                None => (None, None),
            };
            let (map_x, map_y) = generate_correction_map(&self.model, target.as_ref(), &size)?;

            self.cache.insert(key, CachedMap { map_x, map_y, roi });
        }

        Ok(&self.cache[&key])
    }
}
