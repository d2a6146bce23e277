use ircut_image::ImageSize;

use crate::camera::{CameraMatrix, CameraModel, DistortionCoeffs};
use crate::error::CalibError;
use crate::roi::Roi;

/// Number of samples per border when probing the valid image region.
const GRID_POINTS: usize = 9;

/// Distort a point using the polynomial distortion model
///
/// # Arguments
///
/// * `x` - The x coordinate of the point in normalized camera coordinates
/// * `y` - The y coordinate of the point in normalized camera coordinates
/// * `distortion` - The distortion parameters of the camera
///
/// # Returns
///
/// The distorted point in normalized camera coordinates.
pub fn distort_point_polynomial(x: f64, y: f64, distortion: &DistortionCoeffs) -> (f64, f64) {
    let d = distortion;

    // calculate the radial distance
    let r2 = x * x + y * y;
    let r4 = r2 * r2;
    let r6 = r4 * r2;

    // radial distortion
    let kr = (1.0 + d.k1 * r2 + d.k2 * r4 + d.k3 * r6)
        / (1.0 + d.k4 * r2 + d.k5 * r4 + d.k6 * r6);

    // tangential and thin-prism distortion
    let xd = x * kr + 2.0 * d.p1 * x * y + d.p2 * (r2 + 2.0 * x * x) + d.s1 * r2 + d.s2 * r4;
    let yd = y * kr + d.p1 * (r2 + 2.0 * y * y) + 2.0 * d.p2 * x * y + d.s3 * r2 + d.s4 * r4;

    (xd, yd)
}

/// Compute the ideal point for an observed distorted point.
///
/// Inverts [`distort_point_polynomial`] by fixed-point iteration on the
/// compensation form of the model.
///
/// # Arguments
///
/// * `xd` - The x coordinate of the distorted point in normalized camera coordinates
/// * `yd` - The y coordinate of the distorted point in normalized camera coordinates
/// * `distortion` - The distortion parameters of the camera
pub fn undistort_point_polynomial(xd: f64, yd: f64, distortion: &DistortionCoeffs) -> (f64, f64) {
    let d = distortion;

    let mut x = xd;
    let mut y = yd;

    for _ in 0..5 {
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;

        let kr = (1.0 + d.k1 * r2 + d.k2 * r4 + d.k3 * r6)
            / (1.0 + d.k4 * r2 + d.k5 * r4 + d.k6 * r6);
        let d_tan_x = 2.0 * d.p1 * x * y + d.p2 * (r2 + 2.0 * x * x);
        let d_tan_y = d.p1 * (r2 + 2.0 * y * y) + 2.0 * d.p2 * x * y;
        let d_prism_x = d.s1 * r2 + d.s2 * r4;
        let d_prism_y = d.s3 * r2 + d.s4 * r4;

        x = (xd - d_tan_x - d_prism_x) / kr;
        y = (yd - d_tan_y - d_prism_y) / kr;
    }

    (x, y)
}

/// An axis-aligned rectangle in normalized camera coordinates.
#[derive(Clone, Copy, Debug)]
struct RectF {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Probe the undistorted source border with a sample grid and return the
/// inscribed (all samples inside) and bounding rectangles in normalized
/// camera coordinates.
fn valid_rectangles(model: &CameraModel, size: &ImageSize) -> (RectF, RectF) {
    let k = &model.matrix;
    let (w, h) = (size.width as f64, size.height as f64);
    let n = GRID_POINTS;

    let mut i_x0 = f64::NEG_INFINITY;
    let mut i_x1 = f64::INFINITY;
    let mut i_y0 = f64::NEG_INFINITY;
    let mut i_y1 = f64::INFINITY;
    let mut o_x0 = f64::INFINITY;
    let mut o_x1 = f64::NEG_INFINITY;
    let mut o_y0 = f64::INFINITY;
    let mut o_y1 = f64::NEG_INFINITY;

    for j in 0..n {
        for i in 0..n {
            let u = i as f64 * w / (n - 1) as f64;
            let v = j as f64 * h / (n - 1) as f64;

            let (x, y) = undistort_point_polynomial(
                (u - k.cx) / k.fx,
                (v - k.cy) / k.fy,
                &model.distortion,
            );

            o_x0 = o_x0.min(x);
            o_x1 = o_x1.max(x);
            o_y0 = o_y0.min(y);
            o_y1 = o_y1.max(y);

            // the inscribed rectangle is bounded by the innermost image of
            // each source border
            if i == 0 {
                i_x0 = i_x0.max(x);
            }
            if i == n - 1 {
                i_x1 = i_x1.min(x);
            }
            if j == 0 {
                i_y0 = i_y0.max(y);
            }
            if j == n - 1 {
                i_y1 = i_y1.min(y);
            }
        }
    }

    (
        RectF {
            x: i_x0,
            y: i_y0,
            width: i_x1 - i_x0,
            height: i_y1 - i_y0,
        },
        RectF {
            x: o_x0,
            y: o_y0,
            width: o_x1 - o_x0,
            height: o_y1 - o_y0,
        },
    )
}

/// The camera matrix that maps a normalized rectangle onto a frame of the
/// given size.
fn fit_to_viewport(rect: &RectF, size: &ImageSize) -> CameraMatrix {
    let fx = size.width as f64 / rect.width;
    let fy = size.height as f64 / rect.height;
    CameraMatrix {
        fx,
        fy,
        cx: -fx * rect.x,
        cy: -fy * rect.y,
    }
}

/// Compute a refined camera matrix for undistortion, plus the rectangle of
/// pixels in the corrected frame free of invalid border artifacts.
///
/// The free scaling parameter `alpha` trades field of view against
/// cropping: at 0 the corrected frame keeps the full source field of view,
/// invalid black borders appear, and the returned rectangle is the tight
/// crop that removes them; at 1 the matrix zooms onto the distortion-free
/// core, the full frame is valid and the rectangle covers it. Values are
/// clamped to [0, 1].
///
/// The result is a pure function of `(model, size, alpha)` and does not
/// depend on frame content, so it should be computed once per frame size
/// and reused; see [`crate::undistort::Undistorter`].
///
/// # Arguments
///
/// * `model` - The calibrated camera model
/// * `size` - The pixel dimensions of the frames to correct
/// * `alpha` - The free scaling parameter in [0, 1]
///
/// # Errors
///
/// Fails with [`CalibError::EmptyFrame`] when `size` has zero area.
pub fn compute_optimal_camera_matrix(
    model: &CameraModel,
    size: &ImageSize,
    alpha: f64,
) -> Result<(CameraMatrix, Roi), CalibError> {
    if size.width == 0 || size.height == 0 {
        return Err(CalibError::EmptyFrame(size.width, size.height));
    }
    let alpha = alpha.clamp(0.0, 1.0);

    let (inner, outer) = valid_rectangles(model, size);

    // blend between the bounding fit (full field of view) and the
    // inscribed fit (valid pixels only)
    let m0 = fit_to_viewport(&outer, size);
    let m1 = fit_to_viewport(&inner, size);
    let new_matrix = CameraMatrix {
        fx: m0.fx * (1.0 - alpha) + m1.fx * alpha,
        fy: m0.fy * (1.0 - alpha) + m1.fy * alpha,
        cx: m0.cx * (1.0 - alpha) + m1.cx * alpha,
        cy: m0.cy * (1.0 - alpha) + m1.cy * alpha,
    };

    // project the inscribed rectangle into the corrected frame and round
    // inward so the crop never touches an invalid pixel
    let x0 = inner.x * new_matrix.fx + new_matrix.cx;
    let y0 = inner.y * new_matrix.fy + new_matrix.cy;
    let x1 = (inner.x + inner.width) * new_matrix.fx + new_matrix.cx;
    let y1 = (inner.y + inner.height) * new_matrix.fy + new_matrix.cy;

    // tolerate floating-point noise around integer boundaries
    const ROUND_EPS: f64 = 1e-6;
    let x0 = (x0.max(0.0) - ROUND_EPS).ceil().max(0.0) as usize;
    let y0 = (y0.max(0.0) - ROUND_EPS).ceil().max(0.0) as usize;
    let x1 = ((x1.min(size.width as f64) + ROUND_EPS).floor() as usize).max(x0);
    let y1 = ((y1.min(size.height as f64) + ROUND_EPS).floor() as usize).max(y0);

    let roi = Roi {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    };

    Ok((new_matrix, roi))
}
