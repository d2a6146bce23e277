use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CalibError;

/// Represents the intrinsic parameters of a pinhole camera
///
/// # Fields
///
/// * `fx` - The focal length in the x direction
/// * `fy` - The focal length in the y direction
/// * `cx` - The x coordinate of the principal point
/// * `cy` - The y coordinate of the principal point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraMatrix {
    /// The focal length in the x direction
    pub fx: f64,
    /// The focal length in the y direction
    pub fy: f64,
    /// The x coordinate of the principal point
    pub cx: f64,
    /// The y coordinate of the principal point
    pub cy: f64,
}

impl CameraMatrix {
    /// Build the intrinsics from a row-major 3x3 camera matrix.
    ///
    /// # Errors
    ///
    /// Fails with [`CalibError::InvalidModel`] when the matrix is not a
    /// valid pinhole projection: non-finite entries, zero focal lengths,
    /// nonzero skew, or a last row different from (0, 0, 1).
    pub fn from_matrix(m: &[[f64; 3]; 3]) -> Result<Self, CalibError> {
        if m.iter().flatten().any(|v| !v.is_finite()) {
            return Err(CalibError::InvalidModel(
                "camera matrix contains non-finite entries".to_string(),
            ));
        }
        if m[0][0] == 0.0 || m[1][1] == 0.0 {
            return Err(CalibError::InvalidModel(
                "camera matrix is singular (zero focal length)".to_string(),
            ));
        }
        if m[0][1] != 0.0 || m[1][0] != 0.0 {
            return Err(CalibError::InvalidModel(
                "camera matrix with skew is not supported".to_string(),
            ));
        }
        if m[2] != [0.0, 0.0, 1.0] {
            return Err(CalibError::InvalidModel(
                "camera matrix last row must be (0, 0, 1)".to_string(),
            ));
        }

        Ok(Self {
            fx: m[0][0],
            fy: m[1][1],
            cx: m[0][2],
            cy: m[1][2],
        })
    }

    /// The row-major 3x3 form of the matrix.
    pub fn to_matrix(&self) -> [[f64; 3]; 3] {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }
}

/// Represents the polynomial distortion parameters of a camera
///
/// Radial (`k1..k6`), tangential (`p1`, `p2`) and thin-prism (`s1..s4`)
/// coefficients in the conventional calibration ordering
/// `(k1, k2, p1, p2, k3, k4, k5, k6, s1, s2, s3, s4)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DistortionCoeffs {
    /// The first radial distortion coefficient
    pub k1: f64,
    /// The second radial distortion coefficient
    pub k2: f64,
    /// The third radial distortion coefficient
    pub k3: f64,
    /// The fourth radial distortion coefficient
    pub k4: f64,
    /// The fifth radial distortion coefficient
    pub k5: f64,
    /// The sixth radial distortion coefficient
    pub k6: f64,
    /// The first tangential distortion coefficient
    pub p1: f64,
    /// The second tangential distortion coefficient
    pub p2: f64,
    /// The first thin-prism distortion coefficient
    pub s1: f64,
    /// The second thin-prism distortion coefficient
    pub s2: f64,
    /// The third thin-prism distortion coefficient
    pub s3: f64,
    /// The fourth thin-prism distortion coefficient
    pub s4: f64,
}

impl DistortionCoeffs {
    /// Build the coefficients from a calibration vector.
    ///
    /// Accepts vectors of length 4, 5, 8, 12 or 14; missing trailing terms
    /// are zero. A 14-element vector carries tilted-sensor terms in its
    /// last two slots, which this model does not implement; they must be
    /// zero.
    ///
    /// # Errors
    ///
    /// Fails with [`CalibError::InvalidModel`] on any other length, on
    /// non-finite values, or on nonzero tilt terms.
    pub fn from_slice(coeffs: &[f64]) -> Result<Self, CalibError> {
        match coeffs.len() {
            4 | 5 | 8 | 12 | 14 => {}
            n => {
                return Err(CalibError::InvalidModel(format!(
                    "unsupported distortion coefficient count: {n} (expected 4, 5, 8, 12 or 14)"
                )))
            }
        }
        if coeffs.iter().any(|c| !c.is_finite()) {
            return Err(CalibError::InvalidModel(
                "distortion coefficients contain non-finite values".to_string(),
            ));
        }
        if coeffs.len() == 14 && (coeffs[12] != 0.0 || coeffs[13] != 0.0) {
            return Err(CalibError::InvalidModel(
                "tilted sensor coefficients (tau_x, tau_y) are not supported".to_string(),
            ));
        }

        let at = |i: usize| coeffs.get(i).copied().unwrap_or(0.0);
        Ok(Self {
            k1: at(0),
            k2: at(1),
            p1: at(2),
            p2: at(3),
            k3: at(4),
            k4: at(5),
            k5: at(6),
            k6: at(7),
            s1: at(8),
            s2: at(9),
            s3: at(10),
            s4: at(11),
        })
    }
}

/// A calibrated camera: pinhole intrinsics plus distortion coefficients.
///
/// Both parts must originate from the same calibration run at the same
/// nominal resolution; the model is immutable after construction and can
/// be shared read-only across threads.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraModel {
    /// The pinhole intrinsics.
    pub matrix: CameraMatrix,
    /// The lens distortion coefficients.
    pub distortion: DistortionCoeffs,
}

impl CameraModel {
    /// Create a model from already validated parts.
    pub fn new(matrix: CameraMatrix, distortion: DistortionCoeffs) -> Self {
        Self { matrix, distortion }
    }

    /// Build and validate a model from a persisted calibration artifact.
    pub fn from_artifact(artifact: &CalibrationArtifact) -> Result<Self, CalibError> {
        Ok(Self {
            matrix: CameraMatrix::from_matrix(&artifact.mtx)?,
            distortion: DistortionCoeffs::from_slice(&artifact.dist.to_flat())?,
        })
    }

    /// Load and validate a model from a calibration JSON file.
    ///
    /// A malformed artifact fails here, before any frame is processed.
    pub fn read_from_json(path: impl AsRef<Path>) -> Result<Self, CalibError> {
        let contents = std::fs::read_to_string(path)?;
        let artifact: CalibrationArtifact = serde_json::from_str(&contents)?;
        Self::from_artifact(&artifact)
    }
}

/// The persisted calibration record.
///
/// The `mtx` field holds the row-major 3x3 camera matrix, `dist` the
/// distortion coefficient vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationArtifact {
    /// The 3x3 camera matrix.
    pub mtx: [[f64; 3]; 3],
    /// The distortion coefficient vector.
    pub dist: DistVector,
}

/// The distortion vector as persisted.
///
/// Calibration tools write either a flat array or a single-row nested
/// array (numpy arrays of shape (1, N) serialize as the latter); both are
/// accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DistVector {
    /// A flat coefficient array.
    Flat(Vec<f64>),
    /// A row-nested coefficient array.
    Rows(Vec<Vec<f64>>),
}

impl DistVector {
    /// The coefficients as one flat vector.
    pub fn to_flat(&self) -> Vec<f64> {
        match self {
            Self::Flat(v) => v.clone(),
            Self::Rows(rows) => rows.iter().flatten().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MTX: [[f64; 3]; 3] = [
        [1000.0, 0.0, 960.0],
        [0.0, 1000.0, 540.0],
        [0.0, 0.0, 1.0],
    ];

    #[test]
    fn camera_matrix_from_matrix() -> Result<(), CalibError> {
        let m = CameraMatrix::from_matrix(&MTX)?;
        assert_eq!(m.fx, 1000.0);
        assert_eq!(m.fy, 1000.0);
        assert_eq!(m.cx, 960.0);
        assert_eq!(m.cy, 540.0);
        assert_eq!(m.to_matrix(), MTX);

        Ok(())
    }

    #[test]
    fn camera_matrix_singular() {
        let mut m = MTX;
        m[1][1] = 0.0;
        assert!(matches!(
            CameraMatrix::from_matrix(&m),
            Err(CalibError::InvalidModel(_))
        ));
    }

    #[test]
    fn camera_matrix_skew_rejected() {
        let mut m = MTX;
        m[0][1] = 0.1;
        assert!(matches!(
            CameraMatrix::from_matrix(&m),
            Err(CalibError::InvalidModel(_))
        ));
    }

    #[test]
    fn distortion_coeffs_lengths() -> Result<(), CalibError> {
        let d = DistortionCoeffs::from_slice(&[0.1, 0.2, 0.3, 0.4])?;
        assert_eq!(d.k1, 0.1);
        assert_eq!(d.p1, 0.3);
        assert_eq!(d.p2, 0.4);
        assert_eq!(d.k3, 0.0);

        let d = DistortionCoeffs::from_slice(&[0.1, 0.2, 0.3, 0.4, 0.5])?;
        assert_eq!(d.k3, 0.5);

        assert!(matches!(
            DistortionCoeffs::from_slice(&[0.1; 7]),
            Err(CalibError::InvalidModel(_))
        ));

        Ok(())
    }

    #[test]
    fn distortion_coeffs_tilt_rejected() {
        let mut coeffs = [0.0; 14];
        coeffs[12] = 0.01;
        assert!(matches!(
            DistortionCoeffs::from_slice(&coeffs),
            Err(CalibError::InvalidModel(_))
        ));

        // zero tilt terms are fine
        assert!(DistortionCoeffs::from_slice(&[0.0; 14]).is_ok());
    }

    #[test]
    fn artifact_flat_and_nested() -> Result<(), CalibError> {
        let flat = r#"{"mtx": [[1000.0, 0.0, 960.0], [0.0, 1000.0, 540.0], [0.0, 0.0, 1.0]],
                       "dist": [-0.3, 0.1, 0.0, 0.0, 0.0]}"#;
        let nested = r#"{"mtx": [[1000.0, 0.0, 960.0], [0.0, 1000.0, 540.0], [0.0, 0.0, 1.0]],
                         "dist": [[-0.3, 0.1, 0.0, 0.0, 0.0]]}"#;

        for json in [flat, nested] {
            let artifact: CalibrationArtifact = serde_json::from_str(json)?;
            let model = CameraModel::from_artifact(&artifact)?;
            assert_eq!(model.matrix.fx, 1000.0);
            assert_eq!(model.distortion.k1, -0.3);
            assert_eq!(model.distortion.k2, 0.1);
        }

        Ok(())
    }

    #[test]
    fn artifact_bad_coeff_count() {
        let json = r#"{"mtx": [[1000.0, 0.0, 960.0], [0.0, 1000.0, 540.0], [0.0, 0.0, 1.0]],
                       "dist": [-0.3, 0.1]}"#;
        let artifact: CalibrationArtifact = serde_json::from_str(json).unwrap();
        assert!(CameraModel::from_artifact(&artifact).is_err());
    }
}
