use ircut_image::ImageError;

/// An error type for the calibration module.
#[derive(thiserror::Error, Debug)]
pub enum CalibError {
    /// Malformed or structurally inconsistent camera model.
    #[error("Invalid camera model: {0}")]
    InvalidModel(String),

    /// The input frame has zero area.
    #[error("Frame has no pixels ({0}x{1})")]
    EmptyFrame(usize, usize),

    /// The crop rectangle is not fully contained in the frame.
    ///
    /// Usually indicates a stale rectangle computed for a different
    /// resolution; the caller should recompute it for the current frame
    /// size instead of clamping.
    #[error(
        "Roi ({x}, {y}, {width}x{height}) exceeds the frame bounds ({frame_width}x{frame_height})"
    )]
    RoiOutOfBounds {
        /// The x coordinate of the rectangle's top-left corner.
        x: usize,
        /// The y coordinate of the rectangle's top-left corner.
        y: usize,
        /// The width of the rectangle.
        width: usize,
        /// The height of the rectangle.
        height: usize,
        /// The width of the frame the crop was attempted on.
        frame_width: usize,
        /// The height of the frame the crop was attempted on.
        frame_height: usize,
    },

    /// Error from the underlying image container.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Failed to read a calibration artifact from disk.
    #[error("Failed to read the calibration file. {0}")]
    FileError(#[from] std::io::Error),

    /// Failed to parse a calibration artifact.
    #[error("Failed to parse the calibration file. {0}")]
    ParseError(#[from] serde_json::Error),
}
