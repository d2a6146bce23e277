#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the io module.
pub mod error;

/// A simple frames-per-second counter.
pub mod fps_counter;

/// PNG image encoding and numbered picture persistence.
pub mod png;

/// V4L2 camera capture.
pub mod v4l;

pub use crate::error::IoError;
pub use crate::png::{PictureWriter, PngCompression};
