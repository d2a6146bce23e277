//! Pixel interpolation methods for the correction remap.
//!
//! Samples taken outside the source frame resolve to zero (black). This
//! produces the dark borders of an undistorted frame that the
//! region-of-interest crop removes.

mod bilinear;

/// Grid generation utilities for building sampling maps.
pub mod grid;

pub(crate) mod interpolate;
mod nearest;
mod remap;

pub use interpolate::InterpolationMode;
pub use remap::remap;
