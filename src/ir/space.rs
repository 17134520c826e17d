//! Coordinate space markers.
//!
//! Uninhabited types used only as type parameters, so a box in normalized
//! YOLO units can never be passed where absolute pixels are expected.

/// Absolute pixel units, origin at the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Units relative to the image extent, nominally in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Normalized {}
