use serde::{Deserialize, Serialize};

/// A face region within a frame, in pixel coordinates.
///
/// Produced by the Localization service and passed through untouched;
/// its positional index ties it to the matching cropped face image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X coordinate of the top-left corner
    pub x: f64,
    /// Y coordinate of the top-left corner
    pub y: f64,
    /// Width of the region
    pub width: f64,
    /// Height of the region
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}
