//! Capture surface geometry.
//!
//! The trackpad server needs the surface size and a resolution (units per
//! millimetre) to configure its virtual device. The resolution is estimated
//! from the device pixel ratio: at a ratio of 1, one pixel is taken to be
//! 1/96 inch.

use serde::{Deserialize, Serialize};

use crate::protocol::messages::DimensionsData;

/// Pixels per inch at a device pixel ratio of 1.
pub const REFERENCE_DPI: f64 = 96.0;

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Size of the capture surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
    /// Physical pixels per logical pixel.
    pub device_pixel_ratio: f64,
}

impl Viewport {
    /// Estimated capture units per millimetre, rounded to the nearest integer.
    pub fn resolution(&self) -> i32 {
        (REFERENCE_DPI * self.device_pixel_ratio / MM_PER_INCH).round() as i32
    }

    /// The payload of a `Dimensions` message for this surface.
    pub fn dimensions(&self) -> DimensionsData {
        DimensionsData {
            width: self.width,
            height: self.height,
            resolution: self.resolution(),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            device_pixel_ratio: 1.0,
        }
    }
}
