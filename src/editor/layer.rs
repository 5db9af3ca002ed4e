//! Layer records and the small value types used to edit them.

use std::cmp::Ordering;
use std::fmt;

use super::geometry::{Placement, Point, Rect};
use crate::imaging::PixelBuffer;

/// Stable layer identifier. Never reused within one editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One image placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    pub pixels: PixelBuffer,
    /// Scene position of the untransformed image's top-left corner.
    pub position: Point,
    pub scale: f64,
    pub rotation_degrees: f64,
    pub opacity: f64,
    pub z_order: f64,
    /// Insertion sequence, breaks z ties.
    pub sequence: u64,
    pub visible: bool,
    pub is_base: bool,
}

impl Layer {
    pub(crate) fn new(id: LayerId, pixels: PixelBuffer, sequence: u64) -> Self {
        Self {
            id,
            pixels,
            position: Point::default(),
            scale: 1.0,
            rotation_degrees: 0.0,
            opacity: 1.0,
            z_order: 0.0,
            sequence,
            visible: true,
            is_base: false,
        }
    }

    pub fn placement(&self) -> Placement {
        Placement {
            position: self.position,
            scale: self.scale,
            rotation_degrees: self.rotation_degrees,
        }
    }

    /// Axis-aligned scene bounds of the transformed image.
    pub fn bounds(&self) -> Rect {
        self.placement()
            .bounds(self.pixels.width() as f64, self.pixels.height() as f64)
    }

    /// Rotation normalized to `[0, 360)` for display.
    pub fn display_rotation(&self) -> f64 {
        let r = self.rotation_degrees.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negatives
        if r >= 360.0 { 0.0 } else { r }
    }

    /// Draw order: z first, insertion sequence on ties.
    pub fn stacking_cmp(&self, other: &Layer) -> Ordering {
        self.z_order
            .total_cmp(&other.z_order)
            .then(self.sequence.cmp(&other.sequence))
    }
}

/// Partial update for a live transform. `None` fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayerTransform {
    pub scale: Option<f64>,
    pub rotation_degrees: Option<f64>,
    pub opacity: Option<f64>,
}

impl LayerTransform {
    pub fn scale(value: f64) -> Self {
        Self {
            scale: Some(value),
            ..Self::default()
        }
    }

    pub fn rotation(degrees: f64) -> Self {
        Self {
            rotation_degrees: Some(degrees),
            ..Self::default()
        }
    }

    pub fn opacity(value: f64) -> Self {
        Self {
            opacity: Some(value),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderDirection {
    /// Toward the top of the stack (drawn later).
    Up,
    Down,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn layer(id: u64, z: f64, sequence: u64) -> Layer {
        let mut l = Layer::new(LayerId(id), RgbaImage::new(4, 2).into(), sequence);
        l.z_order = z;
        l
    }

    #[test]
    fn display_rotation_wraps_both_ways() {
        let mut l = layer(1, 0.0, 0);
        l.rotation_degrees = 450.0;
        assert_eq!(l.display_rotation(), 90.0);
        l.rotation_degrees = -90.0;
        assert_eq!(l.display_rotation(), 270.0);
        l.rotation_degrees = 360.0;
        assert_eq!(l.display_rotation(), 0.0);
    }

    #[test]
    fn stacking_breaks_ties_by_sequence() {
        let a = layer(1, 5.0, 1);
        let b = layer(2, 5.0, 2);
        let c = layer(3, 0.0, 3);
        assert_eq!(a.stacking_cmp(&b), Ordering::Less);
        assert_eq!(c.stacking_cmp(&a), Ordering::Less);
    }

    #[test]
    fn bounds_follow_scale() {
        let mut l = layer(1, 0.0, 0);
        l.position = Point::new(10.0, 10.0);
        l.scale = 2.0;
        assert_eq!(l.bounds(), Rect::new(10.0, 10.0, 8.0, 4.0));
    }

    #[test]
    fn layer_id_display() {
        assert_eq!(LayerId(7).to_string(), "#7");
    }
}
