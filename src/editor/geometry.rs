//! Scene-space geometry for the layer editor.
//!
//! Scene coordinates are y-down. A layer maps local pixel coordinates into
//! the scene as `position + Rotate(θ)·Scale(s)·local`, with positive θ
//! turning clockwise on screen. Everything here is pure and allocation free.

use crate::imaging::Dimensions;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Grow by `pad` on every side.
    pub fn padded(&self, pad: f64) -> Rect {
        Rect::new(
            self.x - pad,
            self.y - pad,
            self.width + 2.0 * pad,
            self.height + 2.0 * pad,
        )
    }

    /// Scale width and height independently, keeping the center fixed.
    pub fn scaled_about_center(&self, fx: f64, fy: f64) -> Rect {
        let c = self.center();
        let width = self.width * fx;
        let height = self.height * fy;
        Rect::new(c.x - width / 2.0, c.y - height / 2.0, width, height)
    }

    /// Smallest rectangle containing every point.
    fn enclosing(points: &[Point]) -> Rect {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Placement of a layer in the scene: translate, rotate, uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Point,
    pub scale: f64,
    pub rotation_degrees: f64,
}

impl Placement {
    pub fn to_scene(&self, local: Point) -> Point {
        let (sin, cos) = self.rotation_degrees.to_radians().sin_cos();
        let (lx, ly) = (local.x * self.scale, local.y * self.scale);
        Point::new(
            self.position.x + cos * lx - sin * ly,
            self.position.y + sin * lx + cos * ly,
        )
    }

    /// Inverse of [`to_scene`](Self::to_scene). Requires a non-zero scale.
    pub fn to_local(&self, scene: Point) -> Point {
        self.inverse().apply(scene)
    }

    pub fn inverse(&self) -> InverseMap {
        let (sin, cos) = self.rotation_degrees.to_radians().sin_cos();
        InverseMap {
            origin: self.position,
            sin,
            cos,
            inv_scale: 1.0 / self.scale,
        }
    }

    /// Axis-aligned bounds of a `width` x `height` image under this placement.
    pub fn bounds(&self, width: f64, height: f64) -> Rect {
        Rect::enclosing(&[
            self.to_scene(Point::new(0.0, 0.0)),
            self.to_scene(Point::new(width, 0.0)),
            self.to_scene(Point::new(0.0, height)),
            self.to_scene(Point::new(width, height)),
        ])
    }
}

/// Precomputed scene → local mapping, reused for every output pixel.
#[derive(Debug, Clone, Copy)]
pub struct InverseMap {
    origin: Point,
    sin: f64,
    cos: f64,
    inv_scale: f64,
}

impl InverseMap {
    #[inline]
    pub fn apply(&self, scene: Point) -> Point {
        let dx = scene.x - self.origin.x;
        let dy = scene.y - self.origin.y;
        Point::new(
            (self.cos * dx + self.sin * dy) * self.inv_scale,
            (-self.sin * dx + self.cos * dy) * self.inv_scale,
        )
    }
}

/// Export rectangle plus the base pixel size it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportRegion {
    pub rect: Rect,
    pub base_size: Dimensions,
}

impl ExportRegion {
    /// Region covering the natural bounding box of a freshly loaded base.
    pub fn for_base(size: Dimensions) -> Self {
        Self {
            rect: Rect::new(0.0, 0.0, size.width as f64, size.height as f64),
            base_size: size,
        }
    }

    /// Track a base resize: each axis scales by its own factor around the
    /// region's center.
    pub fn rescaled(&self, new_size: Dimensions) -> Self {
        let fx = new_size.width as f64 / self.base_size.width.max(1) as f64;
        let fy = new_size.height as f64 / self.base_size.height.max(1) as f64;
        Self {
            rect: self.rect.scaled_about_center(fx, fy),
            base_size: new_size,
        }
    }

    /// Scene bounds: the region padded by `max(min_padding, 2 × longest side)`.
    pub fn scene_bounds(&self, min_padding: f64) -> Rect {
        let longest = self.rect.width.max(self.rect.height);
        self.rect.padded(min_padding.max(2.0 * longest))
    }

    /// Output pixel size of a 1:1 render: floor of the region size, at least 1.
    pub fn output_size(&self) -> (u32, u32) {
        let side = |v: f64| (v.floor().max(1.0)).min(u32::MAX as f64) as u32;
        (side(self.rect.width), side(self.rect.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn identity_placement_is_translation() {
        let p = Placement {
            position: Point::new(10.0, 20.0),
            scale: 1.0,
            rotation_degrees: 0.0,
        };
        assert!(close(p.to_scene(Point::new(1.0, 2.0)), Point::new(11.0, 22.0)));
    }

    #[test]
    fn positive_rotation_is_clockwise_in_y_down() {
        let p = Placement {
            position: Point::default(),
            scale: 1.0,
            rotation_degrees: 90.0,
        };
        // Local +x points down the screen after a quarter turn
        assert!(close(p.to_scene(Point::new(1.0, 0.0)), Point::new(0.0, 1.0)));
    }

    #[test]
    fn inverse_round_trips() {
        let p = Placement {
            position: Point::new(-3.0, 7.5),
            scale: 2.5,
            rotation_degrees: 33.0,
        };
        let local = Point::new(4.0, -9.0);
        assert!(close(p.to_local(p.to_scene(local)), local));
    }

    #[test]
    fn bounds_of_rotated_square() {
        let p = Placement {
            position: Point::default(),
            scale: 1.0,
            rotation_degrees: 45.0,
        };
        let b = p.bounds(2.0, 2.0);
        let diag = 2.0 * std::f64::consts::SQRT_2;
        assert!((b.width - diag).abs() < 1e-9);
        assert!((b.height - diag).abs() < 1e-9);
    }

    #[test]
    fn rescale_keeps_center_and_scales_each_axis() {
        let region = ExportRegion::for_base(dims(100, 80));
        let grown = region.rescaled(dims(200, 40));
        assert_eq!(grown.rect.center(), region.rect.center());
        assert_eq!(grown.rect.width, 200.0);
        assert_eq!(grown.rect.height, 40.0);
        assert_eq!(grown.base_size, dims(200, 40));
    }

    #[test]
    fn scene_bounds_use_larger_of_padding_and_twice_longest_side() {
        let small = ExportRegion::for_base(dims(100, 50));
        assert_eq!(small.scene_bounds(2000.0), Rect::new(-2000.0, -2000.0, 4100.0, 4050.0));

        let large = ExportRegion::for_base(dims(3000, 1000));
        let b = large.scene_bounds(2000.0);
        assert_eq!(b.x, -6000.0);
        assert_eq!(b.width, 3000.0 + 12000.0);
    }

    #[test]
    fn output_size_floors_and_never_hits_zero() {
        let mut region = ExportRegion::for_base(dims(10, 10));
        region.rect.width = 12.9;
        region.rect.height = 0.3;
        assert_eq!(region.output_size(), (12, 1));
    }
}
