//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Square sizes that almost always mean a favicon, avatar or UI glyph.
const ICON_SIDES: &[u32] = &[16, 32, 48, 64, 96, 128, 150];

/// Pixel area, widened so large images cannot overflow.
pub fn pixel_area(width: u32, height: u32) -> u64 {
    width as u64 * height as u64
}

/// Long side divided by short side (≥ 1.0).
///
/// A zero short side counts as 1 so degenerate images produce a huge ratio
/// instead of a division by zero.
///
/// ```
/// # use orca::imaging::aspect_ratio;
/// assert_eq!(aspect_ratio(400, 100), 4.0);
/// assert_eq!(aspect_ratio(100, 400), 4.0);
/// ```
pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    let long = width.max(height) as f64;
    let short = width.min(height).max(1) as f64;
    long / short
}

/// True for square images whose side is a typical icon size.
pub fn is_icon_square(width: u32, height: u32) -> bool {
    width == height && ICON_SIDES.contains(&width)
}
