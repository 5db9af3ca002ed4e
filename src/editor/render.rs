//! Export-region compositing.
//!
//! Renders at 1:1 scene scale onto an opaque white background. Each output
//! pixel samples the scene at its center, maps that point into every visible
//! layer through the inverse placement (nearest neighbour), and blends with
//! `alpha × opacity` in draw order. Rows are independent, so they are
//! composited in parallel; the result does not depend on the thread count.

use image::RgbaImage;
use rayon::prelude::*;

use super::geometry::{ExportRegion, InverseMap, Point};
use super::layer::Layer;
use crate::imaging::PixelBuffer;

const BACKGROUND: [f64; 3] = [255.0, 255.0, 255.0];

/// Per-layer data hoisted out of the pixel loop.
struct Source<'a> {
    image: &'a RgbaImage,
    inverse: InverseMap,
    width: f64,
    height: f64,
    opacity: f64,
}

/// Composite `layers`, given in draw order, over the export region.
/// Hidden layers are skipped.
pub fn composite(layers: &[&Layer], region: &ExportRegion) -> PixelBuffer {
    let sources: Vec<Source> = layers
        .iter()
        .filter(|l| l.visible && l.opacity > 0.0)
        .map(|l| Source {
            image: l.pixels.image(),
            inverse: l.placement().inverse(),
            width: l.pixels.width() as f64,
            height: l.pixels.height() as f64,
            opacity: l.opacity.clamp(0.0, 1.0),
        })
        .collect();

    let (out_w, out_h) = region.output_size();
    let origin = Point::new(region.rect.x, region.rect.y);
    let mut out = RgbaImage::new(out_w, out_h);
    let row_len = out_w as usize * 4;

    out.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(row, pixels)| {
            let sy = origin.y + row as f64 + 0.5;
            for (col, px) in pixels.chunks_exact_mut(4).enumerate() {
                let scene = Point::new(origin.x + col as f64 + 0.5, sy);
                let rgb = shade(&sources, scene);
                px[0] = rgb[0];
                px[1] = rgb[1];
                px[2] = rgb[2];
                px[3] = 255;
            }
        });

    PixelBuffer::new(out)
}

fn shade(sources: &[Source], scene: Point) -> [u8; 3] {
    let mut acc = BACKGROUND;
    for src in sources {
        let local = src.inverse.apply(scene);
        if local.x < 0.0 || local.y < 0.0 || local.x >= src.width || local.y >= src.height {
            continue;
        }
        let [r, g, b, a] = src.image.get_pixel(local.x as u32, local.y as u32).0;
        let alpha = a as f64 / 255.0 * src.opacity;
        if alpha <= 0.0 {
            continue;
        }
        for (dst, s) in acc.iter_mut().zip([r, g, b]) {
            *dst = s as f64 * alpha + *dst * (1.0 - alpha);
        }
    }
    acc.map(|c| c.round().clamp(0.0, 255.0) as u8)
}
