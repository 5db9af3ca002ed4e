//! Layer editor: ordered image layers, bounded undo/redo and export.
//!
//! The editor holds one base image plus any number of overlays. Every layer
//! has a scene placement (position, uniform scale, rotation), an opacity,
//! a z order and a visibility flag. The export region is a fixed rectangle
//! in scene space: it starts as the base image's bounding box and only moves
//! when the base is resized. There is no viewport state here; panning or
//! zooming a view can never change what gets exported.
//!
//! ## History
//!
//! Structural edits (load, add, delete, reorder, resize) and explicit
//! [`commit`](LayerEditor::commit) calls push a full snapshot. Live edits
//! ([`transform_layer`](LayerEditor::transform_layer),
//! [`move_layer`](LayerEditor::move_layer),
//! [`set_visibility`](LayerEditor::set_visibility)) do not, so a drag or a
//! slider scrub becomes one undo step once the caller commits on release.
//!
//! Snapshots share pixel buffers with the live scene. Buffers are never
//! mutated in place (resizing swaps in a new one), so a snapshot always
//! restores exactly what it captured.
//!
//! ## Module map
//!
//! | Module | Contents |
//! |---|---|
//! | `geometry` | Points, rects, layer placement, export region arithmetic |
//! | `layer` | [`Layer`], [`LayerId`], [`LayerTransform`], [`ReorderDirection`] |
//! | `history` | Generic bounded undo/redo stack |
//! | `render` | Parallel compositing of the export region |

mod geometry;
mod history;
mod layer;
mod render;

pub use geometry::{ExportRegion, Placement, Point, Rect};
pub use history::History;
pub use layer::{Layer, LayerId, LayerTransform, ReorderDirection};

use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::EditorConfig;
use crate::imaging::{CodecError, Dimensions, ExportFormat, ImageCodec, PixelBuffer, Quality, RustCodec};

#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("No base image loaded")]
    NoBaseImage,
    #[error("Unknown layer {0}")]
    UnknownLayer(LayerId),
    #[error("Invalid layer size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Invalid transform: {0}")]
    InvalidTransform(String),
}

/// Full capture of the scene. Restoring one reconstructs the editor state
/// exactly (ids, z order, visibility, export region).
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSnapshot {
    pub layers: BTreeMap<LayerId, Layer>,
    pub export_region: Option<ExportRegion>,
}

pub struct LayerEditor<C: ImageCodec = RustCodec> {
    codec: C,
    config: EditorConfig,
    layers: BTreeMap<LayerId, Layer>,
    export_region: Option<ExportRegion>,
    history: History<EditorSnapshot>,
    next_id: u64,
    next_sequence: u64,
}

impl LayerEditor<RustCodec> {
    /// Editor backed by the pure-Rust codec.
    pub fn with_config(config: EditorConfig) -> Self {
        Self::new(RustCodec::new(), config)
    }
}

impl<C: ImageCodec> LayerEditor<C> {
    pub fn new(codec: C, config: EditorConfig) -> Self {
        let history = History::new(config.history_limit);
        Self {
            codec,
            config,
            layers: BTreeMap::new(),
            export_region: None,
            history,
            next_id: 1,
            next_sequence: 0,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // =========================================================================
    // Structural edits (push history)
    // =========================================================================

    /// Replace the scene with a new base image.
    ///
    /// Decoding happens first; on failure nothing changes. Earlier history is
    /// kept, so undo returns to the previous image.
    pub fn set_base_image(&mut self, bytes: &[u8]) -> Result<LayerId, EditorError> {
        let pixels = self.codec.decode(bytes)?;
        let size = pixels.dimensions();

        let id = self.allocate_id();
        let mut base = Layer::new(id, pixels, self.allocate_sequence());
        base.is_base = true;

        self.layers.clear();
        self.layers.insert(id, base);
        self.export_region = Some(ExportRegion::for_base(size));
        log::debug!("base image {id} loaded at {}x{}", size.width, size.height);
        self.push_history();
        Ok(id)
    }

    /// Add an overlay centered in the scene.
    ///
    /// Returns `Ok(None)` when no base image is loaded; the bytes are not
    /// decoded in that case.
    pub fn add_overlay(&mut self, bytes: &[u8]) -> Result<Option<LayerId>, EditorError> {
        let Some(scene) = self.scene_bounds() else {
            return Ok(None);
        };
        let pixels = self.codec.decode(bytes)?;
        let center = scene.center();
        let position = Point::new(
            center.x - pixels.width() as f64 / 2.0,
            center.y - pixels.height() as f64 / 2.0,
        );

        let id = self.allocate_id();
        let mut overlay = Layer::new(id, pixels, self.allocate_sequence());
        overlay.position = position;
        overlay.z_order = self.config.overlay_z;
        self.layers.insert(id, overlay);
        log::debug!("overlay {id} added at ({:.1}, {:.1})", position.x, position.y);
        self.push_history();
        Ok(Some(id))
    }

    /// Rescale a layer's pixels to exactly `width` x `height`.
    ///
    /// Resizing the base moves the export region with it: each axis scales
    /// by its own factor around the region's center.
    pub fn resize_layer(&mut self, id: LayerId, width: u32, height: u32) -> Result<(), EditorError> {
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidSize { width, height });
        }
        let layer = self.layers.get(&id).ok_or(EditorError::UnknownLayer(id))?;
        let resized = self.codec.resize(&layer.pixels, width, height)?;
        let is_base = layer.is_base;

        if is_base && let Some(region) = self.export_region {
            self.export_region = Some(region.rescaled(Dimensions { width, height }));
        }
        if let Some(layer) = self.layers.get_mut(&id) {
            layer.pixels = resized;
        }
        self.push_history();
        Ok(())
    }

    /// Remove an overlay. The base layer and unknown ids are left alone.
    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        match self.layers.get(&id) {
            Some(layer) if !layer.is_base => {
                self.layers.remove(&id);
                self.push_history();
                true
            }
            _ => false,
        }
    }

    /// Swap draw position with the neighbouring layer.
    ///
    /// The `(z_order, sequence)` pairs are exchanged, so layers sharing a z
    /// value still trade places. Returns false at either end of the stack.
    pub fn reorder_layer(&mut self, id: LayerId, direction: ReorderDirection) -> bool {
        let order: Vec<LayerId> = self.layers().iter().map(|l| l.id).collect();
        let Some(index) = order.iter().position(|&other| other == id) else {
            return false;
        };
        let neighbour = match direction {
            ReorderDirection::Up => order.get(index + 1),
            ReorderDirection::Down => index.checked_sub(1).and_then(|i| order.get(i)),
        };
        let Some(&neighbour) = neighbour else {
            return false;
        };

        let key = |l: &Layer| (l.z_order, l.sequence);
        let (Some(a), Some(b)) = (self.layers.get(&id), self.layers.get(&neighbour)) else {
            return false;
        };
        let (key_a, key_b) = (key(a), key(b));
        for (target, (z, seq)) in [(id, key_b), (neighbour, key_a)] {
            if let Some(layer) = self.layers.get_mut(&target) {
                layer.z_order = z;
                layer.sequence = seq;
            }
        }
        self.push_history();
        true
    }

    /// Record the current state as one undo step.
    ///
    /// Called when a live transform or move ends. Does nothing before a
    /// base image is loaded.
    pub fn commit(&mut self) {
        if self.export_region.is_some() {
            self.push_history();
        }
    }

    // =========================================================================
    // Live edits (no history)
    // =========================================================================

    /// Apply the supplied fields of a transform.
    ///
    /// Scale must be finite and positive; rotation must be finite; opacity is
    /// clamped to `[0, 1]`.
    pub fn transform_layer(&mut self, id: LayerId, transform: LayerTransform) -> Result<(), EditorError> {
        let layer = self.layers.get_mut(&id).ok_or(EditorError::UnknownLayer(id))?;
        if let Some(scale) = transform.scale
            && !(scale.is_finite() && scale > 0.0)
        {
            return Err(EditorError::InvalidTransform(format!("scale {scale}")));
        }
        if let Some(rotation) = transform.rotation_degrees
            && !rotation.is_finite()
        {
            return Err(EditorError::InvalidTransform(format!("rotation {rotation}")));
        }
        if let Some(opacity) = transform.opacity
            && opacity.is_nan()
        {
            return Err(EditorError::InvalidTransform("opacity NaN".into()));
        }

        if let Some(scale) = transform.scale {
            layer.scale = scale;
        }
        if let Some(rotation) = transform.rotation_degrees {
            layer.rotation_degrees = rotation;
        }
        if let Some(opacity) = transform.opacity {
            layer.opacity = opacity.clamp(0.0, 1.0);
        }
        Ok(())
    }

    pub fn move_layer(&mut self, id: LayerId, position: Point) -> Result<(), EditorError> {
        let layer = self.layers.get_mut(&id).ok_or(EditorError::UnknownLayer(id))?;
        layer.position = position;
        Ok(())
    }

    pub fn set_visibility(&mut self, id: LayerId, visible: bool) -> Result<(), EditorError> {
        let layer = self.layers.get_mut(&id).ok_or(EditorError::UnknownLayer(id))?;
        layer.visible = visible;
        Ok(())
    }

    // =========================================================================
    // Undo / redo
    // =========================================================================

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(snapshot);
                log::debug!("undo ({} left)", self.history.len() - 1);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(snapshot);
                log::debug!("redo ({} left)", self.history.redo_len());
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Snapshots on the undo stack, current state included.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn redo_len(&self) -> usize {
        self.history.redo_len()
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Composite every visible layer over the export region at 1:1.
    pub fn render_export_region(&self) -> Result<PixelBuffer, EditorError> {
        let region = self.export_region.ok_or(EditorError::NoBaseImage)?;
        Ok(render::composite(&self.layers(), &region))
    }

    /// Render and encode. Quality falls back to `editor.export_quality`.
    pub fn export(&self, format: ExportFormat, quality: Option<Quality>) -> Result<Vec<u8>, EditorError> {
        let pixels = self.render_export_region()?;
        let quality = quality.unwrap_or_else(|| Quality::new(self.config.export_quality));
        Ok(self.codec.encode(&pixels, format, quality)?)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All layers in draw order (bottom first).
    pub fn layers(&self) -> Vec<&Layer> {
        let mut layers: Vec<&Layer> = self.layers.values().collect();
        layers.sort_by(|a, b| a.stacking_cmp(b));
        layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn base_layer(&self) -> Option<&Layer> {
        self.layers.values().find(|l| l.is_base)
    }

    pub fn export_region(&self) -> Option<Rect> {
        self.export_region.map(|r| r.rect)
    }

    /// Pixel size an export would have right now.
    pub fn export_size(&self) -> Option<(u32, u32)> {
        self.export_region.map(|r| r.output_size())
    }

    pub fn scene_bounds(&self) -> Option<Rect> {
        self.export_region
            .map(|r| r.scene_bounds(self.config.scene_padding))
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            layers: self.layers.clone(),
            export_region: self.export_region,
        }
    }

    fn push_history(&mut self) {
        let snapshot = self.snapshot();
        self.history.push(snapshot);
    }

    fn restore(&mut self, snapshot: EditorSnapshot) {
        self.layers = snapshot.layers;
        self.export_region = snapshot.export_region;
    }

    fn allocate_id(&mut self) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        id
    }

    fn allocate_sequence(&mut self) -> u64 {
        let seq = self.next_sequence;
        self.next_sequence += 1;
        seq
    }
}
