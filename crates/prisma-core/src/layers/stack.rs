//! Layers and the ordered layer stack.
//!
//! Layers live in an arena keyed by [`LayerId`]; a separate order vector
//! holds the bottom-to-top sequence, so deleting or duplicating a layer
//! never invalidates another layer's id.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::image::PixelBuffer;
use crate::layers::blend::BlendMode;
use crate::layers::composite::composite;
use crate::layers::mask::Mask;

/// Longest layer name kept, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// Name used when sanitizing leaves nothing.
pub const DEFAULT_LAYER_NAME: &str = "Untitled layer";

/// Stable handle to a layer in a [`LayerStack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// One layer: a buffer plus how it is blended.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    name: String,
    visible: bool,
    opacity: f32,
    blend_mode: BlendMode,
    buffer: PixelBuffer,
    mask: Option<Mask>,
}

impl Layer {
    /// Visible, fully opaque, normal-blend layer.
    pub fn new(name: impl AsRef<str>, buffer: PixelBuffer) -> Self {
        Self {
            name: sanitize_name(name.as_ref()),
            visible: true,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            buffer,
            mask: None,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.set_opacity(opacity);
        self
    }

    pub fn with_blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    pub fn with_mask(mut self, mask: Mask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn mask(&self) -> Option<&Mask> {
        self.mask.as_ref()
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Clamped to `[0, 1]`; NaN becomes `0`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_nan() {
            0.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    pub fn set_mask(&mut self, mask: Option<Mask>) {
        self.mask = mask;
    }

    pub fn rename(&mut self, name: &str) {
        self.name = sanitize_name(name);
    }

    /// Take the pixel buffer out, consuming the layer.
    pub fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }
}

/// Strip `< > " ' &` and cut to [`MAX_NAME_LEN`] characters.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\'' | '&'))
        .take(MAX_NAME_LEN)
        .collect();
    if cleaned.is_empty() {
        DEFAULT_LAYER_NAME.to_string()
    } else {
        cleaned
    }
}

/// Ordered set of same-sized layers.
#[derive(Debug, Clone)]
pub struct LayerStack {
    width: u32,
    height: u32,
    next_id: u64,
    layers: BTreeMap<LayerId, Layer>,
    order: Vec<LayerId>,
}

impl LayerStack {
    /// Empty stack for a `width × height` canvas.
    pub fn new(width: u32, height: u32) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::invalid(format!(
                "canvas dimensions must be positive, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            next_id: 1,
            layers: BTreeMap::new(),
            order: Vec::new(),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids bottom to top.
    pub fn ids(&self) -> &[LayerId] {
        &self.order
    }

    /// Layers bottom to top.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.order.iter().filter_map(|id| self.layers.get(id))
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    /// Position of `id` in the stack, `0` being the bottom.
    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.order.iter().position(|&l| l == id)
    }

    /// Push a layer on top.
    pub fn add_layer(&mut self, layer: Layer) -> Result<LayerId, EngineError> {
        self.check_size(layer.buffer.dimensions())?;
        if let Some(mask) = &layer.mask {
            self.check_size(mask.dimensions())?;
        }
        let id = self.allocate_id();
        debug!(%id, name = layer.name(), "layer added");
        self.layers.insert(id, layer);
        self.order.push(id);
        Ok(id)
    }

    /// Remove a layer and hand it back.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<Layer, EngineError> {
        let layer = self.layers.remove(&id).ok_or_else(|| missing(id))?;
        self.order.retain(|&l| l != id);
        debug!(%id, "layer removed");
        Ok(layer)
    }

    /// Copy a layer and insert the copy directly above it.
    ///
    /// The copy's name gets a ` copy` suffix.
    pub fn duplicate_layer(&mut self, id: LayerId) -> Result<LayerId, EngineError> {
        let index = self.index_of(id).ok_or_else(|| missing(id))?;
        let mut copy = self.get(id)?.clone();
        copy.name = sanitize_name(&format!("{} copy", copy.name));
        let new_id = self.allocate_id();
        self.layers.insert(new_id, copy);
        self.order.insert(index + 1, new_id);
        debug!(source = %id, copy = %new_id, "layer duplicated");
        Ok(new_id)
    }

    /// Move a layer to `index` (clamped to the top).
    pub fn move_layer(&mut self, id: LayerId, index: usize) -> Result<(), EngineError> {
        let from = self.index_of(id).ok_or_else(|| missing(id))?;
        self.order.remove(from);
        let to = index.min(self.order.len());
        self.order.insert(to, id);
        Ok(())
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> Result<(), EngineError> {
        self.get_mut(id)?.set_visible(visible);
        Ok(())
    }

    /// Clamped to `[0, 1]`. Non-finite values are rejected.
    pub fn set_opacity(&mut self, id: LayerId, opacity: f32) -> Result<(), EngineError> {
        if !opacity.is_finite() {
            return Err(EngineError::invalid(format!(
                "opacity must be finite, got {opacity}"
            )));
        }
        self.get_mut(id)?.set_opacity(opacity);
        Ok(())
    }

    pub fn set_blend_mode(&mut self, id: LayerId, mode: BlendMode) -> Result<(), EngineError> {
        self.get_mut(id)?.set_blend_mode(mode);
        Ok(())
    }

    /// Attach a mask. It must match the canvas size.
    pub fn set_mask(&mut self, id: LayerId, mask: Mask) -> Result<(), EngineError> {
        self.check_size(mask.dimensions())?;
        self.get_mut(id)?.set_mask(Some(mask));
        Ok(())
    }

    pub fn clear_mask(&mut self, id: LayerId) -> Result<Option<Mask>, EngineError> {
        Ok(self.get_mut(id)?.mask.take())
    }

    pub fn rename(&mut self, id: LayerId, name: &str) -> Result<(), EngineError> {
        self.get_mut(id)?.rename(name);
        Ok(())
    }

    /// Swap in new pixels, e.g. a graded result. Returns the old buffer.
    pub fn replace_buffer(
        &mut self,
        id: LayerId,
        buffer: PixelBuffer,
    ) -> Result<PixelBuffer, EngineError> {
        self.check_size(buffer.dimensions())?;
        let layer = self.get_mut(id)?;
        Ok(std::mem::replace(&mut layer.buffer, buffer))
    }

    /// Flatten every visible layer into one buffer.
    pub fn composite(&self) -> Result<PixelBuffer, EngineError> {
        composite(self.width, self.height, self.layers())
    }

    fn get(&self, id: LayerId) -> Result<&Layer, EngineError> {
        self.layers.get(&id).ok_or_else(|| missing(id))
    }

    fn get_mut(&mut self, id: LayerId) -> Result<&mut Layer, EngineError> {
        self.layers.get_mut(&id).ok_or_else(|| missing(id))
    }

    fn check_size(&self, actual: (u32, u32)) -> Result<(), EngineError> {
        let expected = self.dimensions();
        if actual == expected {
            Ok(())
        } else {
            Err(EngineError::dimensions(expected, actual))
        }
    }

    fn allocate_id(&mut self) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        id
    }
}

fn missing(id: LayerId) -> EngineError {
    EngineError::invalid(format!("no such layer: {id}"))
}
