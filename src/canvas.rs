// ============================================================================
// CANVAS STATE — the host-owned image being processed
// ============================================================================
//
// A canvas is what a plugin receives when it is dispatched: a stack of RGBA
// layers plus the canvas extent. Every operation mutates it in place; plugins
// never create or destroy canvases themselves.
//
// The canvas extent and a layer's extent can disagree during the intermediate
// stages of a pipeline (after a canvas resize that crops, for example). The
// normalizer pipelines rely on this: they finish by re-cropping the canvas to
// the active layer's extent.

use image::{Rgba, RgbaImage};

/// Color mode of the canvas. Filters require `Rgb` or `Grayscale`; palette
/// conversion moves a canvas to `Indexed` (a one-way trip for a pipeline run).
#[derive(Clone, Debug, PartialEq)]
pub enum ColorMode {
    Rgb,
    Grayscale,
    Indexed { palette: Vec<[u8; 3]> },
}

impl ColorMode {
    /// Base type name as used in plugin image-type filter strings.
    pub fn base_name(&self) -> &'static str {
        match self {
            ColorMode::Rgb => "RGB",
            ColorMode::Grayscale => "GRAY",
            ColorMode::Indexed { .. } => "INDEXED",
        }
    }
}

/// A single paintable surface. Pixels are always stored as straight RGBA
/// regardless of the canvas color mode; `Grayscale` and `Indexed` are tags
/// plus (for indexed) a palette the pixels have already been mapped onto.
#[derive(Clone, Debug)]
pub struct Layer {
    pub name: String,
    pub pixels: RgbaImage,
}

impl Layer {
    pub fn new(name: String, width: u32, height: u32, fill: Rgba<u8>) -> Self {
        Self {
            name,
            pixels: RgbaImage::from_pixel(width, height, fill),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// The image a plugin operates on.
#[derive(Clone, Debug)]
pub struct CanvasState {
    pub layers: Vec<Layer>,
    pub active_layer_index: usize,
    pub width: u32,
    pub height: u32,
    pub mode: ColorMode,
    /// Set by every mutating operation, cleared by a display flush.
    pub dirty: bool,
}

impl CanvasState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            layers: vec![Layer::new(
                "Background".to_string(),
                width,
                height,
                Rgba([0, 0, 0, 0]),
            )],
            active_layer_index: 0,
            width,
            height,
            mode: ColorMode::Rgb,
            dirty: false,
        }
    }

    /// Wrap a decoded image as a single-layer canvas.
    pub fn from_rgba_image(img: RgbaImage, name: &str, mode: ColorMode) -> Self {
        let (width, height) = (img.width(), img.height());
        Self {
            layers: vec![Layer {
                name: name.to_string(),
                pixels: img,
            }],
            active_layer_index: 0,
            width,
            height,
            mode,
            dirty: false,
        }
    }

    pub fn active_layer(&self) -> &Layer {
        &self.layers[self.active_layer_index]
    }

    pub fn active_layer_mut(&mut self) -> &mut Layer {
        &mut self.layers[self.active_layer_index]
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_image_takes_dimensions_from_the_buffer() {
        let img = RgbaImage::new(300, 200);
        let canvas = CanvasState::from_rgba_image(img, "brick", ColorMode::Rgb);
        assert_eq!((canvas.width, canvas.height), (300, 200));
        assert_eq!(canvas.layers.len(), 1);
        assert_eq!(canvas.active_layer().width(), 300);
        assert!(!canvas.dirty);
    }

    #[test]
    fn base_names_match_filter_string_tokens() {
        assert_eq!(ColorMode::Rgb.base_name(), "RGB");
        assert_eq!(ColorMode::Grayscale.base_name(), "GRAY");
        assert_eq!(
            ColorMode::Indexed { palette: vec![] }.base_name(),
            "INDEXED"
        );
    }
}
