// ============================================================================
// TRANSFORM OPERATIONS — canvas resize (pad/crop) and whole-image scaling
// ============================================================================

use crate::canvas::CanvasState;
use image::{Rgba, RgbaImage, imageops};

/// Interpolation method for scale operations. This is context state on the
/// processor: `set_interpolation` chooses it, `scale` consumes it.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Interpolation {
    /// "None" in the host's terms — picks the single nearest source pixel.
    Nearest,
    #[default]
    Bilinear,
    Cubic,
    Lanczos3,
}

impl Interpolation {
    pub fn label(&self) -> &'static str {
        match self {
            Interpolation::Nearest  => "none",
            Interpolation::Bilinear => "linear",
            Interpolation::Cubic    => "cubic",
            Interpolation::Lanczos3 => "lanczos3",
        }
    }

    pub fn to_filter(&self) -> imageops::FilterType {
        match self {
            Interpolation::Nearest  => imageops::FilterType::Nearest,
            Interpolation::Bilinear => imageops::FilterType::Triangle,
            Interpolation::Cubic    => imageops::FilterType::CatmullRom,
            Interpolation::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Resize the canvas to `new_w × new_h`, placing the existing content of every
/// layer at `(offset_x, offset_y)` in the new canvas. Offsets may be negative
/// (cropping); uncovered space is filled with transparent black.
///
/// This is the one primitive both normalizers use twice: once to pad the image
/// to a square, and once at the end to re-crop the canvas to the processed
/// layer's extent.
pub fn resize_canvas(
    state: &mut CanvasState,
    new_w: u32,
    new_h: u32,
    offset_x: i32,
    offset_y: i32,
) {
    for layer in &mut state.layers {
        let old = &layer.pixels;
        let mut new_img = RgbaImage::from_pixel(new_w, new_h, Rgba([0, 0, 0, 0]));

        for y in 0..old.height() {
            for x in 0..old.width() {
                let nx = x as i32 + offset_x;
                let ny = y as i32 + offset_y;
                if nx >= 0 && ny >= 0 && (nx as u32) < new_w && (ny as u32) < new_h {
                    new_img.put_pixel(nx as u32, ny as u32, *old.get_pixel(x, y));
                }
            }
        }
        layer.pixels = new_img;
    }
    state.width = new_w;
    state.height = new_h;
    state.mark_dirty();
}

/// Scale the entire image (all layers) to new dimensions with the given
/// interpolation. Layer and canvas extents both become `new_w × new_h`.
pub fn scale_image(state: &mut CanvasState, new_w: u32, new_h: u32, interp: Interpolation) {
    let filter = interp.to_filter();
    for layer in &mut state.layers {
        layer.pixels = imageops::resize(&layer.pixels, new_w, new_h, filter);
    }
    state.width = new_w;
    state.height = new_h;
    state.mark_dirty();
}
