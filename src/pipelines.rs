// ============================================================================
// TEXTURE NORMALIZERS — the two built-in pipelines
// ============================================================================
//
// Each normalizer is a straight-line sequence of processor calls: pad the
// image to a square, shrink it, degrade it, re-crop, flush. No branching and
// no recovery — a failed step aborts the rest via `?`.

use crate::canvas::CanvasState;
use crate::host::{PluginSpec, Registry};
use crate::ops::adjustments::HueChannel;
use crate::ops::indexed::{DitherMode, PaletteKind};
use crate::ops::transform::Interpolation;
use crate::processor::ImageProcessor;

/// Register both normalizers with the host.
pub fn register_builtins(registry: &mut Registry) {
    registry.register(
        PluginSpec {
            name: "blurry-texture-process",
            blurb: "Normalize a texture into a small, soft, saturated tile",
            help: "Pads the image to a square, downsamples to 128x128 with cubic \
                   interpolation, applies a median and a Gaussian blur, boosts \
                   saturation, and re-crops to the processed layer's extent.",
            author: "texnorm",
            license: "MIT",
            date: "2025",
            menu_path: "<Image>/Filters/Custom/Blurry Texture Process",
            image_types: "RGB*, GRAY*",
            params: &[],
            returns: &[],
        },
        blurry_texture_process,
    );
    registry.register(
        PluginSpec {
            name: "crunchy-texture-process",
            blurb: "Normalize a texture into a blocky, noisy, web-palette tile",
            help: "Pads the image to a square, downsamples to 512x512 with cubic \
                   interpolation and again to 256x256 with nearest-neighbor for \
                   blocky artifacts, adds HSV noise, and converts to an indexed \
                   web-safe palette.",
            author: "texnorm",
            license: "MIT",
            date: "2025",
            menu_path: "<Image>/Filters/Custom/Crunchy Texture Process",
            image_types: "RGB*, GRAY*",
            params: &[],
            returns: &[],
        },
        crunchy_texture_process,
    );
}

/// Floor division, matching the original host scripts' `//` semantics.
/// Differences here can be negative when the final resize crops.
fn floor_div(a: i32, b: i32) -> i32 {
    a.div_euclid(b)
}

/// Pad or crop the canvas to `size × size`, centering the current content.
fn pad_to_square(canvas: &mut CanvasState, proc: &mut dyn ImageProcessor) -> Result<(), String> {
    let (w, h) = (canvas.width, canvas.height);
    let new_size = w.max(h);
    proc.resize_canvas(
        canvas,
        new_size,
        new_size,
        floor_div((new_size - w) as i32, 2),
        floor_div((new_size - h) as i32, 2),
    )
}

/// Resize the canvas to the active layer's extent, centering the canvas
/// content within it. Removes any padding left over from non-square scaling.
fn crop_to_layer(canvas: &mut CanvasState, proc: &mut dyn ImageProcessor) -> Result<(), String> {
    let layer_w = canvas.active_layer().width();
    let layer_h = canvas.active_layer().height();
    let offset_x = floor_div(layer_w as i32 - canvas.width as i32, 2);
    let offset_y = floor_div(layer_h as i32 - canvas.height as i32, 2);
    proc.resize_canvas(canvas, layer_w, layer_h, offset_x, offset_y)
}

/// Texture Normalizer A ("blurry"): 128×128, softened, extra saturation.
pub fn blurry_texture_process(
    canvas: &mut CanvasState,
    proc: &mut dyn ImageProcessor,
) -> Result<(), String> {
    pad_to_square(canvas, proc)?;

    proc.set_interpolation(Interpolation::Cubic);
    proc.scale(canvas, 128, 128)?;

    proc.median_blur(canvas, 1, 50.0)?;
    proc.gaussian_blur(canvas, 1.5, true, true)?;
    proc.hue_saturation(canvas, HueChannel::All, 0.0, 0.0, 25.0, 0.0)?;

    crop_to_layer(canvas, proc)?;
    proc.flush_display(canvas)
}

/// Texture Normalizer B ("crunchy"): 256×256, blocky, noisy, web palette.
pub fn crunchy_texture_process(
    canvas: &mut CanvasState,
    proc: &mut dyn ImageProcessor,
) -> Result<(), String> {
    pad_to_square(canvas, proc)?;

    proc.set_interpolation(Interpolation::Cubic);
    proc.scale(canvas, 512, 512)?;

    // Downsampling twice with different filters is deliberate: the nearest
    // pass over the cubic result produces the blocky pixelation.
    proc.set_interpolation(Interpolation::Nearest);
    proc.scale(canvas, 256, 256)?;

    // Raw host parameter range (holdness 8; hue 0, saturation 255, value 76,
    // i.e. conceptually saturation 1.0 and value 0.3 of full range).
    proc.hsv_noise(canvas, 8, 0, 255, 76)?;

    proc.convert_indexed(canvas, DitherMode::None, PaletteKind::WebSafe)?;

    crop_to_layer(canvas, proc)?;
    proc.flush_display(canvas)
}
