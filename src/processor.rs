// ============================================================================
// IMAGE PROCESSOR — the capability surface plugins call into
// ============================================================================
//
// Pipelines are ordered call sequences against this trait, never against a
// concrete backend. `CpuProcessor` is the in-process backend; tests use a
// recording mock to pin down call order.

use crate::canvas::{CanvasState, ColorMode};
use crate::ops::adjustments::{self, HueChannel};
use crate::ops::effects;
use crate::ops::filters;
use crate::ops::indexed::{self, DitherMode, PaletteKind};
use crate::ops::transform::{self, Interpolation};

/// The processing operations a plugin may request from its host.
///
/// Every call is synchronous and mutates the canvas in place. Errors abort
/// the remaining steps of a pipeline; there is no partial-completion
/// recovery (the host reports the failure and moves on).
pub trait ImageProcessor {
    /// Context state consumed by the next `scale` calls.
    fn set_interpolation(&mut self, interp: Interpolation);

    /// Resize the canvas, placing existing content at the given offset.
    fn resize_canvas(
        &mut self,
        canvas: &mut CanvasState,
        new_w: u32,
        new_h: u32,
        offset_x: i32,
        offset_y: i32,
    ) -> Result<(), String>;

    /// Resample all layers to the new extent with the current interpolation.
    fn scale(&mut self, canvas: &mut CanvasState, new_w: u32, new_h: u32) -> Result<(), String>;

    /// Rank-order filter; percentile 50 is a true median.
    fn median_blur(
        &mut self,
        canvas: &mut CanvasState,
        radius: u32,
        percentile: f32,
    ) -> Result<(), String>;

    /// Separable Gaussian blur with switchable passes.
    fn gaussian_blur(
        &mut self,
        canvas: &mut CanvasState,
        sigma: f32,
        horizontal: bool,
        vertical: bool,
    ) -> Result<(), String>;

    /// Hue/saturation adjustment on a hue channel.
    fn hue_saturation(
        &mut self,
        canvas: &mut CanvasState,
        channel: HueChannel,
        hue_offset: f32,
        lightness: f32,
        saturation: f32,
        overlap: f32,
    ) -> Result<(), String>;

    /// HSV noise in the host's raw 0–255 parameter range.
    fn hsv_noise(
        &mut self,
        canvas: &mut CanvasState,
        holdness: u32,
        hue: u8,
        saturation: u8,
        value: u8,
    ) -> Result<(), String>;

    /// Convert the canvas to indexed mode.
    fn convert_indexed(
        &mut self,
        canvas: &mut CanvasState,
        dither: DitherMode,
        palette: PaletteKind,
    ) -> Result<(), String>;

    /// Refresh any open view of the canvas.
    fn flush_display(&mut self, canvas: &mut CanvasState) -> Result<(), String>;
}

/// In-process CPU backend over the ops modules.
pub struct CpuProcessor {
    interpolation: Interpolation,
    seed: u32,
}

impl CpuProcessor {
    pub fn new() -> Self {
        // Non-reproducible by default, like the host's noise plugins; batch
        // runs pass an explicit seed through `with_seed`.
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        Self::with_seed(seed)
    }

    pub fn with_seed(seed: u32) -> Self {
        Self {
            interpolation: Interpolation::default(),
            seed,
        }
    }

    /// Filters and adjustments refuse to run on indexed canvases, matching
    /// the host's "RGB*, GRAY*" restriction on its filter plugins.
    fn require_filterable(&self, canvas: &CanvasState, op: &str) -> Result<(), String> {
        match canvas.mode {
            ColorMode::Indexed { .. } => {
                Err(format!("{}: not available on indexed images", op))
            }
            _ => Ok(()),
        }
    }
}

impl Default for CpuProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProcessor for CpuProcessor {
    fn set_interpolation(&mut self, interp: Interpolation) {
        self.interpolation = interp;
    }

    fn resize_canvas(
        &mut self,
        canvas: &mut CanvasState,
        new_w: u32,
        new_h: u32,
        offset_x: i32,
        offset_y: i32,
    ) -> Result<(), String> {
        if new_w == 0 || new_h == 0 {
            return Err(format!("resize_canvas: invalid extent {}x{}", new_w, new_h));
        }
        transform::resize_canvas(canvas, new_w, new_h, offset_x, offset_y);
        Ok(())
    }

    fn scale(&mut self, canvas: &mut CanvasState, new_w: u32, new_h: u32) -> Result<(), String> {
        if new_w == 0 || new_h == 0 {
            return Err(format!("scale: invalid extent {}x{}", new_w, new_h));
        }
        transform::scale_image(canvas, new_w, new_h, self.interpolation);
        Ok(())
    }

    fn median_blur(
        &mut self,
        canvas: &mut CanvasState,
        radius: u32,
        percentile: f32,
    ) -> Result<(), String> {
        self.require_filterable(canvas, "median_blur")?;
        let layer = canvas.active_layer_mut();
        layer.pixels = filters::percentile_filter_core(&layer.pixels, radius, percentile);
        canvas.mark_dirty();
        Ok(())
    }

    fn gaussian_blur(
        &mut self,
        canvas: &mut CanvasState,
        sigma: f32,
        horizontal: bool,
        vertical: bool,
    ) -> Result<(), String> {
        self.require_filterable(canvas, "gaussian_blur")?;
        let layer = canvas.active_layer_mut();
        layer.pixels = filters::gaussian_blur_core(&layer.pixels, sigma, horizontal, vertical);
        canvas.mark_dirty();
        Ok(())
    }

    fn hue_saturation(
        &mut self,
        canvas: &mut CanvasState,
        channel: HueChannel,
        hue_offset: f32,
        lightness: f32,
        saturation: f32,
        overlap: f32,
    ) -> Result<(), String> {
        self.require_filterable(canvas, "hue_saturation")?;
        let layer = canvas.active_layer_mut();
        layer.pixels = adjustments::hue_saturation_core(
            &layer.pixels,
            channel,
            hue_offset,
            lightness,
            saturation,
            overlap,
        );
        canvas.mark_dirty();
        Ok(())
    }

    fn hsv_noise(
        &mut self,
        canvas: &mut CanvasState,
        holdness: u32,
        hue: u8,
        saturation: u8,
        value: u8,
    ) -> Result<(), String> {
        self.require_filterable(canvas, "hsv_noise")?;
        let seed = self.seed;
        let layer = canvas.active_layer_mut();
        layer.pixels =
            effects::hsv_noise_core(&layer.pixels, holdness, hue, saturation, value, seed);
        canvas.mark_dirty();
        Ok(())
    }

    fn convert_indexed(
        &mut self,
        canvas: &mut CanvasState,
        dither: DitherMode,
        palette: PaletteKind,
    ) -> Result<(), String> {
        if matches!(canvas.mode, ColorMode::Indexed { .. }) {
            return Err("convert_indexed: image is already indexed".to_string());
        }
        let pal = indexed::build_palette(&canvas.active_layer().pixels, &palette);
        for layer in &mut canvas.layers {
            layer.pixels = indexed::convert_indexed_core(&layer.pixels, dither, &pal);
        }
        canvas.mode = ColorMode::Indexed { palette: pal };
        canvas.mark_dirty();
        Ok(())
    }

    fn flush_display(&mut self, canvas: &mut CanvasState) -> Result<(), String> {
        // Headless host: there is no window to repaint, only the dirty flag
        // to clear and the session log to note.
        crate::log_info!(
            "display flush: {}x{} {}",
            canvas.width,
            canvas.height,
            canvas.mode.base_name()
        );
        canvas.dirty = false;
        Ok(())
    }
}
