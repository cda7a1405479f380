// End-to-end coverage for the two texture normalizers: exact call sequences
// against a recording processor, and real output properties through the CPU
// backend.

use image::{Rgba, RgbaImage};

use texnorm::canvas::{CanvasState, ColorMode};
use texnorm::host::Registry;
use texnorm::ops::adjustments::HueChannel;
use texnorm::ops::indexed::{DitherMode, PaletteKind};
use texnorm::ops::transform::Interpolation;
use texnorm::processor::{CpuProcessor, ImageProcessor};

// ============================================================================
// Recording processor — pins down the order and arguments of every host call
// ============================================================================

#[derive(Default)]
struct RecordingProcessor {
    calls: Vec<String>,
}

impl RecordingProcessor {
    /// Replace every layer buffer and the canvas extent, so the pipelines'
    /// reads of layer width/height see realistic values.
    fn set_extent(&self, canvas: &mut CanvasState, w: u32, h: u32) {
        for layer in &mut canvas.layers {
            layer.pixels = RgbaImage::new(w, h);
        }
        canvas.width = w;
        canvas.height = h;
    }
}

impl ImageProcessor for RecordingProcessor {
    fn set_interpolation(&mut self, interp: Interpolation) {
        self.calls.push(format!("set_interpolation({})", interp.label()));
    }

    fn resize_canvas(
        &mut self,
        canvas: &mut CanvasState,
        new_w: u32,
        new_h: u32,
        offset_x: i32,
        offset_y: i32,
    ) -> Result<(), String> {
        self.calls.push(format!(
            "resize_canvas({}, {}, {}, {})",
            new_w, new_h, offset_x, offset_y
        ));
        self.set_extent(canvas, new_w, new_h);
        Ok(())
    }

    fn scale(&mut self, canvas: &mut CanvasState, new_w: u32, new_h: u32) -> Result<(), String> {
        self.calls.push(format!("scale({}, {})", new_w, new_h));
        self.set_extent(canvas, new_w, new_h);
        Ok(())
    }

    fn median_blur(
        &mut self,
        _canvas: &mut CanvasState,
        radius: u32,
        percentile: f32,
    ) -> Result<(), String> {
        self.calls.push(format!("median_blur({}, {})", radius, percentile));
        Ok(())
    }

    fn gaussian_blur(
        &mut self,
        _canvas: &mut CanvasState,
        sigma: f32,
        horizontal: bool,
        vertical: bool,
    ) -> Result<(), String> {
        self.calls
            .push(format!("gaussian_blur({}, {}, {})", sigma, horizontal, vertical));
        Ok(())
    }

    fn hue_saturation(
        &mut self,
        _canvas: &mut CanvasState,
        channel: HueChannel,
        hue_offset: f32,
        lightness: f32,
        saturation: f32,
        overlap: f32,
    ) -> Result<(), String> {
        self.calls.push(format!(
            "hue_saturation({:?}, {}, {}, {}, {})",
            channel, hue_offset, lightness, saturation, overlap
        ));
        Ok(())
    }

    fn hsv_noise(
        &mut self,
        _canvas: &mut CanvasState,
        holdness: u32,
        hue: u8,
        saturation: u8,
        value: u8,
    ) -> Result<(), String> {
        self.calls.push(format!(
            "hsv_noise({}, {}, {}, {})",
            holdness, hue, saturation, value
        ));
        Ok(())
    }

    fn convert_indexed(
        &mut self,
        canvas: &mut CanvasState,
        dither: DitherMode,
        palette: PaletteKind,
    ) -> Result<(), String> {
        self.calls
            .push(format!("convert_indexed({:?}, {:?})", dither, palette));
        canvas.mode = ColorMode::Indexed { palette: vec![] };
        Ok(())
    }

    fn flush_display(&mut self, _canvas: &mut CanvasState) -> Result<(), String> {
        self.calls.push("flush_display".to_string());
        Ok(())
    }
}

fn gradient_canvas(w: u32, h: u32) -> CanvasState {
    let mut img = RgbaImage::new(w, h);
    for (x, y, p) in img.enumerate_pixels_mut() {
        *p = Rgba([
            (x * 255 / w.max(1)) as u8,
            (y * 255 / h.max(1)) as u8,
            ((x + y) % 256) as u8,
            255,
        ]);
    }
    CanvasState::from_rgba_image(img, "texture", ColorMode::Rgb)
}

// ============================================================================
// Call-sequence tests
// ============================================================================

#[test]
fn blurry_issues_the_exact_host_call_sequence() {
    let registry = Registry::with_builtins();
    let mut canvas = gradient_canvas(300, 200);
    let mut proc = RecordingProcessor::default();

    registry
        .dispatch("blurry-texture-process", &mut canvas, &mut proc)
        .unwrap();

    assert_eq!(
        proc.calls,
        vec![
            // max(300, 200) = 300; offsets ((300-300)/2, (300-200)/2)
            "resize_canvas(300, 300, 0, 50)",
            "set_interpolation(cubic)",
            "scale(128, 128)",
            "median_blur(1, 50)",
            "gaussian_blur(1.5, true, true)",
            "hue_saturation(All, 0, 0, 25, 0)",
            // layer extent equals canvas extent at this point: no-op re-crop
            "resize_canvas(128, 128, 0, 0)",
            "flush_display",
        ]
    );
}

#[test]
fn crunchy_issues_the_exact_host_call_sequence() {
    let registry = Registry::with_builtins();
    let mut canvas = gradient_canvas(300, 200);
    let mut proc = RecordingProcessor::default();

    registry
        .dispatch("crunchy-texture-process", &mut canvas, &mut proc)
        .unwrap();

    assert_eq!(
        proc.calls,
        vec![
            "resize_canvas(300, 300, 0, 50)",
            "set_interpolation(cubic)",
            "scale(512, 512)",
            "set_interpolation(none)",
            "scale(256, 256)",
            "hsv_noise(8, 0, 255, 76)",
            "convert_indexed(None, WebSafe)",
            "resize_canvas(256, 256, 0, 0)",
            "flush_display",
        ]
    );
}

#[test]
fn tall_input_pads_along_x() {
    let registry = Registry::with_builtins();
    let mut canvas = gradient_canvas(200, 300);
    let mut proc = RecordingProcessor::default();

    registry
        .dispatch("blurry-texture-process", &mut canvas, &mut proc)
        .unwrap();
    assert_eq!(proc.calls[0], "resize_canvas(300, 300, 50, 0)");
}

// ============================================================================
// Real-output tests (CPU backend)
// ============================================================================

#[test]
fn blurry_produces_a_128px_rgb_tile() {
    let registry = Registry::with_builtins();
    let mut canvas = gradient_canvas(300, 200);
    let mut proc = CpuProcessor::with_seed(0);

    registry
        .dispatch("blurry-texture-process", &mut canvas, &mut proc)
        .unwrap();

    assert_eq!((canvas.width, canvas.height), (128, 128));
    assert_eq!(canvas.active_layer().width(), 128);
    assert_eq!(canvas.active_layer().height(), 128);
    assert_eq!(canvas.mode, ColorMode::Rgb);
    // Display was flushed at the end of the pipeline.
    assert!(!canvas.dirty);
}

#[test]
fn crunchy_produces_a_256px_web_indexed_tile() {
    let registry = Registry::with_builtins();
    let mut canvas = gradient_canvas(300, 200);
    let mut proc = CpuProcessor::with_seed(0);

    registry
        .dispatch("crunchy-texture-process", &mut canvas, &mut proc)
        .unwrap();

    assert_eq!((canvas.width, canvas.height), (256, 256));
    let ColorMode::Indexed { palette } = &canvas.mode else {
        panic!("crunchy output must be indexed, got {:?}", canvas.mode);
    };
    assert_eq!(palette.len(), 216);

    // Every output pixel sits exactly on the web-safe palette.
    for p in canvas.active_layer().pixels.pixels() {
        assert!(palette.contains(&[p[0], p[1], p[2]]));
    }
}

#[test]
fn crunchy_noise_depends_on_the_seed() {
    let registry = Registry::with_builtins();

    let run = |seed: u32| {
        let mut canvas = gradient_canvas(64, 64);
        let mut proc = CpuProcessor::with_seed(seed);
        registry
            .dispatch("crunchy-texture-process", &mut canvas, &mut proc)
            .unwrap();
        canvas.active_layer().pixels.clone()
    };

    assert_eq!(run(7), run(7), "same seed must reproduce the output");
    assert_ne!(run(7), run(8), "different seeds must speckle differently");
}

#[test]
fn pipelines_are_not_idempotent() {
    // Re-running blurry on its own output keeps degrading it.
    let registry = Registry::with_builtins();
    let mut canvas = gradient_canvas(300, 200);
    let mut proc = CpuProcessor::with_seed(0);

    registry
        .dispatch("blurry-texture-process", &mut canvas, &mut proc)
        .unwrap();
    let first = canvas.active_layer().pixels.clone();

    registry
        .dispatch("blurry-texture-process", &mut canvas, &mut proc)
        .unwrap();
    let second = canvas.active_layer().pixels.clone();

    assert_eq!(second.dimensions(), (128, 128));
    assert_ne!(first, second);
}

#[test]
fn square_input_needs_no_padding() {
    let registry = Registry::with_builtins();
    let mut canvas = gradient_canvas(256, 256);
    let mut proc = RecordingProcessor::default();

    registry
        .dispatch("blurry-texture-process", &mut canvas, &mut proc)
        .unwrap();
    assert_eq!(proc.calls[0], "resize_canvas(256, 256, 0, 0)");
}
