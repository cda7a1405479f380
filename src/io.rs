// ============================================================================
// FILE I/O — load images into canvases, encode results back out
// ============================================================================

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tga::TgaEncoder;
use image::{DynamicImage, RgbaImage};

use crate::canvas::{CanvasState, ColorMode};
use crate::ops::indexed::nearest_index;

/// Output file format.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Webp,
    Bmp,
    Tga,
    Tiff,
    Gif,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png  => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Webp => "webp",
            SaveFormat::Bmp  => "bmp",
            SaveFormat::Tga  => "tga",
            SaveFormat::Tiff => "tiff",
            SaveFormat::Gif  => "gif",
        }
    }
}

/// Load an image file as a single-layer canvas. Grayscale sources keep their
/// `GRAY` tag (the plugin filter strings care); pixels are RGBA either way.
pub fn load_image_sync(path: &Path) -> Result<CanvasState, String> {
    let decoded = image::open(path).map_err(|e| e.to_string())?;

    let mode = match &decoded {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => ColorMode::Grayscale,
        _ => ColorMode::Rgb,
    };

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Background")
        .to_string();

    Ok(CanvasState::from_rgba_image(decoded.to_rgba8(), &name, mode))
}

/// Encode the active layer of a canvas and write it to `path`.
///
/// Indexed canvases keep their palette when the target is GIF; every other
/// format receives the already-palette-mapped RGBA pixels.
pub fn encode_and_write(
    canvas: &CanvasState,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), String> {
    let image = &canvas.active_layer().pixels;

    if format == SaveFormat::Gif {
        return encode_gif(canvas, path);
    }

    let file = File::create(path).map_err(|e| format!("create '{}': {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);

    match format {
        SaveFormat::Png => {
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder
                .encode(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ColorType::Rgba8,
                )
                .map_err(|e| e.to_string())?;
        }
        SaveFormat::Jpeg => {
            // JPEG has no alpha channel; drop it.
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            encoder
                .encode(
                    rgb_image.as_raw(),
                    rgb_image.width(),
                    rgb_image.height(),
                    image::ColorType::Rgb8,
                )
                .map_err(|e| e.to_string())?;
        }
        SaveFormat::Webp => {
            DynamicImage::ImageRgba8(image.clone())
                .save(path)
                .map_err(|e| e.to_string())?;
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder
                .encode(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ColorType::Rgba8,
                )
                .map_err(|e| e.to_string())?;
        }
        SaveFormat::Tga => {
            let encoder = TgaEncoder::new(&mut writer);
            encoder
                .encode(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ColorType::Rgba8,
                )
                .map_err(|e| e.to_string())?;
        }
        SaveFormat::Tiff => {
            DynamicImage::ImageRgba8(image.clone())
                .write_to(&mut writer, image::ImageOutputFormat::Tiff)
                .map_err(|e| e.to_string())?;
        }
        SaveFormat::Gif => unreachable!("GIF handled above"),
    }

    Ok(())
}

/// Write a single-frame GIF. An indexed canvas contributes its palette
/// directly; anything else is quantized to 256 colors first.
fn encode_gif(canvas: &CanvasState, path: &Path) -> Result<(), String> {
    let image = &canvas.active_layer().pixels;
    if image.width() > u16::MAX as u32 || image.height() > u16::MAX as u32 {
        return Err("image dimensions exceed GIF maximum (65535x65535)".to_string());
    }
    let (w, h) = (image.width() as u16, image.height() as u16);

    let (palette_flat, indices) = match &canvas.mode {
        ColorMode::Indexed { palette } => {
            // Pixels are already mapped onto the palette; recover indices.
            let flat: Vec<u8> = palette.iter().flat_map(|c| *c).collect();
            let indices: Vec<u8> = image
                .pixels()
                .map(|p| nearest_index(palette, p[0], p[1], p[2]) as u8)
                .collect();
            (flat, indices)
        }
        _ => quantize_rgba(image, 256),
    };

    let file =
        File::create(path).map_err(|e| format!("create '{}': {}", path.display(), e))?;
    let mut encoder = gif::Encoder::new(BufWriter::new(file), w, h, &palette_flat)
        .map_err(|e| format!("GIF encoder init error: {}", e))?;

    let frame = gif::Frame {
        width: w,
        height: h,
        buffer: std::borrow::Cow::Borrowed(&indices),
        ..Default::default()
    };
    encoder
        .write_frame(&frame)
        .map_err(|e| format!("GIF write error: {}", e))?;

    Ok(())
}

/// Quantize an RGBA image to at most `max_colors` colors. Returns the flat
/// RGB palette and one palette index per pixel.
fn quantize_rgba(image: &RgbaImage, max_colors: usize) -> (Vec<u8>, Vec<u8>) {
    let pixels: Vec<u8> = image
        .pixels()
        .flat_map(|p| [p[0], p[1], p[2], p[3]])
        .collect();

    let nq = color_quant::NeuQuant::new(10, max_colors, &pixels);

    let mut palette = Vec::with_capacity(max_colors * 3);
    for i in 0..max_colors {
        if let Some(color) = nq.lookup(i) {
            palette.extend_from_slice(&color[..3]);
        } else {
            palette.extend_from_slice(&[0, 0, 0]);
        }
    }

    let indices: Vec<u8> = image
        .pixels()
        .map(|p| nq.index_of(&[p[0], p[1], p[2], p[3]]) as u8)
        .collect();

    (palette, indices)
}
