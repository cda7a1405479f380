// ============================================================================
// INDEXED COLOR CONVERSION — fixed and generated palettes
// ============================================================================
//
// Converting a canvas to indexed mode maps every pixel onto a palette and
// tags the canvas with that palette. The crunchy normalizer uses the fixed
// web-safe palette with no dithering; the mono and generated palettes cover
// the rest of the host's conversion surface.

use color_quant::NeuQuant;
use image::RgbaImage;

/// Dithering applied during palette mapping.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum DitherMode {
    #[default]
    None,
    FloydSteinberg,
}

/// Which palette to convert onto.
#[derive(Clone, Debug, PartialEq)]
pub enum PaletteKind {
    /// The fixed 6×6×6 web-safe cube (216 colors).
    WebSafe,
    /// Black and white.
    Mono,
    /// Palette generated from the image itself, at most `max_colors` entries.
    Generate { max_colors: u16 },
}

/// Build the palette for `kind`, sampling `src` when the palette is generated.
pub fn build_palette(src: &RgbaImage, kind: &PaletteKind) -> Vec<[u8; 3]> {
    match kind {
        PaletteKind::WebSafe => {
            let mut palette = Vec::with_capacity(216);
            for r in 0..6u8 {
                for g in 0..6u8 {
                    for b in 0..6u8 {
                        palette.push([r * 51, g * 51, b * 51]);
                    }
                }
            }
            palette
        }
        PaletteKind::Mono => vec![[0, 0, 0], [255, 255, 255]],
        PaletteKind::Generate { max_colors } => {
            let colors = (*max_colors as usize).clamp(2, 256);
            // NeuQuant wants opaque RGBA quads; force alpha so transparency
            // doesn't skew the trained palette.
            let mut quads = Vec::with_capacity(src.as_raw().len());
            for p in src.pixels() {
                quads.extend_from_slice(&[p[0], p[1], p[2], 255]);
            }
            let nq = NeuQuant::new(10, colors, &quads);
            (0..colors)
                .filter_map(|i| nq.lookup(i))
                .map(|c| [c[0], c[1], c[2]])
                .collect()
        }
    }
}

/// Index of the palette entry nearest to (r, g, b) by squared RGB distance.
pub fn nearest_index(palette: &[[u8; 3]], r: u8, g: u8, b: u8) -> usize {
    let mut best = 0usize;
    let mut best_d = u32::MAX;
    for (i, c) in palette.iter().enumerate() {
        let dr = c[0] as i32 - r as i32;
        let dg = c[1] as i32 - g as i32;
        let db = c[2] as i32 - b as i32;
        let d = (dr * dr + dg * dg + db * db) as u32;
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// Map every pixel of `src` onto `palette`, optionally diffusing the
/// quantization error Floyd–Steinberg style. Alpha is carried through.
pub fn convert_indexed_core(
    src: &RgbaImage,
    dither: DitherMode,
    palette: &[[u8; 3]],
) -> RgbaImage {
    let w = src.width() as usize;
    let h = src.height() as usize;
    let mut out = RgbaImage::new(w as u32, h as u32);
    if w == 0 || h == 0 || palette.is_empty() {
        return src.clone();
    }

    match dither {
        DitherMode::None => {
            for (x, y, p) in src.enumerate_pixels() {
                let c = palette[nearest_index(palette, p[0], p[1], p[2])];
                out.put_pixel(x, y, image::Rgba([c[0], c[1], c[2], p[3]]));
            }
        }
        DitherMode::FloydSteinberg => {
            // Error diffusion is inherently serial; work on an f32 copy.
            let mut buf: Vec<[f32; 3]> = src
                .pixels()
                .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
                .collect();

            for y in 0..h {
                for x in 0..w {
                    let i = y * w + x;
                    let [r, g, b] = buf[i];
                    let (r8, g8, b8) = (
                        r.round().clamp(0.0, 255.0) as u8,
                        g.round().clamp(0.0, 255.0) as u8,
                        b.round().clamp(0.0, 255.0) as u8,
                    );
                    let c = palette[nearest_index(palette, r8, g8, b8)];
                    let err = [r - c[0] as f32, g - c[1] as f32, b - c[2] as f32];

                    // Standard 7/16, 3/16, 5/16, 1/16 kernel.
                    let mut spread = |dx: i32, dy: i32, weight: f32| {
                        let nx = x as i32 + dx;
                        let ny = y as i32 + dy;
                        if nx >= 0 && (nx as usize) < w && (ny as usize) < h {
                            let ni = ny as usize * w + nx as usize;
                            for ch in 0..3 {
                                buf[ni][ch] += err[ch] * weight;
                            }
                        }
                    };
                    spread(1, 0, 7.0 / 16.0);
                    spread(-1, 1, 3.0 / 16.0);
                    spread(0, 1, 5.0 / 16.0);
                    spread(1, 1, 1.0 / 16.0);

                    let a = src.get_pixel(x as u32, y as u32)[3];
                    out.put_pixel(x as u32, y as u32, image::Rgba([c[0], c[1], c[2], a]));
                }
            }
        }
    }
    out
}
