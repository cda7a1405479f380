// ============================================================================
// COLOR ADJUSTMENTS — hue/saturation with per-band channels
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

/// Which hue range a hue/saturation adjustment applies to. `All` adjusts every
/// pixel; the six band channels restrict the adjustment to pixels near that
/// hue, feathered by the `overlap` parameter.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum HueChannel {
    #[default]
    All,
    Red,
    Yellow,
    Green,
    Cyan,
    Blue,
    Magenta,
}

impl HueChannel {
    /// Band center in degrees; `None` for `All`.
    fn center_deg(&self) -> Option<f32> {
        match self {
            HueChannel::All => None,
            HueChannel::Red => Some(0.0),
            HueChannel::Yellow => Some(60.0),
            HueChannel::Green => Some(120.0),
            HueChannel::Cyan => Some(180.0),
            HueChannel::Blue => Some(240.0),
            HueChannel::Magenta => Some(300.0),
        }
    }
}

/// Per-pixel weight of a band channel at hue `h_deg`. Each band spans 60°;
/// `overlap` (0–100) feathers the edge into the neighboring bands instead of
/// cutting hard at the boundary.
fn band_weight(h_deg: f32, center: f32, overlap: f32) -> f32 {
    let mut dist = (h_deg - center).abs() % 360.0;
    if dist > 180.0 {
        dist = 360.0 - dist;
    }
    let half = 30.0;
    let feather = (overlap.clamp(0.0, 100.0) / 100.0) * half;
    if dist <= half - feather {
        1.0
    } else if dist >= half + feather {
        0.0
    } else {
        // Linear ramp across the feathered boundary.
        (half + feather - dist) / (2.0 * feather)
    }
}

/// Hue/saturation adjustment.
/// `hue_offset`: -180..180 degrees, `lightness` and `saturation`: -100..100,
/// `overlap`: 0..100 band feathering (ignored for `HueChannel::All`).
pub fn hue_saturation_core(
    src: &RgbaImage,
    channel: HueChannel,
    hue_offset: f32,
    lightness: f32,
    saturation: f32,
    overlap: f32,
) -> RgbaImage {
    let sat_factor = 1.0 + saturation / 100.0;
    let light_offset = lightness * 255.0 / 100.0;
    let center = channel.center_deg();

    apply_per_pixel(src, |r, g, b, a| {
        let (h, s, l) = rgb_to_hsl(r / 255.0, g / 255.0, b / 255.0);

        let weight = match center {
            None => 1.0,
            Some(c) => band_weight(h * 360.0, c, overlap),
        };
        if weight <= 0.0 {
            return (r, g, b, a);
        }

        let nh = {
            let shifted = h + hue_offset * weight / 360.0;
            (shifted % 1.0 + 1.0) % 1.0
        };
        let ns = (s * (1.0 + (sat_factor - 1.0) * weight)).clamp(0.0, 1.0);
        let (nr, ng, nb) = hsl_to_rgb(nh, ns, l);
        let lo = light_offset * weight;
        (nr * 255.0 + lo, ng * 255.0 + lo, nb * 255.0 + lo, a)
    })
}

/// Per-pixel transform, rayon-parallelized by row. Results are rounded and
/// clamped to 0..255.
pub fn apply_per_pixel<F>(src: &RgbaImage, transform: F) -> RgbaImage
where
    F: Fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }

    let src_raw = src.as_raw();
    let mut dst_raw = vec![0u8; w * h * 4];
    let stride = w * 4;

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row_in = &src_raw[y * stride..(y + 1) * stride];
            for x in 0..w {
                let pi = x * 4;
                let r = row_in[pi] as f32;
                let g = row_in[pi + 1] as f32;
                let b = row_in[pi + 2] as f32;
                let a = row_in[pi + 3] as f32;
                let (nr, ng, nb, na) = transform(r, g, b, a);
                row_out[pi] = nr.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 1] = ng.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 2] = nb.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 3] = na.round().clamp(0.0, 255.0) as u8;
            }
        });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap()
}

// ============================================================================
// COLOR SPACE HELPERS
// ============================================================================

/// RGB (0..1) → HSL (H: 0..1, S: 0..1, L: 0..1)
pub fn rgb_to_hsl(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < 1e-6 {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };

    let h = if (max - r).abs() < 1e-6 {
        let mut h = (g - b) / d;
        if h < 0.0 {
            h += 6.0;
        }
        h / 6.0
    } else if (max - g).abs() < 1e-6 {
        ((b - r) / d + 2.0) / 6.0
    } else {
        ((r - g) / d + 4.0) / 6.0
    };

    (h, s, l)
}

/// HSL (H: 0..1, S: 0..1, L: 0..1) → RGB (0..1)
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s.abs() < 1e-6 {
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(r: u8, g: u8, b: u8) -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba([r, g, b, 255]))
    }

    #[test]
    fn hsl_round_trip() {
        for &(r, g, b) in &[(0.8, 0.3, 0.1), (0.0, 0.0, 0.0), (0.5, 0.5, 0.5), (0.1, 0.9, 0.4)] {
            let (h, s, l) = rgb_to_hsl(r, g, b);
            let (nr, ng, nb) = hsl_to_rgb(h, s, l);
            assert!((nr - r).abs() < 1e-4, "r {} vs {}", nr, r);
            assert!((ng - g).abs() < 1e-4);
            assert!((nb - b).abs() < 1e-4);
        }
    }

    #[test]
    fn saturation_boost_increases_saturation() {
        let src = solid(150, 100, 100);
        let out = hue_saturation_core(&src, HueChannel::All, 0.0, 0.0, 25.0, 0.0);
        let p = out.get_pixel(0, 0);
        let (_, s_before, _) = rgb_to_hsl(150.0 / 255.0, 100.0 / 255.0, 100.0 / 255.0);
        let (_, s_after, _) =
            rgb_to_hsl(p[0] as f32 / 255.0, p[1] as f32 / 255.0, p[2] as f32 / 255.0);
        assert!(s_after > s_before);
    }

    #[test]
    fn zero_adjustment_is_near_identity() {
        let src = solid(137, 42, 200);
        let out = hue_saturation_core(&src, HueChannel::All, 0.0, 0.0, 0.0, 0.0);
        let p = out.get_pixel(0, 0);
        // Round-trip through HSL may move a channel by at most one step.
        for c in 0..3 {
            assert!((p[c] as i32 - src.get_pixel(0, 0)[c] as i32).abs() <= 1);
        }
    }

    #[test]
    fn hue_shift_rotates_red_toward_green() {
        let src = solid(255, 0, 0);
        let out = hue_saturation_core(&src, HueChannel::All, 120.0, 0.0, 0.0, 0.0);
        let p = out.get_pixel(0, 0);
        assert!(p[1] > 200 && p[0] < 50 && p[2] < 50, "got {:?}", p);
    }

    #[test]
    fn band_channel_leaves_other_hues_alone() {
        let src = solid(0, 0, 255); // pure blue
        let out = hue_saturation_core(&src, HueChannel::Red, 0.0, 0.0, -100.0, 0.0);
        // Desaturating the red band must not touch a blue pixel.
        assert_eq!(out.get_pixel(0, 0), src.get_pixel(0, 0));
    }

    #[test]
    fn band_weight_feathers_with_overlap() {
        assert_eq!(band_weight(0.0, 0.0, 0.0), 1.0);
        assert_eq!(band_weight(45.0, 0.0, 0.0), 0.0);
        // At the exact band edge with feathering, the weight is one half.
        let w = band_weight(30.0, 0.0, 50.0);
        assert!((w - 0.5).abs() < 1e-6);
        // Hue distance wraps around 360.
        assert_eq!(band_weight(350.0, 0.0, 0.0), 1.0);
    }
}
