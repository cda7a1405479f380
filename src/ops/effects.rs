// ============================================================================
// NOISE EFFECTS — HSV noise with a deterministic hash RNG
// ============================================================================
//
// The noise source is a counter-free pixel hash, so a given (image, seed)
// pair always produces the same speckle. The CLI exposes the seed; batch
// runs are reproducible.

use image::RgbaImage;
use rayon::prelude::*;

/// Per-pixel transform with pixel coordinates, rayon-parallelized by row.
fn apply_per_pixel_xy<F>(src: &RgbaImage, transform: F) -> RgbaImage
where
    F: Fn(u32, u32, f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
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
                let (nr, ng, nb, na) = transform(x as u32, y as u32, r, g, b, a);
                row_out[pi] = nr.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 1] = ng.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 2] = nb.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 3] = na.round().clamp(0.0, 255.0) as u8;
            }
        });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap()
}

/// Scatter the hue, saturation and value of every pixel.
///
/// * `holdness` (1–8): how tightly the noise hugs zero. Each offset is the
///   average of `holdness` uniform samples, so higher values concentrate the
///   distribution and produce gentler speckle.
/// * `hue`: 0–180, maximum hue deviation in degrees (wraps around the wheel).
/// * `saturation`, `value`: 0–255, maximum channel deviation in the host's
///   raw 8-bit parameter range.
pub fn hsv_noise_core(
    src: &RgbaImage,
    holdness: u32,
    hue: u8,
    saturation: u8,
    value: u8,
    seed: u32,
) -> RgbaImage {
    let holdness = holdness.clamp(1, 8);
    let hue_range = hue as f32;
    let sat_range = saturation as f32 / 255.0;
    let val_range = value as f32 / 255.0;

    apply_per_pixel_xy(src, |x, y, r, g, b, a| {
        let (h, s, v) = rgb_to_hsv(r / 255.0, g / 255.0, b / 255.0);

        let dh = scatter(x, y, seed, 0, holdness) * hue_range;
        let ds = scatter(x, y, seed, 1, holdness) * sat_range;
        let dv = scatter(x, y, seed, 2, holdness) * val_range;

        let nh = ((h + dh / 360.0) % 1.0 + 1.0) % 1.0;
        let ns = (s + ds).clamp(0.0, 1.0);
        let nv = (v + dv).clamp(0.0, 1.0);

        let (nr, ng, nb) = hsv_to_rgb(nh, ns, nv);
        (nr * 255.0, ng * 255.0, nb * 255.0, a)
    })
}

/// Averaged-uniform offset in [-1, 1] for one noise lane of one pixel.
fn scatter(x: u32, y: u32, seed: u32, lane: u32, holdness: u32) -> f32 {
    let mut sum = 0.0f32;
    for i in 0..holdness {
        let s = seed
            .wrapping_add(lane.wrapping_mul(0x9E37_79B9))
            .wrapping_add(i.wrapping_mul(0x85EB_CA6B));
        sum += hash_f32(x, y, s) * 2.0 - 1.0;
    }
    sum / holdness as f32
}

/// Simple hash for deterministic noise.
#[inline]
fn hash_u32(mut x: u32) -> u32 {
    x = x.wrapping_mul(0x9E3779B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

/// Hash to f32 in [0, 1).
#[inline]
fn hash_f32(x: u32, y: u32, seed: u32) -> f32 {
    let h = hash_u32(
        x.wrapping_mul(374761393)
            .wrapping_add(y.wrapping_mul(668265263))
            .wrapping_add(seed),
    );
    (h & 0x00FFFFFF) as f32 / 16777216.0
}

// ============================================================================
// COLOR SPACE HELPERS
// ============================================================================

/// RGB (0..1) → HSV (H: 0..1, S: 0..1, V: 0..1)
pub fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let v = max;
    let d = max - min;

    if d.abs() < 1e-6 {
        return (0.0, 0.0, v);
    }
    let s = d / max;

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

    (h, s, v)
}

/// HSV (H: 0..1, S: 0..1, V: 0..1) → RGB (0..1)
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    if s.abs() < 1e-6 {
        return (v, v, v);
    }
    let h6 = ((h % 1.0) + 1.0) % 1.0 * 6.0;
    let i = (h6.floor() as i32) % 6;
    let f = h6 - h6.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match i {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn mid_gray(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([128, 128, 128, 255]))
    }

    #[test]
    fn hsv_round_trip() {
        for &(r, g, b) in &[(0.8, 0.3, 0.1), (0.0, 0.5, 1.0), (0.2, 0.2, 0.2)] {
            let (h, s, v) = rgb_to_hsv(r, g, b);
            let (nr, ng, nb) = hsv_to_rgb(h, s, v);
            assert!((nr - r).abs() < 1e-4);
            assert!((ng - g).abs() < 1e-4);
            assert!((nb - b).abs() < 1e-4);
        }
    }

    #[test]
    fn noise_is_deterministic_per_seed() {
        let src = mid_gray(32, 32);
        let a = hsv_noise_core(&src, 8, 0, 255, 76, 1234);
        let b = hsv_noise_core(&src, 8, 0, 255, 76, 1234);
        let c = hsv_noise_core(&src, 8, 0, 255, 76, 4321);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn zero_ranges_leave_the_image_untouched() {
        let src = mid_gray(16, 16);
        let out = hsv_noise_core(&src, 8, 0, 0, 0, 99);
        assert_eq!(out, src);
    }

    #[test]
    fn value_noise_actually_speckles() {
        let src = mid_gray(32, 32);
        let out = hsv_noise_core(&src, 8, 0, 255, 76, 7);
        let changed = out
            .pixels()
            .zip(src.pixels())
            .filter(|(a, b)| a != b)
            .count();
        // The vast majority of pixels should have moved.
        assert!(changed > 32 * 32 / 2, "only {} pixels changed", changed);
    }

    #[test]
    fn higher_holdness_means_tamer_noise() {
        let src = mid_gray(64, 64);
        let spread = |img: &RgbaImage| -> f64 {
            img.pixels()
                .map(|p| (p[0] as f64 - 128.0).abs())
                .sum::<f64>()
                / (64.0 * 64.0)
        };
        let wild = spread(&hsv_noise_core(&src, 1, 0, 0, 255, 5));
        let tame = spread(&hsv_noise_core(&src, 8, 0, 0, 255, 5));
        assert!(tame < wild, "tame {} vs wild {}", tame, wild);
    }

    #[test]
    fn alpha_is_preserved() {
        let src = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 77]));
        let out = hsv_noise_core(&src, 4, 90, 128, 128, 42);
        for p in out.pixels() {
            assert_eq!(p[3], 77);
        }
    }
}
