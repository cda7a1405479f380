// ============================================================================
// IMAGE FILTERS — separable Gaussian blur, percentile (median) filter
// ============================================================================
//
// Both filters operate on flat RGBA buffers and are rayon-parallelized by row.
// Edge handling is clamp-to-edge throughout.

use image::RgbaImage;
use rayon::prelude::*;

// ---------------------------------------------------------------------------
//  Parallel separable Gaussian blur
// ---------------------------------------------------------------------------

/// Build a 1-D Gaussian kernel truncated at ceil(3*sigma).
fn build_gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as usize;
    if radius == 0 {
        return vec![1.0];
    }
    let len = radius * 2 + 1;
    let mut kernel = vec![0.0f32; len];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;
    for (i, v) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        let e = (-x * x / s2).exp();
        *v = e;
        sum += e;
    }
    let inv = 1.0 / sum;
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}

/// Gaussian blur with independently switchable horizontal and vertical passes
/// (the host's IIR blur exposes both toggles; the blurry pipeline enables
/// both). With both toggles off, or sigma too small to matter, the input is
/// returned unchanged.
pub fn gaussian_blur_core(
    src: &RgbaImage,
    sigma: f32,
    horizontal: bool,
    vertical: bool,
) -> RgbaImage {
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 || sigma <= 0.0 || (!horizontal && !vertical) {
        return src.clone();
    }

    let kernel = build_gaussian_kernel(sigma);
    let radius = kernel.len() / 2;

    // Work in f32 so the two passes don't compound rounding error.
    let mut buf: Vec<f32> = src.as_raw().iter().map(|&b| b as f32).collect();

    if horizontal {
        let mut out = vec![0.0f32; buf.len()];
        out.par_chunks_mut(w * 4).enumerate().for_each(|(y, row_out)| {
            let row_in = &buf[y * w * 4..(y + 1) * w * 4];
            for x in 0..w {
                let mut acc = [0.0f32; 4];
                for (ki, &kv) in kernel.iter().enumerate() {
                    let sx = (x as isize + ki as isize - radius as isize)
                        .clamp(0, w as isize - 1) as usize;
                    for c in 0..4 {
                        acc[c] += row_in[sx * 4 + c] * kv;
                    }
                }
                row_out[x * 4..x * 4 + 4].copy_from_slice(&acc);
            }
        });
        buf = out;
    }

    if vertical {
        let mut out = vec![0.0f32; buf.len()];
        let src_buf = &buf;
        out.par_chunks_mut(w * 4).enumerate().for_each(|(y, row_out)| {
            for x in 0..w {
                let mut acc = [0.0f32; 4];
                for (ki, &kv) in kernel.iter().enumerate() {
                    let sy = (y as isize + ki as isize - radius as isize)
                        .clamp(0, h as isize - 1) as usize;
                    for c in 0..4 {
                        acc[c] += src_buf[(sy * w + x) * 4 + c] * kv;
                    }
                }
                row_out[x * 4..x * 4 + 4].copy_from_slice(&acc);
            }
        });
        buf = out;
    }

    let dst_raw: Vec<u8> = buf
        .iter()
        .map(|&v| v.round().clamp(0.0, 255.0) as u8)
        .collect();
    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap()
}

// ---------------------------------------------------------------------------
//  Percentile rank filter (median blur)
// ---------------------------------------------------------------------------

/// Rank-order filter over a `(2r+1)²` window: each output channel is the
/// `percentile`-th value of the sorted window. Percentile 50 is the classic
/// median; 0 erodes, 100 dilates.
pub fn percentile_filter_core(src: &RgbaImage, radius: u32, percentile: f32) -> RgbaImage {
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }

    let r = radius.max(1) as i32;
    let pct = percentile.clamp(0.0, 100.0);
    let src_raw = src.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; w * h * 4];

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let mut channels: [Vec<u8>; 4] = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
            for x in 0..w {
                for c in &mut channels {
                    c.clear();
                }
                for dy in -r..=r {
                    let sy = (y as i32 + dy).clamp(0, h as i32 - 1) as usize;
                    for dx in -r..=r {
                        let sx = (x as i32 + dx).clamp(0, w as i32 - 1) as usize;
                        let si = sy * stride + sx * 4;
                        for c in 0..4 {
                            channels[c].push(src_raw[si + c]);
                        }
                    }
                }
                let rank =
                    ((channels[0].len() - 1) as f32 * pct / 100.0).round() as usize;
                let pi = x * 4;
                for c in 0..4 {
                    channels[c].sort_unstable();
                    row_out[pi + c] = channels[c][rank];
                }
            }
        });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap()
}
