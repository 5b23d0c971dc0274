//! Separable Gaussian blur with Q16 fixed-point kernels.

use image::{RgbImage, imageops::FilterType};

use crate::foundation::error::{LyricReelError, LyricReelResult};

/// Largest sigma blurred at full resolution; larger ones run on a downsampled copy.
const MAX_DIRECT_SIGMA: f32 = 8.0;

/// Blur an RGB image with standard deviation `sigma` pixels.
///
/// Sigmas above 8 run on a copy downsampled by `floor(sigma / 8)`, then scaled back up.
pub fn gaussian_blur_rgb(img: &RgbImage, sigma: f32) -> LyricReelResult<RgbImage> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(LyricReelError::validation("blur sigma must be >= 0"));
    }
    let (w, h) = img.dimensions();
    if sigma == 0.0 || w == 0 || h == 0 {
        return Ok(img.clone());
    }

    let factor = ((sigma / MAX_DIRECT_SIGMA).floor() as u32).max(1);
    let (sw, sh) = ((w / factor).max(1), (h / factor).max(1));
    let small = if factor > 1 {
        image::imageops::resize(img, sw, sh, FilterType::Triangle)
    } else {
        img.clone()
    };

    let small_sigma = sigma / factor as f32;
    let radius = (small_sigma * 3.0).ceil() as u32;
    let blurred = blur_u8(small.as_raw(), sw, sh, 3, radius, small_sigma)?;
    let blurred = RgbImage::from_raw(sw, sh, blurred)
        .ok_or_else(|| LyricReelError::render("blurred buffer size mismatch"))?;

    if factor > 1 {
        Ok(image::imageops::resize(&blurred, w, h, FilterType::Triangle))
    } else {
        Ok(blurred)
    }
}

/// Blur a tightly packed 8-bit buffer with `channels` interleaved channels.
pub(crate) fn blur_u8(
    src: &[u8],
    width: u32,
    height: u32,
    channels: usize,
    radius: u32,
    sigma: f32,
) -> LyricReelResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| LyricReelError::render("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(LyricReelError::render(
            "blur expects src matching width*height*channels",
        ));
    }
    if radius == 0 || expected_len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    let dims = Dims {
        width: width as i32,
        height: height as i32,
        channels,
    };
    blur_pass(src, &mut tmp, dims, &kernel, Axis::Horizontal);
    blur_pass(&tmp, &mut out, dims, &kernel, Axis::Vertical);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> LyricReelResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(LyricReelError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = sigma as f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = i as f64;
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(LyricReelError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Push the rounding residue into the center tap so the kernel sums to exactly 1.0.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

#[derive(Clone, Copy)]
struct Dims {
    width: i32,
    height: i32,
    channels: usize,
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn blur_pass(src: &[u8], dst: &mut [u8], dims: Dims, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i32;
    let Dims {
        width: w,
        height: h,
        channels,
    } = dims;
    let mut acc = vec![0u64; channels];
    for y in 0..h {
        for x in 0..w {
            acc.fill(0);
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i32 - radius;
                let (sx, sy) = match axis {
                    Axis::Horizontal => ((x + d).clamp(0, w - 1), y),
                    Axis::Vertical => (x, (y + d).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * channels;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * channels;
            for (c, &a) in acc.iter().enumerate() {
                dst[out_idx + c] = q16_to_u8(a);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    (v.min(255)) as u8
}
