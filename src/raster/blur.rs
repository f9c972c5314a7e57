use image::RgbaImage;

use crate::foundation::error::{SceneError, SceneResult};

/// Largest kernel half-width; larger sigmas are truncated.
const MAX_KERNEL_RADIUS: u32 = 256;

/// Separable gaussian blur over all four channels of a straight-alpha raster.
///
/// `sigma <= 0` returns the input unchanged.
pub fn gaussian_blur(src: &RgbaImage, sigma: f32) -> SceneResult<RgbaImage> {
    if !sigma.is_finite() {
        return Err(SceneError::validation("blur sigma must be finite"));
    }
    if sigma <= 0.0 {
        return Ok(src.clone());
    }

    let radius = ((sigma * 3.0).ceil() as u32).clamp(1, MAX_KERNEL_RADIUS);
    let kernel = kernel_q16(radius, sigma);
    let (width, height) = src.dimensions();

    let mut tmp = vec![0u8; src.as_raw().len()];
    let mut out = vec![0u8; src.as_raw().len()];
    convolve(src.as_raw(), &mut tmp, width, height, &kernel, Pass::Rows);
    convolve(&tmp, &mut out, width, height, &kernel, Pass::Columns);

    RgbaImage::from_raw(width, height, out)
        .ok_or_else(|| SceneError::raster("blur output does not match raster dimensions"))
}

/// Gaussian weights in Q16 fixed point, summing to exactly `1 << 16`.
fn kernel_q16(radius: u32, sigma: f32) -> Vec<u32> {
    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights: Vec<f64> = (-r..=r)
        .map(|i| (-f64::from(i * i) / denom).exp())
        .collect();
    let sum: f64 = weights.iter().sum();

    let mut q: Vec<u32> = weights
        .iter()
        .map(|w| ((w / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let total: i64 = q.iter().map(|&w| i64::from(w)).sum();
    let mid = q.len() / 2;
    q[mid] = (i64::from(q[mid]) + 65536 - total).clamp(0, 65536) as u32;
    q
}

#[derive(Clone, Copy)]
enum Pass {
    Rows,
    Columns,
}

fn convolve(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], pass: Pass) {
    let radius = (k.len() / 2) as i64;
    let (w, h) = (i64::from(width), i64::from(height));
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i64 - radius;
                let (sx, sy) = match pass {
                    Pass::Rows => ((x + d).clamp(0, w - 1), y),
                    Pass::Columns => (x, (y + d).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for (c, a) in acc.iter().enumerate() {
                dst[out + c] = ((a + 32768) >> 16).min(255) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    #[test]
    fn zero_sigma_is_identity() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([1, 2, 3, 4]));
        assert_eq!(gaussian_blur(&img, 0.0).unwrap(), img);
    }

    #[test]
    fn constant_image_is_unchanged() {
        let img = RgbaImage::from_pixel(6, 4, Rgba([10, 20, 30, 255]));
        assert_eq!(gaussian_blur(&img, 2.0).unwrap(), img);
    }

    #[test]
    fn single_pixel_spreads() {
        let mut img = RgbaImage::new(7, 7);
        img.put_pixel(3, 3, Rgba([255, 255, 255, 255]));
        let out = gaussian_blur(&img, 1.0).unwrap();
        let lit = out.pixels().filter(|p| p[3] != 0).count();
        assert!(lit > 1);
        assert!(out.get_pixel(3, 3)[3] < 255);
    }

    #[test]
    fn kernel_sums_to_one_q16() {
        let k = kernel_q16(5, 1.7);
        assert_eq!(k.len(), 11);
        assert_eq!(k.iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
    }
}
