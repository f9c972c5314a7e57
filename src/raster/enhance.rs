use image::{Rgba, RgbaImage};

use crate::{
    foundation::error::SceneResult,
    model::filter::{Filter, ImageFilter},
    raster::blur::gaussian_blur,
};

/// Fold one filter onto a raster. Unknown filters leave it unchanged.
pub fn apply_filter(raster: RgbaImage, filter: &Filter) -> SceneResult<RgbaImage> {
    let Filter::Known(filter) = filter else {
        return Ok(raster);
    };

    match *filter {
        ImageFilter::Brightness { brightness } => Ok(brightness_enhance(raster, 1.0 + brightness)),
        ImageFilter::Contrast { contrast } => Ok(contrast_enhance(raster, 1.0 + contrast)),
        ImageFilter::Saturation { saturation } => Ok(saturation_enhance(raster, 1.0 + saturation)),
        ImageFilter::Blur { blur } => {
            let radius = (blur.abs() * 10.0) as f32;
            gaussian_blur(&raster, radius)
        }
        ImageFilter::Invert { invert, alpha } => Ok(invert_colors(raster, invert, alpha)),
        ImageFilter::BlackWhite { .. } => Ok(desaturate(raster)),
    }
}

/// ITU-R 601-2 luma, rounded the way common imaging libraries do it.
pub(crate) fn luma(px: &Rgba<u8>) -> u8 {
    let [r, g, b, _] = px.0;
    ((u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16) as u8
}

/// `degenerate + (c - degenerate) * factor`, clamped; alpha untouched.
fn blend_channel(degenerate: u8, c: u8, factor: f64) -> u8 {
    let d = f64::from(degenerate);
    (d + (f64::from(c) - d) * factor).round().clamp(0.0, 255.0) as u8
}

fn brightness_enhance(mut raster: RgbaImage, factor: f64) -> RgbaImage {
    for px in raster.pixels_mut() {
        for c in 0..3 {
            px[c] = blend_channel(0, px[c], factor);
        }
    }
    raster
}

fn contrast_enhance(mut raster: RgbaImage, factor: f64) -> RgbaImage {
    let count = u64::from(raster.width()) * u64::from(raster.height());
    if count == 0 {
        return raster;
    }
    let total: u64 = raster.pixels().map(|px| u64::from(luma(px))).sum();
    let mean = ((total as f64 / count as f64) + 0.5).floor().clamp(0.0, 255.0) as u8;
    for px in raster.pixels_mut() {
        for c in 0..3 {
            px[c] = blend_channel(mean, px[c], factor);
        }
    }
    raster
}

fn saturation_enhance(mut raster: RgbaImage, factor: f64) -> RgbaImage {
    for px in raster.pixels_mut() {
        let l = luma(px);
        for c in 0..3 {
            px[c] = blend_channel(l, px[c], factor);
        }
    }
    raster
}

fn invert_colors(mut raster: RgbaImage, invert: bool, alpha: bool) -> RgbaImage {
    for px in raster.pixels_mut() {
        if invert {
            for c in 0..3 {
                px[c] = 255 - px[c];
            }
        }
        if alpha {
            px[3] = 255 - px[3];
        }
    }
    raster
}

fn desaturate(mut raster: RgbaImage) -> RgbaImage {
    for px in raster.pixels_mut() {
        let l = luma(px);
        px[0] = l;
        px[1] = l;
        px[2] = l;
    }
    raster
}
