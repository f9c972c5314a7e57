use std::io::Cursor;

use anyhow::Context;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ImageFormat, RgbaImage};

use crate::foundation::error::{SceneError, SceneResult};

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encode a raster as a PNG data URL.
pub fn encode_data_url(raster: &RgbaImage) -> SceneResult<String> {
    let mut buf = Vec::new();
    raster
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .context("encode png")?;
    Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(&buf)))
}

/// Decode a base64 `data:image/<fmt>;base64,...` URL into RGBA8.
pub fn decode_data_url(url: &str) -> SceneResult<RgbaImage> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| SceneError::raster("image source is not a data URL"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| SceneError::raster("data URL has no payload"))?;
    if !meta.starts_with("image/") || !meta.ends_with(";base64") {
        return Err(SceneError::raster(format!(
            "unsupported data URL media type '{meta}'"
        )));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .context("decode base64 payload")?;
    let img = image::load_from_memory(&bytes).context("decode image from memory")?;
    Ok(img.to_rgba8())
}
