//! Raster codecs and the filter pipeline for image layers.
//!
//! Rasters are straight-alpha RGBA8 (`image::RgbaImage`); masks are
//! single-channel 8-bit (`image::GrayImage`).

pub(crate) mod blur;
pub(crate) mod codec;
pub(crate) mod enhance;

pub use codec::{decode_data_url, encode_data_url};
pub use enhance::apply_filter;
