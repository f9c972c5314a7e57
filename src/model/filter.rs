use serde::{Deserialize, Serialize};

use crate::foundation::error::{SceneError, SceneResult};

fn yes() -> bool {
    true
}

/// Filters understood by the raster pipeline.
///
/// Values lie in `[-1.0, 1.0]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ImageFilter {
    Brightness {
        brightness: f64,
    },
    Contrast {
        contrast: f64,
    },
    Saturation {
        saturation: f64,
    },
    Blur {
        blur: f64,
    },
    Invert {
        #[serde(default = "yes")]
        invert: bool,
        #[serde(default)]
        alpha: bool,
    },
    BlackWhite {
        #[serde(default, rename = "colorsOnly")]
        colors_only: bool,
    },
}

/// A filter entry in an image layer's filter list.
///
/// Entries the pipeline does not understand are kept verbatim so the list
/// round-trips, and are skipped when compositing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filter {
    Known(ImageFilter),
    Other(serde_json::Value),
}

impl From<ImageFilter> for Filter {
    fn from(value: ImageFilter) -> Self {
        Filter::Known(value)
    }
}

/// Filter names accepted by [`ImageFilter::from_name`].
pub const FILTER_NAMES: [&str; 6] = [
    "blackWhite",
    "blur",
    "brightness",
    "contrast",
    "invert",
    "saturation",
];

impl ImageFilter {
    /// Build a filter from its user-facing name and optional value.
    ///
    /// Blur, brightness, contrast and saturation require a value.
    pub fn from_name(name: &str, value: Option<f64>) -> SceneResult<Self> {
        if let Some(v) = value {
            if !v.is_finite() || !(-1.0..=1.0).contains(&v) {
                return Err(SceneError::validation(format!(
                    "filter '{name}' value {v} must be within [-1.0, 1.0]"
                )));
            }
        }
        let required = |v: Option<f64>| {
            v.ok_or_else(|| SceneError::validation(format!("filter '{name}' requires a value")))
        };

        match name {
            "blackWhite" => Ok(ImageFilter::BlackWhite { colors_only: false }),
            "invert" => Ok(ImageFilter::Invert {
                invert: true,
                alpha: false,
            }),
            "blur" => Ok(ImageFilter::Blur {
                blur: required(value)?,
            }),
            "brightness" => Ok(ImageFilter::Brightness {
                brightness: required(value)?,
            }),
            "contrast" => Ok(ImageFilter::Contrast {
                contrast: required(value)?,
            }),
            "saturation" => Ok(ImageFilter::Saturation {
                saturation: required(value)?,
            }),
            _ => Err(SceneError::validation(format!(
                "unknown filter '{name}' (expected one of {})",
                FILTER_NAMES.join(", ")
            ))),
        }
    }
}
