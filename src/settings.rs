use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{SceneError, SceneResult},
    mask::ScribbleRaster,
};

/// Tunables for the editing operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditSettings {
    /// Pixels the composite mask grows by before inpainting.
    pub mask_dilation_px: u32,
    /// Mask values strictly above this are foreground.
    pub mask_threshold: u8,
    /// Prompt used when the guard inpaints behind moved or removed objects.
    pub removal_prompt: String,
    pub scribble_samples: usize,
    pub scribble_min_stroke_px: f64,
    /// Prompt points sampled from a rasterised scribble.
    pub mask_point_count: usize,
    pub grounding_seed: u64,
}

impl Default for EditSettings {
    fn default() -> Self {
        Self {
            mask_dilation_px: 10,
            mask_threshold: 127,
            removal_prompt: "remove the instance of the object".to_owned(),
            scribble_samples: 500,
            scribble_min_stroke_px: 3.0,
            mask_point_count: 10,
            grounding_seed: 42,
        }
    }
}

impl EditSettings {
    pub fn from_json_path(path: &Path) -> SceneResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SceneError::validation(format!("read settings '{}': {e}", path.display()))
        })?;
        let settings: Self = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> SceneResult<()> {
        if self.scribble_samples < 2 {
            return Err(SceneError::validation(
                "scribble_samples must be at least 2",
            ));
        }
        if self.mask_point_count == 0 {
            return Err(SceneError::validation("mask_point_count must be non-zero"));
        }
        if !self.scribble_min_stroke_px.is_finite() || self.scribble_min_stroke_px <= 0.0 {
            return Err(SceneError::validation(
                "scribble_min_stroke_px must be positive",
            ));
        }
        Ok(())
    }

    pub(crate) fn scribble_raster(&self) -> ScribbleRaster {
        ScribbleRaster {
            samples: self.scribble_samples,
            min_stroke_px: self.scribble_min_stroke_px,
        }
    }
}
