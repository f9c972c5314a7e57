//! Contract for the neural inference services the editing operations call.
//!
//! Implementations own transport, retries and timeouts. Every call may be
//! slow; failures surface as [`SceneError::Inference`].

use image::{GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::foundation::error::{SceneError, SceneResult};

/// Whether a prompt point marks the object or the background.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointLabel {
    Background,
    Foreground,
}

/// Absolute pixel prompt for segmentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledPoint {
    pub x: i64,
    pub y: i64,
    pub label: PointLabel,
}

impl LabeledPoint {
    pub fn foreground(x: i64, y: i64) -> Self {
        Self {
            x,
            y,
            label: PointLabel::Foreground,
        }
    }

    pub fn background(x: i64, y: i64) -> Self {
        Self {
            x,
            y,
            label: PointLabel::Background,
        }
    }
}

/// Absolute pixel box, `max` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBox {
    pub x_min: i64,
    pub y_min: i64,
    pub x_max: i64,
    pub y_max: i64,
}

/// One text-segmentation result.
#[derive(Clone, Debug)]
pub struct ScoredMask {
    pub mask: GrayImage,
    pub score: f32,
}

/// Prompts for a single-object segmentation call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SegmentRequest {
    pub points: Vec<LabeledPoint>,
    pub region: Option<PixelBox>,
}

impl SegmentRequest {
    /// At least one point or a box is required.
    pub fn validate(&self) -> SceneResult<()> {
        if self.points.is_empty() && self.region.is_none() {
            return Err(SceneError::validation(
                "segmentation needs prompt points, a box, or both",
            ));
        }
        Ok(())
    }
}

/// Phrase-grounded inpainting request; boxes are `[x0, y0, x1, y1]` in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundedRequest {
    pub prompt: String,
    pub phrases: Vec<String>,
    pub boxes: Vec<[f64; 4]>,
    pub seed: u64,
}

impl GroundedRequest {
    pub fn validate(&self) -> SceneResult<()> {
        crate::foundation::error::ensure_same_len(&[
            ("phrases", self.phrases.len()),
            ("boxes", self.boxes.len()),
        ])?;
        if let Some(b) = self
            .boxes
            .iter()
            .find(|b| b.iter().any(|v| !(0.0..=1.0).contains(v)))
        {
            return Err(SceneError::validation(format!(
                "grounding box {b:?} is not normalized to [0, 1]"
            )));
        }
        Ok(())
    }
}

/// Segmentation, inpainting and generation services.
#[async_trait::async_trait]
pub trait InferenceClient: Send + Sync {
    /// Single mask for the prompted object. Callers validate the request first.
    async fn segment(&self, image: &RgbaImage, request: &SegmentRequest) -> SceneResult<GrayImage>;

    /// Zero or more masks matching a text description.
    async fn segment_by_text(&self, image: &RgbaImage, text: &str) -> SceneResult<Vec<ScoredMask>>;

    /// Regenerate the masked region (white = repaint).
    async fn inpaint(&self, image: &RgbaImage, mask: &GrayImage, prompt: &str) -> SceneResult<RgbaImage>;

    /// Text-to-image generation.
    async fn generate(&self, prompt: &str) -> SceneResult<RgbaImage>;

    /// Inpaint with phrases grounded to boxes.
    async fn grounded_inpaint(&self, image: &RgbaImage, request: &GroundedRequest) -> SceneResult<RgbaImage>;
}
