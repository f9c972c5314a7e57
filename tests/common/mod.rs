#![allow(dead_code)]

use std::sync::Mutex;

use image::{GrayImage, Luma, Rgba, RgbaImage};
use sceneedit::{
    GroundedRequest, ImageEntity, InferenceClient, ObjectEntity, SceneError, SceneResult,
    ScoredMask, SegmentRequest, mask,
};

pub const BACKGROUND: Rgba<u8> = Rgba([40, 80, 120, 255]);
pub const SUBJECT: Rgba<u8> = Rgba([230, 30, 30, 255]);
pub const INPAINT_FILL: Rgba<u8> = Rgba([0, 200, 0, 255]);
pub const GROUNDED_FILL: Rgba<u8> = Rgba([200, 200, 0, 255]);

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Segment(SegmentRequest),
    SegmentByText(String),
    Inpaint { prompt: String, masked_pixels: usize },
    Generate(String),
    Grounded(GroundedRequest),
}

/// In-memory inference client with canned answers.
///
/// `inpaint` paints the masked pixels with [`INPAINT_FILL`];
/// `grounded_inpaint` fills the whole raster with [`GROUNDED_FILL`].
#[derive(Default)]
pub struct FakeClient {
    pub segment_mask: Option<GrayImage>,
    pub text_masks: Vec<GrayImage>,
    pub fail_inpaint: bool,
    calls: Mutex<Vec<Call>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_segment_mask(mut self, mask: GrayImage) -> Self {
        self.segment_mask = Some(mask);
        self
    }

    pub fn with_text_masks(mut self, masks: Vec<GrayImage>) -> Self {
        self.text_masks = masks;
        self
    }

    pub fn failing_inpaint(mut self) -> Self {
        self.fail_inpaint = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn inpaint_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Inpaint { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl InferenceClient for FakeClient {
    async fn segment(&self, image: &RgbaImage, request: &SegmentRequest) -> SceneResult<GrayImage> {
        self.record(Call::Segment(request.clone()));
        Ok(self
            .segment_mask
            .clone()
            .unwrap_or_else(|| GrayImage::new(image.width(), image.height())))
    }

    async fn segment_by_text(&self, _image: &RgbaImage, text: &str) -> SceneResult<Vec<ScoredMask>> {
        self.record(Call::SegmentByText(text.to_string()));
        Ok(self
            .text_masks
            .iter()
            .cloned()
            .map(|mask| ScoredMask { mask, score: 0.9 })
            .collect())
    }

    async fn inpaint(&self, image: &RgbaImage, mask: &GrayImage, prompt: &str) -> SceneResult<RgbaImage> {
        let masked_pixels = mask.pixels().filter(|p| p[0] > 0).count();
        self.record(Call::Inpaint {
            prompt: prompt.to_string(),
            masked_pixels,
        });
        if self.fail_inpaint {
            return Err(SceneError::inference("inpainting backend unavailable"));
        }
        let mut out = image.clone();
        for (x, y, p) in mask.enumerate_pixels() {
            if p[0] > 0 {
                out.put_pixel(x, y, INPAINT_FILL);
            }
        }
        Ok(out)
    }

    async fn generate(&self, prompt: &str) -> SceneResult<RgbaImage> {
        self.record(Call::Generate(prompt.to_string()));
        Ok(RgbaImage::from_pixel(8, 8, INPAINT_FILL))
    }

    async fn grounded_inpaint(&self, image: &RgbaImage, request: &GroundedRequest) -> SceneResult<RgbaImage> {
        self.record(Call::Grounded(request.clone()));
        Ok(RgbaImage::from_pixel(image.width(), image.height(), GROUNDED_FILL))
    }
}

/// Mask with `[x0, x1) × [y0, y1)` set to 255.
pub fn rect_mask(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let inside = (x0..x1).contains(&x) && (y0..y1).contains(&y);
        Luma([if inside { 255 } else { 0 }])
    })
}

/// Solid background with a subject painted in `[x0, x1) × [y0, y1)`.
pub fn raster_with_subject(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
            SUBJECT
        } else {
            BACKGROUND
        }
    })
}

/// A 40×30 image plus an object extracted from `[10, 20) × [5, 15)` and owned by it.
pub fn image_with_owned_object() -> (ImageEntity, ObjectEntity) {
    let raster = raster_with_subject(40, 30, 10, 5, 20, 15);
    let mut img = ImageEntity::from_raster(&raster).unwrap();
    let mut obj = mask::object_from_mask(&raster, &rect_mask(40, 30, 10, 5, 20, 15)).unwrap();
    obj.image_id = Some(img.id().clone());
    img.add_object(obj.clone());
    (img, obj)
}

pub fn pixel(img: &ImageEntity, x: u32, y: u32) -> Rgba<u8> {
    *img.raster(false).unwrap().get_pixel(x, y)
}
