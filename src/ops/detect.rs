use std::collections::HashSet;

use image::GrayImage;

use crate::{
    foundation::{
        core::ImageSize,
        error::{SceneError, SceneResult, ensure_non_empty, ensure_same_len},
    },
    geometry,
    inference::{GroundedRequest, InferenceClient, LabeledPoint, PixelBox, SegmentRequest},
    mask,
    model::{
        BoxEntity, Entity, EntityId, EntityProps, ImageEntity, ObjectEntity, PointEntity,
        ScribbleEntity, TextEntity,
    },
    ops::EditSession,
};

/// Prompts for [`EditSession::segment_object`]; at least one must be set.
#[derive(Clone, Debug, Default)]
pub struct SegmentPrompts {
    pub region: Option<BoxEntity>,
    pub positive_points: Vec<PointEntity>,
    pub negative_points: Vec<PointEntity>,
    pub positive_scribble: Option<ScribbleEntity>,
    pub negative_scribble: Option<ScribbleEntity>,
}

impl SegmentPrompts {
    fn is_empty(&self) -> bool {
        self.region.is_none()
            && self.positive_points.is_empty()
            && self.negative_points.is_empty()
            && self.positive_scribble.is_none()
            && self.negative_scribble.is_none()
    }
}

/// Detected count differs from what the caller asked for.
#[derive(Clone, Debug)]
pub struct QuantityMismatch {
    pub prompt: String,
    pub expected: usize,
    pub detected: usize,
    /// Copy of the image with a numbered label and a red box per detection.
    pub annotated: ImageEntity,
}

/// Objects found by [`EditSession::segment_objects`].
#[derive(Clone, Debug)]
pub struct Segmentation {
    pub objects: Vec<ObjectEntity>,
    pub mismatch: Option<QuantityMismatch>,
}

fn pixel_of(props: &EntityProps, size: ImageSize) -> (i64, i64) {
    let p = geometry::to_absolute(geometry::center_of(props), size);
    (p.x.trunc() as i64, p.y.trunc() as i64)
}

/// Drop children that share a footprint with `fresh`, then add `fresh` as owned objects.
fn adopt(image: &mut ImageEntity, fresh: &mut [ObjectEntity]) {
    for obj in fresh.iter_mut() {
        obj.image_id = Some(image.id().clone());
    }
    let probes: Vec<Entity> = fresh.iter().cloned().map(Entity::from).collect();
    let stale: HashSet<EntityId> = image
        .same_footprint(&probes)
        .into_iter()
        .map(|e| e.id().clone())
        .collect();
    if !stale.is_empty() {
        tracing::debug!(replaced = stale.len(), "superseding detections with same footprint");
    }
    image.remove_objects(&stale);
    image.add_objects(probes);
}

fn annotate(image: &ImageEntity, objects: &[ObjectEntity]) -> ImageEntity {
    let mut annotated = image.clone();
    annotated.props.id = EntityId::new();
    annotated.props.name = Some("annotated_image".to_owned());
    annotated.props.reference = None;

    for (i, obj) in objects.iter().enumerate() {
        let p = &obj.props;
        let short_side = p.width.min(p.height);

        let mut label = TextEntity::new((i + 1).to_string());
        label.props.left = p.left;
        label.props.top = p.top;
        label.props.ephemeral = true;
        label.font_size = short_side / 2.0;
        label.fill = "red".to_owned();

        let mut frame = BoxEntity {
            props: EntityProps::with_footprint(p.left, p.top, p.width, p.height),
            fill: Some("transparent".to_owned()),
            stroke: Some("red".to_owned()),
            stroke_width: short_side / 20.0,
        };
        frame.props.ephemeral = true;

        annotated.add_object(label);
        annotated.add_object(frame);
    }
    annotated
}

impl<C: InferenceClient> EditSession<C> {
    /// Segment one object from prompts and add it to `image` as an owned object.
    #[tracing::instrument(skip_all, fields(image = %image.id()))]
    pub async fn segment_object(
        &self,
        image: &mut ImageEntity,
        prompts: &SegmentPrompts,
    ) -> SceneResult<ObjectEntity> {
        if prompts.is_empty() {
            return Err(SceneError::validation(
                "segment_object needs a box, points or a scribble",
            ));
        }
        let raster = image.raster(true)?;
        let size = ImageSize::new(raster.width(), raster.height());

        let region = prompts.region.as_ref().map(|b| {
            let r = geometry::bounding_box(&b.props, size);
            let (x0, y0) = (r.x0.trunc() as i64, r.y0.trunc() as i64);
            PixelBox {
                x_min: x0,
                y_min: y0,
                x_max: x0 + b.props.width.trunc() as i64,
                y_max: y0 + b.props.height.trunc() as i64,
            }
        });

        let mut points = Vec::new();
        for p in &prompts.positive_points {
            let (x, y) = pixel_of(&p.props, size);
            points.push(LabeledPoint::foreground(x, y));
        }
        for p in &prompts.negative_points {
            let (x, y) = pixel_of(&p.props, size);
            points.push(LabeledPoint::background(x, y));
        }
        let scribbles = [
            (prompts.positive_scribble.as_ref(), true),
            (prompts.negative_scribble.as_ref(), false),
        ];
        for (scribble, positive) in scribbles {
            let Some(scribble) = scribble else {
                continue;
            };
            let m = mask::scribble_mask(scribble, size, self.settings.scribble_raster());
            for (x, y) in mask::mask_to_points(&m, self.settings.mask_point_count) {
                let (x, y) = (i64::from(x), i64::from(y));
                points.push(if positive {
                    LabeledPoint::foreground(x, y)
                } else {
                    LabeledPoint::background(x, y)
                });
            }
        }

        let request = SegmentRequest { points, region };
        request.validate()?;
        let m = self.client.segment(&raster, &request).await?;
        let obj = mask::object_from_mask(&raster, &m)?;

        let mut fresh = [obj];
        adopt(image, &mut fresh);
        let [obj] = fresh;
        Ok(obj)
    }

    /// Segment every instance matching `prompt` and add them as owned objects.
    ///
    /// A detected count other than `expected_quantity` is reported through
    /// [`Segmentation::mismatch`], not as an error.
    #[tracing::instrument(skip_all, fields(image = %image.id(), prompt))]
    pub async fn segment_objects(
        &self,
        image: &mut ImageEntity,
        prompt: &str,
        expected_quantity: usize,
    ) -> SceneResult<Segmentation> {
        let raster = image.raster(true)?;
        let masks = self.client.segment_by_text(&raster, prompt).await?;
        let detected = masks.len();

        let mut objects = Vec::with_capacity(masks.len());
        for scored in &masks {
            match mask::object_from_mask(&raster, &scored.mask) {
                Ok(obj) => objects.push(obj),
                Err(SceneError::DegenerateGeometry(_)) => {
                    tracing::warn!(score = scored.score, "skipping empty segmentation mask");
                }
                Err(err) => return Err(err),
            }
        }
        if objects.is_empty() {
            tracing::warn!(prompt, "text segmentation found nothing");
        }
        adopt(image, &mut objects);

        let mismatch = (detected != expected_quantity).then(|| QuantityMismatch {
            prompt: prompt.to_owned(),
            expected: expected_quantity,
            detected,
            annotated: annotate(image, &objects),
        });
        Ok(Segmentation { objects, mismatch })
    }

    /// Paint `prompt` inside the scribbled region and add the result as a new object.
    ///
    /// The base raster is left as it was; the generated pixels live only in
    /// the new object, which is not owned by `image`.
    #[tracing::instrument(skip_all, fields(image = %image.id(), prompt))]
    pub async fn generate_object(
        &self,
        image: &mut ImageEntity,
        prompt: &str,
        location: &ScribbleEntity,
    ) -> SceneResult<ObjectEntity> {
        let raster = image.raster(true)?;
        let size = ImageSize::new(raster.width(), raster.height());
        let region = mask::scribble_mask(location, size, self.settings.scribble_raster());
        if mask::mask_bounds(&region).is_none() {
            return Err(SceneError::degenerate("scribble covers no pixels"));
        }
        let expanded: GrayImage =
            mask::dilate(&region, self.settings.mask_threshold, self.settings.mask_dilation_px);

        let generated = self.client.inpaint(&raster, &expanded, prompt).await?;
        if generated.dimensions() != raster.dimensions() {
            return Err(SceneError::inference(format!(
                "inpainting returned {:?}, expected {:?}",
                generated.dimensions(),
                raster.dimensions()
            )));
        }
        let obj = mask::object_from_mask(&generated, &region)?;
        image.add_object(obj.clone());
        Ok(obj)
    }

    /// Grounded generation: each phrase is painted inside its box.
    #[tracing::instrument(skip_all, fields(image = %image.id(), phrases = phrases.len()))]
    pub async fn generate_objects(
        &self,
        image: &mut ImageEntity,
        prompt: &str,
        phrases: &[String],
        locations: &[BoxEntity],
    ) -> SceneResult<()> {
        ensure_non_empty("phrases", phrases.len())?;
        ensure_same_len(&[("phrases", phrases.len()), ("locations", locations.len())])?;
        let raster = image.raster(false)?;
        let size = ImageSize::new(raster.width(), raster.height());

        let boxes = locations
            .iter()
            .map(|b| geometry::normalized_box(&b.props, size))
            .collect::<SceneResult<Vec<_>>>()?;
        let request = GroundedRequest {
            prompt: prompt.to_owned(),
            phrases: phrases.to_vec(),
            boxes,
            seed: self.settings.grounding_seed,
        };
        request.validate()?;

        let result = self.client.grounded_inpaint(&raster, &request).await?;
        image.set_raster(&result)?;
        Ok(())
    }
}
