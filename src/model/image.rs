use std::collections::HashSet;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::{
    foundation::{
        core::ImageSize,
        error::{SceneError, SceneResult},
    },
    model::{
        entity::{Entity, EntityId, EntityProps, ObjectEntity},
        filter::Filter,
    },
    raster,
};

/// Editable image: a base raster layer plus overlaid child entities.
///
/// `objects[0]` is always the base raster layer; children follow in paint
/// order. Children are owned exclusively and carry no back-pointer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageEntity {
    #[serde(flatten)]
    pub props: EntityProps,
    #[serde(default)]
    pub objects: Vec<Entity>,
}

impl ImageEntity {
    /// Wrap a raster as a new image with an empty child list.
    pub fn from_raster(raster: &RgbaImage) -> SceneResult<Self> {
        let (width, height) = raster.dimensions();
        let base = ObjectEntity {
            props: EntityProps::with_footprint(0.0, 0.0, f64::from(width), f64::from(height)),
            src: raster::encode_data_url(raster)?,
            ..ObjectEntity::default()
        };
        Ok(Self {
            props: EntityProps::with_footprint(0.0, 0.0, f64::from(width), f64::from(height)),
            objects: vec![Entity::Object(base)],
        })
    }

    pub fn id(&self) -> &EntityId {
        &self.props.id
    }

    pub fn base_layer(&self) -> SceneResult<&ObjectEntity> {
        match self.objects.first() {
            Some(Entity::Object(base)) => Ok(base),
            _ => Err(SceneError::validation(format!(
                "image '{}' has no base raster layer",
                self.props.id
            ))),
        }
    }

    pub fn base_layer_mut(&mut self) -> SceneResult<&mut ObjectEntity> {
        let id = self.props.id.clone();
        match self.objects.first_mut() {
            Some(Entity::Object(base)) => Ok(base),
            _ => Err(SceneError::validation(format!(
                "image '{id}' has no base raster layer"
            ))),
        }
    }

    /// Raster dimensions recorded on the base layer.
    pub fn size(&self) -> SceneResult<ImageSize> {
        let base = self.base_layer()?;
        Ok(ImageSize::new(
            base.props.width.round().max(0.0) as u32,
            base.props.height.round().max(0.0) as u32,
        ))
    }

    /// Children, excluding the base raster layer.
    pub fn objects(&self) -> &[Entity] {
        self.objects.get(1..).unwrap_or(&[])
    }

    pub fn objects_mut(&mut self) -> &mut [Entity] {
        self.objects.get_mut(1..).unwrap_or(&mut [])
    }

    pub fn child(&self, id: &EntityId) -> Option<&Entity> {
        self.objects().iter().find(|e| e.id() == id)
    }

    pub fn child_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.objects_mut().iter_mut().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.child(id).is_some()
    }

    /// `true` when `object` was extracted from this image.
    pub fn owns(&self, object: &ObjectEntity) -> bool {
        object.image_id.as_ref() == Some(&self.props.id)
    }

    pub fn add_object(&mut self, entity: impl Into<Entity>) -> &mut Self {
        self.objects.push(entity.into());
        self
    }

    pub fn add_objects<I>(&mut self, entities: I) -> &mut Self
    where
        I: IntoIterator<Item = Entity>,
    {
        self.objects.extend(entities);
        self
    }

    /// Drop every child whose id is in `ids`. The base layer is never removed.
    pub fn remove_objects(&mut self, ids: &HashSet<EntityId>) -> &mut Self {
        let mut index = 0usize;
        self.objects.retain(|e| {
            let keep = index == 0 || !ids.contains(e.id());
            index += 1;
            keep
        });
        self
    }

    pub fn remove_object(&mut self, id: &EntityId) -> &mut Self {
        self.remove_objects(&HashSet::from([id.clone()]))
    }

    /// Existing children whose `(left, top, width, height)` equals that of one of `others`.
    pub fn same_footprint<'a>(&'a self, others: &[Entity]) -> Vec<&'a Entity> {
        let keys: Vec<_> = others.iter().map(|e| e.props().footprint()).collect();
        self.objects()
            .iter()
            .filter(|e| keys.contains(&e.props().footprint()))
            .collect()
    }

    /// Decode the base raster, optionally folding its filter list in order.
    pub fn raster(&self, apply_filters: bool) -> SceneResult<RgbaImage> {
        let base = self.base_layer()?;
        if base.src.is_empty() {
            return Err(SceneError::validation(format!(
                "image '{}' has no raster source",
                self.props.id
            )));
        }
        let mut out = raster::decode_data_url(&base.src)?;
        if apply_filters {
            for filter in &base.filters {
                out = raster::apply_filter(out, filter)?;
            }
        }
        Ok(out)
    }

    /// Replace the base raster source and its recorded dimensions.
    pub fn set_raster(&mut self, raster: &RgbaImage) -> SceneResult<()> {
        let src = raster::encode_data_url(raster)?;
        let (width, height) = raster.dimensions();
        let base = self.base_layer_mut()?;
        base.src = src;
        base.props.width = f64::from(width);
        base.props.height = f64::from(height);
        Ok(())
    }

    /// Append `filter` to the base layer and to every nested image.
    pub fn apply_filter(&mut self, filter: Filter) -> SceneResult<&mut Self> {
        for child in self.objects.iter_mut().skip(1) {
            if let Entity::Image(nested) = child {
                nested.apply_filter(filter.clone())?;
            }
        }
        self.base_layer_mut()?.filters.push(filter);
        Ok(self)
    }
}
