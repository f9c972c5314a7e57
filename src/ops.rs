//! Agent-callable editing operations over an [`ImageEntity`].
//!
//! Operations that can move or drop an extracted object run the inpaint guard
//! first. Every batch validates and resolves all operands before the first
//! mutation, so a failing batch leaves the image untouched.

mod detect;
mod layers;
mod transform;

pub use detect::{QuantityMismatch, SegmentPrompts, Segmentation};
pub use layers::{Placement, apply_filter, paste_entities};
pub use transform::get_box;

use std::collections::HashSet;

use crate::{
    foundation::error::{SceneError, SceneResult, ensure_non_empty},
    inference::InferenceClient,
    model::{Entity, EntityId, ImageEntity},
    settings::EditSettings,
};

/// Inference client plus settings; the async operations hang off this.
pub struct EditSession<C> {
    client: C,
    settings: EditSettings,
}

impl<C: InferenceClient> EditSession<C> {
    pub fn new(client: C) -> Self {
        Self::with_settings(client, EditSettings::default())
    }

    pub fn with_settings(client: C, settings: EditSettings) -> Self {
        Self { client, settings }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn settings(&self) -> &EditSettings {
        &self.settings
    }
}

/// Ids of `entities`, each of which must be a child of `image`.
pub(crate) fn resolve_children(
    image: &ImageEntity,
    name: &str,
    entities: &[Entity],
) -> SceneResult<Vec<EntityId>> {
    ensure_non_empty(name, entities.len())?;
    entities
        .iter()
        .map(|e| {
            if image.contains(e.id()) {
                Ok(e.id().clone())
            } else {
                Err(SceneError::ownership(format!(
                    "{} '{}' is not part of image '{}'",
                    e.kind().slug(),
                    e.id(),
                    image.id()
                )))
            }
        })
        .collect()
}

/// Borrow the child `id` mutably; callers resolve ids first.
pub(crate) fn child_mut<'a>(image: &'a mut ImageEntity, id: &EntityId) -> SceneResult<&'a mut Entity> {
    let image_id = image.id().clone();
    image
        .child_mut(id)
        .ok_or_else(|| SceneError::ownership(format!("'{id}' is not part of image '{image_id}'")))
}

/// Give `entity` a fresh id if `image` or the batch so far (`taken`) already uses its id.
pub(crate) fn detach_id(
    image: &ImageEntity,
    taken: &mut HashSet<EntityId>,
    mut entity: Entity,
) -> Entity {
    let id = entity.id();
    if image.contains(id) || image.id() == id || taken.contains(id) {
        entity.props_mut().id = EntityId::new();
    }
    taken.insert(entity.id().clone());
    entity
}
