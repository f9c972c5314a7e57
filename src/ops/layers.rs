use std::collections::HashSet;

use crate::{
    foundation::{
        core::{Point, Position},
        error::{SceneError, SceneResult, ensure_non_empty, ensure_same_len},
    },
    geometry, guard,
    inference::InferenceClient,
    model::{BoxEntity, Entity, EntityId, EntityKind, ImageEntity, ImageFilter, PointEntity},
    ops::{EditSession, child_mut, detach_id, resolve_children},
};

/// Where [`paste_entities`] puts an entity.
#[derive(Clone, Debug, PartialEq)]
pub enum Placement {
    /// Against an image edge, or just outside the anchor entity.
    Named(Position),
    /// Centered on the point.
    Point(PointEntity),
    /// Centered in the box, shrunk to fit.
    Box(BoxEntity),
    /// Centered on center-relative coordinates.
    Coordinates(Point),
}

/// Add copies of `entities` to `image`, one placement per entity.
///
/// With an entity `anchor`, named placements put the entity just outside the
/// anchor; without one (or with an image anchor) they resolve against the
/// image bounds. Returns the ids of the pasted copies.
#[tracing::instrument(skip_all, fields(image = %image.id(), entities = entities.len()))]
pub fn paste_entities(
    image: &mut ImageEntity,
    entities: &[Entity],
    positions: &[Placement],
    anchor: Option<&Entity>,
) -> SceneResult<Vec<EntityId>> {
    ensure_non_empty("entities", entities.len())?;
    ensure_same_len(&[("entities", entities.len()), ("positions", positions.len())])?;
    let size = image.size()?;
    let anchor = anchor.filter(|a| !matches!(a, Entity::Image(_)));

    let mut taken = HashSet::new();
    let mut placed = Vec::with_capacity(entities.len());
    for (entity, position) in entities.iter().zip(positions) {
        let mut entity = detach_id(image, &mut taken, entity.clone());
        let props = entity.props_mut();
        let center = match position {
            Placement::Named(pos) => match anchor {
                Some(a) => geometry::place_beside(a.props(), *pos, props.width, props.height),
                None => geometry::place_in_image(*pos, props.width, props.height, size),
            },
            Placement::Point(p) => geometry::center_of(&p.props),
            Placement::Box(b) => {
                let fit = geometry::fit_into_box(&b.props, props)?;
                props.scale_x *= fit.scale;
                props.scale_y *= fit.scale;
                fit.center
            }
            Placement::Coordinates(p) => *p,
        };
        geometry::move_center_to(props, center);
        placed.push(entity);
    }

    let ids = placed.iter().map(|e| e.id().clone()).collect();
    image.add_objects(placed);
    Ok(ids)
}

/// Append a named filter to the whole image, or to selected image/object children.
pub fn apply_filter(
    image: &mut ImageEntity,
    name: &str,
    value: Option<f64>,
    entities: Option<&[Entity]>,
) -> SceneResult<()> {
    let filter = ImageFilter::from_name(name, value)?;
    let Some(entities) = entities.filter(|e| !e.is_empty()) else {
        image.apply_filter(filter.into())?;
        return Ok(());
    };

    let ids = resolve_children(image, "entities", entities)?;
    for id in &ids {
        let kind = image.child(id).map(Entity::kind);
        if !matches!(kind, Some(EntityKind::Image | EntityKind::Object)) {
            return Err(SceneError::validation(format!(
                "filters apply to images and objects, not '{id}'"
            )));
        }
    }
    for id in &ids {
        match child_mut(image, id)? {
            Entity::Image(nested) => {
                nested.apply_filter(filter.clone().into())?;
            }
            Entity::Object(obj) => obj.filters.push(filter.clone().into()),
            _ => {}
        }
    }
    Ok(())
}

impl<C: InferenceClient> EditSession<C> {
    /// Remove children from `image`, inpainting behind any pending objects.
    #[tracing::instrument(skip_all, fields(image = %image.id(), entities = entities.len()))]
    pub async fn remove_entities(
        &self,
        image: &mut ImageEntity,
        entities: &[Entity],
    ) -> SceneResult<()> {
        let ids = resolve_children(image, "entities", entities)?;
        guard::ensure_inpainted(&self.client, &self.settings, image, &ids).await?;
        image.remove_objects(&ids.into_iter().collect());
        Ok(())
    }

    /// Swap each target for its replacement, keeping the target's position
    /// and overall extent. Returns the ids of the inserted replacements.
    #[tracing::instrument(skip_all, fields(image = %image.id(), targets = targets.len()))]
    pub async fn replace_entities(
        &self,
        image: &mut ImageEntity,
        targets: &[Entity],
        replacements: &[Entity],
    ) -> SceneResult<Vec<EntityId>> {
        ensure_same_len(&[
            ("targets", targets.len()),
            ("replacements", replacements.len()),
        ])?;
        let ids = resolve_children(image, "targets", targets)?;

        let mut taken = HashSet::new();
        let mut placed = Vec::with_capacity(replacements.len());
        for (id, replacement) in ids.iter().zip(replacements) {
            let target = image
                .child(id)
                .map(|e| e.props().clone())
                .ok_or_else(|| SceneError::ownership(format!("'{id}' is not part of the image")))?;
            let mut replacement = detach_id(image, &mut taken, replacement.clone());
            let props = replacement.props_mut();
            let factor = geometry::replacement_scale(&target, props)?;
            props.left = target.left;
            props.top = target.top;
            props.scale_x *= factor;
            props.scale_y *= factor;
            placed.push(replacement);
        }

        guard::ensure_inpainted(&self.client, &self.settings, image, &ids).await?;
        let out = placed.iter().map(|e| e.id().clone()).collect();
        image.remove_objects(&ids.into_iter().collect::<HashSet<_>>());
        image.add_objects(placed);
        Ok(out)
    }

    /// Inpaint behind owned objects with a custom prompt, then drop them.
    #[tracing::instrument(skip_all, fields(image = %image.id(), objects = objects.len()))]
    pub async fn inpaint_objects(
        &self,
        image: &mut ImageEntity,
        objects: &[Entity],
        prompt: &str,
    ) -> SceneResult<()> {
        let ids = resolve_children(image, "objects", objects)?;
        if let Some(id) = ids
            .iter()
            .find(|id| !matches!(image.child(id), Some(Entity::Object(_))))
        {
            return Err(SceneError::validation(format!(
                "only objects can be inpainted, '{id}' is not one"
            )));
        }
        guard::inpaint_behind(&self.client, &self.settings, image, &ids, prompt).await?;
        image.remove_objects(&ids.into_iter().collect());
        Ok(())
    }
}
