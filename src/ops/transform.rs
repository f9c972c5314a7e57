use crate::{
    foundation::{
        core::{AngleUnit, Axis, Direction, ShiftUnit, Spin},
        error::{SceneResult, ensure_same_len},
    },
    geometry, guard,
    inference::InferenceClient,
    model::{BoxEntity, Entity, EntityId, ImageEntity},
    ops::{EditSession, child_mut, resolve_children},
};

/// Box around `entity`, optionally moved one box-length along `direction`.
///
/// `entity` need not belong to `image`; only the image size is read.
pub fn get_box(
    image: &ImageEntity,
    entity: &Entity,
    direction: Option<Direction>,
) -> SceneResult<BoxEntity> {
    let size = image.size()?;
    Ok(geometry::box_around(entity.props(), direction, size))
}

impl<C: InferenceClient> EditSession<C> {
    /// Resolve operands and clear the background behind any pending objects.
    async fn prepare_transform(
        &self,
        image: &mut ImageEntity,
        entities: &[Entity],
    ) -> SceneResult<Vec<EntityId>> {
        let ids = resolve_children(image, "entities", entities)?;
        guard::ensure_inpainted(&self.client, &self.settings, image, &ids).await?;
        Ok(ids)
    }

    #[tracing::instrument(skip_all, fields(image = %image.id(), entities = entities.len()))]
    pub async fn rotate_entities(
        &self,
        image: &mut ImageEntity,
        entities: &[Entity],
        angles: &[f64],
        units: &[AngleUnit],
        directions: &[Spin],
    ) -> SceneResult<()> {
        ensure_same_len(&[
            ("entities", entities.len()),
            ("angles", angles.len()),
            ("units", units.len()),
            ("directions", directions.len()),
        ])?;
        let ids = self.prepare_transform(image, entities).await?;
        for (((id, &angle), &unit), &spin) in ids.iter().zip(angles).zip(units).zip(directions) {
            geometry::rotate(child_mut(image, id)?.props_mut(), angle, unit, spin);
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(image = %image.id(), entities = entities.len()))]
    pub async fn scale_entities(
        &self,
        image: &mut ImageEntity,
        entities: &[Entity],
        factors: &[f64],
        axes: &[Option<Axis>],
    ) -> SceneResult<()> {
        ensure_same_len(&[
            ("entities", entities.len()),
            ("scales", factors.len()),
            ("axes", axes.len()),
        ])?;
        let ids = self.prepare_transform(image, entities).await?;
        for ((id, &factor), &axis) in ids.iter().zip(factors).zip(axes) {
            geometry::scale(child_mut(image, id)?.props_mut(), factor, axis);
        }
        Ok(())
    }

    /// Move each entity by its `(dx, dy)` offset, in pixels or fractions of the image.
    #[tracing::instrument(skip_all, fields(image = %image.id(), entities = entities.len()))]
    pub async fn shift_entities(
        &self,
        image: &mut ImageEntity,
        entities: &[Entity],
        offsets: &[(f64, f64)],
        unit: ShiftUnit,
    ) -> SceneResult<()> {
        ensure_same_len(&[("entities", entities.len()), ("offsets", offsets.len())])?;
        let size = image.size()?;
        let ids = self.prepare_transform(image, entities).await?;
        for (id, &(dx, dy)) in ids.iter().zip(offsets) {
            geometry::shift(child_mut(image, id)?.props_mut(), dx, dy, unit, size);
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(image = %image.id(), entities = entities.len()))]
    pub async fn flip_entities(
        &self,
        image: &mut ImageEntity,
        entities: &[Entity],
        axes: &[Axis],
    ) -> SceneResult<()> {
        ensure_same_len(&[("entities", entities.len()), ("axes", axes.len())])?;
        let ids = self.prepare_transform(image, entities).await?;
        for (id, &axis) in ids.iter().zip(axes) {
            geometry::flip(child_mut(image, id)?.props_mut(), axis);
        }
        Ok(())
    }
}
