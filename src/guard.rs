//! Background regeneration behind owned objects before they move or vanish.
//!
//! An object extracted from an image still shows through the base raster
//! until the region behind it is inpainted. Any operation that relocates,
//! transforms, removes or replaces such an object runs
//! [`ensure_inpainted`] first.

use crate::{
    foundation::error::SceneResult,
    inference::InferenceClient,
    mask,
    model::{Entity, EntityId, ImageEntity, ObjectEntity},
    settings::EditSettings,
};

/// Children among `ids` that are objects owned by `image` and not yet inpainted.
pub fn pending_objects(image: &ImageEntity, ids: &[EntityId]) -> Vec<EntityId> {
    let mut out: Vec<EntityId> = Vec::new();
    for id in ids {
        let Some(Entity::Object(obj)) = image.child(id) else {
            continue;
        };
        if image.owns(obj) && !obj.inpainted && !out.contains(id) {
            out.push(id.clone());
        }
    }
    out
}

/// Inpaint behind every pending object among `ids` using the removal prompt.
///
/// Returns the ids that were processed; an empty result means nothing was
/// sent to the inference client.
#[tracing::instrument(skip_all, fields(image = %image.id(), operands = ids.len()))]
pub async fn ensure_inpainted<C>(
    client: &C,
    settings: &EditSettings,
    image: &mut ImageEntity,
    ids: &[EntityId],
) -> SceneResult<Vec<EntityId>>
where
    C: InferenceClient + ?Sized,
{
    let pending = pending_objects(image, ids);
    if pending.is_empty() {
        tracing::debug!("no owned objects awaiting inpaint");
        return Ok(pending);
    }
    inpaint_behind(client, settings, image, &pending, &settings.removal_prompt).await?;
    Ok(pending)
}

/// Regenerate the region under the objects `ids` with `prompt` and mark them inpainted.
///
/// Ids that are not object children of `image` are ignored. The base raster
/// is inpainted without its filters, which stay on the layer.
pub async fn inpaint_behind<C>(
    client: &C,
    settings: &EditSettings,
    image: &mut ImageEntity,
    ids: &[EntityId],
    prompt: &str,
) -> SceneResult<()>
where
    C: InferenceClient + ?Sized,
{
    let objects: Vec<&ObjectEntity> = ids
        .iter()
        .filter_map(|id| image.child(id).and_then(Entity::as_object))
        .collect();
    let composite = mask::composite_mask(image, &objects)?;
    let expanded = mask::dilate(&composite, settings.mask_threshold, settings.mask_dilation_px);
    let raster = image.raster(false)?;

    tracing::debug!(objects = objects.len(), prompt, "inpainting behind objects");
    let result = client.inpaint(&raster, &expanded, prompt).await?;
    image.set_raster(&result)?;

    for id in ids {
        if let Some(obj) = image.child_mut(id).and_then(Entity::as_object_mut) {
            obj.inpainted = true;
        }
    }
    Ok(())
}
