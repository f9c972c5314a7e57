use std::collections::HashSet;

use crate::{
    context::{
        markup::{self, DisplayToken},
        message::Message,
        namespace::Namespace,
    },
    foundation::error::{SceneError, SceneResult},
    model::{Entity, EntityId, Reference},
};

/// Entity carrying the reference `uuid`: an attachment, a direct child of
/// one, or failing that anything already bound in the namespace.
fn resolve_display<'a>(
    attachments: &'a [Entity],
    namespace: &'a Namespace,
    token: &DisplayToken<'_>,
) -> SceneResult<&'a Entity> {
    let carries = |e: &&Entity| e.reference().is_some_and(|r| r.uuid == token.uuid);
    attachments
        .iter()
        .find(carries)
        .or_else(|| {
            attachments
                .iter()
                .filter_map(Entity::as_image)
                .flat_map(|img| img.objects())
                .find(carries)
        })
        .or_else(|| namespace.find_by_reference(token.uuid))
        .ok_or_else(|| {
            SceneError::resolution(format!(
                "no entity carries reference '{}' ({})",
                token.uuid, token.label
            ))
        })
}

/// Drop ephemeral children of an image attachment.
fn prune_ephemeral(mut entity: Entity) -> Entity {
    if let Entity::Image(img) = &mut entity {
        let ephemeral: HashSet<EntityId> = img
            .objects()
            .iter()
            .filter(|c| c.props().ephemeral)
            .map(|c| c.id().clone())
            .collect();
        if !ephemeral.is_empty() {
            tracing::debug!(image = %img.id(), dropped = ephemeral.len(), "dropping ephemeral children");
            img.remove_objects(&ephemeral);
        }
    }
    entity
}

/// Display form → namespace form, binding every referenced entity and
/// attachment in `namespace`. Messages already in namespace form are
/// returned unchanged.
#[tracing::instrument(skip_all)]
pub fn contextualize(message: &Message, namespace: &mut Namespace) -> SceneResult<Message> {
    let Message::Display { text, attachments } = message else {
        return Ok(message.clone());
    };

    let tokens = markup::display_tokens(text)?;
    let referenced = tokens
        .iter()
        .map(|t| resolve_display(attachments, namespace, t).cloned())
        .collect::<SceneResult<Vec<_>>>()?;

    let mut edits = Vec::with_capacity(tokens.len());
    for (token, entity) in tokens.iter().zip(referenced) {
        let name = namespace.bind(prune_ephemeral(entity));
        edits.push((token.span.clone(), format!("@{name}")));
    }

    let names = attachments
        .iter()
        .cloned()
        .map(|a| namespace.bind(prune_ephemeral(a)))
        .collect();

    Ok(Message::Namespace {
        text: markup::splice(text, &edits),
        attachments: names,
    })
}

fn label_for(name: &str) -> &str {
    match name.split('_').next() {
        Some(head) if !head.is_empty() => head,
        _ => name,
    }
}

/// Namespace form → display form, minting references for entities that
/// have none yet. Messages already in display form are returned unchanged.
#[tracing::instrument(skip_all)]
pub fn decontextualize(message: &Message, namespace: &mut Namespace) -> SceneResult<Message> {
    let Message::Namespace { text, attachments } = message else {
        return Ok(message.clone());
    };

    let tokens = markup::namespace_tokens(text)?;
    for name in tokens.iter().map(|t| t.name).chain(attachments.iter().map(String::as_str)) {
        namespace.entity(name)?;
    }

    let mut edits = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let entity = namespace.entity(token.name)?;
        let reference = match entity.reference() {
            Some(r) => r.clone(),
            None => {
                let id = entity.id().clone();
                let r = Reference::mint(label_for(token.name));
                tracing::debug!(slot = token.name, uuid = %r.uuid, "minted reference");
                namespace.set_reference(&id, &r);
                r
            }
        };
        edits.push((token.span.clone(), reference.markup()));
    }

    let values = attachments
        .iter()
        .map(|name| namespace.entity(name).cloned())
        .collect::<SceneResult<Vec<_>>>()?;

    Ok(Message::Display {
        text: markup::splice(text, &edits),
        attachments: values,
    })
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;
    use crate::{
        context::namespace::Value,
        model::{BoxEntity, ImageEntity, TextEntity},
    };

    fn image_with_box() -> (ImageEntity, BoxEntity) {
        let mut img = ImageEntity::from_raster(&RgbaImage::new(4, 4)).unwrap();
        let mut b = BoxEntity::top_left(0.0, 0.0, 1.0, 1.0);
        b.props.reference = Some(Reference::new("box", "00ff00", "u-box"));
        img.add_object(b.clone());
        img.props.reference = Some(Reference::new("image", "ff0000", "u-img"));
        (img, b)
    }

    #[test]
    fn contextualize_binds_tokens_and_attachments() {
        let (img, b) = image_with_box();
        let m = Message::display(
            "crop #00ff00[box](u-box) out of #ff0000[image](u-img)",
            vec![img.clone().into()],
        );
        let mut ns = Namespace::new();
        let out = contextualize(&m, &mut ns).unwrap();
        let Message::Namespace { text, attachments } = &out else {
            panic!("expected namespace form");
        };
        assert_eq!(text, "crop @box_0 out of @image_0");
        assert_eq!(attachments, &vec!["image_0".to_string()]);
        assert_eq!(ns.entity("box_0").unwrap().id(), &b.props.id);
        assert_eq!(ns.entity("image_0").unwrap().id(), img.id());
    }

    #[test]
    fn unresolvable_token_leaves_namespace_untouched() {
        let (img, _) = image_with_box();
        let m = Message::display("see #123456[ghost](nope)", vec![img.into()]);
        let mut ns = Namespace::new();
        assert!(matches!(
            contextualize(&m, &mut ns),
            Err(SceneError::Resolution(_))
        ));
        assert!(ns.is_empty());
    }

    #[test]
    fn ephemeral_children_are_dropped() {
        let (mut img, _) = image_with_box();
        let mut t = TextEntity::new("1");
        t.props.ephemeral = true;
        img.add_object(t);
        let m = Message::display("look", vec![img.into()]);
        let mut ns = Namespace::new();
        contextualize(&m, &mut ns).unwrap();
        let stored = ns.entity("image_0").unwrap().as_image().unwrap();
        assert_eq!(stored.objects().len(), 1);
    }

    #[test]
    fn decontextualize_mints_and_propagates() {
        let mut img = ImageEntity::from_raster(&RgbaImage::new(4, 4)).unwrap();
        let b = BoxEntity::top_left(0.0, 0.0, 1.0, 1.0);
        img.add_object(b.clone());
        let mut ns = Namespace::new();
        ns.insert("image_0", Entity::from(img));
        ns.insert("box_0", Entity::from(b.clone()));

        let m = Message::Namespace {
            text: "here is @box_0 and @box_0 again".into(),
            attachments: vec!["image_0".into()],
        };
        let out = decontextualize(&m, &mut ns).unwrap();
        let r = ns.entity("box_0").unwrap().reference().cloned().unwrap();
        assert_eq!(r.label, "box");
        let Message::Display { text, attachments } = &out else {
            panic!("expected display form");
        };
        assert_eq!(text, &format!("here is {} and {} again", r.markup(), r.markup()));
        let child = attachments[0].as_image().unwrap().objects()[0].reference();
        assert_eq!(child, Some(&r));
    }

    #[test]
    fn non_entity_token_is_a_resolution_error() {
        let mut ns = Namespace::new();
        ns.insert("count", Value::Number(1.0));
        let m = Message::Namespace {
            text: "use @count".into(),
            attachments: vec![],
        };
        assert!(matches!(
            decontextualize(&m, &mut ns),
            Err(SceneError::Resolution(_))
        ));
    }

    #[test]
    fn forms_are_inverse_and_idempotent() {
        let (img, _) = image_with_box();
        let m = Message::display(
            "put #00ff00[box](u-box) on #ff0000[image](u-img), thanks",
            vec![img.into()],
        );
        let mut ns = Namespace::new();
        let ctx = contextualize(&m, &mut ns).unwrap();
        assert_eq!(contextualize(&ctx, &mut ns).unwrap(), ctx);
        assert_eq!(decontextualize(&ctx, &mut ns).unwrap(), m);
        assert_eq!(decontextualize(&m, &mut ns).unwrap(), m);

        let back = decontextualize(&ctx, &mut ns).unwrap();
        assert_eq!(contextualize(&back, &mut ns).unwrap(), ctx);
    }

    #[test]
    fn free_text_name_hints_still_roundtrip() {
        let mut img = ImageEntity::from_raster(&RgbaImage::new(4, 4)).unwrap();
        let mut t = TextEntity::new("meow");
        t.props.name = Some("my cat".into());
        t.props.reference = Some(Reference::new("cat", "ff0000", "u-1"));
        img.add_object(t);
        img.props.reference = Some(Reference::new("image", "0000ff", "u-img"));
        let m = Message::display("see #ff0000[cat](u-1)", vec![img.into()]);

        let mut ns = Namespace::new();
        let ctx = contextualize(&m, &mut ns).unwrap();
        assert_eq!(ctx.text(), "see @my_cat_0");
        assert_eq!(decontextualize(&ctx, &mut ns).unwrap(), m);
    }

    #[test]
    fn label_uses_first_name_segment() {
        assert_eq!(label_for("annotated_image_0"), "annotated");
        assert_eq!(label_for("_tmp"), "_tmp");
    }
}
