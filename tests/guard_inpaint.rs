mod common;

use common::{
    BACKGROUND, Call, FakeClient, INPAINT_FILL, SUBJECT, image_with_owned_object, pixel,
};
use sceneedit::{
    AngleUnit, EditSession, EditSettings, Entity, SceneError, Spin, TextEntity, guard,
};

#[tokio::test]
async fn removing_an_owned_object_fills_the_hole() {
    let (mut img, obj) = image_with_owned_object();
    assert_eq!(pixel(&img, 15, 10), SUBJECT);

    let session = EditSession::new(FakeClient::new());
    session
        .remove_entities(&mut img, &[Entity::from(obj.clone())])
        .await
        .unwrap();

    assert!(img.child(&obj.props.id).is_none());
    assert!(img.objects().is_empty());
    assert_eq!(pixel(&img, 15, 10), INPAINT_FILL);
    assert_eq!(pixel(&img, 0, 0), BACKGROUND);

    let calls = session.client().calls();
    assert_eq!(calls.len(), 1);
    let Call::Inpaint { prompt, masked_pixels } = &calls[0] else {
        panic!("expected an inpaint call, got {calls:?}");
    };
    assert_eq!(prompt, &EditSettings::default().removal_prompt);
    assert!(*masked_pixels > 100, "dilated mask should exceed the 10x10 object");
}

#[tokio::test]
async fn guard_runs_once_per_object() {
    let (mut img, obj) = image_with_owned_object();
    let session = EditSession::new(FakeClient::new());
    let operand = [Entity::from(obj.clone())];

    for _ in 0..2 {
        session
            .rotate_entities(&mut img, &operand, &[90.0], &[AngleUnit::Degree], &[Spin::Cw])
            .await
            .unwrap();
    }

    assert_eq!(session.client().inpaint_calls(), 1);
    let stored = img.child(&obj.props.id).and_then(Entity::as_object).unwrap();
    assert!(stored.inpainted);
    assert_eq!(stored.props.angle, 180.0);
}

#[tokio::test]
async fn unowned_objects_skip_inpainting() {
    let (mut img, mut obj) = image_with_owned_object();
    img.remove_object(&obj.props.id);
    obj.image_id = None;
    img.add_object(obj.clone());
    let before = img.raster(false).unwrap();

    let session = EditSession::new(FakeClient::new());
    session
        .remove_entities(&mut img, &[Entity::from(obj)])
        .await
        .unwrap();

    assert!(session.client().calls().is_empty());
    assert_eq!(img.raster(false).unwrap(), before);
}

#[tokio::test]
async fn foreign_operands_fail_before_inference() {
    let (mut img, obj) = image_with_owned_object();
    let stranger = Entity::from(TextEntity::new("elsewhere"));
    let before = img.clone();

    let session = EditSession::new(FakeClient::new());
    let err = session
        .remove_entities(&mut img, &[Entity::from(obj), stranger])
        .await
        .unwrap_err();

    assert!(matches!(err, SceneError::Ownership(_)));
    assert!(session.client().calls().is_empty());
    assert_eq!(img, before);
}

#[tokio::test]
async fn failed_inpaint_leaves_image_untouched() {
    let (mut img, obj) = image_with_owned_object();
    let before = img.clone();
    let session = EditSession::new(FakeClient::new().failing_inpaint());
    let err = session
        .remove_entities(&mut img, &[Entity::from(obj)])
        .await
        .unwrap_err();

    assert!(matches!(err, SceneError::Inference(_)));
    assert_eq!(img, before);
}

#[tokio::test]
async fn ensure_inpainted_reports_processed_ids() {
    let (mut img, obj) = image_with_owned_object();
    let text = TextEntity::new("caption");
    img.add_object(text.clone());
    let client = FakeClient::new();
    let settings = EditSettings::default();
    let ids = vec![
        obj.props.id.clone(),
        text.props.id.clone(),
        obj.props.id.clone(),
    ];

    assert_eq!(guard::pending_objects(&img, &ids), vec![obj.props.id.clone()]);
    let done = guard::ensure_inpainted(&client, &settings, &mut img, &ids)
        .await
        .unwrap();
    assert_eq!(done, vec![obj.props.id.clone()]);

    let again = guard::ensure_inpainted(&client, &settings, &mut img, &ids)
        .await
        .unwrap();
    assert!(again.is_empty());
    assert_eq!(client.inpaint_calls(), 1);
}

#[tokio::test]
async fn inpaint_objects_uses_the_given_prompt() {
    let (mut img, obj) = image_with_owned_object();
    let session = EditSession::new(FakeClient::new());
    session
        .inpaint_objects(&mut img, &[Entity::from(obj.clone())], "a wooden table")
        .await
        .unwrap();

    assert!(img.child(&obj.props.id).is_none());
    assert_eq!(pixel(&img, 15, 10), INPAINT_FILL);
    assert!(matches!(
        &session.client().calls()[0],
        Call::Inpaint { prompt, .. } if prompt == "a wooden table"
    ));
}

#[tokio::test]
async fn inpaint_objects_rejects_non_objects() {
    let (mut img, _) = image_with_owned_object();
    let text = TextEntity::new("caption");
    img.add_object(text.clone());

    let session = EditSession::new(FakeClient::new());
    let err = session
        .inpaint_objects(&mut img, &[Entity::from(text)], "anything")
        .await
        .unwrap_err();
    assert!(matches!(err, SceneError::Validation(_)));
    assert!(session.client().calls().is_empty());
}
