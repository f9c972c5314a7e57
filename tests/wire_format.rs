use sceneedit::{
    Entity, EntityId, Filter, ImageFilter, Message, Namespace, PathData, contextualize,
    decontextualize,
};

fn scene() -> Entity {
    serde_json::from_str(include_str!("data/scene.json")).unwrap()
}

#[test]
fn fixture_parses_into_the_entity_tree() {
    let Entity::Image(img) = scene() else {
        panic!("fixture root should be an image");
    };
    assert_eq!(img.id(), &EntityId::from("scene-1"));
    assert_eq!(img.size().unwrap().width, 8);
    assert_eq!(img.objects().len(), 5);

    let base = img.base_layer().unwrap();
    assert_eq!(
        base.filters[0],
        Filter::Known(ImageFilter::Brightness { brightness: 0.2 })
    );
    assert!(matches!(base.filters[1], Filter::Other(_)));

    let cup = img.objects()[0].as_object().unwrap();
    assert!(img.owns(cup));
    assert_eq!(cup.props.name.as_deref(), Some("cup"));

    let kinds: Vec<&str> = img.objects().iter().map(|e| e.kind().slug()).collect();
    assert_eq!(kinds, ["object", "text", "box", "point", "scribble"]);

    let Entity::Scribble(s) = &img.objects()[4] else {
        panic!("expected a scribble");
    };
    assert!(matches!(s.path, PathData::Commands(_)));
    assert_eq!(s.path.to_svg(), "M 1 1 L 6 4");
    assert!(s.props.flip_y);
}

#[test]
fn fixture_roundtrips_through_the_wire_format() {
    let entity = scene();
    let value = serde_json::to_value(&entity).unwrap();

    assert_eq!(value["type"], "Group");
    assert_eq!(value["reference"]["value"], "u-scene");
    let objects = value["objects"].as_array().unwrap();
    assert_eq!(objects.len(), 6);
    assert_eq!(objects[0]["type"], "Image");
    assert!(objects[0].get("image_id").is_none());
    assert_eq!(objects[0]["filters"][1]["type"], "Sepia");
    assert_eq!(objects[0]["filters"][1]["strength"], 0.4);
    assert_eq!(objects[1]["image_id"], "scene-1");
    assert_eq!(objects[1]["originX"], "center");
    assert_eq!(objects[2]["fontSize"], 12.0);
    assert_eq!(objects[3]["type"], "Rect");
    assert_eq!(objects[3]["strokeWidth"], 1.0);
    assert_eq!(objects[4]["type"], "Circle");
    assert_eq!(objects[5]["type"], "Path");
    assert_eq!(objects[5]["flipY"], true);

    let back: Entity = serde_json::from_value(value).unwrap();
    assert_eq!(back, entity);
}

#[test]
fn renderer_only_fields_survive_an_edit() {
    let original: serde_json::Value =
        serde_json::from_str(include_str!("data/renderer_fields.json")).unwrap();
    let Entity::Image(mut img) = serde_json::from_value(original.clone()).unwrap() else {
        panic!("fixture root should be an image");
    };
    assert_eq!(img.props.extra["filters"][0]["type"], "Invert");
    assert_eq!(img.objects()[0].props().extra["skewX"], 10);

    let wire = serde_json::to_value(Entity::from(img.clone())).unwrap();
    assert_eq!(wire["opacity"], 0.8);
    assert_eq!(wire["filters"], original["filters"]);
    assert_eq!(wire["objects"][0]["crossOrigin"], "anonymous");
    let rect = &wire["objects"][1];
    assert_eq!(rect["opacity"], 0.5);
    assert_eq!(rect["skewX"], 10);
    assert_eq!(rect["visible"], false);
    assert_eq!(rect["shadow"], original["objects"][1]["shadow"]);
    assert_eq!(wire["objects"][2]["fontFamily"], "Times New Roman");

    img.objects_mut()[0].props_mut().left += 2.0;
    let moved = serde_json::to_value(Entity::from(img)).unwrap();
    assert_eq!(moved["objects"][1]["left"], 3.0);
    assert_eq!(moved["objects"][1]["opacity"], 0.5);
    assert_eq!(moved["objects"][1]["shadow"]["blur"], 4);
}

#[test]
fn fixture_filters_apply_on_render() {
    let Entity::Image(img) = scene() else {
        panic!("fixture root should be an image");
    };
    let plain = img.raster(false).unwrap();
    let filtered = img.raster(true).unwrap();
    assert_eq!(plain.get_pixel(0, 0)[0], 120);
    assert_eq!(filtered.get_pixel(0, 0)[0], 144);
    assert_eq!(filtered.get_pixel(0, 0)[3], 255);
}

#[test]
fn fixture_messages_roundtrip_through_the_namespace() {
    let m = Message::display(
        "move #00ff00[cup](u-cup) to the left of #ff0000[image](u-scene)",
        vec![scene()],
    );
    let mut ns = Namespace::new();

    let ctx = contextualize(&m, &mut ns).unwrap();
    assert_eq!(ctx.text(), "move @cup_0 to the left of @image_0");
    assert!(ctx.is_contextualized());
    assert_eq!(ns.len(), 2);

    assert_eq!(decontextualize(&ctx, &mut ns).unwrap(), m);
    assert_eq!(contextualize(&ctx, &mut ns).unwrap(), ctx);

    let wire = serde_json::to_value(&ctx).unwrap();
    assert_eq!(wire["form"], "namespace");
    assert_eq!(wire["attachments"][0], "image_0");
}
