use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{SceneError, SceneResult},
    model::{Entity, EntityId, Reference},
};

/// A value bound to a namespace name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Entity(Entity),
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Entity(e) => Some(e),
            _ => None,
        }
    }

    fn visit_entities_mut(&mut self, f: &mut dyn FnMut(&mut Entity)) {
        match self {
            Value::Entity(e) => visit_entity_mut(e, f),
            Value::List(items) => {
                for item in items {
                    item.visit_entities_mut(f);
                }
            }
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
    }

    fn find_entity(&self, pred: &dyn Fn(&Entity) -> bool) -> Option<&Entity> {
        match self {
            Value::Entity(e) => find_in_entity(e, pred),
            Value::List(items) => items.iter().find_map(|item| item.find_entity(pred)),
            Value::Bool(_) | Value::Number(_) | Value::String(_) => None,
        }
    }
}

impl From<Entity> for Value {
    fn from(value: Entity) -> Self {
        Value::Entity(value)
    }
}

fn visit_entity_mut(entity: &mut Entity, f: &mut dyn FnMut(&mut Entity)) {
    f(entity);
    if let Entity::Image(img) = entity {
        for child in &mut img.objects {
            visit_entity_mut(child, f);
        }
    }
}

fn find_in_entity<'a>(entity: &'a Entity, pred: &dyn Fn(&Entity) -> bool) -> Option<&'a Entity> {
    if pred(entity) {
        return Some(entity);
    }
    match entity {
        Entity::Image(img) => img.objects.iter().find_map(|c| find_in_entity(c, pred)),
        _ => None,
    }
}

/// Identifier form of a name hint: characters outside `[A-Za-z0-9_]` become
/// `_`, and a leading digit gets a `_` prefix. `None` when nothing usable remains.
fn slot_prefix(hint: &str) -> Option<String> {
    let mut prefix: String = hint
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if prefix.chars().all(|c| c == '_') {
        return None;
    }
    if prefix.starts_with(|c: char| c.is_ascii_digit()) {
        prefix.insert(0, '_');
    }
    Some(prefix)
}

/// Session-scoped name → value bindings used by generated code.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace {
    values: BTreeMap<String, Value>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The entity bound to `name`.
    pub fn entity(&self, name: &str) -> SceneResult<&Entity> {
        match self.values.get(name) {
            Some(Value::Entity(e)) => Ok(e),
            Some(_) => Err(SceneError::resolution(format!(
                "'{name}' is not bound to an entity"
            ))),
            None => Err(SceneError::resolution(format!("'{name}' is not defined"))),
        }
    }

    /// Name of the top-level entity slot holding `id`.
    pub fn name_of(&self, id: &EntityId) -> Option<&str> {
        self.iter()
            .find(|(_, v)| v.as_entity().is_some_and(|e| e.id() == id))
            .map(|(k, _)| k)
    }

    /// Name of the top-level entity slot whose reference has `uuid`.
    pub fn name_of_reference(&self, uuid: &str) -> Option<&str> {
        self.iter()
            .find(|(_, v)| {
                v.as_entity()
                    .and_then(Entity::reference)
                    .is_some_and(|r| r.uuid == uuid)
            })
            .map(|(k, _)| k)
    }

    /// Any entity, at any depth, whose reference has `uuid`.
    pub fn find_by_reference(&self, uuid: &str) -> Option<&Entity> {
        let pred = |e: &Entity| e.reference().is_some_and(|r| r.uuid == uuid);
        self.values.values().find_map(|v| v.find_entity(&pred))
    }

    /// `{prefix}_{n}` for the smallest free `n`.
    pub fn free_name(&self, prefix: &str) -> String {
        (0usize..)
            .map(|n| format!("{prefix}_{n}"))
            .find(|name| !self.values.contains_key(name))
            .unwrap_or_else(|| prefix.to_owned())
    }

    /// Bind `entity`, reusing the slot of the same id or the same reference.
    ///
    /// New slots are named after the entity's `name` hint, else its kind.
    pub fn bind(&mut self, entity: Entity) -> String {
        let existing = self
            .name_of(entity.id())
            .or_else(|| {
                entity
                    .reference()
                    .and_then(|r| self.name_of_reference(&r.uuid))
            })
            .map(str::to_owned);
        let name = match existing {
            Some(name) => name,
            None => {
                let prefix = entity
                    .props()
                    .name
                    .as_deref()
                    .and_then(slot_prefix)
                    .unwrap_or_else(|| entity.kind().slug().to_owned());
                self.free_name(&prefix)
            }
        };
        tracing::debug!(slot = %name, entity = %entity.id(), "binding entity");
        self.values.insert(name.clone(), Value::Entity(entity));
        name
    }

    /// Set `reference` on every copy of entity `id`, nested ones included.
    pub fn set_reference(&mut self, id: &EntityId, reference: &Reference) {
        for value in self.values.values_mut() {
            value.visit_entities_mut(&mut |e| {
                if e.id() == id {
                    e.props_mut().reference = Some(reference.clone());
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;
    use crate::model::{BoxEntity, ImageEntity, TextEntity};

    #[test]
    fn generated_names_take_first_free_counter() {
        let mut ns = Namespace::new();
        let a = ns.bind(BoxEntity::default().into());
        let b = ns.bind(BoxEntity::default().into());
        assert_eq!((a.as_str(), b.as_str()), ("box_0", "box_1"));
        ns.remove("box_0");
        assert_eq!(ns.bind(BoxEntity::default().into()), "box_0");
    }

    #[test]
    fn name_hint_is_the_prefix() {
        let mut ns = Namespace::new();
        let mut t = TextEntity::new("hi");
        t.props.name = Some("title".into());
        assert_eq!(ns.bind(t.into()), "title_0");
    }

    #[test]
    fn name_hints_become_identifiers() {
        assert_eq!(slot_prefix("my cat").as_deref(), Some("my_cat"));
        assert_eq!(slot_prefix("1st").as_deref(), Some("_1st"));
        assert_eq!(slot_prefix("café").as_deref(), Some("caf_"));
        assert_eq!(slot_prefix(" - "), None);
        assert_eq!(slot_prefix(""), None);

        let mut ns = Namespace::new();
        let mut t = TextEntity::new("hi");
        t.props.name = Some("my cat".into());
        assert_eq!(ns.bind(t.into()), "my_cat_0");
        let mut b = BoxEntity::default();
        b.props.name = Some("!!".into());
        assert_eq!(ns.bind(b.into()), "box_0");
    }

    #[test]
    fn rebinding_reuses_slot_by_id_or_reference() {
        let mut ns = Namespace::new();
        let mut t = TextEntity::new("a");
        let name = ns.bind(t.clone().into());
        t.text = "b".into();
        assert_eq!(ns.bind(t.clone().into()), name);
        assert_eq!(ns.len(), 1);

        let r = Reference::new("text", "ff0000", "u-1");
        ns.set_reference(&t.props.id, &r);
        let mut other = TextEntity::new("c");
        other.props.reference = Some(r);
        assert_eq!(ns.bind(other.into()), name);
        assert_eq!(ns.len(), 1);
    }

    #[test]
    fn non_entity_values_do_not_resolve() {
        let mut ns = Namespace::new();
        ns.insert("n", Value::Number(3.0));
        assert!(matches!(ns.entity("n"), Err(SceneError::Resolution(_))));
        assert!(matches!(ns.entity("missing"), Err(SceneError::Resolution(_))));
    }

    #[test]
    fn reference_reaches_nested_copies() {
        let mut img = ImageEntity::from_raster(&RgbaImage::new(2, 2)).unwrap();
        let b = BoxEntity::top_left(0.0, 0.0, 1.0, 1.0);
        img.add_object(b.clone());

        let mut ns = Namespace::new();
        ns.bind(img.into());
        ns.bind(b.clone().into());
        ns.insert("list", Value::List(vec![Value::Entity(b.clone().into())]));

        let r = Reference::mint("box");
        ns.set_reference(&b.props.id, &r);
        assert_eq!(ns.entity("box_0").unwrap().reference(), Some(&r));
        let found = ns.find_by_reference(&r.uuid).unwrap();
        assert_eq!(found.id(), &b.props.id);
        let Some(Value::List(items)) = ns.get("list") else {
            panic!("list binding");
        };
        assert_eq!(items[0].as_entity().unwrap().reference(), Some(&r));
        let img = ns.entity("image_0").unwrap().as_image().unwrap();
        assert_eq!(img.objects()[0].reference(), Some(&r));
    }

    #[test]
    fn values_roundtrip_untagged() {
        let mut ns = Namespace::new();
        ns.insert("flag", Value::Bool(true));
        ns.insert("count", Value::Number(2.5));
        ns.insert("word", Value::String("hi".into()));
        ns.bind(TextEntity::new("t").into());
        let json = serde_json::to_string(&ns).unwrap();
        let back: Namespace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ns);
    }
}
