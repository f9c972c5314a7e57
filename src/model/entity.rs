use serde::{Deserialize, Serialize};

use crate::{
    foundation::core::{OriginX, OriginY},
    model::{filter::Filter, image::ImageEntity, reference::Reference},
};

/// Stable entity identifier, assigned once at creation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Mint a fresh identifier (UUID v4).
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

fn one() -> f64 {
    1.0
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Attributes shared by every entity variant.
///
/// `left`/`top` are relative to the center of the owning image and are read
/// through `origin_x`/`origin_y`. `width`/`height` are unscaled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityProps {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub origin_x: OriginX,
    #[serde(default)]
    pub origin_y: OriginY,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    /// Degrees, accumulated without wraparound.
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub flip_x: bool,
    #[serde(default)]
    pub flip_y: bool,
    /// Preferred namespace name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Display binding, minted lazily by decontextualization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    /// Detection artifact, dropped at contextualization time.
    #[serde(default, skip_serializing_if = "is_false")]
    pub ephemeral: bool,
    /// Renderer attributes with no meaning here (`opacity`, `skewX`, `shadow`, ...),
    /// carried through edits verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for EntityProps {
    fn default() -> Self {
        Self {
            id: EntityId::new(),
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            origin_x: OriginX::Center,
            origin_y: OriginY::Center,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            flip_x: false,
            flip_y: false,
            name: None,
            reference: None,
            ephemeral: false,
            extra: serde_json::Map::new(),
        }
    }
}

impl EntityProps {
    /// Center-origin props with the given footprint.
    pub fn with_footprint(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
            ..Self::default()
        }
    }

    pub fn scaled_width(&self) -> f64 {
        self.width * self.scale_x
    }

    pub fn scaled_height(&self) -> f64 {
        self.height * self.scale_y
    }

    /// `(left, top, width, height)`, the key used to match repeated detections.
    pub fn footprint(&self) -> (f64, f64, f64, f64) {
        (self.left, self.top, self.width, self.height)
    }
}

/// An extracted or synthesized raster layer with alpha.
///
/// The base raster of an [`ImageEntity`] uses the same shape with no owner.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntity {
    #[serde(flatten)]
    pub props: EntityProps,
    /// PNG data URL.
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub inpainted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<EntityId>,
}

fn default_font_size() -> f64 {
    40.0
}

fn default_fill() -> String {
    "rgb(0,0,0)".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEntity {
    #[serde(flatten)]
    pub props: EntityProps,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_fill")]
    pub fill: String,
}

impl TextEntity {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            props: EntityProps::default(),
            text: text.into(),
            font_size: default_font_size(),
            fill: default_fill(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxEntity {
    #[serde(flatten)]
    pub props: EntityProps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default)]
    pub stroke_width: f64,
}

impl BoxEntity {
    /// Box whose `left`/`top` name its top-left corner (center-relative).
    pub fn top_left(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            props: EntityProps {
                origin_x: OriginX::Left,
                origin_y: OriginY::Top,
                ..EntityProps::with_footprint(left, top, width, height)
            },
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointEntity {
    #[serde(flatten)]
    pub props: EntityProps,
    #[serde(default)]
    pub radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
}

impl PointEntity {
    pub fn at(left: f64, top: f64) -> Self {
        Self {
            props: EntityProps::with_footprint(left, top, 0.0, 0.0),
            ..Self::default()
        }
    }
}

/// One argument of a path command array: the command letter or a coordinate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathArg {
    Number(f64),
    Op(String),
}

/// Scribble geometry as sent by the renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathData {
    /// SVG path data, e.g. `"M 10 10 L 40 40"`.
    Svg(String),
    /// Command arrays, e.g. `[["M", 10, 10], ["L", 40, 40]]`.
    Commands(Vec<Vec<PathArg>>),
}

impl Default for PathData {
    fn default() -> Self {
        PathData::Svg(String::new())
    }
}

impl PathData {
    /// Normalize to an SVG path string.
    pub fn to_svg(&self) -> String {
        match self {
            PathData::Svg(s) => s.clone(),
            PathData::Commands(cmds) => {
                let mut parts = Vec::with_capacity(cmds.len());
                for cmd in cmds {
                    let Some((head, args)) = cmd.split_first() else {
                        continue;
                    };
                    let mut part = match head {
                        PathArg::Op(op) => op.to_ascii_uppercase(),
                        PathArg::Number(n) => n.to_string(),
                    };
                    for arg in args {
                        part.push(' ');
                        match arg {
                            PathArg::Number(n) => part.push_str(&n.to_string()),
                            PathArg::Op(op) => part.push_str(op),
                        }
                    }
                    parts.push(part);
                }
                parts.join(" ")
            }
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            PathData::Svg(s) => s.trim().is_empty(),
            PathData::Commands(cmds) => cmds.is_empty(),
        }
    }
}

fn default_stroke_width() -> f64 {
    10.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScribbleEntity {
    #[serde(flatten)]
    pub props: EntityProps,
    #[serde(default)]
    pub path: PathData,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
}

impl ScribbleEntity {
    pub fn new(path: PathData) -> Self {
        Self {
            props: EntityProps::default(),
            path,
            stroke_width: default_stroke_width(),
        }
    }
}

/// Variant tag of an [`Entity`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Image,
    Object,
    Text,
    Box,
    Point,
    Scribble,
}

impl EntityKind {
    /// Lowercase tag used for generated namespace names and labels.
    pub fn slug(self) -> &'static str {
        match self {
            EntityKind::Image => "image",
            EntityKind::Object => "object",
            EntityKind::Text => "text",
            EntityKind::Box => "box",
            EntityKind::Point => "point",
            EntityKind::Scribble => "scribble",
        }
    }
}

/// A scene-graph node. The wire tags follow the browser renderer's object types.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Entity {
    #[serde(rename = "Group")]
    Image(ImageEntity),
    #[serde(rename = "Image")]
    Object(ObjectEntity),
    #[serde(rename = "Text")]
    Text(TextEntity),
    #[serde(rename = "Rect")]
    Box(BoxEntity),
    #[serde(rename = "Circle")]
    Point(PointEntity),
    #[serde(rename = "Path")]
    Scribble(ScribbleEntity),
}

impl Entity {
    pub fn props(&self) -> &EntityProps {
        match self {
            Entity::Image(e) => &e.props,
            Entity::Object(e) => &e.props,
            Entity::Text(e) => &e.props,
            Entity::Box(e) => &e.props,
            Entity::Point(e) => &e.props,
            Entity::Scribble(e) => &e.props,
        }
    }

    pub fn props_mut(&mut self) -> &mut EntityProps {
        match self {
            Entity::Image(e) => &mut e.props,
            Entity::Object(e) => &mut e.props,
            Entity::Text(e) => &mut e.props,
            Entity::Box(e) => &mut e.props,
            Entity::Point(e) => &mut e.props,
            Entity::Scribble(e) => &mut e.props,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Image(_) => EntityKind::Image,
            Entity::Object(_) => EntityKind::Object,
            Entity::Text(_) => EntityKind::Text,
            Entity::Box(_) => EntityKind::Box,
            Entity::Point(_) => EntityKind::Point,
            Entity::Scribble(_) => EntityKind::Scribble,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.props().id
    }

    pub fn reference(&self) -> Option<&Reference> {
        self.props().reference.as_ref()
    }

    pub fn as_image(&self) -> Option<&ImageEntity> {
        match self {
            Entity::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageEntity> {
        match self {
            Entity::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectEntity> {
        match self {
            Entity::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ObjectEntity> {
        match self {
            Entity::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl From<ImageEntity> for Entity {
    fn from(value: ImageEntity) -> Self {
        Entity::Image(value)
    }
}

impl From<ObjectEntity> for Entity {
    fn from(value: ObjectEntity) -> Self {
        Entity::Object(value)
    }
}

impl From<TextEntity> for Entity {
    fn from(value: TextEntity) -> Self {
        Entity::Text(value)
    }
}

impl From<BoxEntity> for Entity {
    fn from(value: BoxEntity) -> Self {
        Entity::Box(value)
    }
}

impl From<PointEntity> for Entity {
    fn from(value: PointEntity) -> Self {
        Entity::Point(value)
    }
}

impl From<ScribbleEntity> for Entity {
    fn from(value: ScribbleEntity) -> Self {
        Entity::Scribble(value)
    }
}
