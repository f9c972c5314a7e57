//! Scene-graph entity model.

pub(crate) mod entity;
pub(crate) mod filter;
pub(crate) mod image;
pub(crate) mod reference;

pub use entity::{
    BoxEntity, Entity, EntityId, EntityKind, EntityProps, ObjectEntity, PathArg, PathData,
    PointEntity, ScribbleEntity, TextEntity,
};
pub use filter::{FILTER_NAMES, Filter, ImageFilter};
pub use image::ImageEntity;
pub use reference::Reference;
