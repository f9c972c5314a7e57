//! Scene-graph core for conversational image editing.
//!
//! An [`ImageEntity`] holds a base raster plus overlaid text, box, point,
//! scribble, object and nested image layers. Editing operations live on
//! [`EditSession`]; they keep extracted objects consistent with the raster
//! they came from by inpainting behind them before they move. The
//! [`context`] module translates chat messages to and from the namespace
//! generated code runs against.
#![forbid(unsafe_code)]

mod foundation;

pub mod context;
pub mod geometry;
pub mod guard;
pub mod inference;
pub mod mask;
pub mod model;
pub mod ops;
pub mod raster;
pub mod settings;

pub use crate::foundation::core::{
    AngleUnit, Axis, Direction, ImageSize, OriginX, OriginY, Point, Position, Rect, ShiftUnit,
    Spin, Vec2,
};
pub use crate::foundation::error::{SceneError, SceneResult};

pub use crate::context::{Message, Namespace, Value, contextualize, decontextualize};
pub use crate::inference::{
    GroundedRequest, InferenceClient, LabeledPoint, PixelBox, PointLabel, ScoredMask,
    SegmentRequest,
};
pub use crate::model::{
    BoxEntity, Entity, EntityId, EntityKind, EntityProps, Filter, ImageEntity, ImageFilter,
    ObjectEntity, PathData, PointEntity, Reference, ScribbleEntity, TextEntity,
};
pub use crate::ops::{EditSession, Placement, QuantityMismatch, SegmentPrompts, Segmentation};
pub use crate::settings::EditSettings;
