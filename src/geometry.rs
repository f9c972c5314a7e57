//! Geometry of entities on an image.
//!
//! Entity coordinates are relative to the image center; the functions here
//! convert to and from absolute pixel space (origin at the top-left corner,
//! y growing downwards). Everything is pure.

use crate::{
    foundation::{
        core::{AngleUnit, Axis, Direction, ImageSize, Point, Position, Rect, ShiftUnit, Spin},
        error::{SceneError, SceneResult},
    },
    model::{BoxEntity, EntityProps},
};

/// Center of the entity in center-relative coordinates, honoring its origin.
pub fn center_of(props: &EntityProps) -> Point {
    Point::new(
        props.left + props.origin_x.center_offset() * props.width,
        props.top + props.origin_y.center_offset() * props.height,
    )
}

/// Absolute bounding box of an entity's unscaled footprint.
pub fn bounding_box(props: &EntityProps, size: ImageSize) -> Rect {
    let c = center_of(props) + size.center().to_vec2();
    let (hw, hh) = (props.width / 2.0, props.height / 2.0);
    Rect::new(c.x - hw, c.y - hh, c.x + hw, c.y + hh)
}

/// Translate `rect` by its own size along `direction`, clamping each edge to the image.
pub fn shift_box(rect: Rect, direction: Option<Direction>, size: ImageSize) -> Rect {
    let Some(direction) = direction else {
        return rect;
    };
    let (ux, uy) = direction.unit();
    let dx = f64::from(ux) * rect.width();
    let dy = f64::from(uy) * rect.height();
    let (w, h) = (size.width_f64(), size.height_f64());
    Rect::new(
        (rect.x0 + dx).clamp(0.0, w),
        (rect.y0 + dy).clamp(0.0, h),
        (rect.x1 + dx).clamp(0.0, w),
        (rect.y1 + dy).clamp(0.0, h),
    )
}

/// Top-left-origin box covering `props`, optionally moved one box-length along `direction`.
///
/// Corners are truncated to whole pixels before shifting.
pub fn box_around(props: &EntityProps, direction: Option<Direction>, size: ImageSize) -> BoxEntity {
    let r = bounding_box(props, size);
    let r = Rect::new(r.x0.trunc(), r.y0.trunc(), r.x1.trunc(), r.y1.trunc());
    let r = shift_box(r, direction, size);
    BoxEntity::top_left(
        r.x0 - size.width_f64() / 2.0,
        r.y0 - size.height_f64() / 2.0,
        r.width(),
        r.height(),
    )
}

/// Center-relative position that places an entity of `width`×`height`
/// against the image edge named by `position`.
pub fn place_in_image(position: Position, width: f64, height: f64, size: ImageSize) -> Point {
    let (ux, uy) = position.unit();
    Point::new(
        f64::from(ux) * (size.width_f64() - width) / 2.0,
        f64::from(uy) * (size.height_f64() - height) / 2.0,
    )
}

/// Center-relative position just outside `anchor` along `position`.
///
/// `Right` puts the target's left edge against the anchor's right edge;
/// `Center` stacks it on the anchor.
pub fn place_beside(anchor: &EntityProps, position: Position, width: f64, height: f64) -> Point {
    let (ux, uy) = position.unit();
    let c = center_of(anchor);
    Point::new(
        c.x + f64::from(ux) * (anchor.width / 2.0 + width / 2.0),
        c.y + f64::from(uy) * (anchor.height / 2.0 + height / 2.0),
    )
}

/// Move the entity so its center lands on `center`, keeping its origin mode.
pub fn move_center_to(props: &mut EntityProps, center: Point) {
    props.left = center.x - props.origin_x.center_offset() * props.width;
    props.top = center.y - props.origin_y.center_offset() * props.height;
}

/// Placement of an entity inside a target box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxFit {
    /// Center-relative center of the box.
    pub center: Point,
    /// Uniform factor to compound onto the entity's scale, never above 1.
    pub scale: f64,
}

/// Fit `entity` into `target`, shrinking uniformly when it is larger.
pub fn fit_into_box(target: &EntityProps, entity: &EntityProps) -> SceneResult<BoxFit> {
    if target.width <= 0.0 || target.height <= 0.0 {
        return Err(SceneError::degenerate(format!(
            "target box '{}' has zero area",
            target.id
        )));
    }
    let (ew, eh) = (entity.scaled_width(), entity.scaled_height());
    let sx = if ew > 0.0 { target.width / ew } else { 1.0 };
    let sy = if eh > 0.0 { target.height / eh } else { 1.0 };
    Ok(BoxFit {
        center: center_of(target),
        scale: sx.min(sy).min(1.0),
    })
}

/// Add a rotation to the entity's angle; clockwise is positive.
pub fn rotate(props: &mut EntityProps, angle: f64, unit: AngleUnit, spin: Spin) {
    let degrees = match unit {
        AngleUnit::Degree => angle,
        AngleUnit::Radian => angle.to_degrees(),
    };
    let delta = match spin {
        Spin::Cw => degrees,
        Spin::Ccw => -degrees,
    };
    props.angle += delta;
}

/// Multiply the entity's scale on one axis, or both when `axis` is `None`.
pub fn scale(props: &mut EntityProps, factor: f64, axis: Option<Axis>) {
    match axis {
        Some(Axis::X) => props.scale_x *= factor,
        Some(Axis::Y) => props.scale_y *= factor,
        None => {
            props.scale_x *= factor;
            props.scale_y *= factor;
        }
    }
}

/// Move the entity by `(dx, dy)` pixels, or by fractions of the image size.
pub fn shift(props: &mut EntityProps, dx: f64, dy: f64, unit: ShiftUnit, size: ImageSize) {
    let (dx, dy) = match unit {
        ShiftUnit::Pixel => (dx, dy),
        ShiftUnit::Percentage => (dx * size.width_f64(), dy * size.height_f64()),
    };
    props.left += dx;
    props.top += dy;
}

pub fn flip(props: &mut EntityProps, axis: Axis) {
    match axis {
        Axis::X => props.flip_x = !props.flip_x,
        Axis::Y => props.flip_y = !props.flip_y,
    }
}

/// Uniform scale that gives `replacement` the same summed scaled extent as `target`.
pub fn replacement_scale(target: &EntityProps, replacement: &EntityProps) -> SceneResult<f64> {
    let denom = replacement.scaled_width() + replacement.scaled_height();
    if denom <= 0.0 {
        return Err(SceneError::degenerate(format!(
            "replacement '{}' has zero size",
            replacement.id
        )));
    }
    Ok((target.scaled_width() + target.scaled_height()) / denom)
}

/// Bounding box as `[x0, y0, x1, y1]` fractions of the image, clamped to `[0, 1]`.
pub fn normalized_box(props: &EntityProps, size: ImageSize) -> SceneResult<[f64; 4]> {
    if size.width == 0 || size.height == 0 {
        return Err(SceneError::degenerate("image has zero area"));
    }
    let r = bounding_box(props, size);
    let (w, h) = (size.width_f64(), size.height_f64());
    Ok([
        (r.x0 / w).clamp(0.0, 1.0),
        (r.y0 / h).clamp(0.0, 1.0),
        (r.x1 / w).clamp(0.0, 1.0),
        (r.y1 / h).clamp(0.0, 1.0),
    ])
}

/// Center-relative point to absolute pixel coordinates.
pub fn to_absolute(p: Point, size: ImageSize) -> Point {
    p + size.center().to_vec2()
}

/// Absolute pixel coordinates to a center-relative point.
pub fn to_center_relative(p: Point, size: ImageSize) -> Point {
    p - size.center().to_vec2()
}
