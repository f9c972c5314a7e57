pub use kurbo::{Point, Rect, Vec2};

use serde::{Deserialize, Serialize};

/// Raster dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width_f64(self) -> f64 {
        f64::from(self.width)
    }

    pub fn height_f64(self) -> f64 {
        f64::from(self.height)
    }

    /// Absolute pixel coordinates of the image center.
    pub fn center(self) -> Point {
        Point::new(self.width_f64() / 2.0, self.height_f64() / 2.0)
    }
}

/// Horizontal interpretation of an entity's `left`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginX {
    Left,
    #[default]
    Center,
    Right,
}

/// Vertical interpretation of an entity's `top`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginY {
    Top,
    #[default]
    Center,
    Bottom,
}

impl OriginX {
    /// Offset from the anchor point to the box center, in units of box width.
    pub(crate) fn center_offset(self) -> f64 {
        match self {
            OriginX::Left => 0.5,
            OriginX::Center => 0.0,
            OriginX::Right => -0.5,
        }
    }
}

impl OriginY {
    pub(crate) fn center_offset(self) -> f64 {
        match self {
            OriginY::Top => 0.5,
            OriginY::Center => 0.0,
            OriginY::Bottom => -0.5,
        }
    }
}

/// One of the eight compass directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Direction {
    /// Unit step along x and y (`-1`, `0` or `1`); y grows downwards.
    pub fn unit(self) -> (i8, i8) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Top => (0, -1),
            Direction::Bottom => (0, 1),
            Direction::TopLeft => (-1, -1),
            Direction::TopRight => (1, -1),
            Direction::BottomLeft => (-1, 1),
            Direction::BottomRight => (1, 1),
        }
    }
}

/// Named placement: the center or one of the eight compass directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    Center,
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Position {
    pub fn unit(self) -> (i8, i8) {
        match self {
            Position::Center => (0, 0),
            Position::Left => Direction::Left.unit(),
            Position::Right => Direction::Right.unit(),
            Position::Top => Direction::Top.unit(),
            Position::Bottom => Direction::Bottom.unit(),
            Position::TopLeft => Direction::TopLeft.unit(),
            Position::TopRight => Direction::TopRight.unit(),
            Position::BottomLeft => Direction::BottomLeft.unit(),
            Position::BottomRight => Direction::BottomRight.unit(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[default]
    Degree,
    Radian,
}

/// Rotation sense; clockwise is positive in screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spin {
    #[default]
    Cw,
    Ccw,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftUnit {
    #[default]
    Pixel,
    /// Offsets are fractions of the image width/height.
    Percentage,
}
