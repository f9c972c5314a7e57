//! Single-channel masks: composite object masks, dilation, mask-derived
//! objects and scribble rasterisation.

use std::collections::VecDeque;

use image::{GrayImage, Luma, Rgba, RgbaImage};
use kurbo::{BezPath, PathEl};

use crate::{
    foundation::{
        core::ImageSize,
        error::{SceneError, SceneResult},
    },
    geometry,
    model::{EntityProps, ImageEntity, ObjectEntity, ScribbleEntity},
    raster,
};

/// Merge the alpha channels of `objects` into one mask the size of `image`.
///
/// Each object's alpha is pasted at its absolute top-left corner; overlaps
/// keep the larger coverage. Pixels falling outside the image are dropped.
pub fn composite_mask(image: &ImageEntity, objects: &[&ObjectEntity]) -> SceneResult<GrayImage> {
    if objects.is_empty() {
        return Err(SceneError::degenerate(
            "cannot build a composite mask from an empty object list",
        ));
    }

    let size = image.size()?;
    let mut mask = GrayImage::new(size.width, size.height);
    for object in objects {
        let layer = raster::decode_data_url(&object.src)?;
        let rect = geometry::bounding_box(&object.props, size);
        let (ox, oy) = (rect.x0.trunc() as i64, rect.y0.trunc() as i64);
        for (x, y, px) in layer.enumerate_pixels() {
            let (mx, my) = (ox + i64::from(x), oy + i64::from(y));
            if mx < 0 || my < 0 || mx >= i64::from(size.width) || my >= i64::from(size.height) {
                continue;
            }
            let dst = mask.get_pixel_mut(mx as u32, my as u32);
            dst[0] = dst[0].max(px[3]);
        }
    }
    Ok(mask)
}

/// Binarize at `threshold` (strictly greater is foreground) and grow the
/// foreground by `margin` pixels of 4-connected dilation. Output is 0/255.
pub fn dilate(mask: &GrayImage, threshold: u8, margin: u32) -> GrayImage {
    let (w, h) = mask.dimensions();
    let mut dist = vec![u32::MAX; (w as usize) * (h as usize)];
    let mut queue = VecDeque::new();
    for (x, y, px) in mask.enumerate_pixels() {
        if px[0] > threshold {
            let i = (y as usize) * (w as usize) + x as usize;
            dist[i] = 0;
            queue.push_back((x, y));
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        let d = dist[(y as usize) * (w as usize) + x as usize];
        if d >= margin {
            continue;
        }
        let neighbours = [
            (x.checked_sub(1), Some(y)),
            (x.checked_add(1).filter(|&v| v < w), Some(y)),
            (Some(x), y.checked_sub(1)),
            (Some(x), y.checked_add(1).filter(|&v| v < h)),
        ];
        for (nx, ny) in neighbours {
            let (Some(nx), Some(ny)) = (nx, ny) else {
                continue;
            };
            let ni = (ny as usize) * (w as usize) + nx as usize;
            if dist[ni] == u32::MAX {
                dist[ni] = d + 1;
                queue.push_back((nx, ny));
            }
        }
    }

    GrayImage::from_fn(w, h, |x, y| {
        let covered = dist[(y as usize) * (w as usize) + x as usize] != u32::MAX;
        Luma([if covered { 255 } else { 0 }])
    })
}

/// Tight bounding box of non-zero mask pixels as `(x0, y0, x1, y1)`, exclusive end.
pub fn mask_bounds(mask: &GrayImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, px) in mask.enumerate_pixels() {
        if px[0] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x + 1, y + 1),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
        });
    }
    bounds
}

/// Cut the masked region out of `raster` as a new object layer.
///
/// The object is positioned so it sits exactly over the region it came from.
/// An all-zero mask has nothing to extract.
pub fn object_from_mask(raster: &RgbaImage, mask: &GrayImage) -> SceneResult<ObjectEntity> {
    if raster.dimensions() != mask.dimensions() {
        return Err(SceneError::validation(format!(
            "mask is {:?} but raster is {:?}",
            mask.dimensions(),
            raster.dimensions()
        )));
    }
    let (x0, y0, x1, y1) =
        mask_bounds(mask).ok_or_else(|| SceneError::degenerate("mask has no foreground"))?;
    let (w, h) = (x1 - x0, y1 - y0);

    let layer = RgbaImage::from_fn(w, h, |x, y| {
        let src = raster.get_pixel(x0 + x, y0 + y);
        let alpha = mask.get_pixel(x0 + x, y0 + y)[0];
        Rgba([src[0], src[1], src[2], alpha])
    });

    let size = ImageSize::new(raster.width(), raster.height());
    let center = geometry::to_center_relative(
        kurbo::Point::new(
            f64::from(x0) + f64::from(w) / 2.0,
            f64::from(y0) + f64::from(h) / 2.0,
        ),
        size,
    );

    Ok(ObjectEntity {
        props: EntityProps::with_footprint(center.x, center.y, f64::from(w), f64::from(h)),
        src: raster::encode_data_url(&layer)?,
        ..ObjectEntity::default()
    })
}

/// Up to `count` foreground pixels (`> 127`), evenly strided in row-major order.
pub fn mask_to_points(mask: &GrayImage, count: usize) -> Vec<(u32, u32)> {
    let fg: Vec<(u32, u32)> = mask
        .enumerate_pixels()
        .filter(|(_, _, px)| px[0] > 127)
        .map(|(x, y, _)| (x, y))
        .collect();
    if fg.is_empty() || count == 0 {
        return Vec::new();
    }
    let n = count.min(fg.len());
    if n == 1 {
        return vec![fg[0]];
    }
    (0..n)
        .map(|i| fg[i * (fg.len() - 1) / (n - 1)])
        .collect()
}

/// Options for [`scribble_mask`].
#[derive(Clone, Copy, Debug)]
pub struct ScribbleRaster {
    /// Points sampled along the path.
    pub samples: usize,
    /// Lower bound on the stamped stroke width.
    pub min_stroke_px: f64,
}

/// Rasterise a scribble into a 0/255 mask of `size`.
///
/// Path coordinates are absolute image pixels. Blank or unparsable paths
/// yield an all-zero mask.
pub fn scribble_mask(scribble: &ScribbleEntity, size: ImageSize, opts: ScribbleRaster) -> GrayImage {
    let mut mask = GrayImage::new(size.width, size.height);
    if scribble.path.is_blank() || size.width == 0 || size.height == 0 {
        return mask;
    }

    let svg = scribble.path.to_svg();
    let path = match BezPath::from_svg(&svg) {
        Ok(path) => path,
        Err(err) => {
            tracing::warn!(scribble = %scribble.props.id, error = %err, "unparsable scribble path");
            return mask;
        }
    };

    let points = sample_path(&path, opts.samples);
    if points.len() < 2 {
        return mask;
    }

    let max_x = size.width_f64() - 1.0;
    let max_y = size.height_f64() - 1.0;
    let clamped: Vec<kurbo::Point> = points
        .into_iter()
        .map(|p| kurbo::Point::new(p.x.trunc().clamp(0.0, max_x), p.y.trunc().clamp(0.0, max_y)))
        .collect();

    let radius = (opts.min_stroke_px.max(scribble.stroke_width) / 2.0).max(1.0);
    for pair in clamped.windows(2) {
        stamp_segment(&mut mask, pair[0], pair[1], radius);
    }
    mask
}

/// Evenly spaced points by arc length along the flattened path.
fn sample_path(path: &BezPath, samples: usize) -> Vec<kurbo::Point> {
    let mut polyline: Vec<kurbo::Point> = Vec::new();
    kurbo::flatten(path.elements().iter().copied(), 0.25, |el| match el {
        PathEl::MoveTo(p) | PathEl::LineTo(p) => polyline.push(p),
        PathEl::ClosePath => {
            if let Some(&first) = polyline.first() {
                polyline.push(first);
            }
        }
        _ => {}
    });
    if polyline.len() < 2 || samples < 2 {
        return polyline;
    }

    let mut cumulative = Vec::with_capacity(polyline.len());
    let mut total = 0.0;
    cumulative.push(0.0);
    for pair in polyline.windows(2) {
        total += pair[0].distance(pair[1]);
        cumulative.push(total);
    }
    if total <= 0.0 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(samples);
    let mut seg = 0usize;
    for i in 0..samples {
        let target = total * (i as f64) / ((samples - 1) as f64);
        while seg + 2 < cumulative.len() && cumulative[seg + 1] < target {
            seg += 1;
        }
        let span = cumulative[seg + 1] - cumulative[seg];
        let t = if span > 0.0 {
            ((target - cumulative[seg]) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        out.push(polyline[seg].lerp(polyline[seg + 1], t));
    }
    out
}

fn stamp_segment(mask: &mut GrayImage, a: kurbo::Point, b: kurbo::Point, radius: f64) {
    let steps = a.distance(b).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let p = a.lerp(b, i as f64 / steps as f64);
        stamp_disc(mask, p, radius);
    }
}

fn stamp_disc(mask: &mut GrayImage, center: kurbo::Point, radius: f64) {
    let (w, h) = mask.dimensions();
    let x0 = (center.x - radius).floor().max(0.0) as u32;
    let y0 = (center.y - radius).floor().max(0.0) as u32;
    let x1 = ((center.x + radius).ceil() as u32).min(w.saturating_sub(1));
    let y1 = ((center.y + radius).ceil() as u32).min(h.saturating_sub(1));
    let r2 = radius * radius;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = f64::from(x) - center.x;
            let dy = f64::from(y) - center.y;
            if dx * dx + dy * dy <= r2 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }
}
