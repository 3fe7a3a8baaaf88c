//! Utility functions for image cropping and coordinate transformations.

pub mod image_conversion;
pub mod safe_cast;

use opencv::core::Rect;

/// Clip a corner-form box `(xmin, ymin, xmax, ymax)` to an image and return it as a `Rect`.
///
/// Returns `None` when nothing of the box lies inside the image.
#[must_use]
pub fn clip_box(xmin: i32, ymin: i32, xmax: i32, ymax: i32, width: i32, height: i32) -> Option<Rect> {
    let x1 = xmin.clamp(0, width);
    let y1 = ymin.clamp(0, height);
    let x2 = xmax.clamp(0, width);
    let y2 = ymax.clamp(0, height);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
}

/// Centre of a `Rect` in pixel coordinates
#[must_use]
pub fn rect_center(rect: Rect) -> (f64, f64) {
    (
        f64::from(rect.x) + f64::from(rect.width) / 2.0,
        f64::from(rect.y) + f64::from(rect.height) / 2.0,
    )
}
