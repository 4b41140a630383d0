//! Axial and radial shadings.

use super::{ColorRamp, invert};
use crate::bitmap::{Bgra8, Bitmap};
use kurbo::{Affine, Point};

const EPSILON: f32 = 0.0001;

/// Call `f` with the position of each pixel center in shading space, and paint the
/// color it returns.
fn paint_pixels(
    bitmap: &mut Bitmap,
    object_to_bitmap: Affine,
    mut f: impl FnMut(f32, f32) -> Option<Bgra8>,
) -> Option<()> {
    let inverse = invert(object_to_bitmap)?;

    for y in 0..bitmap.height() {
        for x in 0..bitmap.width() {
            let pos = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);

            if let Some(color) = f(pos.x as f32, pos.y as f32) {
                bitmap.set_pixel(x, y, color);
            }
        }
    }

    Some(())
}

/// Draw an axial shading with the axis `[x0, y0, x1, y1]`.
pub(crate) fn draw_axial(
    bitmap: &mut Bitmap,
    ramp: &ColorRamp,
    object_to_bitmap: Affine,
    coords: [f32; 4],
) -> Option<()> {
    let [x0, y0, x1, y1] = coords;
    let (dx, dy) = (x1 - x0, y1 - y0);
    let axis_len_squared = dx * dx + dy * dy;

    if axis_len_squared == 0.0 {
        return Some(());
    }

    paint_pixels(bitmap, object_to_bitmap, |x, y| {
        let t = ((x - x0) * dx + (y - y0) * dy) / axis_len_squared;

        ramp.color(t)
    })
}

/// Draw a radial shading between the circles `[x0, y0, r0]` and `[x1, y1, r1]`.
pub(crate) fn draw_radial(
    bitmap: &mut Bitmap,
    ramp: &ColorRamp,
    object_to_bitmap: Affine,
    coords: [f32; 6],
) -> Option<()> {
    let [x0, y0, r0, x1, y1, r1] = coords;
    let (dx, dy, dr) = (x1 - x0, y1 - y0, r1 - r0);

    // Solve `|p - c(s)| = r(s)` for `s`, where `c` and `r` interpolate the centers
    // and radii of the circles. This is a quadratic `a * s^2 + b * s + c = 0`.
    let a = dx * dx + dy * dy - dr * dr;
    let a_is_zero = a.abs() < EPSILON;

    // The end circle lies completely inside of the start circle.
    let decreasing = dr < 0.0 && ((dx * dx + dy * dy).sqrt() as i32 as f32) < -dr;
    let [extend_start, extend_end] = ramp.extend;

    paint_pixels(bitmap, object_to_bitmap, |x, y| {
        let (pdx, pdy) = (x - x0, y - y0);
        let b = -2.0 * (pdx * dx + pdy * dy + r0 * dr);
        let c = pdx * pdx + pdy * pdy - r0 * r0;

        let s = if b.abs() < EPSILON {
            (-c / a).sqrt()
        } else if a_is_zero {
            -c / b
        } else {
            let discriminant = b * b - 4.0 * a * c;

            if discriminant < 0.0 {
                return None;
            }

            let root = discriminant.sqrt();
            let mut s1 = (-b - root) / (2.0 * a);
            let mut s2 = (-b + root) / (2.0 * a);

            if a <= 0.0 {
                std::mem::swap(&mut s1, &mut s2);
            }

            if decreasing {
                if s1 >= 0.0 || extend_start { s1 } else { s2 }
            } else if s2 <= 1.0 || extend_end {
                s2
            } else {
                s1
            }
        };

        if r0 + s * dr < 0.0 {
            return None;
        }

        ramp.color(s)
    })
}
