//! Function-based shadings.

use super::{eval_color, invert, to_bgra};
use crate::bitmap::Bitmap;
use kurbo::{Affine, Point};
use log::warn;
use tinct_interpret::shading::Shading;

/// Draw a function-based shading. `domain_to_bitmap` maps the domain of the functions
/// into the bitmap, pixels outside of `domain` aren't painted.
pub(crate) fn draw(
    bitmap: &mut Bitmap,
    shading: &Shading,
    domain_to_bitmap: Affine,
    domain: [f32; 4],
    alpha: u8,
) -> Option<()> {
    let output_count = shading.output_count();

    if output_count == 0 {
        warn!("shading functions don't produce any color components");

        return None;
    }

    let inverse = invert(domain_to_bitmap)?;
    let [x_min, x_max, y_min, y_max] = domain;

    for y in 0..bitmap.height() {
        for x in 0..bitmap.width() {
            let pos = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let (px, py) = (pos.x as f32, pos.y as f32);

            if !((x_min..=x_max).contains(&px) && (y_min..=y_max).contains(&py)) {
                continue;
            }

            let rgb = eval_color(shading, &[px, py], output_count);
            bitmap.set_pixel(x, y, to_bgra(rgb, alpha));
        }
    }

    Some(())
}
