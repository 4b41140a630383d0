/*!
A rasterizer for PDF shadings.

This crate paints the shadings loaded by [`tinct_interpret`] into a [`Bitmap`]
or any other [`Device`]. All seven shading types are supported:

- Function-based shadings are evaluated at every pixel.
- Axial and radial shadings look up their colors in a precomputed color ramp.
- Free-form and lattice-form triangle meshes are filled with Gouraud shading.
- Coons and tensor-product patch meshes are subdivided until the patches are small or
  smooth enough, and then filled as paths.

The entry point is [`draw`]:

```ignore
use kurbo::{Affine, Rect};
use tinct::{Bitmap, RenderSettings};

let mut bitmap = Bitmap::new(200, 200);
let clip = Rect::new(0.0, 0.0, 200.0, 200.0);
tinct::draw(&pattern, Affine::scale(2.0), clip, 255, &mut bitmap, &RenderSettings::default());
bitmap.save_png("shading.png")?;
```

Shadings are first painted into a scratch bitmap that covers the clip rectangle, which
is then composited onto the device. A shading that can't be drawn, for example because
its functions don't produce any colors, leaves the device untouched.
*/

#![forbid(unsafe_code)]

use kurbo::{Affine, Rect};
use log::warn;

mod bitmap;
mod device;
mod shading;

pub use bitmap::{Bgra8, Bitmap, PremulBgra8};
pub use device::{Device, FillOptions, FillRule};
pub use tinct_interpret;
pub use tinct_interpret::pattern::ShadingPattern;
pub use tinct_interpret::{Context, InterpreterSettings, InterpreterWarning};

/// Settings that should be applied when rasterizing shadings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    /// The maximum number of times a patch of a patch mesh is subdivided.
    pub max_patch_depth: u8,
    /// Whether the edges of patches should be anti-aliased.
    pub anti_alias: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_patch_depth: 16,
            anti_alias: true,
        }
    }
}

/// Draw a shading pattern.
///
/// `matrix` maps the pattern space (the default coordinate space of the page, for
/// patterns) into device pixels. Only the part of the shading inside of `clip` is
/// painted, with an opacity of `alpha`.
///
/// Returns whether anything was drawn.
pub fn draw(
    pattern: &ShadingPattern,
    matrix: Affine,
    clip: Rect,
    alpha: u8,
    device: &mut impl Device,
    settings: &RenderSettings,
) -> bool {
    let shading = &pattern.shading;
    let object_to_device = matrix * pattern.matrix;

    let (width, height) = device.size();
    let bounds = Rect::new(0.0, 0.0, f64::from(width), f64::from(height));
    let mut clip = clip.abs().intersect(bounds);

    if let Some(bbox) = shading.bbox {
        clip = clip.intersect(object_to_device.transform_rect_bbox(bbox));
    }

    let clip = clip.expand();

    if !(clip.width() > 0.0 && clip.height() > 0.0) {
        return false;
    }

    let (left, top) = (clip.x0 as u16, clip.y0 as u16);
    let mut bitmap = Bitmap::new(clip.width() as u16, clip.height() as u16);

    if !pattern.is_shading_object
        && let Some(background) = &shading.background
    {
        let rgb = shading.color_space.get_rgb_or_black(background);
        let [r, g, b] = rgb.to_rgb8();
        bitmap.fill(Bgra8::new(r, g, b, alpha));
    }

    let object_to_bitmap =
        Affine::translate((-f64::from(left), -f64::from(top))) * object_to_device;

    if shading::draw(shading, &mut bitmap, object_to_bitmap, alpha, settings).is_none() {
        warn!(
            "failed to draw shading of type {}",
            shading.shading_type.number()
        );

        return false;
    }

    device.draw_bitmap(&bitmap, left, top);

    true
}
