//! Drawing the different shading types into a bitmap.

mod function;
mod gradient;
mod patch;
mod triangle;

use crate::RenderSettings;
use crate::bitmap::{Bgra8, Bitmap};
use kurbo::Affine;
use log::warn;
use tinct_interpret::color::{ColorComponents, Rgb};
use tinct_interpret::shading::{Shading, ShadingType};

/// The number of entries of a color ramp.
pub(crate) const RAMP_STEPS: usize = 256;

/// Draw a shading into a bitmap.
///
/// `object_to_bitmap` maps the shading space into the pixels of the bitmap. Returns
/// `None` if the shading can't be drawn at all, in which case the bitmap should be
/// discarded.
pub(crate) fn draw(
    shading: &Shading,
    bitmap: &mut Bitmap,
    object_to_bitmap: Affine,
    alpha: u8,
    settings: &RenderSettings,
) -> Option<()> {
    match shading.shading_type.as_ref() {
        ShadingType::FunctionBased { domain, matrix } => {
            function::draw(bitmap, shading, object_to_bitmap * *matrix, *domain, alpha)
        }
        ShadingType::Axial {
            coords,
            domain,
            extend,
        } => {
            let ramp = ColorRamp::new(shading, *domain, *extend, alpha)?;
            gradient::draw_axial(bitmap, &ramp, object_to_bitmap, *coords)
        }
        ShadingType::Radial {
            coords,
            domain,
            extend,
        } => {
            let ramp = ColorRamp::new(shading, *domain, *extend, alpha)?;
            gradient::draw_radial(bitmap, &ramp, object_to_bitmap, *coords)
        }
        ShadingType::FreeForm { mesh } => {
            triangle::draw_free_form(bitmap, shading, mesh, object_to_bitmap, alpha)
        }
        ShadingType::Lattice {
            mesh,
            vertices_per_row,
        } => triangle::draw_lattice(
            bitmap,
            shading,
            mesh,
            *vertices_per_row,
            object_to_bitmap,
            alpha,
        ),
        ShadingType::Coons { mesh } => patch::draw(
            bitmap,
            shading,
            mesh,
            false,
            object_to_bitmap,
            alpha,
            settings,
        ),
        ShadingType::Tensor { mesh } => patch::draw(
            bitmap,
            shading,
            mesh,
            true,
            object_to_bitmap,
            alpha,
            settings,
        ),
    }
}

/// Evaluate all functions of a shading and convert their concatenated outputs with
/// the color space of the shading.
///
/// A function that fails to evaluate contributes zeros.
pub(crate) fn eval_color(shading: &Shading, input: &[f32], output_count: usize) -> Rgb {
    let mut outputs = ColorComponents::new();

    for function in &shading.functions {
        match function.eval(input) {
            Some(values) => outputs.extend(values),
            None => outputs.extend(std::iter::repeat_n(0.0, function.output_count())),
        }
    }

    outputs.resize(output_count, 0.0);

    shading.color_space.get_rgb_or_black(&outputs)
}

/// Convert a color into 8-bit components, truncating each channel.
pub(crate) fn to_bgra(rgb: Rgb, alpha: u8) -> Bgra8 {
    let [r, g, b] = rgb.to_rgb8();

    Bgra8::new(r, g, b, alpha)
}

/// Invert the transform from shading space into the bitmap.
pub(crate) fn invert(transform: Affine) -> Option<Affine> {
    let det = transform.determinant();

    if !det.is_finite() || det.abs() < 1e-12 {
        warn!("shading has a non-invertible transform");

        return None;
    }

    Some(transform.inverse())
}

/// The colors of an axial or radial shading, sampled at equidistant points of its
/// domain.
pub(crate) struct ColorRamp {
    colors: [Bgra8; RAMP_STEPS],
    extend: [bool; 2],
}

impl ColorRamp {
    /// Sample the functions of a shading over `domain`.
    ///
    /// Returns `None` if the functions don't produce any outputs.
    pub(crate) fn new(
        shading: &Shading,
        domain: [f32; 2],
        extend: [bool; 2],
        alpha: u8,
    ) -> Option<Self> {
        let output_count = shading.output_count();

        if output_count == 0 {
            warn!("shading functions don't produce any color components");

            return None;
        }

        let [t_min, t_max] = domain;

        let colors = std::array::from_fn(|i| {
            let input = (t_max - t_min) * i as f32 / RAMP_STEPS as f32 + t_min;
            let rgb = eval_color(shading, &[input], output_count);
            let round = |v: f32| (v * 255.0).round() as u8;

            Bgra8::new(round(rgb.r), round(rgb.g), round(rgb.b), alpha)
        });

        Some(Self { colors, extend })
    }

    /// Look up the color for the parametric value `t`, where 0 corresponds to the start
    /// and 1 to the end of the shading.
    ///
    /// Returns `None` if `t` lies outside of the shading and the shading isn't extended
    /// in that direction.
    pub(crate) fn color(&self, t: f32) -> Option<Bgra8> {
        if !t.is_finite() {
            return None;
        }

        let index = (t * (RAMP_STEPS - 1) as f32) as i32;

        if index < 0 {
            self.extend[0].then_some(self.colors[0])
        } else if index >= RAMP_STEPS as i32 {
            self.extend[1].then_some(self.colors[RAMP_STEPS - 1])
        } else {
            Some(self.colors[index as usize])
        }
    }
}
