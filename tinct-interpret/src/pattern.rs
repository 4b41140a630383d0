//! PDF patterns.

use crate::color::ColorComponents;
use crate::context::Context;
use crate::shading::Shading;
use crate::util::OptionLog;
use kurbo::{Affine, Rect};
use log::warn;
use tinct_syntax::object::dict::keys::{
    BBOX, EXT_G_STATE, MATRIX, PAINT_TYPE, PATTERN_TYPE, SHADING, TILING_TYPE, X_STEP, Y_STEP,
};
use tinct_syntax::object::{Dict, Object, dict_or_stream};

/// A PDF pattern.
#[derive(Clone, Debug)]
pub enum Pattern {
    /// A tiling pattern.
    Tiling(TilingPattern),
    /// A shading pattern.
    Shading(ShadingPattern),
}

impl Pattern {
    /// Load a pattern from a pattern dictionary or stream.
    pub fn new(object: &Object<'_>, ctx: &Context) -> Option<Self> {
        let (dict, _) = dict_or_stream(object).warn_none("pattern has an invalid type")?;

        match dict.get::<u8>(PATTERN_TYPE) {
            Some(1) => Some(Self::Tiling(TilingPattern::new(&dict)?)),
            Some(2) => Some(Self::Shading(ShadingPattern::new(&dict, ctx)?)),
            _ => {
                warn!("pattern has an invalid pattern type");

                None
            }
        }
    }

    /// The pattern matrix, mapping pattern space into the default coordinate space of
    /// the page.
    pub fn matrix(&self) -> Affine {
        match self {
            Self::Tiling(t) => t.matrix,
            Self::Shading(s) => s.matrix,
        }
    }
}

/// How the color of a tiling pattern is specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintType {
    /// The pattern cell specifies its own colors.
    Colored,
    /// The pattern cell is a stencil that is painted with the color of the pattern
    /// value.
    Uncolored,
}

/// How the cells of a tiling pattern are adjusted to the device pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilingType {
    /// Cells are spaced consistently, the cell may be distorted slightly.
    ConstantSpacing,
    /// Cells are not distorted, the spacing may vary slightly.
    NoDistortion,
    /// Cells are spaced consistently with additional distortion for faster tiling.
    ConstantSpacingFasterTiling,
}

/// A tiling pattern.
///
/// Only the parameters of the pattern are read, the content of the pattern cell isn't
/// interpreted.
#[derive(Clone, Debug)]
pub struct TilingPattern {
    /// How the colors of the pattern are specified.
    pub paint_type: PaintType,
    /// How the pattern cells are spaced.
    pub tiling_type: TilingType,
    /// The bounding box of the pattern cell, in pattern space.
    pub bbox: Rect,
    /// The horizontal spacing between pattern cells.
    pub x_step: f32,
    /// The vertical spacing between pattern cells.
    pub y_step: f32,
    /// The pattern matrix.
    pub matrix: Affine,
}

impl TilingPattern {
    /// Read a tiling pattern from its dictionary.
    pub fn new(dict: &Dict<'_>) -> Option<Self> {
        let paint_type = match dict.get::<u8>(PAINT_TYPE) {
            Some(1) => PaintType::Colored,
            Some(2) => PaintType::Uncolored,
            _ => {
                warn!("tiling pattern has an invalid paint type");

                return None;
            }
        };

        let tiling_type = match dict.get::<u8>(TILING_TYPE) {
            Some(1) => TilingType::ConstantSpacing,
            Some(2) => TilingType::NoDistortion,
            Some(3) => TilingType::ConstantSpacingFasterTiling,
            _ => {
                warn!("tiling pattern has an invalid tiling type");

                return None;
            }
        };

        let bbox = dict
            .get::<[f64; 4]>(BBOX)
            .map(|[x0, y0, x1, y1]| Rect::new(x0, y0, x1, y1).abs())
            .warn_none("tiling pattern has no bounding box")?;

        let x_step = dict
            .get::<f32>(X_STEP)
            .filter(|s| *s != 0.0)
            .warn_none("tiling pattern has an invalid horizontal step")?;
        let y_step = dict
            .get::<f32>(Y_STEP)
            .filter(|s| *s != 0.0)
            .warn_none("tiling pattern has an invalid vertical step")?;

        Some(Self {
            paint_type,
            tiling_type,
            bbox,
            x_step,
            y_step,
            matrix: read_matrix(dict),
        })
    }
}

/// A shading, either from a shading pattern or painted directly with the `sh` operator.
#[derive(Clone, Debug)]
pub struct ShadingPattern {
    /// The shading.
    pub shading: Shading,
    /// The pattern matrix.
    ///
    /// This is the identity matrix for shadings painted with `sh`.
    pub matrix: Affine,
    /// Whether the shading is painted with the `sh` operator instead of being used as
    /// a pattern.
    ///
    /// The background of such shadings is ignored.
    pub is_shading_object: bool,
}

impl ShadingPattern {
    /// Read a shading pattern from its pattern dictionary.
    pub fn new(dict: &Dict<'_>, ctx: &Context) -> Option<Self> {
        let shading = dict
            .get::<Object<'_>>(SHADING)
            .and_then(|o| Shading::load(&o, ctx))
            .warn_none("shading pattern has no valid shading")?;

        if dict.contains_key(EXT_G_STATE) {
            warn!("graphics states of shading patterns are ignored");
        }

        Some(Self {
            shading,
            matrix: read_matrix(dict),
            is_shading_object: false,
        })
    }

    /// Wrap a shading object, as painted by the `sh` operator.
    pub fn from_shading(object: &Object<'_>, ctx: &Context) -> Option<Self> {
        Some(Self {
            shading: Shading::load(object, ctx)?,
            matrix: Affine::IDENTITY,
            is_shading_object: true,
        })
    }
}

/// The value of a color in the `Pattern` color space.
#[derive(Clone, Debug, Default)]
pub struct PatternValue {
    /// The color components for uncolored tiling patterns, in the base color space
    /// of the pattern color space.
    pub components: ColorComponents,
    /// The pattern to paint with.
    pub pattern: Option<Pattern>,
}

fn read_matrix(dict: &Dict<'_>) -> Affine {
    dict.get::<[f64; 6]>(MATRIX)
        .map(Affine::new)
        .unwrap_or_default()
}
