/*!
Color spaces, functions, mesh streams and shadings of PDF files.

This crate turns the color-related objects of a PDF document into reusable, immutable
evaluators:

- [`ColorSpace`](color::ColorSpace) resolves any of the eleven PDF color space families
  and converts component values into sRGB.
- [`Function`](function::Function) evaluates sampled, exponential, stitching and
  PostScript calculator functions.
- [`MeshStream`](mesh::MeshStream) decodes the bit-packed vertex data of mesh shadings.
- [`Shading`](shading::Shading) and [`Pattern`](pattern::Pattern) hold validated shading
  and pattern dictionaries.

Everything is loaded through a [`Context`](context::Context), which caches loaded
resources per document. Rasterizing shadings is the job of the `tinct` crate.

Loading never panics on malformed input. Instead, `None` is returned and the reason
is logged with the [`log`] crate. Some problems are additionally reported to the
[`warning_sink`](InterpreterSettings::warning_sink) of the settings.
*/

#![forbid(unsafe_code)]

use std::sync::Arc;

mod cache;
pub mod color;
pub mod context;
pub mod function;
pub mod mesh;
pub mod pattern;
pub mod shading;
mod util;

pub use context::Context;

/// A callback function for resolving warnings during interpretation.
pub type WarningSinkFn = Arc<dyn Fn(InterpreterWarning) + Send + Sync>;

#[derive(Clone)]
/// Settings that should be applied while loading color resources.
pub struct InterpreterSettings {
    /// A sink that receives warnings about unsupported or broken resources.
    ///
    /// Loading continues after a warning was emitted, either by falling back to a
    /// simpler representation (for example the alternate color space of an ICC profile)
    /// or by skipping the resource. The warnings allow embedders to tell users why a
    /// document might not render as intended.
    ///
    /// By default, all warnings are discarded.
    pub warning_sink: WarningSinkFn,
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        Self {
            warning_sink: Arc::new(|_| {}),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Warnings that can occur while loading color resources.
pub enum InterpreterWarning {
    /// An ICC profile couldn't be used, so the alternate color space was used instead.
    UnsupportedIccProfile,
    /// A color space referenced itself.
    CyclicColorSpace,
    /// A shading with an unknown shading type was encountered.
    UnsupportedShadingType,
}
