//! ICC-based color spaces.

use crate::InterpreterWarning;
use crate::color::{ColorSpace, Family, Rgb, device};
use crate::context::Context;
use crate::util::OptionLog;
use log::warn;
use moxcms::{
    ColorProfile, DataColorSpace, Layout, Transform8BitExecutor, TransformF32BitExecutor,
    TransformOptions,
};
use rustc_hash::FxHashSet;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, OnceLock};
use tinct_syntax::object::dict::keys::{ALTERNATE, N};
use tinct_syntax::object::{Array, Object, Stream};

/// The number of steps per component in the lookup table of an ICC color space.
const LOOKUP_STEPS: usize = 52;

struct Transforms {
    bytes: Box<Transform8BitExecutor>,
    floats: Box<TransformF32BitExecutor>,
}

struct IccRepr {
    transforms: Option<Transforms>,
    component_count: usize,
    is_srgb: bool,
    is_lab: bool,
    is_normal: bool,
}

/// A parsed ICC profile together with its transforms into sRGB.
///
/// A profile that can't be parsed or whose color space isn't supported is still
/// represented, but [`IccProfile::is_supported`] returns `false` for it.
#[derive(Clone)]
pub struct IccProfile(Arc<IccRepr>);

impl Debug for IccProfile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IccProfile")
            .field("components", &self.0.component_count)
            .field("srgb", &self.0.is_srgb)
            .field("supported", &self.is_supported())
            .finish()
    }
}

impl IccProfile {
    /// Create a new profile from the data of an ICC profile stream with the given
    /// number of components.
    pub fn new(data: &[u8], component_count: usize) -> Self {
        const SRGB_MARKER: &[u8] = b"sRGB";

        // The device model of the profile header.
        let is_srgb = component_count == 3 && data.get(52..56) == Some(SRGB_MARKER);

        let parsed = if is_srgb {
            None
        } else {
            ColorProfile::new_from_slice(data)
                .ok()
                .warn_none("failed to parse ICC profile")
        };

        let is_lab = parsed
            .as_ref()
            .is_some_and(|p| p.color_space == DataColorSpace::Lab);
        let is_normal = parsed.as_ref().is_some_and(|p| {
            matches!(
                p.color_space,
                DataColorSpace::Gray | DataColorSpace::Rgb | DataColorSpace::Cmyk
            )
        });
        let transforms = parsed.and_then(|p| create_transforms(&p, component_count));

        Self(Arc::new(IccRepr {
            transforms,
            component_count,
            is_srgb,
            is_lab,
            is_normal,
        }))
    }

    /// Whether the profile describes sRGB, in which case colors can be used as is.
    pub fn is_srgb(&self) -> bool {
        self.0.is_srgb
    }

    /// Whether colors can be converted with the profile.
    pub fn is_supported(&self) -> bool {
        self.0.is_srgb || self.0.transforms.is_some()
    }

    /// Whether the profile describes a gray, RGB or CMYK color space.
    pub fn is_normal(&self) -> bool {
        self.0.is_srgb || self.0.is_normal
    }

    /// Return the number of components of the profile.
    pub fn component_count(&self) -> usize {
        self.0.component_count
    }

    /// Convert a single color.
    pub fn transform(&self, components: &[f32]) -> Option<Rgb> {
        let components = components.get(..self.0.component_count)?;

        if self.0.is_srgb {
            return Some(Rgb::new(components[0], components[1], components[2]));
        }

        let transforms = self.0.transforms.as_ref()?;
        let mut output = [0.0_f32; 3];

        if self.0.is_lab {
            // Lab profiles expect normalized values.
            let scaled = [
                components[0] / 100.0,
                (components[1] + 128.0) / 255.0,
                (components[2] + 128.0) / 255.0,
            ];
            transforms.floats.transform(&scaled, &mut output).ok()?;
        } else {
            transforms.floats.transform(components, &mut output).ok()?;
        }

        let [r, g, b] = output.map(|v| v.clamp(0.0, 1.0));

        Some(Rgb::new(r, g, b))
    }

    /// Convert `pixels` 8-bit samples into BGR bytes.
    pub fn translate_scanline(&self, dest: &mut [u8], src: &[u8], pixels: usize) -> Option<()> {
        let n = self.0.component_count;
        let src = src.get(..pixels * n)?;
        let dest = dest.get_mut(..pixels * 3)?;

        if self.0.is_srgb {
            device::reverse_rgb(dest, src, pixels);

            return Some(());
        }

        let transforms = self.0.transforms.as_ref()?;
        transforms.bytes.transform(src, dest).ok()?;

        for rgb in dest.chunks_exact_mut(3) {
            rgb.swap(0, 2);
        }

        Some(())
    }
}

fn create_transforms(profile: &ColorProfile, component_count: usize) -> Option<Transforms> {
    let src_layout = match component_count {
        1 => Layout::Gray,
        3 => Layout::Rgb,
        4 => Layout::Rgba,
        _ => {
            warn!("unsupported number of components {component_count} for ICC profile");

            return None;
        }
    };

    let dest_profile = ColorProfile::new_srgb();

    let bytes = profile
        .create_transform_8bit(src_layout, &dest_profile, Layout::Rgb, TransformOptions::default())
        .ok()
        .warn_none("failed to create 8-bit ICC transform")?;
    let floats = profile
        .create_transform_f32(src_layout, &dest_profile, Layout::Rgb, TransformOptions::default())
        .ok()
        .warn_none("failed to create ICC transform")?;

    Some(Transforms { bytes, floats })
}

pub(crate) struct IccBased {
    profile: IccProfile,
    base: Option<ColorSpace>,
    lookup_table: OnceLock<Option<Box<[u8]>>>,
}

impl IccBased {
    pub(crate) fn new(
        ctx: &Context,
        array: &Array<'_>,
        visited: &mut FxHashSet<u128>,
    ) -> Option<Self> {
        let stream = array
            .get::<Stream<'_>>(1)
            .warn_none("ICC-based color space has no profile stream")?;
        let dict = stream.dict();

        let component_count = dict
            .get::<usize>(N)
            .filter(|n| matches!(n, 1 | 3 | 4))
            .warn_none("ICC profile has an invalid number of components")?;

        let profile = ctx.get_icc_profile(&stream)?;

        let base = if !profile.is_supported() || profile.is_srgb() {
            if !profile.is_supported() {
                ctx.warn(InterpreterWarning::UnsupportedIccProfile);
            }

            let alternate = dict
                .get::<Object<'_>>(ALTERNATE)
                .filter(|o| !o.is_null())
                .and_then(|o| ColorSpace::load(ctx, &o, visited))
                .filter(|cs| {
                    cs.family() != Family::Pattern && cs.component_count() == component_count
                });

            alternate.or_else(|| ctx.stock().for_component_count(component_count))
        } else {
            None
        };

        Some(Self {
            profile,
            base,
            lookup_table: OnceLock::new(),
        })
    }

    pub(crate) fn component_count(&self) -> usize {
        self.profile.component_count()
    }

    pub(crate) fn is_normal(&self) -> bool {
        if self.profile.is_supported() {
            self.profile.is_normal()
        } else {
            self.base.as_ref().is_some_and(|b| b.is_normal())
        }
    }

    pub(crate) fn get_rgb(&self, components: &[f32], std_conversion: bool) -> Option<Rgb> {
        if self.profile.is_srgb() {
            return self.profile.transform(components);
        }

        if self.component_count() == 4 && std_conversion {
            return Some(device::cmyk_to_rgb(components, true));
        }

        if self.profile.is_supported() {
            return self.profile.transform(components);
        }

        match &self.base {
            Some(base) => base.get_rgb(components),
            None => Some(Rgb::BLACK),
        }
    }

    pub(crate) fn translate_image_line(
        &self,
        dest: &mut [u8],
        src: &[u8],
        pixels: usize,
        image_width: usize,
        image_height: usize,
    ) {
        if self.profile.is_srgb() {
            device::reverse_rgb(dest, src, pixels);

            return;
        }

        if !self.profile.is_supported() {
            if let Some(base) = &self.base {
                base.translate_image_line(dest, src, pixels, image_width, image_height, false);
            }

            return;
        }

        let n = self.component_count();
        let table_size = LOOKUP_STEPS.pow(n as u32);

        // A lookup table only pays off for large images.
        if n > 3 || image_width.saturating_mul(image_height) < table_size * 3 / 2 {
            let _ = self.profile.translate_scanline(dest, src, pixels);

            return;
        }

        let table = self.lookup_table.get_or_init(|| {
            build_lookup_table(n, |dest, src, pixels| {
                self.profile.translate_scanline(dest, src, pixels)
            })
        });

        match table {
            Some(table) => translate_with_table(table, n, dest, src, pixels),
            None => {
                let _ = self.profile.translate_scanline(dest, src, pixels);
            }
        }
    }
}

/// Translate a grid of `52^n` sample values, where each component is quantized to a
/// multiple of 5.
fn build_lookup_table(
    n: usize,
    translate: impl Fn(&mut [u8], &[u8], usize) -> Option<()>,
) -> Option<Box<[u8]>> {
    let size = LOOKUP_STEPS.pow(n as u32);
    let mut samples = vec![0_u8; size * n];

    for (index, sample) in samples.chunks_exact_mut(n).enumerate() {
        let mut color = index;
        let mut order = size / LOOKUP_STEPS;

        for component in sample {
            *component = (color / order * 5) as u8;
            color %= order;
            order /= LOOKUP_STEPS;
        }
    }

    let mut table = vec![0_u8; size * 3];
    translate(&mut table, &samples, size)?;

    Some(table.into_boxed_slice())
}

fn translate_with_table(table: &[u8], n: usize, dest: &mut [u8], src: &[u8], pixels: usize) {
    for (sample, bgr) in src
        .chunks_exact(n)
        .zip(dest.chunks_exact_mut(3))
        .take(pixels)
    {
        let index = sample
            .iter()
            .fold(0, |acc, b| acc * LOOKUP_STEPS + *b as usize / 5);

        if let Some(entry) = table.get(index * 3..index * 3 + 3) {
            bgr.copy_from_slice(entry);
        }
    }
}
