//! PDF color spaces.
//!
//! A [`ColorSpace`] is loaded once from its PDF description and then converts component
//! values into sRGB, either one color at a time with [`ColorSpace::get_rgb`] or a whole
//! line of image samples with [`ColorSpace::translate_image_line`].

mod calibrated;
mod device;
mod icc;
mod special;
mod stock;

use crate::color::calibrated::{CalGray, CalRgb, Lab};
use crate::color::icc::IccBased;
use crate::color::special::{DeviceN, PatternSpace, Separation};
use crate::context::Context;
use crate::pattern::PatternValue;
use crate::util::OptionLog;
use crate::InterpreterWarning;
use log::{error, warn};
use rustc_hash::FxHashSet;
use smallvec::{SmallVec, smallvec};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tinct_syntax::object::{Array, CacheKey, Name, Object};

pub use icc::IccProfile;
pub use special::Indexed;
pub use stock::StockColorSpaces;

/// The maximum number of components a color can have.
pub const MAX_COMPONENTS: usize = 16;

/// The components of a color.
pub type ColorComponents = SmallVec<[f32; MAX_COMPONENTS]>;

/// An sRGB color with components between 0 and 1.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    /// The red component.
    pub r: f32,
    /// The green component.
    pub g: f32,
    /// The blue component.
    pub b: f32,
}

impl Rgb {
    /// Black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a new color.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create a gray color.
    pub const fn gray(value: f32) -> Self {
        Self::new(value, value, value)
    }

    /// Convert the color to 8-bit components, in the order `[r, g, b]`.
    ///
    /// Components are truncated and saturate at 0 and 255.
    pub fn to_rgb8(&self) -> [u8; 3] {
        [
            (self.r * 255.0) as u8,
            (self.g * 255.0) as u8,
            (self.b * 255.0) as u8,
        ]
    }
}

/// The family of a color space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// `DeviceGray`.
    DeviceGray,
    /// `DeviceRGB`.
    DeviceRgb,
    /// `DeviceCMYK`.
    DeviceCmyk,
    /// `CalGray`.
    CalGray,
    /// `CalRGB`.
    CalRgb,
    /// `Lab`.
    Lab,
    /// `ICCBased`.
    IccBased,
    /// `Separation`.
    Separation,
    /// `DeviceN`.
    DeviceN,
    /// `Indexed`.
    Indexed,
    /// `Pattern`.
    Pattern,
}

impl Family {
    /// Whether color spaces of this family are special color spaces.
    ///
    /// Special color spaces can't be used as the base of another color space.
    pub fn is_special(self) -> bool {
        matches!(
            self,
            Self::Separation | Self::DeviceN | Self::Indexed | Self::Pattern
        )
    }
}

pub(crate) enum ColorSpaceType {
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
    CalGray(CalGray),
    CalRgb(CalRgb),
    Lab(Lab),
    IccBased(IccBased),
    Separation(Separation),
    DeviceN(DeviceN),
    Indexed(Indexed),
    Pattern(PatternSpace),
}

impl ColorSpaceType {
    fn family(&self) -> Family {
        match self {
            Self::DeviceGray => Family::DeviceGray,
            Self::DeviceRgb => Family::DeviceRgb,
            Self::DeviceCmyk => Family::DeviceCmyk,
            Self::CalGray(_) => Family::CalGray,
            Self::CalRgb(_) => Family::CalRgb,
            Self::Lab(_) => Family::Lab,
            Self::IccBased(_) => Family::IccBased,
            Self::Separation(_) => Family::Separation,
            Self::DeviceN(_) => Family::DeviceN,
            Self::Indexed(_) => Family::Indexed,
            Self::Pattern(_) => Family::Pattern,
        }
    }

    fn component_count(&self) -> usize {
        match self {
            Self::DeviceGray | Self::CalGray(_) => 1,
            Self::DeviceRgb | Self::CalRgb(_) | Self::Lab(_) => 3,
            Self::DeviceCmyk => 4,
            Self::IccBased(icc) => icc.component_count(),
            Self::Separation(_) | Self::Indexed(_) => 1,
            Self::DeviceN(device_n) => device_n.component_count(),
            Self::Pattern(pattern) => pattern.component_count(),
        }
    }
}

struct Repr {
    kind: ColorSpaceType,
    component_count: usize,
    std_conversion: AtomicU32,
}

/// A PDF color space.
///
/// Color spaces are cheap to clone. Clones share their state, including the
/// standard conversion toggle.
#[derive(Clone)]
pub struct ColorSpace(Arc<Repr>);

impl ColorSpace {
    pub(crate) fn new(kind: ColorSpaceType) -> Self {
        let component_count = kind.component_count();

        Self(Arc::new(Repr {
            kind,
            component_count,
            std_conversion: AtomicU32::new(0),
        }))
    }

    /// Load a color space from a name, a stream or an array.
    ///
    /// `visited` contains the objects that are currently being loaded further up the
    /// call chain. A color space that (directly or indirectly) references itself is
    /// rejected.
    pub fn load(
        ctx: &Context,
        object: &Object<'_>,
        visited: &mut FxHashSet<u128>,
    ) -> Option<Self> {
        let key = object.cache_key();

        if !visited.insert(key) {
            warn!("color space references itself");
            ctx.warn(InterpreterWarning::CyclicColorSpace);

            return None;
        }

        let color_space = Self::load_inner(ctx, object, visited);
        visited.remove(&key);

        color_space
    }

    fn load_inner(
        ctx: &Context,
        object: &Object<'_>,
        visited: &mut FxHashSet<u128>,
    ) -> Option<Self> {
        match object {
            Object::Name(name) => ctx
                .stock()
                .get_by_name(name)
                .warn_none("unknown color space name"),
            // Some producers put the name of a device color space into the dictionary of
            // a stream.
            Object::Stream(stream) => stream
                .dict()
                .entries()
                .filter_map(|(_, value)| value.into_name())
                .find_map(|name| ctx.stock().get_by_name(&name)),
            Object::Array(array) => Self::load_array(ctx, array, visited),
            _ => {
                warn!("color space has an invalid type");

                None
            }
        }
    }

    fn load_array(
        ctx: &Context,
        array: &Array<'_>,
        visited: &mut FxHashSet<u128>,
    ) -> Option<Self> {
        let family_name = array
            .get::<Name>(0)
            .warn_none("color space array doesn't start with a name")?;

        if array.len() == 1 {
            return ctx.stock().get_by_name(&family_name);
        }

        let kind = match family_id(&family_name) {
            b"CalG" => ColorSpaceType::CalGray(CalGray::new(array)?),
            b"CalR" => ColorSpaceType::CalRgb(CalRgb::new(array)?),
            b"Lab" => ColorSpaceType::Lab(Lab::new(array)?),
            b"ICCB" => ColorSpaceType::IccBased(IccBased::new(ctx, array, visited)?),
            b"Inde" | b"I" => ColorSpaceType::Indexed(Indexed::new(ctx, array, visited)?),
            b"Sepa" => ColorSpaceType::Separation(Separation::new(ctx, array, visited)?),
            b"Devi" => ColorSpaceType::DeviceN(DeviceN::new(ctx, array, visited)?),
            b"Patt" => ColorSpaceType::Pattern(PatternSpace::new(ctx, array, visited)?),
            _ => {
                warn!("unsupported color space family {}", family_name.as_str());

                return None;
            }
        };

        if kind.component_count() == 0 {
            warn!("color space has no components");

            return None;
        }

        Some(Self::new(kind))
    }

    /// Return the family of the color space.
    pub fn family(&self) -> Family {
        self.0.kind.family()
    }

    /// Return the number of components of a color in this color space.
    pub fn component_count(&self) -> usize {
        self.0.component_count
    }

    /// Whether the color space is a special color space (`Separation`, `DeviceN`,
    /// `Indexed` or `Pattern`).
    pub fn is_special(&self) -> bool {
        self.family().is_special()
    }

    /// Whether the samples of the color space can be used without an explicit
    /// conversion step.
    pub fn is_normal(&self) -> bool {
        match &self.0.kind {
            ColorSpaceType::DeviceGray
            | ColorSpaceType::DeviceRgb
            | ColorSpaceType::DeviceCmyk
            | ColorSpaceType::CalGray(_)
            | ColorSpaceType::CalRgb(_) => true,
            ColorSpaceType::IccBased(icc) => icc.is_normal(),
            _ => false,
        }
    }

    /// Convert a color into sRGB.
    ///
    /// Returns `None` if no color could be computed, for example for a `Separation`
    /// with the `None` colorant or if a tint transform failed.
    ///
    /// Colors in the `Pattern` color space must be converted with
    /// [`ColorSpace::get_pattern_rgb`] instead.
    pub fn get_rgb(&self, components: &[f32]) -> Option<Rgb> {
        if components.len() < self.component_count() {
            warn!(
                "expected {} color components, but got {}",
                self.component_count(),
                components.len()
            );

            return None;
        }

        match &self.0.kind {
            ColorSpaceType::DeviceGray => Some(device::gray_to_rgb(components[0])),
            ColorSpaceType::DeviceRgb => Some(device::rgb_to_rgb(components)),
            ColorSpaceType::DeviceCmyk => Some(device::cmyk_to_rgb(
                components,
                self.is_std_conversion_enabled(),
            )),
            ColorSpaceType::CalGray(_) => Some(Rgb::gray(components[0])),
            ColorSpaceType::CalRgb(cal_rgb) => Some(cal_rgb.to_rgb(components)),
            ColorSpaceType::Lab(lab) => Some(lab.to_rgb(components)),
            ColorSpaceType::IccBased(icc) => {
                icc.get_rgb(components, self.is_std_conversion_enabled())
            }
            ColorSpaceType::Separation(separation) => separation.get_rgb(components),
            ColorSpaceType::DeviceN(device_n) => device_n.get_rgb(components),
            ColorSpaceType::Indexed(indexed) => indexed.get_rgb(components),
            ColorSpaceType::Pattern(_) => {
                error!("colors in a pattern color space must be converted with `get_pattern_rgb`");
                debug_assert!(false, "`get_rgb` called on a pattern color space");

                None
            }
        }
    }

    /// Convert a color into sRGB, using black if no color could be computed.
    pub fn get_rgb_or_black(&self, components: &[f32]) -> Rgb {
        self.get_rgb(components).unwrap_or(Rgb::BLACK)
    }

    /// Convert the tint components of a pattern color with the base color space of
    /// the pattern color space.
    ///
    /// Returns `None` if the color space isn't a pattern color space or has no base.
    pub fn get_pattern_rgb(&self, value: &PatternValue) -> Option<Rgb> {
        self.pattern_base()?.get_rgb(&value.components)
    }

    /// Convert a line of image samples into BGR bytes.
    ///
    /// `src` contains `pixels` samples with one byte per component, `dest` receives
    /// three bytes per pixel in the order blue, green, red. The dimensions of the
    /// whole image are used to decide whether building a lookup table pays off.
    ///
    /// `trans_mask` requests the conversion used for soft masks and is only valid for
    /// `DeviceCMYK`.
    pub fn translate_image_line(
        &self,
        dest: &mut [u8],
        src: &[u8],
        pixels: usize,
        image_width: usize,
        image_height: usize,
        trans_mask: bool,
    ) {
        if trans_mask && self.family() != Family::DeviceCmyk {
            error!("transparency masks can only be translated for CMYK color spaces");
        }

        match &self.0.kind {
            ColorSpaceType::DeviceGray | ColorSpaceType::CalGray(_) => {
                device::replicate_gray(dest, src, pixels);
            }
            ColorSpaceType::DeviceRgb | ColorSpaceType::CalRgb(_) => {
                device::reverse_rgb(dest, src, pixels);
            }
            ColorSpaceType::DeviceCmyk => device::translate_cmyk(
                dest,
                src,
                pixels,
                trans_mask,
                self.is_std_conversion_enabled(),
            ),
            ColorSpaceType::Lab(lab) => lab.translate_image_line(dest, src, pixels),
            ColorSpaceType::IccBased(icc) => {
                icc.translate_image_line(dest, src, pixels, image_width, image_height);
            }
            ColorSpaceType::Pattern(_) => {
                error!("image samples can't be in a pattern color space");
            }
            _ => self.translate_per_pixel(dest, src, pixels),
        }
    }

    fn translate_per_pixel(&self, dest: &mut [u8], src: &[u8], pixels: usize) {
        let count = self.component_count();
        // Indexed samples are table indices and are used as is.
        let divisor = if self.family() == Family::Indexed {
            1.0
        } else {
            255.0
        };
        let mut components: ColorComponents = smallvec![0.0; count];

        for (sample, bgr) in src
            .chunks_exact(count)
            .zip(dest.chunks_exact_mut(3))
            .take(pixels)
        {
            for (component, byte) in components.iter_mut().zip(sample) {
                *component = *byte as f32 / divisor;
            }

            let [r, g, b] = self.get_rgb_or_black(&components).to_rgb8();
            bgr.copy_from_slice(&[b, g, r]);
        }
    }

    /// Return the default value of a component together with its minimum and
    /// maximum, as `(value, min, max)`.
    pub fn default_value(&self, component: usize) -> (f32, f32, f32) {
        match &self.0.kind {
            ColorSpaceType::Lab(lab) => lab.default_value(component),
            ColorSpaceType::Separation(_) | ColorSpaceType::DeviceN(_) => (1.0, 0.0, 1.0),
            _ => (0.0, 0.0, 1.0),
        }
    }

    /// Return the initial color of the color space, made up of the default value of
    /// each component.
    pub fn default_color(&self) -> ColorComponents {
        (0..self.component_count())
            .map(|i| self.default_value(i).0)
            .collect()
    }

    /// Enable or disable the standard conversion of the color space.
    ///
    /// The toggle is counted: every call that enables it must be paired with a call
    /// that disables it again. Disabling it more often than it was enabled has no
    /// effect.
    pub fn enable_std_conversion(&self, enabled: bool) {
        let counter = &self.0.std_conversion;

        if enabled {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                n.checked_sub(1)
            });
        }
    }

    /// Whether the standard conversion is currently enabled.
    ///
    /// With the standard conversion, CMYK colors are converted with the naive
    /// `1 - min(1, c + k)` formula instead of an approximation of how inks mix.
    pub fn is_std_conversion_enabled(&self) -> bool {
        self.0.std_conversion.load(Ordering::Relaxed) > 0
    }

    /// Return the parameters of an indexed color space.
    pub fn as_indexed(&self) -> Option<&Indexed> {
        match &self.0.kind {
            ColorSpaceType::Indexed(indexed) => Some(indexed),
            _ => None,
        }
    }

    /// Return the black point of a `CalGray`, `CalRGB` or `Lab` color space.
    ///
    /// The black point is validated but doesn't take part in color conversion.
    pub fn black_point(&self) -> Option<[f32; 3]> {
        match &self.0.kind {
            ColorSpaceType::CalGray(cal_gray) => Some(cal_gray.black_point()),
            ColorSpaceType::CalRgb(cal_rgb) => Some(cal_rgb.black_point()),
            ColorSpaceType::Lab(lab) => Some(lab.black_point()),
            _ => None,
        }
    }

    /// Return the base color space of a pattern color space, if it has one.
    pub fn pattern_base(&self) -> Option<&Self> {
        match &self.0.kind {
            ColorSpaceType::Pattern(pattern) => pattern.base(),
            _ => None,
        }
    }

    /// Whether two handles refer to the same color space.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for ColorSpace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorSpace")
            .field("family", &self.family())
            .field("components", &self.component_count())
            .finish()
    }
}

/// Color space families are identified by the first four bytes of their name.
fn family_id(name: &[u8]) -> &[u8] {
    &name[..name.len().min(4)]
}

#[cfg(test)]
mod tests {
    use super::{ColorSpace, Family, Rgb};
    use crate::context::Context;
    use crate::{InterpreterSettings, InterpreterWarning};
    use rustc_hash::FxHashSet;
    use std::sync::{Arc, Mutex};
    use tinct_syntax::object::{ObjRef, Object};
    use tinct_syntax::xref::XRef;

    pub(crate) fn load(data: &[u8]) -> Option<ColorSpace> {
        let ctx = Context::new(InterpreterSettings::default());

        ColorSpace::load(&ctx, &Object::from_bytes(data).unwrap(), &mut FxHashSet::default())
    }

    pub(crate) fn assert_rgb(actual: Rgb, expected: Rgb) {
        let close = |a: f32, b: f32| (a - b).abs() < 1e-3;

        assert!(
            close(actual.r, expected.r) && close(actual.g, expected.g) && close(actual.b, expected.b),
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn stock_names() {
        for (name, family, components) in [
            (&b"/DeviceRGB"[..], Family::DeviceRgb, 3),
            (b"/RGB", Family::DeviceRgb, 3),
            (b"/DeviceGray", Family::DeviceGray, 1),
            (b"/G", Family::DeviceGray, 1),
            (b"/DeviceCMYK", Family::DeviceCmyk, 4),
            (b"/CMYK", Family::DeviceCmyk, 4),
            (b"/Pattern", Family::Pattern, 1),
        ] {
            let cs = load(name).unwrap();

            assert_eq!(cs.family(), family);
            assert_eq!(cs.component_count(), components);
        }

        assert!(load(b"/DeviceXYZ").is_none());
        assert!(load(b"/CalRGB").is_none());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "`get_rgb` called on a pattern color space")]
    fn pattern_colors_need_a_pattern_value() {
        let _ = load(b"/Pattern").unwrap().get_rgb(&[0.0]);
    }

    #[test]
    fn stock_instances_are_shared() {
        let a = load(b"/DeviceRGB").unwrap();
        let b = load(b"[/RGB]").unwrap();

        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn array_forms() {
        assert!(load(b"[]").is_none());
        assert!(load(b"[1 2]").is_none());
        assert_eq!(load(b"[/DeviceGray]").unwrap().family(), Family::DeviceGray);
        // Device families can't have parameters.
        assert!(load(b"[/DeviceRGB 1]").is_none());
        assert!(load(b"[/Unknown /DeviceRGB]").is_none());
        assert!(load(b"42").is_none());
    }

    #[test]
    fn family_prefix() {
        // Only the first four bytes of the family name are compared.
        let cs = load(b"[/CalGrayish << /WhitePoint [0.9505 1 1.089] >>]").unwrap();
        assert_eq!(cs.family(), Family::CalGray);

        let cs = load(b"[/I /DeviceRGB 0 <ff0000>]").unwrap();
        assert_eq!(cs.family(), Family::Indexed);

        assert!(load(b"[/Labx << /WhitePoint [0.9505 1 1.089] >>]").is_none());
    }

    #[test]
    fn stream_with_device_name() {
        let cs = load(b"<< /Length 0 /Alternate /DeviceCMYK /N 4 >> stream\n\nendstream").unwrap();
        assert_eq!(cs.family(), Family::DeviceCmyk);

        assert!(load(b"<< /Length 0 /N 4 >> stream\n\nendstream").is_none());
    }

    #[test]
    fn device_conversions() {
        let gray = load(b"/DeviceGray").unwrap();
        assert_rgb(gray.get_rgb(&[0.25]).unwrap(), Rgb::gray(0.25));
        assert_rgb(gray.get_rgb(&[1.5]).unwrap(), Rgb::gray(1.0));

        let rgb = load(b"/DeviceRGB").unwrap();
        assert_rgb(rgb.get_rgb(&[0.1, 0.2, 0.3]).unwrap(), Rgb::new(0.1, 0.2, 0.3));
        assert!(rgb.get_rgb(&[0.1, 0.2]).is_none());

        let cmyk = load(b"/DeviceCMYK").unwrap();
        assert_rgb(cmyk.get_rgb(&[0.0, 0.0, 0.0, 0.0]).unwrap(), Rgb::gray(1.0));
        assert_rgb(cmyk.get_rgb(&[0.0, 0.0, 0.0, 1.0]).unwrap(), Rgb::BLACK);
        assert_rgb(cmyk.get_rgb(&[0.5, 0.0, 0.0, 0.5]).unwrap(), Rgb::new(0.25, 0.5, 0.5));
    }

    #[test]
    fn std_conversion_is_counted() {
        // Use a private instance, the stock instances are shared between tests.
        let cmyk = ColorSpace::new(super::ColorSpaceType::DeviceCmyk);

        assert!(!cmyk.is_std_conversion_enabled());
        cmyk.enable_std_conversion(false);
        assert!(!cmyk.is_std_conversion_enabled());

        cmyk.enable_std_conversion(true);
        cmyk.enable_std_conversion(true);
        assert_rgb(cmyk.get_rgb(&[0.5, 0.0, 0.0, 0.5]).unwrap(), Rgb::new(0.0, 0.5, 0.5));

        cmyk.enable_std_conversion(false);
        assert!(cmyk.is_std_conversion_enabled());
        cmyk.enable_std_conversion(false);
        assert!(!cmyk.is_std_conversion_enabled());
        assert_rgb(cmyk.get_rgb(&[0.5, 0.0, 0.0, 0.5]).unwrap(), Rgb::new(0.25, 0.5, 0.5));
    }

    #[test]
    fn is_normal() {
        assert!(load(b"/DeviceGray").unwrap().is_normal());
        assert!(load(b"/DeviceCMYK").unwrap().is_normal());
        assert!(load(b"[/CalRGB << /WhitePoint [0.9505 1 1.089] >>]").unwrap().is_normal());
        assert!(!load(b"[/Lab << /WhitePoint [0.9505 1 1.089] >>]").unwrap().is_normal());
        assert!(!load(b"[/Indexed /DeviceRGB 0 <000000>]").unwrap().is_normal());
    }

    #[test]
    fn default_values() {
        let rgb = load(b"/DeviceRGB").unwrap();
        assert_eq!(rgb.default_value(0), (0.0, 0.0, 1.0));
        assert_eq!(rgb.default_color().as_slice(), &[0.0, 0.0, 0.0]);

        let separation = load(b"[/Separation /Spot /DeviceGray << /FunctionType 2 /Domain [0 1] >>]")
            .unwrap();
        assert_eq!(separation.default_value(0), (1.0, 0.0, 1.0));
    }

    #[test]
    fn translate_image_line_generic() {
        let cs = load(b"[/Indexed /DeviceRGB 1 <ff0000 00ff00>]").unwrap();
        let mut dest = [0; 9];

        cs.translate_image_line(&mut dest, &[1, 0, 7], 3, 3, 1, false);

        // Blue, green, red. Invalid indices become black.
        assert_eq!(dest, [0, 255, 0, 0, 0, 255, 0, 0, 0]);
    }

    #[test]
    fn translate_image_line_device() {
        let mut dest = [0; 6];
        load(b"/DeviceGray").unwrap().translate_image_line(&mut dest, &[10, 20], 2, 2, 1, false);
        assert_eq!(dest, [10, 10, 10, 20, 20, 20]);

        let mut dest = [0; 3];
        load(b"/DeviceRGB").unwrap().translate_image_line(&mut dest, &[1, 2, 3], 1, 1, 1, false);
        assert_eq!(dest, [3, 2, 1]);

        // Lines that are shorter than advertised are only translated partially.
        let mut dest = [0; 6];
        load(b"/DeviceRGB").unwrap().translate_image_line(&mut dest, &[1, 2, 3, 4], 2, 2, 1, false);
        assert_eq!(dest, [3, 2, 1, 0, 0, 0]);
    }

    #[test]
    fn cyclic_reference() {
        let warnings = Arc::new(Mutex::new(vec![]));
        let sink = warnings.clone();
        let ctx = Context::new(InterpreterSettings {
            warning_sink: Arc::new(move |w| sink.lock().unwrap().push(w)),
        });

        let mut xref = XRef::new();
        xref.insert(ObjRef::new(1, 0), b"[/Indexed 1 0 R 1 <0000>]").unwrap();
        xref.insert(ObjRef::new(2, 0), b"[/Separation /Spot 3 0 R << /FunctionType 2 /Domain [0 1] >>]")
            .unwrap();
        xref.insert(ObjRef::new(3, 0), b"[/Pattern 2 0 R]").unwrap();

        let indexed = xref.get::<Object<'_>>(ObjRef::new(1, 0)).unwrap();
        assert!(ColorSpace::load(&ctx, &indexed, &mut FxHashSet::default()).is_none());

        // The pattern space loses its base, which makes its base not special, but
        // the separation is still rejected because the pattern space is special.
        let separation = xref.get::<Object<'_>>(ObjRef::new(2, 0)).unwrap();
        assert!(ColorSpace::load(&ctx, &separation, &mut FxHashSet::default()).is_none());

        let warnings = warnings.lock().unwrap();
        assert_eq!(
            warnings.as_slice(),
            &[InterpreterWarning::CyclicColorSpace, InterpreterWarning::CyclicColorSpace]
        );
    }

    #[test]
    fn visited_set_is_restored() {
        let ctx = Context::new(InterpreterSettings::default());
        let object = Object::from_bytes(b"[/Indexed /DeviceRGB 0 <000000>]").unwrap();
        let mut visited = FxHashSet::default();

        assert!(ColorSpace::load(&ctx, &object, &mut visited).is_some());
        assert!(visited.is_empty());
        assert!(ColorSpace::load(&ctx, &object, &mut visited).is_some());
    }
}
