//! Special color spaces: `Separation`, `DeviceN`, `Indexed` and `Pattern`.

use crate::color::{ColorComponents, ColorSpace, Family, MAX_COMPONENTS, Rgb};
use crate::context::Context;
use crate::function::Function;
use crate::util::OptionLog;
use log::warn;
use rustc_hash::FxHashSet;
use smallvec::smallvec;
use std::sync::Arc;
use tinct_syntax::object::{Array, Name, Object};

/// Load the base color space of a special color space, which must not be special itself.
fn load_base(
    ctx: &Context,
    object: Option<Object<'_>>,
    visited: &mut FxHashSet<u128>,
) -> Option<ColorSpace> {
    let base = ColorSpace::load(ctx, &object?, visited)?;

    if base.is_special() {
        warn!("base color space of a special color space can't be special itself");

        return None;
    }

    Some(base)
}

pub(crate) struct Separation {
    /// `None` for the `None` colorant, which never produces any marks.
    base: Option<ColorSpace>,
    tint_transform: Option<Function>,
}

impl Separation {
    pub(crate) fn new(
        ctx: &Context,
        array: &Array<'_>,
        visited: &mut FxHashSet<u128>,
    ) -> Option<Self> {
        let colorant = array.get::<Name>(1);

        if colorant.as_deref() == Some(&b"None"[..]) {
            return Some(Self {
                base: None,
                tint_transform: None,
            });
        }

        let base = load_base(ctx, array.get::<Object<'_>>(2), visited)?;

        // A broken tint transform is ignored, the tint is then used for every component
        // of the base color space.
        let tint_transform = array
            .get::<Object<'_>>(3)
            .filter(|o| !matches!(o, Object::Name(_) | Object::Null))
            .and_then(|o| Function::new(&o))
            .filter(|f| f.output_count() >= base.component_count());

        Some(Self {
            base: Some(base),
            tint_transform,
        })
    }

    pub(crate) fn get_rgb(&self, components: &[f32]) -> Option<Rgb> {
        let base = self.base.as_ref()?;

        match &self.tint_transform {
            Some(function) => base.get_rgb(&function.eval(&components[..1])?),
            None => {
                let tint: ColorComponents = smallvec![components[0]; base.component_count()];

                base.get_rgb(&tint)
            }
        }
    }
}

pub(crate) struct DeviceN {
    component_count: usize,
    base: ColorSpace,
    tint_transform: Function,
}

impl DeviceN {
    pub(crate) fn new(
        ctx: &Context,
        array: &Array<'_>,
        visited: &mut FxHashSet<u128>,
    ) -> Option<Self> {
        let names = array
            .get::<Array<'_>>(1)
            .warn_none("DeviceN color space has no colorant names")?;

        if names.raw_iter().any(|o| !matches!(o, Object::Name(_))) {
            warn!("DeviceN colorants must be names");

            return None;
        }

        let component_count = names.len();

        if component_count == 0 || component_count > MAX_COMPONENTS {
            warn!("DeviceN color space has {component_count} colorants");

            return None;
        }

        let base = load_base(ctx, array.get::<Object<'_>>(2), visited)?;

        let tint_transform = array
            .get::<Object<'_>>(3)
            .and_then(|o| Function::new(&o))
            .warn_none("DeviceN color space has no valid tint transform")?;

        if tint_transform.output_count() < base.component_count() {
            warn!("tint transform of DeviceN color space has too few outputs");

            return None;
        }

        Some(Self {
            component_count,
            base,
            tint_transform,
        })
    }

    pub(crate) fn component_count(&self) -> usize {
        self.component_count
    }

    pub(crate) fn get_rgb(&self, components: &[f32]) -> Option<Rgb> {
        let tint = self
            .tint_transform
            .eval(&components[..self.component_count])?;

        self.base.get_rgb(&tint)
    }
}

/// The parameters of an `Indexed` color space.
pub struct Indexed {
    base: ColorSpace,
    max_index: i32,
    lookup_table: Arc<[u8]>,
    /// The minimum and the extent of each base component.
    ranges: ColorComponents,
}

impl Indexed {
    pub(crate) fn new(
        ctx: &Context,
        array: &Array<'_>,
        visited: &mut FxHashSet<u128>,
    ) -> Option<Self> {
        if array.len() < 4 {
            warn!("indexed color space must have four entries");

            return None;
        }

        let base = load_base(ctx, array.get::<Object<'_>>(1), visited)?;

        let ranges = (0..base.component_count())
            .flat_map(|i| {
                let (_, min, max) = base.default_value(i);

                [min, max - min]
            })
            .collect();

        let max_index = array
            .get::<i32>(2)
            .warn_none("indexed color space has no maximum index")?
            .clamp(0, 255);

        let lookup_table: Arc<[u8]> = match array.get::<Object<'_>>(3)? {
            Object::String(string) => Arc::from(string.as_bytes()),
            Object::Stream(stream) => stream.decoded_shared(),
            _ => {
                warn!("indexed color space has an invalid lookup table");

                return None;
            }
        };

        Some(Self {
            base,
            max_index,
            lookup_table,
            ranges,
        })
    }

    /// Return the base color space.
    pub fn base(&self) -> &ColorSpace {
        &self.base
    }

    /// Return the highest valid index.
    pub fn max_index(&self) -> i32 {
        self.max_index
    }

    /// Return the raw lookup table, with one byte per base component and entry.
    pub fn lookup_table(&self) -> &[u8] {
        &self.lookup_table
    }

    pub(crate) fn get_rgb(&self, components: &[f32]) -> Option<Rgb> {
        let index = components[0] as i32;

        if index < 0 || index > self.max_index {
            warn!("index {index} is out of range for indexed color space");

            return None;
        }

        let n = self.base.component_count();
        let start = index as usize * n;
        let entry = self
            .lookup_table
            .get(start..start + n)
            .warn_none("lookup table of indexed color space is too short")?;

        let base_components: ColorComponents = entry
            .iter()
            .zip(self.ranges.chunks_exact(2))
            .map(|(byte, range)| range[0] + range[1] * *byte as f32 / 255.0)
            .collect();

        self.base.get_rgb(&base_components)
    }
}

pub(crate) struct PatternSpace {
    base: Option<ColorSpace>,
}

impl PatternSpace {
    pub(crate) fn stock() -> Self {
        Self { base: None }
    }

    pub(crate) fn new(
        ctx: &Context,
        array: &Array<'_>,
        visited: &mut FxHashSet<u128>,
    ) -> Option<Self> {
        let base = array
            .get::<Object<'_>>(1)
            .and_then(|o| ColorSpace::load(ctx, &o, visited));

        if let Some(base) = &base {
            if base.family() == Family::Pattern {
                warn!("base color space of a pattern color space can't be a pattern color space");

                return None;
            }

            if base.component_count() > MAX_COMPONENTS {
                warn!("base color space of a pattern color space has too many components");

                return None;
            }
        }

        Some(Self { base })
    }

    pub(crate) fn base(&self) -> Option<&ColorSpace> {
        self.base.as_ref()
    }

    pub(crate) fn component_count(&self) -> usize {
        self.base.as_ref().map_or(1, |b| b.component_count() + 1)
    }
}
