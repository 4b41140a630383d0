//! The per-document loading context.

use crate::cache::Cache;
use crate::color::{ColorSpace, Family, IccProfile, StockColorSpaces};
use crate::util::OptionLog;
use crate::{InterpreterSettings, InterpreterWarning};
use rustc_hash::FxHashSet;
use siphasher::sip128::{Hasher128, SipHasher13};
use std::fmt::{Debug, Formatter};
use std::hash::Hasher;
use tinct_syntax::object::dict::keys::{COLORSPACE, DEFAULT_CMYK, DEFAULT_GRAY, DEFAULT_RGB, N};
use tinct_syntax::object::{CacheKey, Dict, Object, Stream};

/// The state shared by everything that is loaded from one document.
///
/// A context caches color spaces, ICC profiles and shadings, so that an object that is
/// referenced many times is only processed once. Contexts are cheap to clone, and
/// clones share their caches.
#[derive(Clone)]
pub struct Context {
    settings: InterpreterSettings,
    stock: StockColorSpaces,
    color_spaces: Cache,
    profiles: Cache,
    profile_digests: Cache,
    shadings: Cache,
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

impl Context {
    /// Create a new context that uses the process-wide stock color spaces.
    pub fn new(settings: InterpreterSettings) -> Self {
        Self::new_with(StockColorSpaces::global().clone(), settings)
    }

    /// Create a new context with its own set of stock color spaces.
    pub fn new_with(stock: StockColorSpaces, settings: InterpreterSettings) -> Self {
        Self {
            settings,
            stock,
            color_spaces: Cache::new(),
            profiles: Cache::new(),
            profile_digests: Cache::new(),
            shadings: Cache::new(),
        }
    }

    /// Return the settings of the context.
    pub fn settings(&self) -> &InterpreterSettings {
        &self.settings
    }

    /// Return the stock color spaces used by the context.
    pub fn stock(&self) -> &StockColorSpaces {
        &self.stock
    }

    pub(crate) fn warn(&self, warning: InterpreterWarning) {
        (self.settings.warning_sink)(warning);
    }

    pub(crate) fn shadings(&self) -> &Cache {
        &self.shadings
    }

    /// Resolve a color space as it appears in a content stream or a resource.
    ///
    /// Names of device color spaces are replaced by the `DefaultGray`, `DefaultRGB` and
    /// `DefaultCMYK` entries of the color space resources, if they exist and have the
    /// right number of components. Other names are looked up in the color space
    /// resources.
    pub fn get_color_space(
        &self,
        object: &Object<'_>,
        resources: Option<&Dict<'_>>,
    ) -> Option<ColorSpace> {
        let resources = resources.and_then(|r| r.get::<Dict<'_>>(COLORSPACE));

        let Object::Name(name) = object else {
            return self.load_color_space(object);
        };

        if let Some(stock) = self.stock.get_by_name(name) {
            let default_key = match stock.family() {
                Family::DeviceGray => DEFAULT_GRAY,
                Family::DeviceRgb => DEFAULT_RGB,
                Family::DeviceCmyk => DEFAULT_CMYK,
                _ => return Some(stock),
            };

            let default = resources
                .as_ref()
                .and_then(|r| r.get::<Object<'_>>(default_key))
                .and_then(|o| self.load_color_space(&o))
                .filter(|cs| cs.component_count() == stock.component_count());

            return Some(default.unwrap_or(stock));
        }

        let named = resources
            .and_then(|r| r.get::<Object<'_>>(&**name))
            .warn_none("color space resource doesn't exist")?;

        match named {
            // Names in the resources can only refer to stock color spaces.
            Object::Name(name) => self.stock.get_by_name(&name),
            other => self.load_color_space(&other),
        }
    }

    /// Load a color space, reusing the cached instance for indirect arrays.
    pub fn load_color_space(&self, object: &Object<'_>) -> Option<ColorSpace> {
        let load = || ColorSpace::load(self, object, &mut FxHashSet::default());

        match object {
            Object::Array(array) if array.obj_id().is_some() => self
                .color_spaces
                .get_or_insert_with(object.cache_key(), load),
            _ => load(),
        }
    }

    /// Return the ICC profile of an ICC profile stream.
    ///
    /// Returns `None` if the stream doesn't have a valid number of components. Profiles
    /// with the same content and number of components share one instance, even if they
    /// are stored in different objects.
    pub fn get_icc_profile(&self, stream: &Stream<'_>) -> Option<IccProfile> {
        let component_count = stream
            .dict()
            .get::<usize>(N)
            .filter(|n| matches!(n, 1 | 3 | 4))
            .warn_none("ICC profile stream has an invalid number of components")?;

        let load = || {
            let data = stream.decoded();
            let digest = content_digest(data, component_count);

            self.profile_digests.get_or_insert_with(digest, || {
                Some(IccProfile::new(data, component_count))
            })
        };

        if stream.obj_id().is_some() {
            self.profiles.get_or_insert_with(stream.cache_key(), load)
        } else {
            load()
        }
    }
}

fn content_digest(data: &[u8], component_count: usize) -> u128 {
    let mut hasher = SipHasher13::new();
    hasher.write(data);
    hasher.write_usize(component_count);

    hasher.finish128().as_u128()
}
