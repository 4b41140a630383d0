//! Dictionaries.

use crate::object::name::Name;
use crate::object::r#ref::ObjRef;
use crate::object::{CacheKey, Object, ObjectLike, Raw, identity_key, object};
use crate::reader::Reader;
use crate::xref::XRef;
use rustc_hash::FxHashMap;
use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::sync::Arc;

pub(crate) type DictRepr = FxHashMap<Name, Raw>;

/// A dictionary, which is a key-value map, keys being names, and values being any PDF object or
/// object reference.
#[derive(Clone)]
pub struct Dict<'a> {
    repr: Arc<DictRepr>,
    xref: &'a XRef,
    id: Option<ObjRef>,
}

impl Default for Dict<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Dict<'_> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.repr, &other.repr) || self.repr == other.repr
    }
}

impl<'a> Dict<'a> {
    pub(crate) fn new(repr: Arc<DictRepr>, xref: &'a XRef, id: Option<ObjRef>) -> Self {
        Self { repr, xref, id }
    }

    /// Create a new empty dictionary.
    pub fn empty() -> Dict<'a> {
        Self::new(Arc::new(DictRepr::default()), XRef::dummy(), None)
    }

    /// Parse a dictionary from an object literal. Object references resolve to the null object.
    pub fn from_bytes(data: &[u8]) -> Option<Dict<'static>> {
        Object::from_bytes(data)?.into_dict()
    }

    /// Returns the number of entries in the dictionary.
    pub fn len(&self) -> usize {
        self.repr.len()
    }

    /// Return whether the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.repr.is_empty()
    }

    /// Checks whether the dictionary contains an entry with a specific key.
    pub fn contains_key(&self, key: impl Deref<Target = [u8]>) -> bool {
        self.repr.contains_key(key.deref())
    }

    /// Returns the entry of a key as a specific object, or try to resolve it in case it's
    /// an object reference.
    #[allow(
        private_bounds,
        reason = "users shouldn't be able to implement `ObjectLike` for custom objects."
    )]
    pub fn get<T>(&self, key: impl Deref<Target = [u8]>) -> Option<T>
    where
        T: ObjectLike<'a>,
    {
        let raw = self.repr.get(key.deref())?;

        Object::from_raw(raw, self.xref).cast::<T>()
    }

    /// Get the object reference linked to a key.
    pub fn get_ref(&self, key: impl Deref<Target = [u8]>) -> Option<ObjRef> {
        match self.repr.get(key.deref())? {
            Raw::Ref(r) => Some(*r),
            _ => None,
        }
    }

    /// Returns an iterator over all keys in the dictionary.
    pub fn keys(&self) -> impl Iterator<Item = Name> + '_ {
        self.repr.keys().cloned()
    }

    /// An iterator over all entries in the dictionary, sorted by key.
    pub fn entries(&self) -> impl Iterator<Item = (Name, Object<'a>)> + '_ {
        let mut sorted = self.repr.iter().collect::<Vec<_>>();
        sorted.sort_by(|(n1, _), (n2, _)| n1.deref().cmp(n2.deref()));

        sorted
            .into_iter()
            .map(|(k, v)| (k.clone(), Object::from_raw(v, self.xref)))
    }

    /// Return the object identifier of the dict, if it's an indirect object.
    pub fn obj_id(&self) -> Option<ObjRef> {
        self.id
    }

    /// Return the cross-reference table objects are resolved through.
    pub fn xref(&self) -> &'a XRef {
        self.xref
    }
}

impl CacheKey for Dict<'_> {
    fn cache_key(&self) -> u128 {
        identity_key(self.id, &self.repr)
    }
}

impl Debug for Dict<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug_map = f.debug_map();

        for (key, value) in self.entries() {
            debug_map.entry(&key, &value);
        }

        debug_map.finish()
    }
}

object!(Dict<'a>, Dict);

pub(crate) fn read_entries(r: &mut Reader<'_>) -> Option<DictRepr> {
    r.forward_tag(b"<<")?;

    let mut entries = DictRepr::default();

    loop {
        r.skip_white_spaces_and_comments();

        if r.forward_tag(b">>").is_some() {
            return Some(entries);
        }

        let Some(name) = r.read::<Name>() else {
            // In case there is garbage in-between, be lenient and just try to skip it.
            r.read::<Raw>()?;
            continue;
        };

        r.skip_white_spaces_and_comments();
        let value = r.read::<Raw>()?;

        // Null entries are treated as missing.
        if value != Raw::Null {
            entries.insert(name, value);
        }
    }
}

/// A collection of the dictionary keys this workspace reads.
#[allow(missing_docs)]
pub mod keys {
    macro_rules! key {
        ($i:ident, $e:expr) => {
            pub const $i: &'static [u8] = $e;
        };
    }

    // A
    key!(ALL, b"All");
    key!(ALTERNATE, b"Alternate");
    key!(ANTI_ALIAS, b"AntiAlias");

    // B
    key!(BACKGROUND, b"Background");
    key!(BBOX, b"BBox");
    key!(BITS_PER_COMPONENT, b"BitsPerComponent");
    key!(BITS_PER_COORDINATE, b"BitsPerCoordinate");
    key!(BITS_PER_FLAG, b"BitsPerFlag");
    key!(BITS_PER_SAMPLE, b"BitsPerSample");
    key!(BLACK_POINT, b"BlackPoint");
    key!(BOUNDS, b"Bounds");

    // C
    key!(C0, b"C0");
    key!(C1, b"C1");
    key!(CALCMYK, b"CalCMYK");
    key!(CALGRAY, b"CalGray");
    key!(CALRGB, b"CalRGB");
    key!(CMYK, b"CMYK");
    key!(COLORSPACE, b"ColorSpace");
    key!(COORDS, b"Coords");
    key!(CS, b"CS");

    // D
    key!(DECODE, b"Decode");
    key!(DEFAULT_CMYK, b"DefaultCMYK");
    key!(DEFAULT_GRAY, b"DefaultGray");
    key!(DEFAULT_RGB, b"DefaultRGB");
    key!(DEVICE_CMYK, b"DeviceCMYK");
    key!(DEVICE_GRAY, b"DeviceGray");
    key!(DEVICE_N, b"DeviceN");
    key!(DEVICE_RGB, b"DeviceRGB");
    key!(DOMAIN, b"Domain");

    // E
    key!(ENCODE, b"Encode");
    key!(EXTEND, b"Extend");
    key!(EXT_G_STATE, b"ExtGState");

    // F
    key!(FUNCTION, b"Function");
    key!(FUNCTION_TYPE, b"FunctionType");
    key!(FUNCTIONS, b"Functions");

    // G
    key!(G, b"G");
    key!(GAMMA, b"Gamma");

    // I
    key!(I, b"I");
    key!(ICC_BASED, b"ICCBased");
    key!(INDEXED, b"Indexed");

    // L
    key!(LAB, b"Lab");
    key!(LENGTH, b"Length");

    // M
    key!(MATRIX, b"Matrix");

    // N
    key!(N, b"N");
    key!(NONE, b"None");

    // O
    key!(ORDER, b"Order");

    // P
    key!(PAINT_TYPE, b"PaintType");
    key!(PATTERN, b"Pattern");
    key!(PATTERN_TYPE, b"PatternType");

    // R
    key!(RANGE, b"Range");
    key!(RESOURCES, b"Resources");
    key!(RGB, b"RGB");

    // S
    key!(SEPARATION, b"Separation");
    key!(SHADING, b"Shading");
    key!(SHADING_TYPE, b"ShadingType");
    key!(SIZE, b"Size");

    // T
    key!(TILING_TYPE, b"TilingType");

    // V
    key!(VERTICES_PER_ROW, b"VerticesPerRow");

    // W
    key!(WHITE_POINT, b"WhitePoint");

    // X
    key!(X_STEP, b"XStep");

    // Y
    key!(Y_STEP, b"YStep");
}

#[cfg(test)]
mod tests {
    use crate::object::dict::Dict;
    use crate::object::dict::keys::{DOMAIN, FUNCTION_TYPE, N};
    use crate::object::{Array, Object, ObjRef};
    use crate::xref::XRef;

    #[test]
    fn empty_dict() {
        let dict = Dict::from_bytes(b"<<>>").unwrap();
        assert!(dict.is_empty());
    }

    #[test]
    fn typed_get() {
        let dict = Dict::from_bytes(b"<< /FunctionType 2 /Domain [0 1] /N 1.5 >>").unwrap();

        assert_eq!(dict.len(), 3);
        assert_eq!(dict.get::<u8>(FUNCTION_TYPE), Some(2));
        assert_eq!(dict.get::<[f32; 2]>(DOMAIN), Some([0.0, 1.0]));
        assert_eq!(dict.get::<f32>(N), Some(1.5));
        assert!(dict.get::<Array<'_>>(N).is_none());
    }

    #[test]
    fn null_entries_are_missing() {
        let dict = Dict::from_bytes(b"<< /A null /B 1 >>").unwrap();

        assert!(!dict.contains_key(&b"A"[..]));
        assert!(dict.contains_key(&b"B"[..]));
    }

    #[test]
    fn resolves_references() {
        let mut xref = XRef::new();
        xref.insert(ObjRef::new(1, 0), b"<< /Domain 2 0 R >>").unwrap();
        xref.insert(ObjRef::new(2, 0), b"[0 1]").unwrap();

        let dict = xref.get::<Dict<'_>>(ObjRef::new(1, 0)).unwrap();

        assert_eq!(dict.obj_id(), Some(ObjRef::new(1, 0)));
        assert_eq!(dict.get_ref(DOMAIN), Some(ObjRef::new(2, 0)));
        assert_eq!(dict.get::<Vec<f32>>(DOMAIN), Some(vec![0.0, 1.0]));
        assert!(matches!(dict.get::<Object<'_>>(DOMAIN), Some(Object::Array(_))));
    }

    #[test]
    fn garbage_between_entries() {
        let dict = Dict::from_bytes(b"<< /A 1 (junk) /B 2 >>").unwrap();

        assert_eq!(dict.get::<i32>(&b"B"[..]), Some(2));
    }
}
