//! PDF objects.

use crate::object::dict::DictRepr;
use crate::object::stream::StreamRepr;
use crate::reader::{Readable, Reader, read_object};
use crate::xref::XRef;
use rustc_hash::FxHasher;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub mod array;
pub mod dict;
pub mod name;
pub mod number;
pub mod r#ref;
pub mod stream;
pub mod string;

pub use array::Array;
pub use dict::Dict;
pub use name::Name;
pub use number::Number;
pub use r#ref::ObjRef;
pub use stream::Stream;

/// A trait for PDF objects.
pub(crate) trait ObjectLike<'a>: TryFrom<Object<'a>> + Debug + Clone {}

macro_rules! object {
    ($t:ident $(<$l:lifetime>),*, $s:ident) => {
        impl<'a> TryFrom<Object<'a>> for $t$(<$l>),* {
            type Error = ();

            fn try_from(value: Object<'a>) -> std::result::Result<Self, Self::Error> {
                match value {
                    Object::$s(b) => Ok(b),
                    _ => Err(()),
                }
            }
        }

        impl<'a> crate::object::ObjectLike<'a> for $t$(<$l>),* {}
    };
}

pub(crate) use object;

/// The owned representation of an object, as stored in the [`XRef`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Raw {
    Null,
    Boolean(bool),
    Number(Number),
    String(string::String),
    Name(Name),
    Dict(Arc<DictRepr>),
    Array(Arc<Vec<Raw>>),
    Stream(Arc<StreamRepr>),
    Ref(ObjRef),
}

impl Readable for Raw {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let object = match r.peek_byte()? {
            b'n' => {
                r.forward_tag(b"null")?;

                Self::Null
            }
            b't' => {
                r.forward_tag(b"true")?;

                Self::Boolean(true)
            }
            b'f' => {
                r.forward_tag(b"false")?;

                Self::Boolean(false)
            }
            b'/' => Self::Name(r.read::<Name>()?),
            b'<' => match r.peek_bytes(2) {
                Some(b"<<") => {
                    let dict = dict::read_entries(r)?;
                    let mut cloned = r.clone();
                    cloned.skip_white_spaces_and_comments();

                    if cloned.peek_tag(b"stream").is_some() {
                        r.jump(cloned.offset());
                        Self::Stream(Arc::new(stream::read_body(r, dict)?))
                    } else {
                        Self::Dict(Arc::new(dict))
                    }
                }
                _ => Self::String(r.read::<string::String>()?),
            },
            b'(' => Self::String(r.read::<string::String>()?),
            b'.' | b'+' | b'-' | b'0'..=b'9' => {
                if let Some(obj_ref) = r.read::<ObjRef>() {
                    Self::Ref(obj_ref)
                } else {
                    Self::Number(r.read::<Number>()?)
                }
            }
            b'[' => Self::Array(Arc::new(array::read_items(r)?)),
            _ => return None,
        };

        Some(object)
    }
}

/// A primitive PDF object.
#[derive(Debug, Clone, PartialEq)]
pub enum Object<'a> {
    /// A null object.
    Null,
    /// A boolean object.
    Boolean(bool),
    /// A number object.
    Number(Number),
    /// A string object.
    String(string::String),
    /// A name object.
    Name(Name),
    /// A dict object.
    Dict(Dict<'a>),
    /// An array object.
    Array(Array<'a>),
    /// A stream object.
    Stream(Stream<'a>),
}

impl<'a> Object<'a> {
    pub(crate) fn from_raw(raw: &Raw, xref: &'a XRef) -> Self {
        Self::from_raw_with(raw, xref, None)
    }

    pub(crate) fn from_raw_with(raw: &Raw, xref: &'a XRef, id: Option<ObjRef>) -> Self {
        match raw {
            Raw::Null => Self::Null,
            Raw::Boolean(b) => Self::Boolean(*b),
            Raw::Number(n) => Self::Number(*n),
            Raw::String(s) => Self::String(s.clone()),
            Raw::Name(n) => Self::Name(n.clone()),
            Raw::Dict(d) => Self::Dict(Dict::new(d.clone(), xref, id)),
            Raw::Array(a) => Self::Array(Array::new(a.clone(), xref, id)),
            Raw::Stream(s) => Self::Stream(Stream::new(s.clone(), xref, id)),
            Raw::Ref(r) => xref.resolve(*r),
        }
    }

    /// Parse an object from an object literal, like `<< /N 3 >>` or `[/Indexed /DeviceRGB 1 <00>]`.
    ///
    /// Object references contained in the literal resolve to the null object.
    pub fn from_bytes(data: &[u8]) -> Option<Object<'static>> {
        Some(Object::from_raw(&read_object(data)?, XRef::dummy()))
    }

    /// Try casting the object to a specific subtype.
    #[allow(
        private_bounds,
        reason = "users shouldn't be able to implement `ObjectLike` for custom objects."
    )]
    pub fn cast<T>(self) -> Option<T>
    where
        T: ObjectLike<'a>,
    {
        self.try_into().ok()
    }

    /// Try casting the object to a dictionary.
    #[inline(always)]
    pub fn into_dict(self) -> Option<Dict<'a>> {
        self.cast()
    }

    /// Try casting the object to a name.
    #[inline(always)]
    pub fn into_name(self) -> Option<Name> {
        self.cast()
    }

    /// Try casting the object to a boolean.
    #[inline(always)]
    pub fn into_bool(self) -> Option<bool> {
        self.cast()
    }

    /// Try casting the object to a string.
    #[inline(always)]
    pub fn into_string(self) -> Option<string::String> {
        self.cast()
    }

    /// Try casting the object to a stream.
    #[inline(always)]
    pub fn into_stream(self) -> Option<Stream<'a>> {
        self.cast()
    }

    /// Try casting the object to an array.
    #[inline(always)]
    pub fn into_array(self) -> Option<Array<'a>> {
        self.cast()
    }

    /// Try casting the object to a f32.
    #[inline(always)]
    pub fn into_f32(self) -> Option<f32> {
        self.cast()
    }

    /// Try casting the object to an i32.
    #[inline(always)]
    pub fn into_i32(self) -> Option<i32> {
        self.cast()
    }

    /// Try casting the object to a number.
    #[inline(always)]
    pub fn into_number(self) -> Option<Number> {
        self.cast()
    }

    /// Whether the object is the null object.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl<'a> ObjectLike<'a> for Object<'a> {}

object!(bool, Boolean);

/// A type that can be used as a key for caching resources derived from objects.
pub trait CacheKey {
    /// Return the cache key.
    ///
    /// Objects that were reached through an object reference are keyed by that reference,
    /// direct objects by the identity of their storage.
    fn cache_key(&self) -> u128;
}

const REF_TAG: u128 = 1 << 64;
const DIRECT_TAG: u128 = 2 << 64;
const VALUE_TAG: u128 = 3 << 64;

impl CacheKey for ObjRef {
    fn cache_key(&self) -> u128 {
        REF_TAG | ((self.obj_number as u32 as u128) << 32) | self.gen_number as u32 as u128
    }
}

pub(crate) fn identity_key<T>(id: Option<ObjRef>, repr: &Arc<T>) -> u128 {
    match id {
        Some(id) => id.cache_key(),
        None => DIRECT_TAG | Arc::as_ptr(repr) as usize as u128,
    }
}

impl CacheKey for Object<'_> {
    fn cache_key(&self) -> u128 {
        match self {
            Object::Dict(d) => d.cache_key(),
            Object::Array(a) => a.cache_key(),
            Object::Stream(s) => s.cache_key(),
            Object::Name(n) => value_key(n.as_ref()),
            Object::String(s) => value_key(s.as_bytes()),
            Object::Number(n) => value_key(&n.as_f64().to_bits()),
            Object::Boolean(b) => value_key(b),
            Object::Null => value_key(&()),
        }
    }
}

fn value_key(value: &(impl Hash + ?Sized)) -> u128 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);

    VALUE_TAG | hasher.finish() as u128
}

/// A convenience function that extracts a dict and a stream from an object.
/// If the object is just a dictionary, it will return `None` for the stream.
/// If the object is a stream, it will return its dictionary as well as the stream
/// itself.
pub fn dict_or_stream<'a>(obj: &Object<'a>) -> Option<(Dict<'a>, Option<Stream<'a>>)> {
    match obj {
        Object::Stream(stream) => Some((stream.dict(), Some(stream.clone()))),
        Object::Dict(dict) => Some((dict.clone(), None)),
        _ => None,
    }
}
