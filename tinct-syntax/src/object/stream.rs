//! Streams.

use crate::object::dict::keys::LENGTH;
use crate::object::dict::{Dict, DictRepr};
use crate::object::r#ref::ObjRef;
use crate::object::{CacheKey, Object, Raw, identity_key, object};
use crate::reader::{Reader, is_eol_character};
use crate::xref::XRef;
use log::warn;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

#[derive(Debug, PartialEq)]
pub(crate) struct StreamRepr {
    pub(crate) dict: Arc<DictRepr>,
    pub(crate) data: Arc<[u8]>,
}

/// A stream of arbitrary data, together with its dictionary.
///
/// The data of a stream is stored in its decoded form, i.e. with all filters already applied.
#[derive(Clone)]
pub struct Stream<'a> {
    repr: Arc<StreamRepr>,
    xref: &'a XRef,
    id: Option<ObjRef>,
}

impl PartialEq for Stream<'_> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.repr, &other.repr) || self.repr == other.repr
    }
}

impl<'a> Stream<'a> {
    pub(crate) fn new(repr: Arc<StreamRepr>, xref: &'a XRef, id: Option<ObjRef>) -> Self {
        Self { repr, xref, id }
    }

    /// Parse a stream from an object literal, like `<< /Length 3 >> stream\nabc\nendstream`.
    pub fn from_bytes(data: &[u8]) -> Option<Stream<'static>> {
        Object::from_bytes(data)?.into_stream()
    }

    /// Return the dictionary of the stream.
    pub fn dict(&self) -> Dict<'a> {
        Dict::new(self.repr.dict.clone(), self.xref, None)
    }

    /// Return the decoded data of the stream.
    pub fn decoded(&self) -> &[u8] {
        &self.repr.data
    }

    /// Return a shared handle to the decoded data of the stream.
    pub fn decoded_shared(&self) -> Arc<[u8]> {
        self.repr.data.clone()
    }

    /// Return the object identifier of the stream, if it's an indirect object.
    pub fn obj_id(&self) -> Option<ObjRef> {
        self.id
    }
}

impl CacheKey for Stream<'_> {
    fn cache_key(&self) -> u128 {
        identity_key(self.id, &self.repr)
    }
}

impl Debug for Stream<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("dict", &self.dict())
            .field("len", &self.repr.data.len())
            .finish()
    }
}

object!(Stream<'a>, Stream);

pub(crate) fn new_repr(dict: DictRepr, data: Vec<u8>) -> StreamRepr {
    StreamRepr {
        dict: Arc::new(dict),
        data: Arc::from(data),
    }
}

/// Read the body of a stream whose dictionary has already been read.
pub(crate) fn read_body(r: &mut Reader<'_>, dict: DictRepr) -> Option<StreamRepr> {
    r.forward_tag(b"stream")?;

    // The keyword is followed by CRLF or LF.
    r.forward_tag(b"\r");
    r.forward_tag(b"\n");

    let length = match dict.get(LENGTH) {
        Some(Raw::Number(n)) => usize::try_from(n.as_i64()).ok(),
        _ => None,
    };

    let data = match length.and_then(|l| r.peek_bytes(l)) {
        Some(data) if has_end_marker(r, data.len()) => {
            r.read_bytes(data.len())?;

            data
        }
        _ => {
            warn!("stream has invalid length, searching for end marker");

            let tail = r.tail()?;
            let end = tail
                .windows(b"endstream".len())
                .position(|w| w == b"endstream")?;
            let mut data = &tail[..end];

            while let Some((last, rest)) = data.split_last() {
                if is_eol_character(*last) {
                    data = rest;
                } else {
                    break;
                }
            }

            r.read_bytes(end)?;

            data
        }
    };

    r.skip_white_spaces_and_comments();
    r.forward_tag(b"endstream")?;

    Some(new_repr(dict, data.to_vec()))
}

fn has_end_marker(r: &Reader<'_>, length: usize) -> bool {
    let mut cloned = r.clone();

    cloned.read_bytes(length).is_some() && {
        cloned.skip_white_spaces_and_comments();
        cloned.peek_tag(b"endstream").is_some()
    }
}
