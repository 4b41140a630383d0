//! Storing and resolving indirect objects.

use crate::object::dict::read_entries;
use crate::object::stream::new_repr;
use crate::object::{ObjRef, Object, ObjectLike, Raw};
use crate::reader::{Reader, read_object};
use log::warn;
use rustc_hash::FxHashMap;
use std::sync::{Arc, LazyLock};

const MAX_REFERENCE_CHAIN: usize = 32;

/// A table of indirect objects, which object references are resolved against.
#[derive(Debug, Default)]
pub struct XRef {
    objects: FxHashMap<ObjRef, Raw>,
}

impl XRef {
    /// Create a new, empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a table without any objects.
    pub fn dummy() -> &'static XRef {
        static DUMMY: LazyLock<XRef> = LazyLock::new(XRef::new);

        &DUMMY
    }

    /// Parse an object literal and register it under the given identifier.
    ///
    /// Returns `None` if the literal is not a valid object, in which case the table
    /// is left unchanged.
    pub fn insert(&mut self, id: ObjRef, data: &[u8]) -> Option<()> {
        let Some(raw) = read_object(data) else {
            warn!("failed to read object {id}");

            return None;
        };

        self.objects.insert(id, raw);

        Some(())
    }

    /// Register a stream with the given dictionary literal and (decoded) data.
    ///
    /// This avoids having to embed binary data into an object literal.
    pub fn insert_stream(&mut self, id: ObjRef, dict: &[u8], data: impl Into<Vec<u8>>) -> Option<()> {
        let mut r = Reader::new(dict);
        r.skip_white_spaces_and_comments();
        let dict = read_entries(&mut r)?;

        self.objects
            .insert(id, Raw::Stream(Arc::new(new_repr(dict, data.into()))));

        Some(())
    }

    /// Resolve the object with the given identifier as a specific object type.
    #[allow(
        private_bounds,
        reason = "users shouldn't be able to implement `ObjectLike` for custom objects."
    )]
    pub fn get<'a, T>(&'a self, id: ObjRef) -> Option<T>
    where
        T: ObjectLike<'a>,
    {
        self.resolve(id).cast::<T>()
    }

    /// Whether an object with the given identifier exists.
    pub fn contains(&self, id: ObjRef) -> bool {
        self.objects.contains_key(&id)
    }

    /// Returns the number of objects in the table.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub(crate) fn resolve(&self, id: ObjRef) -> Object<'_> {
        let mut cur = id;

        for _ in 0..MAX_REFERENCE_CHAIN {
            match self.objects.get(&cur) {
                Some(Raw::Ref(next)) => cur = *next,
                Some(raw) => return Object::from_raw_with(raw, self, Some(cur)),
                // References to missing objects resolve to the null object.
                None => return Object::Null,
            }
        }

        warn!("reference chain starting at {id} is too long");

        Object::Null
    }
}
