//! Arrays.

use crate::object::r#ref::ObjRef;
use crate::object::{CacheKey, Object, ObjectLike, Raw, identity_key, object};
use crate::reader::Reader;
use crate::xref::XRef;
use log::warn;
use smallvec::SmallVec;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

/// An array of PDF objects.
#[derive(Clone)]
pub struct Array<'a> {
    repr: Arc<Vec<Raw>>,
    xref: &'a XRef,
    id: Option<ObjRef>,
}

impl PartialEq for Array<'_> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.repr, &other.repr) || self.repr == other.repr
    }
}

impl<'a> Array<'a> {
    pub(crate) fn new(repr: Arc<Vec<Raw>>, xref: &'a XRef, id: Option<ObjRef>) -> Self {
        Self { repr, xref, id }
    }

    /// Parse an array from an object literal. Object references resolve to the null object.
    pub fn from_bytes(data: &[u8]) -> Option<Array<'static>> {
        Object::from_bytes(data)?.into_array()
    }

    /// Returns the number of items in the array.
    pub fn len(&self) -> usize {
        self.repr.len()
    }

    /// Returns whether the array is empty.
    pub fn is_empty(&self) -> bool {
        self.repr.is_empty()
    }

    /// Returns the item at the given index as a specific object, resolving object references.
    #[allow(
        private_bounds,
        reason = "users shouldn't be able to implement `ObjectLike` for custom objects."
    )]
    pub fn get<T>(&self, index: usize) -> Option<T>
    where
        T: ObjectLike<'a>,
    {
        Object::from_raw(self.repr.get(index)?, self.xref).cast()
    }

    /// Get the object reference stored at the given index.
    pub fn get_ref(&self, index: usize) -> Option<ObjRef> {
        match self.repr.get(index)? {
            Raw::Ref(r) => Some(*r),
            _ => None,
        }
    }

    /// Returns an iterator over the resolved objects of the array.
    pub fn raw_iter(&self) -> impl Iterator<Item = Object<'a>> + '_ {
        self.repr.iter().map(|r| Object::from_raw(r, self.xref))
    }

    /// Returns an iterator over the resolved objects of the array, stopping at the first
    /// object that doesn't have the requested type.
    #[allow(
        private_bounds,
        reason = "users shouldn't be able to implement `ObjectLike` for custom objects."
    )]
    pub fn iter<T>(&self) -> ResolvedArrayIter<'a, T>
    where
        T: ObjectLike<'a>,
    {
        ResolvedArrayIter {
            flex_iter: self.flex_iter(),
            phantom_data: PhantomData,
        }
    }

    /// Return a flex iterator over the items in the array.
    pub fn flex_iter(&self) -> FlexArrayIter<'a> {
        FlexArrayIter {
            array: self.clone(),
            index: 0,
        }
    }

    /// Return the object identifier of the array, if it's an indirect object.
    pub fn obj_id(&self) -> Option<ObjRef> {
        self.id
    }
}

impl CacheKey for Array<'_> {
    fn cache_key(&self) -> u128 {
        identity_key(self.id, &self.repr)
    }
}

impl Debug for Array<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.raw_iter()).finish()
    }
}

object!(Array<'a>, Array);

pub(crate) fn read_items(r: &mut Reader<'_>) -> Option<Vec<Raw>> {
    r.forward_tag(b"[")?;

    let mut items = vec![];

    loop {
        r.skip_white_spaces_and_comments();

        if r.forward_tag(b"]").is_some() {
            return Some(items);
        }

        items.push(r.read::<Raw>()?);
    }
}

/// An iterator over the array that resolves objects of a specific type.
pub struct ResolvedArrayIter<'a, T> {
    flex_iter: FlexArrayIter<'a>,
    phantom_data: PhantomData<T>,
}

impl<'a, T> Iterator for ResolvedArrayIter<'a, T>
where
    T: ObjectLike<'a>,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.flex_iter.next::<T>()
    }
}

/// An iterator over the array that allows reading a different object each time.
pub struct FlexArrayIter<'a> {
    array: Array<'a>,
    index: usize,
}

impl<'a> FlexArrayIter<'a> {
    /// Try reading the next item as a specific object from the array.
    ///
    /// The iterator only advances if the item has the requested type.
    #[allow(
        private_bounds,
        reason = "users shouldn't be able to implement `ObjectLike` for custom objects."
    )]
    #[allow(clippy::should_implement_trait)]
    pub fn next<T: ObjectLike<'a>>(&mut self) -> Option<T> {
        let item = self.array.get::<T>(self.index)?;
        self.index += 1;

        Some(item)
    }

    /// Skip the next item, regardless of its type.
    pub fn skip(&mut self) -> Option<()> {
        (self.index < self.array.len()).then(|| self.index += 1)
    }

    /// The number of items that haven't been read yet.
    pub fn remaining(&self) -> usize {
        self.array.len().saturating_sub(self.index)
    }
}

impl<'a, T: ObjectLike<'a> + Copy + Default, const C: usize> TryFrom<Array<'a>> for [T; C] {
    type Error = ();

    fn try_from(value: Array<'a>) -> Result<Self, Self::Error> {
        if value.len() != C {
            if value.len() > C {
                warn!("found excess elements in array");
            }

            return Err(());
        }

        let mut val = [T::default(); C];

        for (i, v) in val.iter_mut().enumerate() {
            *v = value.get::<T>(i).ok_or(())?;
        }

        Ok(val)
    }
}

impl<'a, T: ObjectLike<'a> + Copy + Default, const C: usize> TryFrom<Object<'a>> for [T; C] {
    type Error = ();

    fn try_from(value: Object<'a>) -> Result<Self, Self::Error> {
        match value {
            Object::Array(a) => a.try_into(),
            _ => Err(()),
        }
    }
}

impl<'a, T: ObjectLike<'a> + Copy + Default, const C: usize> ObjectLike<'a> for [T; C] {}

impl<'a, T: ObjectLike<'a>> TryFrom<Array<'a>> for Vec<T> {
    type Error = ();

    fn try_from(value: Array<'a>) -> Result<Self, Self::Error> {
        (0..value.len())
            .map(|i| value.get::<T>(i).ok_or(()))
            .collect()
    }
}

impl<'a, T: ObjectLike<'a>> TryFrom<Object<'a>> for Vec<T> {
    type Error = ();

    fn try_from(value: Object<'a>) -> Result<Self, Self::Error> {
        match value {
            Object::Array(a) => a.try_into(),
            _ => Err(()),
        }
    }
}

impl<'a, T: ObjectLike<'a>> ObjectLike<'a> for Vec<T> {}

impl<'a, U: ObjectLike<'a>, T: smallvec::Array<Item = U>> TryFrom<Array<'a>> for SmallVec<T> {
    type Error = ();

    fn try_from(value: Array<'a>) -> Result<Self, Self::Error> {
        (0..value.len())
            .map(|i| value.get::<U>(i).ok_or(()))
            .collect()
    }
}

impl<'a, U: ObjectLike<'a>, T: smallvec::Array<Item = U>> TryFrom<Object<'a>> for SmallVec<T> {
    type Error = ();

    fn try_from(value: Object<'a>) -> Result<Self, Self::Error> {
        match value {
            Object::Array(a) => a.try_into(),
            _ => Err(()),
        }
    }
}

impl<'a, U: ObjectLike<'a>, T: smallvec::Array<Item = U>> ObjectLike<'a> for SmallVec<T> where
    U: Clone + Debug
{
}
