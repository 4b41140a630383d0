//! Names.

use crate::object::{Object, object};
use crate::reader::{Readable, Reader, is_regular_character};
use std::borrow::Borrow;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// A PDF name.
#[derive(Clone, PartialEq, Eq)]
pub struct Name(Arc<[u8]>);

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Needs to hash exactly like `[u8]` so that dictionaries can be queried with byte keys.
        self.deref().hash(state);
    }
}

impl Deref for Name {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Name {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl Borrow<[u8]> for Name {
    fn borrow(&self) -> &[u8] {
        self
    }
}

impl Name {
    /// Create a new name from a sequence of bytes, resolving `#xx` escapes.
    pub fn new(data: &[u8]) -> Self {
        if !data.contains(&b'#') {
            return Self(Arc::from(data));
        }

        let mut cleaned = Vec::with_capacity(data.len());
        let mut iter = data.iter().copied();

        while let Some(b) = iter.next() {
            if b == b'#' {
                let hex = iter
                    .next()
                    .and_then(hex_value)
                    .zip(iter.next().and_then(hex_value));

                match hex {
                    Some((hi, lo)) => cleaned.push(hi << 4 | lo),
                    // Be lenient and keep malformed escapes as they are.
                    None => cleaned.push(b'#'),
                }
            } else {
                cleaned.push(b);
            }
        }

        Self(Arc::from(cleaned))
    }

    /// Return a string representation of the name.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self).unwrap_or("{non-ascii name}")
    }
}

impl Debug for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.as_str())
    }
}

object!(Name, Name);

impl Readable for Name {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        r.forward_tag(b"/")?;
        let start = r.offset();
        r.forward_while(is_regular_character);

        Some(Self::new(r.range(start, r.offset())?))
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'0'..=b'9' => Some(c - b'0'),
        _ => None,
    }
}
