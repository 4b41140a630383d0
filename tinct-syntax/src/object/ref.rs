//! Object references.

use crate::reader::{Readable, Reader};
use std::fmt::{Display, Formatter};

/// A reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef {
    /// The object number.
    pub obj_number: i32,
    /// The generation number.
    pub gen_number: i32,
}

impl ObjRef {
    /// Create a new object reference.
    pub fn new(obj_number: i32, gen_number: i32) -> Self {
        Self {
            obj_number,
            gen_number,
        }
    }
}

impl Display for ObjRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.obj_number, self.gen_number)
    }
}

impl Readable for ObjRef {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let obj_number = read_integer(r)?;
        r.skip_white_spaces_and_comments();
        let gen_number = read_integer(r)?;
        r.skip_white_spaces_and_comments();
        r.forward_tag(b"R")?;

        // `R` must not be the start of a longer keyword.
        if r.peek_byte().is_some_and(crate::reader::is_regular_character) {
            return None;
        }

        Some(Self::new(obj_number, gen_number))
    }
}

fn read_integer(r: &mut Reader<'_>) -> Option<i32> {
    let start = r.offset();
    r.forward_while_1(|b| b.is_ascii_digit())?;
    let digits = r.range(start, r.offset())?;

    std::str::from_utf8(digits).ok()?.parse().ok()
}
