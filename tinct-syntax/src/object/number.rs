//! Number objects.

use crate::object::{Object, ObjectLike, object};
use crate::reader::{Readable, Reader};
use log::debug;
use std::str::FromStr;

/// A PDF number.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Number(InternalNumber);

impl Number {
    /// Returns the number as a f64.
    pub fn as_f64(&self) -> f64 {
        match self.0 {
            InternalNumber::Real(r) => r,
            InternalNumber::Integer(i) => i as f64,
        }
    }

    /// Returns the number as a f32.
    pub fn as_f32(&self) -> f32 {
        self.as_f64() as f32
    }

    /// Returns the number as an i64, truncating real numbers.
    pub fn as_i64(&self) -> i64 {
        match self.0 {
            InternalNumber::Real(r) => {
                let res = r as i64;

                if r.trunc() != r {
                    debug!("float {r} was truncated to {res}");
                }

                res
            }
            InternalNumber::Integer(i) => i,
        }
    }

    /// Returns the number as an i32, truncating real numbers and saturating
    /// integers that don't fit.
    pub fn as_i32(&self) -> i32 {
        let i = self.as_i64();

        i.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    /// Whether the number was written as an integer.
    pub fn is_integer(&self) -> bool {
        matches!(self.0, InternalNumber::Integer(_))
    }

    /// Create a new `Number` from a f32 number.
    pub fn from_f32(num: f32) -> Self {
        Self(InternalNumber::Real(num as f64))
    }

    /// Create a new `Number` from an i32 number.
    pub fn from_i32(num: i32) -> Self {
        Self(InternalNumber::Integer(num as i64))
    }
}

impl Readable for Number {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let start = r.offset();
        r.eat(|b| b == b'+' || b == b'-');

        let mut is_real = false;

        match r.peek_byte()? {
            b'.' => {
                r.forward();
                r.forward_while_1(|b| b.is_ascii_digit())?;
                is_real = true;
            }
            b'0'..=b'9' => {
                r.forward_while_1(|b| b.is_ascii_digit())?;

                if r.forward_tag(b".").is_some() {
                    r.forward_while(|b| b.is_ascii_digit());
                    is_real = true;
                }
            }
            _ => return None,
        }

        let text = std::str::from_utf8(r.range(start, r.offset())?).ok()?;

        if !is_real {
            if let Ok(int) = i64::from_str(text) {
                return Some(Self(InternalNumber::Integer(int)));
            }
        }

        // Handles reals as well as integers that overflow an `i64`. Rust doesn't accept
        // "5." or "+.5" the same way PDF does, so normalize the text first.
        let normalized = text.trim_start_matches('+').trim_end_matches('.');
        let num = f64::from_str(normalized).ok()?;

        Some(Self(InternalNumber::Real(num)))
    }
}

object!(Number, Number);

#[derive(Clone, Copy, Debug, PartialEq)]
enum InternalNumber {
    Real(f64),
    Integer(i64),
}

macro_rules! int_num {
    ($i:ident) => {
        impl TryFrom<Object<'_>> for $i {
            type Error = ();

            fn try_from(value: Object<'_>) -> std::result::Result<Self, Self::Error> {
                match value {
                    Object::Number(n) => n.as_i64().try_into().ok().ok_or(()),
                    _ => Err(()),
                }
            }
        }

        impl<'a> ObjectLike<'a> for $i {}
    };
}

int_num!(i32);
int_num!(i64);
int_num!(u32);
int_num!(u16);
int_num!(u8);
int_num!(usize);

impl TryFrom<Object<'_>> for f32 {
    type Error = ();

    fn try_from(value: Object<'_>) -> Result<Self, Self::Error> {
        match value {
            Object::Number(n) => Ok(n.as_f32()),
            _ => Err(()),
        }
    }
}

impl<'a> ObjectLike<'a> for f32 {}

impl TryFrom<Object<'_>> for f64 {
    type Error = ();

    fn try_from(value: Object<'_>) -> Result<Self, Self::Error> {
        match value {
            Object::Number(n) => Ok(n.as_f64()),
            _ => Err(()),
        }
    }
}

impl<'a> ObjectLike<'a> for f64 {}
