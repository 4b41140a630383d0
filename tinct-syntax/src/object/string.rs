//! Strings.

use crate::object::{Object, object};
use crate::reader::{Readable, Reader, is_white_space_character};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A PDF string, either written as a literal `(...)` or as a hex string `<...>`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct String(Arc<[u8]>);

impl String {
    /// Create a new string from its (unescaped) bytes.
    pub fn new(data: &[u8]) -> Self {
        Self(Arc::from(data))
    }

    /// Return the bytes of the string.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for String {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", std::string::String::from_utf8_lossy(&self.0))
    }
}

object!(String, String);

impl Readable for String {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        match r.peek_byte()? {
            b'(' => read_literal(r),
            b'<' => read_hex(r),
            _ => None,
        }
        .map(|data| Self(Arc::from(data)))
    }
}

fn read_hex(r: &mut Reader<'_>) -> Option<Vec<u8>> {
    r.forward_tag(b"<")?;

    let mut data = vec![];
    let mut pending = None;

    loop {
        let b = r.read_byte()?;

        let nibble = match b {
            b'>' => break,
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ if is_white_space_character(b) => continue,
            _ => return None,
        };

        match pending.take() {
            Some(hi) => data.push(hi << 4 | nibble),
            None => pending = Some(nibble),
        }
    }

    // An odd number of digits behaves as if a zero followed.
    if let Some(hi) = pending {
        data.push(hi << 4);
    }

    Some(data)
}

fn read_literal(r: &mut Reader<'_>) -> Option<Vec<u8>> {
    r.forward_tag(b"(")?;

    let mut data = vec![];
    let mut depth = 1;

    loop {
        let b = r.read_byte()?;

        match b {
            b'(' => {
                depth += 1;
                data.push(b);
            }
            b')' => {
                depth -= 1;

                if depth == 0 {
                    break;
                }

                data.push(b);
            }
            b'\\' => {
                let escaped = r.read_byte()?;

                match escaped {
                    b'n' => data.push(b'\n'),
                    b'r' => data.push(b'\r'),
                    b't' => data.push(b'\t'),
                    b'b' => data.push(0x08),
                    b'f' => data.push(0x0c),
                    b'0'..=b'7' => {
                        let mut value = (escaped - b'0') as u32;

                        for _ in 0..2 {
                            match r.eat(|b| (b'0'..=b'7').contains(&b)) {
                                Some(digit) => value = value * 8 + (digit - b'0') as u32,
                                None => break,
                            }
                        }

                        data.push(value as u8);
                    }
                    // Line continuation.
                    b'\n' => {}
                    b'\r' => {
                        r.eat(|b| b == b'\n');
                    }
                    other => data.push(other),
                }
            }
            _ => data.push(b),
        }
    }

    Some(data)
}
