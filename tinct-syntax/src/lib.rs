/*!
A small, in-memory model of PDF objects.

This crate provides the object layer that the color space, function and shading code of
`tinct-interpret` reads from. It does not read PDF files: objects are registered in an
[`XRef`](xref::XRef) from already decoded object literals, and stream bodies are assumed
to have had all of their filters applied.

```
use tinct_syntax::object::{Dict, ObjRef};
use tinct_syntax::object::dict::keys::FUNCTION_TYPE;
use tinct_syntax::xref::XRef;

let mut xref = XRef::new();
xref.insert(ObjRef::new(1, 0), b"<< /FunctionType 2 /Domain [0 1] /N 1 >>")
    .unwrap();

let dict = xref.get::<Dict<'_>>(ObjRef::new(1, 0)).unwrap();
assert_eq!(dict.get::<u8>(FUNCTION_TYPE), Some(2));
```
*/

#![forbid(unsafe_code)]

pub mod bit_reader;
pub mod object;
pub(crate) mod reader;
pub mod xref;
