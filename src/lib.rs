/*!
# `acorn-json`

## 🌰

A single-allocation JSON parser. The whole document is parsed in one pass into a
caller-provided buffer of machine words, with string contents unescaped in place
inside the input text. Nothing is allocated while parsing and nothing is copied
afterwards: navigating the finished document is just chasing word offsets.

## ⚠️ CAREFUL

This library contains a _lot_ of unsafe code and is very performance sensitive. Any changes
need to be carefully considered and should be:

- tested against the benchmarks to make sure we don't regress (at least not accidentally).
- fuzz tested to ensure there aren't soundness holes introduced.

We take advantage of invariants maintained by the parser to avoid bounds checks when
navigating documents. Any unchecked operations are done using macros that use the checked
variant in test/debug builds (or when the `checked` feature is enabled) to make sure we
don't ever cause UB when working through documents.

The input buffer must be mutable: the parser NUL-terminates each string and compacts
escape sequences in place. Callers holding read-only text need to copy it into a scratch
buffer first.
*/

#![cfg_attr(checked, deny(warnings))]
#![allow(clippy::missing_safety_doc)] // false positives

#[macro_use]
mod macros;

pub(crate) mod std_ext;

mod error;

pub mod de;
pub mod ffi;

pub use self::{
    de::{Arr, Document, Map, Type, Value},
    error::{ErrorCode, ParseError},
};
