/*!
Navigation over a parsed document.

A document is just a view over the two buffers that were parsed: the mutated
input text, which holds every string's bytes, and the word buffer, which
holds the AST. Values are decoded on the fly from tagged words; nothing is
copied and nothing is owned, so a document is trivially destructible and can
be traversed from any number of threads at once.
*/

use std::fmt;

use super::{
    compare_key_bytes,
    element::{get_element_tag, get_element_value, load_double, load_int, Tag},
    should_binary_search,
};

use crate::error::{MessageBuf, ParseError};

/**
The result of a parse: either a valid document with a root value, or the
error that stopped it.

The document borrows the input text and the word buffer it was parsed into;
both must outlive any navigation. Dropping a document does nothing.
*/
#[derive(Clone)]
pub struct Document<'input, 'buf> {
    input: &'input [u8],
    words: &'buf [usize],
    root: usize,
    root_tag: Tag,
    error: Option<ParseError>,
    message: MessageBuf,
}

/**
The type of a [`Value`].

The discriminants match the parser's internal tags, but only the variant
identities are public API; bindings that need the raw tag byte go through
[`crate::ffi`].
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Integer,
    Double,
    Null,
    False,
    True,
    String,
    Array,
    Object,
}

/**
A single value within a document.

Check [`Value::get_type`] to see which accessors apply. Values don't maintain
any backing memory themselves; they're only usable while their document's
buffers are alive.
*/
#[derive(Clone, Copy, PartialEq)]
pub struct Value<'input, 'buf> {
    tag: Tag,
    payload: &'buf [usize],
    input: &'input [u8],
}

/**
An array within a document.
*/
#[derive(Clone, Copy)]
pub struct Arr<'input, 'buf> {
    payload: &'buf [usize],
    input: &'input [u8],
}

/**
An object within a document.

Objects with more keys than the binary search threshold have their entries
sorted by key; smaller ones keep their source order.
*/
#[derive(Clone, Copy)]
pub struct Map<'input, 'buf> {
    payload: &'buf [usize],
    input: &'input [u8],
}

impl<'input, 'buf> Document<'input, 'buf> {
    pub(super) fn new(
        input: &'input [u8],
        words: &'buf [usize],
        root_tag: Tag,
        root: usize,
    ) -> Self {
        Document {
            input,
            words,
            root,
            root_tag,
            error: None,
            message: MessageBuf::empty(),
        }
    }

    pub(super) fn from_error(input: &'input [u8], error: ParseError) -> Self {
        Document {
            input,
            words: &[],
            root: 0,
            root_tag: Tag::Null,
            error: Some(error),
            message: MessageBuf::format(&error),
        }
    }

    /**
    Whether the parse succeeded.

    A valid document always has an array or object root.
    */
    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self.root_tag, Tag::Array | Tag::Object)
    }

    /**
    The document's root value, if it parsed successfully.
    */
    #[inline]
    pub fn root(&self) -> Option<Value<'input, 'buf>> {
        if self.is_valid() {
            Some(Value {
                tag: self.root_tag,
                payload: get_unchecked!(self.words, self.root..),
                input: self.input,
            })
        } else {
            None
        }
    }

    /**
    The error that stopped the parse, if it failed.
    */
    #[inline]
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /**
    The formatted error message, or an empty string for a valid document.
    */
    #[inline]
    pub fn error_message(&self) -> &str {
        self.message.as_str()
    }

    /**
    The input text as the parser left it.

    String spans within it have been unescaped in place and NUL-terminated.
    */
    #[inline]
    pub fn input(&self) -> &'input [u8] {
        self.input
    }

    // raw accessors for the C surface

    pub(crate) fn raw_root_tag(&self) -> u8 {
        self.root_tag as u8
    }

    pub(crate) fn raw_root(&self) -> *const usize {
        if self.is_valid() {
            get_unchecked!(self.words, self.root..).as_ptr()
        } else {
            std::ptr::null()
        }
    }

    pub(crate) fn raw_message(&self) -> *const u8 {
        self.message.as_ptr()
    }
}

impl<'input, 'buf> Default for Document<'input, 'buf> {
    fn default() -> Self {
        Document::from_error(&[], ParseError::uninitialized())
    }
}

impl<'input, 'buf> Value<'input, 'buf> {
    /**
    The value's type, which determines the accessors that apply to it.
    */
    #[inline]
    pub fn get_type(&self) -> Type {
        match self.tag {
            Tag::Integer => Type::Integer,
            Tag::Double => Type::Double,
            Tag::Null => Type::Null,
            Tag::False => Type::False,
            Tag::True => Type::True,
            Tag::String => Type::String,
            Tag::Array => Type::Array,
            Tag::Object => Type::Object,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.tag == Tag::Null
    }

    #[inline]
    pub fn is_boolean(&self) -> bool {
        matches!(self.tag, Tag::False | Tag::True)
    }

    #[inline]
    pub fn get_boolean_value(&self) -> Option<bool> {
        match self.tag {
            Tag::True => Some(true),
            Tag::False => Some(false),
            _ => None,
        }
    }

    /**
    The value as an `i32`, if it was parsed as an integer.
    */
    #[inline]
    pub fn get_integer_value(&self) -> Option<i32> {
        match self.tag {
            Tag::Integer => Some(load_int(self.payload, 0)),
            _ => None,
        }
    }

    /**
    The value as an `f64`, if it was parsed as a double.
    */
    #[inline]
    pub fn get_double_value(&self) -> Option<f64> {
        match self.tag {
            Tag::Double => Some(load_double(self.payload, 0)),
            _ => None,
        }
    }

    /**
    Any numeric value as an `f64`, whichever representation it was parsed as.
    */
    #[inline]
    pub fn get_number_value(&self) -> Option<f64> {
        match self.tag {
            Tag::Integer => Some(load_int(self.payload, 0) as f64),
            Tag::Double => Some(load_double(self.payload, 0)),
            _ => None,
        }
    }

    /**
    Any numeric value that's exactly representable as a 53-bit integer.

    This is useful for timestamps and other integral values wider than 32
    bits, which not all JSON implementations understand as 64-bit values.
    Doubles with a fractional part, or outside `±2^53`, return `None`.
    */
    #[inline]
    pub fn get_int53_value(&self) -> Option<i64> {
        match self.tag {
            Tag::Integer => Some(load_int(self.payload, 0) as i64),
            Tag::Double => {
                let v = load_double(self.payload, 0);

                if v < -(1i64 << 53) as f64 || v > (1i64 << 53) as f64 {
                    return None;
                }

                let as_int = v as i64;
                if as_int as f64 != v {
                    return None;
                }

                Some(as_int)
            }
            _ => None,
        }
    }

    /**
    The value as a string slice borrowed from the input text.

    Escapes have already been decoded in place, so this is free; note that
    decoded `\u0000` escapes mean the slice can contain NUL bytes.
    */
    #[inline]
    pub fn as_str(&self) -> Option<&'input str> {
        match self.tag {
            Tag::String => {
                let start = *get_unchecked!(self.payload, 0);
                let end = *get_unchecked!(self.payload, 1);

                // SAFETY: the parser validated the span as UTF8
                Some(from_utf8_unchecked!(get_unchecked!(self.input, start..end)))
            }
            _ => None,
        }
    }

    #[inline]
    pub fn as_arr(&self) -> Option<Arr<'input, 'buf>> {
        match self.tag {
            Tag::Array => Some(Arr {
                payload: self.payload,
                input: self.input,
            }),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<Map<'input, 'buf>> {
        match self.tag {
            Tag::Object => Some(Map {
                payload: self.payload,
                input: self.input,
            }),
            _ => None,
        }
    }
}

/**
Decode the element word at `payload[at]` into a value.

The element's offset is relative to `payload`'s own base, so the child's
payload is just a subslice of the parent's.
*/
#[inline]
fn decode_element<'input, 'buf>(
    payload: &'buf [usize],
    input: &'input [u8],
    at: usize,
) -> Value<'input, 'buf> {
    let element = *get_unchecked!(payload, at);

    Value {
        tag: get_element_tag(element),
        payload: get_unchecked!(payload, get_element_value(element)..),
        input,
    }
}

impl<'input, 'buf> Arr<'input, 'buf> {
    /**
    The number of elements in the array.
    */
    #[inline]
    pub fn len(&self) -> usize {
        *get_unchecked!(self.payload, 0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /**
    The `index`th element of the array.
    */
    #[inline]
    pub fn get(&self, index: usize) -> Option<Value<'input, 'buf>> {
        if index >= self.len() {
            return None;
        }

        Some(decode_element(self.payload, self.input, 1 + index))
    }

    /**
    Iterate through elements in the array.
    */
    #[inline]
    pub fn iter<'brw>(&'brw self) -> impl Iterator<Item = Value<'input, 'buf>> + 'brw {
        let arr = *self;

        (0..self.len()).map(move |index| decode_element(arr.payload, arr.input, 1 + index))
    }
}

impl<'input, 'buf> Map<'input, 'buf> {
    /**
    The number of entries in the object.
    */
    #[inline]
    pub fn len(&self) -> usize {
        *get_unchecked!(self.payload, 0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /**
    The `index`th key of the object.
    */
    #[inline]
    pub fn key(&self, index: usize) -> Option<&'input str> {
        if index >= self.len() {
            return None;
        }

        // SAFETY: the parser validated the span as UTF8
        Some(from_utf8_unchecked!(self.key_bytes(index)))
    }

    /**
    The `index`th value of the object.
    */
    #[inline]
    pub fn value(&self, index: usize) -> Option<Value<'input, 'buf>> {
        if index >= self.len() {
            return None;
        }

        Some(decode_element(self.payload, self.input, 3 + index * 3))
    }

    /**
    Iterate through entries in the object.
    */
    #[inline]
    pub fn entries<'brw>(
        &'brw self,
    ) -> impl Iterator<Item = (&'input str, Value<'input, 'buf>)> + 'brw {
        let map = *self;

        (0..self.len()).map(move |index| {
            let key = from_utf8_unchecked!(map.key_bytes(index));
            let value = decode_element(map.payload, map.input, 3 + index * 3);

            (key, value)
        })
    }

    /**
    The index of `key`'s entry, if the object has one.

    Small objects are scanned linearly; objects past the sort threshold are
    binary searched using the same ordering the parser sorted them with.
    Both strategies find the same entries.
    */
    pub fn find_key(&self, key: &str) -> Option<usize> {
        use std::cmp::Ordering;

        let length = self.len();
        let key = key.as_bytes();

        if should_binary_search(length) {
            let mut lo = 0;
            let mut hi = length;

            while lo < hi {
                let mid = lo + (hi - lo) / 2;

                match compare_key_bytes(self.key_bytes(mid), key) {
                    Ordering::Less => lo = mid + 1,
                    _ => hi = mid,
                }
            }

            if lo < length && self.key_bytes(lo) == key {
                Some(lo)
            } else {
                None
            }
        } else {
            (0..length).find(|&index| self.key_bytes(index) == key)
        }
    }

    /**
    The value stored under `key`, if the object has one.
    */
    #[inline]
    pub fn value_of_key(&self, key: &str) -> Option<Value<'input, 'buf>> {
        self.find_key(key).and_then(|index| self.value(index))
    }

    #[inline]
    fn key_bytes(&self, index: usize) -> &'input [u8] {
        let start = *get_unchecked!(self.payload, 1 + index * 3);
        let end = *get_unchecked!(self.payload, 2 + index * 3);

        get_unchecked!(self.input, start..end)
    }
}

impl<'input, 'buf> fmt::Debug for Document<'input, 'buf> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut debug = f.debug_struct("Document");

        debug.field("input", &std::str::from_utf8(self.input));

        match (&self.error, self.root()) {
            (Some(error), _) => debug.field("error", error).finish(),
            (None, Some(root)) => debug.field("root", &root).finish(),
            (None, None) => debug.finish(),
        }
    }
}

impl<'input, 'buf> fmt::Debug for Value<'input, 'buf> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.tag {
            Tag::Null => f.write_str("null"),
            Tag::False => f.write_str("false"),
            Tag::True => f.write_str("true"),
            Tag::Integer => fmt::Debug::fmt(&load_int(self.payload, 0), f),
            Tag::Double => fmt::Debug::fmt(&load_double(self.payload, 0), f),
            Tag::String => match self.as_str() {
                Some(s) => fmt::Debug::fmt(s, f),
                None => Ok(()),
            },
            Tag::Array => f
                .debug_list()
                .entries(
                    Arr {
                        payload: self.payload,
                        input: self.input,
                    }
                    .iter(),
                )
                .finish(),
            Tag::Object => f
                .debug_map()
                .entries(
                    Map {
                        payload: self.payload,
                        input: self.input,
                    }
                    .entries(),
                )
                .finish(),
        }
    }
}

impl<'input, 'buf> fmt::Debug for Arr<'input, 'buf> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'input, 'buf> fmt::Debug for Map<'input, 'buf> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

#[cfg(any(test, feature = "serde_json"))]
impl<'input, 'buf> Document<'input, 'buf> {
    /**
    Convert a document into a [`serde_json::Value`].

    An invalid document converts to `Null`. Non-finite doubles, which JSON
    can't represent, also convert to `Null`.
    */
    pub fn to_value(&self) -> serde_json::Value {
        match self.root() {
            Some(root) => root.to_value(),
            None => serde_json::Value::Null,
        }
    }
}

#[cfg(any(test, feature = "serde_json"))]
impl<'input, 'buf> Value<'input, 'buf> {
    /**
    Convert a value into a [`serde_json::Value`].
    */
    pub fn to_value(&self) -> serde_json::Value {
        match self.tag {
            Tag::Null => serde_json::Value::Null,
            Tag::False => serde_json::Value::Bool(false),
            Tag::True => serde_json::Value::Bool(true),
            Tag::Integer => serde_json::Value::from(load_int(self.payload, 0) as i64),
            Tag::Double => serde_json::Number::from_f64(load_double(self.payload, 0))
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Tag::String => match self.as_str() {
                Some(s) => serde_json::Value::from(s),
                None => serde_json::Value::Null,
            },
            Tag::Array => {
                let arr = Arr {
                    payload: self.payload,
                    input: self.input,
                };

                serde_json::Value::Array(arr.iter().map(|e| e.to_value()).collect())
            }
            Tag::Object => {
                let map = Map {
                    payload: self.payload,
                    input: self.input,
                };

                serde_json::Value::Object(
                    map.entries()
                        .map(|(k, v)| (k.to_owned(), v.to_value()))
                        .collect(),
                )
            }
        }
    }
}
