/*!
The C surface for language bindings.

Bindings get an opaque document: they allocate `acorn_json_document_sizeof()`
bytes, hand the slot to [`acorn_json_parse_single_allocation`], and then read
error state or the raw AST root back out through the accessors. Navigation
itself happens on the binding side against the raw word buffer and input
pointer, which is why the internal tag numbering is fixed.

The document is trivially destructible, so freeing one is a no-op: bindings
just release the slot's storage.
*/

use std::{mem, ptr, slice};

use crate::de::Document;

/// A document whose buffers the binding keeps alive for it.
pub type RawDocument = Document<'static, 'static>;

// a document borrows its buffers rather than owning anything that would
// need to run a destructor; the no-op free below relies on this
const _: [(); 0] = [(); mem::needs_drop::<RawDocument>() as usize];

/**
The size in bytes a binding must reserve for an opaque document.
*/
#[no_mangle]
pub extern "C" fn acorn_json_document_sizeof() -> usize {
    mem::size_of::<RawDocument>()
}

/**
Parse `input_len` bytes at `input` into the word buffer at `words`, placing
the document into `document_slot`.

# Safety

`input` must point to `input_len` writable bytes and `words` to `input_len`
writable machine words; both must stay valid, unmoved and otherwise untouched
for as long as the returned document is used. `document_slot` must point to
at least [`acorn_json_document_sizeof`] suitably-aligned writable bytes.
*/
#[no_mangle]
pub unsafe extern "C" fn acorn_json_parse_single_allocation(
    input: *mut u8,
    input_len: usize,
    words: *mut usize,
    document_slot: *mut RawDocument,
) -> *mut RawDocument {
    let input = slice::from_raw_parts_mut(input, input_len);
    let words = slice::from_raw_parts_mut(words, input_len);

    let document = Document::parse_single_allocation(input, words);

    ptr::write(document_slot, document);
    document_slot
}

/**
Release a document.

This is a no-op: documents are trivially destructible and the binding owns
the slot's storage.
*/
#[no_mangle]
pub extern "C" fn acorn_json_free_document(_doc: *mut RawDocument) {}

#[no_mangle]
pub unsafe extern "C" fn acorn_json_has_error(doc: *const RawDocument) -> i32 {
    (!(*doc).is_valid()) as i32
}

#[no_mangle]
pub unsafe extern "C" fn acorn_json_get_error_line(doc: *const RawDocument) -> usize {
    match (*doc).error() {
        Some(error) => error.line(),
        None => 0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn acorn_json_get_error_column(doc: *const RawDocument) -> usize {
    match (*doc).error() {
        Some(error) => error.column(),
        None => 0,
    }
}

/**
The formatted, NUL-terminated error message.

The pointer aliases storage inside the document and is valid for as long as
the document is.
*/
#[no_mangle]
pub unsafe extern "C" fn acorn_json_get_error_message(doc: *const RawDocument) -> *const u8 {
    (*doc).raw_message()
}

/**
The root value's tag byte: `integer=0, double=1, null=2, false=3, true=4,
string=5, array=6, object=7`.
*/
#[no_mangle]
pub unsafe extern "C" fn acorn_json_get_root_tag(doc: *const RawDocument) -> u8 {
    (*doc).raw_root_tag()
}

/**
The root value's payload within the word buffer, or null for an invalid
document.
*/
#[no_mangle]
pub unsafe extern "C" fn acorn_json_get_root(doc: *const RawDocument) -> *const usize {
    (*doc).raw_root()
}

/**
The input text as the parser left it: string spans unescaped in place and
NUL-terminated.
*/
#[no_mangle]
pub unsafe extern "C" fn acorn_json_get_input(doc: *const RawDocument) -> *const u8 {
    (*doc).input().as_ptr()
}
