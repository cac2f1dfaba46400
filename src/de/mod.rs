/*!
Parsing for JSON documents.

This module contains a validating parser that reads a JSON text in one pass
and lays the document out as tagged machine words in a caller-provided buffer.
It uses a _lot_ of unsafe code, but guarantees UB freedom through its public API.

The parser proceeds linearly, maintaining its current position within the
document. It isn't recursive: pending arrays and objects live as frames on a
stack that grows up from the bottom of the word buffer, while finished
structures are installed at the top of the same buffer, growing down. The two
ends meet in the middle; a buffer with one word per input byte can always hold
the result, so the buffer's size is checked once up front and never again
reallocated.

The state machine is the `loop`/`match` dispatcher in [`Parser::parse`]. Each
state corresponds to a position between JSON tokens; leaf tokens are handled
by the `number` and `string` modules on a shared byte cursor.

The input buffer is mutated as it's parsed: every string has its closing `"`
overwritten with a NUL and escaped strings are compacted in place, so string
values can be borrowed straight out of the input with no copies. Decoded
escapes never expand, which keeps the compacted bytes inside the source span.
*/

#![allow(unused_labels)] // labels are fun

mod alloc;
mod document;
mod element;
mod flags;
mod number;
mod string;

use std::{cmp::Ordering, slice};

use self::{alloc::Allocator, element::*, flags::is_whitespace};

use crate::error::{ErrorCode, ParseError};

pub use self::document::{Arr, Document, Map, Type, Value};

impl<'input, 'buf> Document<'input, 'buf> {
    /**
    Parse a JSON text into a document using the single-allocation strategy.

    The caller provides both the text and a word buffer at least as long, in
    words, as the text is in bytes; a smaller buffer fails with an out of
    memory error before anything is read. The input must be writable because
    string contents are unescaped and NUL-terminated in place. Both buffers
    are borrowed by the returned document for as long as it's navigated.

    A document is returned whether or not the parse succeeds: check
    [`Document::is_valid`] before navigating, and [`Document::error`]
    for what went wrong when it isn't.

    # Panics

    This method does not panic, whatever the input.
    */
    pub fn parse_single_allocation(input: &'input mut [u8], buffer: &'buf mut [usize]) -> Self {
        if buffer.len() < input.len() {
            return Document::from_error(
                input,
                ParseError {
                    code: ErrorCode::OutOfMemory,
                    line: 1,
                    column: 1,
                    arg: 0,
                },
            );
        }

        let mut parser = Parser {
            input,
            alloc: Allocator::new(buffer),
            root_tag: Tag::Null,
        };

        match parser.parse() {
            Ok(()) => {
                let root = parser.alloc.get_ast_root();

                let Parser {
                    input,
                    alloc,
                    root_tag,
                } = parser;

                Document::new(input, alloc.into_words(), root_tag, root)
            }
            Err(error) => {
                let Parser { input, .. } = parser;

                Document::from_error(input, error)
            }
        }
    }
}

/**
`get_value_of_key` on a sorted object is `O(lg N)`, but most objects have
small, bounded key sets, and the sort adds parsing overhead when a linear
scan would be fast anyway and the code consuming objects may never look
values up by name at all. Therefore, only binary search for large numbers
of keys.
*/
#[inline]
pub(crate) const fn should_binary_search(length: usize) -> bool {
    length > 100
}

/**
The ordering object keys are sorted and searched by: shorter keys first,
ties broken by byte comparison.
*/
#[inline]
pub(crate) fn compare_key_bytes(lhs: &[u8], rhs: &[u8]) -> Ordering {
    lhs.len().cmp(&rhs.len()).then_with(|| lhs.cmp(rhs))
}

/**
The position between tokens the parser is at.

Structure closes aren't states of their own; they run inline where a `]` or
`}` is accepted and either feed the finished structure back in as a value or
finish the parse.
*/
#[derive(Debug, Clone, Copy)]
enum State {
    /// Just after a `[`: accept `]` or the first element.
    ArrayCloseOrElement,
    /// Just after a `{`: accept `}` or the first key.
    ObjectCloseOrElement,
    /// Just after a complete value: accept `]`/`}` or a `,`.
    StructureCloseOrComma,
    /// Expecting the `"` of an object key.
    ObjectKey,
    /// Expecting any value.
    NextElement,
}

pub(crate) struct Parser<'input, 'buf> {
    input: &'input mut [u8],
    alloc: Allocator<'buf>,
    root_tag: Tag,
}

impl<'input, 'buf> Parser<'input, 'buf> {
    fn parse(&mut self) -> Result<(), ParseError> {
        // p is the index of the byte currently being parsed
        let mut p = match self.skip_whitespace(0) {
            Some(p) => p,
            None => {
                return Err(self.make_error(self.input.len(), ErrorCode::MissingRootElement))
            }
        };

        // current_base is the stack offset of the current structure's frame;
        // the frame word back-links to the parent's base so `pop` can restore it
        let mut current_base = self.alloc.stack_top();
        let mut current_tag;

        let mut state = match *get_unchecked!(self.input, p) {
            b'[' => {
                current_tag = Tag::Array;
                self.push_element(p, make_element(current_tag, ROOT_MARKER))?;
                State::ArrayCloseOrElement
            }
            b'{' => {
                current_tag = Tag::Object;
                self.push_element(p, make_element(current_tag, ROOT_MARKER))?;
                State::ObjectCloseOrElement
            }
            _ => return Err(self.make_error(p, ErrorCode::BadRoot)),
        };

        'dispatch: loop {
            state = match state {
                State::ArrayCloseOrElement => {
                    p = self.skip_whitespace_or_end(p + 1)?;

                    if *get_unchecked!(self.input, p) == b']' {
                        match self.pop_structure(&mut p, &mut current_base, &mut current_tag)? {
                            Some(next) => next,
                            None => return Ok(()),
                        }
                    } else {
                        State::NextElement
                    }
                }

                State::ObjectCloseOrElement => {
                    p = self.skip_whitespace_or_end(p + 1)?;

                    if *get_unchecked!(self.input, p) == b'}' {
                        match self.pop_structure(&mut p, &mut current_base, &mut current_tag)? {
                            Some(next) => next,
                            None => return Ok(()),
                        }
                    } else {
                        State::ObjectKey
                    }
                }

                State::StructureCloseOrComma => {
                    p = self.skip_whitespace_or_end(p)?;

                    let c = *get_unchecked!(self.input, p);
                    let (close, continue_at) = match current_tag {
                        Tag::Array => (b']', State::NextElement),
                        _ => (b'}', State::ObjectKey),
                    };

                    if c == close {
                        match self.pop_structure(&mut p, &mut current_base, &mut current_tag)? {
                            Some(next) => next,
                            None => return Ok(()),
                        }
                    } else if c == b',' {
                        p += 1;
                        continue_at
                    } else {
                        return Err(self.make_error(p, ErrorCode::ExpectedComma));
                    }
                }

                State::ObjectKey => {
                    p = self.skip_whitespace_or_end(p)?;

                    if *get_unchecked!(self.input, p) != b'"' {
                        return Err(self.make_error(p, ErrorCode::MissingObjectKey));
                    }

                    let out = match self.alloc.reserve_stack(2) {
                        Some(out) => out,
                        None => return Err(self.make_error(p, ErrorCode::OutOfMemory)),
                    };

                    p = self.parse_string(p, out)?;

                    p = match self.skip_whitespace(p) {
                        Some(p) if *get_unchecked!(self.input, p) == b':' => p + 1,
                        Some(p) => return Err(self.make_error(p, ErrorCode::ExpectedColon)),
                        None => {
                            return Err(
                                self.make_error(self.input.len(), ErrorCode::ExpectedColon)
                            )
                        }
                    };

                    State::NextElement
                }

                State::NextElement => {
                    p = self.skip_whitespace_or_end(p)?;

                    match *get_unchecked!(self.input, p) {
                        b'[' => {
                            let previous_base = current_base;
                            current_base = self.alloc.stack_top();
                            self.push_element(p, make_element(current_tag, previous_base))?;
                            current_tag = Tag::Array;
                            State::ArrayCloseOrElement
                        }
                        b'{' => {
                            let previous_base = current_base;
                            current_base = self.alloc.stack_top();
                            self.push_element(p, make_element(current_tag, previous_base))?;
                            current_tag = Tag::Object;
                            State::ObjectCloseOrElement
                        }
                        b',' => return Err(self.make_error(p, ErrorCode::UnexpectedComma)),
                        c => {
                            let value_tag = match c {
                                // strings written earlier in the buffer are NUL
                                // terminated in place, so a stray NUL here means
                                // the text was truncated
                                0 => return Err(self.make_error(p, ErrorCode::UnexpectedEnd)),
                                b'n' => {
                                    p = self.parse_null(p)?;
                                    Tag::Null
                                }
                                b'f' => {
                                    p = self.parse_false(p)?;
                                    Tag::False
                                }
                                b't' => {
                                    p = self.parse_true(p)?;
                                    Tag::True
                                }
                                b'0'..=b'9' | b'-' => {
                                    let (next, tag) = self.parse_number(p)?;
                                    p = next;
                                    tag
                                }
                                b'"' => {
                                    let out = match self.alloc.reserve(2) {
                                        Some(out) => out,
                                        None => {
                                            return Err(
                                                self.make_error(p, ErrorCode::OutOfMemory)
                                            )
                                        }
                                    };

                                    p = self.parse_string(p, out)?;
                                    Tag::String
                                }
                                _ => return Err(self.make_error(p, ErrorCode::ExpectedValue)),
                            };

                            let offset = self.alloc.get_write_offset();
                            self.push_element(p, make_element(value_tag, offset))?;

                            State::StructureCloseOrComma
                        }
                    }
                }
            };

            continue 'dispatch;
        }
    }

    /**
    Close the structure terminated by the `]` or `}` at `p`, installing its
    stack frame into the AST heap.

    If the closed structure was the root, checks for trailing input and
    returns `None`. Otherwise the parent frame is restored, the installed
    structure is pushed as one of its values, and parsing resumes at
    [`State::StructureCloseOrComma`].
    */
    fn pop_structure(
        &mut self,
        p: &mut usize,
        current_base: &mut usize,
        current_tag: &mut Tag,
    ) -> Result<Option<State>, ParseError> {
        *p += 1;

        let pop_element = self.alloc.word(*current_base);

        // the frame and its entries are dead once the structure closes, so
        // the stack is popped before installing; that lets the installed
        // payload reuse the dying region's words, which the one word per
        // input byte buffer bound depends on. The descending copy in the
        // installers never clobbers an entry it hasn't read yet
        let begin = *current_base + 1;
        let end = self.alloc.stack_top();
        self.alloc.reset_stack(*current_base);

        let installed = match *current_tag {
            Tag::Array => self.install_array(begin, end),
            _ => self.install_object(begin, end),
        };

        if installed.is_none() {
            return Err(self.make_error(*p, ErrorCode::OutOfMemory));
        }

        let parent = get_element_value(pop_element);
        if parent == ROOT_MARKER {
            self.root_tag = *current_tag;

            return match self.skip_whitespace(*p) {
                Some(extra) => Err(self.make_error(extra, ErrorCode::ExpectedEndOfInput)),
                None => Ok(None),
            };
        }

        let value_tag = *current_tag;
        *current_tag = get_element_tag(pop_element);
        *current_base = parent;

        let offset = self.alloc.get_write_offset();
        self.push_element(*p, make_element(value_tag, offset))?;

        Ok(Some(State::StructureCloseOrComma))
    }

    /**
    Copy a finished array from the stack into the AST heap.

    Each element's value is rewritten from its distance-from-the-end write
    offset into an offset relative to the array's own payload, so the
    finished AST is position independent.
    */
    fn install_array(&mut self, begin: usize, end: usize) -> Option<()> {
        let length = end - begin;

        let new_base = self.alloc.reserve(length + 1)?;
        let buffer_len = self.alloc.len();

        let mut out = new_base + length + 1;
        let mut at = end;
        while at > begin {
            at -= 1;
            let element = self.alloc.word(at);

            let payload = buffer_len - get_element_value(element);
            out -= 1;
            self.alloc
                .set_word(out, make_element(get_element_tag(element), payload - new_base));
        }

        out -= 1;
        self.alloc.set_word(out, length);

        Some(())
    }

    /**
    Copy a finished object from the stack into the AST heap.

    Entries are 3-word `{key_start, key_end, element}` records. Objects with
    more keys than the binary search threshold have their records sorted
    first; the sort order is observable, so it's part of the stable layout.
    */
    fn install_object(&mut self, begin: usize, end: usize) -> Option<()> {
        test_assert!((end - begin) % 3 == 0);

        let length_times_3 = end - begin;
        let length = length_times_3 / 3;

        if should_binary_search(length) {
            self.sort_object_keys(begin, length);
        }

        let new_base = self.alloc.reserve(length_times_3 + 1)?;
        let buffer_len = self.alloc.len();

        let mut out = new_base + length_times_3 + 1;
        let mut at = end;
        while at > begin {
            at -= 1;
            let element = self.alloc.word(at);

            let payload = buffer_len - get_element_value(element);
            out -= 1;
            self.alloc
                .set_word(out, make_element(get_element_tag(element), payload - new_base));

            at -= 1;
            let key_end = self.alloc.word(at);
            out -= 1;
            self.alloc.set_word(out, key_end);

            at -= 1;
            let key_start = self.alloc.word(at);
            out -= 1;
            self.alloc.set_word(out, key_start);
        }

        out -= 1;
        self.alloc.set_word(out, length);

        Some(())
    }

    fn sort_object_keys(&mut self, begin: usize, length: usize) {
        let input = &*self.input;
        let words = self.alloc.words_mut();

        test_assert!(begin + length * 3 <= words.len());

        // SAFETY: the stack region at `begin` holds exactly `length` 3-word
        // records, and `[usize; 3]` has the same layout as 3 contiguous words
        let records = unsafe {
            slice::from_raw_parts_mut(words.as_mut_ptr().add(begin) as *mut [usize; 3], length)
        };

        records.sort_unstable_by(|lhs, rhs| {
            let lhs = get_unchecked!(input, lhs[0]..lhs[1]);
            let rhs = get_unchecked!(input, rhs[0]..rhs[1]);

            compare_key_bytes(lhs, rhs)
        });
    }

    fn parse_null(&self, p: usize) -> Result<usize, ParseError> {
        if self.remaining(p) < 4 {
            return Err(self.make_error(p, ErrorCode::UnexpectedEnd));
        }

        if get_unchecked!(self.input, p + 1..p + 4) != b"ull" {
            return Err(self.make_error(p, ErrorCode::ExpectedNull));
        }

        Ok(p + 4)
    }

    fn parse_false(&self, p: usize) -> Result<usize, ParseError> {
        if self.remaining(p) < 5 {
            return Err(self.make_error(p, ErrorCode::UnexpectedEnd));
        }

        if get_unchecked!(self.input, p + 1..p + 5) != b"alse" {
            return Err(self.make_error(p, ErrorCode::ExpectedFalse));
        }

        Ok(p + 5)
    }

    fn parse_true(&self, p: usize) -> Result<usize, ParseError> {
        if self.remaining(p) < 4 {
            return Err(self.make_error(p, ErrorCode::UnexpectedEnd));
        }

        if get_unchecked!(self.input, p + 1..p + 4) != b"rue" {
            return Err(self.make_error(p, ErrorCode::ExpectedTrue));
        }

        Ok(p + 4)
    }

    #[inline(always)]
    fn at_eof(&self, p: usize) -> bool {
        p == self.input.len()
    }

    #[inline(always)]
    fn remaining(&self, p: usize) -> usize {
        self.input.len() - p
    }

    #[inline(always)]
    fn skip_whitespace(&self, mut p: usize) -> Option<usize> {
        while p < self.input.len() {
            if is_whitespace(*get_unchecked!(self.input, p)) {
                p += 1;
            } else {
                return Some(p);
            }
        }

        None
    }

    #[inline(always)]
    fn skip_whitespace_or_end(&self, p: usize) -> Result<usize, ParseError> {
        match self.skip_whitespace(p) {
            Some(p) => Ok(p),
            None => Err(self.make_error(self.input.len(), ErrorCode::UnexpectedEnd)),
        }
    }

    #[inline(always)]
    fn push_element(&mut self, p: usize, element: usize) -> Result<(), ParseError> {
        match self.alloc.push(element) {
            Some(()) => Ok(()),
            None => Err(self.make_error(p, ErrorCode::OutOfMemory)),
        }
    }

    #[cold]
    fn make_error(&self, p: usize, code: ErrorCode) -> ParseError {
        self.make_error_arg(p, code, 0)
    }

    #[cold]
    fn make_error_arg(&self, p: usize, code: ErrorCode, arg: i32) -> ParseError {
        let p = p.min(self.input.len());

        let mut line = 1;
        let mut column = 1;

        let mut at = 0;
        while at < p {
            match *get_unchecked!(self.input, at) {
                b'\r' => {
                    line += 1;
                    column = 1;

                    // `\r\n` counts as a single break
                    if at + 1 < p && *get_unchecked!(self.input, at + 1) == b'\n' {
                        at += 1;
                    }
                }
                b'\n' => {
                    line += 1;
                    column = 1;
                }
                // TODO: count UTF-8 codepoints rather than bytes
                _ => column += 1,
            }

            at += 1;
        }

        ParseError {
            code,
            line,
            column,
            arg,
        }
    }
}
