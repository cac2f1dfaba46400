/*!
String parsing.

Strings are scanned over a fast path that only ever looks at plain ASCII,
four bytes at a time. The first escape or multibyte sequence drops the scan
into a slow path that decodes into the input buffer itself: every escape
sequence is at least as long as its decoded bytes, so the decoded string is
compacted into the front of its own source span and never collides with the
unread tail. Either way the closing `"` (or the last decoded byte) is
overwritten with a NUL, and the string's `{start, end}` byte offsets are
written into a 2-word record provided by the caller.

Raw multibyte sequences are validated as UTF-8 on the way through, so any
string borrowed out of a successfully parsed document is guaranteed valid.
*/

use super::*;

use crate::std_ext::char;

#[inline(always)]
fn is_utf8_continuation(c: u8) -> bool {
    c & 0xC0 == 0x80
}

impl<'input, 'buf> Parser<'input, 'buf> {
    /**
    Parse the string whose opening `"` is at `p`, writing its byte offsets
    into the 2-word record at `out`.

    The record may live on the parse stack (object keys) or in the AST heap
    (string values); the parser doesn't care which.
    */
    pub(super) fn parse_string(&mut self, mut p: usize, out: usize) -> Result<usize, ParseError> {
        p += 1; // "
        let start = p;

        let input_len = self.input.len();

        'found: loop {
            // most strings are plain ASCII; chew through them in blocks of four
            while input_len - p >= 4 {
                if !flags::is_plain_string_character(*get_unchecked!(self.input, p)) {
                    break 'found;
                }
                if !flags::is_plain_string_character(*get_unchecked!(self.input, p + 1)) {
                    p += 1;
                    break 'found;
                }
                if !flags::is_plain_string_character(*get_unchecked!(self.input, p + 2)) {
                    p += 2;
                    break 'found;
                }
                if !flags::is_plain_string_character(*get_unchecked!(self.input, p + 3)) {
                    p += 3;
                    break 'found;
                }

                p += 4;
            }

            loop {
                if p >= input_len {
                    return Err(self.make_error(p, ErrorCode::UnexpectedEnd));
                }

                if !flags::is_plain_string_character(*get_unchecked!(self.input, p)) {
                    break 'found;
                }

                p += 1;
            }
        }

        let c = *get_unchecked!(self.input, p);

        if c == b'"' {
            self.alloc.set_word(out, start);
            self.alloc.set_word(out + 1, p);
            *get_unchecked_mut!(self.input, p) = 0;
            return Ok(p + 1);
        }

        if c < 0x20 {
            return Err(self.make_error_arg(p, ErrorCode::IllegalCodepoint, c as i32));
        }

        // a backslash or a byte >= 0x80
        self.parse_string_slow(p, out, start)
    }

    fn parse_string_slow(
        &mut self,
        mut p: usize,
        out: usize,
        start: usize,
    ) -> Result<usize, ParseError> {
        // decoded bytes are compacted into `[start, p)`; no decoded form is
        // longer than its source, so `end` can never catch up to `p`
        let mut end = p;

        let input_len = self.input.len();

        loop {
            if p >= input_len {
                return Err(self.make_error(p, ErrorCode::UnexpectedEnd));
            }

            let c = *get_unchecked!(self.input, p);

            if c < 0x20 {
                return Err(self.make_error_arg(p, ErrorCode::IllegalCodepoint, c as i32));
            }

            match c {
                b'"' => {
                    self.alloc.set_word(out, start);
                    self.alloc.set_word(out + 1, end);
                    *get_unchecked_mut!(self.input, end) = 0;
                    return Ok(p + 1);
                }

                b'\\' => {
                    p += 1;
                    if p >= input_len {
                        return Err(self.make_error(p, ErrorCode::UnexpectedEnd));
                    }

                    let replacement = match *get_unchecked!(self.input, p) {
                        b'"' => b'"',
                        b'\\' => b'\\',
                        b'/' => b'/',
                        b'b' => 0x08,
                        b'f' => 0x0C,
                        b'n' => b'\n',
                        b'r' => b'\r',
                        b't' => b'\t',
                        b'u' => {
                            p += 1;
                            if input_len - p < 4 {
                                return Err(self.make_error(p, ErrorCode::UnexpectedEnd));
                            }

                            let (next, mut u) = self.read_hex(p)?;
                            p = next;

                            // a trail surrogate on its own can't be encoded
                            // as UTF-8
                            if (0xDC00..=0xDFFF).contains(&u) {
                                return Err(
                                    self.make_error(p, ErrorCode::InvalidUtf16TrailSurrogate)
                                );
                            }

                            if (0xD800..=0xDBFF).contains(&u) {
                                // a leading surrogate; the trailing half must
                                // follow immediately
                                if input_len - p < 6 {
                                    return Err(
                                        self.make_error(p, ErrorCode::UnexpectedEndOfUtf16)
                                    );
                                }

                                if *get_unchecked!(self.input, p) != b'\\'
                                    || *get_unchecked!(self.input, p + 1) != b'u'
                                {
                                    return Err(self.make_error(p, ErrorCode::ExpectedU));
                                }
                                p += 2;

                                let (next, v) = self.read_hex(p)?;
                                p = next;

                                if !(0xDC00..=0xDFFF).contains(&v) {
                                    return Err(self.make_error(
                                        p,
                                        ErrorCode::InvalidUtf16TrailSurrogate,
                                    ));
                                }

                                u = char::from_utf16_surrogate_pair(u, v);
                            }

                            // 12 source bytes decode to at most 4, and a lone
                            // escape's 6 to at most 3
                            end = char::encode_utf8(u, self.input, end);
                            continue;
                        }
                        _ => return Err(self.make_error(p, ErrorCode::UnknownEscape)),
                    };

                    *get_unchecked_mut!(self.input, end) = replacement;
                    end += 1;
                    p += 1;
                }

                _ => {
                    // a multibyte sequence; validate it as UTF-8 while copying
                    // it down
                    let c0 = c;
                    if c0 < 0x80 {
                        *get_unchecked_mut!(self.input, end) = c0;
                        end += 1;
                        p += 1;
                    } else if c0 < 0xE0 {
                        // 0x80..=0xBF are stray continuations, 0xC0 and 0xC1
                        // are overlong
                        if c0 < 0xC2 {
                            return Err(self.make_error(p, ErrorCode::InvalidUtf8));
                        }

                        if input_len - p < 2 {
                            return Err(self.make_error(p, ErrorCode::UnexpectedEnd));
                        }

                        let c1 = *get_unchecked!(self.input, p + 1);
                        if !is_utf8_continuation(c1) {
                            return Err(self.make_error(p + 1, ErrorCode::InvalidUtf8));
                        }

                        *get_unchecked_mut!(self.input, end) = c0;
                        *get_unchecked_mut!(self.input, end + 1) = c1;
                        end += 2;
                        p += 2;
                    } else if c0 < 0xF0 {
                        if input_len - p < 3 {
                            return Err(self.make_error(p, ErrorCode::UnexpectedEnd));
                        }

                        let c1 = *get_unchecked!(self.input, p + 1);
                        if !is_utf8_continuation(c1) {
                            return Err(self.make_error(p + 1, ErrorCode::InvalidUtf8));
                        }

                        // reject overlong forms and raw surrogates
                        if (c0 == 0xE0 && c1 < 0xA0) || (c0 == 0xED && c1 >= 0xA0) {
                            return Err(self.make_error(p + 1, ErrorCode::InvalidUtf8));
                        }

                        let c2 = *get_unchecked!(self.input, p + 2);
                        if !is_utf8_continuation(c2) {
                            return Err(self.make_error(p + 2, ErrorCode::InvalidUtf8));
                        }

                        *get_unchecked_mut!(self.input, end) = c0;
                        *get_unchecked_mut!(self.input, end + 1) = c1;
                        *get_unchecked_mut!(self.input, end + 2) = c2;
                        end += 3;
                        p += 3;
                    } else if c0 < 0xF5 {
                        if input_len - p < 4 {
                            return Err(self.make_error(p, ErrorCode::UnexpectedEnd));
                        }

                        let c1 = *get_unchecked!(self.input, p + 1);
                        if !is_utf8_continuation(c1) {
                            return Err(self.make_error(p + 1, ErrorCode::InvalidUtf8));
                        }

                        // reject overlong forms and codepoints past U+10FFFF
                        if (c0 == 0xF0 && c1 < 0x90) || (c0 == 0xF4 && c1 >= 0x90) {
                            return Err(self.make_error(p + 1, ErrorCode::InvalidUtf8));
                        }

                        let c2 = *get_unchecked!(self.input, p + 2);
                        if !is_utf8_continuation(c2) {
                            return Err(self.make_error(p + 2, ErrorCode::InvalidUtf8));
                        }

                        let c3 = *get_unchecked!(self.input, p + 3);
                        if !is_utf8_continuation(c3) {
                            return Err(self.make_error(p + 3, ErrorCode::InvalidUtf8));
                        }

                        *get_unchecked_mut!(self.input, end) = c0;
                        *get_unchecked_mut!(self.input, end + 1) = c1;
                        *get_unchecked_mut!(self.input, end + 2) = c2;
                        *get_unchecked_mut!(self.input, end + 3) = c3;
                        end += 4;
                        p += 4;
                    } else {
                        return Err(self.make_error(p, ErrorCode::InvalidUtf8));
                    }
                }
            }
        }
    }

    /**
    Read 4 hex digits at `p`, which the caller has bounds-checked.
    */
    fn read_hex(&self, mut p: usize) -> Result<(usize, u32), ParseError> {
        let mut v = 0u32;

        for _ in 0..4 {
            let c = *get_unchecked!(self.input, p);
            p += 1;

            let digit = match c {
                b'0'..=b'9' => (c - b'0') as u32,
                b'a'..=b'f' => (c - b'a' + 10) as u32,
                b'A'..=b'F' => (c - b'A' + 10) as u32,
                _ => return Err(self.make_error(p, ErrorCode::InvalidUnicodeEscape)),
            };

            v = (v << 4) + digit;
        }

        Ok((p, v))
    }
}
