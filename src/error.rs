/*!
Errors reported by the parser.

The first error aborts the parse; nothing is recovered internally. Every error
carries the 1-based line and column of the byte it was detected at. The column
counter advances once per byte rather than once per codepoint, and counts the
bytes of the working buffer, which the parser mutates as it goes.
*/

use std::fmt;

use thiserror::Error;

/**
The reason a parse failed.

The numeric identity and message text of each code are stable.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorCode {
    #[error("out of memory")]
    OutOfMemory,
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("missing root element")]
    MissingRootElement,
    #[error("document root must be object or array")]
    BadRoot,
    #[error("expected ,")]
    ExpectedComma,
    #[error("missing object key")]
    MissingObjectKey,
    #[error("expected :")]
    ExpectedColon,
    #[error("expected end of input")]
    ExpectedEndOfInput,
    #[error("unexpected comma")]
    UnexpectedComma,
    #[error("expected value")]
    ExpectedValue,
    #[error("expected 'null'")]
    ExpectedNull,
    #[error("expected 'false'")]
    ExpectedFalse,
    #[error("expected 'true'")]
    ExpectedTrue,
    #[error("invalid number")]
    InvalidNumber,
    #[error("missing exponent")]
    MissingExponent,
    #[error("illegal unprintable codepoint in string")]
    IllegalCodepoint,
    #[error("invalid character in unicode escape")]
    InvalidUnicodeEscape,
    #[error("unexpected end of input during UTF-16 surrogate pair")]
    UnexpectedEndOfUtf16,
    #[error("expected \\u")]
    ExpectedU,
    #[error("invalid UTF-16 trail surrogate")]
    InvalidUtf16TrailSurrogate,
    #[error("unknown escape")]
    UnknownEscape,
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("uninitialized document")]
    Uninitialized,
}

/**
A parse failure, positioned within the input.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    pub(crate) code: ErrorCode,
    pub(crate) line: usize,
    pub(crate) column: usize,
    pub(crate) arg: i32,
}

impl ParseError {
    pub(crate) fn uninitialized() -> Self {
        ParseError {
            code: ErrorCode::Uninitialized,
            line: 0,
            column: 0,
            arg: 0,
        }
    }

    /**
    The code classifying this error.
    */
    #[inline]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /**
    The 1-based line the error was detected on.
    */
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /**
    The 1-based byte column the error was detected at.
    */
    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    #[inline]
    fn has_significant_arg(&self) -> bool {
        self.code == ErrorCode::IllegalCodepoint
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.has_significant_arg() {
            write!(f, "{}: {}", self.code, self.arg)
        } else {
            self.code.fmt(f)
        }
    }
}

impl std::error::Error for ParseError {}

pub(crate) const MESSAGE_BUFFER_LENGTH: usize = 128;

/**
An inline, NUL-terminated copy of the formatted error message.

Held directly inside the document so language bindings can read the message
without any further formatting or allocation on their side.
*/
#[derive(Clone, Copy)]
pub(crate) struct MessageBuf {
    buf: [u8; MESSAGE_BUFFER_LENGTH],
}

impl MessageBuf {
    pub(crate) fn empty() -> Self {
        MessageBuf {
            buf: [0; MESSAGE_BUFFER_LENGTH],
        }
    }

    pub(crate) fn format(err: &ParseError) -> Self {
        use std::fmt::Write as _;

        let mut message = MessageBuf::empty();

        let mut cursor = Cursor {
            buf: &mut message.buf,
            len: 0,
        };

        // the cursor truncates rather than failing, so this write can't error
        let _ = write!(&mut cursor, "{}", err);

        message
    }

    pub(crate) fn as_str(&self) -> &str {
        let len = self.buf.iter().position(|&b| b == 0).unwrap_or(0);

        // SAFETY: the buffer is only ever filled from `str` data
        from_utf8_unchecked!(&self.buf[..len])
    }

    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.buf.as_ptr()
    }
}

/**
A writer over the message buffer that always leaves a trailing NUL.
*/
struct Cursor<'a> {
    buf: &'a mut [u8; MESSAGE_BUFFER_LENGTH],
    len: usize,
}

impl<'a> fmt::Write for Cursor<'a> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let remaining = MESSAGE_BUFFER_LENGTH - 1 - self.len;
        let take = s.len().min(remaining);

        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_texts() {
        assert_eq!("unexpected end of input", ErrorCode::UnexpectedEnd.to_string());
        assert_eq!(
            "document root must be object or array",
            ErrorCode::BadRoot.to_string()
        );
        assert_eq!("expected \\u", ErrorCode::ExpectedU.to_string());
    }

    #[test]
    fn illegal_codepoint_carries_byte() {
        let err = ParseError {
            code: ErrorCode::IllegalCodepoint,
            line: 1,
            column: 3,
            arg: 9,
        };

        assert_eq!("illegal unprintable codepoint in string: 9", err.to_string());
    }

    #[test]
    fn formatted_message_is_nul_terminated() {
        let err = ParseError {
            code: ErrorCode::MissingExponent,
            line: 2,
            column: 7,
            arg: 0,
        };

        let message = MessageBuf::format(&err);

        assert_eq!("missing exponent", message.as_str());
        assert_eq!(0, message.buf[message.as_str().len()]);
    }
}
