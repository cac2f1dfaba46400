/*
Every error the parser reports gets exercised here, along with the 1-based
line and byte column it's positioned at.

The column counter advances once per byte of the working buffer, which the
parser has already mutated behind the error position; the line/column tests
pin that behavior down as much as they check it.
*/

use super::*;

use crate::ErrorCode;

fn assert_error(input: &str, code: ErrorCode, line: usize, column: usize) {
    with_document(input, |document| {
        assert!(!document.is_valid());
        assert!(document.root().is_none());

        let error = document.error().expect("expected an error");

        assert_eq!(code, error.code(), "wrong code for {:?}: {}", input, error);
        assert_eq!(
            (line, column),
            (error.line(), error.column()),
            "wrong position for {:?}: {}",
            input,
            error,
        );
    });
}

fn assert_error_bytes(input: &[u8], code: ErrorCode) {
    with_document_bytes(input, |document| {
        assert!(!document.is_valid());

        let error = document.error().expect("expected an error");
        assert_eq!(code, error.code(), "wrong code for {:?}", input);
    });
}

#[test]
fn err_empty_input() {
    assert_error("", ErrorCode::MissingRootElement, 1, 1);
}

#[test]
fn err_whitespace_only_input() {
    assert_error(" \t\r\n ", ErrorCode::MissingRootElement, 2, 2);
}

#[test]
fn err_scalar_roots() {
    assert_error("42", ErrorCode::BadRoot, 1, 1);
    assert_error("\"text\"", ErrorCode::BadRoot, 1, 1);
    assert_error("null", ErrorCode::BadRoot, 1, 1);
    assert_error("  true", ErrorCode::BadRoot, 1, 3);
}

#[test]
fn err_truncated_structures() {
    assert_error("[", ErrorCode::UnexpectedEnd, 1, 2);
    assert_error("{", ErrorCode::UnexpectedEnd, 1, 2);
    assert_error("[1", ErrorCode::UnexpectedEnd, 1, 3);
    assert_error("[1,", ErrorCode::UnexpectedEnd, 1, 4);
    assert_error("{\"a\":1", ErrorCode::UnexpectedEnd, 1, 7);
}

#[test]
fn err_truncated_array_reports_end_of_input() {
    assert_error(
        "{\"abc\":123,\"def\":[1,2,3",
        ErrorCode::UnexpectedEnd,
        1,
        24,
    );

    with_document("{\"abc\":123,\"def\":[1,2,3", |document| {
        assert_eq!("unexpected end of input", document.error_message());
        assert_eq!("unexpected end of input", document.error().unwrap().to_string());
    });
}

#[test]
fn err_missing_comma() {
    assert_error("[1 2]", ErrorCode::ExpectedComma, 1, 4);
    assert_error("{\"a\":1 \"b\":2}", ErrorCode::ExpectedComma, 1, 8);
}

#[test]
fn err_missing_object_key() {
    assert_error("{1:2}", ErrorCode::MissingObjectKey, 1, 2);
    assert_error("{,}", ErrorCode::MissingObjectKey, 1, 2);
    assert_error("{\"a\":1,}", ErrorCode::MissingObjectKey, 1, 8);
}

#[test]
fn err_missing_colon() {
    assert_error("{\"a\" 1}", ErrorCode::ExpectedColon, 1, 6);
    assert_error("{\"a\"", ErrorCode::ExpectedColon, 1, 5);
}

#[test]
fn err_trailing_content() {
    assert_error("[] []", ErrorCode::ExpectedEndOfInput, 1, 4);
    assert_error("{}x", ErrorCode::ExpectedEndOfInput, 1, 3);
}

#[test]
fn err_unexpected_comma() {
    assert_error("[,1]", ErrorCode::UnexpectedComma, 1, 2);
    assert_error("[1,,2]", ErrorCode::UnexpectedComma, 1, 4);
}

#[test]
fn err_expected_value() {
    assert_error("[x]", ErrorCode::ExpectedValue, 1, 2);
    assert_error("{\"a\":#}", ErrorCode::ExpectedValue, 1, 6);
    assert_error("[]]", ErrorCode::ExpectedEndOfInput, 1, 3);
}

#[test]
fn err_misspelled_atoms() {
    assert_error("[nul]", ErrorCode::ExpectedNull, 1, 2);
    assert_error("[falsy]", ErrorCode::ExpectedFalse, 1, 2);
    assert_error("[truth]", ErrorCode::ExpectedTrue, 1, 2);

    // truncated atoms run out of input instead
    assert_error("[nu", ErrorCode::UnexpectedEnd, 1, 2);
    assert_error("[fals", ErrorCode::UnexpectedEnd, 1, 2);
}

#[test]
fn err_invalid_numbers() {
    assert_error("[-]", ErrorCode::InvalidNumber, 1, 3);
    assert_error("[-x]", ErrorCode::InvalidNumber, 1, 3);
    assert_error("[1.]", ErrorCode::InvalidNumber, 1, 4);
    assert_error("[1.x]", ErrorCode::InvalidNumber, 1, 4);
}

#[test]
fn err_missing_exponent() {
    assert_error("[1e]", ErrorCode::MissingExponent, 1, 4);
    assert_error("[1e+]", ErrorCode::MissingExponent, 1, 5);
    assert_error("[1e-]", ErrorCode::MissingExponent, 1, 5);
}

#[test]
fn err_unterminated_string() {
    assert_error("[\"abc", ErrorCode::UnexpectedEnd, 1, 6);
    assert_error("[\"abc\\", ErrorCode::UnexpectedEnd, 1, 7);
    assert_error("[\"a\\\"", ErrorCode::UnexpectedEnd, 1, 6);
}

#[test]
fn err_unknown_escape() {
    assert_error("[\"\\q\"]", ErrorCode::UnknownEscape, 1, 4);
}

#[test]
fn err_control_byte_in_string() {
    with_document("[\"a\u{1}b\"]", |document| {
        let error = document.error().expect("expected an error");

        assert_eq!(ErrorCode::IllegalCodepoint, error.code());
        assert_eq!(
            "illegal unprintable codepoint in string: 1",
            document.error_message()
        );
    });

    assert_error("[\"a\tb\"]", ErrorCode::IllegalCodepoint, 1, 4);
}

#[test]
fn err_invalid_unicode_escape() {
    assert_error("[\"\\u12G4\"]", ErrorCode::InvalidUnicodeEscape, 1, 8);
    assert_error("[\"\\uzzzz\"]", ErrorCode::InvalidUnicodeEscape, 1, 6);
}

#[test]
fn err_lone_lead_surrogate() {
    // a lead surrogate at the end of the string has no room for its trail
    assert_error("[\"\\uD800\"]", ErrorCode::UnexpectedEndOfUtf16, 1, 9);

    // one followed by ordinary characters is missing the `\u`
    assert_error("[\"\\uD800abcdef\"]", ErrorCode::ExpectedU, 1, 9);
}

#[test]
fn err_invalid_trail_surrogate() {
    assert_error(
        "[\"\\uD800\\uD801\"]",
        ErrorCode::InvalidUtf16TrailSurrogate,
        1,
        15,
    );

    // a trail surrogate on its own can't become UTF-8
    assert_error(
        "[\"\\uDC00\"]",
        ErrorCode::InvalidUtf16TrailSurrogate,
        1,
        9,
    );
}

#[test]
fn err_invalid_utf8() {
    // a stray continuation byte
    assert_error_bytes(b"[\"\x80\"]", ErrorCode::InvalidUtf8);

    // an overlong 2-byte encoding of `/`
    assert_error_bytes(b"[\"\xC0\xAF\"]", ErrorCode::InvalidUtf8);

    // a 2-byte lead without its continuation
    assert_error_bytes(b"[\"\xC3\"]", ErrorCode::InvalidUtf8);

    // a raw surrogate encoded as 3 bytes
    assert_error_bytes(b"[\"\xED\xA0\x80\"]", ErrorCode::InvalidUtf8);

    // a 4-byte sequence past U+10FFFF
    assert_error_bytes(b"[\"\xF5\x80\x80\x80\"]", ErrorCode::InvalidUtf8);

    // a 5-byte prefix
    assert_error_bytes(b"[\"\xF8\x80\x80\x80\x80\"]", ErrorCode::InvalidUtf8);
}

#[test]
fn err_nul_byte_at_value_position() {
    assert_error_bytes(b"[\x001]", ErrorCode::UnexpectedEnd);
}

#[test]
fn err_out_of_memory_when_buffer_is_short() {
    let mut text = b"{\"a\":[1,2,3]}".to_vec();
    let mut words = [0usize; 4];

    let document = Document::parse_single_allocation(&mut text, &mut words);

    assert!(!document.is_valid());

    let error = document.error().unwrap();
    assert_eq!(ErrorCode::OutOfMemory, error.code());
    assert_eq!((1, 1), (error.line(), error.column()));
    assert_eq!("out of memory", document.error_message());
}

#[test]
fn err_positions_count_lines_and_columns() {
    assert_error("{\n  \"a\": x", ErrorCode::ExpectedValue, 2, 8);
    assert_error("{\r\n  \"a\": x", ErrorCode::ExpectedValue, 2, 8);
    assert_error("{\r  \"a\": x", ErrorCode::ExpectedValue, 2, 8);
    assert_error("[1,\n 2,\n x]", ErrorCode::ExpectedValue, 3, 2);
}

#[test]
fn err_default_document_is_uninitialized() {
    let document = Document::default();

    assert!(!document.is_valid());
    assert_eq!(ErrorCode::Uninitialized, document.error().unwrap().code());
    assert_eq!("uninitialized document", document.error_message());
}

#[test]
fn invalid_documents_debug_without_panicking() {
    with_document("[1,", |document| {
        let debugged = format!("{:?}", document);

        assert!(debugged.contains("error"));
    });
}
