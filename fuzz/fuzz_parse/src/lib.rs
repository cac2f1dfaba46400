use acorn_json::Document;

/**
Drive the parser over an arbitrary byte string.

Asserts the guarantees that hold for any input at all: no panics, error
coordinates inside the input's bounds, and agreement with `serde_json` on
every document it can also read.
*/
pub fn parse(input: &[u8]) {
    let mut text = input.to_vec();
    let mut words = vec![0usize; text.len()];

    let document = Document::parse_single_allocation(&mut text, &mut words);

    match document.error() {
        Some(error) => {
            assert!(error.line() >= 1);
            assert!(error.column() >= 1);
            assert!(error.line() <= input.len() + 1);
            assert!(error.column() <= input.len() + 1);
            assert!(!document.error_message().is_empty());

            // anything serde_json reads as an object or array, we must read too
            if let Ok(value) = serde_json::from_slice::<serde_json::Value>(input) {
                if value.is_object() || value.is_array() {
                    panic!(
                        "rejected a document serde_json accepts: {} at {}:{}",
                        error,
                        error.line(),
                        error.column(),
                    );
                }
            }
        }
        None => {
            // navigating a valid document must stay in bounds everywhere
            let value = document.to_value();

            // when both parsers accept, they agree on the result
            if let Ok(expected) = serde_json::from_slice::<serde_json::Value>(input) {
                assert_matches(&value, &expected);
            }
        }
    }
}

/**
Structural equality with numeric tolerance; the parser's table-driven float
path can be an ulp or two away from `serde_json`'s correctly rounded one.
*/
fn assert_matches(actual: &serde_json::Value, expected: &serde_json::Value) {
    use serde_json::Value;

    match (actual, expected) {
        (Value::Number(actual_n), Value::Number(expected_n)) => {
            let actual_f = actual_n.as_f64().expect("non-finite number");
            let expected_f = expected_n.as_f64().expect("non-finite number");

            // the relative tolerance bridges ulp drift in digit accumulation;
            // the absolute floor bridges the flush-to-zero of subnormals
            let tolerance = f64::max(
                f64::max(actual_f.abs(), expected_f.abs()) * 1e-12,
                1e-307,
            );
            assert!(
                (actual_f - expected_f).abs() <= tolerance,
                "numbers diverge: {} vs {}",
                actual_n,
                expected_n,
            );
        }
        (Value::Array(actual_a), Value::Array(expected_a)) => {
            assert_eq!(actual_a.len(), expected_a.len());

            for (actual_e, expected_e) in actual_a.iter().zip(expected_a) {
                assert_matches(actual_e, expected_e);
            }
        }
        (Value::Object(actual_o), Value::Object(expected_o)) => {
            assert_eq!(actual_o.len(), expected_o.len());

            for (key, expected_v) in expected_o {
                assert_matches(actual_o.get(key).expect("missing key"), expected_v);
            }
        }
        (actual, expected) => assert_eq!(actual, expected),
    }
}
