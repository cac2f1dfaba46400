#![cfg(unstable)]
#![feature(test)]
extern crate test;

use acorn_json::Document;

fn words_for(input: &[u8]) -> Vec<usize> {
    vec![0usize; input.len()]
}

#[bench]
fn parse_600b_pretty_config(b: &mut test::Bencher) {
    let input = include_bytes!("../cases/600b_pretty_config.json");
    let mut words = words_for(input);

    b.bytes = input.len() as u64;
    b.iter(|| {
        // parsing mutates the text, so each run gets a fresh copy; the word
        // buffer is just overwritten and can be reused as-is
        let mut text = input.to_vec();
        let document = Document::parse_single_allocation(&mut text, &mut words);
        assert!(document.is_valid());
    })
}

#[bench]
fn parse_3kb_nested_catalog(b: &mut test::Bencher) {
    let input = include_bytes!("../cases/3kb_nested_catalog.json");
    let mut words = words_for(input);

    b.bytes = input.len() as u64;
    b.iter(|| {
        let mut text = input.to_vec();
        let document = Document::parse_single_allocation(&mut text, &mut words);
        assert!(document.is_valid());
    })
}

#[bench]
fn parse_3kb_nested_catalog_sparse(b: &mut test::Bencher) {
    let input = include_bytes!("../cases/3kb_nested_catalog.json");
    let mut words = words_for(input);

    b.bytes = input.len() as u64;
    b.iter(|| {
        let mut text = input.to_vec();
        let document = Document::parse_single_allocation(&mut text, &mut words);

        let root = document.root().unwrap();
        let name = root
            .as_map()
            .unwrap()
            .value_of_key("catalog")
            .unwrap()
            .as_str()
            .unwrap();

        assert_eq!("northwind-extended", name);
    })
}

#[bench]
fn parse_600b_pretty_config_value_serde_json(b: &mut test::Bencher) {
    let input = include_bytes!("../cases/600b_pretty_config.json");

    b.bytes = input.len() as u64;
    b.iter(|| {
        let v: serde_json::Value = serde_json::from_slice(input).unwrap();
        v
    })
}

#[bench]
fn parse_3kb_nested_catalog_value_serde_json(b: &mut test::Bencher) {
    let input = include_bytes!("../cases/3kb_nested_catalog.json");

    b.bytes = input.len() as u64;
    b.iter(|| {
        let v: serde_json::Value = serde_json::from_slice(input).unwrap();
        v
    })
}

#[bench]
fn parse_3kb_nested_catalog_to_vec(b: &mut test::Bencher) {
    let input = include_bytes!("../cases/3kb_nested_catalog.json");

    b.bytes = input.len() as u64;
    b.iter(|| input.to_vec())
}

#[bench]
fn lookup_sorted_object_with_500_keys(b: &mut test::Bencher) {
    let mut input = String::from("{");
    for i in 0..500 {
        if i > 0 {
            input.push(',');
        }
        input.push_str(&format!("\"key_{:04}\":{}", i, i));
    }
    input.push('}');

    let mut text = input.into_bytes();
    let mut words = words_for(&text);
    let document = Document::parse_single_allocation(&mut text, &mut words);
    let root = document.root().unwrap();
    let map = root.as_map().unwrap();

    b.iter(|| {
        let value = map.value_of_key("key_0400").unwrap();
        assert_eq!(Some(400), value.get_integer_value());
    })
}
