#![allow(missing_docs)]

//! JSON in and out of the object tree, including the binary coercion.

use packtree::{
    dump_json, load_json, read_json, write_json, Binary, Packable, Value,
};

#[derive(Packable, Debug, Default, Clone, PartialEq)]
struct Profile {
    name: String,
    score: i64,
    ratio: f64,
    tags: Vec<String>,
    avatar: Binary,
}

#[test]
fn value_round_trip_through_json() {
    let value = Profile {
        name: "ada".to_owned(),
        score: 42,
        ratio: 0.75,
        tags: vec!["fast".to_owned(), "quiet".to_owned()],
        avatar: Binary(vec![1, 2, 255]),
    };
    let text = write_json(&value).expect("write");
    let back: Profile = read_json(&text).expect("read");
    assert_eq!(back, value);
}

#[test]
fn binary_renders_as_integer_array() {
    let value = Profile {
        avatar: Binary(vec![0, 128, 255]),
        ..Profile::default()
    };
    let text = write_json(&value).expect("write");
    assert!(text.contains(r#""avatar":[0,128,255]"#), "{text}");
}

#[test]
fn json_object_preserves_key_order() {
    let object = load_json(r#"{"z":1,"a":2,"m":3}"#).expect("load");
    let keys: Vec<String> = object.children().iter().map(|c| c.key()).collect();
    assert_eq!(keys, ["z", "a", "m"]);
    assert_eq!(dump_json(&object.as_const()).expect("dump"), r#"{"z":1,"a":2,"m":3}"#);
}

#[test]
fn nulls_and_nesting_survive() {
    let text = r#"{"a":null,"b":{"c":[1,2,{"d":true}]}}"#;
    let object = load_json(text).expect("load");
    assert!(matches!(object.at("a").value(), Value::Null));
    assert!(object.at("b").at("c").at_index(2).at("d").get::<bool>().expect("get"));
    assert_eq!(dump_json(&object.as_const()).expect("dump"), text);
}

#[test]
fn malformed_json_is_a_load_error() {
    assert!(load_json("{unquoted: 1}").is_err());
    assert!(read_json::<Profile>("][").is_err());
}
