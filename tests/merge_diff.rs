#![allow(missing_docs)]

//! The merge/diff algebra, driven through JSON literals for readability.

use packtree::{diff, load_json, merge, ConstObject, Object, Value};

fn obj(text: &str) -> Object {
    load_json(text).expect("json literal")
}

fn cobj(text: &str) -> ConstObject {
    obj(text).as_const()
}

#[test]
fn merge_overwrites_erases_and_appends() {
    let merged = merge(
        &cobj(r#"{"a":1,"b":{"x":2}}"#),
        &cobj(r#"{"b":{"x":null,"y":3},"c":4}"#),
    );
    assert_eq!(merged, obj(r#"{"a":1,"b":{"y":3},"c":4}"#));
}

#[test]
fn diff_of_list_append_and_shrink() {
    let d = diff(&cobj(r#"{"xs":[1,2,3]}"#), &cobj(r#"{"xs":[1,2,3,4]}"#));
    assert_eq!(d, obj(r#"{"xs":{"3":4}}"#));

    let d = diff(&cobj(r#"{"xs":[1,2,3]}"#), &cobj(r#"{"xs":[1,2]}"#));
    assert_eq!(d, obj(r#"{"xs":{"2":null}}"#));
}

#[test]
fn merge_identity() {
    let x = cobj(r#"{"a":1,"b":{"x":2,"y":[1,2,3]},"c":"text"}"#);
    let empty = cobj("{}");

    assert_eq!(merge(&x, &empty), obj(r#"{"a":1,"b":{"x":2,"y":[1,2,3]},"c":"text"}"#));
    assert_eq!(merge(&empty, &x), obj(r#"{"a":1,"b":{"x":2,"y":[1,2,3]},"c":"text"}"#));
}

#[test]
fn diff_merge_law() {
    let base = cobj(r#"{"a":1,"b":{"x":2,"y":true},"xs":[10,20,30],"s":"keep"}"#);
    let modified = cobj(r#"{"a":2,"b":{"x":2,"z":5},"xs":[10,21],"s":"keep","new":[1]}"#);

    let d = diff(&base, &modified);
    let merged = merge(&base, &d.as_const());
    assert_eq!(merged.as_const(), modified);
}

#[test]
fn diff_idempotence() {
    // The law holds for diffs free of null-only submaps and redundant
    // repeats; "m" keeps a live entry next to the erasure.
    let base = cobj(r#"{"a":1,"xs":[1,2,3],"m":{"k":true}}"#);
    let d = cobj(r#"{"a":9,"xs":{"1":5},"m":{"k":null,"j":2},"extra":"v"}"#);

    let merged = merge(&base, &d);
    let d2 = diff(&base, &merged.as_const());
    assert_eq!(d2.as_const(), d);
}

#[test]
fn merge_pads_list_gaps_with_nulls() {
    let merged = merge(&cobj(r#"{"xs":[1]}"#), &cobj(r#"{"xs":{"3":9}}"#));
    assert_eq!(merged, obj(r#"{"xs":[1,null,null,9]}"#));
}

#[test]
fn merge_list_element_update() {
    let merged = merge(&cobj(r#"{"xs":[10,20,30]}"#), &cobj(r#"{"xs":{"1":21}}"#));
    assert_eq!(merged, obj(r#"{"xs":[10,21,30]}"#));
}

#[test]
fn diff_equal_trees_is_empty() {
    let base = cobj(r#"{"a":1,"b":[true,false]}"#);
    let d = diff(&base, &cobj(r#"{"a":1,"b":[true,false]}"#));
    assert_eq!(d.size(), 0);
    assert!(matches!(d.value(), Value::Map));
}

#[test]
fn nested_list_diff_recurses() {
    let base = cobj(r#"{"grid":[[1,2],[3,4]]}"#);
    let modified = cobj(r#"{"grid":[[1,2],[3,5]]}"#);
    let d = diff(&base, &modified);
    assert_eq!(d, obj(r#"{"grid":{"1":{"1":5}}}"#));

    let merged = merge(&base, &d.as_const());
    assert_eq!(merged.as_const(), modified);
}

#[test]
fn null_in_diff_erases_key_instead_of_storing() {
    let merged = merge(&cobj(r#"{"a":1}"#), &cobj(r#"{"a":null}"#));
    assert!(!merged.at("a").is_valid());
    assert_eq!(merged.size(), 0);
}
