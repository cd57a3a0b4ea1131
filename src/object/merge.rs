//! The merge/diff algebra over object trees.
//!
//! `merge(base, diff)` applies `diff` on top of `base`; `diff(base,
//! modified)` produces the difference, such that
//! `merge(base, diff(base, modified)) == modified` and
//! `diff(base, merge(base, d)) == d` whenever `d` carries no redundant
//! entries.
//!
//! Rules:
//!
//! - A null value is equivalent to an absent key, and a map containing only
//!   nulls is equivalent to an absent map.
//! - A scalar in the diff overwrites the value at the same path.
//! - Keys only in the diff are appended, creating intermediate maps.
//! - A null in the diff erases the key instead of storing a null.
//! - For lists, the diff is a map whose integer-string keys index positions
//!   in the base. Missing indices are unchanged; indices past the end
//!   append, padding gaps with nulls; a null at an index erases it. Erasing
//!   in the middle is encoded as rewriting the tail and erasing the last
//!   element, so erased indices are always trailing in produced diffs.
//! - Nulls embedded in lists are preserved unless they are the trailing
//!   element.
//!
//! Kinds are assumed stable at shared paths: a site that is a list in the
//! base stays a list in the modified tree (a map-shaped diff on a list node
//! is always read as indexed operations).

use super::{copy_children, ConstObject, Object, Value};
use std::collections::HashSet;

/// Applies `diff` on top of `base`, returning the merged tree in a fresh
/// arena. Neither input is modified.
pub fn merge(base: &ConstObject, diff: &ConstObject) -> Object {
    let out = base.deep_clone();
    match (out.value(), diff.value()) {
        (Value::Map, Value::Map) => merge_map(&out, diff),
        (Value::List, Value::Map) => merge_list(&out, diff),
        _ => {
            if !matches!(diff.value(), Value::Null) {
                return diff.deep_clone();
            }
        }
    }
    out
}

fn merge_map(dst: &Object, diff: &ConstObject) {
    for entry in diff.children() {
        let key = entry.key();
        let existing = dst.at(&key);
        match entry.value() {
            Value::Null => {
                if existing.is_valid() {
                    existing.erase();
                }
            }
            Value::Map => {
                if existing.is_valid() {
                    match existing.value() {
                        Value::Map => merge_map(&existing, &entry),
                        Value::List => merge_list(&existing, &entry),
                        _ => overwrite(&existing, &entry),
                    }
                } else if let Ok(created) = dst.insert(&key, Value::Map) {
                    merge_map(&created, &entry);
                }
            }
            _ => {
                if existing.is_valid() {
                    overwrite(&existing, &entry);
                } else if let Ok(created) = dst.insert(&key, entry.value()) {
                    copy_children(&entry, &created);
                }
            }
        }
    }
}

fn merge_list(dst: &Object, ops: &ConstObject) {
    let mut indexed: Vec<(usize, ConstObject)> = ops
        .children()
        .into_iter()
        .filter_map(|entry| entry.key().parse::<usize>().ok().map(|i| (i, entry)))
        .collect();
    indexed.sort_by_key(|(i, _)| *i);

    let mut nulled: HashSet<usize> = HashSet::new();
    for (index, entry) in indexed {
        if index < dst.size() {
            let target = dst.at_index(index);
            match (target.value(), entry.value()) {
                (_, Value::Null) => {
                    target.set(Value::Null);
                    nulled.insert(index);
                }
                (Value::Map, Value::Map) => merge_map(&target, &entry),
                (Value::List, Value::Map) => merge_list(&target, &entry),
                _ => overwrite(&target, &entry),
            }
        } else {
            while dst.size() < index {
                let _ = dst.append(Value::Null);
            }
            match entry.value() {
                Value::Null => {
                    let _ = dst.append(Value::Null);
                    nulled.insert(index);
                }
                Value::Map => {
                    if let Ok(created) = dst.append(Value::Map) {
                        merge_map(&created, &entry);
                    }
                }
                other => {
                    if let Ok(created) = dst.append(other) {
                        copy_children(&entry, &created);
                    }
                }
            }
        }
    }

    // Erased indices are trailing in well-formed diffs; anything the diff
    // nulled mid-list stays as an embedded null.
    loop {
        let size = dst.size();
        if size == 0 {
            break;
        }
        let last = dst.at_index(size - 1);
        if matches!(last.value(), Value::Null) && nulled.contains(&(size - 1)) {
            last.erase();
        } else {
            break;
        }
    }
}

/// Replaces `dst`'s value and subtree with a copy of `src`.
fn overwrite(dst: &Object, src: &ConstObject) {
    dst.set(src.value());
    dst.clear();
    copy_children(src, dst);
}

/// Produces the difference between `base` and `modified`, such that merging
/// it onto `base` reproduces `modified`. The result lives in a fresh arena.
pub fn diff(base: &ConstObject, modified: &ConstObject) -> Object {
    match (base.value(), modified.value()) {
        (Value::Map, Value::Map) => diff_maps(base, modified),
        (Value::List, Value::List) => diff_lists(base, modified),
        _ => {
            if base == modified {
                Object::new(Value::Map)
            } else {
                modified.deep_clone()
            }
        }
    }
}

fn diff_maps(base: &ConstObject, modified: &ConstObject) -> Object {
    let out = Object::new(Value::Map);

    for child in modified.children() {
        let key = child.key();
        let base_child = base.at(&key);
        let base_present = base_child.is_valid() && !effectively_absent(&base_child);

        match child.value() {
            Value::Null => {
                if base_present {
                    let _ = out.insert(&key, Value::Null);
                }
            }
            Value::Map => {
                if effectively_absent(&child) {
                    // A null-only map counts as absent on the modified side.
                    if base_present {
                        let _ = out.insert(&key, Value::Null);
                    }
                } else if base_present && matches!(base_child.value(), Value::Map) {
                    let sub = diff_maps(&base_child, &child);
                    if sub.size() > 0 {
                        graft(&out, &key, &sub.as_const());
                    }
                } else {
                    copy_entry(&out, &key, &child);
                }
            }
            Value::List => {
                if base_present && matches!(base_child.value(), Value::List) {
                    let ops = diff_lists(&base_child, &child);
                    if ops.size() > 0 {
                        graft(&out, &key, &ops.as_const());
                    }
                } else {
                    copy_entry(&out, &key, &child);
                }
            }
            _ => {
                if !base_present || base_child.value() != child.value() {
                    copy_entry(&out, &key, &child);
                }
            }
        }
    }

    // Keys present in the base but gone from the modified tree are erased.
    for base_child in base.children() {
        let key = base_child.key();
        if modified.at(&key).is_valid() {
            continue;
        }
        if effectively_absent(&base_child) {
            continue;
        }
        let _ = out.insert(&key, Value::Null);
    }

    out
}

fn diff_lists(base: &ConstObject, modified: &ConstObject) -> Object {
    let out = Object::new(Value::Map);
    let base_len = base.size();
    let modified_len = trimmed_len(modified);
    let shared = base_len.min(modified_len);

    for index in 0..shared {
        let base_item = base.at_index(index);
        let modified_item = modified.at_index(index);
        if base_item == modified_item {
            continue;
        }
        let key = index.to_string();
        match (base_item.value(), modified_item.value()) {
            (Value::Map, Value::Map) => {
                let sub = diff_maps(&base_item, &modified_item);
                if sub.size() > 0 {
                    graft(&out, &key, &sub.as_const());
                }
            }
            (Value::List, Value::List) => {
                let ops = diff_lists(&base_item, &modified_item);
                if ops.size() > 0 {
                    graft(&out, &key, &ops.as_const());
                }
            }
            _ => copy_entry(&out, &key, &modified_item),
        }
    }

    for index in shared..modified_len {
        copy_entry(&out, &index.to_string(), &modified.at_index(index));
    }

    for index in shared..base_len {
        let _ = out.insert(&index.to_string(), Value::Null);
    }

    out
}

/// A trailing null in a list is equivalent to a shorter list.
fn trimmed_len(list: &ConstObject) -> usize {
    let mut len = list.size();
    while len > 0 {
        if matches!(list.at_index(len - 1).value(), Value::Null) {
            len -= 1;
        } else {
            break;
        }
    }
    len
}

/// Whether a node counts as absent under the null-equivalence rule.
fn effectively_absent(node: &ConstObject) -> bool {
    match node.value() {
        Value::Null => true,
        Value::Map => node.children().iter().all(effectively_absent),
        _ => false,
    }
}

/// Inserts `src`'s subtree under `dst[key]`, stripping entries that count
/// as absent so produced diffs carry no redundant nulls.
fn copy_entry(dst: &Object, key: &str, src: &ConstObject) {
    match src.value() {
        Value::Map => {
            if let Ok(created) = dst.insert(key, Value::Map) {
                for child in src.children() {
                    if effectively_absent(&child) {
                        continue;
                    }
                    copy_entry(&created, &child.key(), &child);
                }
            }
        }
        Value::List => {
            if let Ok(created) = dst.insert(key, Value::List) {
                let len = trimmed_len(src);
                for index in 0..len {
                    copy_list_item(&created, &src.at_index(index));
                }
            }
        }
        other => {
            let _ = dst.insert(key, other);
        }
    }
}

fn copy_list_item(dst: &Object, src: &ConstObject) {
    match src.value() {
        Value::Map => {
            if let Ok(created) = dst.append(Value::Map) {
                for child in src.children() {
                    if effectively_absent(&child) {
                        continue;
                    }
                    copy_entry(&created, &child.key(), &child);
                }
            }
        }
        Value::List => {
            if let Ok(created) = dst.append(Value::List) {
                let len = trimmed_len(src);
                for index in 0..len {
                    copy_list_item(&created, &src.at_index(index));
                }
            }
        }
        other => {
            let _ = dst.append(other);
        }
    }
}

/// Moves an already-built diff subtree under `dst[key]`.
fn graft(dst: &Object, key: &str, sub: &ConstObject) {
    if let Ok(created) = dst.insert(key, sub.value()) {
        copy_children(sub, &created);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> Object {
        Object::new(Value::Map)
    }

    #[test]
    fn merge_overwrites_and_appends() {
        let base = map();
        base.insert("a", 1i64).expect("insert");
        let diff_obj = map();
        diff_obj.insert("a", 2i64).expect("insert");
        diff_obj.insert("b", 3i64).expect("insert");

        let merged = merge(&base.as_const(), &diff_obj.as_const());
        assert_eq!(merged.at("a").get::<i64>().expect("get"), 2);
        assert_eq!(merged.at("b").get::<i64>().expect("get"), 3);
    }

    #[test]
    fn merge_null_erases() {
        let base = map();
        base.insert("a", 1i64).expect("insert");
        base.insert("b", 2i64).expect("insert");
        let diff_obj = map();
        diff_obj.insert("a", Value::Null).expect("insert");

        let merged = merge(&base.as_const(), &diff_obj.as_const());
        assert!(!merged.at("a").is_valid());
        assert_eq!(merged.size(), 1);
    }

    #[test]
    fn merge_creates_intermediate_maps() {
        let base = map();
        let diff_obj = map();
        let inner = diff_obj.insert("outer", Value::Map).expect("insert");
        inner.insert("inner", 7i64).expect("insert");

        let merged = merge(&base.as_const(), &diff_obj.as_const());
        assert_eq!(merged.at("outer").at("inner").get::<i64>().expect("get"), 7);
    }

    #[test]
    fn list_diff_appends_and_erases() {
        // diff({"xs":[1,2,3]}, {"xs":[1,2,3,4]}) == {"xs":{"3":4}}
        let base = map();
        let xs = base.insert("xs", Value::List).expect("insert");
        for v in [1i64, 2, 3] {
            xs.append(v).expect("append");
        }
        let longer = base.deep_clone();
        longer.at("xs").append(4i64).expect("append");

        let d = diff(&base.as_const(), &longer.as_const());
        assert_eq!(d.at("xs").size(), 1);
        assert_eq!(d.at("xs").at("3").get::<i64>().expect("get"), 4);

        // diff({"xs":[1,2,3]}, {"xs":[1,2]}) == {"xs":{"2":null}}
        let shorter = map();
        let xs2 = shorter.insert("xs", Value::List).expect("insert");
        xs2.append(1i64).expect("append");
        xs2.append(2i64).expect("append");

        let d = diff(&base.as_const(), &shorter.as_const());
        assert_eq!(d.at("xs").size(), 1);
        assert!(matches!(d.at("xs").at("2").value(), Value::Null));
    }

    #[test]
    fn diff_merge_round_trip() {
        let base = map();
        base.insert("a", 1i64).expect("insert");
        let b = base.insert("b", Value::Map).expect("insert");
        b.insert("x", 2i64).expect("insert");
        let xs = base.insert("xs", Value::List).expect("insert");
        for v in [10i64, 20, 30] {
            xs.append(v).expect("append");
        }

        let modified = base.deep_clone();
        modified.at("b").at("x").set(9i64);
        modified.at("xs").at_index(1).set(21i64);
        modified.insert("c", "new").expect("insert");

        let d = diff(&base.as_const(), &modified.as_const());
        let merged = merge(&base.as_const(), &d.as_const());
        assert_eq!(merged, modified);

        // diff(base, merge(base, d)) == d for a redundancy-free diff
        let d2 = diff(&base.as_const(), &merged.as_const());
        assert_eq!(d2, d);
    }

    #[test]
    fn null_only_map_counts_as_absent() {
        let base = map();
        let sub = base.insert("sub", Value::Map).expect("insert");
        sub.insert("x", Value::Null).expect("insert");

        let modified = map();
        let d = diff(&base.as_const(), &modified.as_const());
        // The base's null-only map is already "absent": nothing to erase.
        assert_eq!(d.size(), 0);
    }
}
