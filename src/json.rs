//! JSON bridge over the object tree.
//!
//! The JSON codec does not speak the packer protocol directly: it converts
//! between JSON text and [`Object`] trees, and the Object bridges carry the
//! protocol from there. Map insertion order is preserved both ways. Binary
//! nodes render as integer arrays; [`ObjectReader`](crate::ObjectReader)
//! coerces an all-integer list back into bytes when a traversal requests a
//! binary, so binary-bearing types survive the JSON round trip.

use crate::error::{PacktreeError, Result};
use crate::object::{read_object, write_object, ConstObject, Object, Value};
use crate::packer::{Readable, Writable};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

impl Serialize for ConstObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.value() {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(v),
            Value::Int(v) => serializer.serialize_i64(v),
            Value::Float(v) => serializer.serialize_f64(v),
            Value::Str(v) => serializer.serialize_str(&v),
            Value::Binary(bytes) => {
                let mut seq = serializer.serialize_seq(Some(bytes.len()))?;
                for byte in bytes {
                    seq.serialize_element(&byte)?;
                }
                seq.end()
            }
            Value::Map => {
                let children = self.children();
                let mut map = serializer.serialize_map(Some(children.len()))?;
                for child in children {
                    map.serialize_entry(&child.key(), &child)?;
                }
                map.end()
            }
            Value::List => {
                let children = self.children();
                let mut seq = serializer.serialize_seq(Some(children.len()))?;
                for child in children {
                    seq.serialize_element(&child)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_const().serialize(serializer)
    }
}

/// Parses JSON text into an object tree.
pub fn load_json(text: &str) -> Result<Object> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|err| PacktreeError::Load(err.to_string()))?;
    Ok(json_to_object(&value))
}

/// Renders an object tree as compact JSON text.
pub fn dump_json(object: &ConstObject) -> Result<String> {
    serde_json::to_string(object).map_err(|err| PacktreeError::Dump(err.to_string()))
}

/// Deserializes a value from JSON text, via the object bridges.
pub fn read_json<T: Readable + Default>(text: &str) -> Result<T> {
    let object = load_json(text)?;
    read_object(&object.as_const())
}

/// Serializes a value as JSON text, via the object bridges.
pub fn write_json<T: Writable>(value: &T) -> Result<String> {
    let object = write_object(value)?;
    dump_json(&object.as_const())
}

fn json_to_object(value: &serde_json::Value) -> Object {
    let root = Object::new(root_value(value));
    fill(&root, value);
    root
}

fn root_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(v) => Value::Bool(*v),
        serde_json::Value::Number(n) => number_value(n),
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(_) => Value::List,
        serde_json::Value::Object(_) => Value::Map,
    }
}

fn number_value(number: &serde_json::Number) -> Value {
    if let Some(v) = number.as_i64() {
        Value::Int(v)
    } else if let Some(v) = number.as_u64() {
        Value::Int(v as i64)
    } else {
        Value::Float(number.as_f64().unwrap_or(0.0))
    }
}

fn fill(node: &Object, value: &serde_json::Value) {
    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                if let Ok(child) = node.append(root_value(item)) {
                    fill(&child, item);
                }
            }
        }
        serde_json::Value::Object(entries) => {
            for (key, item) in entries {
                if let Ok(child) = node.insert(key, root_value(item)) {
                    fill(&child, item);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_preserves_insertion_order() {
        let root = Object::new(Value::Map);
        root.insert("b", 1i64).expect("insert");
        root.insert("a", 2i64).expect("insert");
        let text = dump_json(&root.as_const()).expect("dump");
        assert_eq!(text, r#"{"b":1,"a":2}"#);
    }

    #[test]
    fn load_builds_expected_tree() {
        let object = load_json(r#"{"id":5,"name":"player","xs":[1,2],"none":null}"#)
            .expect("load");
        assert_eq!(object.at("id").get::<i64>().expect("get"), 5);
        assert_eq!(object.at("name").get::<String>().expect("get"), "player");
        assert_eq!(object.at("xs").size(), 2);
        assert!(matches!(object.at("none").value(), Value::Null));
    }

    #[test]
    fn value_round_trip() {
        let value = (5i32, "player".to_string(), vec![1.5f64, 2.5]);
        let text = write_json(&value).expect("write");
        let back: (i32, String, Vec<f64>) = read_json(&text).expect("read");
        assert_eq!(back, value);
    }

    #[test]
    fn integer_literals_read_as_floats() {
        // Hand-written JSON often says 2 where the type wants 2.0.
        let back: f64 = read_json("2").expect("read");
        assert_eq!(back, 2.0);
    }
}
