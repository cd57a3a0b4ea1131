//! Packers that materialize and replay object trees.
//!
//! [`ObjectWriter`] is the WRITE-mode packer targeting an [`Object`] tree;
//! [`ObjectReader`] walks an existing tree in lockstep with a READ-mode
//! traversal, recording a path-qualified failure on the first mismatch
//! between the visit order and the tree shape.

use super::{ConstObject, Object, Value};
use crate::error::{ErrorKind, PacktreeError, Result};
use crate::packer::{Readable, Reader, Writable, Writer};
use crate::primitive::{Primitive, PrimitiveKind};

/// Serializes a value into a fresh [`Object`] tree.
pub fn write_object<T: Writable>(value: &T) -> Result<Object> {
    let mut writer = ObjectWriter::new();
    value.write(&mut writer);
    writer.into_object()
}

/// Deserializes a value out of an [`Object`] tree.
pub fn read_object<T: Readable + Default>(object: &ConstObject) -> Result<T> {
    let mut reader = ObjectReader::new(object.clone());
    let mut value = T::default();
    value.read(&mut reader);
    match reader.failure() {
        Some(message) => Err(PacktreeError::Load(message)),
        None => Ok(value),
    }
}

/// WRITE-mode packer that builds an object tree.
///
/// Keeps a cursor onto the currently open container and a pending key: each
/// `object_next`/`map_next` stashes the key, and the next value operation
/// consumes it. Lists consume the cursor directly.
#[derive(Debug, Default)]
pub struct ObjectWriter {
    root: Option<Object>,
    stack: Vec<Object>,
    pending_key: Option<String>,
    error: Option<String>,
}

impl ObjectWriter {
    /// Creates a writer with no tree yet; the first value operation
    /// creates the root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the writer, yielding the finished tree.
    pub fn into_object(self) -> Result<Object> {
        if let Some(message) = self.error {
            return Err(PacktreeError::Dump(message));
        }
        if !self.stack.is_empty() {
            return Err(PacktreeError::Dump(
                "unclosed container at end of traversal".to_owned(),
            ));
        }
        self.root
            .ok_or_else(|| PacktreeError::Dump("no value was written".to_owned()))
    }

    fn fail(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(message);
        }
    }

    /// Attaches a value at the current site: the root when nothing exists
    /// yet, under the pending key inside a map, or appended inside a list.
    fn place(&mut self, value: Value) -> Option<Object> {
        if self.error.is_some() {
            return None;
        }
        let Some(cursor) = self.stack.last() else {
            if self.root.is_some() {
                self.fail("value written after the root completed".to_owned());
                return None;
            }
            let root = Object::new(value);
            self.root = Some(root.clone());
            return Some(root);
        };
        let placed = match cursor.value() {
            Value::Map => match self.pending_key.take() {
                Some(key) => cursor.insert(&key, value),
                None => {
                    self.fail(format!(
                        "map value without a key at {}",
                        cursor.display_path()
                    ));
                    return None;
                }
            },
            Value::List => cursor.append(value),
            other => {
                self.fail(format!(
                    "value written inside a {} at {}",
                    other.kind_name(),
                    cursor.display_path()
                ));
                return None;
            }
        };
        match placed {
            Ok(object) => Some(object),
            Err(err) => {
                self.fail(err.to_string());
                None
            }
        }
    }

    fn open(&mut self, value: Value) {
        if let Some(object) = self.place(value) {
            self.stack.push(object);
        }
    }

    fn close(&mut self, expected: &str) {
        if self.error.is_some() {
            return;
        }
        if self.stack.pop().is_none() {
            self.fail(format!("{expected} end without a matching begin"));
        }
    }
}

impl Writer for ObjectWriter {
    fn primitive(&mut self, value: Primitive) {
        let value = match value {
            Primitive::I32(v) => Value::Int(i64::from(v)),
            Primitive::I64(v) => Value::Int(v),
            Primitive::U32(v) => Value::Int(i64::from(v)),
            // Out-of-range u64 wraps; the object model stores int64.
            Primitive::U64(v) => Value::Int(v as i64),
            Primitive::F32(v) => Value::Float(f64::from(v)),
            Primitive::F64(v) => Value::Float(v),
        };
        self.place(value);
    }

    fn string(&mut self, value: &str) {
        self.place(Value::Str(value.to_owned()));
    }

    fn boolean(&mut self, value: bool) {
        self.place(Value::Bool(value));
    }

    fn enumerate(&mut self, index: usize, labels: &[&str]) {
        match labels.get(index) {
            Some(label) => {
                self.place(Value::Str((*label).to_owned()));
            }
            None => self.fail(format!(
                "enumerate index {index} outside a table of {}",
                labels.len()
            )),
        }
    }

    fn optional_begin(&mut self, has_value: bool) {
        if !has_value {
            self.place(Value::Null);
        }
    }

    fn optional_end(&mut self) {}

    fn variant_begin(&mut self, label: &str, labels: &[&str]) {
        if !labels.contains(&label) {
            self.fail(format!("variant label {label} missing from its table"));
            return;
        }
        self.open(Value::Map);
        self.pending_key = Some(label.to_owned());
    }

    fn variant_end(&mut self) {
        self.close("variant");
    }

    fn binary(&mut self, data: &[u8], _stride: usize) {
        self.place(Value::Binary(data.to_vec()));
    }

    fn object_begin(&mut self) {
        self.open(Value::Map);
    }

    fn object_end(&mut self) {
        self.close("object");
    }

    fn object_next(&mut self, key: &str) {
        self.pending_key = Some(key.to_owned());
    }

    fn tuple_begin(&mut self) {
        self.open(Value::List);
    }

    fn tuple_end(&mut self) {
        self.close("tuple");
    }

    fn tuple_next(&mut self) {}

    fn map_begin(&mut self) {
        self.open(Value::Map);
    }

    fn map_end(&mut self) {
        self.close("map");
    }

    fn map_next(&mut self, key: &str) {
        self.pending_key = Some(key.to_owned());
    }

    fn list_begin(&mut self) {
        self.open(Value::List);
    }

    fn list_end(&mut self) {
        self.close("list");
    }

    fn list_next(&mut self) {}

    fn error(&mut self, message: &str) {
        self.fail(message.to_owned());
    }

    fn failure(&self) -> Option<String> {
        self.error.clone()
    }
}

enum Frame {
    Object { container: ConstObject },
    Tuple { cursor: ConstObject },
    Map { cursor: ConstObject },
    List { cursor: ConstObject },
}

/// READ-mode packer that replays an existing object tree.
pub struct ObjectReader {
    next_node: ConstObject,
    frames: Vec<Frame>,
    variants: Vec<(String, ConstObject)>,
    pending_binary: Option<Vec<u8>>,
    error: Option<String>,
}

impl ObjectReader {
    /// Creates a reader positioned at the given node.
    pub fn new(root: ConstObject) -> Self {
        Self {
            next_node: root,
            frames: Vec::new(),
            variants: Vec::new(),
            pending_binary: None,
            error: None,
        }
    }

    fn fail(&mut self, kind: ErrorKind, detail: &str) {
        if self.error.is_none() {
            let path = self.next_node.display_path();
            self.error = Some(format!("{kind}: {detail} at {path}"));
        }
    }

    /// Extracts the bytes at the current node, coercing an all-integer
    /// list (the JSON rendering of binary data) back into bytes.
    fn take_bytes(&mut self) -> Option<Vec<u8>> {
        if let Some(bytes) = self.next_node.get_if::<Vec<u8>>() {
            return Some(bytes);
        }
        if matches!(self.next_node.value(), Value::List) {
            let mut bytes = Vec::with_capacity(self.next_node.size());
            for child in self.next_node.children() {
                match child.get_if::<i64>() {
                    Some(v) if (0..=255).contains(&v) => bytes.push(v as u8),
                    _ => {
                        self.fail(ErrorKind::KindMismatch, "expected binary");
                        return None;
                    }
                }
            }
            return Some(bytes);
        }
        self.fail(
            ErrorKind::KindMismatch,
            &format!("expected binary, found {}", self.next_node.value().kind_name()),
        );
        None
    }
}

impl Reader for ObjectReader {
    fn primitive(&mut self, kind: PrimitiveKind) -> Primitive {
        if self.error.is_some() {
            return Primitive::zero(kind);
        }
        let value = self.next_node.value();
        let result = match (kind, &value) {
            (PrimitiveKind::I32, Value::Int(v)) => Some(Primitive::I32(*v as i32)),
            (PrimitiveKind::I64, Value::Int(v)) => Some(Primitive::I64(*v)),
            (PrimitiveKind::U32, Value::Int(v)) => Some(Primitive::U32(*v as u32)),
            (PrimitiveKind::U64, Value::Int(v)) => Some(Primitive::U64(*v as u64)),
            (PrimitiveKind::F32, Value::Float(v)) => Some(Primitive::F32(*v as f32)),
            (PrimitiveKind::F64, Value::Float(v)) => Some(Primitive::F64(*v)),
            // Integer nodes read fine as floats; JSON drops the decimal
            // point from whole numbers.
            (PrimitiveKind::F32, Value::Int(v)) => Some(Primitive::F32(*v as f32)),
            (PrimitiveKind::F64, Value::Int(v)) => Some(Primitive::F64(*v as f64)),
            _ => None,
        };
        match result {
            Some(primitive) => primitive,
            None => {
                self.fail(
                    ErrorKind::KindMismatch,
                    &format!("expected {kind:?}, found {}", value.kind_name()),
                );
                Primitive::zero(kind)
            }
        }
    }

    fn string(&mut self) -> String {
        if self.error.is_some() {
            return String::new();
        }
        match self.next_node.get_if::<String>() {
            Some(value) => value,
            None => {
                self.fail(
                    ErrorKind::KindMismatch,
                    &format!(
                        "expected string, found {}",
                        self.next_node.value().kind_name()
                    ),
                );
                String::new()
            }
        }
    }

    fn boolean(&mut self) -> bool {
        if self.error.is_some() {
            return false;
        }
        match self.next_node.get_if::<bool>() {
            Some(value) => value,
            None => {
                self.fail(
                    ErrorKind::KindMismatch,
                    &format!("expected bool, found {}", self.next_node.value().kind_name()),
                );
                false
            }
        }
    }

    fn enumerate(&mut self, labels: &[&str]) -> usize {
        if self.error.is_some() {
            return 0;
        }
        let Some(label) = self.next_node.get_if::<String>() else {
            self.fail(ErrorKind::KindMismatch, "expected an enum label string");
            return 0;
        };
        match labels.iter().position(|l| *l == label) {
            Some(index) => index,
            None => {
                self.fail(
                    ErrorKind::NoMatchingVariant,
                    &format!("label {label} not in table"),
                );
                0
            }
        }
    }

    fn optional_begin(&mut self) -> bool {
        if self.error.is_some() {
            return false;
        }
        self.next_node.is_valid() && !matches!(self.next_node.value(), Value::Null)
    }

    fn optional_end(&mut self) {}

    fn variant_begin(&mut self, _labels: &[&str]) {
        if self.error.is_some() {
            return;
        }
        if !matches!(self.next_node.value(), Value::Map) || self.next_node.size() != 1 {
            self.fail(
                ErrorKind::KindMismatch,
                "expected a single-entry map for a variant",
            );
            self.variants.push((String::new(), self.next_node.clone()));
            return;
        }
        let arm = self.next_node.child();
        self.variants.push((arm.key(), arm));
    }

    fn variant_match(&mut self, label: &str) -> bool {
        if self.error.is_some() {
            return false;
        }
        let Some((key, arm)) = self.variants.last() else {
            self.fail(ErrorKind::NoMatchingVariant, "variant_match outside a variant");
            return false;
        };
        if key == label {
            self.next_node = arm.clone();
            true
        } else {
            false
        }
    }

    fn variant_end(&mut self) {
        self.variants.pop();
    }

    fn binary_size(&mut self, _stride: usize) -> usize {
        if self.error.is_some() {
            return 0;
        }
        match self.take_bytes() {
            Some(bytes) => {
                let size = bytes.len();
                self.pending_binary = Some(bytes);
                size
            }
            None => 0,
        }
    }

    fn binary_data(&mut self, dest: &mut [u8]) {
        if self.error.is_some() {
            return;
        }
        match self.pending_binary.take() {
            Some(bytes) if bytes.len() == dest.len() => dest.copy_from_slice(&bytes),
            Some(_) => self.fail(ErrorKind::Underflow, "binary buffer size mismatch"),
            None => self.fail(ErrorKind::Underflow, "binary_data without binary_size"),
        }
    }

    fn object_begin(&mut self) {
        if self.error.is_some() {
            return;
        }
        if !matches!(self.next_node.value(), Value::Map) {
            self.fail(
                ErrorKind::KindMismatch,
                &format!("expected object, found {}", self.next_node.value().kind_name()),
            );
        }
        self.frames.push(Frame::Object {
            container: self.next_node.clone(),
        });
    }

    fn object_end(&mut self) {
        self.frames.pop();
    }

    fn object_next(&mut self, key: &str) {
        if self.error.is_some() {
            return;
        }
        let Some(Frame::Object { container }) = self.frames.last() else {
            self.fail(ErrorKind::MissingKey, "object_next outside an object");
            return;
        };
        let child = container.at(key);
        if !child.is_valid() {
            let path = container.display_path();
            if self.error.is_none() {
                self.error = Some(format!("{}: {key} at {path}", ErrorKind::MissingKey));
            }
            return;
        }
        self.next_node = child;
    }

    fn tuple_begin(&mut self) {
        if self.error.is_some() {
            return;
        }
        if !matches!(self.next_node.value(), Value::List) {
            self.fail(
                ErrorKind::KindMismatch,
                &format!("expected tuple, found {}", self.next_node.value().kind_name()),
            );
        }
        self.frames.push(Frame::Tuple {
            cursor: self.next_node.child(),
        });
    }

    fn tuple_end(&mut self) {
        self.frames.pop();
    }

    fn tuple_next(&mut self) {
        if self.error.is_some() {
            return;
        }
        let Some(Frame::Tuple { cursor }) = self.frames.last_mut() else {
            self.fail(ErrorKind::KindMismatch, "tuple_next outside a tuple");
            return;
        };
        if !cursor.is_valid() {
            self.fail(ErrorKind::Underflow, "tuple has fewer elements than read");
            return;
        }
        self.next_node = cursor.clone();
        *cursor = cursor.next();
    }

    fn map_begin(&mut self) {
        if self.error.is_some() {
            return;
        }
        if !matches!(self.next_node.value(), Value::Map) {
            self.fail(
                ErrorKind::KindMismatch,
                &format!("expected map, found {}", self.next_node.value().kind_name()),
            );
        }
        self.frames.push(Frame::Map {
            cursor: self.next_node.child(),
        });
    }

    fn map_end(&mut self) {
        self.frames.pop();
    }

    fn map_next(&mut self) -> Option<String> {
        if self.error.is_some() {
            return None;
        }
        let Some(Frame::Map { cursor }) = self.frames.last_mut() else {
            self.fail(ErrorKind::KindMismatch, "map_next outside a map");
            return None;
        };
        if !cursor.is_valid() {
            return None;
        }
        let key = cursor.key();
        self.next_node = cursor.clone();
        *cursor = cursor.next();
        Some(key)
    }

    fn list_begin(&mut self) {
        if self.error.is_some() {
            return;
        }
        if !matches!(self.next_node.value(), Value::List) {
            self.fail(
                ErrorKind::KindMismatch,
                &format!("expected list, found {}", self.next_node.value().kind_name()),
            );
        }
        self.frames.push(Frame::List {
            cursor: self.next_node.child(),
        });
    }

    fn list_end(&mut self) {
        self.frames.pop();
    }

    fn list_next(&mut self) -> bool {
        if self.error.is_some() {
            return false;
        }
        let Some(Frame::List { cursor }) = self.frames.last_mut() else {
            self.fail(ErrorKind::KindMismatch, "list_next outside a list");
            return false;
        };
        if !cursor.is_valid() {
            return false;
        }
        self.next_node = cursor.clone();
        *cursor = cursor.next();
        true
    }

    fn error(&mut self, message: &str) {
        if self.error.is_none() {
            self.error = Some(message.to_owned());
        }
    }

    fn failure(&self) -> Option<String> {
        self.error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::{Reader as _, Writer as _};

    #[test]
    fn writer_builds_expected_tree() {
        let mut writer = ObjectWriter::new();
        writer.object_begin();
        writer.value("id", &5i32);
        writer.value("name", &"player".to_string());
        writer.value("enabled", &true);
        writer.object_end();
        let object = writer.into_object().expect("object");

        assert_eq!(object.at("id").get::<i64>().expect("get"), 5);
        assert_eq!(object.at("name").get::<String>().expect("get"), "player");
        assert!(object.at("enabled").get::<bool>().expect("get"));
    }

    #[test]
    fn round_trip_through_tree() {
        let value = (1i32, "two".to_string(), vec![3i64, 4, 5]);
        let object = write_object(&value).expect("write");
        let back: (i32, String, Vec<i64>) =
            read_object(&object.as_const()).expect("read");
        assert_eq!(back, value);
    }

    #[test]
    fn missing_key_names_path() {
        let object = Object::new(Value::Map);
        object.insert("present", 1i64).expect("insert");
        let err = read_object::<i64>(&object.at("present").parent().as_const())
            .and_then(|_: i64| Ok(()))
            .err();
        // Reading an i64 out of a map is a kind mismatch.
        let message = err.expect("error").to_string();
        assert!(message.contains("kind mismatch"), "{message}");
    }

    #[test]
    fn optional_absent_reads_none() {
        let object = Object::new(Value::Map);
        object.insert("a", Value::Null).expect("insert");

        let mut reader = ObjectReader::new(object.as_const());
        reader.object_begin();
        reader.object_next("a");
        assert!(!reader.optional_begin());
        reader.optional_end();
        reader.object_end();
        assert!(reader.failure().is_none());
    }
}
