//! The binary codec: positional, untagged, little-endian.
//!
//! Values are emitted in traversal order without field names. The layout
//! per site:
//!
//! ```text
//! Site            | Encoding
//! ----------------|---------------------------------------------------
//! Integers/floats | little-endian fixed width, two's complement
//! Bool            | one byte, 0 or 1
//! String          | u64 byte count, then the bytes, no terminator
//! Optional        | one presence byte; body follows only if present
//! Enumerate       | u32 index into the label table
//! Variant         | u32 index of the chosen arm, then the arm body
//! Binary (opaque) | u64 byte count, then the bytes
//! Binary (stride) | u64 element count, then count * stride bytes
//! List            | u8 continuation byte before each element, 0 = end
//! Map             | same framing, a string key preceding each entry
//! Object/Tuple    | concatenation of children, no framing
//! ```
//!
//! There is no magic and no version prefix; decoding requires the static
//! type (or its [`Schema`](crate::Schema), via
//! [`load_binary`](crate::load_binary)).

use crate::error::{ErrorKind, PacktreeError, Result};
use crate::packer::{Readable, Reader, Writable, Writer};
use crate::primitive::{Primitive, PrimitiveKind};

/// Encodes a value into binary bytes.
pub fn write_binary<T: Writable>(value: &T) -> Result<Vec<u8>> {
    let mut writer = BinaryWriter::new();
    value.write(&mut writer);
    writer.into_bytes()
}

/// Decodes a value from binary bytes.
pub fn read_binary<T: Readable + Default>(bytes: &[u8]) -> Result<T> {
    let mut reader = BinaryReader::new(bytes);
    let mut value = T::default();
    value.read(&mut reader);
    match reader.failure() {
        Some(message) => Err(PacktreeError::Load(message)),
        None => Ok(value),
    }
}

/// WRITE-mode packer producing a byte vector.
#[derive(Debug, Default)]
pub struct BinaryWriter {
    data: Vec<u8>,
    error: Option<String>,
}

impl BinaryWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the writer, yielding the encoded bytes.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self.error {
            Some(message) => Err(PacktreeError::Dump(message)),
            None => Ok(self.data),
        }
    }

    fn fail(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(message);
        }
    }

    fn push_u64(&mut self, value: u64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn push_str(&mut self, value: &str) {
        self.push_u64(value.len() as u64);
        self.data.extend_from_slice(value.as_bytes());
    }
}

impl Writer for BinaryWriter {
    fn primitive(&mut self, value: Primitive) {
        if self.error.is_some() {
            return;
        }
        match value {
            Primitive::I32(v) => self.data.extend_from_slice(&v.to_le_bytes()),
            Primitive::I64(v) => self.data.extend_from_slice(&v.to_le_bytes()),
            Primitive::U32(v) => self.data.extend_from_slice(&v.to_le_bytes()),
            Primitive::U64(v) => self.data.extend_from_slice(&v.to_le_bytes()),
            Primitive::F32(v) => self.data.extend_from_slice(&v.to_le_bytes()),
            Primitive::F64(v) => self.data.extend_from_slice(&v.to_le_bytes()),
        }
    }

    fn string(&mut self, value: &str) {
        if self.error.is_some() {
            return;
        }
        self.push_str(value);
    }

    fn boolean(&mut self, value: bool) {
        if self.error.is_some() {
            return;
        }
        self.data.push(u8::from(value));
    }

    fn enumerate(&mut self, index: usize, labels: &[&str]) {
        if self.error.is_some() {
            return;
        }
        if index >= labels.len() {
            self.fail(format!(
                "enumerate index {index} outside a table of {}",
                labels.len()
            ));
            return;
        }
        self.data.extend_from_slice(&(index as u32).to_le_bytes());
    }

    fn optional_begin(&mut self, has_value: bool) {
        if self.error.is_some() {
            return;
        }
        self.data.push(u8::from(has_value));
    }

    fn optional_end(&mut self) {}

    fn variant_begin(&mut self, label: &str, labels: &[&str]) {
        if self.error.is_some() {
            return;
        }
        match labels.iter().position(|l| *l == label) {
            Some(index) => self.data.extend_from_slice(&(index as u32).to_le_bytes()),
            None => self.fail(format!("variant label {label} missing from its table")),
        }
    }

    fn variant_end(&mut self) {}

    fn binary(&mut self, data: &[u8], stride: usize) {
        if self.error.is_some() {
            return;
        }
        if stride == 0 {
            self.push_u64(data.len() as u64);
        } else {
            if data.len() % stride != 0 {
                self.fail(format!(
                    "binary payload of {} bytes is not a multiple of stride {stride}",
                    data.len()
                ));
                return;
            }
            self.push_u64((data.len() / stride) as u64);
        }
        self.data.extend_from_slice(data);
    }

    fn object_begin(&mut self) {}

    fn object_end(&mut self) {}

    fn object_next(&mut self, _key: &str) {}

    fn tuple_begin(&mut self) {}

    fn tuple_end(&mut self) {}

    fn tuple_next(&mut self) {}

    fn map_begin(&mut self) {}

    fn map_end(&mut self) {
        if self.error.is_some() {
            return;
        }
        self.data.push(0);
    }

    fn map_next(&mut self, key: &str) {
        if self.error.is_some() {
            return;
        }
        self.data.push(1);
        self.push_str(key);
    }

    fn list_begin(&mut self) {}

    fn list_end(&mut self) {
        if self.error.is_some() {
            return;
        }
        self.data.push(0);
    }

    fn list_next(&mut self) {
        if self.error.is_some() {
            return;
        }
        self.data.push(1);
    }

    fn error(&mut self, message: &str) {
        self.fail(message.to_owned());
    }

    fn failure(&self) -> Option<String> {
        self.error.clone()
    }
}

/// READ-mode packer consuming a byte slice at an advancing offset.
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
    variants: Vec<Option<String>>,
    error: Option<String>,
}

impl<'a> BinaryReader<'a> {
    /// Creates a reader over the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            variants: Vec::new(),
            error: None,
        }
    }

    /// The current read offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn fail(&mut self, kind: ErrorKind, detail: &str) {
        if self.error.is_none() {
            self.error = Some(format!("{kind}: {detail} at offset {}", self.pos));
        }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        if self.error.is_some() {
            return [0; N];
        }
        let Some(slice) = self.data.get(self.pos..self.pos.saturating_add(N)) else {
            self.fail(ErrorKind::Underflow, &format!("needed {N} bytes"));
            return [0; N];
        };
        let mut buf = [0; N];
        buf.copy_from_slice(slice);
        self.pos += N;
        buf
    }

    fn take_slice(&mut self, len: usize) -> &'a [u8] {
        if self.error.is_some() {
            return &[];
        }
        let data = self.data;
        let slice = self
            .pos
            .checked_add(len)
            .and_then(|end| data.get(self.pos..end));
        let Some(slice) = slice else {
            self.fail(ErrorKind::Underflow, &format!("needed {len} bytes"));
            return &[];
        };
        self.pos += len;
        slice
    }

    fn take_u64(&mut self) -> u64 {
        u64::from_le_bytes(self.take())
    }

    fn take_string(&mut self) -> String {
        let len = self.take_u64();
        let Ok(len) = usize::try_from(len) else {
            self.fail(ErrorKind::Overflow, "string length");
            return String::new();
        };
        let bytes = self.take_slice(len);
        match std::str::from_utf8(bytes) {
            Ok(text) => text.to_owned(),
            Err(_) => {
                self.fail(ErrorKind::KindMismatch, "string is not valid utf-8");
                String::new()
            }
        }
    }

    fn take_flag(&mut self, what: &str) -> bool {
        let [byte] = self.take::<1>();
        match byte {
            0 => false,
            1 => true,
            _ => {
                self.fail(
                    ErrorKind::KindMismatch,
                    &format!("{what} byte is {byte}, expected 0 or 1"),
                );
                false
            }
        }
    }
}

impl Reader for BinaryReader<'_> {
    fn primitive(&mut self, kind: PrimitiveKind) -> Primitive {
        match kind {
            PrimitiveKind::I32 => Primitive::I32(i32::from_le_bytes(self.take())),
            PrimitiveKind::I64 => Primitive::I64(i64::from_le_bytes(self.take())),
            PrimitiveKind::U32 => Primitive::U32(u32::from_le_bytes(self.take())),
            PrimitiveKind::U64 => Primitive::U64(u64::from_le_bytes(self.take())),
            PrimitiveKind::F32 => Primitive::F32(f32::from_le_bytes(self.take())),
            PrimitiveKind::F64 => Primitive::F64(f64::from_le_bytes(self.take())),
            PrimitiveKind::Str | PrimitiveKind::Bool => {
                self.fail(
                    ErrorKind::KindMismatch,
                    "string and bool do not travel on the primitive channel",
                );
                Primitive::zero(kind)
            }
        }
    }

    fn string(&mut self) -> String {
        self.take_string()
    }

    fn boolean(&mut self) -> bool {
        self.take_flag("bool")
    }

    fn enumerate(&mut self, labels: &[&str]) -> usize {
        let index = u32::from_le_bytes(self.take()) as usize;
        if self.error.is_none() && index >= labels.len() {
            self.fail(
                ErrorKind::NoMatchingVariant,
                &format!("enumerate index {index} outside a table of {}", labels.len()),
            );
            return 0;
        }
        index
    }

    fn optional_begin(&mut self) -> bool {
        self.take_flag("optional presence")
    }

    fn optional_end(&mut self) {}

    fn variant_begin(&mut self, labels: &[&str]) {
        let index = u32::from_le_bytes(self.take()) as usize;
        if self.error.is_none() {
            match labels.get(index) {
                Some(label) => self.variants.push(Some((*label).to_owned())),
                None => {
                    self.fail(
                        ErrorKind::NoMatchingVariant,
                        &format!("variant index {index} outside a table of {}", labels.len()),
                    );
                    self.variants.push(None);
                }
            }
        } else {
            self.variants.push(None);
        }
    }

    fn variant_match(&mut self, label: &str) -> bool {
        match self.variants.last() {
            Some(Some(chosen)) => chosen == label,
            _ => false,
        }
    }

    fn variant_end(&mut self) {
        self.variants.pop();
    }

    fn binary_size(&mut self, stride: usize) -> usize {
        let count = self.take_u64();
        let Ok(count) = usize::try_from(count) else {
            self.fail(ErrorKind::Overflow, "binary count");
            return 0;
        };
        if stride == 0 {
            return count;
        }
        match count.checked_mul(stride) {
            Some(size) => size,
            None => {
                self.fail(ErrorKind::Overflow, "binary byte size");
                0
            }
        }
    }

    fn binary_data(&mut self, dest: &mut [u8]) {
        let bytes = self.take_slice(dest.len());
        if bytes.len() == dest.len() {
            dest.copy_from_slice(bytes);
        }
    }

    fn object_begin(&mut self) {}

    fn object_end(&mut self) {}

    fn object_next(&mut self, _key: &str) {}

    fn tuple_begin(&mut self) {}

    fn tuple_end(&mut self) {}

    fn tuple_next(&mut self) {}

    fn map_begin(&mut self) {}

    fn map_end(&mut self) {}

    fn map_next(&mut self) -> Option<String> {
        if self.take_flag("map continuation") {
            Some(self.take_string())
        } else {
            None
        }
    }

    fn list_begin(&mut self) {}

    fn list_end(&mut self) {}

    fn list_next(&mut self) -> bool {
        self.take_flag("list continuation")
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

    #[test]
    fn primitive_layout_is_little_endian() {
        let bytes = write_binary(&0x0102_0304i32).expect("write");
        assert_eq!(bytes, [0x04, 0x03, 0x02, 0x01]);

        let back: i32 = read_binary(&bytes).expect("read");
        assert_eq!(back, 0x0102_0304);
    }

    #[test]
    fn string_layout() {
        let bytes = write_binary(&"player".to_string()).expect("write");
        assert_eq!(&bytes[..8], &6u64.to_le_bytes());
        assert_eq!(&bytes[8..], b"player");
    }

    #[test]
    fn optional_layout() {
        let bytes = write_binary(&Option::<i32>::None).expect("write");
        assert_eq!(bytes, [0x00]);

        let bytes = write_binary(&Some(7i32)).expect("write");
        assert_eq!(bytes, [0x01, 0x07, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn list_layout_uses_continuation_bytes() {
        let bytes = write_binary(&vec![10i32, 20, 30]).expect("write");
        assert_eq!(
            bytes,
            [
                0x01, 0x0A, 0x00, 0x00, 0x00, //
                0x01, 0x14, 0x00, 0x00, 0x00, //
                0x01, 0x1E, 0x00, 0x00, 0x00, //
                0x00,
            ]
        );
    }

    #[test]
    fn underflow_is_reported() {
        let err = read_binary::<i64>(&[0x01, 0x02]).expect_err("underflow");
        assert!(err.to_string().contains("underflow"), "{err}");
    }

    #[test]
    fn trailing_garbage_in_flags_is_rejected() {
        // A list continuation byte of 2 is not a valid framing byte.
        let err = read_binary::<Vec<bool>>(&[0x02]).expect_err("bad flag");
        assert!(err.to_string().contains("kind mismatch"), "{err}");
    }
}
