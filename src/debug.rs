//! A WRITE-mode packer that renders a value as indented text.
//!
//! One line per scalar, containers bracketed and annotated with their kind,
//! four spaces per level. The format is stable for tests:
//!
//! ```text
//! (object) {
//!     id: 5,
//!     name: player,
//!     pose: (object, trivial size = 24) {
//!         x: 1,
//!         y: 2,
//!     },
//!     mobility: (enum, wheeled),
//!     footprint: (optional, has_value) {
//!         (variant, circle) {
//!             ...
//!         },
//!     },
//! },
//! ```

use crate::packer::{Writable, Writer};
use crate::primitive::Primitive;

/// Renders a value through its write traversal.
pub fn debug<T: Writable>(value: &T) -> String {
    let mut writer = DebugWriter::new();
    value.write(&mut writer);
    writer.finish()
}

/// WRITE-mode packer producing the textual rendering.
#[derive(Debug, Default)]
pub struct DebugWriter {
    out: String,
    indent: usize,
    pending_key: Option<String>,
    pending_trivial: Option<usize>,
    optional_blocks: Vec<bool>,
    error: Option<String>,
}

impl DebugWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the writer, yielding the rendered text.
    pub fn finish(self) -> String {
        self.out
    }

    fn prefix(&mut self) -> String {
        let mut line = "    ".repeat(self.indent);
        if let Some(key) = self.pending_key.take() {
            line.push_str(&key);
            line.push_str(": ");
        }
        line
    }

    fn scalar(&mut self, text: &str) {
        let prefix = self.prefix();
        self.out.push_str(&prefix);
        self.out.push_str(text);
        self.out.push_str(",\n");
    }

    fn open(&mut self, head: &str) {
        let prefix = self.prefix();
        self.out.push_str(&prefix);
        self.out.push_str(head);
        self.out.push_str(" {\n");
        self.indent += 1;
    }

    fn close(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.out.push_str(&"    ".repeat(self.indent));
        self.out.push_str("},\n");
    }

    fn container_head(&mut self, kind: &str) -> String {
        match self.pending_trivial.take() {
            Some(size) => format!("({kind}, trivial size = {size})"),
            None => format!("({kind})"),
        }
    }
}

impl Writer for DebugWriter {
    fn primitive(&mut self, value: Primitive) {
        let text = match value {
            Primitive::I32(v) => v.to_string(),
            Primitive::I64(v) => v.to_string(),
            Primitive::U32(v) => v.to_string(),
            Primitive::U64(v) => v.to_string(),
            Primitive::F32(v) => v.to_string(),
            Primitive::F64(v) => v.to_string(),
        };
        self.scalar(&text);
    }

    fn string(&mut self, value: &str) {
        self.scalar(value);
    }

    fn boolean(&mut self, value: bool) {
        self.scalar(if value { "true" } else { "false" });
    }

    fn enumerate(&mut self, index: usize, labels: &[&str]) {
        let label = labels.get(index).copied().unwrap_or("?");
        self.scalar(&format!("(enum, {label})"));
    }

    fn optional_begin(&mut self, has_value: bool) {
        if has_value {
            let head = self.container_head("optional, has_value");
            self.open(&head);
            self.optional_blocks.push(true);
        } else {
            self.pending_trivial = None;
            self.scalar("(optional, none)");
            self.optional_blocks.push(false);
        }
    }

    fn optional_end(&mut self) {
        if self.optional_blocks.pop() == Some(true) {
            self.close();
        }
    }

    fn variant_begin(&mut self, label: &str, _labels: &[&str]) {
        let head = format!("(variant, {label})");
        self.open(&head);
    }

    fn variant_end(&mut self) {
        self.close();
    }

    fn binary(&mut self, data: &[u8], _stride: usize) {
        self.scalar(&format!("(binary, {} bytes)", data.len()));
    }

    fn object_begin(&mut self) {
        let head = self.container_head("object");
        self.open(&head);
    }

    fn object_end(&mut self) {
        self.close();
    }

    fn object_next(&mut self, key: &str) {
        self.pending_key = Some(key.to_owned());
    }

    fn tuple_begin(&mut self) {
        let head = self.container_head("tuple");
        self.open(&head);
    }

    fn tuple_end(&mut self) {
        self.close();
    }

    fn tuple_next(&mut self) {}

    fn map_begin(&mut self) {
        let head = self.container_head("map");
        self.open(&head);
    }

    fn map_end(&mut self) {
        self.close();
    }

    fn map_next(&mut self, key: &str) {
        self.pending_key = Some(key.to_owned());
    }

    fn list_begin(&mut self) {
        let head = self.container_head("list");
        self.open(&head);
    }

    fn list_end(&mut self) {
        self.close();
    }

    fn list_next(&mut self) {}

    fn trivial_begin(&mut self, size: usize) {
        self.pending_trivial = Some(size);
    }

    fn trivial_end(&mut self, _size: usize) {
        self.pending_trivial = None;
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
    fn renders_scalars_and_containers() {
        let value = (5i32, "player".to_string(), Some(true), Option::<i32>::None);
        let text = debug(&value);
        let expected = "\
(tuple) {
    5,
    player,
    (optional, has_value) {
        true,
    },
    (optional, none),
},
";
        assert_eq!(text, expected);
    }

    #[test]
    fn renders_lists_with_elements() {
        let text = debug(&vec![1i32, 2]);
        let expected = "\
(list) {
    1,
    2,
},
";
        assert_eq!(text, expected);
    }
}
