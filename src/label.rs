//! Label tables bridging user sum types to the packer protocol.
//!
//! Serialization of enums and variants goes through static label tables, not
//! numeric discriminants: the wire and the object tree carry the label, so a
//! reordered declaration does not silently reinterpret old data.

use crate::packer::{Reader, Writer};
use crate::schema::Definer;

/// A C-like enum paired with a static label table.
///
/// Usually implemented by `#[derive(Packable)]`, which also wires the type
/// into the enumerate channel of the protocol.
pub trait LabelledEnum: Sized {
    /// The label table, one entry per value, in declaration order.
    fn labels() -> &'static [&'static str];

    /// The index of this value in the label table.
    fn to_index(&self) -> usize;

    /// The value at a label-table index.
    fn from_index(index: usize) -> Option<Self>;

    /// The label of this value.
    fn to_label(&self) -> &'static str {
        Self::labels().get(self.to_index()).copied().unwrap_or("")
    }

    /// The value carrying the given label.
    fn from_label(label: &str) -> Option<Self> {
        Self::labels()
            .iter()
            .position(|l| *l == label)
            .and_then(Self::from_index)
    }
}

/// A sum type paired with a static label table, one label per arm.
///
/// The arm bodies are read and written by per-arm code (generated by
/// `#[derive(Packable)]`); this trait only exposes the table.
pub trait LabelledVariant {
    /// The label table, one entry per arm, in declaration order.
    fn labels() -> &'static [&'static str];

    /// The label of the currently inhabited arm.
    fn label(&self) -> &'static str;
}

/// Writes a labelled enum value through the enumerate channel.
pub fn write_enum<T: LabelledEnum, W: Writer>(value: &T, writer: &mut W) {
    writer.enumerate(value.to_index(), T::labels());
}

/// Reads a labelled enum value through the enumerate channel.
///
/// An out-of-table index records a failure and leaves the value unchanged.
pub fn read_enum<T: LabelledEnum, R: Reader>(value: &mut T, reader: &mut R) {
    let index = reader.enumerate(T::labels());
    match T::from_index(index) {
        Some(decoded) => *value = decoded,
        None => reader.error(&format!(
            "{}: enumerate index {} out of range",
            crate::ErrorKind::NoMatchingVariant,
            index
        )),
    }
}

/// Records a labelled enum's label table in a schema.
pub fn define_enum<T: LabelledEnum>(definer: &mut Definer) {
    definer.enumerate(T::labels());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Clone, Copy)]
    enum Mode {
        Off,
        Idle,
        Active,
    }

    impl LabelledEnum for Mode {
        fn labels() -> &'static [&'static str] {
            &["off", "idle", "active"]
        }

        fn to_index(&self) -> usize {
            *self as usize
        }

        fn from_index(index: usize) -> Option<Self> {
            match index {
                0 => Some(Self::Off),
                1 => Some(Self::Idle),
                2 => Some(Self::Active),
                _ => None,
            }
        }
    }

    #[test]
    fn label_round_trip() {
        assert_eq!(Mode::Idle.to_label(), "idle");
        assert_eq!(Mode::from_label("active"), Some(Mode::Active));
        assert_eq!(Mode::from_label("bogus"), None);
    }
}
