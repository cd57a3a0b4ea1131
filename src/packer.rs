//! The packer protocol: the polymorphic surface every codec implements.
//!
//! A *packer* traverses a value in one of three modes. WRITE walks a const
//! value and feeds a sink, READ walks a source and fills a mutable value,
//! DEFINE records the shape of a type as a token stream. User types describe
//! themselves once per mode — [`Writable`], [`Readable`] and [`Definable`]
//! are sibling descriptions that must emit the identical operation sequence
//! for the same value, which is what makes WRITE ↔ READ a round-trip and
//! lets a recorded [`Schema`](crate::Schema) replay either side.
//!
//! Implementing a new codec means implementing [`Writer`] and/or [`Reader`];
//! the library contracts with codecs solely through these traits. Dispatch
//! is static: packers are ordinary generic parameters, so a codec compiled
//! against a concrete type pays no virtual-call cost.
//!
//! ## Ordering contract
//!
//! Within any container, children are emitted strictly between `begin` and
//! `end`, each preceded by the appropriate `next`. No packer reorders them.
//!
//! ## Fail-state
//!
//! Readers do not abort mid-traversal. The first failure is recorded via
//! [`Reader::error`]; every subsequent operation no-ops and yields zeroed
//! values. Entry points such as [`read_binary`](crate::read_binary) convert
//! the recorded failure into [`PacktreeError::Load`](crate::PacktreeError).
//! Writers follow the same recording scheme and surface
//! [`PacktreeError::Dump`](crate::PacktreeError).

use crate::constraint::{Constraint, Validate};
use crate::primitive::{Primitive, PrimitiveKind};
use crate::schema::Definer;

/// Sink side of the protocol: receives one traversal of a const value.
pub trait Writer {
    /// Writes a numeric primitive.
    fn primitive(&mut self, value: Primitive);

    /// Writes a string.
    fn string(&mut self, value: &str);

    /// Writes a boolean. A dedicated channel, separate from integer kinds.
    fn boolean(&mut self, value: bool);

    /// Writes the chosen index into a label table.
    fn enumerate(&mut self, index: usize, labels: &[&str]);

    /// Opens an option site, declaring whether a value follows.
    fn optional_begin(&mut self, has_value: bool);

    /// Closes an option site.
    fn optional_end(&mut self);

    /// Opens a choice, naming the chosen arm and the full label table.
    fn variant_begin(&mut self, label: &str, labels: &[&str]);

    /// Closes a choice.
    fn variant_end(&mut self);

    /// Writes a raw byte payload. `stride` is the element size when the
    /// bytes represent a packed array; zero denotes opaque bytes.
    fn binary(&mut self, data: &[u8], stride: usize);

    /// Opens a keyed record.
    fn object_begin(&mut self);

    /// Closes a keyed record.
    fn object_end(&mut self);

    /// Announces the next record field.
    fn object_next(&mut self, key: &str);

    /// Opens a positional record.
    fn tuple_begin(&mut self);

    /// Closes a positional record.
    fn tuple_end(&mut self);

    /// Announces the next positional element.
    fn tuple_next(&mut self);

    /// Opens a string-keyed mapping of dynamic size.
    fn map_begin(&mut self);

    /// Closes a mapping.
    fn map_end(&mut self);

    /// Announces the next mapping entry and its key.
    fn map_next(&mut self, key: &str);

    /// Opens a sequence of dynamic size.
    fn list_begin(&mut self);

    /// Closes a sequence.
    fn list_end(&mut self);

    /// Opens a slot for the next sequence element.
    fn list_next(&mut self);

    /// Marks the start of a region whose encoding is byte-identical to a
    /// flat POD of `size` bytes. Packers are free to ignore the hint.
    fn trivial_begin(&mut self, _size: usize) {}

    /// Closes a trivial region.
    fn trivial_end(&mut self, _size: usize) {}

    /// Records an encode failure. The first recorded message wins and all
    /// further operations no-op.
    fn error(&mut self, message: &str);

    /// The recorded failure, if any.
    fn failure(&self) -> Option<String>;

    /// Writes one keyed field: `object_next(key)` followed by the value's
    /// own traversal.
    fn value<T>(&mut self, key: &str, value: &T)
    where
        T: Writable,
        Self: Sized,
    {
        self.object_next(key);
        value.write(self);
    }

    /// Like [`Writer::value`] with an attached constraint. Constraints are
    /// advisory on the write side; the value is emitted unchanged.
    fn value_with<T>(&mut self, key: &str, value: &T, _constraint: &Constraint)
    where
        T: Writable + Validate,
        Self: Sized,
    {
        self.object_next(key);
        value.write(self);
    }
}

/// Source side of the protocol: produces one traversal into a mutable value.
pub trait Reader {
    /// Reads a numeric primitive of the requested kind.
    fn primitive(&mut self, kind: PrimitiveKind) -> Primitive;

    /// Reads a string.
    fn string(&mut self) -> String;

    /// Reads a boolean.
    fn boolean(&mut self) -> bool;

    /// Reads an index into a label table.
    fn enumerate(&mut self, labels: &[&str]) -> usize;

    /// Opens an option site and reports whether a value is present.
    fn optional_begin(&mut self) -> bool;

    /// Closes an option site.
    fn optional_end(&mut self);

    /// Opens a choice over a label table.
    fn variant_begin(&mut self, labels: &[&str]);

    /// Queries whether the encoded arm carries this label.
    fn variant_match(&mut self, label: &str) -> bool;

    /// Closes a choice.
    fn variant_end(&mut self);

    /// Reads the byte size of the pending binary payload. For a packed
    /// array, `stride` is the element size and the result is a multiple of
    /// it; zero denotes opaque bytes.
    fn binary_size(&mut self, stride: usize) -> usize;

    /// Fills `dest` with the pending binary payload. `dest` must have the
    /// length previously returned by [`Reader::binary_size`].
    fn binary_data(&mut self, dest: &mut [u8]);

    /// Opens a keyed record.
    fn object_begin(&mut self);

    /// Closes a keyed record.
    fn object_end(&mut self);

    /// Steps to the named record field.
    fn object_next(&mut self, key: &str);

    /// Opens a positional record.
    fn tuple_begin(&mut self);

    /// Closes a positional record.
    fn tuple_end(&mut self);

    /// Steps to the next positional element.
    fn tuple_next(&mut self);

    /// Opens a string-keyed mapping.
    fn map_begin(&mut self);

    /// Closes a mapping.
    fn map_end(&mut self);

    /// Steps to the next mapping entry, yielding its key, or `None` when
    /// the mapping is exhausted.
    fn map_next(&mut self) -> Option<String>;

    /// Opens a sequence.
    fn list_begin(&mut self);

    /// Closes a sequence.
    fn list_end(&mut self);

    /// Reports whether another sequence element follows.
    fn list_next(&mut self) -> bool;

    /// Marks the start of a trivial region. Packers may ignore the hint.
    fn trivial_begin(&mut self, _size: usize) {}

    /// Closes a trivial region.
    fn trivial_end(&mut self, _size: usize) {}

    /// Records a decode failure. The first recorded message wins and all
    /// further operations no-op, yielding zeroed values.
    fn error(&mut self, message: &str);

    /// The recorded failure, if any.
    fn failure(&self) -> Option<String>;

    /// Whether this reader must exhaustively match every variant arm.
    /// Generic variant matchers stop at the first match when this is false.
    fn is_exhaustive(&self) -> bool {
        false
    }

    /// Reads one keyed field: `object_next(key)` followed by the value's
    /// own traversal.
    fn value<T>(&mut self, key: &str, value: &mut T)
    where
        T: Readable,
        Self: Sized,
    {
        self.object_next(key);
        value.read(self);
    }

    /// Like [`Reader::value`], then validates the decoded value against the
    /// constraint, recording a `constraint violation` failure when it does
    /// not hold.
    fn value_with<T>(&mut self, key: &str, value: &mut T, constraint: &Constraint)
    where
        T: Readable + Validate,
        Self: Sized,
    {
        self.object_next(key);
        value.read(self);
        if self.failure().is_none() && !value.validate(constraint) {
            self.error(&format!(
                "{}: {:?} at {}",
                crate::ErrorKind::ConstraintViolation,
                constraint,
                key
            ));
        }
    }
}

/// Types that can describe themselves to a [`Writer`].
pub trait Writable {
    /// Emits one traversal of `self` into the writer.
    fn write<W: Writer>(&self, writer: &mut W);
}

/// Types that can fill themselves from a [`Reader`].
pub trait Readable {
    /// Consumes one traversal from the reader into `self`.
    fn read<R: Reader>(&mut self, reader: &mut R);
}

/// Types whose shape can be recorded as a schema token stream.
pub trait Definable {
    /// Emits the type's traversal shape into the definer.
    fn define(definer: &mut Definer);
}
