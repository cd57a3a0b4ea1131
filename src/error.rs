//! Centralized error handling for packtree.
//!
//! All failure conditions propagate through the [`Result`] type; the library
//! never panics on malformed input. Readers additionally carry an internal
//! fail-state (see [`crate::Reader`]): a primitive mismatch mid-stream does
//! not abort the traversal, it records the first failure and zero-fills, and
//! the top-level entry point converts the recorded failure into
//! [`PacktreeError::Load`].
//!
//! ## Error Categories
//!
//! - **Load** ([`PacktreeError::Load`]): decode failures and schema/data
//!   disagreements.
//! - **Dump** ([`PacktreeError::Dump`]): encode failures, e.g. emitting a map
//!   key outside a map.
//! - **Object** ([`PacktreeError::Object`]): structural violations on the
//!   dynamic object tree (bad kind access, inserting into a non-map).
//! - **Io** ([`PacktreeError::Io`]): file-facade I/O failures.
//!
//! Messages name the failing path (`items[3].name`) whenever the packer can
//! compute it, and the failing operation otherwise.
//!
//! ```rust
//! use packtree::{PacktreeError, Object, Value};
//!
//! let root = Object::new(Value::List);
//! match root.insert("key", 1i64) {
//!     Err(PacktreeError::Object(msg)) => assert!(msg.contains("not a map")),
//!     _ => panic!("expected an object error"),
//! }
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;

/// A specialized `Result` type for packtree operations.
pub type Result<T> = std::result::Result<T, PacktreeError>;

/// The master error enum covering all failure domains in packtree.
///
/// The type is `Clone` so errors can be stored for later analysis; I/O errors
/// are wrapped in an `Arc` to make cloning cheap.
#[derive(Debug, Clone)]
pub enum PacktreeError {
    /// Decode failure: the input bytes, text, or object tree disagree with
    /// the shape the traversal expects, or a schema disagrees with the data
    /// it is driving.
    Load(String),

    /// Encode failure: a structural impossibility on the write side, such as
    /// a map key emitted outside a map or a variant label missing from its
    /// label table.
    Dump(String),

    /// Structural violation on an [`Object`](crate::Object) handle, such as
    /// a typed access with the wrong kind or an insert on a non-map node.
    Object(String),

    /// Low-level I/O failure from the file facade.
    ///
    /// The underlying `io::Error` is wrapped in an `Arc` to keep the error
    /// `Clone`.
    Io(Arc<io::Error>),
}

impl fmt::Display for PacktreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(s) => write!(f, "Load Error: {s}"),
            Self::Dump(s) => write!(f, "Dump Error: {s}"),
            Self::Object(s) => write!(f, "Object Error: {s}"),
            Self::Io(e) => write!(f, "I/O Error: {e}"),
        }
    }
}

impl std::error::Error for PacktreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PacktreeError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

/// Fine-grained failure kinds, printed into error messages.
///
/// Readers and the object tree use these to prefix their messages so callers
/// can distinguish, say, a truncated stream from a label-table miss without
/// parsing free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input ended before the value did.
    Underflow,
    /// A length or count does not fit the target representation.
    Overflow,
    /// A value site holds a different kind than the traversal expects.
    KindMismatch,
    /// An object field is absent from the tree being read.
    MissingKey,
    /// A map key was inserted twice.
    DuplicateKey,
    /// A map operation was applied to a non-map node.
    NotAMap,
    /// A list operation was applied to a non-list node.
    NotAList,
    /// No arm of a variant matched the encoded label.
    NoMatchingVariant,
    /// Two arms of a variant carry the same label.
    RepeatedVariantLabel,
    /// A schema token stream is not well-formed.
    InvalidSchema,
    /// A decoded value violates a declared constraint.
    ConstraintViolation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Underflow => "underflow",
            Self::Overflow => "overflow",
            Self::KindMismatch => "kind mismatch",
            Self::MissingKey => "missing key",
            Self::DuplicateKey => "duplicate key",
            Self::NotAMap => "not a map",
            Self::NotAList => "not a list",
            Self::NoMatchingVariant => "no matching variant",
            Self::RepeatedVariantLabel => "repeated variant label",
            Self::InvalidSchema => "invalid schema",
            Self::ConstraintViolation => "constraint violation",
        };
        f.write_str(text)
    }
}
