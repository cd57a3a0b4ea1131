//! # packtree
//!
//! A structural data-packing library: a single description of a value's
//! shape drives many operations — serialization to binary and JSON,
//! deserialization, random-value generation, debug printing, conversion to
//! a dynamic object tree, and extraction of a self-describing schema.
//!
//! ## Overview
//!
//! Types describe themselves to *packers* through a small visit protocol
//! ([`Writer`] / [`Reader`] / [`Definer`]); the library ships a family of
//! packers that interpret the description:
//!
//! * **Binary codec** ([`write_binary`] / [`read_binary`]): positional,
//!   untagged, little-endian bytes.
//! * **Object tree** ([`write_object`] / [`read_object`]): a dynamic,
//!   arena-backed tree ([`Object`]) with editable handles, a merge/diff
//!   algebra ([`merge`] / [`diff`]), and JSON in and out ([`load_json`] /
//!   [`dump_json`]).
//! * **Schema machine** ([`Schema::of`], [`load_binary`]): the DEFINE-mode
//!   packer records a token stream which can later decode binary data whose
//!   static type is unknown — the only decoder here that consumes an
//!   external schema instead of a compile-time type.
//! * **Generators and printers** ([`random`], [`debug`]): a reader that
//!   invents well-formed values and a writer that renders one as text.
//!
//! The three mode traits a type implements ([`Writable`], [`Readable`],
//! [`Definable`]) must emit the same operation sequence for the same value;
//! `#[derive(Packable)]` generates all three for structs and enums.
//!
//! ## Basic usage
//!
//! ```rust
//! use packtree::{read_binary, write_binary, Packable};
//!
//! #[derive(Packable, Debug, Default, PartialEq)]
//! struct Item {
//!     count: i32,
//!     name: String,
//! }
//!
//! let item = Item { count: 5, name: "hp_potion".into() };
//! let bytes = write_binary(&item)?;
//! let back: Item = read_binary(&bytes)?;
//! assert_eq!(back, item);
//! # Ok::<(), packtree::PacktreeError>(())
//! ```
//!
//! ## Decoding without the type
//!
//! ```rust
//! use packtree::{load_binary, write_binary, Packable, Schema};
//!
//! #[derive(Packable, Default)]
//! struct Reading {
//!     sensor: u32,
//!     value: f64,
//! }
//!
//! let bytes = write_binary(&Reading { sensor: 9, value: 21.5 })?;
//! // Elsewhere, with no `Reading` in sight: decode through its schema.
//! let schema = Schema::of::<Reading>();
//! let object = load_binary(&schema, &bytes)?;
//! assert_eq!(object.at("sensor").get::<i64>()?, 9);
//! # Ok::<(), packtree::PacktreeError>(())
//! ```
//!
//! ## Saving to disk
//!
//! ```rust,ignore
//! use packtree::Packtree;
//!
//! Packtree::save("state.pkt", &item)?;
//! let back: Item = Packtree::load("state.pkt")?;
//! // Or without the type: the file embeds its schema.
//! let tree = Packtree::load_object("state.pkt")?;
//! ```
//!
//! ## Safety and error handling
//!
//! * **No panics:** no `unwrap()` or `panic!()` in the library (enforced by
//!   clippy lints); malformed input surfaces as [`PacktreeError`].
//! * **Fail-state readers:** a mid-stream mismatch records the first
//!   failure with its path and zero-fills the rest; entry points convert
//!   the flag into an error.
//! * **Single-threaded arenas:** object handles sharing one arena are not
//!   `Send`; distinct arenas and independent packers are freely parallel.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod api;
pub mod binary;
pub mod compression;
pub mod constraint;
pub mod debug;
pub mod error;
pub mod json;
pub mod label;
pub mod object;
pub mod packer;
pub mod primitive;
pub mod random;
pub mod schema;
pub mod schema_decode;

mod impls;

pub use api::Packtree;
pub use binary::{read_binary, write_binary, BinaryReader, BinaryWriter};
pub use compression::{Compressor, NoCompression};
pub use constraint::{Constraint, Validate};
pub use debug::{debug, DebugWriter};
pub use error::{ErrorKind, PacktreeError, Result};
pub use impls::Binary;
pub use json::{dump_json, load_json, read_json, write_json};
pub use label::{LabelledEnum, LabelledVariant};
pub use object::{
    diff, merge, read_object, write_object, ConstObject, FromValue, Object, ObjectReader,
    ObjectWriter, Value,
};
pub use packer::{Definable, Readable, Reader, Writable, Writer};
pub use primitive::{Primitive, PrimitiveKind};
pub use random::{random, RandomReader};
pub use schema::{tokens_end, Definer, Schema, Token};
pub use schema_decode::{load_binary, object_to_binary, transcode};

// Re-export the derive macro so it is accessible as `packtree::Packable`.
pub use packtree_derive::Packable;
