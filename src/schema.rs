//! The schema token stream: one recorded traversal of a type.
//!
//! Running a type's [`Definable`] description through the [`Definer`] packer
//! yields a [`Schema`], a linear token sequence capturing exactly one
//! depth-first traversal. The stream is self-delimiting: [`tokens_end`]
//! finds the end of any subtree by depth counting, which is what lets the
//! schema-driven binary decoder replay container bodies. A schema is itself
//! a packable value — each [`Token`] is a labelled variant — so schemas can
//! be persisted through any codec, including the binary codec they drive.

use crate::error::{ErrorKind, PacktreeError, Result};
use crate::label::LabelledVariant;
use crate::packer::{Definable, Readable, Reader, Writable, Writer};
use crate::primitive::PrimitiveKind;

/// One element of the schema alphabet.
///
/// Equality is structural over payloads. `Optional`, `List` and `Map` are
/// prefixes that consume the single subtree following them; the `Begin`
/// tokens pair with their `End` at equal depth.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// 32-bit signed integer site.
    I32,
    /// 64-bit signed integer site.
    I64,
    /// 32-bit unsigned integer site.
    U32,
    /// 64-bit unsigned integer site.
    U64,
    /// 32-bit float site.
    F32,
    /// 64-bit float site.
    F64,
    /// String site.
    Str,
    /// Boolean site.
    Bool,
    /// Option prefix; the subtree that follows is the present value.
    Optional,
    /// Labelled enum site with its label table.
    Enumerate(Vec<String>),
    /// Opens a choice over the given label table.
    VariantBegin(Vec<String>),
    /// Closes a choice.
    VariantEnd,
    /// Introduces one arm; followed by exactly one value subtree.
    VariantNext(String),
    /// Raw byte payload site. `stride` is the packed element size, zero for
    /// opaque bytes; the decoder needs it because the wire stores an element
    /// count when strided.
    BinaryData {
        /// Packed element size in bytes; zero for opaque bytes.
        stride: u64,
    },
    /// Opens a region whose encoding equals a flat POD of `size` bytes.
    TrivialBegin {
        /// Flat size of the region in bytes.
        size: u64,
    },
    /// Closes a trivial region.
    TrivialEnd {
        /// Flat size of the region in bytes.
        size: u64,
    },
    /// Opens a keyed record.
    ObjectBegin,
    /// Closes a keyed record.
    ObjectEnd,
    /// Introduces the next record field.
    ObjectNext(String),
    /// Opens a positional record.
    TupleBegin,
    /// Closes a positional record.
    TupleEnd,
    /// Introduces the next positional element.
    TupleNext,
    /// Sequence prefix; the subtree that follows is the element shape.
    List,
    /// Mapping prefix; keys are strings, the subtree is the value shape.
    Map,
}

/// An ordered token sequence describing one traversal of a type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    /// The tokens, in traversal order.
    pub tokens: Vec<Token>,
}

impl Schema {
    /// Records the schema of a definable type.
    pub fn of<T: Definable>() -> Schema {
        let mut definer = Definer::new();
        T::define(&mut definer);
        definer.into_schema()
    }
}

/// Returns the position just past the subtree rooted at `begin`.
///
/// Counts `Begin`/`End` depth, treating `Optional`, `List` and `Map` as
/// consume-next-subtree prefixes and `TrivialBegin`/`TrivialEnd` as a
/// bracket pair. Fails with an `invalid schema` error when the stream ends
/// inside the subtree.
pub fn tokens_end(tokens: &[Token], begin: usize) -> Result<usize> {
    let mut pos = begin;
    let mut depth = 0usize;
    loop {
        if depth == 0 && pos != begin {
            return Ok(pos);
        }
        let Some(token) = tokens.get(pos) else {
            return Err(PacktreeError::Load(format!(
                "{}: token stream ends inside a subtree",
                ErrorKind::InvalidSchema
            )));
        };
        pos += 1;

        match token {
            // Prefixes: another value follows, so the subtree cannot end
            // here even at depth zero.
            Token::Optional | Token::List | Token::Map => continue,
            Token::ObjectBegin
            | Token::TupleBegin
            | Token::VariantBegin(_)
            | Token::TrivialBegin { .. } => {
                depth += 1;
                continue;
            }
            Token::ObjectEnd | Token::TupleEnd | Token::VariantEnd | Token::TrivialEnd { .. } => {
                if depth == 0 {
                    return Err(PacktreeError::Load(format!(
                        "{}: unbalanced container end",
                        ErrorKind::InvalidSchema
                    )));
                }
                depth -= 1;
            }
            // Remaining tokens are values: inside a container the depth is
            // unchanged, at depth zero they complete the subtree.
            _ => {}
        }

        if depth == 0 {
            return Ok(pos);
        }
    }
}

/// The DEFINE-mode packer: records every operation it receives as a token.
#[derive(Debug, Default)]
pub struct Definer {
    tokens: Vec<Token>,
}

impl Definer {
    /// Creates an empty definer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the definer, yielding the recorded schema.
    pub fn into_schema(self) -> Schema {
        Schema {
            tokens: self.tokens,
        }
    }

    /// Records a numeric primitive site.
    pub fn primitive(&mut self, kind: PrimitiveKind) {
        let token = match kind {
            PrimitiveKind::I32 => Token::I32,
            PrimitiveKind::I64 => Token::I64,
            PrimitiveKind::U32 => Token::U32,
            PrimitiveKind::U64 => Token::U64,
            PrimitiveKind::F32 => Token::F32,
            PrimitiveKind::F64 => Token::F64,
            PrimitiveKind::Str => Token::Str,
            PrimitiveKind::Bool => Token::Bool,
        };
        self.tokens.push(token);
    }

    /// Records a string site.
    pub fn string(&mut self) {
        self.tokens.push(Token::Str);
    }

    /// Records a boolean site.
    pub fn boolean(&mut self) {
        self.tokens.push(Token::Bool);
    }

    /// Records a labelled enum site.
    pub fn enumerate(&mut self, labels: &[&str]) {
        self.tokens
            .push(Token::Enumerate(labels.iter().map(|l| l.to_string()).collect()));
    }

    /// Records an option prefix; the present value's subtree follows.
    pub fn optional(&mut self) {
        self.tokens.push(Token::Optional);
    }

    /// Opens a choice over the label table.
    pub fn variant_begin(&mut self, labels: &[&str]) {
        self.tokens
            .push(Token::VariantBegin(labels.iter().map(|l| l.to_string()).collect()));
    }

    /// Introduces one arm; its value subtree follows.
    pub fn variant_next(&mut self, label: &str) {
        self.tokens.push(Token::VariantNext(label.to_string()));
    }

    /// Closes a choice.
    pub fn variant_end(&mut self) {
        self.tokens.push(Token::VariantEnd);
    }

    /// Records a binary payload site.
    pub fn binary(&mut self, stride: usize) {
        self.tokens.push(Token::BinaryData {
            stride: stride as u64,
        });
    }

    /// Opens a keyed record.
    pub fn object_begin(&mut self) {
        self.tokens.push(Token::ObjectBegin);
    }

    /// Closes a keyed record.
    pub fn object_end(&mut self) {
        self.tokens.push(Token::ObjectEnd);
    }

    /// Introduces the next record field.
    pub fn object_next(&mut self, key: &str) {
        self.tokens.push(Token::ObjectNext(key.to_string()));
    }

    /// Opens a positional record.
    pub fn tuple_begin(&mut self) {
        self.tokens.push(Token::TupleBegin);
    }

    /// Closes a positional record.
    pub fn tuple_end(&mut self) {
        self.tokens.push(Token::TupleEnd);
    }

    /// Introduces the next positional element.
    pub fn tuple_next(&mut self) {
        self.tokens.push(Token::TupleNext);
    }

    /// Records a sequence prefix; the element subtree follows.
    pub fn list(&mut self) {
        self.tokens.push(Token::List);
    }

    /// Records a mapping prefix; the value subtree follows.
    pub fn map(&mut self) {
        self.tokens.push(Token::Map);
    }

    /// Opens a trivial region of the given flat size.
    pub fn trivial_begin(&mut self, size: usize) {
        self.tokens.push(Token::TrivialBegin { size: size as u64 });
    }

    /// Closes a trivial region.
    pub fn trivial_end(&mut self, size: usize) {
        self.tokens.push(Token::TrivialEnd { size: size as u64 });
    }

    /// Records one keyed field: `object_next(key)` followed by the field
    /// type's shape.
    pub fn value<T: Definable>(&mut self, key: &str) {
        self.object_next(key);
        T::define(self);
    }
}

// --- Schema self-encoding ---
//
// A schema is a value like any other: Token is a labelled variant whose unit
// arms carry an empty object, and Schema is a one-field object holding the
// token list.

const TOKEN_LABELS: &[&str] = &[
    "i32",
    "i64",
    "u32",
    "u64",
    "f32",
    "f64",
    "string",
    "boolean",
    "optional",
    "enumerate",
    "variant_begin",
    "variant_end",
    "variant_next",
    "binary_data",
    "trivial_begin",
    "trivial_end",
    "object_begin",
    "object_end",
    "object_next",
    "tuple_begin",
    "tuple_end",
    "tuple_next",
    "list",
    "map",
];

impl LabelledVariant for Token {
    fn labels() -> &'static [&'static str] {
        TOKEN_LABELS
    }

    fn label(&self) -> &'static str {
        match self {
            Token::I32 => "i32",
            Token::I64 => "i64",
            Token::U32 => "u32",
            Token::U64 => "u64",
            Token::F32 => "f32",
            Token::F64 => "f64",
            Token::Str => "string",
            Token::Bool => "boolean",
            Token::Optional => "optional",
            Token::Enumerate(_) => "enumerate",
            Token::VariantBegin(_) => "variant_begin",
            Token::VariantEnd => "variant_end",
            Token::VariantNext(_) => "variant_next",
            Token::BinaryData { .. } => "binary_data",
            Token::TrivialBegin { .. } => "trivial_begin",
            Token::TrivialEnd { .. } => "trivial_end",
            Token::ObjectBegin => "object_begin",
            Token::ObjectEnd => "object_end",
            Token::ObjectNext(_) => "object_next",
            Token::TupleBegin => "tuple_begin",
            Token::TupleEnd => "tuple_end",
            Token::TupleNext => "tuple_next",
            Token::List => "list",
            Token::Map => "map",
        }
    }
}

fn write_empty_body<W: Writer>(writer: &mut W) {
    writer.object_begin();
    writer.object_end();
}

fn write_labels_body<W: Writer>(writer: &mut W, labels: &Vec<String>) {
    writer.object_begin();
    writer.value("labels", labels);
    writer.object_end();
}

fn write_u64_body<W: Writer>(writer: &mut W, key: &str, value: u64) {
    writer.object_begin();
    writer.value(key, &value);
    writer.object_end();
}

fn write_str_body<W: Writer>(writer: &mut W, key: &str, value: &String) {
    writer.object_begin();
    writer.value(key, value);
    writer.object_end();
}

impl Writable for Token {
    fn write<W: Writer>(&self, writer: &mut W) {
        writer.variant_begin(self.label(), Self::labels());
        match self {
            Token::Enumerate(labels) | Token::VariantBegin(labels) => {
                write_labels_body(writer, labels)
            }
            Token::VariantNext(label) => write_str_body(writer, "type", label),
            Token::ObjectNext(key) => write_str_body(writer, "key", key),
            Token::BinaryData { stride } => write_u64_body(writer, "stride", *stride),
            Token::TrivialBegin { size } => write_u64_body(writer, "size", *size),
            Token::TrivialEnd { size } => write_u64_body(writer, "size", *size),
            _ => write_empty_body(writer),
        }
        writer.variant_end();
    }
}

fn read_empty_body<R: Reader>(reader: &mut R) {
    reader.object_begin();
    reader.object_end();
}

fn read_labels_body<R: Reader>(reader: &mut R) -> Vec<String> {
    let mut labels = Vec::new();
    reader.object_begin();
    reader.value("labels", &mut labels);
    reader.object_end();
    labels
}

fn read_u64_body<R: Reader>(reader: &mut R, key: &str) -> u64 {
    let mut value = 0u64;
    reader.object_begin();
    reader.value(key, &mut value);
    reader.object_end();
    value
}

fn read_str_body<R: Reader>(reader: &mut R, key: &str) -> String {
    let mut value = String::new();
    reader.object_begin();
    reader.value(key, &mut value);
    reader.object_end();
    value
}

impl Readable for Token {
    fn read<R: Reader>(&mut self, reader: &mut R) {
        reader.variant_begin(Self::labels());
        let mut matched = false;
        for &label in Self::labels() {
            if matched && !reader.is_exhaustive() {
                break;
            }
            if !reader.variant_match(label) {
                continue;
            }
            matched = true;
            *self = match label {
                "i32" => {
                    read_empty_body(reader);
                    Token::I32
                }
                "i64" => {
                    read_empty_body(reader);
                    Token::I64
                }
                "u32" => {
                    read_empty_body(reader);
                    Token::U32
                }
                "u64" => {
                    read_empty_body(reader);
                    Token::U64
                }
                "f32" => {
                    read_empty_body(reader);
                    Token::F32
                }
                "f64" => {
                    read_empty_body(reader);
                    Token::F64
                }
                "string" => {
                    read_empty_body(reader);
                    Token::Str
                }
                "boolean" => {
                    read_empty_body(reader);
                    Token::Bool
                }
                "optional" => {
                    read_empty_body(reader);
                    Token::Optional
                }
                "enumerate" => Token::Enumerate(read_labels_body(reader)),
                "variant_begin" => Token::VariantBegin(read_labels_body(reader)),
                "variant_end" => {
                    read_empty_body(reader);
                    Token::VariantEnd
                }
                "variant_next" => Token::VariantNext(read_str_body(reader, "type")),
                "binary_data" => Token::BinaryData {
                    stride: read_u64_body(reader, "stride"),
                },
                "trivial_begin" => Token::TrivialBegin {
                    size: read_u64_body(reader, "size"),
                },
                "trivial_end" => Token::TrivialEnd {
                    size: read_u64_body(reader, "size"),
                },
                "object_begin" => {
                    read_empty_body(reader);
                    Token::ObjectBegin
                }
                "object_end" => {
                    read_empty_body(reader);
                    Token::ObjectEnd
                }
                "object_next" => Token::ObjectNext(read_str_body(reader, "key")),
                "tuple_begin" => {
                    read_empty_body(reader);
                    Token::TupleBegin
                }
                "tuple_end" => {
                    read_empty_body(reader);
                    Token::TupleEnd
                }
                "tuple_next" => {
                    read_empty_body(reader);
                    Token::TupleNext
                }
                "list" => {
                    read_empty_body(reader);
                    Token::List
                }
                "map" => {
                    read_empty_body(reader);
                    Token::Map
                }
                _ => Token::I32,
            };
        }
        if !matched && !reader.is_exhaustive() {
            reader.error(&format!(
                "{}: token variant",
                ErrorKind::NoMatchingVariant
            ));
        }
        reader.variant_end();
    }
}

fn define_empty_body(definer: &mut Definer) {
    definer.object_begin();
    definer.object_end();
}

fn define_labels_body(definer: &mut Definer) {
    definer.object_begin();
    definer.value::<Vec<String>>("labels");
    definer.object_end();
}

fn define_u64_body(definer: &mut Definer, key: &str) {
    definer.object_begin();
    definer.value::<u64>(key);
    definer.object_end();
}

fn define_str_body(definer: &mut Definer, key: &str) {
    definer.object_begin();
    definer.value::<String>(key);
    definer.object_end();
}

impl Definable for Token {
    fn define(definer: &mut Definer) {
        definer.variant_begin(Self::labels());
        for &label in Self::labels() {
            definer.variant_next(label);
            match label {
                "enumerate" | "variant_begin" => define_labels_body(definer),
                "variant_next" => define_str_body(definer, "type"),
                "object_next" => define_str_body(definer, "key"),
                "binary_data" => define_u64_body(definer, "stride"),
                "trivial_begin" | "trivial_end" => define_u64_body(definer, "size"),
                _ => define_empty_body(definer),
            }
        }
        definer.variant_end();
    }
}

impl Default for Token {
    fn default() -> Self {
        Token::I32
    }
}

impl Writable for Schema {
    fn write<W: Writer>(&self, writer: &mut W) {
        writer.object_begin();
        writer.value("tokens", &self.tokens);
        writer.object_end();
    }
}

impl Readable for Schema {
    fn read<R: Reader>(&mut self, reader: &mut R) {
        reader.object_begin();
        reader.value("tokens", &mut self.tokens);
        reader.object_end();
    }
}

impl Definable for Schema {
    fn define(definer: &mut Definer) {
        definer.object_begin();
        definer.object_next("tokens");
        definer.list();
        Token::define(definer);
        definer.object_end();
    }
}
