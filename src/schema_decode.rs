//! Schema-driven transcoding: replaying a recorded traversal over a
//! reader/writer pair.
//!
//! [`load_binary`] decodes bytes whose static type is unknown by co-driving
//! a [`BinaryReader`] and an [`ObjectWriter`] across a [`Schema`];
//! [`object_to_binary`] is the inverse driver. Both run on the same engine:
//! an explicit stack of frames, one per open container, each naming the
//! `[begin, end)` token range to replay for its children. The explicit
//! stack keeps stack usage bounded for deep schemas and makes the token
//! position arithmetic plain index math.

use crate::binary::{BinaryReader, BinaryWriter};
use crate::error::{ErrorKind, PacktreeError, Result};
use crate::object::{ConstObject, Object, ObjectReader, ObjectWriter};
use crate::packer::{Reader, Writer};
use crate::schema::{tokens_end, Schema, Token};

/// Decodes binary bytes into an object tree using the schema recorded for
/// their type. Fails with a load error on the first disagreement between
/// schema and bytes; partial output is discarded.
pub fn load_binary(schema: &Schema, bytes: &[u8]) -> Result<Object> {
    let mut reader = BinaryReader::new(bytes);
    let mut writer = ObjectWriter::new();
    transcode(schema, &mut reader, &mut writer)?;
    writer
        .into_object()
        .map_err(|err| PacktreeError::Load(err.to_string()))
}

/// Encodes an object tree into binary bytes using the schema recorded for
/// its type.
pub fn object_to_binary(schema: &Schema, object: &ConstObject) -> Result<Vec<u8>> {
    let mut reader = ObjectReader::new(object.clone());
    let mut writer = BinaryWriter::new();
    transcode(schema, &mut reader, &mut writer)?;
    writer.into_bytes()
}

enum Frame {
    /// Object/tuple body: plain dispatch until the matching end token.
    None,
    Map {
        begin: usize,
        end: usize,
    },
    List {
        begin: usize,
        end: usize,
    },
    Optional {
        begin: usize,
        end: usize,
        done: bool,
    },
    Variant {
        begin: usize,
        end: usize,
        done: bool,
    },
}

fn invalid_schema(detail: &str) -> PacktreeError {
    PacktreeError::Load(format!("{}: {detail}", ErrorKind::InvalidSchema))
}

/// Drives `reader` and `writer` in lockstep across one full traversal
/// described by `schema`.
pub fn transcode<R: Reader, W: Writer>(
    schema: &Schema,
    reader: &mut R,
    writer: &mut W,
) -> Result<()> {
    let tokens = &schema.tokens;
    let mut frames: Vec<Frame> = vec![Frame::None];
    let mut pos = 0usize;

    loop {
        if let Some(message) = reader.failure() {
            return Err(PacktreeError::Load(message));
        }

        // Consult the innermost special frame. Each child subtree is either
        // a single token or pushes its own frame, so control returns here
        // exactly between children.
        match frames.last_mut() {
            None => return Err(invalid_schema("frame stack underflow")),
            Some(Frame::None) => {}
            Some(Frame::Map { begin, end }) => {
                let (begin, end) = (*begin, *end);
                match reader.map_next() {
                    Some(key) => {
                        writer.map_next(&key);
                        pos = begin;
                    }
                    None => {
                        reader.map_end();
                        writer.map_end();
                        pos = end;
                        frames.pop();
                        continue;
                    }
                }
            }
            Some(Frame::List { begin, end }) => {
                let (begin, end) = (*begin, *end);
                if reader.list_next() {
                    writer.list_next();
                    pos = begin;
                } else {
                    reader.list_end();
                    writer.list_end();
                    pos = end;
                    frames.pop();
                    continue;
                }
            }
            Some(Frame::Optional { begin, end, done }) => {
                let (begin, end) = (*begin, *end);
                if *done {
                    reader.optional_end();
                    writer.optional_end();
                    pos = end;
                    frames.pop();
                    continue;
                }
                *done = true;
                let present = reader.optional_begin();
                writer.optional_begin(present);
                if present {
                    pos = begin;
                } else {
                    reader.optional_end();
                    writer.optional_end();
                    pos = end;
                    frames.pop();
                    continue;
                }
            }
            Some(Frame::Variant { begin, end, done }) => {
                let (begin, end) = (*begin, *end);
                if *done {
                    reader.variant_end();
                    writer.variant_end();
                    pos = end;
                    frames.pop();
                    continue;
                }
                *done = true;
                pos = begin;
            }
        }

        // The trivial hint is not honored when one side is an object tree,
        // so its brackets are transparent: dispatch always lands on a token
        // that either completes the pending subtree or opens a frame.
        while matches!(
            tokens.get(pos),
            Some(Token::TrivialBegin { .. } | Token::TrivialEnd { .. })
        ) {
            pos += 1;
        }

        if pos == tokens.len() {
            break;
        }
        let Some(token) = tokens.get(pos) else {
            return Err(invalid_schema("token position out of range"));
        };
        pos += 1;

        match token {
            Token::I32 | Token::I64 | Token::U32 | Token::U64 | Token::F32 | Token::F64 => {
                let kind = match token {
                    Token::I32 => crate::PrimitiveKind::I32,
                    Token::I64 => crate::PrimitiveKind::I64,
                    Token::U32 => crate::PrimitiveKind::U32,
                    Token::U64 => crate::PrimitiveKind::U64,
                    Token::F32 => crate::PrimitiveKind::F32,
                    _ => crate::PrimitiveKind::F64,
                };
                let value = reader.primitive(kind);
                writer.primitive(value);
            }
            Token::Str => {
                let value = reader.string();
                writer.string(&value);
            }
            Token::Bool => {
                let value = reader.boolean();
                writer.boolean(value);
            }
            Token::Enumerate(labels) => {
                let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
                let index = reader.enumerate(&refs);
                writer.enumerate(index, &refs);
            }
            Token::BinaryData { stride } => {
                let stride = *stride as usize;
                let size = reader.binary_size(stride);
                let mut buffer = vec![0u8; size];
                reader.binary_data(&mut buffer);
                writer.binary(&buffer, stride);
            }
            Token::ObjectBegin => {
                reader.object_begin();
                writer.object_begin();
                frames.push(Frame::None);
            }
            Token::ObjectEnd => {
                reader.object_end();
                writer.object_end();
                frames.pop();
            }
            Token::ObjectNext(key) => {
                reader.object_next(key);
                writer.object_next(key);
            }
            Token::TupleBegin => {
                reader.tuple_begin();
                writer.tuple_begin();
                frames.push(Frame::None);
            }
            Token::TupleEnd => {
                reader.tuple_end();
                writer.tuple_end();
                frames.pop();
            }
            Token::TupleNext => {
                reader.tuple_next();
                writer.tuple_next();
            }
            Token::Map => {
                reader.map_begin();
                writer.map_begin();
                frames.push(Frame::Map {
                    begin: pos,
                    end: tokens_end(tokens, pos)?,
                });
            }
            Token::List => {
                reader.list_begin();
                writer.list_begin();
                frames.push(Frame::List {
                    begin: pos,
                    end: tokens_end(tokens, pos)?,
                });
            }
            Token::Optional => {
                frames.push(Frame::Optional {
                    begin: pos,
                    end: tokens_end(tokens, pos)?,
                    done: false,
                });
            }
            Token::VariantBegin(labels) => {
                let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
                reader.variant_begin(&refs);

                let mut arm_begin: Option<usize> = None;
                loop {
                    match tokens.get(pos) {
                        Some(Token::VariantNext(label)) => {
                            pos += 1;
                            if reader.variant_match(label) {
                                if arm_begin.is_some() {
                                    return Err(PacktreeError::Load(format!(
                                        "{}: {label}",
                                        ErrorKind::RepeatedVariantLabel
                                    )));
                                }
                                arm_begin = Some(pos);
                                writer.variant_begin(label, &refs);
                            }
                            pos = tokens_end(tokens, pos)?;
                        }
                        Some(Token::VariantEnd) => {
                            pos += 1;
                            break;
                        }
                        _ => return Err(invalid_schema("expected variant_next or variant_end")),
                    }
                }

                let Some(begin) = arm_begin else {
                    if let Some(message) = reader.failure() {
                        return Err(PacktreeError::Load(message));
                    }
                    return Err(PacktreeError::Load(format!(
                        "{}: none of the schema arms matched",
                        ErrorKind::NoMatchingVariant
                    )));
                };
                frames.push(Frame::Variant {
                    begin,
                    end: pos,
                    done: false,
                });
            }
            Token::VariantEnd | Token::VariantNext(_) => {
                return Err(invalid_schema("variant token outside a variant"));
            }
            Token::TrivialBegin { .. } | Token::TrivialEnd { .. } => {
                // Already skipped above; unreachable in a well-formed pass.
            }
        }

        if pos == tokens.len() && matches!(frames.last(), Some(Frame::None)) && frames.len() == 1 {
            break;
        }
    }

    if let Some(message) = reader.failure() {
        return Err(PacktreeError::Load(message));
    }
    if let Some(message) = writer.failure() {
        return Err(PacktreeError::Load(message));
    }
    Ok(())
}
