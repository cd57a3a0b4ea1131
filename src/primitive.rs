//! The primitive vocabulary shared by every packer.

/// The primitive kinds a value site can carry.
///
/// Every kind except `Str` has a fixed encoded size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 32-bit unsigned integer.
    U32,
    /// 64-bit unsigned integer.
    U64,
    /// 32-bit IEEE float.
    F32,
    /// 64-bit IEEE float.
    F64,
    /// UTF-8 string, variable size.
    Str,
    /// Boolean, one byte on the wire.
    Bool,
}

impl PrimitiveKind {
    /// Encoded size in bytes, `None` for the variable-size `Str`.
    pub fn size(&self) -> Option<usize> {
        match self {
            Self::I32 | Self::U32 | Self::F32 => Some(4),
            Self::I64 | Self::U64 | Self::F64 => Some(8),
            Self::Bool => Some(1),
            Self::Str => None,
        }
    }
}

/// A numeric primitive value moving through the `primitive` channel.
///
/// Strings and booleans travel on their own channels and do not appear here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    /// 32-bit signed integer.
    I32(i32),
    /// 64-bit signed integer.
    I64(i64),
    /// 32-bit unsigned integer.
    U32(u32),
    /// 64-bit unsigned integer.
    U64(u64),
    /// 32-bit IEEE float.
    F32(f32),
    /// 64-bit IEEE float.
    F64(f64),
}

impl Primitive {
    /// The kind tag of this value.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::I32(_) => PrimitiveKind::I32,
            Self::I64(_) => PrimitiveKind::I64,
            Self::U32(_) => PrimitiveKind::U32,
            Self::U64(_) => PrimitiveKind::U64,
            Self::F32(_) => PrimitiveKind::F32,
            Self::F64(_) => PrimitiveKind::F64,
        }
    }

    /// A zero value of the given kind, used by readers in the fail state.
    pub fn zero(kind: PrimitiveKind) -> Primitive {
        match kind {
            PrimitiveKind::I32 => Self::I32(0),
            PrimitiveKind::I64 => Self::I64(0),
            PrimitiveKind::U32 => Self::U32(0),
            PrimitiveKind::U64 => Self::U64(0),
            PrimitiveKind::F32 => Self::F32(0.0),
            PrimitiveKind::F64 => Self::F64(0.0),
            // Str and Bool never travel on the primitive channel.
            PrimitiveKind::Str | PrimitiveKind::Bool => Self::I64(0),
        }
    }
}
