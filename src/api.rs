//! The file facade: self-describing saved files.
//!
//! A saved file embeds the schema of its payload, so it can be decoded two
//! ways: [`Packtree::load`] when the static type is known (the embedded
//! schema is checked against the type's), and [`Packtree::load_object`]
//! when it is not — the embedded schema drives the binary decoder and the
//! result is a dynamic object tree.
//!
//! ## File layout
//!
//! ```text
//! Offset | Size | Field       | Description
//! -------|------|-------------|------------------------------------------
//! 0      | 4    | magic       | "PKT1" (0x50 0x4B 0x54 0x31)
//! 4      | 2    | version     | format version (u16 LE, currently 1)
//! 6      | 1    | compression | payload compression id (0 = none)
//! 7      | 8    | schema_len  | byte length of the schema section (u64 LE)
//! 15     | ...  | schema      | the payload's schema, binary-encoded
//! ...    | ...  | payload     | the value, binary-encoded, compressed
//! ```
//!
//! The schema section is never compressed: the read side must parse it
//! before it knows anything else about the file.

use crate::binary::{read_binary, write_binary};
use crate::compression::{Compressor, CompressorRegistry, NoCompression};
#[cfg(feature = "lz4_flex")]
use crate::compression::Lz4Compressor;
use crate::error::{PacktreeError, Result};
use crate::object::Object;
use crate::packer::{Definable, Readable, Writable};
use crate::schema::Schema;
use crate::schema_decode::load_binary;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Magic bytes identifying the file format: "PKT1".
pub const MAGIC_BYTES: [u8; 4] = *b"PKT1";

/// Current format version.
pub const FORMAT_VERSION: u16 = 1;

/// Fixed-size prefix: magic(4) + version(2) + compression(1) + schema_len(8).
const HEADER_SIZE: usize = 15;

/// Bytes backing an opened file: an owned buffer or a memory map.
#[derive(Debug)]
enum DataSource {
    #[cfg(not(feature = "mmap"))]
    Memory(Arc<Vec<u8>>),
    #[cfg(feature = "mmap")]
    Mmap(Arc<memmap2::Mmap>),
}

impl std::ops::Deref for DataSource {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            #[cfg(not(feature = "mmap"))]
            Self::Memory(bytes) => bytes.as_ref(),
            #[cfg(feature = "mmap")]
            Self::Mmap(mmap) => mmap.as_ref(),
        }
    }
}

/// The packtree file facade.
#[derive(Debug, Default)]
pub struct Packtree {
    use_compression: bool,
}

impl Packtree {
    /// Starts building a facade with non-default settings.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Enables payload compression (LZ4 when the `lz4_flex` feature is on,
    /// pass-through otherwise).
    pub fn compression(mut self, enable: bool) -> Self {
        self.use_compression = enable;
        self
    }

    /// Saves a value with default settings.
    pub fn save<T, P>(path: P, value: &T) -> Result<()>
    where
        T: Writable + Definable,
        P: AsRef<Path>,
    {
        Self::default().write(path, value)
    }

    /// Saves a value with this facade's settings.
    pub fn write<T, P>(&self, path: P, value: &T) -> Result<()>
    where
        T: Writable + Definable,
        P: AsRef<Path>,
    {
        let compressor: Box<dyn Compressor> = if self.use_compression {
            #[cfg(feature = "lz4_flex")]
            {
                Box::new(Lz4Compressor)
            }
            #[cfg(not(feature = "lz4_flex"))]
            {
                Box::new(NoCompression)
            }
        } else {
            Box::new(NoCompression)
        };

        let schema_bytes = write_binary(&Schema::of::<T>())?;
        let payload = write_binary(value)?;
        let payload = compressor.compress(&payload)?;

        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&MAGIC_BYTES)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        writer.write_all(&[compressor.id()])?;
        writer.write_all(&(schema_bytes.len() as u64).to_le_bytes())?;
        writer.write_all(&schema_bytes)?;
        writer.write_all(&payload)?;
        writer.flush()?;
        Ok(())
    }

    /// Loads a value of a known type, verifying the embedded schema
    /// matches the type's own.
    pub fn load<T, P>(path: P) -> Result<T>
    where
        T: Readable + Definable + Default,
        P: AsRef<Path>,
    {
        let source = open(path.as_ref())?;
        let (schema, payload) = parse(&source)?;
        if schema != Schema::of::<T>() {
            return Err(PacktreeError::Load(
                "embedded schema does not match the requested type".to_owned(),
            ));
        }
        read_binary(&payload)
    }

    /// Loads a file whose static type is unknown, decoding the payload
    /// through the embedded schema into an object tree.
    pub fn load_object<P>(path: P) -> Result<Object>
    where
        P: AsRef<Path>,
    {
        let source = open(path.as_ref())?;
        let (schema, payload) = parse(&source)?;
        load_binary(&schema, &payload)
    }
}

fn open(path: &Path) -> Result<DataSource> {
    let file = File::open(path)?;

    #[cfg(feature = "mmap")]
    {
        #[allow(unsafe_code)]
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Ok(DataSource::Mmap(Arc::new(mmap)))
    }

    #[cfg(not(feature = "mmap"))]
    {
        use std::io::Read;

        let mut file = file;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(DataSource::Memory(Arc::new(buffer)))
    }
}

fn parse(source: &DataSource) -> Result<(Schema, Vec<u8>)> {
    let data: &[u8] = source;
    if data.len() < HEADER_SIZE {
        return Err(PacktreeError::Load("file smaller than its header".to_owned()));
    }
    if data[0..4] != MAGIC_BYTES {
        return Err(PacktreeError::Load("bad magic bytes".to_owned()));
    }
    let version = u16::from_le_bytes([data[4], data[5]]);
    if version != FORMAT_VERSION {
        return Err(PacktreeError::Load(format!(
            "unsupported format version {version}"
        )));
    }
    let compression_id = data[6];
    let schema_len = u64::from_le_bytes(
        data[7..15]
            .try_into()
            .map_err(|_| PacktreeError::Load("truncated header".to_owned()))?,
    );
    let schema_len = usize::try_from(schema_len)
        .map_err(|_| PacktreeError::Load("schema length overflow".to_owned()))?;
    let payload_start = HEADER_SIZE
        .checked_add(schema_len)
        .ok_or_else(|| PacktreeError::Load("schema length overflow".to_owned()))?;
    if payload_start > data.len() {
        return Err(PacktreeError::Load("truncated schema section".to_owned()));
    }

    let schema: Schema = read_binary(&data[HEADER_SIZE..payload_start])?;

    let registry = CompressorRegistry::new();
    let compressor = registry.get(compression_id)?;
    let payload = compressor.decompress(&data[payload_start..])?.into_owned();

    Ok((schema, payload))
}
