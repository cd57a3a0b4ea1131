//! Pluggable compression backend for the file facade.
//!
//! Handles the transformation of the payload section of saved files. The
//! algorithm id is stored in the file header so the read side can pick the
//! matching decompressor from the registry.

use crate::error::{PacktreeError, Result};
use std::borrow::Cow;

/// Interface for compression algorithms.
pub trait Compressor: std::fmt::Debug {
    /// The unique id stored in the file header. 0 is reserved for
    /// no-compression.
    fn id(&self) -> u8;

    /// Compresses the data.
    fn compress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>>;

    /// Decompresses the data.
    fn decompress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>>;
}

/// A compressor that performs no compression (pass-through).
#[derive(Debug, Clone, Copy)]
pub struct NoCompression;

impl Compressor for NoCompression {
    fn id(&self) -> u8 {
        0
    }

    fn compress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        Ok(Cow::Borrowed(data))
    }

    fn decompress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        Ok(Cow::Borrowed(data))
    }
}

/// LZ4 block compression with a prepended size.
#[cfg(feature = "lz4_flex")]
#[derive(Debug, Clone, Copy)]
pub struct Lz4Compressor;

#[cfg(feature = "lz4_flex")]
impl Compressor for Lz4Compressor {
    fn id(&self) -> u8 {
        1
    }

    fn compress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        Ok(Cow::Owned(lz4_flex::compress_prepend_size(data)))
    }

    fn decompress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        let bytes = lz4_flex::decompress_size_prepended(data)
            .map_err(|err| PacktreeError::Load(err.to_string()))?;
        Ok(Cow::Owned(bytes))
    }
}

/// Registry resolving header ids to algorithms.
#[derive(Debug)]
pub struct CompressorRegistry {
    algorithms: Vec<Option<Box<dyn Compressor>>>,
}

impl CompressorRegistry {
    /// Creates a registry holding the built-in algorithms.
    pub fn new() -> Self {
        let mut registry = Self {
            algorithms: (0..8).map(|_| None).collect(),
        };
        registry.register(Box::new(NoCompression));
        #[cfg(feature = "lz4_flex")]
        registry.register(Box::new(Lz4Compressor));
        registry
    }

    /// Registers an algorithm under its id.
    pub fn register(&mut self, algorithm: Box<dyn Compressor>) {
        let id = algorithm.id() as usize;
        if id >= self.algorithms.len() {
            self.algorithms.resize_with(id + 1, || None);
        }
        self.algorithms[id] = Some(algorithm);
    }

    /// Resolves an id to its algorithm.
    pub fn get(&self, id: u8) -> Result<&dyn Compressor> {
        self.algorithms
            .get(id as usize)
            .and_then(|slot| slot.as_deref())
            .ok_or_else(|| {
                PacktreeError::Load(format!(
                    "compression algorithm id {id} is not registered or available"
                ))
            })
    }
}

impl Default for CompressorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
