//! Pluggable compression backend for container bodies.
//!
//! The whole body (type table, shared count, main graph and shared payloads)
//! is compressed as a single block. The header carries the decompressed
//! length, so the block format itself does not prepend one.

use crate::error::{ContentError, Result};
use std::borrow::Cow;

/// Interface for body compression algorithms.
pub trait Compressor: Send + Sync + std::fmt::Debug {
    /// Compresses the data.
    ///
    /// Returns a `Cow<[u8]>` which may borrow the input if no compression is
    /// performed.
    fn compress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>>;

    /// Decompresses `data` into exactly `decompressed_len` bytes.
    fn decompress<'a>(&self, data: &'a [u8], decompressed_len: usize) -> Result<Cow<'a, [u8]>>;
}

// --- No Compression (Pass-through) ---

/// A compressor that performs no compression (pass-through).
#[derive(Debug, Clone, Copy)]
pub struct NoCompression;

impl Compressor for NoCompression {
    fn compress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        Ok(Cow::Borrowed(data))
    }

    fn decompress<'a>(&self, data: &'a [u8], decompressed_len: usize) -> Result<Cow<'a, [u8]>> {
        if data.len() != decompressed_len {
            return Err(ContentError::Compression(format!(
                "expected {decompressed_len} bytes, found {}",
                data.len()
            )));
        }
        Ok(Cow::Borrowed(data))
    }
}

// --- LZ4 Implementation ---

#[cfg(feature = "lz4_flex")]
/// A compressor using the LZ4 block format.
///
/// This compressor is available when the `lz4_flex` feature is enabled.
#[derive(Debug, Clone, Copy)]
pub struct Lz4Compressor;

#[cfg(feature = "lz4_flex")]
impl Compressor for Lz4Compressor {
    fn compress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        Ok(Cow::Owned(lz4_flex::block::compress(data)))
    }

    fn decompress<'a>(&self, data: &'a [u8], decompressed_len: usize) -> Result<Cow<'a, [u8]>> {
        let vec = lz4_flex::block::decompress(data, decompressed_len)
            .map_err(|e| ContentError::Compression(e.to_string()))?;
        if vec.len() != decompressed_len {
            return Err(ContentError::Compression(format!(
                "expected {decompressed_len} decompressed bytes, got {}",
                vec.len()
            )));
        }
        Ok(Cow::Owned(vec))
    }
}

/// Returns the compressor that handles compressed container bodies.
///
/// # Errors
/// Returns `ContentError::Compression` when the crate was built without an
/// LZ4 backend.
pub fn body_compressor() -> Result<&'static dyn Compressor> {
    #[cfg(feature = "lz4_flex")]
    {
        Ok(&Lz4Compressor)
    }
    #[cfg(not(feature = "lz4_flex"))]
    {
        Err(ContentError::Compression(
            "LZ4 support is not compiled in (enable the `lz4_flex` feature)".into(),
        ))
    }
}
