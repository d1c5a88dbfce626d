//! The compression capability the writer and reader delegate to.
//!
//! Mirrors the teacher crate's `Codec` trait (`compress_block` /
//! `decompress_block`, keyed by a numeric id), generalized to the two
//! operations spec'd here (`compress` / `decompress_stream`) and keyed by the
//! fully qualified class name the on-disk format persists.

use std::io::Read;
use std::sync::Arc;

use crate::error::Result;

/// Core compression abstraction. Implementations must be able to
/// compress/decompress independent buffers — the format never asks a codec
/// to carry state across calls.
pub trait Codec: Send + Sync {
    /// Fully qualified class name persisted in the header (version ≥ 5) and
    /// used to resolve the matching codec on read.
    fn class_name(&self) -> &'static str;

    /// Compress an independent buffer.
    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>>;

    /// Wrap `data` (compressed bytes already read from the file) as a
    /// decompressing stream. Takes ownership of `data` so the returned
    /// reader can own its buffer without borrowing from the caller.
    fn decompress_stream(&self, data: Vec<u8>) -> Result<Box<dyn Read>>;
}

/// Resolves a persisted codec class name to a concrete [`Codec`], the way
/// [`crate::registry::ClassRegistry`] resolves key/value class names to
/// [`crate::writable::Writable`] constructors.
pub trait CodecRegistry: Send + Sync {
    fn resolve(&self, class_name: &str) -> Result<Arc<dyn Codec>>;
}
