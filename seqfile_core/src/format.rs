//! On-disk constants and the compression-mode enum.
//!
//! Mirrors the layout the reference "sequence file" platform writes, so a
//! conforming [`crate::writer::Writer`]/[`crate::reader::Reader`] pair can
//! interoperate bit-for-bit with files produced by that platform.

use std::fmt;

/// File magic: the literal bytes `S`, `E`, `Q`. The version byte follows
/// immediately after and is not part of the magic itself.
pub const MAGIC: &[u8; 3] = b"SEQ";

/// Current writer version. This implementation emits only version 6
/// (header + metadata block).
pub const CURRENT_VERSION: u8 = 6;

/// Oldest on-disk version this implementation can read. Versions below 4
/// used a deprecated UTF8-class key/value encoding and are deliberately
/// unsupported.
pub const MIN_SUPPORTED_VERSION: u8 = 4;

/// 4-byte escape sentinel that precedes every body sync marker: the signed
/// value `-1`, impossible as a record length (always non-negative), so a
/// scanning reader can find sync markers unambiguously.
pub const SYNC_ESCAPE: i32 = -1;

/// Size in bytes of the random sync tag.
pub const SYNC_HASH_SIZE: usize = 16;

/// Full on-disk size of one sync marker: the 4-byte escape plus the 16-byte tag.
pub const SYNC_SIZE: u64 = 4 + SYNC_HASH_SIZE as u64;

/// The writer emits a sync whenever the stream position reaches
/// `last_sync + SYNC_INTERVAL` at an append boundary.
pub const SYNC_INTERVAL: u64 = 100 * SYNC_SIZE;

/// Block mode flushes once the uncompressed keys+values gathered so far reach
/// this many bytes.
pub const COMPRESSION_BLOCK_SIZE: usize = 1_000_000;

/// Prefix applied verbatim to persisted key/value class names.
pub const HADOOP_PREFIX: &str = "org.apache.hadoop.";

/// Default codec class name emitted on write.
pub const DEFAULT_CODEC_CLASS_NAME: &str = "org.apache.hadoop.io.compress.DefaultCodec";

/// Which of the three on-disk record layouts a file or writer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// Records are framed but not compressed.
    None,
    /// Each value is compressed independently before framing.
    Record,
    /// Records are batched and compressed four-sub-buffers-at-a-time.
    Block,
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompressionType::None => "none",
            CompressionType::Record => "record",
            CompressionType::Block => "block",
        };
        f.write_str(name)
    }
}
