//! Streaming writer: header emission, record framing for all three
//! compression modes, sync insertion, and block accumulation/flush.
//!
//! # Write contract
//! Call [`Writer::append`] (or [`Writer::append_raw`]) any number of times.
//! In block mode, data accumulates in memory and is flushed as an
//! independent compressed block whenever [`COMPRESSION_BLOCK_SIZE`] bytes of
//! raw keys+values have been gathered. Call [`Writer::close`] to flush any
//! remaining partial block and close the underlying stream — in block mode,
//! skipping `close` loses the final partial block.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use rand::Rng;

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::format::{
    CompressionType, COMPRESSION_BLOCK_SIZE, HADOOP_PREFIX, SYNC_ESCAPE, SYNC_HASH_SIZE,
    SYNC_INTERVAL,
};
use crate::metadata::Metadata;
use crate::primitives::{write_bool, write_i32_be, write_text, write_vint};
use crate::writable::Writable;

/// A `Write` wrapper that tracks the logical byte position of the stream,
/// since `std::io::Write` alone has no notion of "current position" for
/// arbitrary (non-`Seek`) writers.
struct CountingWriter<W> {
    inner: W,
    pos: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, pos: 0 }
    }

    fn position(&self) -> u64 {
        self.pos
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// In-flight block-compressed record batch: four parallel sub-buffers plus a
/// record count, cleared on flush. Modeled as an explicit object (per the
/// format's design notes) rather than an ad-hoc tuple.
#[derive(Default)]
struct Block {
    records: i64,
    keys_len: Vec<u8>,
    keys: Vec<u8>,
    values_len: Vec<u8>,
    values: Vec<u8>,
}

impl Block {
    fn raw_size(&self) -> usize {
        self.keys.len() + self.values.len()
    }
}

/// Configuration for a new [`Writer`]. Compression mode and codec are
/// mandatory choices; sync interval and block size default to the format's
/// standard constants but are overridable for testing (a multi-megabyte
/// default block size makes it impractical to exercise block-flush behavior
/// in a unit test without this).
pub struct WriterOptions {
    compression: CompressionType,
    codec: Option<Arc<dyn Codec>>,
    metadata: Metadata,
    sync_interval: u64,
    compression_block_size: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compression: CompressionType::None,
            codec: None,
            metadata: Metadata::default(),
            sync_interval: SYNC_INTERVAL,
            compression_block_size: COMPRESSION_BLOCK_SIZE,
        }
    }
}

impl WriterOptions {
    pub fn compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn sync_interval(mut self, sync_interval: u64) -> Self {
        self.sync_interval = sync_interval;
        self
    }

    pub fn compression_block_size(mut self, compression_block_size: usize) -> Self {
        self.compression_block_size = compression_block_size;
        self
    }
}

/// Streaming writer for the sequence file format. Single-use: owns its
/// output stream for its lifetime and cannot be reopened.
pub struct Writer<W: Write> {
    stream: CountingWriter<W>,
    key_class_name: &'static str,
    value_class_name: &'static str,
    compression: CompressionType,
    codec: Option<Arc<dyn Codec>>,
    sync: [u8; SYNC_HASH_SIZE],
    last_sync: u64,
    block: Option<Block>,
    sync_interval: u64,
    compression_block_size: usize,
}

impl Writer<File> {
    /// Create a new sequence file at `path`. Fails with
    /// [`Error::AlreadyExists`] if the path already exists.
    pub fn create<P: AsRef<Path>>(
        path: P,
        key_class_name: &'static str,
        value_class_name: &'static str,
        options: WriterOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(Error::AlreadyExists);
        }
        let file = File::create(path)?;
        Writer::new(file, key_class_name, value_class_name, options)
    }
}

impl<W: Write> Writer<W> {
    /// Wrap an arbitrary `Write` destination. Used by [`Writer::create`] for
    /// files, and directly by tests and embedders that want an in-memory
    /// sequence file (e.g. `Writer::new(Vec::new(), ...)`).
    pub fn new(
        writer: W,
        key_class_name: &'static str,
        value_class_name: &'static str,
        options: WriterOptions,
    ) -> Result<Self> {
        let compressed = options.compression != CompressionType::None;
        let block_compressed = options.compression == CompressionType::Block;

        if compressed && options.codec.is_none() {
            return Err(Error::UnsupportedCompressionMode);
        }

        let mut sync = [0u8; SYNC_HASH_SIZE];
        rand::rng().fill(&mut sync);

        let mut stream = CountingWriter::new(writer);
        stream.write_all(crate::format::MAGIC)?;
        stream.write_all(&[crate::format::CURRENT_VERSION])?;
        write_text(&mut stream, &format!("{HADOOP_PREFIX}{key_class_name}"))?;
        write_text(&mut stream, &format!("{HADOOP_PREFIX}{value_class_name}"))?;
        write_bool(&mut stream, compressed)?;
        write_bool(&mut stream, block_compressed)?;
        if compressed {
            let codec = options.codec.as_ref().expect("checked above");
            write_text(&mut stream, codec.class_name())?;
        }
        options.metadata.write(&mut stream)?;
        stream.write_all(&sync)?;

        let last_sync = stream.position();
        log::debug!(
            "opened sequence file writer: compression={} codec={:?}",
            options.compression,
            options.codec.as_ref().map(|c| c.class_name())
        );

        Ok(Self {
            stream,
            key_class_name,
            value_class_name,
            compression: options.compression,
            codec: options.codec,
            sync,
            last_sync,
            block: None,
            sync_interval: options.sync_interval,
            compression_block_size: options.compression_block_size,
        })
    }

    /// Current byte position in the output stream.
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    pub fn is_compressed(&self) -> bool {
        self.compression != CompressionType::None
    }

    pub fn is_block_compressed(&self) -> bool {
        self.compression == CompressionType::Block
    }

    /// Serialize `key`/`value` via their `Writable` capability and append
    /// them. Rejects a runtime type that doesn't match the declared
    /// key/value class exactly — subtype substitution is not permitted.
    pub fn append(&mut self, key: &dyn Writable, value: &dyn Writable) -> Result<()> {
        if key.class_name() != self.key_class_name {
            return Err(Error::TypeMismatch {
                expected: self.key_class_name,
                found: key.class_name(),
            });
        }
        if value.class_name() != self.value_class_name {
            return Err(Error::TypeMismatch {
                expected: self.value_class_name,
                found: value.class_name(),
            });
        }

        let mut key_buf = Vec::new();
        key.write(&mut key_buf)?;
        let mut value_buf = Vec::new();
        value.write(&mut value_buf)?;

        self.append_raw(&key_buf, &value_buf)
    }

    /// Append already-serialized key/value bytes, bypassing the
    /// `Writable`/class-name check. Used internally by [`Writer::append`]
    /// and available directly for callers that already have encoded bytes.
    pub fn append_raw(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        match self.compression {
            CompressionType::Block => {
                let block = self.block.get_or_insert_with(Block::default);
                write_vint(&mut block.keys_len, key.len() as i32)?;
                block.keys.extend_from_slice(key);
                write_vint(&mut block.values_len, value.len() as i32)?;
                block.values.extend_from_slice(value);
                block.records += 1;

                if block.raw_size() >= self.compression_block_size {
                    self.sync()?;
                }
                Ok(())
            }
            CompressionType::Record => {
                let codec = self
                    .codec
                    .as_ref()
                    .expect("record compression always carries a codec");
                let compressed_value = codec.compress(value)?;
                self.check_and_write_sync()?;
                write_i32_be(&mut self.stream, (key.len() + compressed_value.len()) as i32)?;
                write_i32_be(&mut self.stream, key.len() as i32)?;
                self.stream.write_all(key)?;
                self.stream.write_all(&compressed_value)?;
                Ok(())
            }
            CompressionType::None => {
                self.check_and_write_sync()?;
                write_i32_be(&mut self.stream, (key.len() + value.len()) as i32)?;
                write_i32_be(&mut self.stream, key.len() as i32)?;
                self.stream.write_all(key)?;
                self.stream.write_all(value)?;
                Ok(())
            }
        }
    }

    fn check_and_write_sync(&mut self) -> Result<()> {
        if self.stream.position() >= self.last_sync + self.sync_interval {
            self.sync()?;
        }
        Ok(())
    }

    /// Emit a sync marker if the stream has advanced since the last one, and
    /// flush the in-flight block (if any) in block mode.
    pub fn sync(&mut self) -> Result<()> {
        if self.stream.position() != self.last_sync {
            write_i32_be(&mut self.stream, SYNC_ESCAPE)?;
            self.stream.write_all(&self.sync)?;
            self.last_sync = self.stream.position();
        }

        if self.compression == CompressionType::Block {
            if let Some(block) = self.block.take() {
                let codec = self
                    .codec
                    .as_ref()
                    .expect("block compression always carries a codec");

                write_vint(&mut self.stream, block.records as i32)?;
                for buf in [&block.keys_len, &block.keys, &block.values_len, &block.values] {
                    let compressed = codec.compress(buf)?;
                    write_vint(&mut self.stream, compressed.len() as i32)?;
                    self.stream.write_all(&compressed)?;
                }
                log::trace!("flushed block: {} records", block.records);
            }
        }
        Ok(())
    }

    /// Flush any remaining partial block (block mode) and close the
    /// underlying stream. Must be called to avoid losing trailing data in
    /// block mode.
    pub fn close(mut self) -> Result<()> {
        self.finish()?;
        Ok(())
    }

    /// Like [`Writer::close`], but hands back the underlying sink instead of
    /// discarding it. Useful for in-memory sinks (`Vec<u8>`) that a caller
    /// wants to inspect or reopen as a reader without going through a file.
    pub fn close_into_inner(mut self) -> Result<W> {
        self.finish()?;
        Ok(self.stream.inner)
    }

    fn finish(&mut self) -> Result<()> {
        if self.compression == CompressionType::Block {
            self.sync()?;
        }
        self.stream.flush()?;
        log::debug!("closed sequence file writer at {} bytes", self.stream.position());
        Ok(())
    }
}
