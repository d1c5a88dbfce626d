//! Streaming, seekable reader: header parsing with version gating,
//! record/block iteration, sync detection, and resynchronization.

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use crate::codec::{Codec, CodecRegistry};
use crate::error::{Error, Result};
use crate::format::{
    CompressionType, CURRENT_VERSION, DEFAULT_CODEC_CLASS_NAME, MAGIC, MIN_SUPPORTED_VERSION,
    SYNC_ESCAPE, SYNC_HASH_SIZE, SYNC_SIZE,
};
use crate::metadata::Metadata;
use crate::primitives::{read_bool, read_i32_be, read_text, read_vint};
use crate::registry::ClassRegistry;
use crate::writable::{Writable, WritableFactory};

/// A block's four sub-buffers, already decompressed into independent
/// streams. `block_index`/`records` live on [`Reader`] alongside this so the
/// "no block loaded yet" state doesn't have to be encoded as a sentinel
/// inside the tuple itself (see the format's open questions).
struct DecodedBlock {
    records: i64,
    keys_len: Box<dyn Read>,
    keys: Box<dyn Read>,
    values_len: Box<dyn Read>,
    values: Box<dyn Read>,
}

/// Random-access reader over a byte range `[start, start+length)` (or to EOF
/// when `length == 0`) of a sequence file.
pub struct Reader<R> {
    stream: R,
    end: u64,
    header_end: u64,
    version: u8,
    key_class_name: String,
    value_class_name: String,
    key_factory: WritableFactory,
    value_factory: WritableFactory,
    compression: CompressionType,
    codec: Option<Arc<dyn Codec>>,
    metadata: Metadata,
    sync: [u8; SYNC_HASH_SIZE],
    sync_seen: bool,
    block: Option<DecodedBlock>,
    /// Always present; `0` and `block.is_none()` together mean "exhausted,
    /// no block loaded yet" rather than indexing into a possibly-stale tuple.
    block_index: i64,
    record: Option<Cursor<Vec<u8>>>,
}

impl Reader<File> {
    /// Open a sequence file at `path`, starting at byte `start` and covering
    /// `length` bytes (`0` means "to end of file").
    pub fn open<P: AsRef<Path>>(
        path: P,
        start: u64,
        length: u64,
        classes: &ClassRegistry,
        codecs: &dyn CodecRegistry,
    ) -> Result<Self> {
        let mut file = File::open(path)?;
        let stream_len = file.metadata()?.len();
        file.seek(SeekFrom::Start(start))?;
        let end = if length == 0 { stream_len } else { start + length };
        Reader::from_stream(file, end, classes, codecs)
    }
}

impl<R: Read + Seek> Reader<R> {
    /// Build a reader over an already-positioned stream, reading the header
    /// immediately. `end` is the absolute byte offset at which this reader's
    /// view of the stream stops.
    pub fn from_stream(
        mut stream: R,
        end: u64,
        classes: &ClassRegistry,
        codecs: &dyn CodecRegistry,
    ) -> Result<Self> {
        let mut magic = [0u8; 3];
        stream.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(Error::Corruption(
                "not a sequence file: bad magic bytes".to_string(),
            ));
        }

        let mut version_buf = [0u8; 1];
        stream.read_exact(&mut version_buf)?;
        let version = version_buf[0];

        if version > CURRENT_VERSION {
            return Err(Error::VersionMismatch { found: version });
        }
        if version < MIN_SUPPORTED_VERSION {
            return Err(Error::UnsupportedVersion { found: version });
        }

        let key_class_name = read_text(&mut stream)?;
        let value_class_name = read_text(&mut stream)?;
        let key_factory = classes.resolve(&key_class_name)?;
        let value_factory = classes.resolve(&value_class_name)?;

        let compressed = if version > 2 {
            read_bool(&mut stream)?
        } else {
            false
        };
        let block_compressed = if version >= 4 {
            read_bool(&mut stream)?
        } else {
            false
        };

        let codec = if compressed {
            let codec_name = if version >= 5 {
                read_text(&mut stream)?
            } else {
                DEFAULT_CODEC_CLASS_NAME.to_string()
            };
            Some(codecs.resolve(&codec_name)?)
        } else {
            None
        };

        let mut metadata = Metadata::default();
        if version >= 6 {
            metadata.read_fields(&mut stream)?;
        }

        let mut sync = [0u8; SYNC_HASH_SIZE];
        if version > 1 {
            stream.read_exact(&mut sync)?;
        }
        let header_end = stream.stream_position()?;

        let compression = if block_compressed {
            CompressionType::Block
        } else if compressed {
            CompressionType::Record
        } else {
            CompressionType::None
        };

        log::debug!(
            "opened sequence file reader: version={version} compression={compression} codec={:?}",
            codec.as_ref().map(|c| c.class_name())
        );

        Ok(Self {
            stream,
            end,
            header_end,
            version,
            key_class_name,
            value_class_name,
            key_factory,
            value_factory,
            compression,
            codec,
            metadata,
            sync,
            sync_seen: false,
            block: None,
            block_index: 0,
            record: None,
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn key_class_name(&self) -> &str {
        &self.key_class_name
    }

    pub fn value_class_name(&self) -> &str {
        &self.value_class_name
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn is_compressed(&self) -> bool {
        self.compression != CompressionType::None
    }

    pub fn is_block_compressed(&self) -> bool {
        self.compression == CompressionType::Block
    }

    /// True iff the most recent framing operation consumed a sync marker.
    pub fn sync_seen(&self) -> bool {
        self.sync_seen
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.stream.stream_position()?)
    }

    pub fn key_factory(&self) -> WritableFactory {
        self.key_factory
    }

    pub fn value_factory(&self) -> WritableFactory {
        self.value_factory
    }

    /// Convenience: `next_key` followed by `get_current_value` when a
    /// record was found.
    pub fn next(&mut self, key: &mut dyn Writable, value: &mut dyn Writable) -> Result<bool> {
        if self.next_key(key)? {
            self.get_current_value(value)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn next_key(&mut self, out_key: &mut dyn Writable) -> Result<bool> {
        match self.compression {
            CompressionType::Block => self.next_key_block(out_key),
            _ => self.next_key_plain(out_key),
        }
    }

    fn next_key_plain(&mut self, out_key: &mut dyn Writable) -> Result<bool> {
        let record_length = self.read_record_length()?;
        if record_length < 0 {
            return Ok(false);
        }

        let mut buf = vec![0u8; record_length as usize + 4];
        self.stream.read_exact(&mut buf)?;
        let mut cursor = Cursor::new(buf);
        let key_length = read_i32_be(&mut cursor)?;
        if key_length < 0 || key_length as i64 > record_length as i64 {
            return Err(Error::Corruption(format!(
                "record key length {key_length} inconsistent with record length {record_length}"
            )));
        }

        {
            let mut key_reader = (&mut cursor).take(key_length as u64);
            out_key.read_fields(&mut key_reader)?;
        }
        self.record = Some(cursor);
        Ok(true)
    }

    fn next_key_block(&mut self, out_key: &mut dyn Writable) -> Result<bool> {
        if let Some(block) = self.block.as_mut() {
            if self.block_index < block.records {
                self.sync_seen = false;
                read_vint(&mut block.keys_len)?;
                out_key.read_fields(&mut block.keys)?;
                self.block_index += 1;
                return Ok(true);
            }
        }

        if self.stream.stream_position()? >= self.end {
            return Ok(false);
        }

        let escape = read_i32_be(&mut self.stream)?;
        if escape != SYNC_ESCAPE {
            return Err(Error::Corruption(
                "expected sync marker before block".to_string(),
            ));
        }
        let mut tag = [0u8; SYNC_HASH_SIZE];
        self.stream.read_exact(&mut tag)?;
        if tag != self.sync {
            return Err(Error::Corruption("sync marker mismatch".to_string()));
        }
        self.sync_seen = true;

        let records = read_vint(&mut self.stream)? as i64;
        let keys_len = self.read_compressed_substream()?;
        let keys = self.read_compressed_substream()?;
        let values_len = self.read_compressed_substream()?;
        let values = self.read_compressed_substream()?;

        let mut block = DecodedBlock {
            records,
            keys_len,
            keys,
            values_len,
            values,
        };
        read_vint(&mut block.keys_len)?;
        out_key.read_fields(&mut block.keys)?;
        self.block_index = 1;
        self.block = Some(block);
        Ok(true)
    }

    fn read_compressed_substream(&mut self) -> Result<Box<dyn Read>> {
        let len = read_vint(&mut self.stream)?;
        if len < 0 {
            return Err(Error::Corruption(format!(
                "negative compressed sub-buffer length {len}"
            )));
        }
        let mut buf = vec![0u8; len as usize];
        self.stream.read_exact(&mut buf)?;
        let codec = self
            .codec
            .as_ref()
            .expect("block compression always carries a codec");
        codec.decompress_stream(buf)
    }

    pub fn get_current_value(&mut self, out_value: &mut dyn Writable) -> Result<()> {
        match self.compression {
            CompressionType::Block => {
                let block = self.block.as_mut().ok_or_else(|| {
                    Error::Corruption("get_current_value called with no current block".to_string())
                })?;
                read_vint(&mut block.values_len)?;
                out_value.read_fields(&mut block.values)
            }
            CompressionType::Record => {
                let mut cursor = self.record.take().ok_or_else(|| {
                    Error::Corruption(
                        "get_current_value called with no current record".to_string(),
                    )
                })?;
                let mut compressed = Vec::new();
                cursor.read_to_end(&mut compressed)?;
                let codec = self
                    .codec
                    .as_ref()
                    .expect("record compression always carries a codec");
                let mut value_stream = codec.decompress_stream(compressed)?;
                out_value.read_fields(&mut value_stream)
            }
            CompressionType::None => {
                let mut cursor = self.record.take().ok_or_else(|| {
                    Error::Corruption(
                        "get_current_value called with no current record".to_string(),
                    )
                })?;
                out_value.read_fields(&mut cursor)?;
                if cursor.position() != cursor.get_ref().len() as u64 {
                    return Err(Error::Corruption(
                        "trailing bytes left in record buffer".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    fn read_record_length(&mut self) -> Result<i32> {
        if self.stream.stream_position()? >= self.end {
            return Ok(-1);
        }
        let mut length = read_i32_be(&mut self.stream)?;
        if length == SYNC_ESCAPE {
            let mut tag = [0u8; SYNC_HASH_SIZE];
            self.stream.read_exact(&mut tag)?;
            if tag != self.sync {
                return Err(Error::Corruption("sync marker mismatch".to_string()));
            }
            self.sync_seen = true;
            if self.stream.stream_position()? >= self.end {
                return Ok(-1);
            }
            length = read_i32_be(&mut self.stream)?;
        } else {
            self.sync_seen = false;
        }
        Ok(length)
    }

    /// Reposition the underlying stream. The caller is responsible for
    /// landing on a valid record boundary — typically via [`Reader::sync`].
    pub fn seek(&mut self, position: u64) -> Result<()> {
        self.stream.seek(SeekFrom::Start(position))?;
        if self.compression == CompressionType::Block {
            self.block = None;
            self.block_index = 0;
        }
        self.record = None;
        Ok(())
    }

    /// Resynchronization scan: locate the next sync marker at or after
    /// `position` and land just before it, so the next record read
    /// encounters the `-1` escape immediately. Uses a fixed 16-byte ring
    /// buffer rather than a growing sequence, so this is `O(1)` memory and
    /// `O(end - position)` time.
    pub fn sync(&mut self, position: u64) -> Result<()> {
        if position + SYNC_SIZE > self.end {
            self.seek(self.end)?;
            return Ok(());
        }
        if position < self.header_end {
            self.seek(self.header_end)?;
            self.sync_seen = true;
            return Ok(());
        }

        self.stream.seek(SeekFrom::Start(position + 4))?;
        let mut window = [0u8; SYNC_HASH_SIZE];
        self.stream.read_exact(&mut window)?;

        let mut pos = position + 4 + SYNC_HASH_SIZE as u64;
        let mut i: usize = 0;

        while pos < self.end {
            let mut matched = true;
            for j in 0..SYNC_HASH_SIZE {
                if self.sync[j] != window[(i + j) % SYNC_HASH_SIZE] {
                    matched = false;
                    break;
                }
            }
            if matched {
                self.stream.seek(SeekFrom::Current(-(SYNC_SIZE as i64)))?;
                return Ok(());
            }

            let mut byte = [0u8; 1];
            self.stream.read_exact(&mut byte)?;
            window[i % SYNC_HASH_SIZE] = byte[0];
            i += 1;
            pos += 1;
        }
        Ok(())
    }

    /// Iterate `(key, value)` pairs, constructing fresh boxed `Writable`
    /// instances from the registry-resolved factories each step.
    pub fn iter(&mut self) -> Iter<'_, R> {
        Iter { reader: self }
    }
}

pub struct Iter<'a, R> {
    reader: &'a mut Reader<R>,
}

impl<'a, R: Read + Seek> Iterator for Iter<'a, R> {
    type Item = Result<(Box<dyn Writable>, Box<dyn Writable>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut key = (self.reader.key_factory)();
        match self.reader.next_key(key.as_mut()) {
            Ok(true) => {
                let mut value = (self.reader.value_factory)();
                match self.reader.get_current_value(value.as_mut()) {
                    Ok(()) => Some(Ok((key, value))),
                    Err(e) => Some(Err(e)),
                }
            }
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
