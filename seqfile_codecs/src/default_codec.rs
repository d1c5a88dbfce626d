use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use seqfile_core::error::Error;
use seqfile_core::{Codec, Result};

/// The zlib-based codec the reference platform calls `DefaultCodec` — the
/// one emitted when a writer is told to compress but given no specific
/// codec preference. Bundled here so this implementation can both write and
/// read its own default without any further configuration.
pub struct DefaultCodec {
    level: Compression,
}

impl Default for DefaultCodec {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl DefaultCodec {
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level),
        }
    }
}

impl Codec for DefaultCodec {
    fn class_name(&self) -> &'static str {
        "org.apache.hadoop.io.compress.DefaultCodec"
    }

    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.level);
        encoder
            .write_all(raw)
            .map_err(|e| Error::Codec(e.into()))?;
        encoder.finish().map_err(|e| Error::Codec(e.into()))
    }

    fn decompress_stream(&self, data: Vec<u8>) -> Result<Box<dyn Read>> {
        Ok(Box::new(ZlibDecoder::new(std::io::Cursor::new(data))))
    }
}
