use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use seqfile_core::error::Error;
use seqfile_core::{Codec, Result};

/// Gzip framing, for interop with files written by implementations that
/// chose gzip over the platform's zlib-framed `DefaultCodec`. This writer
/// never emits `GzipCodec` itself (it always emits [`crate::DefaultCodec`])
/// but a reader accepts it when a file's header names it.
pub struct GzipCodec {
    level: Compression,
}

impl Default for GzipCodec {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Codec for GzipCodec {
    fn class_name(&self) -> &'static str {
        "org.apache.hadoop.io.compress.GzipCodec"
    }

    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), self.level);
        encoder
            .write_all(raw)
            .map_err(|e| Error::Codec(e.into()))?;
        encoder.finish().map_err(|e| Error::Codec(e.into()))
    }

    fn decompress_stream(&self, data: Vec<u8>) -> Result<Box<dyn Read>> {
        Ok(Box::new(GzDecoder::new(std::io::Cursor::new(data))))
    }
}
