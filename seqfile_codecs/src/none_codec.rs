use std::io::Read;

use seqfile_core::{Codec, Result};

/// No-op codec: stores bytes verbatim. Mostly useful for exercising the
/// record/block framing independently of any real compression algorithm.
pub struct NoneCodec;

impl Codec for NoneCodec {
    fn class_name(&self) -> &'static str {
        "org.apache.hadoop.io.compress.NoneCodec"
    }

    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn decompress_stream(&self, data: Vec<u8>) -> Result<Box<dyn Read>> {
        Ok(Box::new(std::io::Cursor::new(data)))
    }
}
