mod default_codec;
mod gzip_codec;
mod none_codec;

pub use default_codec::DefaultCodec;
pub use gzip_codec::GzipCodec;
pub use none_codec::NoneCodec;

use std::sync::Arc;

use seqfile_core::error::Error;
use seqfile_core::{Codec, CodecRegistry, Result};

/// Resolves a persisted codec class name to a concrete [`Codec`].
///
/// Called by the reader when opening an existing file, so it can be
/// initialized with the right decompressor automatically.
pub struct KnownCodecs;

impl CodecRegistry for KnownCodecs {
    fn resolve(&self, class_name: &str) -> Result<Arc<dyn Codec>> {
        match class_name {
            "org.apache.hadoop.io.compress.DefaultCodec" => Ok(Arc::new(DefaultCodec::default())),
            "org.apache.hadoop.io.compress.GzipCodec" => Ok(Arc::new(GzipCodec::default())),
            "org.apache.hadoop.io.compress.NoneCodec" => Ok(Arc::new(NoneCodec)),
            other => Err(Error::Corruption(format!(
                "unknown codec class {other:?}; supported: DefaultCodec, GzipCodec, NoneCodec"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_default_codec() {
        let codec = KnownCodecs.resolve("org.apache.hadoop.io.compress.DefaultCodec").unwrap();
        assert_eq!(codec.class_name(), "org.apache.hadoop.io.compress.DefaultCodec");
    }

    #[test]
    fn unknown_codec_is_corruption() {
        assert!(KnownCodecs.resolve("com.example.Mystery").is_err());
    }
}
