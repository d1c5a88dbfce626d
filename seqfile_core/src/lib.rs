//! Reader/writer pair for the sequence file format: a self-describing,
//! splittable, append-only binary container for sequences of typed
//! key/value records.
//!
//! Serialization of individual keys/values is delegated to the
//! [`Writable`] capability, compression to the [`Codec`] capability, and
//! class-name resolution to [`ClassRegistry`]. See [`writer::Writer`] and
//! [`reader::Reader`] for the two halves of the format.

pub mod codec;
pub mod error;
pub mod format;
pub mod metadata;
pub mod primitives;
pub mod reader;
pub mod registry;
pub mod writable;
pub mod writer;

pub use codec::{Codec, CodecRegistry};
pub use error::{Error, Result};
pub use format::{
    CompressionType, COMPRESSION_BLOCK_SIZE, CURRENT_VERSION, MIN_SUPPORTED_VERSION, SYNC_INTERVAL,
};
pub use metadata::Metadata;
pub use reader::Reader;
pub use registry::ClassRegistry;
pub use writable::{
    BytesWritable, IntWritable, LongWritable, NullWritable, Text, VIntWritable, Writable,
    WritableFactory,
};
pub use writer::{Writer, WriterOptions};
