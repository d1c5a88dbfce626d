use thiserror::Error;

/// Error kinds a conforming reader/writer can raise.
///
/// Variant names track the error *kinds* the format spec enumerates, not the
/// underlying platform's exception hierarchy: `AlreadyExists`,
/// `VersionMismatch`, `UnsupportedVersion`, `UnsupportedCompressionMode`,
/// `TypeMismatch`, `Corruption`, `Codec`, `Io`.
#[derive(Error, Debug)]
pub enum Error {
    /// Opening a writer on a path that already exists.
    #[error("path already exists")]
    AlreadyExists,

    /// On-disk version byte exceeds what this implementation can read.
    #[error("unsupported version {found} (this implementation reads up to version 6)")]
    VersionMismatch { found: u8 },

    /// On-disk version byte predates the minimum this implementation supports.
    #[error("version {found} is not implemented (minimum supported version is 4)")]
    UnsupportedVersion { found: u8 },

    /// A compression mode was requested that isn't one of none/record/block,
    /// or record/block compression was requested without a codec.
    #[error("unsupported compression mode")]
    UnsupportedCompressionMode,

    /// `append` was called with a key or value whose runtime class doesn't
    /// match the writer's declared class.
    #[error("type mismatch: expected writable class {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A sync tag didn't match the header tag, a length prefix was
    /// inconsistent with its surrounding framing, or a count was negative.
    #[error("corrupt sequence file: {0}")]
    Corruption(String),

    /// The codec capability rejected input or produced an inconsistent output.
    #[error("codec error: {0}")]
    Codec(#[source] anyhow::Error),

    /// Any underlying stream error, propagated as-is.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
