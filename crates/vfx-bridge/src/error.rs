//! Error types for decode and encode operations.
//!
//! [`BridgeError`] is what callers see. [`CodecError`] is the narrower error
//! returned across the native/backend boundary; the orchestrators translate it
//! into a [`BridgeError`] before it leaves the crate.

use crate::EncodingType;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error returned by the decode and encode orchestrators.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// File missing, permission denied, truncated or otherwise unreadable.
    #[error("cannot read {}: {reason}", path.display())]
    UnreadableSource {
        /// Source that failed.
        path: PathBuf,
        /// Underlying diagnostic.
        reason: String,
    },

    /// Neither the native stack nor the generic backend can decode the source.
    #[error("unsupported format: {}: {reason}", path.display())]
    UnsupportedFormat {
        /// Source that failed.
        path: PathBuf,
        /// Underlying diagnostic.
        reason: String,
    },

    /// Declared geometry disagrees with the number of samples supplied.
    #[error("invalid buffer geometry: {width}x{height}x{channels} needs {expected} samples, got {actual}")]
    InvalidBufferGeometry {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Declared channel count.
        channels: u32,
        /// Samples implied by the geometry.
        expected: u64,
        /// Samples actually present.
        actual: u64,
    },

    /// Channel count / sample type / bit depth combination has no representation.
    #[error("unsupported sample layout: {0}")]
    UnsupportedSampleLayout(String),

    /// The generic backend cannot write this encoding type.
    #[error("unsupported encoding type: {0}")]
    UnsupportedEncodingType(EncodingType),

    /// Requested bit depth is not allowed for the encoding type.
    #[error("unsupported bit depth: {encoding} cannot be written at {depth} bits")]
    UnsupportedBitDepth {
        /// Target encoding.
        encoding: EncodingType,
        /// Rejected depth.
        depth: u8,
    },

    /// The generic backend failed while writing.
    #[error("encode failed: {message}")]
    EncodeBackendFailure {
        /// Backend diagnostic.
        message: String,
    },
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Error raised by a codec, the native stack or the generic backend.
#[derive(Debug, Error)]
pub enum CodecError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Corrupt, truncated or malformed data.
    #[error("decode error: {0}")]
    Decode(String),

    /// Encoding error.
    #[error("encode error: {0}")]
    Encode(String),

    /// Format, variant or pixel layout the codec does not handle.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

impl CodecError {
    /// Maps a decode-side failure onto the caller-facing error kind.
    pub(crate) fn into_decode_error(self, path: PathBuf) -> BridgeError {
        match self {
            CodecError::Unsupported(reason) => BridgeError::UnsupportedFormat { path, reason },
            other => BridgeError::UnreadableSource {
                path,
                reason: other.to_string(),
            },
        }
    }

    /// Maps an encode-side failure onto the caller-facing error kind.
    pub(crate) fn into_encode_error(self) -> BridgeError {
        BridgeError::EncodeBackendFailure {
            message: self.to_string(),
        }
    }
}
