//! Format codecs behind the generic backend.
//!
//! Every codec works on in-memory bytes: `decode(&[u8])` returns a
//! [`CodecImage`] and `encode(&PixelBuffer, ...)` returns the encoded file.
//! File access, format detection and the common attributes (format family,
//! bit depth, geometry) are handled by [`CodecBackend`](crate::CodecBackend).

use crate::buffer::PixelBuffer;
use crate::metadata::RawAttributes;

pub mod dpx;
pub mod exr;
pub mod hdr;
pub mod jpeg;
pub mod png;
pub mod tiff;

/// Decoded pixels plus the codec's format-specific attributes.
#[derive(Debug, Clone)]
pub struct CodecImage {
    /// Decoded samples.
    pub pixels: PixelBuffer,
    /// Attributes in the order the codec found them.
    pub attributes: RawAttributes,
}
