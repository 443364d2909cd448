//! The native decode stack.
//!
//! A [`NativeDecoder`] either produces pixels or declines. Declining is the
//! normal outcome for formats it does not understand and is reported as
//! `Ok(None)`; only I/O failures are errors.
//!
//! [`PlatformDecoder`] is the built-in implementation. It sniffs the file
//! header and decodes the formats the registry marks as native (PNG, JPEG,
//! TIFF). It never consults the file extension, so a DPX renamed to `.png`
//! is declined rather than misread.

use crate::buffer::PixelBuffer;
use crate::codec;
use crate::{EncodingType, FormatRegistry, detect};
use std::io;
use std::path::Path;
use tracing::debug;

/// Pixels produced by the native stack.
#[derive(Debug, Clone)]
pub struct NativeImage {
    /// Decoded samples.
    pub pixels: PixelBuffer,
    /// Encoding recognized by the native stack, if any. Used as-is.
    pub encoding_hint: Option<EncodingType>,
}

/// Native decode capability.
pub trait NativeDecoder: Send + Sync {
    /// Decodes `path`, or returns `Ok(None)` if the format is not handled.
    ///
    /// # Errors
    ///
    /// Only for I/O failures: missing file, permission denied and the like.
    fn try_decode(&self, path: &Path) -> io::Result<Option<NativeImage>>;
}

/// Built-in native decoder for the registry's native formats.
#[derive(Debug, Clone, Copy)]
pub struct PlatformDecoder {
    registry: &'static FormatRegistry,
}

impl PlatformDecoder {
    /// Creates a decoder backed by the global registry.
    pub fn new() -> Self {
        Self::with_registry(FormatRegistry::global())
    }

    /// Creates a decoder that honours the `native` flags of `registry`.
    pub fn with_registry(registry: &'static FormatRegistry) -> Self {
        Self { registry }
    }
}

impl Default for PlatformDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeDecoder for PlatformDecoder {
    fn try_decode(&self, path: &Path) -> io::Result<Option<NativeImage>> {
        let bytes = std::fs::read(path)?;
        let encoding = detect::from_bytes(&bytes[..bytes.len().min(detect::HEADER_LEN)]);
        let native = self
            .registry
            .entry_for_encoding(encoding)
            .is_some_and(|e| e.native);
        if !native {
            return Ok(None);
        }

        let decoded = match encoding {
            EncodingType::Png => codec::png::decode(&bytes),
            EncodingType::Jpeg => codec::jpeg::decode(&bytes),
            EncodingType::Tiff => codec::tiff::decode(&bytes),
            _ => return Ok(None),
        };
        match decoded {
            Ok(image) => Ok(Some(NativeImage {
                pixels: image.pixels,
                encoding_hint: Some(encoding),
            })),
            Err(e) => {
                debug!(path = %path.display(), %encoding, error = %e, "native stack declined");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn png_bytes() -> Vec<u8> {
        let pixels = PixelBuffer::from_u8(2, 2, 3, vec![9; 12]).unwrap();
        codec::png::encode(&pixels, 8).unwrap()
    }

    #[test]
    fn decodes_native_formats_with_hint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plate.png");
        fs::write(&path, png_bytes()).unwrap();

        let image = PlatformDecoder::new().try_decode(&path).unwrap().unwrap();
        assert_eq!(image.encoding_hint, Some(EncodingType::Png));
        assert_eq!(image.pixels.width(), 2);
    }

    #[test]
    fn declines_backend_only_formats() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.dpx");
        let pixels = PixelBuffer::from_u16(1, 1, 3, 10, vec![1, 2, 3]).unwrap();
        let bytes = codec::dpx::encode(&pixels, &Default::default()).unwrap();
        fs::write(&path, bytes).unwrap();

        assert!(PlatformDecoder::new().try_decode(&path).unwrap().is_none());
    }

    #[test]
    fn declines_corrupt_native_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        let mut bytes = png_bytes();
        bytes.truncate(20);
        fs::write(&path, bytes).unwrap();

        assert!(PlatformDecoder::new().try_decode(&path).unwrap().is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = PlatformDecoder::new()
            .try_decode(&dir.path().join("absent.png"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
