//! Format detection from magic bytes and file extensions.

use crate::{EncodingType, FormatRegistry};
use std::path::Path;

/// Number of header bytes needed by [`from_bytes`].
pub const HEADER_LEN: usize = 8;

/// Detects the encoding family from header magic.
pub fn from_bytes(bytes: &[u8]) -> EncodingType {
    // HDR: "#?"
    if bytes.starts_with(b"#?") {
        return EncodingType::Hdr;
    }
    if bytes.len() < 3 {
        return EncodingType::Unknown;
    }
    // JPEG: FF D8 FF
    if bytes[..3] == [0xFF, 0xD8, 0xFF] {
        return EncodingType::Jpeg;
    }
    if bytes.len() < 4 {
        return EncodingType::Unknown;
    }
    match &bytes[..4] {
        [0x76, 0x2F, 0x31, 0x01] => return EncodingType::OpenExr,
        // II* / MM*
        [0x49, 0x49, 0x2A, 0x00] | [0x4D, 0x4D, 0x00, 0x2A] => return EncodingType::Tiff,
        // SDPX / XPDS
        b"SDPX" | b"XPDS" => return EncodingType::Dpx,
        _ => {}
    }
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return EncodingType::Png;
    }
    EncodingType::Unknown
}

/// Detects the encoding family from the extension of `path`.
pub fn from_extension(registry: &FormatRegistry, path: &Path) -> EncodingType {
    registry
        .get_by_path(path)
        .map(|e| e.encoding)
        .unwrap_or(EncodingType::Unknown)
}

/// Magic bytes first, extension as fallback.
pub fn detect(registry: &FormatRegistry, header: &[u8], path: &Path) -> EncodingType {
    match from_bytes(header) {
        EncodingType::Unknown => from_extension(registry, path),
        found => found,
    }
}
