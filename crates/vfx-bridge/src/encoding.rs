//! On-disk encoding families.
//!
//! [`EncodingType`] is both the result of classifying a decoded image and the
//! target selector for an encode. Variant order is significant: it is the
//! tie-break order used by [`classify_encoding_type`](crate::classify_encoding_type).

use std::fmt;
use std::str::FromStr;

/// Closed, ordered set of recognized image encodings.
///
/// | Variant | Write depths | Default |
/// |---------|--------------|---------|
/// | `Dpx` | 8, 10, 12, 16 | 10 |
/// | `OpenExr` | 16 (half), 32 (float) | 16 |
/// | `Hdr` | 32 | 32 |
/// | `Tiff` | 8, 16, 32 (float) | 16 |
/// | `Png` | 8, 16 | 8 |
/// | `Jpeg` | 8 | 8 |
/// | `Unknown` | - | - |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EncodingType {
    /// SMPTE 268M Digital Picture Exchange (cinema intermediate).
    Dpx,
    /// OpenEXR half/float scene-linear.
    OpenExr,
    /// Radiance RGBE.
    Hdr,
    /// Tagged Image File Format.
    Tiff,
    /// Portable Network Graphics.
    Png,
    /// JPEG/JFIF.
    Jpeg,
    /// Not recognized.
    Unknown,
}

impl EncodingType {
    /// Every known encoding in declaration order, without the sentinel.
    pub const KNOWN: [EncodingType; 6] = [
        EncodingType::Dpx,
        EncodingType::OpenExr,
        EncodingType::Hdr,
        EncodingType::Tiff,
        EncodingType::Png,
        EncodingType::Jpeg,
    ];

    /// Human-readable name for diagnostics and UI.
    pub fn string_name(self) -> &'static str {
        match self {
            EncodingType::Dpx => "DPX",
            EncodingType::OpenExr => "OpenEXR",
            EncodingType::Hdr => "Radiance HDR",
            EncodingType::Tiff => "TIFF",
            EncodingType::Png => "PNG",
            EncodingType::Jpeg => "JPEG",
            EncodingType::Unknown => "Unknown",
        }
    }

    /// Bit depths the generic backend accepts when writing this encoding.
    pub fn allowed_bit_depths(self) -> &'static [u8] {
        match self {
            EncodingType::Dpx => &[8, 10, 12, 16],
            EncodingType::OpenExr => &[16, 32],
            EncodingType::Hdr => &[32],
            EncodingType::Tiff => &[8, 16, 32],
            EncodingType::Png => &[8, 16],
            EncodingType::Jpeg => &[8],
            EncodingType::Unknown => &[],
        }
    }

    /// Depth used when an encode request does not name one.
    pub fn default_bit_depth(self) -> Option<u8> {
        match self {
            EncodingType::Dpx => Some(10),
            EncodingType::OpenExr => Some(16),
            EncodingType::Hdr => Some(32),
            EncodingType::Tiff => Some(16),
            EncodingType::Png => Some(8),
            EncodingType::Jpeg => Some(8),
            EncodingType::Unknown => None,
        }
    }

    /// True if `depth` is in [`allowed_bit_depths`](Self::allowed_bit_depths).
    pub fn allows_bit_depth(self, depth: u8) -> bool {
        self.allowed_bit_depths().contains(&depth)
    }

    /// True if encoding at `depth` preserves sample values exactly.
    pub fn is_lossless(self) -> bool {
        !matches!(self, EncodingType::Jpeg | EncodingType::Hdr | EncodingType::Unknown)
    }
}

impl fmt::Display for EncodingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.string_name())
    }
}

impl FromStr for EncodingType {
    type Err = String;

    /// Parses a display name or a file extension, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().trim_start_matches('.').to_ascii_lowercase();
        let parsed = match key.as_str() {
            "dpx" => EncodingType::Dpx,
            "exr" | "openexr" => EncodingType::OpenExr,
            "hdr" | "pic" | "rgbe" | "radiance" | "radiance hdr" => EncodingType::Hdr,
            "tif" | "tiff" => EncodingType::Tiff,
            "png" => EncodingType::Png,
            "jpg" | "jpeg" => EncodingType::Jpeg,
            _ => return Err(format!("unknown encoding type '{}'", s)),
        };
        Ok(parsed)
    }
}
