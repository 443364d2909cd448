//! # vfx-bridge
//!
//! Native-first image loading with a generic codec fallback.
//!
//! Decoding tries a fast native stack first and falls back to a generic
//! backend that understands more formats and reports rich metadata. The
//! result is always an [`ImageRep`]: validated pixels, a classified
//! [`EncodingType`] and normalized [`ImageMetadata`]. Encoding always goes
//! through the generic backend, with the bit depth checked up front and the
//! file written atomically.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use vfx_bridge::EncodingType;
//!
//! let plate = vfx_bridge::read("scan.0101.dpx")?;
//! println!("{} {}x{}", plate.encoding(), plate.width(), plate.height());
//!
//! vfx_bridge::write("scan.0101.exr", &plate, EncodingType::OpenExr)?;
//! ```
//!
//! # Decode paths
//!
//! | Path | Formats | Metadata | Encoding type |
//! |------|---------|----------|---------------|
//! | Native | PNG, JPEG, TIFF | none | recognized header |
//! | Generic backend | all six | normalized attributes | classified from metadata |
//!
//! Pass [`DecodeOptions::forced`] to skip the native stack.
//!
//! # Supported Formats
//!
//! | Format | Native | Read | Write | Bit Depths |
//! |--------|--------|------|-------|------------|
//! | PNG | Yes | Yes | Yes | 8, 16 |
//! | JPEG | Yes | Yes | Yes | 8 |
//! | TIFF | Yes | Yes | Yes | 8, 16, 32f |
//! | EXR | No | Yes | Yes | 16f, 32f |
//! | HDR | No | Yes | Yes | 32f |
//! | DPX | No | Yes | Yes | 8, 10, 12, 16 |

mod buffer;
mod encoding;
mod error;

pub mod backend;
pub mod codec;
pub mod decode;
pub mod detect;
pub mod encode;
pub mod instrument;
pub mod metadata;
pub mod native;
pub mod registry;
pub mod rep;

pub use backend::{CodecBackend, CodecOptions, GenericBackend};
pub use buffer::{PixelBuffer, SampleData, SampleType};
pub use decode::{DecodeOptions, DecodePath, DecodeState, Decoded, Decoder};
pub use encode::Encoder;
pub use encoding::EncodingType;
pub use error::{BridgeError, BridgeResult, CodecError, CodecResult};
pub use instrument::{InstrumentationSink, NullSink, TracingSink};
pub use metadata::{AttrValue, ImageMetadata, RawAttributes, classify_encoding_type, normalize};
pub use native::{NativeDecoder, PlatformDecoder};
pub use registry::{FormatEntry, FormatRegistry};
pub use rep::ImageRep;

use std::path::Path;

/// Uniform type identifier of DPX.
pub const DPX_TYPE_IDENTIFIER: &str = "org.smpte.dpx";

/// Decodes `path`, native stack first.
///
/// # Errors
///
/// [`BridgeError::UnreadableSource`] or [`BridgeError::UnsupportedFormat`].
pub fn read<P: AsRef<Path>>(path: P) -> BridgeResult<ImageRep> {
    Decoder::new()
        .decode(path, &DecodeOptions::default())
        .map(|decoded| decoded.image)
}

/// Decodes `path` through the generic backend only.
///
/// The result always carries the backend's metadata.
pub fn read_forced<P: AsRef<Path>>(path: P) -> BridgeResult<ImageRep> {
    Decoder::new()
        .decode(path, &DecodeOptions::forced())
        .map(|decoded| decoded.image)
}

/// Writes `rep` to `path` as `encoding` at the encoding's default depth.
///
/// # Errors
///
/// See [`Encoder::encode`].
pub fn write<P: AsRef<Path>>(path: P, rep: &ImageRep, encoding: EncodingType) -> BridgeResult<()> {
    Encoder::new().encode(rep, encoding, None, path)
}

/// Encodes `rep` as an in-memory DPX file at `bit_depth`.
///
/// ```
/// use vfx_bridge::{ImageRep, PixelBuffer};
///
/// let pixels = PixelBuffer::from_u16(4, 4, 3, 10, vec![512; 48]).unwrap();
/// let rep = ImageRep::from_pixels(pixels).unwrap();
/// let dpx = vfx_bridge::dpx_representation(&rep, 10).unwrap();
/// assert_eq!(&dpx[..4], b"SDPX");
/// ```
pub fn dpx_representation(rep: &ImageRep, bit_depth: u8) -> BridgeResult<Vec<u8>> {
    Encoder::new().encode_to_vec(rep, EncodingType::Dpx, Some(bit_depth))
}

/// Extensions the native stack can decode.
pub fn image_file_types() -> Vec<&'static str> {
    FormatRegistry::global().supported_file_extensions(false)
}

/// Extensions decodable through either path.
pub fn all_image_file_types() -> Vec<&'static str> {
    FormatRegistry::global().supported_file_extensions(true)
}

/// Type identifiers the native stack can decode.
pub fn image_types() -> Vec<&'static str> {
    FormatRegistry::global().supported_type_identifiers(false)
}

/// Type identifiers decodable through either path.
pub fn all_image_types() -> Vec<&'static str> {
    FormatRegistry::global().supported_type_identifiers(true)
}

/// Uniform type identifier of DPX, for callers registering file types.
pub fn dpx_type_identifier() -> &'static str {
    DPX_TYPE_IDENTIFIER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_listing_is_a_strict_subset() {
        let native = image_file_types();
        let all = all_image_file_types();
        assert!(native.iter().all(|ext| all.contains(ext)));
        assert!(all.len() > native.len());
        assert!(all.contains(&"dpx") && !native.contains(&"dpx"));
    }

    #[test]
    fn dpx_identifier_is_registered() {
        let entry = FormatRegistry::global().lookup(dpx_type_identifier()).unwrap();
        assert_eq!(entry.encoding, EncodingType::Dpx);
        assert!(all_image_types().contains(&DPX_TYPE_IDENTIFIER));
        assert!(!image_types().contains(&DPX_TYPE_IDENTIFIER));
    }
}
