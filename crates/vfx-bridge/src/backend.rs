//! The generic backend: decode and encode for every registered format.
//!
//! [`GenericBackend`] is the boundary the orchestrators drive. The shipped
//! implementation, [`CodecBackend`], reads the whole file, detects the
//! format by magic bytes (falling back to the extension), dispatches to the
//! matching codec and prefixes the codec's attributes with a common set:
//!
//! | Attribute | Value |
//! |-----------|-------|
//! | `format` | family name (`dpx`, `openexr`, `hdr`, `tiff`, `png`, `jpeg`) |
//! | `oiio:BitsPerSample` | significant bits per sample |
//! | `nchannels` | channel count |
//! | `width`, `height` | geometry |

use crate::buffer::PixelBuffer;
use crate::codec::dpx::{BitDepth, DpxWriterOptions, Endianness};
use crate::codec::{self, CodecImage};
use crate::error::{CodecError, CodecResult};
use crate::metadata::{AttrValue, RawAttributes};
use crate::{EncodingType, FormatRegistry, detect};
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

/// Generic backend capability.
pub trait GenericBackend: Send + Sync {
    /// Decodes `path` into pixels plus a free-form attribute list.
    fn decode(&self, path: &Path) -> CodecResult<CodecImage>;

    /// Encodes `pixels` as `encoding` at `bit_depth` into memory.
    fn encode_to_vec(
        &self,
        pixels: &PixelBuffer,
        encoding: EncodingType,
        bit_depth: u8,
    ) -> CodecResult<Vec<u8>>;

    /// Encodes `pixels` and writes the result to `dest`.
    fn write(
        &self,
        pixels: &PixelBuffer,
        encoding: EncodingType,
        bit_depth: u8,
        dest: &Path,
    ) -> CodecResult<()> {
        let bytes = self.encode_to_vec(pixels, encoding, bit_depth)?;
        fs::write(dest, bytes)?;
        Ok(())
    }
}

/// Encoder settings for [`CodecBackend`].
///
/// ```
/// use vfx_bridge::CodecOptions;
/// use vfx_bridge::codec::dpx::Endianness;
///
/// let options = CodecOptions::default()
///     .with_jpeg_quality(75)
///     .with_dpx_endianness(Endianness::Little);
/// assert_eq!(options.jpeg_quality, 75);
/// ```
#[derive(Debug, Clone)]
pub struct CodecOptions {
    /// Byte order of written DPX files. Default: big-endian.
    pub dpx_endianness: Endianness,
    /// JPEG quality, 1-100. Default: 90.
    pub jpeg_quality: u8,
    /// Creator recorded in DPX and HDR headers.
    pub creator: Option<String>,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            dpx_endianness: Endianness::Big,
            jpeg_quality: codec::jpeg::DEFAULT_QUALITY,
            creator: Some("vfx-bridge".to_string()),
        }
    }
}

impl CodecOptions {
    /// Sets the DPX byte order.
    pub fn with_dpx_endianness(mut self, endianness: Endianness) -> Self {
        self.dpx_endianness = endianness;
        self
    }

    /// Sets the JPEG quality.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Sets or clears the creator string.
    pub fn with_creator(mut self, creator: Option<String>) -> Self {
        self.creator = creator;
        self
    }
}

/// Generic backend built on the crate's codecs.
#[derive(Debug, Clone)]
pub struct CodecBackend {
    registry: &'static FormatRegistry,
    options: CodecOptions,
}

impl CodecBackend {
    /// Creates a backend with default options and the global registry.
    pub fn new() -> Self {
        Self::with_options(CodecOptions::default())
    }

    /// Creates a backend with explicit options.
    pub fn with_options(options: CodecOptions) -> Self {
        Self {
            registry: FormatRegistry::global(),
            options,
        }
    }

    /// Uses `registry` for detection and read/write capability checks.
    pub fn with_registry(mut self, registry: &'static FormatRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Current options.
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }
}

impl Default for CodecBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Value of the `format` attribute for each family.
fn family_name(encoding: EncodingType) -> &'static str {
    match encoding {
        EncodingType::Dpx => "dpx",
        EncodingType::OpenExr => "openexr",
        EncodingType::Hdr => "hdr",
        EncodingType::Tiff => "tiff",
        EncodingType::Png => "png",
        EncodingType::Jpeg => "jpeg",
        EncodingType::Unknown => "unknown",
    }
}

impl GenericBackend for CodecBackend {
    fn decode(&self, path: &Path) -> CodecResult<CodecImage> {
        let bytes = fs::read(path)?;
        let header = &bytes[..bytes.len().min(detect::HEADER_LEN)];
        let encoding = detect::detect(self.registry, header, path);
        trace!(path = %path.display(), %encoding, "backend decode");

        let readable = self
            .registry
            .entry_for_encoding(encoding)
            .is_some_and(|e| e.backend_read);
        if !readable {
            return Err(CodecError::Unsupported(format!(
                "no reader for {}",
                path.display()
            )));
        }

        let decoded = match encoding {
            EncodingType::Dpx => codec::dpx::decode(&bytes)?,
            EncodingType::OpenExr => codec::exr::decode(&bytes)?,
            EncodingType::Hdr => codec::hdr::decode(&bytes)?,
            EncodingType::Tiff => codec::tiff::decode(&bytes)?,
            EncodingType::Png => codec::png::decode(&bytes)?,
            EncodingType::Jpeg => codec::jpeg::decode(&bytes)?,
            EncodingType::Unknown => {
                return Err(CodecError::Unsupported(format!(
                    "unrecognized format: {}",
                    path.display()
                )));
            }
        };

        let pixels = decoded.pixels;
        let mut attributes = RawAttributes::new();
        attributes.push("format", AttrValue::Str(family_name(encoding).into()));
        attributes.push(
            "oiio:BitsPerSample",
            AttrValue::UInt(pixels.bits_per_sample() as u32),
        );
        attributes.push("nchannels", AttrValue::UInt(pixels.channels()));
        attributes.push("width", AttrValue::UInt(pixels.width()));
        attributes.push("height", AttrValue::UInt(pixels.height()));
        for (name, value) in decoded.attributes.iter() {
            attributes.push(name, value.clone());
        }
        debug!(
            path = %path.display(),
            %encoding,
            attributes = attributes.len(),
            "backend decoded"
        );

        Ok(CodecImage { pixels, attributes })
    }

    fn encode_to_vec(
        &self,
        pixels: &PixelBuffer,
        encoding: EncodingType,
        bit_depth: u8,
    ) -> CodecResult<Vec<u8>> {
        if !self.registry.can_backend_write(encoding) {
            return Err(CodecError::Unsupported(format!("no writer for {}", encoding)));
        }
        let unsupported_depth = || {
            CodecError::Unsupported(format!(
                "{} cannot be written at {} bits",
                encoding, bit_depth
            ))
        };
        trace!(%encoding, bit_depth, "backend encode");

        match encoding {
            EncodingType::Dpx => {
                let options = DpxWriterOptions {
                    bit_depth: BitDepth::from_bits(bit_depth).ok_or_else(unsupported_depth)?,
                    endianness: self.options.dpx_endianness,
                    creator: self.options.creator.clone(),
                };
                codec::dpx::encode(pixels, &options)
            }
            EncodingType::OpenExr => codec::exr::encode(pixels, bit_depth),
            EncodingType::Hdr if bit_depth == 32 => {
                codec::hdr::encode(pixels, self.options.creator.as_deref())
            }
            EncodingType::Tiff => codec::tiff::encode(pixels, bit_depth),
            EncodingType::Png => codec::png::encode(pixels, bit_depth),
            EncodingType::Jpeg if bit_depth == 8 => {
                codec::jpeg::encode(pixels, self.options.jpeg_quality)
            }
            EncodingType::Hdr | EncodingType::Jpeg => Err(unsupported_depth()),
            EncodingType::Unknown => Err(CodecError::Unsupported("unknown encoding".into())),
        }
    }
}
