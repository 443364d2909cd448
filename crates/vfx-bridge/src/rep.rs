//! Decoded image representation.
//!
//! An [`ImageRep`] bundles validated pixels with their classified
//! [`EncodingType`] and normalized [`ImageMetadata`]. It is only produced by
//! [`build`], which rejects buffers the crate cannot represent, so every
//! `ImageRep` in circulation has consistent geometry and a supported layout.
//!
//! Supported layouts:
//!
//! | Sample type | Significant bits | Channels |
//! |-------------|------------------|----------|
//! | `U8`  | 8       | 1-4 |
//! | `U16` | 9-16    | 1-4 |
//! | `F32` | 16, 32  | 1-4 |

use crate::buffer::{PixelBuffer, SampleData, SampleType, max_code_value};
use crate::{BridgeError, BridgeResult, EncodingType, ImageMetadata};

/// Validated pixels plus their encoding and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRep {
    pixels: PixelBuffer,
    encoding: EncodingType,
    metadata: ImageMetadata,
}

impl ImageRep {
    /// Wraps raw pixels with no metadata and an unknown encoding.
    ///
    /// ```
    /// use vfx_bridge::{EncodingType, ImageRep, PixelBuffer};
    ///
    /// let pixels = PixelBuffer::from_u8(2, 2, 3, vec![0; 12]).unwrap();
    /// let rep = ImageRep::from_pixels(pixels).unwrap();
    /// assert_eq!(rep.encoding(), EncodingType::Unknown);
    /// assert!(rep.metadata().is_empty());
    /// ```
    pub fn from_pixels(pixels: PixelBuffer) -> BridgeResult<Self> {
        build(pixels, ImageMetadata::empty(), EncodingType::Unknown)
    }

    /// Decoded samples.
    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Classified encoding type.
    pub fn encoding(&self) -> EncodingType {
        self.encoding
    }

    /// Normalized metadata. Empty for natively decoded images.
    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn channels(&self) -> u32 {
        self.pixels.channels()
    }

    pub fn bits_per_sample(&self) -> u8 {
        self.pixels.bits_per_sample()
    }

    /// Splits into pixels, encoding and metadata.
    pub fn into_parts(self) -> (PixelBuffer, EncodingType, ImageMetadata) {
        (self.pixels, self.encoding, self.metadata)
    }
}

/// Checks that `pixels` has a representable layout and that integer
/// samples fit their declared depth.
pub fn check_layout(pixels: &PixelBuffer) -> BridgeResult<()> {
    pixels.check_geometry()?;

    let channels = pixels.channels();
    if !(1..=4).contains(&channels) {
        return Err(BridgeError::UnsupportedSampleLayout(format!(
            "{} channels",
            channels
        )));
    }

    let bits = pixels.bits_per_sample();
    let supported = match pixels.sample_type() {
        SampleType::U8 => bits == 8,
        SampleType::U16 => (9..=16).contains(&bits),
        SampleType::F32 => bits == 16 || bits == 32,
    };
    if !supported {
        return Err(BridgeError::UnsupportedSampleLayout(format!(
            "{:?} samples at {} bits",
            pixels.sample_type(),
            bits
        )));
    }

    if let SampleData::U16(samples) = pixels.data() {
        let max = max_code_value(bits);
        if let Some(v) = samples.iter().find(|&&v| u32::from(v) > max) {
            return Err(BridgeError::UnsupportedSampleLayout(format!(
                "sample {} exceeds the {}-bit range",
                v, bits
            )));
        }
    }
    Ok(())
}

/// Builds an [`ImageRep`] after validating `pixels`.
///
/// # Errors
///
/// [`BridgeError::InvalidBufferGeometry`] when the sample count disagrees
/// with the declared geometry, [`BridgeError::UnsupportedSampleLayout`] for
/// layouts outside the table above.
pub fn build(
    pixels: PixelBuffer,
    metadata: ImageMetadata,
    encoding: EncodingType,
) -> BridgeResult<ImageRep> {
    check_layout(&pixels)?;
    Ok(ImageRep {
        pixels,
        encoding,
        metadata,
    })
}
