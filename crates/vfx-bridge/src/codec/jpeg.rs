//! JPEG codec.
//!
//! Gray and RGB baseline images decode to 8-bit samples with their own
//! channel count. CMYK is converted to RGB; 16-bit lossless gray stays
//! 16-bit. Encoding is 8-bit only; alpha is dropped by the encoder.

use super::CodecImage;
use crate::buffer::{PixelBuffer, SampleData};
use crate::error::{CodecError, CodecResult};
use crate::metadata::{AttrValue, RawAttributes};
use std::io::Cursor;

/// Default encode quality.
pub const DEFAULT_QUALITY: u8 = 90;

/// Decodes a JPEG byte stream.
pub fn decode(bytes: &[u8]) -> CodecResult<CodecImage> {
    use jpeg_decoder::PixelFormat;

    let mut decoder = jpeg_decoder::Decoder::new(Cursor::new(bytes));
    let pixels = decoder
        .decode()
        .map_err(|e| match e {
            jpeg_decoder::Error::Unsupported(feature) => {
                CodecError::Unsupported(format!("JPEG {:?}", feature))
            }
            other => CodecError::Decode(other.to_string()),
        })?;
    let info = decoder
        .info()
        .ok_or_else(|| CodecError::Decode("missing JPEG info".into()))?;

    let (channels, bits, data) = match info.pixel_format {
        PixelFormat::L8 => (1, 8, SampleData::U8(pixels)),
        PixelFormat::RGB24 => (3, 8, SampleData::U8(pixels)),
        PixelFormat::L16 => {
            let samples = pixels
                .chunks_exact(2)
                .map(|s| u16::from_be_bytes([s[0], s[1]]))
                .collect();
            (1, 16, SampleData::U16(samples))
        }
        PixelFormat::CMYK32 => {
            let rgb = pixels
                .chunks_exact(4)
                .flat_map(|cmyk| {
                    let k = 1.0 - cmyk[3] as f32 / 255.0;
                    [0, 1, 2].map(|i| ((1.0 - cmyk[i] as f32 / 255.0) * k * 255.0).round() as u8)
                })
                .collect();
            (3, 8, SampleData::U8(rgb))
        }
    };

    let pixels = PixelBuffer::new(info.width as u32, info.height as u32, channels, bits, data)
        .map_err(|e| CodecError::Decode(e.to_string()))?;

    let mut attributes = RawAttributes::new();
    attributes.push("compression", AttrValue::Str("jpeg".into()));
    attributes.push("oiio:ColorSpace", AttrValue::Str("sRGB".into()));
    attributes.push(
        "jpeg:PixelFormat",
        AttrValue::Str(format!("{:?}", info.pixel_format)),
    );

    Ok(CodecImage { pixels, attributes })
}

/// Encodes pixels as 8-bit JPEG at `quality` (1-100).
pub fn encode(pixels: &PixelBuffer, quality: u8) -> CodecResult<Vec<u8>> {
    use jpeg_encoder::{ColorType, Encoder};

    let color_type = match pixels.channels() {
        1 => ColorType::Luma,
        3 => ColorType::Rgb,
        4 => ColorType::Rgba,
        n => return Err(CodecError::Unsupported(format!("JPEG cannot store {} channels", n))),
    };
    let (width, height) = match (u16::try_from(pixels.width()), u16::try_from(pixels.height())) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(CodecError::Unsupported(format!(
                "JPEG dimensions {}x{} exceed 65535",
                pixels.width(),
                pixels.height()
            )));
        }
    };

    let data: Vec<u8> = pixels.to_code_values(8).into_iter().map(|v| v as u8).collect();
    let mut buffer = Vec::new();
    let encoder = Encoder::new(&mut buffer, quality.clamp(1, 100));
    encoder
        .encode(&data, width, height, color_type)
        .map_err(|e: jpeg_encoder::EncodingError| CodecError::Encode(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_rgb(width: u32, height: u32, rgb: [u8; 3]) -> PixelBuffer {
        let data = (0..width * height).flat_map(|_| rgb).collect();
        PixelBuffer::from_u8(width, height, 3, data).unwrap()
    }

    #[test]
    fn test_roundtrip_is_close() {
        let src = flat_rgb(16, 16, [200, 100, 50]);
        let bytes = encode(&src, DEFAULT_QUALITY).unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.pixels.width(), 16);
        assert_eq!(decoded.pixels.channels(), 3);
        let SampleData::U8(out) = decoded.pixels.data() else {
            panic!("expected 8-bit samples");
        };
        for (a, b) in src.to_code_values(8).iter().zip(out) {
            assert!((*a as i32 - *b as i32).abs() <= 4, "{a} vs {b}");
        }
    }

    #[test]
    fn test_gray_stays_single_channel() {
        let src = PixelBuffer::from_u8(8, 8, 1, vec![77; 64]).unwrap();
        let decoded = decode(&encode(&src, 95).unwrap()).unwrap();
        assert_eq!(decoded.pixels.channels(), 1);
    }

    #[test]
    fn test_rejects_bad_input() {
        let two = PixelBuffer::from_u8(1, 1, 2, vec![0, 0]).unwrap();
        assert!(matches!(encode(&two, 90), Err(CodecError::Unsupported(_))));
        assert!(decode(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]).is_err());
    }
}
