//! PNG codec.
//!
//! Palette and sub-byte grayscale images are expanded to 8 bits on read;
//! 16-bit images stay 16-bit. The channel count of the file is preserved
//! (gray, gray+alpha, RGB, RGBA).

use super::CodecImage;
use crate::buffer::{PixelBuffer, SampleData};
use crate::error::{CodecError, CodecResult};
use crate::metadata::{AttrValue, RawAttributes};
use std::io::Cursor;

/// Decodes a PNG byte stream.
pub fn decode(bytes: &[u8]) -> CodecResult<CodecImage> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| CodecError::Decode(e.to_string()))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| CodecError::Decode("cannot determine PNG output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: png::DecodingError| CodecError::Decode(e.to_string()))?;
    let interlaced = reader.info().interlaced;
    buf.truncate(info.buffer_size());

    let channels = match info.color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        other => {
            return Err(CodecError::Unsupported(format!(
                "PNG color type {:?} after expansion",
                other
            )));
        }
    };
    let (bits, data) = match info.bit_depth {
        png::BitDepth::Eight => (8, SampleData::U8(buf)),
        png::BitDepth::Sixteen => (16, SampleData::U16(bytes_to_u16(&buf))),
        other => {
            return Err(CodecError::Unsupported(format!("PNG bit depth {:?}", other)));
        }
    };

    let pixels = PixelBuffer::new(info.width, info.height, channels, bits, data)
        .map_err(|e| CodecError::Decode(e.to_string()))?;

    let mut attributes = RawAttributes::new();
    attributes.push("compression", AttrValue::Str("deflate".into()));
    attributes.push("oiio:ColorSpace", AttrValue::Str("sRGB".into()));
    attributes.push("png:Interlaced", AttrValue::Bool(interlaced));

    Ok(CodecImage { pixels, attributes })
}

/// Encodes pixels as PNG at 8 or 16 bits.
pub fn encode(pixels: &PixelBuffer, bits: u8) -> CodecResult<Vec<u8>> {
    let color_type = match pixels.channels() {
        1 => png::ColorType::Grayscale,
        2 => png::ColorType::GrayscaleAlpha,
        3 => png::ColorType::Rgb,
        4 => png::ColorType::Rgba,
        n => return Err(CodecError::Unsupported(format!("PNG cannot store {} channels", n))),
    };
    let (depth, data) = match bits {
        8 => (
            png::BitDepth::Eight,
            pixels.to_code_values(8).into_iter().map(|v| v as u8).collect::<Vec<_>>(),
        ),
        16 => (
            png::BitDepth::Sixteen,
            pixels
                .to_code_values(16)
                .into_iter()
                .flat_map(|v| (v as u16).to_be_bytes())
                .collect(),
        ),
        other => return Err(CodecError::Unsupported(format!("PNG {} bit", other))),
    };

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, pixels.width(), pixels.height());
        encoder.set_color(color_type);
        encoder.set_depth(depth);
        encoder.set_compression(png::Compression::default());
        encoder.set_source_srgb(png::SrgbRenderingIntent::Perceptual);

        let mut writer = encoder
            .write_header()
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        writer
            .write_image_data(&data)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| CodecError::Encode(e.to_string()))?;
    }
    Ok(out)
}

/// Converts big-endian byte slice to u16 vector.
fn bytes_to_u16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_rgb8() {
        let (width, height) = (32u32, 16u32);
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x * 8) as u8, (y * 8) as u8, 128]);
            }
        }
        let src = PixelBuffer::from_u8(width, height, 3, data).unwrap();
        let bytes = encode(&src, 8).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.pixels, src);
    }

    #[test]
    fn test_roundtrip_gray_alpha16() {
        let data = vec![0, 65535, 1234, 40000, 7, 9];
        let src = PixelBuffer::from_u16(3, 1, 2, 16, data).unwrap();
        let decoded = decode(&encode(&src, 16).unwrap()).unwrap();
        assert_eq!(decoded.pixels, src);
    }

    #[test]
    fn test_ten_bit_source_is_rescaled() {
        let src = PixelBuffer::from_u16(1, 1, 1, 10, vec![1023]).unwrap();
        let decoded = decode(&encode(&src, 16).unwrap()).unwrap();
        assert_eq!(decoded.pixels.data(), &SampleData::U16(vec![65535]));
    }

    #[test]
    fn test_rejects_bad_input() {
        let src = PixelBuffer::from_u8(1, 1, 3, vec![0; 3]).unwrap();
        assert!(matches!(encode(&src, 12), Err(CodecError::Unsupported(_))));
        assert!(matches!(decode(b"\x89PNG\r\n\x1a\nshort"), Err(CodecError::Decode(_))));
    }
}
