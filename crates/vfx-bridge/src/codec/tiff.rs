//! TIFF codec.
//!
//! Reads 8 and 16-bit integer and 32-bit float images with 1 to 4 channels,
//! keeping their native sample type. Writes uncompressed gray, RGB or RGBA
//! strips at 8, 16 or 32 (float) bits.

use super::CodecImage;
use crate::buffer::{PixelBuffer, SampleData};
use crate::error::{CodecError, CodecResult};
use crate::metadata::{AttrValue, RawAttributes};
use std::io::Cursor;
use tiff::encoder::{colortype, TiffEncoder, TiffValue};

fn decode_error(e: tiff::TiffError) -> CodecError {
    match e {
        tiff::TiffError::UnsupportedError(inner) => CodecError::Unsupported(inner.to_string()),
        other => CodecError::Decode(other.to_string()),
    }
}

fn encode_error(e: tiff::TiffError) -> CodecError {
    CodecError::Encode(e.to_string())
}

/// OIIO-style name for a TIFF compression tag value.
fn compression_name(tag: u32) -> String {
    match tag {
        1 => "none".to_string(),
        5 => "lzw".to_string(),
        7 => "jpeg".to_string(),
        8 | 32946 => "zip".to_string(),
        32773 => "packbits".to_string(),
        other => format!("tiff:{}", other),
    }
}

/// Decodes a TIFF byte stream.
pub fn decode(bytes: &[u8]) -> CodecResult<CodecImage> {
    use tiff::decoder::{Decoder, DecodingResult};
    use tiff::tags::Tag;
    use tiff::ColorType;

    let mut decoder = Decoder::new(Cursor::new(bytes)).map_err(decode_error)?;
    let (width, height) = decoder.dimensions().map_err(decode_error)?;
    let color_type = decoder.colortype().map_err(decode_error)?;
    let compression = decoder.get_tag_u32(Tag::Compression).unwrap_or(1);

    let channels = match color_type {
        ColorType::Gray(_) => 1,
        ColorType::Multiband { num_samples: 2, .. } => 2,
        ColorType::RGB(_) => 3,
        ColorType::RGBA(_) => 4,
        other => {
            return Err(CodecError::Unsupported(format!(
                "TIFF color type {:?}",
                other
            )));
        }
    };

    let (bits, data) = match decoder.read_image().map_err(decode_error)? {
        DecodingResult::U8(buf) => (8, SampleData::U8(buf)),
        DecodingResult::U16(buf) => (16, SampleData::U16(buf)),
        DecodingResult::F32(buf) => (32, SampleData::F32(buf)),
        _ => {
            return Err(CodecError::Unsupported(format!(
                "TIFF sample format of {:?}",
                color_type
            )));
        }
    };

    let pixels = PixelBuffer::new(width, height, channels, bits, data)
        .map_err(|e| CodecError::Decode(e.to_string()))?;

    let mut attributes = RawAttributes::new();
    attributes.push("compression", AttrValue::Str(compression_name(compression)));
    if let Ok(orientation) = decoder.get_tag_u32(Tag::Orientation) {
        attributes.push("Orientation", AttrValue::UInt(orientation));
    }
    if let Ok(software) = decoder.get_tag_ascii_string(Tag::Software) {
        attributes.push("Software", AttrValue::Str(software));
    }

    Ok(CodecImage { pixels, attributes })
}

fn write_tiff<C>(width: u32, height: u32, data: &[C::Inner]) -> CodecResult<Vec<u8>>
where
    C: colortype::ColorType,
    [C::Inner]: TiffValue,
{
    let mut out = Vec::new();
    {
        let mut encoder = TiffEncoder::new(Cursor::new(&mut out)).map_err(encode_error)?;
        encoder
            .write_image::<C>(width, height, data)
            .map_err(encode_error)?;
    }
    Ok(out)
}

/// Encodes pixels as TIFF at 8, 16 or 32 (float) bits.
pub fn encode(pixels: &PixelBuffer, bits: u8) -> CodecResult<Vec<u8>> {
    let (w, h) = (pixels.width(), pixels.height());
    let channels = pixels.channels();
    if !matches!(channels, 1 | 3 | 4) {
        return Err(CodecError::Unsupported(format!(
            "TIFF writer cannot store {} channels",
            channels
        )));
    }

    match bits {
        8 => {
            let data: Vec<u8> = pixels.to_code_values(8).into_iter().map(|v| v as u8).collect();
            match channels {
                1 => write_tiff::<colortype::Gray8>(w, h, &data),
                3 => write_tiff::<colortype::RGB8>(w, h, &data),
                _ => write_tiff::<colortype::RGBA8>(w, h, &data),
            }
        }
        16 => {
            let data: Vec<u16> = pixels.to_code_values(16).into_iter().map(|v| v as u16).collect();
            match channels {
                1 => write_tiff::<colortype::Gray16>(w, h, &data),
                3 => write_tiff::<colortype::RGB16>(w, h, &data),
                _ => write_tiff::<colortype::RGBA16>(w, h, &data),
            }
        }
        32 => {
            let data = pixels.to_f32();
            match channels {
                1 => write_tiff::<colortype::Gray32Float>(w, h, &data),
                3 => write_tiff::<colortype::RGB32Float>(w, h, &data),
                _ => write_tiff::<colortype::RGBA32Float>(w, h, &data),
            }
        }
        other => Err(CodecError::Unsupported(format!("TIFF {} bit", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_rgb16() {
        let data: Vec<u16> = (0..4 * 3 * 3).map(|i| (i * 1777) as u16).collect();
        let src = PixelBuffer::from_u16(4, 3, 3, 16, data).unwrap();
        let bytes = encode(&src, 16).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.pixels, src);

        let compression = decoded
            .attributes
            .iter()
            .find(|(k, _)| *k == "compression")
            .map(|(_, v)| v.clone());
        assert_eq!(compression, Some(AttrValue::Str("none".into())));
    }

    #[test]
    fn test_roundtrip_gray8_and_float() {
        let gray = PixelBuffer::from_u8(5, 2, 1, (0..10).collect()).unwrap();
        assert_eq!(decode(&encode(&gray, 8).unwrap()).unwrap().pixels, gray);

        let ramp = (0..16).map(|i| i as f32 * 0.125).collect();
        let float = PixelBuffer::from_f32(2, 2, 4, ramp).unwrap();
        assert_eq!(decode(&encode(&float, 32).unwrap()).unwrap().pixels, float);
    }

    /// Little-endian, uncompressed, single strip, 8-bit gray plus one extra
    /// sample per pixel.
    fn gray_alpha_tiff(width: u16, height: u16, samples: &[u8]) -> Vec<u8> {
        const SHORT: u16 = 3;
        const LONG: u16 = 4;
        let entries: [(u16, u16, u32, u32); 9] = [
            (256, SHORT, 1, width as u32),
            (257, SHORT, 1, height as u32),
            (258, SHORT, 2, 8 | (8 << 16)),
            (259, SHORT, 1, 1),
            (262, SHORT, 1, 1),
            (273, LONG, 1, 8 + 2 + 9 * 12 + 4),
            (277, SHORT, 1, 2),
            (278, SHORT, 1, height as u32),
            (279, LONG, 1, samples.len() as u32),
        ];

        let mut out = b"II*\0".to_vec();
        out.extend_from_slice(&8u32.to_le_bytes());
        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for (tag, kind, count, value) in entries {
            out.extend_from_slice(&tag.to_le_bytes());
            out.extend_from_slice(&kind.to_le_bytes());
            out.extend_from_slice(&count.to_le_bytes());
            out.extend_from_slice(&value.to_le_bytes());
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(samples);
        out
    }

    #[test]
    fn test_decodes_gray_alpha() {
        let samples = [10, 255, 200, 128, 0, 64];
        let decoded = decode(&gray_alpha_tiff(3, 1, &samples)).unwrap();
        let expected = PixelBuffer::from_u8(3, 1, 2, samples.to_vec()).unwrap();
        assert_eq!(decoded.pixels, expected);
    }

    #[test]
    fn test_rejects_bad_input() {
        let two = PixelBuffer::from_u8(1, 1, 2, vec![0, 0]).unwrap();
        assert!(matches!(encode(&two, 8), Err(CodecError::Unsupported(_))));
        assert!(decode(b"II*\0garbage").is_err());
    }

    #[test]
    fn test_compression_names() {
        assert_eq!(compression_name(5), "lzw");
        assert_eq!(compression_name(8), "zip");
        assert_eq!(compression_name(99), "tiff:99");
    }
}
