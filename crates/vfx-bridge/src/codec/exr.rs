//! OpenEXR codec.
//!
//! Reads the first layer that carries RGB(A) channels at its largest
//! resolution level. Files without an `A` channel decode to 3 channels.
//! Half-float files report 16 bits per sample, everything else 32; samples
//! are always held as `F32`.
//!
//! Writing produces a single `RGB` or `RGBA` layer, as half floats at 16 bits
//! and full floats at 32, with lossless compression. Single-channel input is
//! replicated into RGB.

use super::CodecImage;
use crate::buffer::PixelBuffer;
use crate::error::{CodecError, CodecResult};
use crate::metadata::{AttrValue, RawAttributes};
use std::io::Cursor;

struct ExrPixels {
    width: usize,
    channels: usize,
    half: bool,
    data: Vec<f32>,
}

fn decode_error(err: exr::error::Error) -> CodecError {
    match err {
        exr::error::Error::NotSupported(msg) => CodecError::Unsupported(format!("EXR: {}", msg)),
        other => CodecError::Decode(other.to_string()),
    }
}

/// OIIO-style name for an EXR compression method.
fn compression_name(compression: exr::compression::Compression) -> String {
    let debug = format!("{:?}", compression).to_lowercase();
    let base = debug.split('(').next().unwrap_or_default();
    match base {
        "uncompressed" => "none".to_string(),
        "zip1" => "zips".to_string(),
        "zip16" => "zip".to_string(),
        other => other.to_string(),
    }
}

/// Decodes an OpenEXR byte stream.
pub fn decode(bytes: &[u8]) -> CodecResult<CodecImage> {
    use exr::meta::attribute::SampleType as ExrSampleType;
    use exr::prelude::*;

    let image = read()
        .no_deep_data()
        .largest_resolution_level()
        .rgba_channels(
            |resolution: Vec2<usize>, channels: &RgbaChannels| {
                let count = if channels.3.is_some() { 4 } else { 3 };
                ExrPixels {
                    width: resolution.width(),
                    channels: count,
                    half: channels.0.sample_type == ExrSampleType::F16,
                    data: vec![0.0; resolution.width() * resolution.height() * count],
                }
            },
            |pixels: &mut ExrPixels, position: Vec2<usize>, (r, g, b, a): (f32, f32, f32, f32)| {
                let idx = (position.y() * pixels.width + position.x()) * pixels.channels;
                let rgba = [r, g, b, a];
                if let Some(dst) = pixels.data.get_mut(idx..idx + pixels.channels) {
                    dst.copy_from_slice(&rgba[..dst.len()]);
                }
            },
        )
        .first_valid_layer()
        .all_attributes()
        .from_buffered(Cursor::new(bytes))
        .map_err(decode_error)?;

    let layer = &image.layer_data;
    let width = layer.size.width() as u32;
    let height = layer.size.height() as u32;
    let pixels = &layer.channel_data.pixels;

    let mut attributes = RawAttributes::new();
    attributes.push(
        "compression",
        AttrValue::Str(compression_name(layer.encoding.compression)),
    );
    attributes.push("oiio:ColorSpace", AttrValue::Str("linear".into()));
    attributes.push(
        "PixelAspectRatio",
        AttrValue::Float(image.attributes.pixel_aspect),
    );
    if let Some(name) = &layer.attributes.layer_name {
        attributes.push("exr:LayerName", AttrValue::Str(name.to_string()));
    }
    if let Some(software) = &layer.attributes.software_name {
        attributes.push("Software", AttrValue::Str(software.to_string()));
    }
    if let Some(owner) = &layer.attributes.owner {
        attributes.push("Copyright", AttrValue::Str(owner.to_string()));
    }
    if let Some(comments) = &layer.attributes.comments {
        attributes.push("ImageDescription", AttrValue::Str(comments.to_string()));
    }

    let bits = if pixels.half { 16 } else { 32 };
    let buffer = PixelBuffer::new(
        width,
        height,
        pixels.channels as u32,
        bits,
        crate::SampleData::F32(pixels.data.clone()),
    )
    .map_err(|e| CodecError::Decode(e.to_string()))?;

    Ok(CodecImage {
        pixels: buffer,
        attributes,
    })
}

/// Encodes pixels as OpenEXR at 16 (half) or 32 (float) bits.
pub fn encode(pixels: &PixelBuffer, bits: u8) -> CodecResult<Vec<u8>> {
    use exr::prelude::*;
    use half::f16;

    let channels = pixels.channels() as usize;
    if !matches!(channels, 1 | 3 | 4) {
        return Err(CodecError::Unsupported(format!(
            "EXR cannot store {} channels",
            channels
        )));
    }
    let half = match bits {
        16 => true,
        32 => false,
        other => return Err(CodecError::Unsupported(format!("EXR {} bit", other))),
    };

    let width = pixels.width() as usize;
    let size = (width, pixels.height() as usize);
    let data = pixels.to_f32();
    let sample = move |pos: Vec2<usize>, c: usize| -> f32 {
        let base = (pos.y() * width + pos.x()) * channels;
        if channels == 1 {
            data[base]
        } else {
            data[base + c]
        }
    };

    let mut out = Vec::new();
    let result = match (channels == 4, half) {
        (true, true) => Image::from_layer(Layer::new(
            size,
            LayerAttributes::named("RGBA"),
            Encoding::SMALL_LOSSLESS,
            SpecificChannels::rgba(|pos: Vec2<usize>| {
                (
                    f16::from_f32(sample(pos, 0)),
                    f16::from_f32(sample(pos, 1)),
                    f16::from_f32(sample(pos, 2)),
                    f16::from_f32(sample(pos, 3)),
                )
            }),
        ))
        .write()
        .to_buffered(Cursor::new(&mut out)),
        (true, false) => Image::from_layer(Layer::new(
            size,
            LayerAttributes::named("RGBA"),
            Encoding::SMALL_LOSSLESS,
            SpecificChannels::rgba(|pos: Vec2<usize>| {
                (sample(pos, 0), sample(pos, 1), sample(pos, 2), sample(pos, 3))
            }),
        ))
        .write()
        .to_buffered(Cursor::new(&mut out)),
        (false, true) => Image::from_layer(Layer::new(
            size,
            LayerAttributes::named("RGB"),
            Encoding::SMALL_LOSSLESS,
            SpecificChannels::rgb(|pos: Vec2<usize>| {
                (
                    f16::from_f32(sample(pos, 0)),
                    f16::from_f32(sample(pos, 1)),
                    f16::from_f32(sample(pos, 2)),
                )
            }),
        ))
        .write()
        .to_buffered(Cursor::new(&mut out)),
        (false, false) => Image::from_layer(Layer::new(
            size,
            LayerAttributes::named("RGB"),
            Encoding::SMALL_LOSSLESS,
            SpecificChannels::rgb(|pos: Vec2<usize>| {
                (sample(pos, 0), sample(pos, 1), sample(pos, 2))
            }),
        ))
        .write()
        .to_buffered(Cursor::new(&mut out)),
    };
    result.map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(out)
}
