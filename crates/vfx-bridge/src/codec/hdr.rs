//! Radiance HDR (RGBE) codec.
//!
//! Reads flat and RLE scanlines; writes RLE whenever the width allows it.
//! Decoded images are always 3-channel `F32`. Encoding accepts 1, 3 or 4
//! channels: gray is replicated and alpha is dropped.

use super::CodecImage;
use crate::buffer::PixelBuffer;
use crate::error::{CodecError, CodecResult};
use crate::metadata::{AttrValue, RawAttributes};
use std::io::{self, BufRead, Cursor, Read, Write};

const HDR_MAGIC: &str = "#?";
const DEFAULT_FORMAT: &str = "32-bit_rle_rgbe";

fn truncated(e: io::Error) -> CodecError {
    CodecError::Decode(format!("truncated HDR data: {}", e))
}

/// Decodes a Radiance HDR byte stream.
pub fn decode(bytes: &[u8]) -> CodecResult<CodecImage> {
    let mut reader = Cursor::new(bytes);
    let header = read_header(&mut reader)?;

    let remaining = bytes.len() as u64 - reader.position();
    let pixels = header.width as u64 * header.height as u64;
    if pixels > (remaining + 1) * 64 {
        return Err(CodecError::Decode(format!(
            "HDR resolution {}x{} exceeds available data",
            header.width, header.height
        )));
    }

    let (data, rle) = read_pixels(&mut reader, header.width as usize, header.height as usize)?;

    let mut attributes = header.attributes;
    let colorspace = if header.format.to_lowercase().contains("xyze") {
        "xyz"
    } else {
        "linear"
    };
    attributes.push("oiio:ColorSpace", AttrValue::Str(colorspace.into()));
    attributes.push(
        "compression",
        AttrValue::Str(if rle { "rle" } else { "none" }.into()),
    );

    let pixels = PixelBuffer::from_f32(header.width, header.height, 3, data)
        .map_err(|e| CodecError::Decode(e.to_string()))?;
    Ok(CodecImage { pixels, attributes })
}

/// Encodes pixels as RGBE. `software` is written to the `SOFTWARE` field.
pub fn encode(pixels: &PixelBuffer, software: Option<&str>) -> CodecResult<Vec<u8>> {
    if !matches!(pixels.channels(), 1 | 3 | 4) {
        return Err(CodecError::Unsupported(format!(
            "HDR cannot store {} channels",
            pixels.channels()
        )));
    }
    let mut out = Vec::new();
    writeln!(out, "{}RADIANCE", HDR_MAGIC)?;
    writeln!(out, "FORMAT={}", DEFAULT_FORMAT)?;
    if let Some(software) = software {
        writeln!(out, "SOFTWARE={}", software)?;
    }
    writeln!(out)?;
    writeln!(out, "-Y {} +X {}", pixels.height(), pixels.width())?;
    write_pixels(&mut out, pixels)?;
    Ok(out)
}

struct HdrHeader {
    width: u32,
    height: u32,
    format: String,
    attributes: RawAttributes,
}

/// Reads one header line, replacing bytes that are not UTF-8.
fn next_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> CodecResult<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf).map_err(truncated)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

fn read_header<R: BufRead>(reader: &mut R) -> CodecResult<HdrHeader> {
    let mut attributes = RawAttributes::new();
    let mut buf = Vec::new();

    let first = next_line(reader, &mut buf)?.unwrap_or_default();
    let magic_line = trim_line(&first);
    if !magic_line.starts_with(HDR_MAGIC) {
        return Err(CodecError::Decode("HDR magic not found".into()));
    }
    let format_id = magic_line.trim_start_matches(HDR_MAGIC);
    if !format_id.is_empty() {
        attributes.push("hdr:FormatIdentifier", AttrValue::Str(format_id.to_string()));
    }

    let mut resolution = None;
    let mut format = DEFAULT_FORMAT.to_string();

    while let Some(line) = next_line(reader, &mut buf)? {
        let line = trim_line(&line);
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('+') || line.starts_with('-') {
            let parsed = parse_resolution(line).ok_or_else(|| {
                CodecError::Decode(format!("invalid HDR resolution line '{}'", line))
            })?;
            resolution = Some(parsed);
            break;
        }

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim();
            let name = match key.to_uppercase().as_str() {
                "FORMAT" => {
                    format = value.to_string();
                    "hdr:Format".to_string()
                }
                "EXPOSURE" => "Exposure".to_string(),
                "GAMMA" => "Gamma".to_string(),
                "PIXASPECT" => "PixelAspectRatio".to_string(),
                "SOFTWARE" => "Software".to_string(),
                "PRIMARIES" => "Primaries".to_string(),
                "COLORCORR" => "ColorCorrection".to_string(),
                "VIEW" => "View".to_string(),
                _ => format!("hdr:{}", key),
            };
            let numeric = matches!(name.as_str(), "Exposure" | "Gamma" | "PixelAspectRatio");
            let value = match value.parse::<f32>() {
                Ok(v) if numeric => AttrValue::Float(v),
                _ => AttrValue::Str(value.to_string()),
            };
            attributes.push(name, value);
        }
    }

    let (width, height) =
        resolution.ok_or_else(|| CodecError::Decode("missing HDR resolution line".into()))?;
    Ok(HdrHeader {
        width,
        height,
        format,
        attributes,
    })
}

/// Returns RGB floats and whether scanlines were run-length encoded.
fn read_pixels<R: Read>(
    reader: &mut R,
    width: usize,
    height: usize,
) -> CodecResult<(Vec<f32>, bool)> {
    let mut first = [0u8; 4];
    reader.read_exact(&mut first).map_err(truncated)?;

    let use_rle = (8..=0x7fff).contains(&width)
        && first[0] == 2
        && first[1] == 2
        && ((first[2] as usize) << 8 | first[3] as usize) == width;

    let mut rgbe = vec![0u8; width * height * 4];
    if use_rle {
        let mut header = first;
        for (y, scanline) in rgbe.chunks_exact_mut(width * 4).enumerate() {
            if y > 0 {
                reader.read_exact(&mut header).map_err(truncated)?;
            }
            decode_rle_scanline(reader, width, scanline, header)?;
        }
    } else {
        rgbe[0..4].copy_from_slice(&first);
        reader.read_exact(&mut rgbe[4..]).map_err(truncated)?;
    }

    let mut data = Vec::with_capacity(width * height * 3);
    for chunk in rgbe.chunks_exact(4) {
        data.extend(rgbe_to_f32(chunk[0], chunk[1], chunk[2], chunk[3]));
    }
    Ok((data, use_rle))
}

fn decode_rle_scanline<R: Read>(
    reader: &mut R,
    width: usize,
    out: &mut [u8],
    header: [u8; 4],
) -> CodecResult<()> {
    if header[0] != 2 || header[1] != 2 {
        return Err(CodecError::Decode("HDR RLE header invalid".into()));
    }
    let encoded_width = ((header[2] as usize) << 8) | (header[3] as usize);
    if encoded_width != width {
        return Err(CodecError::Decode("HDR RLE width mismatch".into()));
    }

    let mut channel = vec![0u8; width];
    for c in 0..4 {
        let mut idx = 0usize;
        while idx < width {
            let mut count = [0u8; 1];
            reader.read_exact(&mut count).map_err(truncated)?;
            let (run, repeat) = match count[0] as usize {
                n if n > 128 => (n - 128, true),
                n => (n, false),
            };
            if run == 0 || idx + run > width {
                return Err(CodecError::Decode("HDR RLE run overflows scanline".into()));
            }
            if repeat {
                let mut value = [0u8; 1];
                reader.read_exact(&mut value).map_err(truncated)?;
                channel[idx..idx + run].fill(value[0]);
            } else {
                reader
                    .read_exact(&mut channel[idx..idx + run])
                    .map_err(truncated)?;
            }
            idx += run;
        }
        for (x, &v) in channel.iter().enumerate() {
            out[x * 4 + c] = v;
        }
    }
    Ok(())
}

fn write_pixels<W: Write>(writer: &mut W, pixels: &PixelBuffer) -> CodecResult<()> {
    let width = pixels.width() as usize;
    let channels = pixels.channels() as usize;
    let f32_data = pixels.to_f32();
    let use_rle = (8..=0x7fff).contains(&width);

    let mut scanline = vec![0u8; width * 4];
    for row in f32_data.chunks_exact(width * channels) {
        for (x, px) in row.chunks_exact(channels).enumerate() {
            let (r, g, b) = match px {
                [v] => (*v, *v, *v),
                [r, g, b, ..] => (*r, *g, *b),
                _ => (0.0, 0.0, 0.0),
            };
            scanline[x * 4..x * 4 + 4].copy_from_slice(&f32_to_rgbe(r, g, b));
        }

        if use_rle {
            writer.write_all(&[2u8, 2u8, (width >> 8) as u8, (width & 0xFF) as u8])?;
            encode_rle_scanline(writer, width, &scanline)?;
        } else {
            writer.write_all(&scanline)?;
        }
    }
    Ok(())
}

fn encode_rle_scanline<W: Write>(writer: &mut W, width: usize, scanline: &[u8]) -> io::Result<()> {
    let mut channel = vec![0u8; width];
    for c in 0..4 {
        for (x, v) in channel.iter_mut().enumerate() {
            *v = scanline[x * 4 + c];
        }
        writer.write_all(&encode_rle_channel(&channel))?;
    }
    Ok(())
}

fn run_length(data: &[u8], i: usize) -> usize {
    let mut run = 1usize;
    while i + run < data.len() && run < 127 && data[i] == data[i + run] {
        run += 1;
    }
    run
}

fn encode_rle_channel(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut i = 0usize;
    while i < data.len() {
        let run = run_length(data, i);
        if run >= 4 {
            out.push((128 + run) as u8);
            out.push(data[i]);
            i += run;
            continue;
        }

        let start = i;
        let mut literal = 0usize;
        while i < data.len() && literal < 128 && run_length(data, i) < 4 {
            i += 1;
            literal += 1;
        }
        out.push(literal as u8);
        out.extend_from_slice(&data[start..start + literal]);
    }
    out
}

fn f32_to_rgbe(r: f32, g: f32, b: f32) -> [u8; 4] {
    let r = r.max(0.0);
    let g = g.max(0.0);
    let b = b.max(0.0);
    let max = r.max(g).max(b);
    if max < 1.0e-32 {
        return [0, 0, 0, 0];
    }

    let (m, e) = frexp(max);
    let scale = m * 256.0 / max;
    [
        (r * scale).clamp(0.0, 255.0) as u8,
        (g * scale).clamp(0.0, 255.0) as u8,
        (b * scale).clamp(0.0, 255.0) as u8,
        (e + 128).clamp(0, 255) as u8,
    ]
}

fn rgbe_to_f32(r: u8, g: u8, b: u8, e: u8) -> [f32; 3] {
    if e == 0 {
        return [0.0; 3];
    }
    let f = 2.0_f32.powi(e as i32 - 136);
    [r as f32 * f, g as f32 * f, b as f32 * f]
}

fn frexp(x: f32) -> (f32, i32) {
    if x == 0.0 {
        return (0.0, 0);
    }
    let e = x.abs().log2().floor() as i32 + 1;
    (x / 2.0_f32.powi(e), e)
}

fn parse_resolution(line: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 4 {
        return None;
    }

    let mut width = 0u32;
    let mut height = 0u32;
    for pair in parts.chunks_exact(2) {
        let value: u32 = pair[1].parse().ok()?;
        if pair[0].ends_with('X') {
            width = value;
        } else if pair[0].ends_with('Y') {
            height = value;
        }
    }
    (width > 0 && height > 0).then_some((width, height))
}

fn trim_line(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}
