//! DPX (Digital Picture Exchange) codec.
//!
//! The cinema intermediate format. Defined by SMPTE 268M.
//!
//! # Bit Depth
//!
//! | Depth | Storage | Packing written | Max Value |
//! |-------|---------|-----------------|-----------|
//! | 8-bit | 1 byte/sample, rows padded to 4 bytes | 0 | 255 |
//! | 10-bit | 3 samples per u32, rows start on a word | 1 (filled A) | 1023 |
//! | 12-bit | 1 u16/sample, MSB aligned, rows padded to 4 bytes | 1 (filled A) | 4095 |
//! | 16-bit | 1 u16/sample, rows padded to 4 bytes | 0 | 65535 |
//!
//! Decoding keeps integer code values: 8-bit files give `U8` samples, deeper
//! files give `U16` samples with `bits_per_sample` set to the file depth. The
//! reader also accepts filled method B for 10 and 12-bit data.
//!
//! # Format Details
//!
//! - Magic: "SDPX" (big-endian) or "XPDS" (little-endian)
//! - Header: 2048 bytes written; at least the 1664-byte generic header is
//!   required on read
//! - Descriptors: 6 (luma), 50 (RGB), 51 (RGBA), 52 (ABGR, read only)

use super::CodecImage;
use crate::buffer::{PixelBuffer, SampleData};
use crate::error::{CodecError, CodecResult};
use crate::metadata::{AttrValue, RawAttributes};
use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

// === Constants ===

/// "SDPX" read with the file's own byte order.
const MAGIC: u32 = 0x5344_5058;
/// Header size written by [`encode`].
const HEADER_SIZE: usize = 2048;
/// File header plus image header; the minimum a reader needs.
const GENERIC_HEADER_SIZE: usize = 1664;
/// Industry header size written by [`encode`].
const INDUSTRY_HEADER_SIZE: u32 = 384;

const DESC_LUMA: u8 = 6;
const DESC_RGB: u8 = 50;
const DESC_RGBA: u8 = 51;
const DESC_ABGR: u8 = 52;

// === Bit Depth ===

/// DPX bit depth options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    /// 8 bits per channel (0-255).
    Bit8,
    /// 10 bits per channel, packed (0-1023). Film standard.
    #[default]
    Bit10,
    /// 12 bits per channel (0-4095).
    Bit12,
    /// 16 bits per channel (0-65535).
    Bit16,
}

impl BitDepth {
    /// Returns the bit depth as a number.
    #[inline]
    pub fn bits(&self) -> u8 {
        match self {
            BitDepth::Bit8 => 8,
            BitDepth::Bit10 => 10,
            BitDepth::Bit12 => 12,
            BitDepth::Bit16 => 16,
        }
    }

    /// Returns the maximum code value for this bit depth.
    #[inline]
    pub fn max_value(&self) -> u32 {
        (1u32 << self.bits()) - 1
    }

    /// Creates BitDepth from bit count.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            8 => Some(BitDepth::Bit8),
            10 => Some(BitDepth::Bit10),
            12 => Some(BitDepth::Bit12),
            16 => Some(BitDepth::Bit16),
            _ => None,
        }
    }

    /// Packing field written for this depth.
    fn packing(&self) -> u16 {
        match self {
            BitDepth::Bit10 | BitDepth::Bit12 => 1,
            BitDepth::Bit8 | BitDepth::Bit16 => 0,
        }
    }
}

/// Byte order (endianness).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    /// Big-endian. Default for DPX.
    #[default]
    Big,
    /// Little-endian.
    Little,
}

impl Endianness {
    fn tag(&self) -> &'static str {
        match self {
            Endianness::Big => "BE",
            Endianness::Little => "LE",
        }
    }
}

// === Writer Options ===

/// Options for writing DPX files.
///
/// ```
/// use vfx_bridge::codec::dpx::{BitDepth, DpxWriterOptions, Endianness};
///
/// let options = DpxWriterOptions {
///     bit_depth: BitDepth::Bit12,
///     endianness: Endianness::Little,
///     ..Default::default()
/// };
/// assert_eq!(options.creator.as_deref(), Some("vfx-bridge"));
/// ```
#[derive(Debug, Clone)]
pub struct DpxWriterOptions {
    /// Output bit depth. Default: 10-bit.
    pub bit_depth: BitDepth,
    /// Output endianness. Default: Big-endian.
    pub endianness: Endianness,
    /// Creator software name (written to header).
    pub creator: Option<String>,
}

impl Default for DpxWriterOptions {
    fn default() -> Self {
        Self {
            bit_depth: BitDepth::Bit10,
            endianness: Endianness::Big,
            creator: Some("vfx-bridge".to_string()),
        }
    }
}

// === Header ===

#[derive(Debug, Clone)]
struct DpxHeader {
    image_offset: u32,
    file_size: u32,
    orientation: u16,
    width: u32,
    height: u32,
    descriptor: u8,
    transfer: u8,
    colorimetric: u8,
    bit_depth: u8,
    packing: u16,
    encoding: u16,
    creator: String,
    endianness: Endianness,
}

impl DpxHeader {
    fn parse(bytes: &[u8]) -> CodecResult<Self> {
        if bytes.len() < GENERIC_HEADER_SIZE {
            return Err(CodecError::Decode(format!(
                "truncated DPX header: {} bytes",
                bytes.len()
            )));
        }
        match &bytes[..4] {
            b"SDPX" => Ok(Self::parse_with::<BigEndian>(bytes, Endianness::Big)),
            b"XPDS" => Ok(Self::parse_with::<LittleEndian>(bytes, Endianness::Little)),
            other => Err(CodecError::Decode(format!("invalid DPX magic: {:02X?}", other))),
        }
    }

    fn parse_with<E: ByteOrder>(bytes: &[u8], endianness: Endianness) -> Self {
        Self {
            image_offset: E::read_u32(&bytes[4..8]),
            file_size: E::read_u32(&bytes[16..20]),
            orientation: E::read_u16(&bytes[768..770]),
            width: E::read_u32(&bytes[772..776]),
            height: E::read_u32(&bytes[776..780]),
            descriptor: bytes[800],
            transfer: bytes[801],
            colorimetric: bytes[802],
            bit_depth: bytes[803],
            packing: E::read_u16(&bytes[804..806]),
            encoding: E::read_u16(&bytes[806..808]),
            creator: c_string(&bytes[160..260]),
            endianness,
        }
    }

    fn channels(&self) -> CodecResult<u32> {
        match self.descriptor {
            DESC_LUMA => Ok(1),
            DESC_RGB => Ok(3),
            DESC_RGBA | DESC_ABGR => Ok(4),
            other => Err(CodecError::Unsupported(format!("DPX descriptor {}", other))),
        }
    }

    fn attributes(&self) -> RawAttributes {
        let mut attrs = RawAttributes::new();
        attrs.push(
            "oiio:ColorSpace",
            AttrValue::Str(if self.transfer == 2 { "linear" } else { "log" }.to_string()),
        );
        attrs.push("Orientation", AttrValue::UInt(self.orientation as u32));
        attrs.push("dpx:Transfer", AttrValue::UInt(self.transfer as u32));
        attrs.push("dpx:Colorimetric", AttrValue::UInt(self.colorimetric as u32));
        attrs.push("dpx:Descriptor", AttrValue::UInt(self.descriptor as u32));
        attrs.push("dpx:Packing", AttrValue::UInt(self.packing as u32));
        attrs.push("dpx:Endian", AttrValue::Str(self.endianness.tag().to_string()));
        attrs.push("dpx:ImageOffset", AttrValue::UInt(self.image_offset));
        attrs.push("dpx:FileSize", AttrValue::UInt(self.file_size));
        if !self.creator.is_empty() {
            attrs.push("Software", AttrValue::Str(self.creator.clone()));
        }
        attrs
    }
}

fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

/// Bytes in one stored row of `samples` samples.
fn row_bytes(samples: usize, depth: BitDepth) -> usize {
    match depth {
        BitDepth::Bit8 => samples.div_ceil(4) * 4,
        BitDepth::Bit10 => samples.div_ceil(3) * 4,
        BitDepth::Bit12 | BitDepth::Bit16 => (samples * 2).div_ceil(4) * 4,
    }
}

// === Decode ===

/// Decodes a DPX byte stream.
pub fn decode(bytes: &[u8]) -> CodecResult<CodecImage> {
    let header = DpxHeader::parse(bytes)?;
    let channels = header.channels()?;
    if header.width == 0 || header.height == 0 {
        return Err(CodecError::Decode(format!(
            "invalid DPX dimensions {}x{}",
            header.width, header.height
        )));
    }
    if header.encoding != 0 {
        return Err(CodecError::Unsupported("run-length encoded DPX".into()));
    }
    let depth = BitDepth::from_bits(header.bit_depth)
        .ok_or_else(|| CodecError::Unsupported(format!("DPX {} bit", header.bit_depth)))?;

    let row_samples = header.width as usize * channels as usize;
    let row_len = row_bytes(row_samples, depth);
    let start = header.image_offset as usize;
    let end = (header.height as usize)
        .checked_mul(row_len)
        .and_then(|n| n.checked_add(start))
        .ok_or_else(|| CodecError::Decode("DPX image size overflow".into()))?;
    if start < GENERIC_HEADER_SIZE || bytes.len() < end {
        return Err(CodecError::Decode(format!(
            "truncated DPX image data: need {} bytes, have {}",
            end,
            bytes.len()
        )));
    }
    let body = &bytes[start..end];

    let mut data = match header.endianness {
        Endianness::Big => {
            read_rows::<BigEndian>(body, row_samples, row_len, depth, header.packing)?
        }
        Endianness::Little => {
            read_rows::<LittleEndian>(body, row_samples, row_len, depth, header.packing)?
        }
    };
    if header.descriptor == DESC_ABGR {
        match &mut data {
            SampleData::U8(v) => v.chunks_exact_mut(4).for_each(<[u8]>::reverse),
            SampleData::U16(v) => v.chunks_exact_mut(4).for_each(<[u16]>::reverse),
            SampleData::F32(_) => {}
        }
    }

    let pixels = PixelBuffer::new(header.width, header.height, channels, depth.bits(), data)
        .map_err(|e| CodecError::Decode(e.to_string()))?;
    Ok(CodecImage {
        pixels,
        attributes: header.attributes(),
    })
}

fn read_rows<E: ByteOrder>(
    body: &[u8],
    row_samples: usize,
    row_len: usize,
    depth: BitDepth,
    packing: u16,
) -> CodecResult<SampleData> {
    let rows = body.chunks_exact(row_len);
    let capacity = rows.len() * row_samples;
    match depth {
        BitDepth::Bit8 => {
            let mut out = Vec::with_capacity(capacity);
            for row in rows {
                out.extend_from_slice(&row[..row_samples]);
            }
            Ok(SampleData::U8(out))
        }
        BitDepth::Bit10 => {
            // Filled A: samples in bits 31-22, 21-12, 11-2. Filled B: 29-20, 19-10, 9-0.
            let shifts: [u32; 3] = match packing {
                1 => [22, 12, 2],
                2 => [20, 10, 0],
                p => return Err(CodecError::Unsupported(format!("10-bit DPX packing {}", p))),
            };
            let mut out = Vec::with_capacity(capacity);
            for row in rows {
                let words = row.chunks_exact(4).map(E::read_u32);
                let samples = words.flat_map(|w| shifts.map(|s| ((w >> s) & 0x3FF) as u16));
                out.extend(samples.take(row_samples));
            }
            Ok(SampleData::U16(out))
        }
        BitDepth::Bit12 => {
            let shift = match packing {
                1 => 4,
                2 => 0,
                p => return Err(CodecError::Unsupported(format!("12-bit DPX packing {}", p))),
            };
            let mut out = Vec::with_capacity(capacity);
            for row in rows {
                out.extend(
                    row[..row_samples * 2]
                        .chunks_exact(2)
                        .map(|s| (E::read_u16(s) >> shift) & 0x0FFF),
                );
            }
            Ok(SampleData::U16(out))
        }
        BitDepth::Bit16 => {
            let mut out = Vec::with_capacity(capacity);
            for row in rows {
                out.extend(row[..row_samples * 2].chunks_exact(2).map(E::read_u16));
            }
            Ok(SampleData::U16(out))
        }
    }
}

// === Encode ===

/// Encodes pixels into a DPX byte stream.
///
/// Integer sources already at the target depth are written unchanged; other
/// sources are rescaled to the target code range.
pub fn encode(pixels: &PixelBuffer, options: &DpxWriterOptions) -> CodecResult<Vec<u8>> {
    let descriptor = match pixels.channels() {
        1 => DESC_LUMA,
        3 => DESC_RGB,
        4 => DESC_RGBA,
        n => {
            return Err(CodecError::Unsupported(format!(
                "DPX cannot store {} channels",
                n
            )));
        }
    };
    let depth = options.bit_depth;
    let row_samples = pixels.width() as usize * pixels.channels() as usize;
    let row_len = row_bytes(row_samples, depth);
    let file_size = u32::try_from(HEADER_SIZE + row_len * pixels.height() as usize)
        .map_err(|_| CodecError::Encode("image too large for DPX".into()))?;

    let codes = pixels.to_code_values(depth.bits());
    let mut out = Vec::with_capacity(file_size as usize);
    let layout = Layout {
        width: pixels.width(),
        height: pixels.height(),
        descriptor,
        file_size,
        row_samples,
        row_len,
    };
    match options.endianness {
        Endianness::Big => write_dpx::<BigEndian>(&mut out, &codes, &layout, options)?,
        Endianness::Little => write_dpx::<LittleEndian>(&mut out, &codes, &layout, options)?,
    }
    Ok(out)
}

struct Layout {
    width: u32,
    height: u32,
    descriptor: u8,
    file_size: u32,
    row_samples: usize,
    row_len: usize,
}

fn write_dpx<E: ByteOrder>(
    out: &mut Vec<u8>,
    codes: &[u32],
    layout: &Layout,
    options: &DpxWriterOptions,
) -> CodecResult<()> {
    out.extend_from_slice(&header_bytes::<E>(layout, options));

    let depth = options.bit_depth;
    for row in codes.chunks_exact(layout.row_samples) {
        let row_start = out.len();
        match depth {
            BitDepth::Bit8 => out.extend(row.iter().map(|&v| v as u8)),
            BitDepth::Bit10 => {
                for group in row.chunks(3) {
                    let word = group
                        .iter()
                        .zip([22u32, 12, 2])
                        .fold(0u32, |w, (&v, shift)| w | ((v & 0x3FF) << shift));
                    out.write_u32::<E>(word)?;
                }
            }
            BitDepth::Bit12 => {
                for &v in row {
                    out.write_u16::<E>(((v & 0x0FFF) as u16) << 4)?;
                }
            }
            BitDepth::Bit16 => {
                for &v in row {
                    out.write_u16::<E>(v as u16)?;
                }
            }
        }
        out.resize(row_start + layout.row_len, 0);
    }
    Ok(())
}

fn header_bytes<E: ByteOrder>(layout: &Layout, options: &DpxWriterOptions) -> Vec<u8> {
    let mut header = vec![0u8; HEADER_SIZE];
    let depth = options.bit_depth;

    // File header (0-767)
    E::write_u32(&mut header[0..4], MAGIC);
    E::write_u32(&mut header[4..8], HEADER_SIZE as u32);
    header[8..12].copy_from_slice(b"V2.0");
    E::write_u32(&mut header[16..20], layout.file_size);
    // Ditto key (1 = new frame)
    E::write_u32(&mut header[20..24], 1);
    E::write_u32(&mut header[24..28], GENERIC_HEADER_SIZE as u32);
    E::write_u32(&mut header[28..32], INDUSTRY_HEADER_SIZE);
    if let Some(creator) = &options.creator {
        let bytes = creator.as_bytes();
        let len = bytes.len().min(99);
        header[160..160 + len].copy_from_slice(&bytes[..len]);
    }
    // Unencrypted
    E::write_u32(&mut header[660..664], 0xFFFF_FFFF);

    // Image header (768-1663)
    E::write_u16(&mut header[768..770], 0);
    E::write_u16(&mut header[770..772], 1);
    E::write_u32(&mut header[772..776], layout.width);
    E::write_u32(&mut header[776..780], layout.height);

    // Image element 0 (780)
    E::write_u32(&mut header[792..796], depth.max_value());
    E::write_f32(&mut header[796..800], 1.0);
    header[800] = layout.descriptor;
    // Printing density
    header[801] = 1;
    header[802] = 1;
    header[803] = depth.bits();
    E::write_u16(&mut header[804..806], depth.packing());
    E::write_u32(&mut header[808..812], HEADER_SIZE as u32);
    header
}

// === Tests ===
