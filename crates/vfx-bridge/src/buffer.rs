//! Rectangular pixel storage.
//!
//! A [`PixelBuffer`] is interleaved, row-major, top-to-bottom. Its geometry is
//! checked when it is built: `width * height * channels` always equals the
//! number of stored samples.

use crate::{BridgeError, BridgeResult};

/// Storage type of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer (also holds 10 and 12-bit data).
    U16,
    /// 32-bit float (also holds half-float data).
    F32,
}

/// Raw sample storage.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    /// 8-bit unsigned data.
    U8(Vec<u8>),
    /// 16-bit unsigned data.
    U16(Vec<u16>),
    /// 32-bit float data.
    F32(Vec<f32>),
}

impl SampleData {
    /// Number of samples stored.
    pub fn len(&self) -> usize {
        match self {
            SampleData::U8(v) => v.len(),
            SampleData::U16(v) => v.len(),
            SampleData::F32(v) => v.len(),
        }
    }

    /// Returns true if no samples are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage type of the samples.
    pub fn sample_type(&self) -> SampleType {
        match self {
            SampleData::U8(_) => SampleType::U8,
            SampleData::U16(_) => SampleType::U16,
            SampleData::F32(_) => SampleType::F32,
        }
    }
}

/// Pixel data with explicit geometry and sample depth.
///
/// Integer samples occupy the low `bits_per_sample` bits of their storage
/// type: a 10-bit DPX decodes to `U16` samples in `0..=1023`.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u32,
    bits_per_sample: u8,
    data: SampleData,
}

impl PixelBuffer {
    /// Creates a buffer, rejecting any geometry/sample-count mismatch.
    ///
    /// # Errors
    ///
    /// [`BridgeError::InvalidBufferGeometry`] if a dimension is zero or
    /// `width * height * channels` differs from `data.len()`.
    pub fn new(
        width: u32,
        height: u32,
        channels: u32,
        bits_per_sample: u8,
        data: SampleData,
    ) -> BridgeResult<Self> {
        check_geometry(width, height, channels, data.len())?;
        Ok(Self {
            width,
            height,
            channels,
            bits_per_sample,
            data,
        })
    }

    /// Creates an 8-bit buffer.
    pub fn from_u8(width: u32, height: u32, channels: u32, data: Vec<u8>) -> BridgeResult<Self> {
        Self::new(width, height, channels, 8, SampleData::U8(data))
    }

    /// Creates a 16-bit buffer holding `bits` significant bits per sample.
    pub fn from_u16(
        width: u32,
        height: u32,
        channels: u32,
        bits: u8,
        data: Vec<u16>,
    ) -> BridgeResult<Self> {
        Self::new(width, height, channels, bits, SampleData::U16(data))
    }

    /// Creates a 32-bit float buffer.
    pub fn from_f32(width: u32, height: u32, channels: u32, data: Vec<f32>) -> BridgeResult<Self> {
        Self::new(width, height, channels, 32, SampleData::F32(data))
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples per pixel.
    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Significant bits per sample.
    pub fn bits_per_sample(&self) -> u8 {
        self.bits_per_sample
    }

    /// Storage type of the samples.
    pub fn sample_type(&self) -> SampleType {
        self.data.sample_type()
    }

    /// Raw samples.
    pub fn data(&self) -> &SampleData {
        &self.data
    }

    /// Returns the total number of samples (pixels * channels).
    pub fn sample_count(&self) -> usize {
        self.data.len()
    }

    /// Re-checks the geometry invariant.
    pub fn check_geometry(&self) -> BridgeResult<()> {
        check_geometry(self.width, self.height, self.channels, self.data.len())
    }

    /// Largest integer code value for the declared depth.
    pub fn max_code_value(&self) -> u32 {
        max_code_value(self.bits_per_sample)
    }

    /// Converts samples to normalized f32 (integers scaled to `0.0..=1.0`).
    pub fn to_f32(&self) -> Vec<f32> {
        match &self.data {
            SampleData::U8(data) => data.iter().map(|&v| v as f32 / 255.0).collect(),
            SampleData::U16(data) => {
                let max = self.max_code_value() as f32;
                data.iter().map(|&v| v as f32 / max).collect()
            }
            SampleData::F32(data) => data.clone(),
        }
    }

    /// Returns integer code values at `bits`, rescaling only when needed.
    ///
    /// When the buffer already stores integers at exactly `bits`, the samples
    /// are passed through untouched.
    pub fn to_code_values(&self, bits: u8) -> Vec<u32> {
        match &self.data {
            SampleData::U8(data) if bits == 8 => data.iter().map(|&v| v as u32).collect(),
            SampleData::U16(data) if bits == self.bits_per_sample => {
                data.iter().map(|&v| v as u32).collect()
            }
            _ => quantize(&self.to_f32(), bits),
        }
    }
}

/// Largest integer code value representable in `bits` bits.
pub(crate) fn max_code_value(bits: u8) -> u32 {
    match bits {
        0 => 0,
        32.. => u32::MAX,
        b => (1u32 << b) - 1,
    }
}

/// Rounds normalized floats to integer code values at `bits`.
pub(crate) fn quantize(data: &[f32], bits: u8) -> Vec<u32> {
    let max = max_code_value(bits) as f32;
    data.iter()
        .map(|&v| (v.clamp(0.0, 1.0) * max).round() as u32)
        .collect()
}

fn check_geometry(width: u32, height: u32, channels: u32, actual: usize) -> BridgeResult<()> {
    let expected = width as u64 * height as u64 * channels as u64;
    if width == 0 || height == 0 || channels == 0 || expected != actual as u64 {
        return Err(BridgeError::InvalidBufferGeometry {
            width,
            height,
            channels,
            expected,
            actual: actual as u64,
        });
    }
    Ok(())
}
