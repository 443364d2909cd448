//! Shared fixtures for integration tests.
//!
//! Fixture files are synthesized into a temporary directory with the crate's
//! own encoders, so every test starts from known pixel values.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use vfx_bridge::{
    CodecBackend, Decoder, Encoder, EncodingType, GenericBackend, InstrumentationSink,
    PixelBuffer,
};

/// Sink that keeps every record for later inspection.
#[derive(Default)]
pub struct RecordingSink {
    records: Mutex<Vec<(String, u64)>>,
}

impl RecordingSink {
    pub fn labels(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|(label, _)| label.clone())
            .collect()
    }

    pub fn count(&self, label: &str) -> usize {
        self.labels().iter().filter(|l| *l == label).count()
    }
}

impl InstrumentationSink for RecordingSink {
    fn record(&self, label: &str, duration_micros: u64) {
        self.records
            .lock()
            .unwrap()
            .push((label.to_string(), duration_micros));
    }
}

/// Decoder wired to a fresh recording sink.
pub fn recording_decoder() -> (Decoder, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    (Decoder::new().with_sink(sink.clone()), sink)
}

/// Encoder wired to a fresh recording sink.
pub fn recording_encoder() -> (Encoder<'static>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    (Encoder::new().with_sink(sink.clone()), sink)
}

/// 8-bit RGB gradient.
pub fn rgb8(width: u32, height: u32) -> PixelBuffer {
    let data = (0..width * height * 3).map(|i| (i * 7 % 256) as u8).collect();
    PixelBuffer::from_u8(width, height, 3, data).unwrap()
}

/// 10-bit RGB gradient covering the full code range.
pub fn rgb10(width: u32, height: u32) -> PixelBuffer {
    let count = width * height * 3;
    let data = (0..count).map(|i| (i * 1023 / (count - 1).max(1)) as u16).collect();
    PixelBuffer::from_u16(width, height, 3, 10, data).unwrap()
}

/// 16-bit RGB ramp.
pub fn rgb16(width: u32, height: u32) -> PixelBuffer {
    let data = (0..width * height * 3).map(|i| (i * 2731 % 65536) as u16).collect();
    PixelBuffer::from_u16(width, height, 3, 16, data).unwrap()
}

/// Float RGBA ramp with values above 1.0.
pub fn rgba_float(width: u32, height: u32) -> PixelBuffer {
    let data = (0..width * height * 4).map(|i| i as f32 * 0.25).collect();
    PixelBuffer::from_f32(width, height, 4, data).unwrap()
}

/// Temporary directory holding encoded fixtures.
pub struct Fixtures {
    pub dir: TempDir,
}

impl Fixtures {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Encodes `pixels` as `encoding` at `bits` into `name`.
    pub fn write(
        &self,
        name: &str,
        pixels: &PixelBuffer,
        encoding: EncodingType,
        bits: u8,
    ) -> PathBuf {
        let path = self.path(name);
        CodecBackend::new()
            .write(pixels, encoding, bits, &path)
            .unwrap();
        path
    }

    /// Writes raw bytes into `name`.
    pub fn raw(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }
}
