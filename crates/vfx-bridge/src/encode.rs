//! Encode orchestration.
//!
//! [`Encoder`] validates the request against the [`FormatRegistry`] and the
//! encoding's bit depth table, then asks the generic backend to write. Files
//! are written to a temporary sibling of the destination and renamed into
//! place, so a failed encode never leaves a partial file behind.

use crate::backend::{CodecBackend, GenericBackend};
use crate::buffer::PixelBuffer;
use crate::instrument::{self, InstrumentationSink, TracingSink};
use crate::rep::{self, ImageRep};
use crate::{BridgeError, BridgeResult, EncodingType, FormatRegistry};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Encode orchestrator.
#[derive(Clone)]
pub struct Encoder<'r> {
    registry: &'r FormatRegistry,
    backend: Arc<dyn GenericBackend>,
    sink: Arc<dyn InstrumentationSink>,
}

impl Default for Encoder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Encoder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("formats", &self.registry.entries().len())
            .finish_non_exhaustive()
    }
}

impl Encoder<'static> {
    /// Creates an encoder with the global registry, [`CodecBackend`] and
    /// [`TracingSink`].
    pub fn new() -> Self {
        Self {
            registry: FormatRegistry::global(),
            backend: Arc::new(CodecBackend::new()),
            sink: Arc::new(TracingSink),
        }
    }
}

impl<'r> Encoder<'r> {
    /// Uses `registry` for write-capability checks and extension lookups.
    pub fn with_registry<'a>(self, registry: &'a FormatRegistry) -> Encoder<'a> {
        Encoder {
            registry,
            backend: self.backend,
            sink: self.sink,
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn GenericBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn InstrumentationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Checks that `encoding` is writable at `bit_depth` and returns the
    /// depth to use. `None` selects the encoding's default depth.
    ///
    /// ```
    /// use vfx_bridge::{BridgeError, Encoder, EncodingType};
    ///
    /// let encoder = Encoder::new();
    /// assert_eq!(encoder.resolve_bit_depth(EncodingType::Dpx, None).unwrap(), 10);
    /// assert!(matches!(
    ///     encoder.resolve_bit_depth(EncodingType::Dpx, Some(7)),
    ///     Err(BridgeError::UnsupportedBitDepth { .. })
    /// ));
    /// ```
    pub fn resolve_bit_depth(
        &self,
        encoding: EncodingType,
        bit_depth: Option<u8>,
    ) -> BridgeResult<u8> {
        if !self.registry.can_backend_write(encoding) {
            return Err(BridgeError::UnsupportedEncodingType(encoding));
        }
        let depth = match bit_depth.or_else(|| encoding.default_bit_depth()) {
            Some(depth) => depth,
            None => return Err(BridgeError::UnsupportedEncodingType(encoding)),
        };
        if !encoding.allows_bit_depth(depth) {
            return Err(BridgeError::UnsupportedBitDepth { encoding, depth });
        }
        Ok(depth)
    }

    /// Writes `rep` to `dest` as `encoding`.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::UnsupportedEncodingType`] if the type is not writable
    /// - [`BridgeError::UnsupportedBitDepth`] if `bit_depth` is not allowed
    /// - [`BridgeError::EncodeBackendFailure`] if the backend fails; `dest`
    ///   is left untouched
    pub fn encode(
        &self,
        rep: &ImageRep,
        encoding: EncodingType,
        bit_depth: Option<u8>,
        dest: impl AsRef<Path>,
    ) -> BridgeResult<()> {
        self.encode_pixels(rep.pixels(), encoding, bit_depth, dest)
    }

    /// Writes a raw pixel buffer to `dest` as `encoding`.
    ///
    /// The buffer is validated the same way decoded images are.
    pub fn encode_pixels(
        &self,
        pixels: &PixelBuffer,
        encoding: EncodingType,
        bit_depth: Option<u8>,
        dest: impl AsRef<Path>,
    ) -> BridgeResult<()> {
        let dest = dest.as_ref();
        let depth = self.resolve_bit_depth(encoding, bit_depth)?;
        rep::check_layout(pixels)?;
        debug!(dest = %dest.display(), %encoding, depth, "encode");

        self.write_atomically(pixels, encoding, depth, dest)?;
        debug!(dest = %dest.display(), "encoded");
        Ok(())
    }

    /// Encodes `rep` into memory.
    pub fn encode_to_vec(
        &self,
        rep: &ImageRep,
        encoding: EncodingType,
        bit_depth: Option<u8>,
    ) -> BridgeResult<Vec<u8>> {
        let depth = self.resolve_bit_depth(encoding, bit_depth)?;
        instrument::timed(self.sink.as_ref(), instrument::BACKEND_ENCODE, || {
            self.backend.encode_to_vec(rep.pixels(), encoding, depth)
        })
        .map_err(|e| e.into_encode_error())
    }

    /// Writes `rep` to `dest`, choosing the encoding from the extension.
    ///
    /// Returns the encoding used.
    pub fn encode_by_extension(
        &self,
        rep: &ImageRep,
        dest: impl AsRef<Path>,
        bit_depth: Option<u8>,
    ) -> BridgeResult<EncodingType> {
        let dest = dest.as_ref();
        let encoding = self
            .registry
            .get_by_path(dest)
            .map(|entry| entry.encoding)
            .unwrap_or(EncodingType::Unknown);
        self.encode(rep, encoding, bit_depth, dest)?;
        Ok(encoding)
    }

    fn write_atomically(
        &self,
        pixels: &PixelBuffer,
        encoding: EncodingType,
        depth: u8,
        dest: &Path,
    ) -> BridgeResult<()> {
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = tempfile::Builder::new()
            .prefix(".vfxb-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| BridgeError::EncodeBackendFailure {
                message: format!("cannot create temporary file in {}: {}", dir.display(), e),
            })?;

        let written = instrument::timed(self.sink.as_ref(), instrument::BACKEND_ENCODE, || {
            self.backend.write(pixels, encoding, depth, temp.path())
        });
        if let Err(e) = written {
            let temp_path = temp.path().to_path_buf();
            if let Err(cleanup) = temp.close() {
                warn!(
                    path = %temp_path.display(),
                    error = %cleanup,
                    "cannot remove temporary file"
                );
            }
            return Err(e.into_encode_error());
        }

        temp.persist(dest).map_err(|e| {
            let message = format!("cannot move encoded file to {}: {}", dest.display(), e.error);
            let temp_path = e.file.path().to_path_buf();
            if let Err(cleanup) = e.file.close() {
                warn!(
                    path = %temp_path.display(),
                    error = %cleanup,
                    "cannot remove temporary file"
                );
            }
            BridgeError::EncodeBackendFailure { message }
        })?;
        Ok(())
    }
}
