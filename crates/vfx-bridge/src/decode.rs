//! Decode orchestration.
//!
//! A decode runs through a small state machine:
//!
//! ```text
//! NotStarted --start--> TryingNative --decoded--> Succeeded(Native)
//!     |                      |  \--unreadable--> Failed
//!     | (force_backend)      \--declined--> TryingBackend --decoded--> Succeeded(Backend)
//!     \--------------------------------------->      \--failed--> Failed
//! ```
//!
//! The transition function is [`DecodeState::next`]; [`Decoder::decode`]
//! drives it, timing each attempted path through the configured
//! [`InstrumentationSink`]. The native stack is preferred because it is
//! faster, but it yields no metadata, so native results carry empty
//! metadata and the encoding the native stack recognized.

use crate::backend::{CodecBackend, GenericBackend};
use crate::instrument::{self, InstrumentationSink, TracingSink};
use crate::native::{NativeDecoder, NativeImage, PlatformDecoder};
use crate::rep::{self, ImageRep};
use crate::{
    BridgeError, BridgeResult, EncodingType, ImageMetadata, classify_encoding_type, normalize,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// Which path produced a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePath {
    /// The native decode stack.
    Native,
    /// The generic backend.
    Backend,
}

/// State of a single decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    NotStarted,
    TryingNative,
    TryingBackend,
    Succeeded(DecodePath),
    Failed,
}

/// Input to [`DecodeState::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeEvent {
    /// Begin decoding; `force_backend` skips the native stack.
    Start { force_backend: bool },
    /// Native stack produced a valid image.
    NativeDecoded,
    /// Native stack did not handle the source.
    NativeDeclined,
    /// Native stack hit an I/O error.
    NativeUnreadable,
    /// Backend produced a valid image.
    BackendDecoded,
    /// Backend could not decode the source.
    BackendFailed,
}

impl DecodeState {
    /// Applies `event`. Events that do not apply to the current state leave
    /// it unchanged; terminal states absorb every event.
    ///
    /// ```
    /// use vfx_bridge::decode::{DecodeEvent, DecodePath, DecodeState};
    ///
    /// let state = DecodeState::NotStarted
    ///     .next(DecodeEvent::Start { force_backend: false })
    ///     .next(DecodeEvent::NativeDeclined)
    ///     .next(DecodeEvent::BackendDecoded);
    /// assert_eq!(state, DecodeState::Succeeded(DecodePath::Backend));
    /// ```
    pub fn next(self, event: DecodeEvent) -> DecodeState {
        use DecodeEvent as E;
        use DecodeState as S;

        match (self, event) {
            (S::NotStarted, E::Start { force_backend: false }) => S::TryingNative,
            (S::NotStarted, E::Start { force_backend: true }) => S::TryingBackend,
            (S::TryingNative, E::NativeDecoded) => S::Succeeded(DecodePath::Native),
            (S::TryingNative, E::NativeDeclined) => S::TryingBackend,
            (S::TryingNative, E::NativeUnreadable) => S::Failed,
            (S::TryingBackend, E::BackendDecoded) => S::Succeeded(DecodePath::Backend),
            (S::TryingBackend, E::BackendFailed) => S::Failed,
            (state, _) => state,
        }
    }

    /// True for `Succeeded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, DecodeState::Succeeded(_) | DecodeState::Failed)
    }
}

/// Per-call decode options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Skip the native stack and go straight to the generic backend.
    pub force_backend: bool,
}

impl DecodeOptions {
    /// Options that bypass the native stack.
    pub fn forced() -> Self {
        Self { force_backend: true }
    }

    pub fn with_force_backend(mut self, force_backend: bool) -> Self {
        self.force_backend = force_backend;
        self
    }
}

/// Result of a successful decode.
#[derive(Debug, Clone)]
pub struct Decoded {
    /// The decoded representation.
    pub image: ImageRep,
    /// Path that produced it.
    pub path: DecodePath,
    /// Every state visited, starting with `NotStarted`.
    pub trail: Vec<DecodeState>,
}

/// Tracks the current state and the states visited so far.
struct Machine {
    state: DecodeState,
    trail: Vec<DecodeState>,
}

impl Machine {
    fn new() -> Self {
        Self {
            state: DecodeState::NotStarted,
            trail: vec![DecodeState::NotStarted],
        }
    }

    fn fire(&mut self, event: DecodeEvent) -> DecodeState {
        let next = self.state.next(event);
        trace!(from = ?self.state, to = ?next, ?event, "decode transition");
        self.state = next;
        self.trail.push(next);
        next
    }
}

/// Decode orchestrator: native stack first, generic backend as fallback.
///
/// Holds no per-call state, so one `Decoder` may serve concurrent decodes.
#[derive(Clone)]
pub struct Decoder {
    native: Arc<dyn NativeDecoder>,
    backend: Arc<dyn GenericBackend>,
    sink: Arc<dyn InstrumentationSink>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder").finish_non_exhaustive()
    }
}

impl Decoder {
    /// Creates a decoder with [`PlatformDecoder`], [`CodecBackend`] and
    /// [`TracingSink`].
    pub fn new() -> Self {
        Self {
            native: Arc::new(PlatformDecoder::new()),
            backend: Arc::new(CodecBackend::new()),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_native(mut self, native: Arc<dyn NativeDecoder>) -> Self {
        self.native = native;
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn GenericBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn InstrumentationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Decodes `path` into an [`ImageRep`].
    ///
    /// # Errors
    ///
    /// - [`BridgeError::UnreadableSource`] for I/O failures and corrupt data
    /// - [`BridgeError::UnsupportedFormat`] when no path handles the source
    pub fn decode(&self, path: impl AsRef<Path>, options: &DecodeOptions) -> BridgeResult<Decoded> {
        let path = path.as_ref();
        debug!(path = %path.display(), force_backend = options.force_backend, "decode");

        let mut machine = Machine::new();
        let state = machine.fire(DecodeEvent::Start {
            force_backend: options.force_backend,
        });

        if state == DecodeState::TryingNative {
            let attempt = instrument::timed(self.sink.as_ref(), instrument::NATIVE_DECODE, || {
                self.native.try_decode(path)
            });
            match attempt {
                Ok(Some(native)) => match native_rep(native) {
                    Ok(image) => {
                        machine.fire(DecodeEvent::NativeDecoded);
                        return Ok(finish(machine, image, DecodePath::Native));
                    }
                    Err(e) => {
                        debug!(path = %path.display(), error = %e, "native result rejected");
                        machine.fire(DecodeEvent::NativeDeclined);
                    }
                },
                Ok(None) => {
                    machine.fire(DecodeEvent::NativeDeclined);
                }
                Err(e) => {
                    machine.fire(DecodeEvent::NativeUnreadable);
                    debug!(path = %path.display(), error = %e, "decode failed");
                    return Err(BridgeError::UnreadableSource {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let attempt = instrument::timed(self.sink.as_ref(), instrument::BACKEND_DECODE, || {
            self.backend.decode(path)
        });
        let result = attempt
            .map_err(|e| e.into_decode_error(path.to_path_buf()))
            .and_then(|decoded| {
                let metadata = normalize(&decoded.attributes);
                let encoding = classify_encoding_type(&metadata);
                rep::build(decoded.pixels, metadata, encoding).map_err(|e| {
                    BridgeError::UnsupportedFormat {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    }
                })
            });

        match result {
            Ok(image) => {
                machine.fire(DecodeEvent::BackendDecoded);
                Ok(finish(machine, image, DecodePath::Backend))
            }
            Err(e) => {
                machine.fire(DecodeEvent::BackendFailed);
                debug!(path = %path.display(), error = %e, "decode failed");
                Err(e)
            }
        }
    }
}

fn native_rep(native: NativeImage) -> BridgeResult<ImageRep> {
    let encoding = native.encoding_hint.unwrap_or(EncodingType::Unknown);
    rep::build(native.pixels, ImageMetadata::empty(), encoding)
}

fn finish(machine: Machine, image: ImageRep, path: DecodePath) -> Decoded {
    debug!(
        ?path,
        encoding = %image.encoding(),
        width = image.width(),
        height = image.height(),
        "decoded"
    );
    Decoded {
        image,
        path,
        trail: machine.trail,
    }
}
