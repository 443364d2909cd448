//! Static knowledge of which formats each decode path understands.
//!
//! The registry answers two questions for any file extension or type
//! identifier: can the native stack open it, and can the generic backend
//! open (or write) it. It also projects the user-facing lists that open and
//! save dialogs are built from.
//!
//! # Architecture
//!
//! A process-wide instance is available through [`FormatRegistry::global()`]
//! and is built once from [`BUILTIN_FORMATS`]. It is never mutated afterwards,
//! so concurrent lookups need no locking. Tests and embedders can build their
//! own instance from an explicit table with [`FormatRegistry::new`].
//!
//! # Example
//!
//! ```
//! use vfx_bridge::FormatRegistry;
//!
//! let registry = FormatRegistry::global();
//! assert!(registry.is_natively_supported("png"));
//! assert!(!registry.is_natively_supported("dpx"));
//! assert!(registry.is_backend_supported(".DPX"));
//! ```

use crate::EncodingType;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// One row of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatEntry {
    /// Human-readable format name (e.g., "OpenEXR", "PNG").
    pub name: &'static str,
    /// File extensions without dots, preferred first.
    pub extensions: &'static [&'static str],
    /// Uniform type identifier.
    pub type_identifier: &'static str,
    /// Encoding family this format belongs to.
    pub encoding: EncodingType,
    /// Native stack can decode it.
    pub native: bool,
    /// Generic backend can decode it.
    pub backend_read: bool,
    /// Generic backend can encode it.
    pub backend_write: bool,
}

/// Built-in table, in listing order.
pub const BUILTIN_FORMATS: &[FormatEntry] = &[
    FormatEntry {
        name: "PNG",
        extensions: &["png"],
        type_identifier: "public.png",
        encoding: EncodingType::Png,
        native: true,
        backend_read: true,
        backend_write: true,
    },
    FormatEntry {
        name: "JPEG",
        extensions: &["jpg", "jpeg"],
        type_identifier: "public.jpeg",
        encoding: EncodingType::Jpeg,
        native: true,
        backend_read: true,
        backend_write: true,
    },
    FormatEntry {
        name: "TIFF",
        extensions: &["tif", "tiff"],
        type_identifier: "public.tiff",
        encoding: EncodingType::Tiff,
        native: true,
        backend_read: true,
        backend_write: true,
    },
    FormatEntry {
        name: "OpenEXR",
        extensions: &["exr"],
        type_identifier: "com.ilm.openexr-image",
        encoding: EncodingType::OpenExr,
        native: false,
        backend_read: true,
        backend_write: true,
    },
    FormatEntry {
        name: "Radiance HDR",
        extensions: &["hdr", "pic", "rgbe"],
        type_identifier: "public.radiance",
        encoding: EncodingType::Hdr,
        native: false,
        backend_read: true,
        backend_write: true,
    },
    FormatEntry {
        name: "DPX",
        extensions: &["dpx"],
        type_identifier: crate::DPX_TYPE_IDENTIFIER,
        encoding: EncodingType::Dpx,
        native: false,
        backend_read: true,
        backend_write: true,
    },
];

/// Read-only lookup table over [`FormatEntry`] rows.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    entries: Vec<FormatEntry>,
    /// Lower-cased extension or type identifier -> entry index.
    by_identifier: HashMap<String, usize>,
}

impl FormatRegistry {
    /// Builds a registry from an explicit table. Earlier rows win on
    /// conflicting identifiers.
    pub fn new(entries: impl IntoIterator<Item = FormatEntry>) -> Self {
        let entries: Vec<FormatEntry> = entries.into_iter().collect();
        let mut by_identifier = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            let keys = entry
                .extensions
                .iter()
                .copied()
                .chain(std::iter::once(entry.type_identifier));
            for key in keys {
                by_identifier.entry(key.to_ascii_lowercase()).or_insert(idx);
            }
        }
        Self {
            entries,
            by_identifier,
        }
    }

    /// Returns the global registry built from [`BUILTIN_FORMATS`].
    pub fn global() -> &'static FormatRegistry {
        static INSTANCE: OnceLock<FormatRegistry> = OnceLock::new();
        INSTANCE.get_or_init(|| FormatRegistry::new(BUILTIN_FORMATS.iter().copied()))
    }

    /// All rows in listing order.
    pub fn entries(&self) -> &[FormatEntry] {
        &self.entries
    }

    /// Looks up an extension or type identifier.
    ///
    /// Matching is case-insensitive and a leading `.` is ignored.
    pub fn lookup(&self, identifier: &str) -> Option<&FormatEntry> {
        let key = identifier.trim().trim_start_matches('.').to_ascii_lowercase();
        self.by_identifier.get(&key).map(|&idx| &self.entries[idx])
    }

    /// Looks up a file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<&FormatEntry> {
        self.lookup(ext)
    }

    /// Looks up the extension of `path`.
    pub fn get_by_path(&self, path: &Path) -> Option<&FormatEntry> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| self.get_by_extension(ext))
    }

    /// First row for an encoding family.
    pub fn entry_for_encoding(&self, encoding: EncodingType) -> Option<&FormatEntry> {
        self.entries.iter().find(|e| e.encoding == encoding)
    }

    /// True if the native stack can decode `identifier`.
    pub fn is_natively_supported(&self, identifier: &str) -> bool {
        self.lookup(identifier).is_some_and(|e| e.native)
    }

    /// True if the generic backend can decode `identifier`.
    pub fn is_backend_supported(&self, identifier: &str) -> bool {
        self.lookup(identifier).is_some_and(|e| e.backend_read)
    }

    /// True if the generic backend can write `encoding`.
    ///
    /// Always false for [`EncodingType::Unknown`].
    pub fn can_backend_write(&self, encoding: EncodingType) -> bool {
        encoding != EncodingType::Unknown
            && self
                .entries
                .iter()
                .any(|e| e.encoding == encoding && e.backend_write)
    }

    /// Extensions without dots, in table order.
    ///
    /// With `include_backend == false` only natively readable formats are
    /// listed; with `true` backend-readable ones are added.
    pub fn supported_file_extensions(&self, include_backend: bool) -> Vec<&'static str> {
        self.visible(include_backend)
            .flat_map(|e| e.extensions.iter().copied())
            .collect()
    }

    /// Type identifiers, in table order. Same filtering as
    /// [`supported_file_extensions`](Self::supported_file_extensions).
    pub fn supported_type_identifiers(&self, include_backend: bool) -> Vec<&'static str> {
        self.visible(include_backend).map(|e| e.type_identifier).collect()
    }

    fn visible(&self, include_backend: bool) -> impl Iterator<Item = &FormatEntry> {
        self.entries
            .iter()
            .filter(move |e| e.native || (include_backend && e.backend_read))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new(BUILTIN_FORMATS.iter().copied())
    }
}
