//! Attribute storage, normalization and encoding classification.
//!
//! The generic backend reports attributes as an ordered, free-form list
//! ([`RawAttributes`]) using whatever names its codecs emit. [`normalize`]
//! turns that list into an [`ImageMetadata`] with stable key names, and
//! [`classify_encoding_type`] derives a single [`EncodingType`] from it.
//!
//! # Key scheme
//!
//! | Canonical key | Accepted raw aliases (case-insensitive) |
//! |---------------|------------------------------------------|
//! | `Format` | `format`, `oiio:Format` |
//! | `Compression` | `compression` |
//! | `BitDepth` | `bitdepth`, `BitsPerSample`, `oiio:BitsPerSample` |
//! | `Channels` | `channels`, `nchannels` |
//! | `ImageWidth` | `imagewidth`, `width` |
//! | `ImageHeight` | `imageheight`, `height` |
//! | `ColorSpace` | `colorspace`, `oiio:ColorSpace` |
//! | `Orientation` | `orientation` |
//!
//! Other keys are kept as-is apart from lower-casing a `namespace:` prefix,
//! so `DPX:Transfer` becomes `dpx:Transfer`.

use crate::EncodingType;
use std::collections::BTreeMap;
use std::fmt;

/// Canonical key for the format family.
pub const KEY_FORMAT: &str = "Format";
/// Canonical key for the compression scheme.
pub const KEY_COMPRESSION: &str = "Compression";
/// Canonical key for bits per sample.
pub const KEY_BIT_DEPTH: &str = "BitDepth";
/// Canonical key for channel count.
pub const KEY_CHANNELS: &str = "Channels";
/// Canonical key for width.
pub const KEY_WIDTH: &str = "ImageWidth";
/// Canonical key for height.
pub const KEY_HEIGHT: &str = "ImageHeight";
/// Canonical key for color space name.
pub const KEY_COLOR_SPACE: &str = "ColorSpace";
/// Canonical key for orientation.
pub const KEY_ORIENTATION: &str = "Orientation";

const ALIASES: &[(&str, &str)] = &[
    ("format", KEY_FORMAT),
    ("oiio:format", KEY_FORMAT),
    ("compression", KEY_COMPRESSION),
    ("bitdepth", KEY_BIT_DEPTH),
    ("bitspersample", KEY_BIT_DEPTH),
    ("oiio:bitspersample", KEY_BIT_DEPTH),
    ("channels", KEY_CHANNELS),
    ("nchannels", KEY_CHANNELS),
    ("imagewidth", KEY_WIDTH),
    ("width", KEY_WIDTH),
    ("imageheight", KEY_HEIGHT),
    ("height", KEY_HEIGHT),
    ("colorspace", KEY_COLOR_SPACE),
    ("oiio:colorspace", KEY_COLOR_SPACE),
    ("orientation", KEY_ORIENTATION),
];

const NUMERIC_KEYS: &[&str] = &[
    KEY_BIT_DEPTH,
    KEY_CHANNELS,
    KEY_WIDTH,
    KEY_HEIGHT,
    KEY_ORIENTATION,
];

/// Typed metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Boolean value.
    Bool(bool),
    /// UTF-8 string value.
    Str(String),
    /// Signed 32-bit integer.
    Int(i32),
    /// Unsigned 32-bit integer.
    UInt(u32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// Raw byte blob.
    Bytes(Vec<u8>),
    /// Ordered list of values.
    List(Vec<AttrValue>),
}

impl AttrValue {
    /// Returns string slice if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Returns u32 if this is a UInt value.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            AttrValue::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the byte blob if this is a Bytes value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AttrValue::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Interprets any integer or numeric string as a u32.
    fn coerce_u32(&self) -> Option<u32> {
        match self {
            AttrValue::UInt(v) => Some(*v),
            AttrValue::Int(v) => u32::try_from(*v).ok(),
            AttrValue::Int64(v) => u32::try_from(*v).ok(),
            AttrValue::UInt64(v) => u32::try_from(*v).ok(),
            AttrValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{}", v),
            AttrValue::Str(v) => write!(f, "{}", v),
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::UInt(v) => write!(f, "{}", v),
            AttrValue::Int64(v) => write!(f, "{}", v),
            AttrValue::UInt64(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Double(v) => write!(f, "{}", v),
            AttrValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            AttrValue::List(v) => write!(f, "[{} items]", v.len()),
        }
    }
}

/// Ordered attribute list as reported by the generic backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAttributes {
    entries: Vec<(String, AttrValue)>,
}

impl RawAttributes {
    /// Creates an empty attribute list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute. Duplicate names are allowed.
    pub fn push(&mut self, name: impl Into<String>, value: AttrValue) {
        self.entries.push((name.into(), value));
    }

    /// Iterates over name/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, AttrValue)> for RawAttributes {
    fn from_iter<I: IntoIterator<Item = (K, AttrValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Normalized, read-only metadata attached to a decoded image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMetadata {
    map: BTreeMap<String, AttrValue>,
}

impl ImageMetadata {
    /// Metadata with no entries (native decodes).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a reference to a value by key.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.map.get(key)
    }

    /// Returns a string value by key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_str)
    }

    /// Returns a u32 value by key.
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(AttrValue::as_u32)
    }

    /// Returns true if the key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Iterates over key/value pairs, sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Converts backend attributes into [`ImageMetadata`].
///
/// Every raw attribute lands in the result; nothing is defaulted. When two raw
/// names map to the same key, the later one wins.
pub fn normalize(raw: &RawAttributes) -> ImageMetadata {
    let mut map = BTreeMap::new();
    for (name, value) in raw.iter() {
        let key = normalize_key(name);
        let value = normalize_value(&key, value);
        map.insert(key, value);
    }
    ImageMetadata { map }
}

fn normalize_key(name: &str) -> String {
    let name = name.trim();
    let lower = name.to_ascii_lowercase();
    if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| *alias == lower) {
        return (*canonical).to_string();
    }
    match name.split_once(':') {
        Some((ns, rest)) => format!("{}:{}", ns.to_ascii_lowercase(), rest),
        None => name.to_string(),
    }
}

fn normalize_value(key: &str, value: &AttrValue) -> AttrValue {
    if NUMERIC_KEYS.contains(&key) {
        if let Some(v) = value.coerce_u32() {
            return AttrValue::UInt(v);
        }
    }
    match value {
        AttrValue::Str(s) => {
            let trimmed = s.trim_matches(|c: char| c == '\0' || c.is_whitespace());
            if key == KEY_FORMAT || key == KEY_COMPRESSION {
                AttrValue::Str(trimmed.to_ascii_lowercase())
            } else {
                AttrValue::Str(trimmed.to_string())
            }
        }
        other => other.clone(),
    }
}

// === Classification ===

enum Predicate {
    Format(&'static [&'static str]),
    Compression(&'static [&'static str]),
    BitDepth(&'static [u32]),
}

impl Predicate {
    fn matches(&self, metadata: &ImageMetadata) -> bool {
        match self {
            Predicate::Format(names) => metadata
                .get_str(KEY_FORMAT)
                .is_some_and(|v| names.contains(&v)),
            Predicate::Compression(names) => metadata
                .get_str(KEY_COMPRESSION)
                .is_some_and(|v| names.contains(&v)),
            Predicate::BitDepth(depths) => metadata
                .get_u32(KEY_BIT_DEPTH)
                .is_some_and(|v| depths.contains(&v)),
        }
    }
}

/// Classification rules, evaluated top to bottom.
///
/// Format family rules come first, then compression, then bit depth. Within a
/// stage rules follow `EncodingType` declaration order, so overlapping
/// compression names resolve to the earlier type: `zip` and `rle` are
/// OpenEXR, `jpeg` and `deflate` are TIFF.
const RULES: &[(Predicate, EncodingType)] = &[
    (Predicate::Format(&["dpx"]), EncodingType::Dpx),
    (Predicate::Format(&["openexr", "exr"]), EncodingType::OpenExr),
    (Predicate::Format(&["hdr", "rgbe", "radiance"]), EncodingType::Hdr),
    (Predicate::Format(&["tiff", "tif"]), EncodingType::Tiff),
    (Predicate::Format(&["png"]), EncodingType::Png),
    (Predicate::Format(&["jpeg", "jpg"]), EncodingType::Jpeg),
    (
        Predicate::Compression(&[
            "rle", "zips", "zip", "piz", "pxr24", "b44", "b44a", "dwaa", "dwab",
        ]),
        EncodingType::OpenExr,
    ),
    (Predicate::Compression(&["rle"]), EncodingType::Hdr),
    (
        Predicate::Compression(&["lzw", "packbits", "zip", "deflate", "jpeg"]),
        EncodingType::Tiff,
    ),
    (Predicate::Compression(&["deflate"]), EncodingType::Png),
    (Predicate::Compression(&["jpeg"]), EncodingType::Jpeg),
    (Predicate::BitDepth(&[10, 12]), EncodingType::Dpx),
];

/// Derives the encoding type from normalized metadata.
///
/// Pure: the same metadata always yields the same answer, and keys outside
/// `Format`, `Compression` and `BitDepth` never affect it.
pub fn classify_encoding_type(metadata: &ImageMetadata) -> EncodingType {
    RULES
        .iter()
        .find(|(predicate, _)| predicate.matches(metadata))
        .map(|(_, ty)| *ty)
        .unwrap_or(EncodingType::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, AttrValue)]) -> ImageMetadata {
        normalize(&pairs.iter().cloned().collect())
    }

    #[test]
    fn aliases_map_to_canonical_keys() {
        let m = meta(&[
            ("oiio:BitsPerSample", AttrValue::UInt(10)),
            ("nchannels", AttrValue::UInt(3)),
            ("format", AttrValue::Str("DPX".into())),
        ]);
        assert_eq!(m.get_u32(KEY_BIT_DEPTH), Some(10));
        assert_eq!(m.get_u32(KEY_CHANNELS), Some(3));
        assert_eq!(m.get_str(KEY_FORMAT), Some("dpx"));
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn namespace_prefix_is_lowercased() {
        let m = meta(&[("DPX:Transfer", AttrValue::UInt(1))]);
        assert!(m.contains("dpx:Transfer"));
        assert!(!m.contains("DPX:Transfer"));
    }

    #[test]
    fn strings_are_trimmed_and_numbers_coerced() {
        let m = meta(&[
            ("Software", AttrValue::Str("grader\0\0\0".into())),
            ("width", AttrValue::Str(" 1920 ".into())),
            ("height", AttrValue::Int(1080)),
            ("Orientation", AttrValue::Int(-1)),
        ]);
        assert_eq!(m.get_str("Software"), Some("grader"));
        assert_eq!(m.get_u32(KEY_WIDTH), Some(1920));
        assert_eq!(m.get_u32(KEY_HEIGHT), Some(1080));
        // Not representable as unsigned: kept as-is.
        assert_eq!(m.get(KEY_ORIENTATION), Some(&AttrValue::Int(-1)));
    }

    #[test]
    fn absent_attributes_stay_absent() {
        let m = normalize(&RawAttributes::new());
        assert!(m.is_empty());
        assert_eq!(classify_encoding_type(&m), EncodingType::Unknown);
    }

    #[test]
    fn later_duplicate_wins() {
        let m = meta(&[
            ("BitsPerSample", AttrValue::UInt(8)),
            ("oiio:BitsPerSample", AttrValue::UInt(16)),
        ]);
        assert_eq!(m.get_u32(KEY_BIT_DEPTH), Some(16));
    }

    #[test]
    fn format_family_beats_compression() {
        let m = meta(&[
            ("format", AttrValue::Str("tiff".into())),
            ("compression", AttrValue::Str("zip".into())),
        ]);
        assert_eq!(classify_encoding_type(&m), EncodingType::Tiff);
    }

    #[test]
    fn overlapping_compression_resolves_to_first_declared() {
        let zip = meta(&[("compression", AttrValue::Str("zip".into()))]);
        assert_eq!(classify_encoding_type(&zip), EncodingType::OpenExr);

        let rle = meta(&[("compression", AttrValue::Str("RLE".into()))]);
        assert_eq!(classify_encoding_type(&rle), EncodingType::OpenExr);

        let jpeg = meta(&[("compression", AttrValue::Str("jpeg".into()))]);
        assert_eq!(classify_encoding_type(&jpeg), EncodingType::Tiff);

        let deflate = meta(&[("compression", AttrValue::Str("deflate".into()))]);
        assert_eq!(classify_encoding_type(&deflate), EncodingType::Tiff);
    }

    #[test]
    fn unusual_bit_depth_implies_dpx() {
        let m = meta(&[("BitDepth", AttrValue::UInt(12))]);
        assert_eq!(classify_encoding_type(&m), EncodingType::Dpx);

        let m = meta(&[("BitDepth", AttrValue::UInt(8))]);
        assert_eq!(classify_encoding_type(&m), EncodingType::Unknown);
    }

    #[test]
    fn classification_is_idempotent_and_ignores_unrelated_keys() {
        let base = meta(&[
            ("format", AttrValue::Str("openexr".into())),
            ("compression", AttrValue::Str("piz".into())),
        ]);
        let extra = meta(&[
            ("format", AttrValue::Str("openexr".into())),
            ("compression", AttrValue::Str("piz".into())),
            ("Software", AttrValue::Str("comp".into())),
        ]);
        let first = classify_encoding_type(&base);
        assert_eq!(first, classify_encoding_type(&base));
        assert_eq!(first, classify_encoding_type(&extra));
        assert_eq!(first, EncodingType::OpenExr);
    }

    #[test]
    fn display_values() {
        assert_eq!(AttrValue::Bytes(vec![0; 4]).to_string(), "<4 bytes>");
        assert_eq!(AttrValue::UInt(10).to_string(), "10");
    }
}
