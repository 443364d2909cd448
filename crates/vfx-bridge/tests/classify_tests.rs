//! Integration tests for metadata normalization and classification against
//! attributes produced by the real backend.

mod common;

use common::{Fixtures, rgb8, rgb10, rgba_float};
use vfx_bridge::metadata::{KEY_BIT_DEPTH, KEY_COMPRESSION, KEY_FORMAT};
use vfx_bridge::{
    AttrValue, CodecBackend, EncodingType, GenericBackend, RawAttributes, classify_encoding_type,
    normalize,
};

fn backend_attributes(path: &std::path::Path) -> RawAttributes {
    CodecBackend::new().decode(path).unwrap().attributes
}

#[test]
fn backend_attributes_classify_to_their_writer() {
    let fixtures = Fixtures::new();
    let cases = [
        (fixtures.write("a.dpx", &rgb10(4, 4), EncodingType::Dpx, 10), EncodingType::Dpx),
        (
            fixtures.write("a.exr", &rgba_float(4, 4), EncodingType::OpenExr, 16),
            EncodingType::OpenExr,
        ),
        (fixtures.write("a.hdr", &rgba_float(4, 4), EncodingType::Hdr, 32), EncodingType::Hdr),
        (fixtures.write("a.tif", &rgb8(4, 4), EncodingType::Tiff, 8), EncodingType::Tiff),
        (fixtures.write("a.png", &rgb8(4, 4), EncodingType::Png, 8), EncodingType::Png),
        (fixtures.write("a.jpg", &rgb8(8, 8), EncodingType::Jpeg, 8), EncodingType::Jpeg),
    ];

    for (path, expected) in cases {
        let metadata = normalize(&backend_attributes(&path));
        assert_eq!(classify_encoding_type(&metadata), expected, "{}", path.display());
        assert!(metadata.contains(KEY_FORMAT));
        assert!(metadata.contains(KEY_BIT_DEPTH));
    }
}

#[test]
fn classification_is_idempotent() {
    let fixtures = Fixtures::new();
    let path = fixtures.write("a.exr", &rgba_float(2, 2), EncodingType::OpenExr, 32);
    let metadata = normalize(&backend_attributes(&path));

    let first = classify_encoding_type(&metadata);
    let second = classify_encoding_type(&metadata);
    assert_eq!(first, second);
    assert_eq!(normalize(&backend_attributes(&path)), metadata);
}

#[test]
fn unrelated_keys_do_not_change_the_answer() {
    let fixtures = Fixtures::new();
    let path = fixtures.write("a.dpx", &rgb10(2, 2), EncodingType::Dpx, 10);
    let mut raw = backend_attributes(&path);
    let before = classify_encoding_type(&normalize(&raw));

    raw.push("Artist", AttrValue::Str("comp dept".into()));
    raw.push("exr:LayerName", AttrValue::Str("beauty".into()));
    raw.push("ImageDescription", AttrValue::Str("openexr".into()));
    raw.push("PixelAspectRatio", AttrValue::Float(2.0));
    assert_eq!(classify_encoding_type(&normalize(&raw)), before);
}

#[test]
fn compression_only_metadata_still_classifies() {
    let raw: RawAttributes = [("Compression", AttrValue::Str(" PIZ ".into()))]
        .into_iter()
        .collect();
    let metadata = normalize(&raw);
    assert_eq!(metadata.get_str(KEY_COMPRESSION), Some("piz"));
    assert_eq!(classify_encoding_type(&metadata), EncodingType::OpenExr);
}

#[test]
fn bit_depth_alone_identifies_film_scans() {
    let raw: RawAttributes = [("oiio:BitsPerSample", AttrValue::Str("10".into()))]
        .into_iter()
        .collect();
    assert_eq!(classify_encoding_type(&normalize(&raw)), EncodingType::Dpx);

    let raw: RawAttributes = [("BitsPerSample", AttrValue::UInt(8))].into_iter().collect();
    assert_eq!(classify_encoding_type(&normalize(&raw)), EncodingType::Unknown);
}

#[test]
fn empty_metadata_is_unknown() {
    assert_eq!(
        classify_encoding_type(&normalize(&RawAttributes::new())),
        EncodingType::Unknown
    );
}
