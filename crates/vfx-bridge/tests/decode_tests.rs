//! Integration tests for the decode orchestrator.

mod common;

use common::{Fixtures, recording_decoder, rgb8, rgb10, rgba_float};
use vfx_bridge::instrument::{BACKEND_DECODE, NATIVE_DECODE};
use vfx_bridge::metadata::{KEY_BIT_DEPTH, KEY_FORMAT, KEY_WIDTH};
use vfx_bridge::{BridgeError, DecodeOptions, DecodePath, DecodeState, EncodingType};

#[test]
fn png_takes_the_native_path() {
    let fixtures = Fixtures::new();
    let path = fixtures.write("plate.png", &rgb8(8, 4), EncodingType::Png, 8);
    let (decoder, sink) = recording_decoder();

    let decoded = decoder.decode(&path, &DecodeOptions::default()).unwrap();
    assert_eq!(decoded.path, DecodePath::Native);
    assert_eq!(decoded.image.encoding(), EncodingType::Png);
    assert!(decoded.image.metadata().is_empty());
    assert_eq!(decoded.image.pixels(), &rgb8(8, 4));

    assert_eq!(sink.count(NATIVE_DECODE), 1);
    assert_eq!(sink.count(BACKEND_DECODE), 0);
}

#[test]
fn jpeg_and_tiff_are_native_too() {
    let fixtures = Fixtures::new();
    let jpeg = fixtures.write("preview.jpg", &rgb8(16, 16), EncodingType::Jpeg, 8);
    let tiff = fixtures.write("print.tif", &rgb10(4, 4), EncodingType::Tiff, 16);
    let (decoder, _) = recording_decoder();

    for (path, encoding) in [(jpeg, EncodingType::Jpeg), (tiff, EncodingType::Tiff)] {
        let decoded = decoder.decode(&path, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.path, DecodePath::Native);
        assert_eq!(decoded.image.encoding(), encoding);
    }
}

#[test]
fn dpx_falls_back_to_backend_with_metadata() {
    let fixtures = Fixtures::new();
    let path = fixtures.write("scan.0101.dpx", &rgb10(6, 3), EncodingType::Dpx, 10);
    let (decoder, sink) = recording_decoder();

    let decoded = decoder.decode(&path, &DecodeOptions::default()).unwrap();
    assert_eq!(decoded.path, DecodePath::Backend);
    assert_eq!(
        decoded.trail,
        vec![
            DecodeState::NotStarted,
            DecodeState::TryingNative,
            DecodeState::TryingBackend,
            DecodeState::Succeeded(DecodePath::Backend),
        ]
    );

    let image = decoded.image;
    assert_eq!(image.encoding(), EncodingType::Dpx);
    assert_eq!(image.metadata().get_str(KEY_FORMAT), Some("dpx"));
    assert_eq!(image.metadata().get_u32(KEY_BIT_DEPTH), Some(10));
    assert_eq!(image.metadata().get_u32(KEY_WIDTH), Some(6));
    assert_eq!(image.pixels(), &rgb10(6, 3));

    assert_eq!(sink.labels(), vec![NATIVE_DECODE.to_string(), BACKEND_DECODE.to_string()]);
}

#[test]
fn exr_and_hdr_are_backend_only() {
    let fixtures = Fixtures::new();
    let exr = fixtures.write("beauty.exr", &rgba_float(4, 4), EncodingType::OpenExr, 32);
    let hdr = fixtures.write("sky.hdr", &rgba_float(4, 4), EncodingType::Hdr, 32);
    let (decoder, _) = recording_decoder();

    for (path, encoding) in [(exr, EncodingType::OpenExr), (hdr, EncodingType::Hdr)] {
        let decoded = decoder.decode(&path, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.path, DecodePath::Backend);
        assert_eq!(decoded.image.encoding(), encoding);
        assert!(!decoded.image.metadata().is_empty());
    }
}

#[test]
fn forced_decode_never_touches_native() {
    let fixtures = Fixtures::new();
    let path = fixtures.write("plate.png", &rgb8(4, 4), EncodingType::Png, 8);
    let (decoder, sink) = recording_decoder();

    let decoded = decoder.decode(&path, &DecodeOptions::forced()).unwrap();
    assert_eq!(decoded.path, DecodePath::Backend);
    assert_eq!(decoded.image.encoding(), EncodingType::Png);
    assert_eq!(decoded.image.metadata().get_str(KEY_FORMAT), Some("png"));

    assert_eq!(sink.count(NATIVE_DECODE), 0);
    assert_eq!(sink.count(BACKEND_DECODE), 1);
}

#[test]
fn forced_and_native_decodes_agree_on_pixels() {
    let fixtures = Fixtures::new();
    let path = fixtures.write("plate.png", &rgb8(5, 3), EncodingType::Png, 8);

    let native = vfx_bridge::read(&path).unwrap();
    let forced = vfx_bridge::read_forced(&path).unwrap();
    assert_eq!(native.pixels(), forced.pixels());
    assert_eq!(native.encoding(), forced.encoding());
}

#[test]
fn missing_file_is_unreadable() {
    let fixtures = Fixtures::new();
    let (decoder, sink) = recording_decoder();
    let err = decoder
        .decode(fixtures.path("absent.dpx"), &DecodeOptions::default())
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnreadableSource { .. }));
    assert_eq!(sink.count(BACKEND_DECODE), 0);
}

#[test]
fn truncated_dpx_is_unreadable() {
    let fixtures = Fixtures::new();
    let source = fixtures.write("full.dpx", &rgb10(4, 4), EncodingType::Dpx, 10);
    let full = std::fs::read(source).unwrap();
    let path = fixtures.raw("cut.dpx", &full[..400]);

    let err = vfx_bridge::read(&path).unwrap_err();
    assert!(matches!(err, BridgeError::UnreadableSource { .. }), "{err}");
}

#[test]
fn corrupt_png_falls_through_and_fails() {
    let fixtures = Fixtures::new();
    let source = fixtures.write("full.png", &rgb8(4, 4), EncodingType::Png, 8);
    let full = std::fs::read(source).unwrap();
    let path = fixtures.raw("cut.png", &full[..24]);
    let (decoder, sink) = recording_decoder();

    let err = decoder.decode(&path, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, BridgeError::UnreadableSource { .. }), "{err}");
    assert_eq!(sink.count(NATIVE_DECODE), 1);
    assert_eq!(sink.count(BACKEND_DECODE), 1);
}

#[test]
fn unrecognized_content_is_unsupported() {
    let fixtures = Fixtures::new();
    let path = fixtures.raw("notes.txt", b"plain text, not pixels");
    let err = vfx_bridge::read(&path).unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedFormat { .. }), "{err}");
}

#[test]
fn one_decoder_serves_many_threads() {
    let fixtures = Fixtures::new();
    let png = fixtures.write("a.png", &rgb8(4, 4), EncodingType::Png, 8);
    let dpx = fixtures.write("b.dpx", &rgb10(4, 4), EncodingType::Dpx, 10);
    let (decoder, sink) = recording_decoder();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                assert!(decoder.decode(&png, &DecodeOptions::default()).is_ok());
                assert!(decoder.decode(&dpx, &DecodeOptions::default()).is_ok());
            });
        }
    });
    assert_eq!(sink.count(NATIVE_DECODE), 8);
    assert_eq!(sink.count(BACKEND_DECODE), 4);
}
