//! Integration tests for FormatRegistry and the file type listings.

use std::path::Path;
use vfx_bridge::registry::BUILTIN_FORMATS;
use vfx_bridge::{EncodingType, FormatRegistry};

#[test]
fn registry_global_has_all_formats() {
    let registry = FormatRegistry::global();
    let names: Vec<_> = registry.entries().iter().map(|e| e.name).collect();
    for name in ["PNG", "JPEG", "TIFF", "OpenEXR", "Radiance HDR", "DPX"] {
        assert!(names.contains(&name), "{name} not found in registry");
    }
}

#[test]
fn every_known_encoding_is_readable_and_writable() {
    let registry = FormatRegistry::global();
    for encoding in EncodingType::KNOWN {
        let entry = registry.entry_for_encoding(encoding).unwrap();
        assert!(entry.backend_read, "{encoding}");
        assert!(registry.can_backend_write(encoding), "{encoding}");
    }
    assert!(!registry.can_backend_write(EncodingType::Unknown));
}

#[test]
fn lookups_ignore_case_and_dots() {
    let registry = FormatRegistry::global();
    for key in ["dpx", "DPX", ".Dpx", " dpx "] {
        assert_eq!(registry.lookup(key).map(|e| e.encoding), Some(EncodingType::Dpx), "{key:?}");
    }
    assert_eq!(
        registry.get_by_path(Path::new("/shots/sh010/beauty.0001.EXR")).map(|e| e.encoding),
        Some(EncodingType::OpenExr)
    );
    assert!(registry.lookup("xyz").is_none());
}

#[test]
fn native_support_is_narrower_than_backend() {
    let registry = FormatRegistry::global();
    assert!(registry.is_natively_supported("png"));
    assert!(!registry.is_natively_supported("dpx"));
    assert!(registry.is_backend_supported("dpx"));
    assert!(registry.is_backend_supported("org.smpte.dpx"));
}

#[test]
fn listings_are_strict_supersets() {
    let native = vfx_bridge::image_file_types();
    let all = vfx_bridge::all_image_file_types();
    assert!(native.iter().all(|ext| all.contains(ext)));
    for ext in ["dpx", "exr", "hdr"] {
        assert!(all.contains(&ext) && !native.contains(&ext), "{ext}");
    }

    let native_types = vfx_bridge::image_types();
    let all_types = vfx_bridge::all_image_types();
    assert!(native_types.iter().all(|t| all_types.contains(t)));
    assert!(all_types.len() > native_types.len());
}

#[test]
fn listings_follow_table_order() {
    let all = vfx_bridge::all_image_file_types();
    let expected: Vec<&str> = BUILTIN_FORMATS
        .iter()
        .flat_map(|e| e.extensions.iter().copied())
        .collect();
    assert_eq!(all, expected);
}

#[test]
fn custom_registry_can_disable_native_decoding() {
    let registry = FormatRegistry::new(BUILTIN_FORMATS.iter().map(|entry| {
        let mut entry = *entry;
        entry.native = false;
        entry
    }));
    assert!(registry.supported_file_extensions(false).is_empty());
    assert_eq!(
        registry.supported_file_extensions(true).len(),
        FormatRegistry::global().supported_file_extensions(true).len()
    );
}

#[test]
fn dpx_type_identifier_round_trips_through_lookup() {
    let id = vfx_bridge::dpx_type_identifier();
    assert_eq!(id, "org.smpte.dpx");
    let entry = FormatRegistry::global().lookup(id).unwrap();
    assert_eq!(entry.name, "DPX");
    assert_eq!(entry.type_identifier, id);
}
