//! Decoding tests over a synthetic binary manifest.

use apkdump_axml::{AxmlError, Manifest, XmlDocument};

const FILE_TAG: u32 = 0x0008_0003;
const STRING_CHUNK_TAG: u32 = 0x001c_0001;
const RESOURCE_CHUNK_TAG: u32 = 0x0008_0180;
const START_NAMESPACE_TAG: u32 = 0x0010_0100;
const END_NAMESPACE_TAG: u32 = 0x0010_0101;
const START_TAG: u32 = 0x0010_0102;
const END_TAG: u32 = 0x0010_0103;

const STRINGS: &[&str] = &[
    "manifest",                    // 0
    "package",                     // 1
    "com.example.app.test",        // 2
    "platformBuildVersionCode",    // 3
    "25",                          // 4
    "uses-sdk",                    // 5
    "minSdkVersion",               // 6
    "instrumentation",             // 7
    "label",                       // 8
    "Tests for com.example.app",   // 9
    "name",                        // 10
    "android.test.Runner",         // 11
    "targetPackage",               // 12
    "com.example.app",             // 13
    "functionalTest",              // 14
    "true",                        // 15
    "application",                 // 16
    "debuggable",                  // 17
    "uses-library",                // 18
    "android.test.runner",         // 19
    "uses-permission",             // 20
    "android.permission.INTERNET", // 21
];

fn w32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn wi32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn string_chunk(strings: &[&str]) -> Vec<u8> {
    let mut offsets = Vec::new();
    let mut raw = Vec::new();
    for s in strings {
        offsets.push(raw.len() as u32);
        let units: Vec<u16> = s.encode_utf16().collect();
        raw.extend_from_slice(&(units.len() as u16).to_le_bytes());
        for unit in units {
            raw.extend_from_slice(&unit.to_le_bytes());
        }
    }

    let strings_start = 28 + 4 * strings.len() as u32;
    let chunk_size = strings_start + raw.len() as u32;

    let mut out = Vec::new();
    w32(&mut out, STRING_CHUNK_TAG);
    w32(&mut out, chunk_size);
    w32(&mut out, strings.len() as u32);
    w32(&mut out, 0); // styles
    w32(&mut out, 0); // reserved
    w32(&mut out, strings_start);
    w32(&mut out, 0); // no style data
    for offset in offsets {
        w32(&mut out, offset);
    }
    out.extend_from_slice(&raw);
    out
}

/// `(name index, value index, resource id)` per attribute.
fn start_tag(out: &mut Vec<u8>, name: i32, attrs: &[(i32, i32, i32)]) {
    w32(out, START_TAG);
    w32(out, 0); // chunk size, unused
    w32(out, 0); // line number, unused
    w32(out, 0); // reserved
    wi32(out, -1); // default namespace
    wi32(out, name);
    w32(out, 0);
    w32(out, attrs.len() as u32);
    w32(out, 0);
    for &(name, value, resource_id) in attrs {
        wi32(out, -1); // default namespace
        wi32(out, name);
        wi32(out, value);
        w32(out, 0); // reserved
        wi32(out, resource_id);
    }
}

fn end_tag(out: &mut Vec<u8>, name: i32) {
    w32(out, END_TAG);
    w32(out, 0);
    w32(out, 0);
    w32(out, 0);
    wi32(out, -1);
    wi32(out, name);
}

fn build_manifest() -> Vec<u8> {
    let mut out = Vec::new();
    w32(&mut out, FILE_TAG);
    w32(&mut out, 0); // file size, patched below
    out.extend_from_slice(&string_chunk(STRINGS));
    w32(&mut out, RESOURCE_CHUNK_TAG);
    w32(&mut out, 8); // no resource ids

    // leading namespace record, skipped by the decoder
    w32(&mut out, START_NAMESPACE_TAG);
    for _ in 0..3 {
        w32(&mut out, 0);
    }
    wi32(&mut out, -1);
    wi32(&mut out, -1);

    start_tag(&mut out, 0, &[(1, 2, -1), (3, 4, -1)]); // manifest
    start_tag(&mut out, 5, &[(6, -1, 0xf)]); // uses-sdk
    end_tag(&mut out, 5);
    start_tag(
        &mut out,
        7, // instrumentation
        &[(8, 9, -1), (10, 11, -1), (12, 13, -1), (14, 15, -1)],
    );
    end_tag(&mut out, 7);
    start_tag(&mut out, 20, &[(10, 21, -1)]); // uses-permission
    end_tag(&mut out, 20);
    start_tag(&mut out, 16, &[(17, -1, -1)]); // application, valueless attribute
    start_tag(&mut out, 18, &[(10, 19, -1)]); // uses-library
    end_tag(&mut out, 18);

    // namespace scope closing while still inside <application>; skipped,
    // not an end-of-document marker
    w32(&mut out, END_NAMESPACE_TAG);
    for _ in 0..3 {
        w32(&mut out, 0);
    }
    wi32(&mut out, -1);
    wi32(&mut out, -1);

    end_tag(&mut out, 16);
    end_tag(&mut out, 0); // closes the root, decoding stops here

    w32(&mut out, END_NAMESPACE_TAG);
    for _ in 0..5 {
        w32(&mut out, 0);
    }

    let total = out.len() as u32;
    out[4..8].copy_from_slice(&total.to_le_bytes());
    out
}

const EXPECTED: &str = "<manifest  package='com.example.app.test' platformBuildVersionCode='25'>\n  \
                        <uses-sdk  minSdkVersion='resourceID 0xf'>\n  \n</uses-sdk>\n  \
                        <instrumentation  label='Tests for com.example.app' name='android.test.Runner' targetPackage='com.example.app' functionalTest='true'>\n  \n</instrumentation>\n  \
                        <uses-permission  name='android.permission.INTERNET'>\n  \n</uses-permission>\n  \
                        <application  debuggable>\n  <uses-library  name='android.test.runner'>\n  \n</uses-library>\n</application>\n</manifest>";

#[test]
fn renders_expected_tree() {
    let data = build_manifest();
    let document = XmlDocument::parse(&mut &data[..]).unwrap();
    assert_eq!(document.to_string(), EXPECTED);
}

#[test]
fn surfaces_manifest_metadata() {
    let data = build_manifest();
    let document = XmlDocument::parse(&mut &data[..]).unwrap();
    let manifest = Manifest::from_document(&document).unwrap();

    assert_eq!(manifest.package.as_deref(), Some("com.example.app.test"));
    assert_eq!(manifest.platform_build_version_code.as_deref(), Some("25"));
    assert_eq!(manifest.platform_build_version_name, None);

    let sdk = manifest.uses_sdk.as_ref().unwrap();
    assert_eq!(sdk.min_sdk_version.as_deref(), Some("resourceID 0xf"));
    assert_eq!(sdk.target_sdk_version, None);

    assert_eq!(manifest.instrumentation.len(), 1);
    let instrumentation = &manifest.instrumentation[0];
    assert_eq!(instrumentation.name.as_deref(), Some("android.test.Runner"));
    assert_eq!(
        instrumentation.target_package.as_deref(),
        Some("com.example.app")
    );
    assert_eq!(
        instrumentation.label.as_deref(),
        Some("Tests for com.example.app")
    );
    assert!(instrumentation.functional_test);
    assert!(!instrumentation.handle_profiling);

    assert_eq!(
        manifest.uses_permissions,
        vec!["android.permission.INTERNET".to_owned()]
    );
}

#[test]
fn decoding_is_deterministic() {
    let data = build_manifest();
    let first = XmlDocument::parse(&mut &data[..]).unwrap();
    let second = XmlDocument::parse(&mut &data[..]).unwrap();
    assert_eq!(first, second);
}

#[test]
fn non_manifest_root_yields_no_metadata() {
    let mut out = Vec::new();
    w32(&mut out, FILE_TAG);
    w32(&mut out, 0);
    out.extend_from_slice(&string_chunk(&["widget"]));
    w32(&mut out, RESOURCE_CHUNK_TAG);
    w32(&mut out, 8);
    start_tag(&mut out, 0, &[]);
    end_tag(&mut out, 0);

    let document = XmlDocument::parse(&mut &out[..]).unwrap();
    assert_eq!(document.root().name, "widget");
    assert!(Manifest::from_document(&document).is_none());
}

#[test]
fn namespace_record_inside_tree_is_skipped() {
    let mut out = Vec::new();
    w32(&mut out, FILE_TAG);
    w32(&mut out, 0);
    out.extend_from_slice(&string_chunk(&["manifest", "child"]));
    w32(&mut out, RESOURCE_CHUNK_TAG);
    w32(&mut out, 8);

    start_tag(&mut out, 0, &[]);
    // namespace scope closing while the root is still open
    w32(&mut out, END_NAMESPACE_TAG);
    for _ in 0..3 {
        w32(&mut out, 0);
    }
    wi32(&mut out, -1);
    wi32(&mut out, -1);
    start_tag(&mut out, 1, &[]);
    end_tag(&mut out, 1);
    end_tag(&mut out, 0);

    let document = XmlDocument::parse(&mut &out[..]).unwrap();
    assert_eq!(
        document.to_string(),
        "<manifest  >\n  <child  >\n  \n</child>\n</manifest>"
    );
}

#[test]
fn rejects_wrong_file_tag() {
    let mut data = build_manifest();
    data[0..4].copy_from_slice(&0x0008_0001u32.to_le_bytes());
    assert!(matches!(
        XmlDocument::parse(&mut &data[..]),
        Err(AxmlError::InvalidFileTag(0x0008_0001))
    ));
}

#[test]
fn rejects_misaligned_resource_chunk() {
    let mut out = Vec::new();
    w32(&mut out, FILE_TAG);
    w32(&mut out, 0);
    out.extend_from_slice(&string_chunk(&["manifest"]));
    w32(&mut out, RESOURCE_CHUNK_TAG);
    w32(&mut out, 10);
    assert!(matches!(
        XmlDocument::parse(&mut &out[..]),
        Err(AxmlError::MisalignedResourceChunk(10))
    ));
}

#[test]
fn rejects_unexpected_element_tag() {
    let mut out = Vec::new();
    w32(&mut out, FILE_TAG);
    w32(&mut out, 0);
    out.extend_from_slice(&string_chunk(&["manifest"]));
    w32(&mut out, RESOURCE_CHUNK_TAG);
    w32(&mut out, 8);
    w32(&mut out, 0x0010_0199);
    assert!(matches!(
        XmlDocument::parse(&mut &out[..]),
        Err(AxmlError::UnexpectedElementTag(0x0010_0199))
    ));
}
