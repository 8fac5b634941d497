//! Structured metadata lifted from a decoded manifest tree.

use crate::axml::XmlDocument;
use crate::elements::XmlTag;

/// Top-level manifest metadata plus the records of interest among its
/// children. Attribute values are carried verbatim; missing attributes
/// are absent.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Manifest {
    pub package: Option<String>,
    pub platform_build_version_code: Option<String>,
    pub platform_build_version_name: Option<String>,
    pub instrumentation: Vec<Instrumentation>,
    pub uses_sdk: Option<UsesSdk>,
    pub uses_permissions: Vec<String>,
}

/// One `<instrumentation>` declaration.
///
/// See: <https://developer.android.com/guide/topics/manifest/instrumentation-element>
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Instrumentation {
    pub name: Option<String>,
    pub target_package: Option<String>,
    pub label: Option<String>,

    /// True iff the attribute value is the literal string `true`
    pub handle_profiling: bool,

    /// True iff the attribute value is the literal string `true`
    pub functional_test: bool,
}

/// The `<uses-sdk>` declaration.
///
/// See: <https://developer.android.com/guide/topics/manifest/uses-sdk-element>
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UsesSdk {
    pub min_sdk_version: Option<String>,
    pub target_sdk_version: Option<String>,
    pub max_sdk_version: Option<String>,
}

impl Manifest {
    /// Read the metadata off a decoded document.
    ///
    /// Returns `None` when the root element is not `<manifest>`.
    pub fn from_document(document: &XmlDocument) -> Option<Manifest> {
        let root = document.root();
        if root.name != "manifest" {
            return None;
        }

        let mut manifest = Manifest {
            package: attr(root, "package"),
            platform_build_version_code: attr(root, "platformBuildVersionCode"),
            platform_build_version_name: attr(root, "platformBuildVersionName"),
            ..Default::default()
        };

        for child in document.children(root) {
            match child.name.as_str() {
                "instrumentation" => manifest.instrumentation.push(Instrumentation {
                    name: attr(child, "name"),
                    target_package: attr(child, "targetPackage"),
                    label: attr(child, "label"),
                    handle_profiling: flag(child, "handleProfiling"),
                    functional_test: flag(child, "functionalTest"),
                }),
                "uses-sdk" => {
                    manifest.uses_sdk = Some(UsesSdk {
                        min_sdk_version: attr(child, "minSdkVersion"),
                        target_sdk_version: attr(child, "targetSdkVersion"),
                        max_sdk_version: attr(child, "maxSdkVersion"),
                    })
                }
                "uses-permission" => {
                    if let Some(name) = attr(child, "name") {
                        manifest.uses_permissions.push(name);
                    }
                }
                _ => {}
            }
        }

        Some(manifest)
    }
}

fn attr(tag: &XmlTag, name: &str) -> Option<String> {
    tag.attributes
        .iter()
        .find(|attr| attr.name == name)
        .and_then(|attr| attr.value.clone())
}

fn flag(tag: &XmlTag, name: &str) -> bool {
    attr(tag, name).as_deref() == Some("true")
}
