use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use apkdump_axml::{Manifest, XmlDocument};
use apkdump_dex::{DEFAULT_TEST_BASE_CLASSES, Dex, TestResolver};
use apkdump_zip::ZipEntry;
use log::debug;

use crate::errors::ApkError;

const ANDROID_MANIFEST_PATH: &str = "AndroidManifest.xml";

/// An APK opened for inspection.
///
/// Entries are decompressed in memory and handed straight to the dex and
/// manifest decoders; nothing is written to disk.
pub struct Apk {
    zip: ZipEntry,
}

impl Apk {
    pub fn open(path: &Path) -> Result<Apk, ApkError> {
        let input = fs::read(path)?;
        if input.is_empty() {
            return Err(ApkError::InvalidInput("got empty file"));
        }

        Ok(Apk {
            zip: ZipEntry::new(input)?,
        })
    }

    /// Names of the dex entries carried by this APK, in a stable order.
    pub fn dex_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .zip
            .namelist()
            .filter(|name| name.ends_with(".dex"))
            .map(str::to_owned)
            .collect();
        names.sort_unstable();
        names
    }

    /// Discover JUnit3 and JUnit4 test methods across every dex entry.
    ///
    /// Per-dex results are unioned; the first failing dex aborts the
    /// whole discovery.
    pub fn find_tests(&self, filters: &[String]) -> Result<BTreeSet<String>, ApkError> {
        let mut tests = BTreeSet::new();

        for name in self.dex_entries() {
            debug!("scanning {name}");
            let data = self.zip.read(&name)?;
            let dex = Dex::new(data)?;

            let resolver = TestResolver::new(&dex, filters);
            tests.extend(resolver.junit3_tests(DEFAULT_TEST_BASE_CLASSES)?);
            tests.extend(resolver.junit4_tests()?);
        }

        Ok(tests)
    }

    /// Decode `AndroidManifest.xml` into an XML tree.
    pub fn manifest(&self) -> Result<XmlDocument, ApkError> {
        let data = self.zip.read(ANDROID_MANIFEST_PATH)?;
        Ok(XmlDocument::parse(&mut &data[..])?)
    }

    /// Structured manifest metadata, `None` when the root element is not
    /// `<manifest>`.
    pub fn manifest_info(&self) -> Result<Option<Manifest>, ApkError> {
        Ok(Manifest::from_document(&self.manifest()?))
    }
}
