//! JUnit3 and JUnit4 test-method discovery over a decoded [Dex].

use std::collections::{BTreeSet, HashSet};

use log::debug;

use crate::annotations::{AnnotationItem, AnnotationSet, AnnotationsDirectory};
use crate::class_data::ClassData;
use crate::dex::{ClassItem, Dex};
use crate::errors::DexError;

/// Descriptors of the base classes JUnit3 discovery starts from.
///
/// The set is an input: callers chasing exotic test hierarchies can pass
/// their own list to [TestResolver::junit3_tests].
pub const DEFAULT_TEST_BASE_CLASSES: &[&str] = &[
    "Landroid/test/InstrumentationTestCase;",
    "Landroid/test/AndroidTestCase;",
    "Ljunit/framework/TestCase;",
    "Landroid/test/ActivityInstrumentationTestCase2;",
];

const TEST_ANNOTATION: &str = "Lorg/junit/Test;";
const IGNORE_ANNOTATION: &str = "Lorg/junit/Ignore;";

/// Reformat a class descriptor into the dotted name expected by
/// `adb shell am instrument`: strip the leading `L` and trailing `;`,
/// then turn `/` into `.`.
pub fn descriptor_to_dotted(descriptor: &str) -> String {
    let name = descriptor.strip_prefix('L').unwrap_or(descriptor);
    let name = name.strip_suffix(';').unwrap_or(name);
    name.replace('/', ".")
}

/// Test discovery over one dex file, restricted by an optional package
/// filter.
///
/// A class is admitted iff the filter list is empty or some filter string
/// occurs as a substring of the dotted class name.
pub struct TestResolver<'a> {
    dex: &'a Dex,
    filters: &'a [String],
}

impl<'a> TestResolver<'a> {
    pub fn new(dex: &'a Dex, filters: &'a [String]) -> TestResolver<'a> {
        TestResolver { dex, filters }
    }

    /// JUnit3 discovery: classes one inheritance hop below
    /// `base_descriptors` contribute their virtual methods whose names
    /// begin with `test`.
    ///
    /// Matching runs once over a snapshot of the base set, so subclasses
    /// of discovered subclasses are not followed.
    pub fn junit3_tests(&self, base_descriptors: &[&str]) -> Result<BTreeSet<String>, DexError> {
        let bases: HashSet<&str> = base_descriptors.iter().copied().collect();

        let mut subclasses: Vec<&ClassItem> = Vec::new();
        for class in &self.dex.class_defs {
            let Some(superclass) = class.superclass_descriptor(self.dex) else {
                continue;
            };
            if bases.contains(superclass.as_ref()) {
                subclasses.push(class);
            }
        }

        let mut tests = BTreeSet::new();
        for class in subclasses {
            let descriptor = class
                .descriptor(self.dex)
                .ok_or(DexError::TypeIndex(class.class_idx as u64))?;
            let dotted = descriptor_to_dotted(&descriptor);
            if !self.admits(&dotted) {
                continue;
            }

            debug!("junit3 candidate: {dotted}");
            for name in self.virtual_method_names(class)? {
                if name.starts_with("test") {
                    tests.insert(name);
                }
            }
        }

        Ok(tests)
    }

    /// JUnit4 discovery: methods annotated `@org.junit.Test` and not
    /// `@org.junit.Ignore`, reported as `dotted.Class#method`.
    pub fn junit4_tests(&self) -> Result<BTreeSet<String>, DexError> {
        let mut tests = BTreeSet::new();

        for class in self.dex.class_defs.iter().filter(|c| c.annotations_off != 0) {
            let descriptor = class
                .descriptor(self.dex)
                .ok_or(DexError::TypeIndex(class.class_idx as u64))?;
            let dotted = descriptor_to_dotted(&descriptor);
            if !self.admits(&dotted) {
                continue;
            }

            let mut input = self.dex.data_at(class.annotations_off)?;
            let directory =
                AnnotationsDirectory::parse(&mut input).map_err(|_| DexError::AnnotationError)?;

            let annotated = self.methods_with_annotation(&directory, TEST_ANNOTATION)?;
            let ignored = self.methods_with_annotation(&directory, IGNORE_ANNOTATION)?;

            for name in annotated.difference(&ignored) {
                tests.insert(format!("{dotted}#{name}"));
            }
        }

        Ok(tests)
    }

    /// Names of the directory's methods that carry an annotation with the
    /// given type descriptor.
    fn methods_with_annotation(
        &self,
        directory: &AnnotationsDirectory,
        target: &str,
    ) -> Result<BTreeSet<String>, DexError> {
        let mut names = BTreeSet::new();

        for annotation in &directory.method_annotations {
            if annotation.annotations_off == 0 {
                continue;
            }

            let mut input = self.dex.data_at(annotation.annotations_off)?;
            let set = AnnotationSet::parse(&mut input).map_err(|_| DexError::AnnotationError)?;

            for &offset in &set.offsets {
                let mut input = self.dex.data_at(offset)?;
                let item =
                    AnnotationItem::parse(&mut input).map_err(|_| DexError::AnnotationError)?;

                let descriptor = self
                    .dex
                    .type_descriptor(item.annotation.type_idx as usize)
                    .ok_or(DexError::TypeIndex(item.annotation.type_idx))?;

                if descriptor == target {
                    names.insert(self.method_name(annotation.index as u64)?);
                    break;
                }
            }
        }

        Ok(names)
    }

    /// Virtual-method names of a class, empty when it has no class data.
    fn virtual_method_names(&self, class: &ClassItem) -> Result<Vec<String>, DexError> {
        if class.class_data_off == 0 {
            return Ok(Vec::new());
        }

        let mut input = self.dex.data_at(class.class_data_off)?;
        let class_data = ClassData::parse(&mut input).map_err(|_| DexError::ClassDataError)?;

        class_data
            .virtual_methods
            .iter()
            .map(|method| self.method_name(method.method_idx))
            .collect()
    }

    fn method_name(&self, method_idx: u64) -> Result<String, DexError> {
        let method = self
            .dex
            .method_ids
            .get(method_idx as usize)
            .ok_or(DexError::MethodIndex(method_idx))?;

        let name = method
            .name(self.dex)
            .ok_or(DexError::StringIndex(method.name_idx as u64))?;

        Ok(name.into_owned())
    }

    fn admits(&self, dotted: &str) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|f| dotted.contains(f.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_to_dotted_strips_decoration() {
        assert_eq!(
            descriptor_to_dotted("Lcom/example/app/FooTest;"),
            "com.example.app.FooTest"
        );
        assert_eq!(descriptor_to_dotted("Lorg/junit/Test;"), "org.junit.Test");
    }

    #[test]
    fn dotted_names_carry_no_descriptor_syntax() {
        for descriptor in DEFAULT_TEST_BASE_CLASSES {
            let dotted = descriptor_to_dotted(descriptor);
            assert!(!dotted.starts_with('L'));
            assert!(!dotted.starts_with('/'));
            assert!(!dotted.contains(';'));
        }
    }
}
