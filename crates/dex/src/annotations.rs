//! Annotation records: the directory/set/item chain hanging off a class
//! definition's `annotations_off`.

use winnow::binary::{le_u32, u8};
use winnow::combinator::repeat;
use winnow::prelude::*;

use crate::encoded_value::EncodedValue;
use crate::stream::uleb128;

/// One `(index, offset)` pair of an annotations directory: the index of an
/// annotated field, method, or parameter, and the offset of its annotation
/// set.
#[derive(Debug)]
pub struct Annotation {
    pub index: u32,
    pub annotations_off: u32,
}

impl Annotation {
    #[inline]
    fn parse(input: &mut &[u8]) -> ModalResult<Annotation> {
        (le_u32, le_u32)
            .map(|(index, annotations_off)| Annotation {
                index,
                annotations_off,
            })
            .parse_next(input)
    }
}

/// Abstraction over `annotations_directory_item`
///
/// See: <https://source.android.com/docs/core/runtime/dex-format#annotations-directory>
#[derive(Debug)]
pub struct AnnotationsDirectory {
    /// Offset to class-level annotations, 0 if there are none
    pub class_annotations_off: u32,

    pub field_annotations: Vec<Annotation>,
    pub method_annotations: Vec<Annotation>,
    pub parameter_annotations: Vec<Annotation>,
}

impl AnnotationsDirectory {
    pub fn parse(input: &mut &[u8]) -> ModalResult<AnnotationsDirectory> {
        let (class_annotations_off, fields_size, methods_size, parameters_size) =
            (le_u32, le_u32, le_u32, le_u32).parse_next(input)?;

        let field_annotations = repeat(fields_size as usize, Annotation::parse).parse_next(input)?;
        let method_annotations =
            repeat(methods_size as usize, Annotation::parse).parse_next(input)?;
        let parameter_annotations =
            repeat(parameters_size as usize, Annotation::parse).parse_next(input)?;

        Ok(AnnotationsDirectory {
            class_annotations_off,
            field_annotations,
            method_annotations,
            parameter_annotations,
        })
    }
}

/// Abstraction over `annotation_set_item`: offsets of the annotation items
/// attached to one program element.
#[derive(Debug)]
pub struct AnnotationSet {
    pub offsets: Vec<u32>,
}

impl AnnotationSet {
    pub fn parse(input: &mut &[u8]) -> ModalResult<AnnotationSet> {
        let size = le_u32.parse_next(input)?;
        let offsets = repeat(size as usize, le_u32).parse_next(input)?;

        Ok(AnnotationSet { offsets })
    }
}

/// Abstraction over `annotation_item`: a visibility byte followed by the
/// encoded annotation.
#[derive(Debug, PartialEq)]
pub struct AnnotationItem {
    pub visibility: u8,
    pub annotation: EncodedAnnotation,
}

impl AnnotationItem {
    pub fn parse(input: &mut &[u8]) -> ModalResult<AnnotationItem> {
        let visibility = u8.parse_next(input)?;
        let annotation = EncodedAnnotation::parse(input)?;

        Ok(AnnotationItem {
            visibility,
            annotation,
        })
    }
}

/// Abstraction over `encoded_annotation`
///
/// See: <https://source.android.com/docs/core/runtime/dex-format#encoding>
#[derive(Debug, PartialEq)]
pub struct EncodedAnnotation {
    /// Index into the type pool for the annotation type
    pub type_idx: u64,

    pub elements: Vec<AnnotationElement>,
}

impl EncodedAnnotation {
    pub fn parse(input: &mut &[u8]) -> ModalResult<EncodedAnnotation> {
        let type_idx = uleb128(input)?;
        let size = uleb128(input)? as usize;
        let elements = repeat(size, AnnotationElement::parse).parse_next(input)?;

        Ok(EncodedAnnotation { type_idx, elements })
    }
}

/// One `name = value` pair of an annotation.
#[derive(Debug, PartialEq)]
pub struct AnnotationElement {
    /// Index into the string pool for the element name
    pub name_idx: u64,

    pub value: EncodedValue,
}

impl AnnotationElement {
    fn parse(input: &mut &[u8]) -> ModalResult<AnnotationElement> {
        let name_idx = uleb128(input)?;
        let value = EncodedValue::parse(input)?;

        Ok(AnnotationElement { name_idx, value })
    }
}
