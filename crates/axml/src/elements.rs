//! Element-stream records and the resolved tag model.

use winnow::binary::{le_i32, le_u32};
use winnow::combinator::repeat;
use winnow::prelude::*;

/// Element-stream chunk tags.
pub(crate) const START_NAMESPACE_TAG: u32 = 0x0010_0100;
/// Doubles as the end-of-document marker at the document root.
pub(crate) const END_NAMESPACE_TAG: u32 = 0x0010_0101;
pub(crate) const START_TAG: u32 = 0x0010_0102;
pub(crate) const END_TAG: u32 = 0x0010_0103;

/// Attribute of an element, resolved against the document string pool.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlAttr {
    pub namespace: Option<String>,
    pub name: String,

    /// `None` when the record carries neither a value string nor a
    /// resource ID; resource IDs surface as `resourceID 0x…` literals.
    pub value: Option<String>,
}

/// Element node. Children and the parent back-reference are indices into
/// the document arena.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlTag {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<XmlAttr>,
    pub children: Vec<usize>,
    pub parent: Option<usize>,
}

/// START_TAG body, before string resolution. The caller has consumed the
/// chunk tag word.
#[derive(Debug)]
pub(crate) struct RawStartTag {
    pub namespace: i32,
    pub name: i32,
    pub attributes: Vec<RawAttr>,
}

impl RawStartTag {
    pub(crate) fn parse(input: &mut &[u8]) -> ModalResult<RawStartTag> {
        let (_chunk_size, _line_number, _reserved, namespace, name) =
            (le_u32, le_u32, le_u32, le_i32, le_i32).parse_next(input)?;

        let (_, attribute_count, _) = (le_u32, le_u32, le_u32).parse_next(input)?;
        let attributes = repeat(attribute_count as usize, RawAttr::parse).parse_next(input)?;

        Ok(RawStartTag {
            namespace,
            name,
            attributes,
        })
    }
}

/// END_TAG body; only consumed for its size.
pub(crate) struct RawEndTag;

impl RawEndTag {
    pub(crate) fn parse(input: &mut &[u8]) -> ModalResult<RawEndTag> {
        let _ = (le_u32, le_u32, le_u32, le_i32, le_i32).parse_next(input)?;
        Ok(RawEndTag)
    }
}

/// Namespace record body (prefix and uri indices); skipped.
pub(crate) fn skip_namespace_record(input: &mut &[u8]) -> ModalResult<()> {
    let _ = (le_u32, le_u32, le_u32, le_i32, le_i32).parse_next(input)?;
    Ok(())
}

/// Attribute record: five words.
#[derive(Debug)]
pub(crate) struct RawAttr {
    /// String index of the namespace, -1 for the default namespace
    pub namespace: i32,

    /// String index of the name
    pub name: i32,

    /// String index of the value, -1 when the resource ID is to be used
    pub value: i32,

    /// Resource ID, negative when absent
    pub resource_id: i32,
}

impl RawAttr {
    fn parse(input: &mut &[u8]) -> ModalResult<RawAttr> {
        (le_i32, le_i32, le_i32, le_u32, le_i32)
            .map(|(namespace, name, value, _reserved, resource_id)| RawAttr {
                namespace,
                name,
                value,
                resource_id,
            })
            .parse_next(input)
    }
}
