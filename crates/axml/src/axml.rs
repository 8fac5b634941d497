//! Binary manifest decoding: header chunks, the element stream, and the
//! resulting tag tree.

use std::fmt;

use log::debug;
use winnow::binary::le_u32;
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::take;

use crate::elements::{
    END_NAMESPACE_TAG, END_TAG, RawAttr, RawEndTag, RawStartTag, START_NAMESPACE_TAG, START_TAG,
    XmlAttr, XmlTag, skip_namespace_record,
};
use crate::errors::AxmlError;
use crate::string_pool::StringPool;

const FILE_TAG: u32 = 0x0008_0003;
const STRING_CHUNK_TAG: u32 = 0x001c_0001;
const RESOURCE_CHUNK_TAG: u32 = 0x0008_0180;

/// A decoded binary `AndroidManifest.xml`: the element tree in an arena,
/// rooted at the first start tag.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    tags: Vec<XmlTag>,
    root: usize,
}

impl XmlDocument {
    /// Decode a document from raw manifest bytes.
    pub fn parse(input: &mut &[u8]) -> Result<XmlDocument, AxmlError> {
        // basic sanity check
        if input.len() < 8 {
            return Err(AxmlError::TooSmall);
        }

        let file_tag = word(input)?;
        if file_tag != FILE_TAG {
            return Err(AxmlError::InvalidFileTag(file_tag));
        }
        let _file_size = word(input)?;

        let string_chunk_tag = word(input)?;
        if string_chunk_tag != STRING_CHUNK_TAG {
            return Err(AxmlError::InvalidStringChunkTag(string_chunk_tag));
        }
        let pool = StringPool::parse(input).map_err(|_| AxmlError::StringPoolError)?;

        let resource_chunk_tag = word(input)?;
        if resource_chunk_tag != RESOURCE_CHUNK_TAG {
            return Err(AxmlError::InvalidResourceChunkTag(resource_chunk_tag));
        }
        let resource_chunk_size = word(input)?;
        if resource_chunk_size % 4 != 0 {
            return Err(AxmlError::MisalignedResourceChunk(resource_chunk_size));
        }
        // resource IDs are not used for anything
        take(resource_chunk_size.saturating_sub(8) as usize)
            .parse_next(input)
            .map_err(|_: ContextError| AxmlError::Truncated)?;

        Self::parse_elements(input, &pool)
    }

    /// Walk the element stream, appending each start tag under the
    /// current one and ascending on end tags. An end tag at the root, or
    /// the end-of-document marker at the root, stops the walk; namespace
    /// records inside the tree are skipped.
    fn parse_elements(input: &mut &[u8], pool: &StringPool) -> Result<XmlDocument, AxmlError> {
        let mut tags: Vec<XmlTag> = Vec::new();
        let mut current: Option<usize> = None;

        while input.len() >= 4 {
            let tag = word(input)?;
            match tag {
                START_TAG => {
                    let raw = RawStartTag::parse(input).map_err(|_| AxmlError::ElementError)?;
                    let index = tags.len();
                    tags.push(Self::resolve_tag(raw, pool, current)?);

                    if let Some(parent) = current {
                        tags[parent].children.push(index);
                    }
                    current = Some(index);
                }
                END_TAG => {
                    RawEndTag::parse(input).map_err(|_| AxmlError::ElementError)?;
                    match current.and_then(|index| tags[index].parent) {
                        Some(parent) => current = Some(parent),
                        // closed the root
                        None => break,
                    }
                }
                START_NAMESPACE_TAG => {
                    debug!("skipping namespace record");
                    skip_namespace_record(input).map_err(|_| AxmlError::ElementError)?;
                }
                // only the occurrence at the document root ends the
                // document; a namespace scope closing inside the tree is
                // skipped like its opening record
                END_NAMESPACE_TAG if current.is_none() => break,
                END_NAMESPACE_TAG => {
                    debug!("skipping namespace record");
                    skip_namespace_record(input).map_err(|_| AxmlError::ElementError)?;
                }
                other => return Err(AxmlError::UnexpectedElementTag(other)),
            }
        }

        if tags.is_empty() {
            return Err(AxmlError::MissingRoot);
        }
        Ok(XmlDocument { tags, root: 0 })
    }

    fn resolve_tag(
        raw: RawStartTag,
        pool: &StringPool,
        parent: Option<usize>,
    ) -> Result<XmlTag, AxmlError> {
        let attributes = raw
            .attributes
            .into_iter()
            .map(|attr| Self::resolve_attr(attr, pool))
            .collect::<Result<Vec<XmlAttr>, AxmlError>>()?;

        Ok(XmlTag {
            namespace: optional_string(pool, raw.namespace)?,
            name: required_string(pool, raw.name)?,
            attributes,
            children: Vec::new(),
            parent,
        })
    }

    fn resolve_attr(raw: RawAttr, pool: &StringPool) -> Result<XmlAttr, AxmlError> {
        let value = if raw.value >= 0 {
            Some(required_string(pool, raw.value)?)
        } else if raw.resource_id >= 0 {
            Some(format!("resourceID {:#x}", raw.resource_id))
        } else {
            None
        };

        Ok(XmlAttr {
            namespace: optional_string(pool, raw.namespace)?,
            name: required_string(pool, raw.name)?,
            value,
        })
    }

    /// The root element.
    pub fn root(&self) -> &XmlTag {
        &self.tags[self.root]
    }

    /// Child elements of a tag, in document order.
    pub fn children<'a>(&'a self, tag: &'a XmlTag) -> impl Iterator<Item = &'a XmlTag> {
        tag.children.iter().map(|&index| &self.tags[index])
    }

    fn fmt_tag(&self, f: &mut fmt::Formatter<'_>, index: usize) -> fmt::Result {
        let tag = &self.tags[index];

        write!(f, "<{}  ", tag.name)?;
        for (i, attr) in tag.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match &attr.value {
                Some(value) => write!(f, "{}='{}'", attr.name, value)?,
                None => f.write_str(&attr.name)?,
            }
        }
        f.write_str(">\n  ")?;

        for (i, &child) in tag.children.iter().enumerate() {
            if i > 0 {
                f.write_str("\n  ")?;
            }
            self.fmt_tag(f, child)?;
        }

        write!(f, "\n</{}>", tag.name)
    }
}

/// Inspection rendering, not a conformant XML serializer: every element
/// prints as `<NAME  ATTR='VAL' ...>`, children indented one step under
/// it, then the closing tag.
impl fmt::Display for XmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tag(f, self.root)
    }
}

fn word(input: &mut &[u8]) -> Result<u32, AxmlError> {
    le_u32
        .parse_next(input)
        .map_err(|_: ContextError| AxmlError::Truncated)
}

fn required_string(pool: &StringPool, index: i32) -> Result<String, AxmlError> {
    if index < 0 {
        return Err(AxmlError::StringIndex(index));
    }
    pool.get(index as u32)
        .map(str::to_owned)
        .ok_or(AxmlError::StringIndex(index))
}

fn optional_string(pool: &StringPool, index: i32) -> Result<Option<String>, AxmlError> {
    if index < 0 {
        return Ok(None);
    }
    Ok(Some(required_string(pool, index)?))
}
