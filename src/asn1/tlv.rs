//! Generic tag-length-value decoding of BER/DER encoded data.
//!
//! This knows nothing about Kerberos. It splits an encoding into a tree of
//! [`DecodedField`] nodes that borrow from the input, so the schema code can
//! look fields up by tag instead of position. Header parsing is delegated to
//! `der`, which handles both the short and long length forms.
//!
//! Captured traffic is untrusted, so decoding is bounded by [`DecodeLimits`]:
//! both the nesting depth of constructed fields and the total input size.

use crate::constants::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_SIZE};
use crate::error::KrbError;
use der::asn1::ObjectIdentifier;
use der::{Class, Decode, Length, Reader, SliceReader, Tag};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_depth: usize,
    pub max_size: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        DecodeLimits {
            max_depth: DEFAULT_MAX_DEPTH,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

/// One node of a decoded TLV tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedField<'a> {
    tag: Tag,
    /// The complete encoding of this field, header included.
    raw: &'a [u8],
    content: &'a [u8],
    children: Vec<DecodedField<'a>>,
}

pub fn decode(bytes: &[u8]) -> Result<DecodedField<'_>, KrbError> {
    decode_with_limits(bytes, &DecodeLimits::default())
}

pub fn decode_with_limits<'a>(
    bytes: &'a [u8],
    limits: &DecodeLimits,
) -> Result<DecodedField<'a>, KrbError> {
    if bytes.is_empty() {
        return Err(KrbError::MalformedEncoding);
    }

    if bytes.len() > limits.max_size {
        debug!(
            len = bytes.len(),
            max_size = limits.max_size,
            "input exceeds decode size limit"
        );
        return Err(KrbError::MalformedEncoding);
    }

    let mut reader = SliceReader::new(bytes)?;
    let root = decode_field(&mut reader, bytes, 0, limits)?;

    if !reader.is_finished() {
        trace!(remaining = ?reader.remaining_len(), "ignoring bytes after root field");
    }

    Ok(root)
}

fn decode_field<'a>(
    reader: &mut SliceReader<'a>,
    input: &'a [u8],
    depth: usize,
    limits: &DecodeLimits,
) -> Result<DecodedField<'a>, KrbError> {
    let start = usize::try_from(reader.position())?;
    let tag: Tag = reader.decode()?;
    let length: Length = reader.decode()?;
    let content = reader.read_slice(length)?;
    let end = usize::try_from(reader.position())?;

    let raw = input.get(start..end).ok_or(KrbError::MalformedEncoding)?;

    let children = if tag.is_constructed() {
        if depth >= limits.max_depth {
            debug!(depth, ?tag, "constructed field nested beyond depth limit");
            return Err(KrbError::MalformedEncoding);
        }
        decode_children(content, depth + 1, limits)?
    } else {
        Vec::new()
    };

    Ok(DecodedField {
        tag,
        raw,
        content,
        children,
    })
}

fn decode_children<'a>(
    content: &'a [u8],
    depth: usize,
    limits: &DecodeLimits,
) -> Result<Vec<DecodedField<'a>>, KrbError> {
    let mut reader = SliceReader::new(content)?;
    let mut children = Vec::new();

    while !reader.is_finished() {
        children.push(decode_field(&mut reader, content, depth, limits)?);
    }

    Ok(children)
}

impl<'a> DecodedField<'a> {
    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn class(&self) -> Class {
        self.tag.class()
    }

    pub fn number(&self) -> u32 {
        u32::from(self.tag.number().0)
    }

    pub fn is_constructed(&self) -> bool {
        self.tag.is_constructed()
    }

    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    pub fn content(&self) -> &'a [u8] {
        self.content
    }

    pub fn children(&self) -> &[DecodedField<'a>] {
        &self.children
    }

    pub fn is_context(&self, number: u32) -> bool {
        self.class() == Class::ContextSpecific && self.number() == number
    }

    /// The first child carrying context specific tag `[number]`.
    pub fn context(&self, number: u32) -> Option<&DecodedField<'a>> {
        self.children.iter().find(|child| child.is_context(number))
    }

    /// Kerberos tags every field explicitly, so `[number]` wraps exactly one
    /// inner field. Returns that inner field.
    pub fn explicit(&self, number: u32) -> Option<&DecodedField<'a>> {
        let wrapper = self.context(number)?;
        match wrapper.children.as_slice() {
            [inner] => Some(inner),
            _ => None,
        }
    }

    /// Decode this field, header included, as a `der` type.
    pub fn decode_as<T: Decode<'a>>(&self) -> Option<T> {
        T::from_der(self.raw).ok()
    }

    /// Render an OBJECT IDENTIFIER in dotted form. Non-minimal arcs are
    /// refused, as DER requires.
    pub fn as_oid(&self) -> Option<String> {
        self.decode_as::<ObjectIdentifier>()
            .map(|oid| oid.to_string())
    }
}
