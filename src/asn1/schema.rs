//! Field lookup helpers shared by the Kerberos structures.
//!
//! Every failure here is a [`KrbError::SchemaViolation`] naming the field the
//! caller expected: the bytes were valid TLV, they just aren't the shape we
//! need.

use super::tlv::DecodedField;
use crate::error::KrbError;
use der::Tag;

/// The inner field of the explicitly tagged `[number]`, which must be present.
pub(crate) fn required<'f, 'a>(
    seq: &'f DecodedField<'a>,
    number: u32,
    name: &'static str,
) -> Result<&'f DecodedField<'a>, KrbError> {
    seq.explicit(number).ok_or(KrbError::SchemaViolation(name))
}

/// As [`required`], but absence is fine. A tag that is present with the wrong
/// shape is still a violation.
pub(crate) fn optional<'f, 'a>(
    seq: &'f DecodedField<'a>,
    number: u32,
    name: &'static str,
) -> Result<Option<&'f DecodedField<'a>>, KrbError> {
    match seq.context(number) {
        None => Ok(None),
        Some(_) => required(seq, number, name).map(Some),
    }
}

pub(crate) fn sequence<'f, 'a>(
    field: &'f DecodedField<'a>,
    name: &'static str,
) -> Result<&'f [DecodedField<'a>], KrbError> {
    if field.tag() == Tag::Sequence {
        Ok(field.children())
    } else {
        Err(KrbError::SchemaViolation(name))
    }
}

pub(crate) fn int32(field: &DecodedField<'_>, name: &'static str) -> Result<i32, KrbError> {
    field
        .decode_as::<i32>()
        .ok_or(KrbError::SchemaViolation(name))
}

pub(crate) fn octet_string<'a>(
    field: &DecodedField<'a>,
    name: &'static str,
) -> Result<&'a [u8], KrbError> {
    if field.tag() == Tag::OctetString {
        Ok(field.content())
    } else {
        Err(KrbError::SchemaViolation(name))
    }
}
