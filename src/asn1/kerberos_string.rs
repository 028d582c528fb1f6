use super::tlv::DecodedField;
use crate::error::KrbError;
use der::Tag;
use std::fmt;

/// ```text
/// KerberosString  ::= GeneralString (IA5String)
/// ````
///
/// Held as the octets the client sent. No charset validation is done, clients
/// in the wild put all sorts in here and we report it back verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KerberosString(Vec<u8>);

impl KerberosString {
    pub(crate) fn from_field(
        field: &DecodedField<'_>,
        name: &'static str,
    ) -> Result<Self, KrbError> {
        if field.tag() != Tag::GeneralString {
            return Err(KrbError::SchemaViolation(name));
        }
        Ok(KerberosString(field.content().to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for KerberosString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for KerberosString {
    fn from(value: &str) -> Self {
        KerberosString(value.as_bytes().to_vec())
    }
}

impl From<&[u8]> for KerberosString {
    fn from(value: &[u8]) -> Self {
        KerberosString(value.to_vec())
    }
}

impl From<&KerberosString> for String {
    fn from(value: &KerberosString) -> Self {
        value.to_string()
    }
}
