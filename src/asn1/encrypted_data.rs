use super::schema;
use super::tlv::{self, DecodedField};
use crate::error::KrbError;

/// ```text
/// EncryptedData   ::= SEQUENCE {
///         etype   [0] Int32 -- EncryptionType --,
///         kvno    [1] UInt32 OPTIONAL,
///         cipher  [2] OCTET STRING -- ciphertext
/// }
/// ````
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedData {
    pub etype: i32,
    pub kvno: Option<u32>,
    pub cipher: Vec<u8>,
}

impl EncryptedData {
    pub(crate) fn from_field(field: &DecodedField<'_>) -> Result<Self, KrbError> {
        schema::sequence(field, "EncryptedData")?;

        let etype = schema::int32(schema::required(field, 0, "etype")?, "etype")?;

        // Clients are not consistent about kvno, and we have no use for it
        // beyond reporting, so a bad one is not worth losing the cipher over.
        let kvno = field.explicit(1).and_then(|kvno| kvno.decode_as::<u32>());

        let cipher = schema::octet_string(schema::required(field, 2, "cipher")?, "cipher")?;

        Ok(EncryptedData {
            etype,
            kvno,
            cipher: cipher.to_vec(),
        })
    }

    /// Decode a standalone EncryptedData, such as the value of a
    /// PA-ENC-TIMESTAMP entry. Anything that isn't one is a schema violation,
    /// as the caller already knows what this should be.
    pub fn from_der(bytes: &[u8]) -> Result<Self, KrbError> {
        let field = tlv::decode(bytes).map_err(|err| {
            tracing::debug!(?err, "EncryptedData is not valid TLV");
            KrbError::SchemaViolation("EncryptedData")
        })?;
        Self::from_field(&field)
    }
}
