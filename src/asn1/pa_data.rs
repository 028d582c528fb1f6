use super::constants::PaDataType;
use super::encrypted_data::EncryptedData;
use super::schema;
use super::tlv::DecodedField;
use crate::error::KrbError;
use tracing::trace;

/// ```text
/// PA-DATA         ::= SEQUENCE {
///         -- NOTE: first tag is [1], not [0]
///         padata-type     [1] Int32,
///         padata-value    [2] OCTET STRING -- might be encoded AP-REQ
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaData {
    pub padata_type: i32,
    pub padata_value: Vec<u8>,
}

impl PaData {
    pub(crate) fn from_field(field: &DecodedField<'_>) -> Result<Self, KrbError> {
        schema::sequence(field, "padata")?;
        let padata_type = schema::int32(schema::required(field, 1, "padata-type")?, "padata-type")?;
        let padata_value = schema::octet_string(
            schema::required(field, 2, "padata-value")?,
            "padata-value",
        )?;

        Ok(PaData {
            padata_type,
            padata_value: padata_value.to_vec(),
        })
    }

    pub fn kind(&self) -> Option<PaDataType> {
        PaDataType::try_from(self.padata_type).ok()
    }
}

/// The pre-authentication entries of a request, in the order they were sent.
/// Duplicates are kept. Lookups by type return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreauthEntries(Vec<PaData>);

impl PreauthEntries {
    /// ```text
    /// padata          [3] SEQUENCE OF PA-DATA OPTIONAL
    /// ```
    pub(crate) fn from_field(field: &DecodedField<'_>) -> Result<Self, KrbError> {
        schema::sequence(field, "padata")?
            .iter()
            .map(PaData::from_field)
            .collect::<Result<Vec<_>, _>>()
            .map(PreauthEntries)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaData> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self, kind: PaDataType) -> Option<&PaData> {
        let padata_type = i32::from(kind);
        self.0.iter().find(|pa| pa.padata_type == padata_type)
    }

    /// The EncryptedData carried by the first PA-ENC-TIMESTAMP entry.
    ///
    /// No such entry is `Ok(None)`: clients routinely probe without
    /// pre-authentication to learn whether the KDC demands it. An entry whose
    /// value is not an EncryptedData is a schema violation.
    pub fn enc_timestamp(&self) -> Result<Option<EncryptedData>, KrbError> {
        let Some(pa) = self.first(PaDataType::PaEncTimestamp) else {
            trace!(entries = self.0.len(), "no PA-ENC-TIMESTAMP entry");
            return Ok(None);
        };

        EncryptedData::from_der(&pa.padata_value).map(Some)
    }
}

impl From<Vec<PaData>> for PreauthEntries {
    fn from(value: Vec<PaData>) -> Self {
        PreauthEntries(value)
    }
}
