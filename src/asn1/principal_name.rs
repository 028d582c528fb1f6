use super::constants::PrincipalNameType;
use super::kerberos_string::KerberosString;
use super::schema;
use super::tlv::DecodedField;
use crate::error::KrbError;
use std::fmt;

/// ```text
///   PrincipalName   ::= SEQUENCE {
///           name-type       [0] Int32,
///           name-string     [1] SEQUENCE OF KerberosString
///   }
/// ````
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalName {
    // This field specifies the type of name that follows. The name-type
    // SHOULD be treated as a hint.
    pub name_type: i32,
    // Most PrincipalNames will have only a few components (typically one or
    // two). We never produce one with zero.
    pub name_string: Vec<KerberosString>,
}

impl PrincipalName {
    pub(crate) fn from_field(
        field: &DecodedField<'_>,
        name: &'static str,
    ) -> Result<Self, KrbError> {
        schema::sequence(field, name)?;

        let name_type = schema::int32(schema::required(field, 0, name)?, name)?;

        let name_string = schema::sequence(schema::required(field, 1, name)?, name)?
            .iter()
            .map(|component| KerberosString::from_field(component, name))
            .collect::<Result<Vec<_>, _>>()?;

        if name_string.is_empty() {
            return Err(KrbError::SchemaViolation(name));
        }

        Ok(PrincipalName {
            name_type,
            name_string,
        })
    }

    pub fn kind(&self) -> Option<PrincipalNameType> {
        PrincipalNameType::try_from(self.name_type).ok()
    }

    /// All components run together with no separator. For the usual single
    /// component user principal this is just the user name.
    pub fn concatenated(&self) -> String {
        self.name_string.iter().map(String::from).collect()
    }

    /// As [`PrincipalName::concatenated`], keeping the octets as sent.
    pub fn concatenated_bytes(&self) -> Vec<u8> {
        self.name_string
            .iter()
            .flat_map(|component| component.as_bytes().iter().copied())
            .collect()
    }
}

impl fmt::Display for PrincipalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v: Vec<String> = self.name_string.iter().map(String::from).collect();
        f.write_str(&v.join("/"))
    }
}
