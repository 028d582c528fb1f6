use crate::asn1::{
    constants::{EncryptionType, KrbMessageType},
    encrypted_data::EncryptedData,
    kerberos_flags::KerberosFlags,
    kerberos_string::KerberosString,
    pa_data::PreauthEntries,
    principal_name::PrincipalName,
    schema,
    tlv::{self, DecodeLimits, DecodedField},
    GeneralizedTime,
};
use crate::constants::KERBEROS_PVNO;
use crate::error::KrbError;
use der::{Tag, TagNumber};
use std::time::SystemTime;
use tracing::{debug, instrument, trace};

/// A decoded AS-REQ, as seen on the wire.
///
/// Only `client_name`, `realm` and a well formed `preauth` are required for a
/// request to decode. The rest are filled in when the client sent something
/// sensible, and left empty otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KrbRequest {
    /// Offered encryption types, in the client's preference order.
    pub etypes: Vec<i32>,
    pub client_name: PrincipalName,
    pub realm: KerberosString,
    pub preauth: PreauthEntries,

    pub service_name: Option<PrincipalName>,
    pub kdc_options: Option<KerberosFlags>,
    pub until: Option<SystemTime>,
    pub nonce: Option<u32>,
}

impl KrbRequest {
    pub fn from_der(bytes: &[u8]) -> Result<Self, KrbError> {
        Self::from_der_with_limits(bytes, &DecodeLimits::default())
    }

    pub fn from_der_with_limits(bytes: &[u8], limits: &DecodeLimits) -> Result<Self, KrbError> {
        let root = tlv::decode_with_limits(bytes, limits)?;
        Self::from_field(&root)
    }

    /// ```text
    /// AS-REQ          ::= [APPLICATION 10] KDC-REQ
    ///
    /// KDC-REQ         ::= SEQUENCE {
    ///         -- NOTE: first tag is [1], not [0]
    ///         pvno            [1] INTEGER (5) ,
    ///         msg-type        [2] INTEGER (10 -- AS -- | 12 -- TGS --),
    ///         padata          [3] SEQUENCE OF PA-DATA OPTIONAL
    ///                             -- NOTE: not empty --,
    ///         req-body        [4] KDC-REQ-BODY
    /// }
    /// ```
    #[instrument(level = "trace", skip_all)]
    pub fn from_field(root: &DecodedField<'_>) -> Result<Self, KrbError> {
        match root.tag() {
            Tag::Application {
                constructed: true,
                number: TagNumber(10),
            } => {}
            tag => {
                trace!(?tag, "not an AS-REQ");
                return Err(KrbError::WrongMessageType);
            }
        }

        let kdc_req = match root.children() {
            [kdc_req] => kdc_req,
            _ => return Err(KrbError::SchemaViolation("KDC-REQ")),
        };
        schema::sequence(kdc_req, "KDC-REQ")?;

        let pvno = schema::int32(schema::required(kdc_req, 1, "pvno")?, "pvno")?;
        if pvno != KERBEROS_PVNO {
            debug!(pvno, "unsupported protocol version");
            return Err(KrbError::SchemaViolation("pvno"));
        }

        // The application tag already claims AS-REQ, but msg-type is what the
        // KDC acts on.
        let msg_type = schema::int32(schema::required(kdc_req, 2, "msg-type")?, "msg-type")?;
        if msg_type != i32::from(KrbMessageType::KrbAsReq) {
            debug!(msg_type = ?KrbMessageType::try_from(msg_type), "not an AS-REQ");
            return Err(KrbError::WrongMessageType);
        }

        let preauth = schema::optional(kdc_req, 3, "padata")?
            .map(PreauthEntries::from_field)
            .transpose()?
            .unwrap_or_default();
        trace!(?preauth);

        let req_body = schema::required(kdc_req, 4, "req-body")?;
        Self::from_req_body(req_body, preauth)
    }

    /// ```text
    /// KDC-REQ-BODY    ::= SEQUENCE {
    ///         kdc-options             [0] KDCOptions,
    ///         cname                   [1] PrincipalName OPTIONAL
    ///                                     -- Used only in AS-REQ --,
    ///         realm                   [2] Realm
    ///                                     -- Server's realm
    ///                                     -- Also client's in AS-REQ --,
    ///         sname                   [3] PrincipalName OPTIONAL,
    ///         from                    [4] KerberosTime OPTIONAL,
    ///         till                    [5] KerberosTime,
    ///         rtime                   [6] KerberosTime OPTIONAL,
    ///         nonce                   [7] UInt32,
    ///         etype                   [8] SEQUENCE OF Int32 -- EncryptionType
    ///                                     -- in preference order --,
    ///         ...
    /// }
    /// ```
    fn from_req_body(req_body: &DecodedField<'_>, preauth: PreauthEntries) -> Result<Self, KrbError> {
        schema::sequence(req_body, "req-body")?;

        let client_name =
            PrincipalName::from_field(schema::required(req_body, 1, "cname")?, "cname")?;
        let realm = KerberosString::from_field(schema::required(req_body, 2, "realm")?, "realm")?;

        let etypes = match schema::optional(req_body, 8, "etype")? {
            Some(etype) => schema::sequence(etype, "etype")?
                .iter()
                .map(|etype| schema::int32(etype, "etype"))
                .collect::<Result<Vec<_>, _>>()?,
            None => {
                debug!(%client_name, %realm, "AS-REQ without an etype list");
                Vec::new()
            }
        };
        trace!(etypes = ?etypes
            .iter()
            .map(|etype| EncryptionType::try_from(*etype).map_err(|_| *etype))
            .collect::<Vec<_>>());

        // Nothing below is needed to build a hash, so a client that gets these
        // wrong still has its request recorded.
        let service_name = req_body
            .explicit(3)
            .and_then(|sname| PrincipalName::from_field(sname, "sname").ok());
        let kdc_options = req_body.explicit(0).and_then(KerberosFlags::from_field);
        let until = req_body
            .explicit(5)
            .and_then(|till| till.decode_as::<GeneralizedTime>())
            .map(|till| till.to_system_time());
        // UInt32 per RFC 4120, but heimdal happily sends negative values.
        // Anything outside both ranges is dropped.
        let nonce = req_body
            .explicit(7)
            .and_then(|nonce| nonce.decode_as::<i64>())
            .and_then(|nonce| {
                u32::try_from(nonce)
                    .or_else(|_| i32::try_from(nonce).map(|nonce| nonce as u32))
                    .ok()
            });

        Ok(KrbRequest {
            etypes,
            client_name,
            realm,
            preauth,
            service_name,
            kdc_options,
            until,
            nonce,
        })
    }

    /// The encryption type and cipher of the first PA-ENC-TIMESTAMP entry.
    /// Decoded on demand, nothing is cached.
    pub fn enc_timestamp(&self) -> Result<Option<EncryptedData>, KrbError> {
        self.preauth.enc_timestamp()
    }
}
