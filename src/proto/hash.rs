use super::request::KrbRequest;
use crate::constants::HASH_NODATA;
use crate::error::KrbError;
use std::fmt;

/// The crackable material of one AS-REQ, in the form john and hashcat expect:
///
/// ```text
/// $krb5$<etype>$<cname>$<realm>$nodata$<hex cipher>
/// ```
///
/// The layout is matched byte for byte by the crackers, so the output must
/// never grow whitespace or change case. `user` and `realm` hold the octets
/// the client sent, which need not be UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsReqHash {
    pub etype: i32,
    pub user: Vec<u8>,
    pub realm: Vec<u8>,
    pub cipher: Vec<u8>,
}

impl AsReqHash {
    /// The exact line to hand to a cracker, names copied verbatim.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            32 + self.user.len() + self.realm.len() + self.cipher.len() * 2,
        );
        out.extend_from_slice(format!("$krb5${}$", self.etype).as_bytes());
        out.extend_from_slice(&self.user);
        out.push(b'$');
        out.extend_from_slice(&self.realm);
        out.extend_from_slice(format!("${}$", HASH_NODATA).as_bytes());
        out.extend_from_slice(hex::encode(&self.cipher).as_bytes());
        out
    }
}

/// Lossy for names that are not UTF-8. Use [`AsReqHash::to_bytes`] when the
/// output is fed to a cracker.
impl fmt::Display for AsReqHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}

impl KrbRequest {
    /// Errors with `NoPreAuthData` when there is no PA-ENC-TIMESTAMP to
    /// report. A partial hash is never returned.
    pub fn hash(&self) -> Result<AsReqHash, KrbError> {
        let enc_timestamp = self.enc_timestamp()?.ok_or(KrbError::NoPreAuthData)?;

        Ok(AsReqHash {
            etype: enc_timestamp.etype,
            user: self.client_name.concatenated_bytes(),
            realm: self.realm.as_bytes().to_vec(),
            cipher: enc_timestamp.cipher,
        })
    }

    /// Convenience over [`KrbRequest::hash`]. Non UTF-8 name octets are
    /// replaced, see [`AsReqHash::to_bytes`] for the exact form.
    pub fn to_hash_string(&self) -> Result<String, KrbError> {
        self.hash().map(|hash| hash.to_string())
    }
}
