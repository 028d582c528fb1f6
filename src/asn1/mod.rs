pub mod constants;
pub mod encrypted_data;
pub mod kerberos_flags;
pub mod kerberos_string;
pub mod pa_data;
pub mod principal_name;
pub(crate) mod schema;
pub mod tlv;

pub use der::asn1::GeneralizedTime;
pub use der::DateTime;
