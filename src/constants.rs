/// The well known Kerberos KDC port, for both UDP and TCP.
pub const DEFAULT_KERBEROS_PORT: u16 = 88;

/// Deepest nesting of constructed fields we will decode. An AS-REQ reaches
/// around nine levels, so this leaves headroom for odd but honest clients.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Largest message we will look at. Nothing larger fits in a UDP datagram.
pub const DEFAULT_MAX_SIZE: usize = 65535;

/// The only protocol version number defined for Kerberos.
pub const KERBEROS_PVNO: i32 = 5;

/// Placeholder for the checksum field in the `$krb5$` hash format. The
/// encrypted timestamp variant carries no separate checksum, and crackers
/// match on this exact token.
pub const HASH_NODATA: &str = "nodata";
