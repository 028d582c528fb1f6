#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KrbError {
    // =========================================================================================
    // IMPORTANT: Don't add variables to variants in this enum - captured traffic is attacker
    // controlled, and anything we carry here ends up in logs and user facing output.
    //
    // The one exception is SchemaViolation, which carries a static name of the field that was
    // expected. That is a property of the schema, not of the input.
    //
    // If you want to debug the error, then use the error! or debug! macro at the error raise
    // site to report relevant information.
    // =========================================================================================
    /// The TLV structure itself is inconsistent: length overrun, bad length-of-length,
    /// truncated content, or the input exceeds the decode limits.
    MalformedEncoding,
    /// The bytes are a valid TLV structure, but not an AS-REQ.
    WrongMessageType,
    /// A required AS-REQ field is missing or has the wrong shape.
    SchemaViolation(&'static str),
    /// The request carries no PA-ENC-TIMESTAMP material to format.
    NoPreAuthData,

    ConfigError,
    PcapError,
    IoError,
}

impl std::fmt::Display for KrbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KrbError::MalformedEncoding => f.write_str("malformed encoding"),
            KrbError::WrongMessageType => f.write_str("not an AS-REQ"),
            KrbError::SchemaViolation(field) => write!(f, "schema violation at field {field}"),
            KrbError::NoPreAuthData => f.write_str("no encrypted timestamp pre-auth data"),
            KrbError::ConfigError => f.write_str("invalid configuration"),
            KrbError::PcapError => f.write_str("unreadable capture file"),
            KrbError::IoError => f.write_str("io error"),
        }
    }
}

impl std::error::Error for KrbError {}

impl From<der::Error> for KrbError {
    fn from(value: der::Error) -> Self {
        tracing::trace!(?value, "der decode failure");
        KrbError::MalformedEncoding
    }
}

impl From<std::io::Error> for KrbError {
    fn from(value: std::io::Error) -> Self {
        tracing::error!(?value, "io failure");
        KrbError::IoError
    }
}

impl From<toml::de::Error> for KrbError {
    fn from(value: toml::de::Error) -> Self {
        tracing::error!(?value, "toml parse failure");
        KrbError::ConfigError
    }
}

impl<I: std::fmt::Debug> From<pcap_parser::PcapError<I>> for KrbError {
    fn from(value: pcap_parser::PcapError<I>) -> Self {
        tracing::error!(?value, "pcap read failure");
        KrbError::PcapError
    }
}
