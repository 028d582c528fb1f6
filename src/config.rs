use crate::asn1::tlv::DecodeLimits;
use crate::constants::{DEFAULT_KERBEROS_PORT, DEFAULT_MAX_DEPTH, DEFAULT_MAX_SIZE};
use crate::error::KrbError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnifferConfig {
    pub kerberos_port: u16,
    pub max_depth: usize,
    pub max_size: usize,
}

impl Default for SnifferConfig {
    fn default() -> Self {
        SnifferConfig {
            kerberos_port: DEFAULT_KERBEROS_PORT,
            max_depth: DEFAULT_MAX_DEPTH,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl SnifferConfig {
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self, KrbError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: SnifferConfig = toml::from_str(&contents)?;

        if config.max_depth == 0 || config.max_size == 0 {
            debug!(?config, "decode limits must be non zero");
            return Err(KrbError::ConfigError);
        }

        debug!(?config, path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_depth: self.max_depth,
            max_size: self.max_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SnifferConfig;
    use crate::error::KrbError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(contents.as_bytes())
            .expect("Failed to write config");
        file
    }

    #[test]
    fn config_defaults() {
        let config = SnifferConfig::default();
        assert_eq!(config.kerberos_port, 88);
        assert_eq!(config.max_depth, 16);
        assert_eq!(config.max_size, 65535);

        let file = write_config("");
        assert_eq!(SnifferConfig::parse(file.path()), Ok(config));
    }

    #[test]
    fn config_partial_override() {
        let file = write_config("kerberos_port = 8888\n");
        let config = SnifferConfig::parse(file.path()).expect("Failed to parse config");
        assert_eq!(config.kerberos_port, 8888);
        assert_eq!(config.max_depth, 16);

        let limits = config.limits();
        assert_eq!(limits.max_depth, 16);
        assert_eq!(limits.max_size, 65535);
    }

    #[test]
    fn config_rejects_bad_input() {
        let file = write_config("kerberos_port = 88\nrealm = \"EXAMPLE.COM\"\n");
        assert_eq!(SnifferConfig::parse(file.path()), Err(KrbError::ConfigError));

        let file = write_config("kerberos_port = 70000\n");
        assert_eq!(SnifferConfig::parse(file.path()), Err(KrbError::ConfigError));

        let file = write_config("max_depth = 0\n");
        assert_eq!(SnifferConfig::parse(file.path()), Err(KrbError::ConfigError));
    }

    #[test]
    fn config_missing_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        assert_eq!(
            SnifferConfig::parse(dir.path().join("krbsniff.toml")),
            Err(KrbError::IoError)
        );
    }
}
