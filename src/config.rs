//! Device path configuration.
//!
//! Each bus index maps to a tty device node through a table that defaults to
//! the cape convention (`/dev/ttyO0`..`/dev/ttyO5`) but can be overridden for
//! other boards. Overrides layer in the usual order: built-in defaults, then
//! an optional `uart.toml` in the working directory, then `UART_`-prefixed
//! environment variables.
//!
//! ```toml
//! # uart.toml
//! device_paths = [
//!     "/dev/ttyS0", "/dev/ttyS1", "/dev/ttyS2",
//!     "/dev/ttyS3", "/dev/ttyS4", "/dev/ttyS5",
//! ]
//! ```

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{UartError, UartResult};
use crate::registry::NUM_BUSES;

/// Config file name looked up in the working directory by [`BusConfig::load`].
pub const CONFIG_FILE: &str = "uart.toml";

/// Environment variable prefix for overrides (e.g. `UART_DEVICE_PATHS`).
pub const ENV_PREFIX: &str = "UART_";

/// Bus-index-to-device-path table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Device node backing each bus index, `device_paths[bus]`. Must list
    /// exactly [`NUM_BUSES`] entries.
    pub device_paths: Vec<PathBuf>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            device_paths: (0..NUM_BUSES)
                .map(|bus| PathBuf::from(format!("/dev/ttyO{bus}")))
                .collect(),
        }
    }
}

impl BusConfig {
    /// Loads the path table from defaults, [`CONFIG_FILE`] and the
    /// environment, later layers overriding earlier ones.
    pub fn load() -> UartResult<Self> {
        let config: BusConfig = Figment::from(Serialized::defaults(BusConfig::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()?;
        config.validate()
    }

    /// Loads the path table from an explicit TOML file layered over the
    /// defaults.
    pub fn load_from(path: &Path) -> UartResult<Self> {
        let config: BusConfig = Figment::from(Serialized::defaults(BusConfig::default()))
            .merge(Toml::file(path))
            .extract()?;
        config.validate()
    }

    fn validate(self) -> UartResult<Self> {
        if self.device_paths.len() != NUM_BUSES {
            return Err(UartError::Config(figment::Error::from(format!(
                "device_paths must list exactly {NUM_BUSES} entries, got {}",
                self.device_paths.len()
            ))));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_table_covers_every_bus() {
        let config = BusConfig::default();
        assert_eq!(config.device_paths.len(), NUM_BUSES);
        assert_eq!(config.device_paths[0], PathBuf::from("/dev/ttyO0"));
        assert_eq!(config.device_paths[5], PathBuf::from("/dev/ttyO5"));
    }

    #[test]
    fn test_load_from_overrides_the_table() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "device_paths = [\"/dev/ttyS0\", \"/dev/ttyS1\", \"/dev/ttyS2\", \
             \"/dev/ttyS3\", \"/dev/ttyS4\", \"/dev/ttyS5\"]"
        )
        .expect("write config");

        let config = BusConfig::load_from(file.path()).expect("load");
        assert_eq!(config.device_paths[0], PathBuf::from("/dev/ttyS0"));
        assert_eq!(config.device_paths[5], PathBuf::from("/dev/ttyS5"));
    }

    #[test]
    fn test_short_table_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "device_paths = [\"/dev/ttyS0\"]").expect("write config");

        let err = BusConfig::load_from(file.path()).expect_err("short table");
        assert!(matches!(err, UartError::Config(_)));
        assert!(err.to_string().contains("exactly 6"));
    }
}
