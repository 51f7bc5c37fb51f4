use anyhow::{Context, Result};
use mercury236_lib::protocol::{self, AccessLevel, Address, Password};
use mercury236_lib::session::SessionConfig;
use serde::Deserialize;
use std::time::Duration;

/// Connection settings read from the YAML configuration file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MeterConfig {
    #[serde(default = "MeterConfig::default_device")]
    pub device: String,
    #[serde(default = "MeterConfig::default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default)]
    pub address: Address,
    #[serde(
        default = "MeterConfig::default_channel_timeout",
        with = "humantime_serde"
    )]
    pub channel_timeout: Duration,
    #[serde(
        default = "MeterConfig::default_settle_delay",
        with = "humantime_serde"
    )]
    pub settle_delay: Duration,
    #[serde(default)]
    pub access_level: AccessLevel,
    #[serde(default)]
    pub password: Password,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            device: Self::default_device(),
            baud_rate: Self::default_baud_rate(),
            address: Address::default(),
            channel_timeout: Self::default_channel_timeout(),
            settle_delay: Self::default_settle_delay(),
            access_level: AccessLevel::default(),
            password: Password::default(),
        }
    }
}

impl MeterConfig {
    pub const DEFAULT_CONFIG_FILE: &str = "mercury236.yaml";

    fn default_device() -> String {
        if cfg!(target_os = "windows") {
            String::from("COM1")
        } else {
            String::from("/dev/ttyUSB0")
        }
    }

    fn default_baud_rate() -> u32 {
        mercury236_lib::serialport::DEFAULT_BAUD_RATE
    }

    fn default_channel_timeout() -> Duration {
        protocol::CHANNEL_TIMEOUT
    }

    fn default_settle_delay() -> Duration {
        protocol::SETTLE_DELAY
    }

    pub fn load(config_file_path: &str) -> Result<Self> {
        log::debug!("Loading config file from {config_file_path:?}");
        let config_file = std::fs::File::open(config_file_path)
            .with_context(|| format!("Cannot open config file {config_file_path:?}"))?;
        let config: Self = serde_yaml::from_reader(&config_file)
            .with_context(|| format!("Cannot read config from file: {config_file_path:?}"))?;
        Ok(config)
    }

    /// Loads `path` if given, otherwise the default file when it exists.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if std::path::Path::new(Self::DEFAULT_CONFIG_FILE).exists() => {
                Self::load(Self::DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn session_config(&self, dump_frames: bool) -> SessionConfig {
        SessionConfig {
            address: self.address,
            channel_timeout: self.channel_timeout,
            settle_delay: self.settle_delay,
            access_level: self.access_level,
            password: self.password,
            dump_frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_full_config() {
        let file = write_config(
            "device: /dev/ttyS1\n\
             baud_rate: 4800\n\
             address: 42\n\
             channel_timeout: 3s\n\
             settle_delay: 20ms\n\
             access_level: admin\n\
             password: \"222222\"\n",
        );
        let config = MeterConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.device, "/dev/ttyS1");
        assert_eq!(config.baud_rate, 4800);
        assert_eq!(*config.address, 42);
        assert_eq!(config.channel_timeout, Duration::from_secs(3));
        assert_eq!(config.settle_delay, Duration::from_millis(20));
        assert_eq!(config.access_level, AccessLevel::Admin);
        assert_eq!(config.password.as_bytes(), &[2, 2, 2, 2, 2, 2]);

        let session = config.session_config(true);
        assert_eq!(*session.address, 42);
        assert!(session.dump_frames);
    }

    #[test]
    fn missing_keys_use_defaults() {
        let file = write_config("baud_rate: 19200\n");
        let config = MeterConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(
            config,
            MeterConfig {
                baud_rate: 19200,
                ..Default::default()
            }
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let file = write_config("password: \"12a456\"\n");
        assert!(MeterConfig::load(file.path().to_str().unwrap()).is_err());
        let file = write_config("baudrate: 9600\n");
        assert!(MeterConfig::load(file.path().to_str().unwrap()).is_err());
        assert!(MeterConfig::load("/nonexistent/mercury236.yaml").is_err());
    }
}
