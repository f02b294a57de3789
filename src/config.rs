use crate::error::{Result, VdkError};
use crate::format::ts::{DemuxerConfig, MuxerConfig, PID_MAX};
use lazy_static::lazy_static;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::sync::RwLock;

lazy_static! {
    static ref CONFIG: RwLock<Config> = RwLock::new(Config::new());
}

const CONFIG_PATHS: [&str; 2] = ["./config.toml", "./vdk_mpegts.toml"];

const ENV_KEYS: [(&str, &str); 5] = [
    ("VDK_TS_CHECK_CRC", "check_crc"),
    ("VDK_TS_CONTINUITY_CHECK", "continuity_check"),
    ("VDK_TS_PARSE_PICTURE_TYPE", "parse_picture_type"),
    ("VDK_TS_PMT_PID", "pmt_pid"),
    ("VDK_TS_BITRATE", "nominal_bitrate"),
];

/// Process-wide defaults for demuxers and muxers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub check_crc: bool,
    pub continuity_check: bool,
    pub parse_picture_type: bool,
    pub pmt_pid: u16,
    pub nominal_bitrate: u64,
}

impl Default for Config {
    fn default() -> Self {
        let demux = DemuxerConfig::default();
        let mux = MuxerConfig::default();
        Self {
            check_crc: demux.check_crc,
            continuity_check: demux.continuity_check,
            parse_picture_type: demux.parse_picture_type,
            pmt_pid: mux.pmt_pid,
            nominal_bitrate: mux.nominal_bitrate,
        }
    }
}

impl Config {
    /// Loads the first config file found, then applies `VDK_TS_*`
    /// environment overrides.
    fn new() -> Self {
        let mut config = CONFIG_PATHS
            .iter()
            .filter(|path| Path::new(path).exists())
            .find_map(|path| match Config::load_from(path) {
                Ok(config) => Some(config),
                Err(e) => {
                    log::warn!("{}: {}", path, e);
                    None
                }
            })
            .unwrap_or_default();

        for (var, key) in ENV_KEYS {
            if let Ok(value) = env::var(var) {
                if let Err(e) = config.set(key, &value) {
                    log::warn!("{}: {}", var, e);
                }
            }
        }

        config
    }

    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Sets one option by name from its string form. The configuration is
    /// left unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.clone();
        match key {
            "check_crc" => next.check_crc = parse_value(key, value)?,
            "continuity_check" => next.continuity_check = parse_value(key, value)?,
            "parse_picture_type" => next.parse_picture_type = parse_value(key, value)?,
            "pmt_pid" => next.pmt_pid = parse_value(key, value)?,
            "nominal_bitrate" => next.nominal_bitrate = parse_value(key, value)?,
            _ => return Err(VdkError::Config(format!("unknown key {}", key))),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.pmt_pid == 0 || self.pmt_pid > PID_MAX {
            return Err(VdkError::Config(format!(
                "pmt_pid {} out of range",
                self.pmt_pid
            )));
        }
        if self.nominal_bitrate == 0 {
            return Err(VdkError::Config("nominal_bitrate must be positive".into()));
        }
        Ok(())
    }

    pub fn demuxer_config(&self) -> DemuxerConfig {
        DemuxerConfig {
            check_crc: self.check_crc,
            continuity_check: self.continuity_check,
            parse_picture_type: self.parse_picture_type,
        }
    }

    pub fn muxer_config(&self) -> MuxerConfig {
        MuxerConfig {
            pmt_pid: self.pmt_pid,
            nominal_bitrate: self.nominal_bitrate,
            ..MuxerConfig::default()
        }
    }

    pub fn reload() {
        let new_config = Config::new();
        if let Ok(mut config) = CONFIG.write() {
            *config = new_config;
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| VdkError::Config(format!("{}: invalid value {:?}", key, value)))
}

/// Returns a snapshot of the global configuration
pub fn current() -> Config {
    match CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Demuxer settings from the global configuration
pub fn demuxer_config() -> DemuxerConfig {
    current().demuxer_config()
}

/// Muxer settings from the global configuration
pub fn muxer_config() -> MuxerConfig {
    current().muxer_config()
}

pub(crate) const TEMPLATE: &str = r#"# vdk-mpegts configuration
# Every key may also be set through its VDK_TS_* environment variable.

# Verify PAT/PMT CRC_32 (VDK_TS_CHECK_CRC)
check_crc = false

# Warn on continuity counter gaps (VDK_TS_CONTINUITY_CHECK)
continuity_check = true

# Decode H.264 slice types of non-IDR pictures (VDK_TS_PARSE_PICTURE_TYPE)
parse_picture_type = true

# PID of the PMT written by the muxer (VDK_TS_PMT_PID)
pmt_pid = 4095

# Bits per second assumed for extrapolated PCRs (VDK_TS_BITRATE)
nominal_bitrate = 4000000
"#;

/// Creates a default config template file if it doesn't exist
pub fn create_default_config_template<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    if !path.as_ref().exists() {
        std::fs::write(path, TEMPLATE)?;
    }
    Ok(())
}
