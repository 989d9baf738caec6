//! INI file configuration adapter.
//!
//! Optional strategy thresholds use the literal `off` as the disabled
//! sentinel, surfaced to the domain as `None` through the `get_opt_*`
//! methods — never a magic number.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }

    fn is_off(value: &str) -> bool {
        value.trim().eq_ignore_ascii_case("off")
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }

    fn get_opt_double(&self, section: &str, key: &str, default: Option<f64>) -> Option<f64> {
        match self.config.get(section, key) {
            None => default,
            Some(raw) if Self::is_off(&raw) => None,
            Some(raw) => raw.trim().parse().ok().or(default),
        }
    }

    fn get_opt_int(&self, section: &str, key: &str, default: Option<i64>) -> Option<i64> {
        match self.config.get(section, key) {
            None => default,
            Some(raw) if Self::is_off(&raw) => None,
            Some(raw) => raw.trim().parse().ok().or(default),
        }
    }
}
