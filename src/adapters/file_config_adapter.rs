//! INI file configuration adapter.

use crate::domain::error::SentiError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SentiError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| SentiError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, SentiError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SentiError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }

    /// Absent or blank keys give `default`; anything else must parse.
    fn parse_or<T>(
        &self,
        section: &str,
        key: &str,
        default: T,
        kind: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T, SentiError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(raw) => parse(raw.trim()).ok_or_else(|| {
                SentiError::invalid(section, key, format!("'{}' is not {kind}", raw.trim()))
            }),
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key).filter(|v| !v.trim().is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, SentiError> {
        self.parse_or(section, key, default, "an integer", |v| v.parse().ok())
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SentiError> {
        self.parse_or(section, key, default, "a number", |v| v.parse().ok())
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, SentiError> {
        self.parse_or(section, key, default, "a boolean", Self::parse_bool)
    }
}
