//! INI file configuration adapter.

use crate::domain::error::SignalError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SignalError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| SignalError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, SignalError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SignalError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
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
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_strategy_sections() {
        let content = r#"
[base]
assets = BTCUSDT,ETHUSDT
frequency = 15m
window = 96

[position]
variant = long_only
long_ratio = 0.8

[sltp]
stop_loss_pct = 0.005
execute_levels = yes
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("base", "assets"),
            Some("BTCUSDT,ETHUSDT".to_string())
        );
        assert_eq!(adapter.get_int("base", "window", 0), 96);
        assert_eq!(adapter.get_double("position", "long_ratio", 0.0), 0.8);
        assert_eq!(adapter.get_double("sltp", "stop_loss_pct", 0.0), 0.005);
        assert!(adapter.get_bool("sltp", "execute_levels", false));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[base]\nwindow = 180\n").unwrap();
        assert_eq!(adapter.get_string("base", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_trimmed_treats_blank_as_absent() {
        let adapter =
            FileConfigAdapter::from_string("[base]\nassets =\nfrequency =  1h \n").unwrap();
        assert_eq!(adapter.get_trimmed("base", "assets"), None);
        assert_eq!(adapter.get_trimmed("base", "frequency"), Some("1h".to_string()));
    }

    #[test]
    fn numeric_getters_fall_back_to_default() {
        let adapter =
            FileConfigAdapter::from_string("[base]\nwindow = abc\nratio = x\n").unwrap();
        assert_eq!(adapter.get_int("base", "window", 42), 42);
        assert_eq!(adapter.get_int("base", "missing", 7), 7);
        assert_eq!(adapter.get_double("base", "ratio", 0.5), 0.5);
        assert_eq!(adapter.get_double("base", "missing", 99.9), 99.9);
    }

    #[test]
    fn get_bool_values() {
        let adapter = FileConfigAdapter::from_string(
            "[sltp]\na = true\nb = no\nc = 1\nd = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("sltp", "a", false));
        assert!(!adapter.get_bool("sltp", "b", true));
        assert!(adapter.get_bool("sltp", "c", false));
        assert!(adapter.get_bool("sltp", "d", true));
        assert!(!adapter.get_bool("sltp", "missing", false));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[selection]\nlong_max = 3\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_int("selection", "long_max", 0), 3);
    }

    #[test]
    fn from_file_reports_missing_file() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/strategy.ini").unwrap_err();
        assert!(
            matches!(err, SignalError::ConfigParse { file, .. } if file.contains("strategy.ini"))
        );
    }
}
