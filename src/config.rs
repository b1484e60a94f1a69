//! Runtime settings read from the environment (after `.env` is loaded).

use std::path::PathBuf;

const DEFAULT_LOG_FILE: &str = "logs/equipment_monitor.log";
const DEFAULT_REPORT_DIR: &str = "reports";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// `LOG_FILE_PATH`: JSON log file, rotated daily.
    pub log_file: PathBuf,
    /// `REPORT_DIR`: where reports go when no explicit path is given.
    pub report_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let path = |key: &str, default: PathBuf| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default)
        };

        Self {
            log_file: path("LOG_FILE_PATH", defaults.log_file),
            report_dir: path("REPORT_DIR", defaults.report_dir),
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        match self.log_file.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn log_file_name(&self) -> String {
        self.log_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("equipment_monitor.log")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[]));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.log_dir(), PathBuf::from("logs"));
        assert_eq!(settings.log_file_name(), "equipment_monitor.log");
    }

    #[test]
    fn test_overrides_and_blank_values() {
        let settings = Settings::from_lookup(lookup(&[
            ("LOG_FILE_PATH", "monitor.log"),
            ("REPORT_DIR", "  "),
        ]));
        assert_eq!(settings.log_dir(), PathBuf::from("."));
        assert_eq!(settings.log_file_name(), "monitor.log");
        assert_eq!(settings.report_dir, PathBuf::from(DEFAULT_REPORT_DIR));
    }
}
