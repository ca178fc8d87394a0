//! Runtime settings read from the environment.

use std::path::{Path, PathBuf};

/// Default artifact location relative to `HEMASCREEN_HOME`.
pub const DEFAULT_MODEL_PATH: &str = "models/thalassemia_model.json";

/// Default test-set location relative to `HEMASCREEN_HOME`.
pub const DEFAULT_TEST_DATA_PATH: &str = "data/thalassemia_test.csv";

pub const DEFAULT_LOG_FILE: &str = "hemascreen.log";

/// Where log lines go. Stdout is reserved for the JSON result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    Stderr,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub home: PathBuf,
    pub model_path: PathBuf,
    pub test_data_path: PathBuf,
    pub require_manifest: bool,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

/// Accepts the usual truthy spellings; anything else is false.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}

impl Settings {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let home = get("HEMASCREEN_HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
        let resolve = |key: &str, default: &str| {
            get(key).map_or_else(|| home.join(default), PathBuf::from)
        };

        let model_path = resolve("HEMASCREEN_MODEL_PATH", DEFAULT_MODEL_PATH);
        let test_data_path = resolve("HEMASCREEN_TEST_DATA_PATH", DEFAULT_TEST_DATA_PATH);
        let log_file = resolve("HEMASCREEN_LOG_FILE", DEFAULT_LOG_FILE);

        let require_manifest = get("HEMASCREEN_REQUIRE_MANIFEST")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        let log_mode = match get("HEMASCREEN_LOG_MODE").as_deref() {
            Some("file") => LogMode::File,
            _ => LogMode::Stderr,
        };

        Self {
            home,
            model_path,
            test_data_path,
            require_manifest,
            log_mode,
            log_file,
        }
    }

    /// Settings rooted at `home` with every other value defaulted.
    #[must_use]
    pub fn with_home(home: &Path) -> Self {
        let home = home.to_string_lossy().into_owned();
        Self::from_lookup(|key| (key == "HEMASCREEN_HOME").then(|| home.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]);
        assert_eq!(s.home, PathBuf::from("."));
        assert_eq!(s.model_path, Path::new(".").join(DEFAULT_MODEL_PATH));
        assert_eq!(s.test_data_path, Path::new(".").join(DEFAULT_TEST_DATA_PATH));
        assert!(!s.require_manifest);
        assert_eq!(s.log_mode, LogMode::Stderr);
    }

    #[test]
    fn test_paths_follow_home() {
        let s = settings(&[("HEMASCREEN_HOME", "/srv/screen")]);
        assert_eq!(
            s.model_path,
            PathBuf::from("/srv/screen/models/thalassemia_model.json")
        );
        assert_eq!(s.log_file, PathBuf::from("/srv/screen/hemascreen.log"));
    }

    #[test]
    fn test_explicit_paths_override_home() {
        let s = settings(&[
            ("HEMASCREEN_HOME", "/srv/screen"),
            ("HEMASCREEN_MODEL_PATH", "/opt/model.json"),
            ("HEMASCREEN_TEST_DATA_PATH", ""),
        ]);
        assert_eq!(s.model_path, PathBuf::from("/opt/model.json"));
        // Empty values fall back to the default.
        assert_eq!(
            s.test_data_path,
            PathBuf::from("/srv/screen/data/thalassemia_test.csv")
        );
    }

    #[test]
    fn test_require_manifest_and_log_mode() {
        let s = settings(&[
            ("HEMASCREEN_REQUIRE_MANIFEST", "yes"),
            ("HEMASCREEN_LOG_MODE", "file"),
        ]);
        assert!(s.require_manifest);
        assert_eq!(s.log_mode, LogMode::File);

        let s = settings(&[("HEMASCREEN_REQUIRE_MANIFEST", "on")]);
        assert!(!s.require_manifest);
    }

    #[test]
    fn test_with_home() {
        let s = Settings::with_home(Path::new("/tmp/h"));
        assert_eq!(s.model_path, PathBuf::from("/tmp/h/models/thalassemia_model.json"));
    }
}
