//! Configuration loading for Quickfire.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.quickfire/config.toml`)
//! 3. User config (`~/.quickfire/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. Command-line flags are applied on top by
//! the CLI.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::core::{SelectionMode, SessionConfig, VALID_MODES};
use crate::error::{FailOpen, QuickfireError, Result};
use crate::util::{atomic_write, read_to_string_limited};

/// Main configuration struct for Quickfire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Session defaults.
    pub session: SessionDefaults,
    /// Selection thresholds.
    pub selection: SelectionConfig,
}

/// Defaults for new sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionDefaults {
    /// Selection mode name (see `VALID_MODES`).
    pub mode: String,
    /// Number of items per session.
    pub target_count: usize,
    /// Countdown length. Absent means untimed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_seconds: Option<u32>,
    /// Accuracy needed to pass. 0 disables the target.
    pub target_accuracy_percent: u32,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            mode: "random".to_string(),
            target_count: 5,
            time_limit_seconds: None,
            target_accuracy_percent: 80,
        }
    }
}

/// Selection thresholds used by the low-accuracy and not-recent modes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionConfig {
    /// Items below this accuracy count as weak.
    pub accuracy_threshold_percent: u32,
    /// Items reviewed within this many hours count as recently seen.
    pub recent_cutoff_hours: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            accuracy_threshold_percent: 80,
            recent_cutoff_hours: 24,
        }
    }
}

/// One config file as written. Only the keys a file sets are applied over
/// the layers below it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    session: SessionLayer,
    selection: SelectionLayer,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SessionLayer {
    mode: Option<String>,
    target_count: Option<usize>,
    /// 0 clears a time limit set by a lower layer.
    time_limit_seconds: Option<u32>,
    target_accuracy_percent: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SelectionLayer {
    accuracy_threshold_percent: Option<u32>,
    recent_cutoff_hours: Option<u32>,
}

/// Check if a percentage value is valid (0..=100).
pub fn is_valid_percent(value: u32) -> bool {
    value <= 100
}

impl Config {
    /// Load configuration using the standard precedence chain.
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_layer) = Self::load_user_layer() {
                    config = config.merge(user_layer);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_layer) = Self::load_user_layer() {
            config = config.merge(user_layer);
        }

        if let Some(project_layer) = Self::load_project_layer(cwd) {
            config = config.merge(project_layer);
        }

        config.apply_env_overrides();

        config
    }

    fn load_user_layer() -> Option<ConfigLayer> {
        let path = quickfire_home()?.join("config.toml");
        Self::load_optional(&path)
    }

    fn load_project_layer(cwd: &Path) -> Option<ConfigLayer> {
        Self::load_optional(&project_config_path(cwd))
    }

    /// A missing file is silent; an unreadable or invalid one is reported.
    fn load_optional(path: &Path) -> Option<ConfigLayer> {
        if !path.exists() {
            return None;
        }
        Self::read_layer(path)
            .map(Some)
            .fail_open_default(&format!("loading {}", path.display()))
    }

    fn read_layer(path: &Path) -> Result<ConfigLayer> {
        let content = read_to_string_limited(path)?;
        toml::from_str(&content).map_err(|e| {
            QuickfireError::config(format!("Invalid config {}: {}", path.display(), e))
        })
    }

    /// Load a single config file over the defaults.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Ok(Config::default().merge(Self::read_layer(path)?))
    }

    /// Apply environment variable overrides. Invalid values are reported and
    /// ignored.
    fn apply_env_overrides(&mut self) {
        // QUICKFIRE_MODE
        if let Ok(val) = env::var("QUICKFIRE_MODE") {
            if val.parse::<SelectionMode>().is_ok() {
                self.session.mode = val;
            } else {
                eprintln!(
                    "Warning: Invalid QUICKFIRE_MODE value '{}'. \
                    Valid values: {:?}. Using '{}'.",
                    val, VALID_MODES, self.session.mode
                );
            }
        }

        // QUICKFIRE_TARGET_COUNT
        if let Ok(val) = env::var("QUICKFIRE_TARGET_COUNT") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => self.session.target_count = n,
                _ => eprintln!(
                    "Warning: Invalid QUICKFIRE_TARGET_COUNT value '{}'. \
                    Expected a positive integer. Using '{}'.",
                    val, self.session.target_count
                ),
            }
        }

        // QUICKFIRE_TIME_LIMIT (0 means untimed)
        if let Ok(val) = env::var("QUICKFIRE_TIME_LIMIT") {
            match val.parse::<u32>() {
                Ok(0) => self.session.time_limit_seconds = None,
                Ok(n) => self.session.time_limit_seconds = Some(n),
                Err(_) => eprintln!(
                    "Warning: Invalid QUICKFIRE_TIME_LIMIT value '{}'. \
                    Expected seconds as an integer. Using {:?}.",
                    val, self.session.time_limit_seconds
                ),
            }
        }

        // QUICKFIRE_TARGET_ACCURACY
        if let Ok(val) = env::var("QUICKFIRE_TARGET_ACCURACY") {
            match val.parse::<u32>() {
                Ok(n) if is_valid_percent(n) => self.session.target_accuracy_percent = n,
                _ => eprintln!(
                    "Warning: Invalid QUICKFIRE_TARGET_ACCURACY value '{}'. \
                    Must be in range [0, 100]. Using '{}'.",
                    val, self.session.target_accuracy_percent
                ),
            }
        }

        // QUICKFIRE_ACCURACY_THRESHOLD
        if let Ok(val) = env::var("QUICKFIRE_ACCURACY_THRESHOLD") {
            match val.parse::<u32>() {
                Ok(n) if is_valid_percent(n) => self.selection.accuracy_threshold_percent = n,
                _ => eprintln!(
                    "Warning: Invalid QUICKFIRE_ACCURACY_THRESHOLD value '{}'. \
                    Must be in range [0, 100]. Using '{}'.",
                    val, self.selection.accuracy_threshold_percent
                ),
            }
        }

        // QUICKFIRE_RECENT_CUTOFF_HOURS
        if let Ok(val) = env::var("QUICKFIRE_RECENT_CUTOFF_HOURS") {
            match val.parse::<u32>() {
                Ok(n) => self.selection.recent_cutoff_hours = n,
                Err(_) => eprintln!(
                    "Warning: Invalid QUICKFIRE_RECENT_CUTOFF_HOURS value '{}'. \
                    Expected a positive integer. Using '{}'.",
                    val, self.selection.recent_cutoff_hours
                ),
            }
        }
    }

    /// Merge a config file layer into this one.
    ///
    /// Every key present in `layer` wins, including values equal to the
    /// defaults.
    fn merge(mut self, layer: ConfigLayer) -> Self {
        let session = layer.session;
        if let Some(mode) = session.mode {
            self.session.mode = mode;
        }
        if let Some(count) = session.target_count {
            self.session.target_count = count;
        }
        if let Some(limit) = session.time_limit_seconds {
            self.session.time_limit_seconds = (limit > 0).then_some(limit);
        }
        if let Some(target) = session.target_accuracy_percent {
            self.session.target_accuracy_percent = target;
        }

        let selection = layer.selection;
        if let Some(threshold) = selection.accuracy_threshold_percent {
            self.selection.accuracy_threshold_percent = threshold;
        }
        if let Some(hours) = selection.recent_cutoff_hours {
            self.selection.recent_cutoff_hours = hours;
        }

        self
    }

    /// Build a session config from the session defaults.
    pub fn to_session_config(&self) -> Result<SessionConfig> {
        let mode: SelectionMode = self.session.mode.parse()?;
        let mut config = SessionConfig::new(mode, self.session.target_count);
        config.time_limit_seconds = self.session.time_limit_seconds.filter(|s| *s > 0);
        if self.session.target_accuracy_percent > 0 {
            config.target_accuracy_percent = Some(self.session.target_accuracy_percent);
        }
        Ok(config)
    }

    /// Save configuration to the project config file.
    ///
    /// Uses atomic write (temp file + rename).
    pub fn save_project(&self, cwd: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| QuickfireError::config(e.to_string()))?;
        atomic_write(&project_config_path(cwd), content.as_bytes())
    }
}

/// Get the Quickfire home directory.
///
/// Checks `QUICKFIRE_HOME` first, then falls back to `~/.quickfire`.
pub fn quickfire_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("QUICKFIRE_HOME") {
        if home.is_empty() {
            tracing::warn!("QUICKFIRE_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("QUICKFIRE_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".quickfire"));
    }

    let fallback_path = env::temp_dir().join("quickfire");
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback_path.display()
    );
    Some(fallback_path)
}

/// Path of the session history log (`<home>/history.jsonl`).
pub fn history_path() -> Option<PathBuf> {
    quickfire_home().map(|home| home.join("history.jsonl"))
}

/// Project directory (`.quickfire/`) for a working directory.
pub fn project_dir(cwd: &Path) -> PathBuf {
    cwd.join(".quickfire")
}

/// Project config file path.
pub fn project_config_path(cwd: &Path) -> PathBuf {
    project_dir(cwd).join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "QUICKFIRE_MODE",
        "QUICKFIRE_TARGET_COUNT",
        "QUICKFIRE_TIME_LIMIT",
        "QUICKFIRE_TARGET_ACCURACY",
        "QUICKFIRE_ACCURACY_THRESHOLD",
        "QUICKFIRE_RECENT_CUTOFF_HOURS",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            env::remove_var(var);
        }
    }

    /// Point QUICKFIRE_HOME at an empty directory so no user config leaks in.
    fn isolated_home() -> TempDir {
        let home = TempDir::new().unwrap();
        env::set_var("QUICKFIRE_HOME", home.path());
        home
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.session.mode, "random");
        assert_eq!(config.session.target_count, 5);
        assert_eq!(config.session.time_limit_seconds, None);
        assert_eq!(config.session.target_accuracy_percent, 80);
        assert_eq!(config.selection.accuracy_threshold_percent, 80);
        assert_eq!(config.selection.recent_cutoff_hours, 24);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");

        let toml_content = r#"
[session]
mode = "low-accuracy"
target_count = 10
time_limit_seconds = 60

[selection]
recent_cutoff_hours = 48
"#;
        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();

        assert_eq!(config.session.mode, "low-accuracy");
        assert_eq!(config.session.target_count, 10);
        assert_eq!(config.session.time_limit_seconds, Some(60));
        assert_eq!(config.selection.recent_cutoff_hours, 48);

        // Other fields should be defaults
        assert_eq!(config.session.target_accuracy_percent, 80);
        assert_eq!(config.selection.accuracy_threshold_percent, 80);
    }

    #[test]
    fn test_load_from_file_missing() {
        let result = Config::load_from_file(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "this is not valid toml [[[").unwrap();

        let result = Config::load_from_file(&config_path);
        assert!(matches!(result, Err(QuickfireError::Config { .. })));
    }

    #[test]
    #[serial]
    fn test_project_config_precedence() {
        clear_env();
        let _home = isolated_home();
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(project_dir(dir.path())).unwrap();
        fs::write(
            project_config_path(dir.path()),
            "[session]\ntarget_count = 7\n",
        )
        .unwrap();

        let config = Config::load_from_cwd(dir.path());

        assert_eq!(config.session.target_count, 7);
        assert_eq!(config.session.mode, "random");

        env::remove_var("QUICKFIRE_HOME");
    }

    #[test]
    #[serial]
    fn test_user_config_below_project_config() {
        clear_env();
        let home = isolated_home();
        fs::write(
            home.path().join("config.toml"),
            "[session]\ntarget_count = 3\nmode = \"not-recent\"\n",
        )
        .unwrap();
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(project_dir(dir.path())).unwrap();
        fs::write(
            project_config_path(dir.path()),
            "[session]\ntarget_count = 9\n",
        )
        .unwrap();

        let config = Config::load_from_cwd(dir.path());

        assert_eq!(config.session.target_count, 9);
        assert_eq!(config.session.mode, "not-recent");

        env::remove_var("QUICKFIRE_HOME");
    }

    #[test]
    #[serial]
    fn test_invalid_project_config_falls_back() {
        clear_env();
        let _home = isolated_home();
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(project_dir(dir.path())).unwrap();
        fs::write(project_config_path(dir.path()), "[[[ nope").unwrap();

        let config = Config::load_from_cwd(dir.path());
        assert_eq!(config, Config::default());

        env::remove_var("QUICKFIRE_HOME");
    }

    #[test]
    #[serial]
    fn test_env_var_precedence() {
        clear_env();
        let _home = isolated_home();
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(project_dir(dir.path())).unwrap();
        fs::write(
            project_config_path(dir.path()),
            "[session]\ntarget_count = 7\n",
        )
        .unwrap();

        env::set_var("QUICKFIRE_TARGET_COUNT", "12");

        let config = Config::load_from_cwd(dir.path());
        assert_eq!(config.session.target_count, 12);

        clear_env();
        env::remove_var("QUICKFIRE_HOME");
    }

    #[test]
    #[serial]
    fn test_env_var_overrides() {
        clear_env();
        env::set_var("QUICKFIRE_MODE", "low-accuracy");
        env::set_var("QUICKFIRE_TARGET_COUNT", "8");
        env::set_var("QUICKFIRE_TIME_LIMIT", "45");
        env::set_var("QUICKFIRE_TARGET_ACCURACY", "90");
        env::set_var("QUICKFIRE_ACCURACY_THRESHOLD", "70");
        env::set_var("QUICKFIRE_RECENT_CUTOFF_HOURS", "6");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.session.mode, "low-accuracy");
        assert_eq!(config.session.target_count, 8);
        assert_eq!(config.session.time_limit_seconds, Some(45));
        assert_eq!(config.session.target_accuracy_percent, 90);
        assert_eq!(config.selection.accuracy_threshold_percent, 70);
        assert_eq!(config.selection.recent_cutoff_hours, 6);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_var_invalid_values_ignored() {
        clear_env();
        env::set_var("QUICKFIRE_MODE", "alphabetical");
        env::set_var("QUICKFIRE_TARGET_COUNT", "0");
        env::set_var("QUICKFIRE_TIME_LIMIT", "soon");
        env::set_var("QUICKFIRE_TARGET_ACCURACY", "150");
        env::set_var("QUICKFIRE_ACCURACY_THRESHOLD", "-5");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config, Config::default());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_time_limit_zero_is_untimed() {
        clear_env();
        env::set_var("QUICKFIRE_TIME_LIMIT", "0");

        let mut config = Config::default();
        config.session.time_limit_seconds = Some(30);
        config.apply_env_overrides();

        assert_eq!(config.session.time_limit_seconds, None);

        clear_env();
    }

    #[test]
    fn test_merge_field_by_field() {
        let mut base = Config::default();
        base.session.target_count = 9;
        base.session.time_limit_seconds = Some(30);

        let layer: ConfigLayer = toml::from_str("[session]\nmode = \"explicit\"\n").unwrap();
        let merged = base.merge(layer);

        assert_eq!(merged.session.mode, "explicit");
        assert_eq!(merged.session.target_count, 9);
        assert_eq!(merged.session.time_limit_seconds, Some(30));
    }

    #[test]
    fn test_merge_applies_values_equal_to_defaults() {
        let mut base = Config::default();
        base.session.target_count = 10;
        base.session.time_limit_seconds = Some(45);
        base.selection.recent_cutoff_hours = 72;

        let layer: ConfigLayer = toml::from_str(
            "[session]\ntarget_count = 5\ntime_limit_seconds = 0\n\n[selection]\nrecent_cutoff_hours = 24\n",
        )
        .unwrap();
        let merged = base.merge(layer);

        assert_eq!(merged, Config::default());
    }

    #[test]
    #[serial]
    fn test_project_default_value_overrides_user_value() {
        clear_env();
        let home = isolated_home();
        fs::write(
            home.path().join("config.toml"),
            "[session]\ntarget_count = 10\ntime_limit_seconds = 60\n",
        )
        .unwrap();
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(project_dir(dir.path())).unwrap();
        fs::write(
            project_config_path(dir.path()),
            "[session]\ntarget_count = 5\ntime_limit_seconds = 0\n",
        )
        .unwrap();

        let config = Config::load_from_cwd(dir.path());

        assert_eq!(config.session.target_count, 5);
        assert_eq!(config.session.time_limit_seconds, None);

        env::remove_var("QUICKFIRE_HOME");
    }

    #[test]
    fn test_to_session_config() {
        let mut config = Config::default();
        config.session.mode = "not-recent".to_string();
        config.session.time_limit_seconds = Some(20);

        let session = config.to_session_config().unwrap();

        assert_eq!(session.mode, SelectionMode::NotRecentlySeen);
        assert_eq!(session.target_count, 5);
        assert_eq!(session.time_limit_seconds, Some(20));
        assert_eq!(session.target_accuracy_percent, Some(80));
    }

    #[test]
    fn test_to_session_config_zero_target_disables() {
        let mut config = Config::default();
        config.session.target_accuracy_percent = 0;

        let session = config.to_session_config().unwrap();
        assert_eq!(session.target_accuracy_percent, None);
    }

    #[test]
    fn test_to_session_config_bad_mode() {
        let mut config = Config::default();
        config.session.mode = "alphabetical".to_string();
        assert!(config.to_session_config().is_err());
    }

    #[test]
    #[serial]
    fn test_quickfire_home_with_env() {
        let dir = TempDir::new().unwrap();
        env::set_var("QUICKFIRE_HOME", dir.path().to_str().unwrap());

        assert_eq!(quickfire_home().unwrap(), dir.path());
        assert_eq!(history_path().unwrap(), dir.path().join("history.jsonl"));

        env::remove_var("QUICKFIRE_HOME");
    }

    #[test]
    #[serial]
    fn test_quickfire_home_empty_env() {
        env::set_var("QUICKFIRE_HOME", "");

        let home = quickfire_home();
        assert!(home.is_some());
        assert!(home.unwrap().ends_with(".quickfire"));

        env::remove_var("QUICKFIRE_HOME");
    }

    #[test]
    fn test_save_project_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.session.mode = "low-accuracy".to_string();
        config.session.time_limit_seconds = Some(90);

        config.save_project(dir.path()).unwrap();

        let loaded = Config::load_from_file(&project_config_path(dir.path())).unwrap();
        assert_eq!(loaded, config);
        assert!(!project_dir(dir.path()).join(".config.toml.tmp").exists());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[selection]\naccuracy_threshold_percent = 60\n").unwrap();

        assert_eq!(config.selection.accuracy_threshold_percent, 60);
        assert_eq!(config.selection.recent_cutoff_hours, 24);
        assert_eq!(config.session, SessionDefaults::default());
    }
}
