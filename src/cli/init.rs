//! Init command for Quickfire.
//!
//! Writes a default project config and creates the home directory that
//! holds the session history.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{project_config_path, project_dir};

/// Options for the init command.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Overwrite an existing config file.
    pub force: bool,
}

/// Output format for the init command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitOutput {
    /// Whether initialization was successful.
    pub success: bool,
    /// Files and directories created.
    pub created: Vec<String>,
    /// Files that already existed (skipped).
    pub skipped: Vec<String>,
    /// Error message if initialization failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InitOutput {
    /// Create a successful output.
    pub fn success(created: Vec<String>, skipped: Vec<String>) -> Self {
        Self {
            success: true,
            created,
            skipped,
            error: None,
        }
    }

    /// Create a failed output, keeping what was created before the failure.
    pub fn failure(error: impl Into<String>, created: Vec<String>, skipped: Vec<String>) -> Self {
        Self {
            success: false,
            created,
            skipped,
            error: Some(error.into()),
        }
    }
}

/// Default config.toml content.
const DEFAULT_CONFIG: &str = r#"# Quickfire Configuration
#
# Environment variables (QUICKFIRE_MODE, QUICKFIRE_TARGET_COUNT, ...) and
# command-line flags override these values.

[session]
# Selection mode: "random", "low-accuracy", "not-recent" or "explicit"
mode = "random"
target_count = 5
# Uncomment for a timed session
# time_limit_seconds = 60
# Accuracy needed to pass; 0 disables the target
target_accuracy_percent = 80

[selection]
# Cards below this accuracy are picked first by "low-accuracy"
accuracy_threshold_percent = 80
# Cards reviewed within this many hours are skipped by "not-recent"
recent_cutoff_hours = 24
"#;

/// The init command implementation.
pub struct InitCommand {
    cwd: PathBuf,
    home: Option<PathBuf>,
}

impl InitCommand {
    /// Create a new init command.
    pub fn new(cwd: impl Into<PathBuf>, home: Option<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            home,
        }
    }

    /// Run the init command.
    pub fn run(&self, options: &InitOptions) -> InitOutput {
        let mut created = Vec::new();
        let mut skipped = Vec::new();

        let dir = project_dir(&self.cwd);
        match self.ensure_dir(&dir) {
            Ok(true) => created.push(dir.display().to_string()),
            Ok(false) => skipped.push(dir.display().to_string()),
            Err(e) => return InitOutput::failure(e, created, skipped),
        }

        let config_path = project_config_path(&self.cwd);
        match self.ensure_file(&config_path, DEFAULT_CONFIG, options.force) {
            Ok(true) => created.push(config_path.display().to_string()),
            Ok(false) => skipped.push(config_path.display().to_string()),
            Err(e) => return InitOutput::failure(e, created, skipped),
        }

        if let Some(home) = &self.home {
            match self.ensure_dir(home) {
                Ok(true) => created.push(home.display().to_string()),
                Ok(false) => skipped.push(home.display().to_string()),
                Err(e) => return InitOutput::failure(e, created, skipped),
            }
        }

        InitOutput::success(created, skipped)
    }

    /// Returns Ok(true) if created, Ok(false) if it already existed.
    fn ensure_dir(&self, path: &Path) -> Result<bool, String> {
        if path.exists() {
            if path.is_dir() {
                return Ok(false);
            }
            return Err(format!("{} exists but is not a directory", path.display()));
        }

        fs::create_dir_all(path)
            .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))?;

        Ok(true)
    }

    /// Returns Ok(true) if written, Ok(false) if it already existed.
    fn ensure_file(&self, path: &Path, content: &str, force: bool) -> Result<bool, String> {
        if path.exists() && !force {
            return Ok(false);
        }

        fs::write(path, content)
            .map_err(|e| format!("Failed to write file {}: {}", path.display(), e))?;

        Ok(true)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &InitOutput, options: &InitOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &InitOutput) -> String {
        let mut lines = Vec::new();

        if !output.success {
            lines.push(format!(
                "Init failed: {}",
                output.error.as_deref().unwrap_or("unknown error")
            ));
            if !output.created.is_empty() {
                lines.push(String::new());
                lines.push("Partially created before failure:".to_string());
                for path in &output.created {
                    lines.push(format!("  {}", path));
                }
            }
            return lines.join("\n");
        }

        if output.created.is_empty() {
            return "Quickfire already initialized.".to_string();
        }

        lines.push("Created:".to_string());
        for path in &output.created {
            lines.push(format!("  {}", path));
        }

        if !output.skipped.is_empty() {
            lines.push("Already exists (skipped):".to_string());
            for path in &output.skipped {
                lines.push(format!("  {}", path));
            }
        }

        lines.push(String::new());
        lines.push("Quickfire initialized.".to_string());
        lines.join("\n")
    }
}
