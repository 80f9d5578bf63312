//! Project configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives at
//! the project root and is layered over stock defaults: only the keys it
//! names are overridden.
//!
//! ## Project Layout
//!
//! ```text
//! project/
//! ├── config.toml              # Optional; stock defaults apply without it
//! ├── content/                 # content_directory
//! ├── resources/               # resource_directory
//! ├── static/                  # static_directory
//! ├── templates/               # templates.path
//! │   └── routes.yaml          # templates.routes
//! └── output/                  # output_directory (generated)
//! ```
//!
//! Relative directories resolve against the project root; absolute ones are
//! used as given.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! content_directory = "content"
//! resource_directory = "resources"
//! static_directory = "static"
//! output_directory = "output"
//!
//! [build]
//! clean_output = true       # Remove the output directory before rendering
//!
//! [templates]
//! backend = "jinja2"        # Only jinja2 is supported
//! path = "templates"        # Template search directory
//! routes = "templates/routes.yaml"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::scan::ScanRoots;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Markdown, data, and compiled assets that make up the site tree.
    pub content_directory: String,
    /// Compiled assets outside the content tree (no index pages).
    pub resource_directory: String,
    /// Files linked into the output verbatim.
    pub static_directory: String,
    /// Where the built site is written.
    pub output_directory: String,
    pub build: BuildConfig,
    pub templates: TemplatesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_directory: "content".to_string(),
            resource_directory: "resources".to_string(),
            static_directory: "static".to_string(),
            output_directory: "output".to_string(),
            build: BuildConfig::default(),
            templates: TemplatesConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let directories = [
            ("content_directory", &self.content_directory),
            ("resource_directory", &self.resource_directory),
            ("static_directory", &self.static_directory),
            ("output_directory", &self.output_directory),
            ("templates.path", &self.templates.path),
            ("templates.routes", &self.templates.routes),
        ];
        for (key, value) in directories {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        for (key, value) in &directories[..3] {
            if *value == &self.output_directory {
                return Err(ConfigError::Validation(format!(
                    "output_directory must differ from {key}"
                )));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Source roots resolved against the project root.
    pub fn scan_roots(&self, root: &Path) -> ScanRoots {
        ScanRoots {
            content: root.join(&self.content_directory),
            statics: root.join(&self.static_directory),
            resources: root.join(&self.resource_directory),
        }
    }

    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.output_directory)
    }

    pub fn templates_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.templates.path)
    }

    pub fn routes_file(&self, root: &Path) -> PathBuf {
        root.join(&self.templates.routes)
    }

    /// Refuse output directories that would swallow project files.
    ///
    /// Paths are compared after resolving them against `root`, so
    /// `./content`, `content/..` and `.` are caught as well as the plain
    /// names. The output may not be the project root, and it may not equal,
    /// contain, or sit inside a source root or the templates directory.
    pub fn check_output_dir(&self, root: &Path) -> Result<(), ConfigError> {
        let output = normalized(&self.output_dir(root))?;
        let project = normalized(root)?;
        if output == project || project.starts_with(&output) {
            return Err(ConfigError::Validation(format!(
                "output_directory '{}' would replace the project root",
                self.output_directory
            )));
        }

        let roots = self.scan_roots(root);
        let protected = [
            ("content_directory", roots.content),
            ("resource_directory", roots.resources),
            ("static_directory", roots.statics),
            ("templates.path", self.templates_dir(root)),
        ];
        for (key, dir) in protected {
            let dir = normalized(&dir)?;
            if dir.starts_with(&output) || output.starts_with(&dir) {
                return Err(ConfigError::Validation(format!(
                    "output_directory '{}' overlaps {key}",
                    self.output_directory
                )));
            }
        }
        Ok(())
    }
}

/// Absolute form of `path` with `.` and `..` folded away lexically.
fn normalized(path: &Path) -> Result<PathBuf, ConfigError> {
    let mut out = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Output handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Remove the output directory before writing pages.
    pub clean_output: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self { clean_output: true }
    }
}

/// Template engine selection and lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Engine name. Only `jinja2` is accepted.
    pub backend: String,
    /// Directory templates are loaded from.
    pub path: String,
    /// YAML file mapping URL glob patterns to template names.
    pub routes: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            backend: "jinja2".to_string(),
            path: "templates".to_string(),
            routes: "templates/routes.yaml".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel content processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the project root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let overlay = load_raw_config(&root.join(CONFIG_FILE))?;
    resolve_config(stock_defaults_value(), overlay)
}

/// Load config from an explicitly named file, which must exist.
pub fn load_config_file(path: &Path) -> Result<SiteConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value(), Some(overlay))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Liara Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Relative paths are resolved against the directory holding this file.
# Unknown keys will cause an error.

# Markdown documents, YAML data files and compiled assets.
content_directory = "content"

# Compiled assets (Sass/SCSS) outside the content tree.
resource_directory = "resources"

# Files linked into the output as-is.
static_directory = "static"

# Where the site is written.
output_directory = "output"

# ---------------------------------------------------------------------------
# Build
# ---------------------------------------------------------------------------
[build]
# Remove the output directory before writing pages.
clean_output = true

# ---------------------------------------------------------------------------
# Templates
# ---------------------------------------------------------------------------
[templates]
# Template engine. Only "jinja2" is supported.
backend = "jinja2"

# Directory template names are resolved in.
path = "templates"

# YAML mapping of URL glob pattern -> template name.
# The longest matching pattern wins.
routes = "templates/routes.yaml"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for markdown and Sass processing.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
