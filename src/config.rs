//! Tour configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! describe a complete two-locale tour; a `config.toml` in the content root
//! only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! ```text
//! tour/
//! ├── config.toml              # Tour config (overrides stock defaults)
//! ├── template.html            # Page template (optional, built-in otherwise)
//! ├── index.md / index.mbt     # English landing page
//! ├── 01_intro/
//! │   └── 01_hello/
//! └── zh/                      # Chinese locale root
//!     ├── index.md / index.mbt
//!     └── 01_intro/
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! code_extension = "mbt"    # Extension of the lesson code file (index.<ext>)
//! toc_page = true           # Emit a table-of-contents page per locale
//! # template = "template.html"
//!
//! [locales.en]
//! root = ""                 # Relative to the content root, "" = the root itself
//! title = "Language Tour"
//! back = "Back"
//! next = "Next"
//! toc_title = "Table of Contents"
//!
//! [locales.zh]
//! root = "zh"
//! title = "语言导览"
//! back = "上一节"
//! next = "下一节"
//! toc_title = "目录"
//!
//! [playground]
//! debounce_ms = 100         # Quiescence window before an edit compiles
//! compiler = []             # Compile worker command, e.g. ["moonc-worker"]
//! runner = []               # Program runner command, e.g. ["node", "run.js"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::Locale;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tour configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Extension of the lesson code file (`index.<ext>`), without the dot.
    pub code_extension: String,
    /// Whether to generate a table-of-contents page per locale.
    pub toc_page: bool,
    /// Page template path relative to the content root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Per-locale roots and labels.
    pub locales: LocalesConfig,
    /// Editor and worker settings.
    pub playground: PlaygroundConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            code_extension: "mbt".to_string(),
            toc_page: true,
            template: None,
            locales: LocalesConfig::default(),
            playground: PlaygroundConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.code_extension.is_empty() || self.code_extension.starts_with('.') {
            return Err(ConfigError::Validation(
                "code_extension must be a bare extension like \"mbt\"".into(),
            ));
        }
        for locale in Locale::ALL {
            let cfg = self.locales.get(locale);
            if cfg.title.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "locales.{}.title must not be empty",
                    locale.code()
                )));
            }
        }
        if normalize_root(&self.locales.en.root) == normalize_root(&self.locales.zh.root) {
            return Err(ConfigError::Validation(
                "locales.en.root and locales.zh.root must differ".into(),
            ));
        }
        if self.playground.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "playground.debounce_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// File name the playground hands to the compile worker.
    pub fn main_file_name(&self) -> String {
        format!("main.{}", self.code_extension)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalesConfig {
    pub en: LocaleConfig,
    pub zh: LocaleConfig,
}

impl Default for LocalesConfig {
    fn default() -> Self {
        Self {
            en: LocaleConfig::default_en(),
            zh: LocaleConfig::default_zh(),
        }
    }
}

impl LocalesConfig {
    pub fn get(&self, locale: Locale) -> &LocaleConfig {
        match locale {
            Locale::En => &self.en,
            Locale::Zh => &self.zh,
        }
    }
}

/// Labels and content root of one locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocaleConfig {
    /// Locale root relative to the content root; empty means the root itself.
    pub root: String,
    /// Tour title, also the homepage label.
    pub title: String,
    /// Label of the "previous lesson" link.
    pub back: String,
    /// Label of the "next lesson" link.
    pub next: String,
    /// Title of the table-of-contents page.
    pub toc_title: String,
}

impl LocaleConfig {
    pub fn default_en() -> Self {
        Self {
            root: String::new(),
            title: "Language Tour".to_string(),
            back: "Back".to_string(),
            next: "Next".to_string(),
            toc_title: "Table of Contents".to_string(),
        }
    }

    pub fn default_zh() -> Self {
        Self {
            root: "zh".to_string(),
            title: "语言导览".to_string(),
            back: "上一节".to_string(),
            next: "下一节".to_string(),
            toc_title: "目录".to_string(),
        }
    }

    /// Absolute locale root for a given content root.
    pub fn resolve_root(&self, source: &Path) -> PathBuf {
        match normalize_root(&self.root) {
            "" => source.to_path_buf(),
            root => source.join(root),
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self::default_en()
    }
}

fn normalize_root(root: &str) -> &str {
    let root = root.trim_matches('/');
    if root == "." { "" } else { root }
}

/// Playground editor and worker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaygroundConfig {
    /// Quiescence window in milliseconds before an edit triggers a compile.
    pub debounce_ms: u64,
    /// Compile worker command line (program followed by arguments).
    pub compiler: Vec<String>,
    /// Runner command line; receives the compiled artifact on stdin.
    pub runner: Vec<String>,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            compiler: Vec::new(),
            runner: Vec::new(),
        }
    }
}

impl PlaygroundConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
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

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
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

/// Load config from `config.toml` in the content root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Language Tour Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Extension of the lesson code file. Every lesson directory must contain
# index.md and index.<code_extension>.
code_extension = "mbt"

# Emit a table-of-contents page per locale (table-of-contents/index.html).
toc_page = true

# Page template, relative to the content root. When omitted, template.html in
# the content root is used if present, otherwise the built-in template.
# template = "template.html"

# ---------------------------------------------------------------------------
# Locales
# ---------------------------------------------------------------------------
[locales.en]
# Locale root relative to the content root ("" = the content root itself).
root = ""
title = "Language Tour"
back = "Back"
next = "Next"
toc_title = "Table of Contents"

[locales.zh]
root = "zh"
title = "语言导览"
back = "上一节"
next = "下一节"
toc_title = "目录"

# ---------------------------------------------------------------------------
# Playground
# ---------------------------------------------------------------------------
[playground]
# Milliseconds of editing quiescence before the code is recompiled.
debounce_ms = 100

# Compile worker: reads {"files": [[path, content]], "debug": bool} on stdin
# and answers {"kind": "success", "artifact": ...} or
# {"kind": "error", "diagnostics": [...]} on stdout.
compiler = []

# Runner: receives the artifact on stdin and prints program output.
runner = []
"##
}
