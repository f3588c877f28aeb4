//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/navtree/navtree.toml`
//! 3. Local config: `<docs_dir>/.navtree.toml`
//! 4. Environment variables: `NAVTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Unified configuration for navtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Docs directory used when a command gets none (default: cwd)
    pub docs_dir: PathBuf,
    /// Entry script inside the docs directory
    pub entry_file: String,
    /// Binding holding the top-level tree
    pub root_var: String,
    /// Binding holding the page index
    pub index_var: String,
    /// Extension of fragment scripts
    pub fragment_ext: String,
    /// Fail on fragment references without a file
    pub strict: bool,
    /// Show links next to labels when rendering
    pub show_links: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("."),
            entry_file: "navtreedata.js".into(),
            root_var: "NAVTREE".into(),
            index_var: "NAVTREEINDEX".into(),
            fragment_ext: "js".into(),
            strict: false,
            show_links: true,
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub docs_dir: Option<PathBuf>,
    pub entry_file: Option<String>,
    pub root_var: Option<String>,
    pub index_var: Option<String>,
    pub fragment_ext: Option<String>,
    pub strict: Option<bool>,
    pub show_links: Option<bool>,
}

/// Get the XDG config directory for navtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "navtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("navtree.toml"))
}

/// Get the path to the local config file in a docs directory.
pub fn local_config_path(docs_dir: &Path) -> PathBuf {
    docs_dir.join(".navtree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand `~`, `$VAR` and `${VAR}` in `docs_dir`.
    fn expand_paths(&mut self) {
        let raw = self.docs_dir.to_string_lossy().to_string();
        if let Ok(expanded) = shellexpand::full(&raw) {
            self.docs_dir = PathBuf::from(expanded.as_ref());
        }
    }

    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            docs_dir: overlay
                .docs_dir
                .clone()
                .unwrap_or_else(|| self.docs_dir.clone()),
            entry_file: overlay
                .entry_file
                .clone()
                .unwrap_or_else(|| self.entry_file.clone()),
            root_var: overlay
                .root_var
                .clone()
                .unwrap_or_else(|| self.root_var.clone()),
            index_var: overlay
                .index_var
                .clone()
                .unwrap_or_else(|| self.index_var.clone()),
            fragment_ext: overlay
                .fragment_ext
                .clone()
                .unwrap_or_else(|| self.fragment_ext.clone()),
            strict: overlay.strict.unwrap_or(self.strict),
            show_links: overlay.show_links.unwrap_or(self.show_links),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `docs_dir` - Optional docs directory for local config; it also becomes
    ///   `docs_dir` unless the environment overrides it
    pub fn load(docs_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|p| p.exists());
        Self::load_from(global.as_deref(), docs_dir)
    }

    /// Same as [`Settings::load`] with an explicit global config file.
    pub fn load_from(
        global_path: Option<&Path>,
        docs_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(path) = global_path {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        // 3. Local config next to the docs
        if let Some(dir) = docs_dir {
            current.docs_dir = dir.to_path_buf();
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply NAVTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("NAVTREE").try_parsing(true))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("docs_dir") {
            settings.docs_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("entry_file") {
            settings.entry_file = val;
        }
        if let Ok(val) = config.get_string("root_var") {
            settings.root_var = val;
        }
        if let Ok(val) = config.get_string("index_var") {
            settings.index_var = val;
        }
        if let Ok(val) = config.get_string("fragment_ext") {
            settings.fragment_ext = val;
        }
        if let Ok(val) = config.get_bool("strict") {
            settings.strict = val;
        }
        if let Ok(val) = config.get_bool("show_links") {
            settings.show_links = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# navtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/navtree/navtree.toml
#   Local:  <docs_dir>/.navtree.toml
#   Env:    NAVTREE_* environment variables

# Docs directory used when a command gets none
# docs_dir = "~/src/angelscript/docs/manual"

# Entry script holding the top-level tree
# entry_file = "navtreedata.js"

# Bindings inside the entry script
# root_var = "NAVTREE"
# index_var = "NAVTREEINDEX"

# Fragment scripts are <name>.<fragment_ext>
# fragment_ext = "js"

# Fail when a referenced fragment has no file
# strict = false

# Show links next to labels
# show_links = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_when_loading_then_uses_doxygen_defaults() {
        let settings = Settings::load_from(None, None).expect("load defaults");
        assert_eq!(settings.entry_file, "navtreedata.js");
        assert_eq!(settings.root_var, "NAVTREE");
        assert_eq!(settings.fragment_ext, "js");
    }

    #[test]
    fn given_tilde_in_docs_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            docs_dir: PathBuf::from("~/docs"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let docs = settings.docs_dir.to_string_lossy();
        assert!(docs.starts_with(&home), "docs_dir should start with home: {docs}");
        assert!(!docs.contains('~'));
    }

    #[test]
    fn given_partial_overlay_when_merging_then_keeps_unspecified_fields() {
        let base = Settings::default();
        let overlay = RawSettings {
            root_var: Some("TOC".to_string()),
            strict: Some(true),
            ..RawSettings::default()
        };

        let result = base.merge_with(&overlay);

        assert_eq!(result.root_var, "TOC");
        assert!(result.strict);
        assert_eq!(result.entry_file, "navtreedata.js");
        assert!(result.show_links);
    }

    #[test]
    fn given_settings_when_serializing_then_template_keys_match() {
        let toml = Settings::default().to_toml().unwrap();
        for key in ["entry_file", "root_var", "index_var", "fragment_ext", "strict"] {
            assert!(toml.contains(key), "missing {key}");
            assert!(Settings::template().contains(key), "template missing {key}");
        }
    }
}
