//! User preferences (tabbed view, editor theme)
//!
//! Preferences are injected into widgets; they are loaded from and saved to a
//! [`PreferenceStore`]. Stored values are plain strings read the same way the
//! page cookies are: the tabbed view is on unless the value is `"false"`, and
//! the theme is dark only for `"dark"`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Editor theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub tabbed_view: bool,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            tabbed_view: true,
            theme: Theme::Light,
        }
    }
}

impl Preferences {
    /// Build from raw stored values; missing values fall back to defaults
    pub fn from_stored(tabbed_view: Option<&str>, theme: Option<&str>) -> Self {
        Self {
            tabbed_view: tabbed_view != Some("false"),
            theme: Theme::parse(theme),
        }
    }
}

/// Raw on-disk shape
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredPreferences {
    tabbed_view: Option<String>,
    theme: Option<String>,
}

impl From<&Preferences> for StoredPreferences {
    fn from(prefs: &Preferences) -> Self {
        Self {
            tabbed_view: Some(prefs.tabbed_view.to_string()),
            theme: Some(prefs.theme.as_str().to_string()),
        }
    }
}

/// Where preferences persist between page loads
pub trait PreferenceStore: Send + Sync {
    fn load(&self) -> Result<Preferences>;
    fn save(&mut self, prefs: &Preferences) -> Result<()>;
}

/// Store that forgets everything when dropped
#[derive(Debug, Default)]
pub struct MemoryStore {
    prefs: Option<Preferences>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> Result<Preferences> {
        Ok(self.prefs.unwrap_or_default())
    }

    fn save(&mut self, prefs: &Preferences) -> Result<()> {
        self.prefs = Some(*prefs);
        Ok(())
    }
}

/// Store backed by a small TOML file
#[derive(Debug, Clone)]
pub struct TomlFileStore {
    path: PathBuf,
}

impl TomlFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for TomlFileStore {
    fn load(&self) -> Result<Preferences> {
        if !self.path.exists() {
            debug!("No preference file at {:?}, using defaults", self.path);
            return Ok(Preferences::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read preferences from {:?}", self.path))?;
        let stored: StoredPreferences = toml::from_str(&content)
            .with_context(|| format!("Invalid preference file {:?}", self.path))?;

        Ok(Preferences::from_stored(
            stored.tabbed_view.as_deref(),
            stored.theme.as_deref(),
        ))
    }

    fn save(&mut self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string(&StoredPreferences::from(prefs))?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write preferences to {:?}", self.path))?;

        info!(
            "Saved preferences: tabbed_view={}, theme={}",
            prefs.tabbed_view,
            prefs.theme.as_str()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_value_parsing() {
        assert_eq!(Preferences::from_stored(None, None), Preferences::default());
        assert!(Preferences::from_stored(Some("true"), None).tabbed_view);
        assert!(Preferences::from_stored(Some("yes"), None).tabbed_view);
        assert!(!Preferences::from_stored(Some("false"), None).tabbed_view);
        assert_eq!(Preferences::from_stored(None, Some("dark")).theme, Theme::Dark);
        assert_eq!(Preferences::from_stored(None, Some("Dark")).theme, Theme::Light);
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), Preferences::default());

        let prefs = Preferences {
            tabbed_view: false,
            theme: Theme::Dark,
        };
        store.save(&prefs).unwrap();
        assert_eq!(store.load().unwrap(), prefs);
    }

    #[test]
    fn test_toml_store_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlFileStore::new(dir.path().join("prefs.toml"));
        assert_eq!(store.load().unwrap(), Preferences::default());
    }

    #[test]
    fn test_toml_store_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TomlFileStore::new(dir.path().join("nested/prefs.toml"));

        let prefs = Preferences {
            tabbed_view: false,
            theme: Theme::Dark,
        };
        store.save(&prefs).unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("tabbed_view = \"false\""));
        assert!(content.contains("theme = \"dark\""));
        assert_eq!(store.load().unwrap(), prefs);
    }

    #[test]
    fn test_toml_store_unknown_values_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        std::fs::write(&path, "theme = \"solarized\"\n").unwrap();

        let store = TomlFileStore::new(&path);
        let prefs = store.load().unwrap();
        assert_eq!(prefs.theme, Theme::Light);
        assert!(prefs.tabbed_view);
    }

    #[test]
    fn test_toml_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        assert!(TomlFileStore::new(&path).load().is_err());
    }
}
