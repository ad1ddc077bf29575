//! Persisted user preferences

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub dark_mode: bool,
}

/// Preferences bound to a file in the data directory
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    current: Preferences,
}

impl PreferenceStore {
    /// Load from `<data_dir>/preferences.json`
    ///
    /// A missing or unreadable file yields the defaults (light mode).
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(PREFERENCES_FILE);
        let current = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), "ignoring unreadable preferences: {e}");
                Preferences::default()
            }),
            Err(_) => Preferences::default(),
        };
        debug!(?current, "loaded preferences");
        Self { path, current }
    }

    pub fn preferences(&self) -> Preferences {
        self.current
    }

    pub fn dark_mode(&self) -> bool {
        self.current.dark_mode
    }

    /// Flip dark mode and save immediately, returning the new setting
    ///
    /// The in-memory setting changes even if saving fails.
    pub fn toggle_dark_mode(&mut self) -> Result<bool> {
        self.current.dark_mode = !self.current.dark_mode;
        self.save()?;
        Ok(self.current.dark_mode)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string(&self.current)?;
        fs::write(&self.path, text)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_light_mode() {
        let temp_dir = TempDir::new().unwrap();
        let store = PreferenceStore::load(temp_dir.path());
        assert!(!store.dark_mode());
    }

    #[test]
    fn test_toggle_persists() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = PreferenceStore::load(temp_dir.path());
        assert!(store.toggle_dark_mode().unwrap());

        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, r#"{"darkMode":true}"#);
        assert!(PreferenceStore::load(temp_dir.path()).dark_mode());

        assert!(!store.toggle_dark_mode().unwrap());
        assert!(!PreferenceStore::load(temp_dir.path()).dark_mode());
    }

    #[test]
    fn test_corrupt_file_is_light_mode() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(PREFERENCES_FILE), "{not json").unwrap();
        assert!(!PreferenceStore::load(temp_dir.path()).dark_mode());
    }
}
