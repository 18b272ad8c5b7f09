// guide-autoscroll - Drifting auto-scroll engine for retro channel guides
// Copyright (C) 2025  Simon Peter Rothgang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! String key-value preference storage (`localStorage` stand-in).

use crate::error::ScrollError;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Key holding the persisted auto-scroll choice.
pub const AUTO_SCROLL_PREF_KEY: &str = "autoScrollEnabled";
/// Key the theming layer persists the active theme under.
pub const THEME_PREF_KEY: &str = "theme";
/// Auto-scroll choice held aside while the classic theme forces it off.
pub const REMEMBERED_PREF_KEY: &str = "autoScrollBeforeTheme";

const PREFS_DIR_NAME: &str = "guide-autoscroll";
const PREFS_FILE: &str = "prefs.json";

pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, ScrollError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), ScrollError>;
    fn remove(&mut self, key: &str) -> Result<(), ScrollError>;
}

/// Persisted on/off choice, stored as `"true"` / `"false"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPreference(pub bool);

impl ScrollPreference {
    pub fn parse(raw: &str) -> Result<Self, ScrollError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Self(true)),
            "false" | "0" => Ok(Self(false)),
            _ => Err(ScrollError::MalformedPreference(raw.to_owned())),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        if self.0 { "true" } else { "false" }
    }

    /// Read the preference, `Ok(None)` when never written.
    pub fn load<P: PreferenceStore + ?Sized>(store: &P) -> Result<Option<Self>, ScrollError> {
        store.get(AUTO_SCROLL_PREF_KEY)?.map(|raw| Self::parse(&raw)).transpose()
    }

    pub fn save<P: PreferenceStore + ?Sized>(self, store: &mut P) -> Result<(), ScrollError> {
        store.set(AUTO_SCROLL_PREF_KEY, self.as_str())
    }
}

/// Shared in-memory store. Clones see the same map, which is how tests model
/// a page reload over the same backing storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    map: Rc<RefCell<BTreeMap<String, String>>>,
    unavailable: Rc<Cell<bool>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every access fail, like storage in a locked-down private window.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.map.borrow().get(key).cloned()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ScrollError> {
        if self.unavailable.get() {
            return Err(ScrollError::PreferenceStore("storage disabled".to_owned()));
        }
        Ok(self.map.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ScrollError> {
        if self.unavailable.get() {
            return Err(ScrollError::PreferenceStore("storage disabled".to_owned()));
        }
        self.map.borrow_mut().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ScrollError> {
        if self.unavailable.get() {
            return Err(ScrollError::PreferenceStore("storage disabled".to_owned()));
        }
        self.map.borrow_mut().remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten on every `set`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    cache: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open `path`; a missing or unreadable file starts empty.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        let cache = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                tracing::warn!("ignoring malformed preference file {}: {err}", path.display());
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path: path.to_path_buf(), cache }
    }

    /// `$XDG_CONFIG_HOME/guide-autoscroll/prefs.json` (or platform equivalent).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(PREFS_DIR_NAME).join(PREFS_FILE))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), ScrollError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ScrollError::PreferenceStore(e.to_string()))?;
        }
        let content = serde_json::to_vec_pretty(&self.cache)
            .map_err(|e| ScrollError::PreferenceStore(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| ScrollError::PreferenceStore(e.to_string()))
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ScrollError> {
        Ok(self.cache.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ScrollError> {
        self.cache.insert(key.to_owned(), value.to_owned());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), ScrollError> {
        if self.cache.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
