//! Display preferences persisted between runs. Only the presentation layer
//! reads or writes these.

use serde::{Deserialize, Serialize};
use std::{fs, io, path::PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub dark_mode: bool,
}

pub trait PreferenceStore {
    fn load(&self) -> Preferences;
    fn save(&self, preferences: &Preferences) -> io::Result<()>;
}

pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Preferences {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Preferences::default(),
            Err(err) => {
                warn!(path = %self.path.display(), "Failed to read preferences: {err}");
                return Preferences::default();
            }
        };
        serde_json::from_str(&data).unwrap_or_else(|err| {
            warn!(path = %self.path.display(), "Ignoring malformed preferences: {err}");
            Preferences::default()
        })
    }

    fn save(&self, preferences: &Preferences) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(preferences)?)
    }
}
