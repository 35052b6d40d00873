use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "todos.toml";
const APP_DIR: &str = "todos";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub log_file: PathBuf,
    pub preferences_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".into(),
            log_file: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("todos.log"),
            preferences_file: dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("preferences.json"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_url: Option<String>,
    log_file: Option<PathBuf>,
    preferences_file: Option<PathBuf>,
}

impl Settings {
    /// Defaults, then the TOML file, then `TODOS_*` environment variables.
    ///
    /// An explicit `config_path` must exist; the default `todos.toml` is optional.
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = Settings::default();
        match config_path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                settings.apply_toml(&raw, path)?;
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if let Ok(raw) = fs::read_to_string(path) {
                    settings.apply_toml(&raw, path)?;
                }
            }
        }
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    fn apply_toml(&mut self, raw: &str, path: &Path) -> anyhow::Result<()> {
        let file: FileSettings =
            toml::from_str(raw).with_context(|| format!("parsing config {}", path.display()))?;
        if let Some(v) = file.api_url {
            self.api_url = v;
        }
        if let Some(v) = file.log_file {
            self.log_file = v;
        }
        if let Some(v) = file.preferences_file {
            self.preferences_file = v;
        }
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("TODOS_API_URL") {
            self.api_url = v;
        }
        if let Some(v) = var("TODOS_LOG_FILE") {
            self.log_file = PathBuf::from(v);
        }
        if let Some(v) = var("TODOS_PREFERENCES_FILE") {
            self.preferences_file = PathBuf::from(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn file_overrides_defaults_and_env_overrides_file() {
        let mut settings = Settings::default();
        settings
            .apply_toml(
                "api_url = \"http://tasks.internal\"\nlog_file = \"/tmp/todos.log\"\n",
                Path::new("todos.toml"),
            )
            .expect("valid toml");
        assert_eq!(settings.api_url, "http://tasks.internal");
        assert_eq!(settings.log_file, PathBuf::from("/tmp/todos.log"));

        let env = HashMap::from([("TODOS_API_URL", "http://localhost:9000")]);
        settings.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(settings.api_url, "http://localhost:9000");
        assert_eq!(settings.log_file, PathBuf::from("/tmp/todos.log"));
        assert_eq!(
            settings.preferences_file,
            Settings::default().preferences_file
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Settings::default()
            .apply_toml("dark_mode = true\n", Path::new("todos.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("todos.toml"));
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(Settings::load(Some(dir.path().join("absent.toml").as_path())).is_err());

        let path = dir.path().join("todos.toml");
        fs::write(&path, "preferences_file = \"prefs.json\"\n").expect("write");
        let settings = Settings::load(Some(path.as_path())).expect("load");
        if std::env::var("TODOS_PREFERENCES_FILE").is_err() {
            assert_eq!(settings.preferences_file, PathBuf::from("prefs.json"));
        }
    }
}
