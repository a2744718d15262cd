//! Process-wide settings for the library updater.
//!
//! Settings are resolved once at startup and passed by value into the
//! components that need them. Precedence, lowest to highest:
//!
//! 1. Built-in defaults (the original tool's behavior),
//! 2. A TOML or YAML settings file (platform config directory, or an explicit
//!    path),
//! 3. `TANKOBON_`-prefixed environment variables (`__` separates nesting,
//!    e.g. `TANKOBON_FETCHER__LANGUAGE=en`).
//!
//! Nothing here is mutable after load; there is no runtime reconfiguration.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for setting overrides.
const ENV_PREFIX: &str = "TANKOBON_";

/// Immutable process-wide settings.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub fetcher: FetcherSettings,
    pub library: LibrarySettings,
}

/// How the external fetch tool is located and invoked.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetcherSettings {
    /// Executable name of the fetch tool, resolved against `PATH`.
    pub command: String,
    /// Fixed output-format and behavior flags appended to every invocation.
    pub flags: Vec<String>,
    /// Language code typed into the tool's interactive prompt.
    pub language: String,
    /// Source families whose tool prompts for a language on stdin.
    pub interactive_hosts: Vec<String>,
}
impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            command: "manga-py".to_string(),
            flags: ["--cbz", "--zero-fill", "--rename-pages", "--no-webp", "--show-current-chapter-info"]
                .map(String::from)
                .to_vec(),
            language: "gb".to_string(),
            interactive_hosts: vec!["mangadex".to_string()],
        }
    }
}

/// Policy knobs for the update run over a library of titles.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibrarySettings {
    /// Source-name tokens; a resolved URL containing any of them is skipped.
    pub skip_hosts: Vec<String>,
    /// Pause between titles, to stay polite with remote sources.
    pub delay_seconds: u64,
    /// Titles taking longer than this are flagged as slow in the report.
    pub slow_after_minutes: u64,
}
impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            skip_hosts: Vec::new(),
            delay_seconds: 0,
            slow_after_minutes: 2,
        }
    }
}

impl Settings {
    /// Loads settings from the default locations.
    ///
    /// Looks for `config.toml` in the platform config directory (e.g.
    /// `~/.config/tankobon/` on Linux); a missing file is not an error.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_file())
    }

    /// Loads settings, reading `file` (TOML or YAML by extension) if given.
    pub fn load_from(file: Option<PathBuf>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = file {
            tracing::debug!(path = %path.display(), "Merging settings file");
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        let settings: Settings =
            figment.merge(Env::prefixed(ENV_PREFIX).split("__")).extract().or_raise(|| ErrorKind::Load)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Path of the user's settings file, if one exists on disk.
    fn default_file() -> Option<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "tankobon")?;
        let file = dirs.config_dir().join("config.toml");
        file.is_file().then_some(file)
    }

    fn validate(&self) -> Result<()> {
        if self.fetcher.command.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("fetcher.command must not be empty".to_string()));
        }
        if self.fetcher.language.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("fetcher.language must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Convenience for tests and embedding: load with an explicit file only,
/// skipping the platform lookup.
pub fn load_file(path: impl AsRef<Path>) -> Result<Settings> {
    Settings::load_from(Some(path.as_ref().to_path_buf()))
}
