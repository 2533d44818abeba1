use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;

use crate::controller::ControllerSettings;

pub const DEFAULT_API_URL: &str = "http://84.201.178.218:8000";

/// Environment variable overriding `api_url`.
pub const ENV_API_URL: &str = "POEMVIEW_API_URL";
/// Environment variable overriding `web_url`.
pub const ENV_WEB_URL: &str = "POEMVIEW_WEB_URL";

// ---------------------------------------------------------------------------
// ConfigFile — deserialized from TOML (all fields optional)
// ---------------------------------------------------------------------------

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub api_url: Option<String>,
    pub web_url: Option<String>,
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub viewer: ViewerConfigFile,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfigFile {
    pub scroll_step: Option<u16>,
    pub similar_limit: Option<usize>,
    pub preview_lines: Option<usize>,
}

// ---------------------------------------------------------------------------
// Config — resolved (all fields concrete)
// ---------------------------------------------------------------------------

pub struct Config {
    pub api_url: String,
    /// Page URL used when opening a poem in the browser.
    pub web_url: Option<String>,
    pub timeout: Duration,
    pub viewer: ViewerConfig,
}

pub struct ViewerConfig {
    pub scroll_step: u16,
    pub similar_limit: usize,
    pub preview_lines: usize,
}

impl Config {
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            similar_limit: self.viewer.similar_limit,
            preview_lines: self.viewer.preview_lines,
        }
    }
}

impl ConfigFile {
    /// Apply environment overrides. `lookup` is `std::env::var` in production.
    pub fn merge_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            debug!("config: {ENV_API_URL} override api_url={v}");
            self.api_url = Some(v);
        }
        if let Some(v) = lookup(ENV_WEB_URL).filter(|v| !v.is_empty()) {
            debug!("config: {ENV_WEB_URL} override web_url={v}");
            self.web_url = Some(v);
        }
    }

    /// Merge CLI values (overwrites non-None fields).
    pub fn merge_cli(&mut self, api_url: Option<String>, web_url: Option<String>) {
        if let Some(ref v) = api_url {
            debug!("config: CLI override api_url={v}");
            self.api_url = api_url;
        }
        if let Some(ref v) = web_url {
            debug!("config: CLI override web_url={v}");
            self.web_url = web_url;
        }
    }

    /// Resolve to a Config by applying defaults to missing fields.
    pub fn resolve(self) -> Config {
        let config = Config {
            api_url: self.api_url.unwrap_or_else(|| DEFAULT_API_URL.into()),
            web_url: self.web_url,
            timeout: Duration::from_millis(self.timeout_ms.unwrap_or(10_000)),
            viewer: ViewerConfig {
                scroll_step: self.viewer.scroll_step.unwrap_or(3).max(1),
                similar_limit: self.viewer.similar_limit.unwrap_or(3),
                preview_lines: self.viewer.preview_lines.unwrap_or(3),
            },
        };
        info!(
            "config: resolved api_url={}, web_url={}, timeout={}ms, scroll_step={}, \
             similar_limit={}, preview_lines={}",
            config.api_url,
            config.web_url.as_deref().unwrap_or("-"),
            config.timeout.as_millis(),
            config.viewer.scroll_step,
            config.viewer.similar_limit,
            config.viewer.preview_lines,
        );
        config
    }
}

/// Resolve the XDG config path for poemview.
fn config_path() -> Option<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(config_dir.join("poemview").join("config.toml"))
}

/// Load config file. Returns `ConfigFile::default()` if no file exists.
/// Returns an error if the file exists but cannot be parsed.
pub fn load_config() -> anyhow::Result<ConfigFile> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            info!("config: no HOME or XDG_CONFIG_HOME set, using defaults");
            return Ok(ConfigFile::default());
        }
    };
    debug!("config: looking for {}", path.display());
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            info!("config: loaded from {}", path.display());
            let cfg: ConfigFile = toml::from_str(&text)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("config: {} not found, using defaults", path.display());
            Ok(ConfigFile::default())
        }
        Err(e) => Err(anyhow::anyhow!("failed to read {}: {e}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml() {
        let cfg: ConfigFile = toml::from_str("").unwrap();
        let resolved = cfg.resolve();
        assert_eq!(resolved.api_url, DEFAULT_API_URL);
        assert_eq!(resolved.web_url, None);
        assert_eq!(resolved.timeout, Duration::from_secs(10));
        assert_eq!(resolved.viewer.scroll_step, 3);
        assert_eq!(resolved.viewer.similar_limit, 3);
        assert_eq!(resolved.viewer.preview_lines, 3);
    }

    #[test]
    fn partial_toml() {
        let text = r#"
            timeout_ms = 2500
            [viewer]
            similar_limit = 5
        "#;
        let cfg: ConfigFile = toml::from_str(text).unwrap();
        let resolved = cfg.resolve();
        assert_eq!(resolved.timeout, Duration::from_millis(2500));
        assert_eq!(resolved.viewer.similar_limit, 5);
        // Defaults for unspecified fields
        assert_eq!(resolved.api_url, DEFAULT_API_URL);
        assert_eq!(resolved.viewer.preview_lines, 3);
    }

    #[test]
    fn invalid_toml() {
        let text = "this is not valid toml [[[";
        let result = toml::from_str::<ConfigFile>(text);
        assert!(result.is_err());
    }

    #[test]
    fn env_then_cli_overrides() {
        let mut cfg: ConfigFile = toml::from_str(r#"api_url = "http://file.invalid""#).unwrap();
        cfg.merge_env(|key| match key {
            ENV_API_URL => Some("http://env.invalid".into()),
            ENV_WEB_URL => Some("http://web.invalid/".into()),
            _ => None,
        });
        assert_eq!(cfg.api_url.as_deref(), Some("http://env.invalid"));

        cfg.merge_cli(Some("http://cli.invalid".into()), None);
        let resolved = cfg.resolve();
        assert_eq!(resolved.api_url, "http://cli.invalid"); // CLI wins
        assert_eq!(resolved.web_url.as_deref(), Some("http://web.invalid/"));
    }

    #[test]
    fn empty_env_value_is_ignored() {
        let mut cfg = ConfigFile::default();
        cfg.merge_env(|_| Some(String::new()));
        assert_eq!(cfg.resolve().api_url, DEFAULT_API_URL);
    }

    #[test]
    fn controller_settings_follow_viewer_section() {
        let cfg: ConfigFile = toml::from_str("[viewer]\npreview_lines = 1").unwrap();
        let settings = cfg.resolve().controller_settings();
        assert_eq!(settings.preview_lines, 1);
        assert_eq!(settings.similar_limit, 3);
    }
}
