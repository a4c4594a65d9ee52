use std::{collections::HashMap, fs, path::Path, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use tracing::warn;
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub session_file: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080/api".into(),
            session_file: None,
            request_timeout_secs: 15,
        }
    }
}

impl ClientSettings {
    pub fn api_base_url(&self) -> Result<Url> {
        Url::parse(self.api_base_url.trim())
            .with_context(|| format!("invalid api base url '{}'", self.api_base_url))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(DEFAULT_SETTINGS_FILE)
}

/// Defaults, then `path` if it parses as a flat TOML table, then environment.
pub fn load_settings_from(path: impl AsRef<Path>) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path.as_ref()) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => apply_file_values(&mut settings, &file_cfg),
            Err(err) => warn!(
                "config: ignoring unparseable settings file path={} error={err}",
                path.as_ref().display()
            ),
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file_values(settings: &mut ClientSettings, file_cfg: &HashMap<String, toml::Value>) {
    if let Some(v) = file_cfg.get("api_base_url").and_then(toml::Value::as_str) {
        settings.api_base_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("session_file").and_then(toml::Value::as_str) {
        settings.session_file = Some(PathBuf::from(v));
    }
    if let Some(v) = file_cfg
        .get("request_timeout_secs")
        .and_then(toml::Value::as_integer)
    {
        if let Ok(parsed) = u64::try_from(v) {
            settings.request_timeout_secs = parsed;
        }
    }
}

fn apply_env_overrides(settings: &mut ClientSettings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("CLINIC_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("CLINIC_SESSION_FILE") {
        settings.session_file = Some(PathBuf::from(v));
    }
    if let Some(v) = env("APP__SESSION_FILE") {
        settings.session_file = Some(PathBuf::from(v));
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("clinic_client_settings_{suffix}.toml"));
        fs::write(
            &path,
            "api_base_url = \"https://clinic.test/api\"\nsession_file = \"./data/session.json\"\nrequest_timeout_secs = 3\n",
        )
        .expect("write settings");

        let mut settings = ClientSettings::default();
        let raw = fs::read_to_string(&path).expect("read settings");
        let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(&raw).expect("parse");
        apply_file_values(&mut settings, &file_cfg);

        assert_eq!(settings.api_base_url, "https://clinic.test/api");
        assert_eq!(
            settings.session_file,
            Some(PathBuf::from("./data/session.json"))
        );
        assert_eq!(settings.request_timeout(), Duration::from_secs(3));

        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn prefixed_env_wins_over_short_env() {
        let mut settings = ClientSettings::default();
        apply_env_overrides(&mut settings, |key| match key {
            "CLINIC_API_URL" => Some("https://short.test".to_string()),
            "APP__API_BASE_URL" => Some("https://prefixed.test".to_string()),
            "APP__REQUEST_TIMEOUT_SECS" => Some("not-a-number".to_string()),
            _ => None,
        });

        assert_eq!(settings.api_base_url, "https://prefixed.test");
        assert_eq!(settings.request_timeout_secs, 15);
        assert_eq!(settings.session_file, None);
    }

    #[test]
    fn missing_file_keeps_defaults() {
        let settings = load_settings_from("/definitely/not/here/client.toml");
        assert_eq!(
            settings.request_timeout_secs,
            ClientSettings::default().request_timeout_secs
        );
    }

    #[test]
    fn unparseable_file_falls_back_to_defaults() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("clinic_client_settings_bad_{suffix}.toml"));
        fs::write(&path, "request_timeout_secs = [unterminated").expect("write settings");

        let settings = load_settings_from(&path);

        assert_eq!(
            settings.request_timeout_secs,
            ClientSettings::default().request_timeout_secs
        );
        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let settings = ClientSettings {
            api_base_url: "not a url".to_string(),
            ..ClientSettings::default()
        };
        assert!(settings.api_base_url().is_err());
    }
}
