use std::{collections::HashMap, fs, io, path::Path, time::Duration};

use anyhow::{bail, Context};
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "wizard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080/api".into(),
            api_token: None,
            request_timeout_secs: 30,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

pub fn load_settings(config_path: &Path) -> anyhow::Result<Settings> {
    let file_cfg = read_config_file(config_path)?;
    resolve_settings(file_cfg.as_ref(), |key| std::env::var(key).ok())
}

/// A missing file is not an error; an unreadable or malformed one is.
fn read_config_file(config_path: &Path) -> anyhow::Result<Option<HashMap<String, String>>> {
    let raw = match fs::read_to_string(config_path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read '{}'", config_path.display()))
        }
    };
    let file_cfg = toml::from_str::<HashMap<String, String>>(&raw)
        .with_context(|| format!("failed to parse '{}'", config_path.display()))?;
    Ok(Some(file_cfg))
}

/// Defaults, then the config file, then the environment.
fn resolve_settings(
    file_cfg: Option<&HashMap<String, String>>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(file_cfg) = file_cfg {
        if let Some(v) = file_cfg.get("api_url") {
            settings.api_url = v.clone();
        }
        if let Some(v) = file_cfg.get("api_token") {
            settings.api_token = Some(v.clone());
        }
        if let Some(v) = file_cfg.get("request_timeout_secs") {
            settings.request_timeout_secs = parse_timeout(v)?;
        }
        if let Some(v) = file_cfg.get("log_filter") {
            settings.log_filter = v.clone();
        }
    }

    if let Some(v) = env("WIZARD_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("APP__API_TOKEN") {
        settings.api_token = Some(v);
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = parse_timeout(&v)?;
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    settings.api_token = settings
        .api_token
        .filter(|token| !token.trim().is_empty());
    settings.api_url = normalize_api_url(&settings.api_url)?;
    Ok(settings)
}

fn parse_timeout(raw: &str) -> anyhow::Result<u64> {
    raw.trim()
        .parse::<u64>()
        .with_context(|| format!("request timeout must be whole seconds, got '{raw}'"))
}

pub fn normalize_api_url(raw_api_url: &str) -> anyhow::Result<String> {
    let raw_api_url = raw_api_url.trim();
    if raw_api_url.is_empty() {
        return Ok(Settings::default().api_url);
    }

    let parsed =
        Url::parse(raw_api_url).with_context(|| format!("invalid api url '{raw_api_url}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("api url '{raw_api_url}' must use http or https");
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_file_or_env() {
        assert_eq!(resolve_settings(None, no_env).expect("settings"), Settings::default());
    }

    #[test]
    fn env_overrides_file() {
        let file_cfg = HashMap::from([
            ("api_url".to_string(), "http://file.local/api/".to_string()),
            ("request_timeout_secs".to_string(), "5".to_string()),
            ("log_filter".to_string(), "debug".to_string()),
        ]);
        let settings = resolve_settings(Some(&file_cfg), |key| match key {
            "WIZARD_API_URL" => Some("http://legacy.local".into()),
            "APP__API_URL" => Some("https://env.local/v1/".into()),
            "APP__API_TOKEN" => Some("   ".into()),
            _ => None,
        })
        .expect("settings");

        assert_eq!(settings.api_url, "https://env.local/v1");
        assert_eq!(settings.api_token, None);
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(settings.log_filter, "debug");
    }

    #[test]
    fn rejects_bad_urls_and_timeouts() {
        assert!(normalize_api_url("ftp://files.local").is_err());
        assert!(normalize_api_url("not a url").is_err());
        assert!(resolve_settings(None, |key| {
            (key == "APP__REQUEST_TIMEOUT_SECS").then(|| "soon".to_string())
        })
        .is_err());
    }

    #[test]
    fn missing_config_file_is_skipped_but_unreadable_one_fails() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let temp_root = env::temp_dir().join(format!("wizard_cli_config_test_{suffix}"));
        fs::create_dir_all(&temp_root).expect("temp root");

        assert_eq!(
            read_config_file(&temp_root.join("absent.toml")).expect("missing is fine"),
            None
        );

        // A directory exists but cannot be read as a file.
        assert!(read_config_file(&temp_root).is_err());

        let file = temp_root.join("wizard.toml");
        fs::write(&file, "api_url = \"http://file.local\"\n").expect("write");
        assert_eq!(
            read_config_file(&file)
                .expect("read")
                .and_then(|cfg| cfg.get("api_url").cloned()),
            Some("http://file.local".to_string())
        );

        fs::write(&file, "api_url = [").expect("write");
        assert!(read_config_file(&file).is_err());

        fs::remove_dir_all(temp_root).expect("cleanup");
    }

    #[test]
    fn zero_timeout_disables_it() {
        let settings = Settings {
            request_timeout_secs: 0,
            ..Settings::default()
        };
        assert_eq!(settings.request_timeout(), None);
    }
}
