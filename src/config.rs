use anyhow::Context;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub session_path: PathBuf,
}

impl Config {
    /// Reads the environment; `api_url` takes precedence over `BACKEND_API_URL`.
    pub fn from_env(api_url: Option<String>) -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| match key {
            "BACKEND_API_URL" if api_url.is_some() => api_url.clone(),
            _ => env::var(key).ok(),
        })
    }

    /// Resolves configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("BACKEND_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .context("BACKEND_API_URL must be set to the backend base URL")?;

        let request_timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("REQUEST_TIMEOUT_SECS is not a number: '{}'", raw))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
        }

        let session_path = lookup("SESSION_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_session_path);

        Ok(Config {
            api_url,
            request_timeout_secs,
            session_path,
        })
    }
}

fn default_session_path() -> PathBuf {
    match home::home_dir() {
        Some(home) => home.join(".zikhron").join("session.json"),
        None => PathBuf::from(".zikhron-session.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[(
            "BACKEND_API_URL",
            "https://api.example.test",
        )]))
        .unwrap();
        assert_eq!(config.api_url, "https://api.example.test");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.session_path.ends_with("session.json"));
    }

    #[test]
    fn test_missing_api_url_is_an_error() {
        assert!(Config::from_lookup(lookup_from(&[])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("BACKEND_API_URL", "  ")])).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("BACKEND_API_URL", "http://localhost:4040"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("SESSION_FILE", "/tmp/zikhron/session.json"),
        ]))
        .unwrap();
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.session_path, PathBuf::from("/tmp/zikhron/session.json"));
    }

    #[test]
    fn test_bad_timeout() {
        for raw in ["soon", "0", "-1"] {
            let result = Config::from_lookup(lookup_from(&[
                ("BACKEND_API_URL", "http://localhost:4040"),
                ("REQUEST_TIMEOUT_SECS", raw),
            ]));
            assert!(result.is_err(), "{}", raw);
        }
    }
}
