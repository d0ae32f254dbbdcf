//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Secrets (session signing key, provider client secrets) come from env vars
//! or `*_file` paths, never from the TOML directly.

use common::Secret;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub hubspot: HubspotConfig,
    pub slack: SlackConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub tokens: TokensConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Production mode: session cookie is `Secure` and `SameSite=None`.
    /// Forced on by `APP_ENV=production`.
    #[serde(default)]
    pub production: bool,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// Session cookie settings
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_ttl_days")]
    pub ttl_days: i64,
    #[serde(skip)]
    pub secret: Secret<String>,
    /// Path to a file holding the signing secret (alternative to SESSION_SECRET)
    #[serde(default)]
    pub secret_file: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_days: default_ttl_days(),
            secret: Secret::default(),
            secret_file: None,
        }
    }
}

/// CRM OAuth app settings
#[derive(Debug, Deserialize)]
pub struct HubspotConfig {
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(skip)]
    pub client_secret: Secret<String>,
    /// Path to a file holding the client secret (alternative to HUBSPOT_CLIENT_SECRET)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    #[serde(default)]
    pub authorize_url: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
}

/// Messaging OAuth app settings
#[derive(Debug, Deserialize)]
pub struct SlackConfig {
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(skip)]
    pub client_secret: Secret<String>,
    /// Path to a file holding the client secret (alternative to SLACK_CLIENT_SECRET)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    #[serde(default)]
    pub authorize_url: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    File,
    Memory,
}

/// Credential store settings
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_store_path(),
        }
    }
}

/// Token refresh settings
#[derive(Debug, Deserialize)]
pub struct TokensConfig {
    #[serde(default = "default_refresh_threshold")]
    pub refresh_threshold_secs: i64,
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            refresh_threshold_secs: default_refresh_threshold(),
        }
    }
}

fn default_max_connections() -> usize {
    1000
}

fn default_cookie_name() -> String {
    "session_token".into()
}

/// Longest accepted session window, in days.
pub const MAX_TTL_DAYS: i64 = 3650;

/// Longest accepted refresh threshold, in seconds.
pub const MAX_REFRESH_THRESHOLD_SECS: i64 = 86_400;

fn default_ttl_days() -> i64 {
    session::DEFAULT_VALIDITY_DAYS
}

fn default_backend() -> StoreBackend {
    StoreBackend::File
}

fn default_store_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_refresh_threshold() -> i64 {
    token_lifecycle::DEFAULT_REFRESH_THRESHOLD_SECS
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Each secret resolves from its env var first, then its `*_file` path.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if std::env::var("APP_ENV").is_ok_and(|env| env == "production") {
            config.server.production = true;
        }

        validate_redirect_uri("hubspot", &config.hubspot.redirect_uri)?;
        validate_redirect_uri("slack", &config.slack.redirect_uri)?;

        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        if !(1..=MAX_TTL_DAYS).contains(&config.session.ttl_days) {
            return Err(common::Error::Config(format!(
                "session ttl_days must be between 1 and {MAX_TTL_DAYS}"
            )));
        }

        if config.session.cookie_name.trim().is_empty() {
            return Err(common::Error::Config(
                "session cookie_name must not be empty".into(),
            ));
        }

        if !(0..=MAX_REFRESH_THRESHOLD_SECS).contains(&config.tokens.refresh_threshold_secs) {
            return Err(common::Error::Config(format!(
                "refresh_threshold_secs must be between 0 and {MAX_REFRESH_THRESHOLD_SECS}"
            )));
        }

        config.session.secret =
            resolve_secret("SESSION_SECRET", config.session.secret_file.as_deref())?;
        config.hubspot.client_secret = resolve_secret(
            "HUBSPOT_CLIENT_SECRET",
            config.hubspot.client_secret_file.as_deref(),
        )?;
        config.slack.client_secret = resolve_secret(
            "SLACK_CLIENT_SECRET",
            config.slack.client_secret_file.as_deref(),
        )?;

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("connect-gateway.toml")
    }
}

fn validate_redirect_uri(provider: &str, uri: &str) -> common::Result<()> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return Ok(());
    }
    Err(common::Error::Config(format!(
        "{provider} redirect_uri must start with http:// or https://, got: {uri}"
    )))
}

/// Env var takes precedence over file. A blank value is an error either way.
fn resolve_secret(env_key: &str, file: Option<&Path>) -> common::Result<Secret<String>> {
    let value = if let Ok(value) = std::env::var(env_key) {
        value
    } else if let Some(path) = file {
        std::fs::read_to_string(path)
            .map_err(|e| {
                common::Error::Config(format!(
                    "failed to read secret file {} for {env_key}: {e}",
                    path.display()
                ))
            })?
            .trim()
            .to_owned()
    } else {
        return Err(common::Error::Config(format!(
            "{env_key} is not set and no secret file is configured"
        )));
    };

    let secret = Secret::new(value);
    if secret.is_blank() {
        return Err(common::Error::Config(format!("{env_key} is empty")));
    }
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const SECRET_VARS: [&str; 3] = ["SESSION_SECRET", "HUBSPOT_CLIENT_SECRET", "SLACK_CLIENT_SECRET"];

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    /// SAFETY: Callers must hold ENV_MUTEX.
    unsafe fn set_all_secrets() {
        for key in SECRET_VARS {
            unsafe { set_env(key, &format!("{}-value", key.to_lowercase())) };
        }
        unsafe { remove_env("APP_ENV") };
    }

    /// SAFETY: Callers must hold ENV_MUTEX.
    unsafe fn clear_all() {
        for key in SECRET_VARS {
            unsafe { remove_env(key) };
        }
        unsafe { remove_env("APP_ENV") };
    }

    fn valid_toml() -> &'static str {
        r#"
[server]
listen_addr = "127.0.0.1:3000"

[hubspot]
client_id = "hs-client"
redirect_uri = "https://app.example.com/api/hubspot/callback"

[slack]
client_id = "slack-client"
redirect_uri = "https://app.example.com/api/slack/callback"
"#
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_valid_config_with_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_all_secrets() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.listen_addr.port(), 3000);
        assert!(!config.server.production);
        assert_eq!(config.server.max_connections, 1000);
        assert_eq!(config.session.cookie_name, "session_token");
        assert_eq!(config.session.ttl_days, 30);
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.store.path, PathBuf::from("credentials.json"));
        assert_eq!(config.tokens.refresh_threshold_secs, 60);
        assert_eq!(config.session.secret.expose(), "session_secret-value");
        assert_eq!(
            config.hubspot.client_secret.expose(),
            "hubspot_client_secret-value"
        );
        assert!(config.hubspot.token_url.is_none());

        unsafe { clear_all() };
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_full_config_overrides() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_all_secrets() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[server]
listen_addr = "0.0.0.0:8080"
production = true
max_connections = 50

[session]
cookie_name = "gw_session"
ttl_days = 7

[hubspot]
client_id = "hs"
redirect_uri = "http://localhost:8080/hubspot/callback"
token_url = "http://127.0.0.1:9999/oauth/v1/token"
api_base = "http://127.0.0.1:9999"

[slack]
client_id = "sl"
redirect_uri = "http://localhost:8080/slack/callback"

[store]
backend = "memory"

[tokens]
refresh_threshold_secs = 300
"#,
        );

        let config = Config::load(&path).unwrap();
        assert!(config.server.production);
        assert_eq!(config.server.max_connections, 50);
        assert_eq!(config.session.cookie_name, "gw_session");
        assert_eq!(config.session.ttl_days, 7);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.tokens.refresh_threshold_secs, 300);
        assert_eq!(
            config.hubspot.token_url.as_deref(),
            Some("http://127.0.0.1:9999/oauth/v1/token")
        );

        unsafe { clear_all() };
    }

    #[test]
    fn test_app_env_forces_production() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_all_secrets() };
        unsafe { set_env("APP_ENV", "production") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        assert!(Config::load(&path).unwrap().server.production);

        unsafe { clear_all() };
    }

    #[test]
    fn test_missing_secret_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_all_secrets() };
        unsafe { remove_env("SLACK_CLIENT_SECRET") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("SLACK_CLIENT_SECRET"), "{err}");

        unsafe { clear_all() };
    }

    #[test]
    fn test_blank_secret_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_all_secrets() };
        unsafe { set_env("SESSION_SECRET", "   ") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("SESSION_SECRET is empty"), "{err}");

        unsafe { clear_all() };
    }

    #[test]
    fn test_secret_from_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_all_secrets() };
        unsafe { remove_env("SESSION_SECRET") };
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("session.key");
        std::fs::write(&secret_path, "from-file\n").unwrap();
        let toml = format!(
            "{}\n[session]\nsecret_file = {:?}\n",
            valid_toml(),
            secret_path.display().to_string()
        );
        let path = write_config(&dir, &toml);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.session.secret.expose(), "from-file");

        unsafe { clear_all() };
    }

    #[test]
    fn test_env_secret_beats_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_all_secrets() };
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("session.key");
        std::fs::write(&secret_path, "from-file").unwrap();
        let toml = format!(
            "{}\n[session]\nsecret_file = {:?}\n",
            valid_toml(),
            secret_path.display().to_string()
        );
        let path = write_config(&dir, &toml);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.session.secret.expose(), "session_secret-value");

        unsafe { clear_all() };
    }

    #[test]
    fn test_non_http_redirect_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_all_secrets() };
        let dir = tempfile::tempdir().unwrap();
        let toml = valid_toml().replace(
            "https://app.example.com/api/slack/callback",
            "ftp://app.example.com/cb",
        );
        let path = write_config(&dir, &toml);

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("slack redirect_uri"), "{err}");

        unsafe { clear_all() };
    }

    #[test]
    fn test_zero_ttl_and_connections_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_all_secrets() };
        let dir = tempfile::tempdir().unwrap();

        let zero_ttl = format!("{}\n[session]\nttl_days = 0\n", valid_toml());
        let path = write_config(&dir, &zero_ttl);
        assert!(Config::load(&path).is_err());

        let zero_conns = valid_toml().replace(
            "listen_addr = \"127.0.0.1:3000\"",
            "listen_addr = \"127.0.0.1:3000\"\nmax_connections = 0",
        );
        let path = write_config(&dir, &zero_conns);
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("max_connections"), "{err}");

        unsafe { clear_all() };
    }

    #[test]
    fn test_oversized_ttl_and_threshold_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_all_secrets() };
        let dir = tempfile::tempdir().unwrap();

        let huge_ttl = format!("{}\n[session]\nttl_days = 200000000\n", valid_toml());
        let path = write_config(&dir, &huge_ttl);
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("ttl_days"), "{err}");

        let max_ttl = format!("{}\n[session]\nttl_days = {MAX_TTL_DAYS}\n", valid_toml());
        let path = write_config(&dir, &max_ttl);
        assert_eq!(Config::load(&path).unwrap().session.ttl_days, MAX_TTL_DAYS);

        let huge_threshold = format!(
            "{}\n[tokens]\nrefresh_threshold_secs = 9223372036854775807\n",
            valid_toml()
        );
        let path = write_config(&dir, &huge_threshold);
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("refresh_threshold_secs"), "{err}");

        unsafe { clear_all() };
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let toml = format!("{}\n[store]\nbackend = \"firestore\"\n", valid_toml());
        let path = write_config(&dir, &toml);
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_resolve_path_cli_takes_precedence() {
        let path = Config::resolve_path(Some("/custom/config.toml"));
        assert_eq!(path, PathBuf::from("/custom/config.toml"));
    }

    #[test]
    fn test_resolve_path_env_then_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/gateway.toml") };
        assert_eq!(
            Config::resolve_path(None),
            PathBuf::from("/env/gateway.toml")
        );
        unsafe { remove_env("CONFIG_PATH") };
        assert_eq!(
            Config::resolve_path(None),
            PathBuf::from("connect-gateway.toml")
        );
    }
}
