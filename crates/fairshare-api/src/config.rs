use config::{Config as ConfigLoader, ConfigError, File};
use fairshare_assistant::AssistantConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub mongodb: MongoDbConfig,
    pub assistant: AssistantSettings,
    pub email: EmailConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub openai_assistant_id: String,
    #[serde(default)]
    pub backend_key: Option<String>,
    #[serde(default)]
    pub email_user: Option<String>,
    #[serde(default)]
    pub email_pass: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whole-request deadline; must outlive the assistant run timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbConfig {
    pub database: String,
    pub pool_size: u32,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantSettings {
    #[serde(default)]
    pub base_url: Option<String>,
    pub poll_interval_ms: u64,
    pub run_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl AssistantSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_name: String,
    /// Falls back to `EMAIL_USER` when empty
    #[serde(default)]
    pub from_address: String,
    /// Falls back to `EMAIL_USER` when empty
    #[serde(default)]
    pub admin_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Environment variable -> config key. Later entries win.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("SERVER_REQUEST_TIMEOUT_SECS", "server.request_timeout_secs"),
    ("MONGODB_DATABASE", "mongodb.database"),
    ("MONGODB_POOL_SIZE", "mongodb.pool_size"),
    ("MONGODB_TIMEOUT_MS", "mongodb.timeout_ms"),
    ("ASSISTANT_BASE_URL", "assistant.base_url"),
    ("ASSISTANT_POLL_INTERVAL_MS", "assistant.poll_interval_ms"),
    ("ASSISTANT_RUN_TIMEOUT_SECS", "assistant.run_timeout_secs"),
    ("ASSISTANT_REQUEST_TIMEOUT_SECS", "assistant.request_timeout_secs"),
    ("EMAIL_ENABLED", "email.enabled"),
    ("EMAIL_SMTP_HOST", "email.smtp_host"),
    ("EMAIL_SMTP_PORT", "email.smtp_port"),
    ("EMAIL_FROM_NAME", "email.from_name"),
    ("EMAIL_FROM_ADDRESS", "email.from_address"),
    ("EMAIL_ADMIN_ADDRESS", "email.admin_address"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
    ("PORT", "server.port"),
];

fn default_request_timeout_secs() -> u64 {
    180
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required_secret(name: &str) -> Result<String, ConfigError> {
    env_secret(name)
        .ok_or_else(|| ConfigError::Message(format!("{} environment variable is required", name)))
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables listed in `ENV_OVERRIDES` (SERVER_, MONGODB_,
    ///    ASSISTANT_, EMAIL_, LOG_ prefixes, plus PORT)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let mut builder = ConfigLoader::builder()
            // 1. Load default config
            .add_source(File::with_name("config/default").required(false))
            // 2. Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false));

        // 3. Environment variables override everything
        for (var, key) in ENV_OVERRIDES {
            if let Some(value) = env_secret(var) {
                builder = builder.set_override(*key, value)?;
            }
        }

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.mongodb_uri = required_secret("MONGODB_URI")?;
        cfg.openai_api_key = required_secret("OPENAI_API_KEY")?;
        cfg.openai_assistant_id = required_secret("OPENAI_ASSISTANT_ID")?;
        cfg.backend_key = env_secret("BACKEND_KEY");
        cfg.email_user = env_secret("EMAIL_USER");
        cfg.email_pass = env_secret("EMAIL_PASS");

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Connection settings for the assistant HTTP client
    pub fn assistant_client(&self) -> AssistantConfig {
        let client = AssistantConfig::new(self.openai_api_key.clone())
            .with_request_timeout(self.assistant.request_timeout());
        match &self.assistant.base_url {
            Some(base_url) => client.with_base_url(base_url.clone()),
            None => client,
        }
    }

    /// Sender address for outgoing mail
    pub fn mail_from(&self) -> Option<&str> {
        non_empty(&self.email.from_address).or(self.email_user.as_deref())
    }

    /// Where contact notifications go
    pub fn mail_admin(&self) -> Option<&str> {
        non_empty(&self.email.admin_address).or(self.email_user.as_deref())
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 5000

        [cors]
        enabled = true
        origins = ["http://localhost:3000"]

        [mongodb]
        database = "fairshare"
        pool_size = 5
        timeout_ms = 3000

        [assistant]
        poll_interval_ms = 1000
        run_timeout_secs = 120
        request_timeout_secs = 30

        [email]
        enabled = false
        smtp_host = "smtp.zoho.com"
        smtp_port = 465
        from_name = "FairShare Tax & Bookkeeping"
        admin_address = "admin@example.com"

        [logging]
        level = "debug"
        format = "json"
    "#;

    #[test]
    fn test_config_structure() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.request_timeout_secs, 180);
        assert_eq!(config.mongodb.database, "fairshare");
        assert_eq!(config.assistant.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.assistant.run_timeout(), Duration::from_secs(120));
        assert!(config.assistant.base_url.is_none());
        assert!(config.backend_key.is_none());
    }

    #[test]
    fn test_mail_addresses_fall_back_to_email_user() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.mail_admin(), Some("admin@example.com"));
        assert_eq!(config.mail_from(), None);

        config.email_user = Some("team@example.com".to_string());
        assert_eq!(config.mail_from(), Some("team@example.com"));
    }

    #[test]
    fn test_assistant_client_settings() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.openai_api_key = "sk-test".to_string();

        let client = config.assistant_client();
        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.base_url(), fairshare_assistant::config::DEFAULT_BASE_URL);
        assert_eq!(client.request_timeout, Duration::from_secs(30));

        config.assistant.base_url = Some("http://localhost:8080/v1".to_string());
        assert_eq!(config.assistant_client().base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_default_toml_parses() {
        let config = Config::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml")).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.mongodb.database, "fairshare");
    }
}
