use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    /// Admin gate credentials and session settings
    pub admin: AdminConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
    /// M-Pesa (Daraja) STK push configuration
    #[serde(default)]
    pub mpesa: MpesaConfig,
    /// PayPal orders API configuration
    #[serde(default)]
    pub paypal: PaypalConfig,
    /// Text generation provider for chat, meditation and insights
    #[serde(default)]
    pub text_generation: TextGenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Requests per minute per client IP. Zero disables rate limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Key rate limits on the first `X-Forwarded-For` hop. Only enable this
    /// behind a proxy that overwrites the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Admin login email. Empty disables admin login.
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,

    /// HS256 signing secret for admin session tokens (at least 32 bytes)
    #[serde(default)]
    pub session_secret: String,

    #[serde(default = "default_session_lifetime")]
    pub session_lifetime_secs: i64,

    /// Leeway in seconds for clock skew tolerance
    #[serde(default = "default_session_leeway")]
    pub leeway_secs: u64,
}

impl AdminConfig {
    pub fn credentials_configured(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsConfig {
    /// Provider-initiated pending rows older than this become expired
    #[serde(default = "default_pending_expiry_hours")]
    pub pending_expiry_hours: i64,

    /// Timeout for outbound provider requests
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            pending_expiry_hours: default_pending_expiry_hours(),
            provider_timeout_secs: default_provider_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MpesaConfig {
    /// sandbox or live
    #[serde(default = "default_provider_environment")]
    pub environment: String,

    #[serde(default)]
    pub consumer_key: String,

    #[serde(default)]
    pub consumer_secret: String,

    #[serde(default)]
    pub shortcode: String,

    #[serde(default)]
    pub passkey: String,

    /// Public base URL the provider posts callbacks to
    #[serde(default)]
    pub callback_base_url: String,

    /// Shared token appended to the callback URL and checked on receipt
    #[serde(default)]
    pub callback_token: String,
}

impl Default for MpesaConfig {
    fn default() -> Self {
        Self {
            environment: default_provider_environment(),
            consumer_key: String::new(),
            consumer_secret: String::new(),
            shortcode: String::new(),
            passkey: String::new(),
            callback_base_url: String::new(),
            callback_token: String::new(),
        }
    }
}

impl MpesaConfig {
    pub fn is_configured(&self) -> bool {
        !self.consumer_key.is_empty()
            && !self.consumer_secret.is_empty()
            && !self.shortcode.is_empty()
            && !self.passkey.is_empty()
    }

    pub fn api_base_url(&self) -> &'static str {
        if self.environment == "live" {
            "https://api.safaricom.co.ke"
        } else {
            "https://sandbox.safaricom.co.ke"
        }
    }

    /// Full callback URL registered with the STK push, carrying the callback token.
    pub fn callback_url(&self) -> String {
        format!(
            "{}/api/mpesa/callback?token={}",
            self.callback_base_url.trim_end_matches('/'),
            self.callback_token
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaypalConfig {
    /// sandbox or live
    #[serde(default = "default_provider_environment")]
    pub environment: String,

    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,
}

impl Default for PaypalConfig {
    fn default() -> Self {
        Self {
            environment: default_provider_environment(),
            client_id: String::new(),
            client_secret: String::new(),
        }
    }
}

impl PaypalConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    pub fn api_base_url(&self) -> &'static str {
        if self.environment == "live" {
            "https://api-m.paypal.com"
        } else {
            "https://api-m.sandbox.paypal.com"
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextGenerationConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_text_model")]
    pub model: String,

    /// OpenAI-compatible API base URL
    #[serde(default = "default_text_base_url")]
    pub base_url: String,

    #[serde(default = "default_text_timeout")]
    pub timeout_secs: u64,
}

impl Default for TextGenerationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            model: default_text_model(),
            base_url: default_text_base_url(),
            timeout_secs: default_text_timeout(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    60
}
fn default_session_lifetime() -> i64 {
    28800 // 8 hours
}
fn default_session_leeway() -> u64 {
    30
}
fn default_pending_expiry_hours() -> i64 {
    24
}
fn default_provider_timeout() -> u64 {
    15
}
fn default_provider_environment() -> String {
    "sandbox".to_string()
}
fn default_text_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_text_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_text_timeout() -> u64 {
    30
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with TC__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("TC")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on config files.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 60

            [admin]
            email = ""
            password = ""
            session_secret = ""
            session_lifetime_secs = 28800
            leeway_secs = 30

            [payments]
            pending_expiry_hours = 24
            provider_timeout_secs = 15
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "TC__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.admin.credentials_configured() && self.admin.session_secret.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "TC__ADMIN__SESSION_SECRET must be set when admin credentials are configured"
                    .to_string(),
            ));
        }

        if self.admin.session_lifetime_secs <= 0 {
            return Err(ConfigValidationError::InvalidValue(
                "admin.session_lifetime_secs must be positive".to_string(),
            ));
        }

        if self.payments.pending_expiry_hours <= 0 {
            return Err(ConfigValidationError::InvalidValue(
                "payments.pending_expiry_hours must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
