use crate::auth::FirebaseAuthConfig;
use crate::history::FirebaseStoreConfig;
use crate::scoring::DEFAULT_SEED;
use crate::suggestions::{SuggestionConfig, SuggestionProfile};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub suggestions: SuggestionConfig,
    pub storage: StorageConfig,
    pub auth: Option<FirebaseAuthConfig>,
    pub model: ModelConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            suggestions: load_suggestions()?,
            storage: load_storage()?,
            auth: optional_var("FIREBASE_API_KEY").map(|api_key| {
                let mut auth = FirebaseAuthConfig::new(api_key);
                if let Some(base_url) = optional_var("FIREBASE_AUTH_URL") {
                    auth.base_url = base_url;
                }
                auth
            }),
            model: ModelConfig {
                path: optional_var("SLEEP_SMART_MODEL_PATH").map(PathBuf::from),
                seed: parse_var("SLEEP_SMART_TRAINING_SEED")?.unwrap_or(DEFAULT_SEED),
            },
        })
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    optional_var(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| ConfigError::InvalidValue { key, value: raw })
        })
        .transpose()
}

fn load_suggestions() -> Result<SuggestionConfig, ConfigError> {
    let profile = match optional_var("SLEEP_SMART_PROFILE") {
        Some(raw) => raw
            .parse::<SuggestionProfile>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "SLEEP_SMART_PROFILE",
                value: raw,
            })?,
        None => SuggestionProfile::default(),
    };

    let mut config = SuggestionConfig::for_profile(profile);
    if let Some(cups) = parse_var::<f64>("SLEEP_SMART_CAFFEINE_LIMIT")? {
        config = config.with_caffeine_limit(cups);
    }
    if let Some(level) = parse_var::<u8>("SLEEP_SMART_STRESS_LIMIT")? {
        config = config.with_stress_limit(level);
    }
    Ok(config)
}

fn load_storage() -> Result<StorageConfig, ConfigError> {
    let backend = optional_var("SLEEP_SMART_STORE").unwrap_or_else(|| "memory".to_string());
    match backend.to_ascii_lowercase().as_str() {
        "memory" => Ok(StorageConfig::Memory),
        "file" => Ok(StorageConfig::File {
            data_dir: optional_var("SLEEP_SMART_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
        }),
        "firebase" => {
            let database_url = optional_var("FIREBASE_DATABASE_URL")
                .ok_or(ConfigError::MissingVar("FIREBASE_DATABASE_URL"))?;
            Ok(StorageConfig::Firebase(FirebaseStoreConfig::new(
                database_url,
            )))
        }
        _ => Err(ConfigError::InvalidValue {
            key: "SLEEP_SMART_STORE",
            value: backend,
        }),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where sleep history is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    File { data_dir: PathBuf },
    Firebase(FirebaseStoreConfig),
}

impl StorageConfig {
    pub fn label(&self) -> &'static str {
        match self {
            StorageConfig::Memory => "memory",
            StorageConfig::File { .. } => "file",
            StorageConfig::Firebase(_) => "firebase",
        }
    }
}

/// Source of the scoring model: a saved artifact, or a fresh synthetic fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub path: Option<PathBuf>,
    pub seed: u64,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { key: &'static str, value: String },
    MissingVar(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{key} has an unsupported value '{value}'")
            }
            ConfigError::MissingVar(key) => write!(f, "{key} must be set"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidValue { .. }
            | ConfigError::MissingVar(_) => None,
        }
    }
}
