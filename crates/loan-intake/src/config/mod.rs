use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

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
    pub site: SiteConfig,
    pub drafts: DraftConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        // PORT is what hosting platforms inject; APP_PORT wins when both are set.
        let port = env::var("APP_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let static_dir = env::var("APP_STATIC_DIR").unwrap_or_else(|_| "dist".to_string());
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let idle_minutes = env::var("APP_DRAFT_IDLE_MINUTES")
            .unwrap_or_else(|_| DraftConfig::DEFAULT_IDLE_MINUTES.to_string())
            .parse::<u64>()
            .ok()
            .filter(|minutes| *minutes > 0)
            .ok_or(ConfigError::InvalidIdleTimeout)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            site: SiteConfig {
                static_dir: PathBuf::from(static_dir),
            },
            drafts: DraftConfig {
                idle_timeout: Duration::from_secs(idle_minutes * 60),
            },
            telemetry: TelemetryConfig { log_level },
        })
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

/// Location of the compiled single-page site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub static_dir: PathBuf,
}

impl SiteConfig {
    /// Entry document returned for every unmatched route.
    pub fn index_file(&self) -> PathBuf {
        self.static_dir.join("index.html")
    }
}

/// Lifetime of in-progress drafts held by the server.
#[derive(Debug, Clone)]
pub struct DraftConfig {
    /// Drafts untouched for this long are dropped.
    pub idle_timeout: Duration,
}

impl DraftConfig {
    pub const DEFAULT_IDLE_MINUTES: u64 = 120;
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(Self::DEFAULT_IDLE_MINUTES * 60),
        }
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidIdleTimeout,
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT/PORT must be a valid u16"),
            ConfigError::InvalidIdleTimeout => {
                write!(f, "APP_DRAFT_IDLE_MINUTES must be a positive number of minutes")
            }
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidIdleTimeout => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
