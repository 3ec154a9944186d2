//! Shared service configuration, populated once from the environment at startup
//! and handed to every component that needs it.
//!
//! Every variable is optional. Numeric and enum values that fail to parse fall
//! back to their documented default instead of aborting startup, see [`Lenient`].

use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use envconfig::Envconfig;
use tracing::Level;

pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_POOL_MIN: u32 = 2;
pub const DEFAULT_DB_POOL_MAX: u32 = 10;
pub const DEFAULT_REDIS_PORT: u16 = 6379;
pub const DEFAULT_REDIS_DB: u32 = 0;
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 100;
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_HEALTH_INTERVAL_MS: u64 = 30000;

/// A value that never fails to parse: garbage input is kept as `None` so the
/// caller can substitute its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lenient<T>(Option<T>);

impl<T> Lenient<T> {
    pub fn unwrap_or(self, default: T) -> T {
        self.0.unwrap_or(default)
    }

    pub fn get(self) -> Option<T> {
        self.0
    }
}

impl<T: FromStr> FromStr for Lenient<T> {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Lenient(s.trim().parse().ok()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_ref() {
            "json" => Ok(LogFormat::Json),
            "text" | "pretty" | "compact" => Ok(LogFormat::Text),
            _ => Err(format!("Unknown log format: {s}, must be json or text")),
        }
    }
}

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub host: Lenient<IpAddr>,

    /// Left unset here: each service has its own default port.
    #[envconfig(from = "PORT")]
    pub port: Option<Lenient<u16>>,

    #[envconfig(from = "APP_ENV", default = "development")]
    pub environment: String,

    #[envconfig(from = "SHUTDOWN_TIMEOUT_SECS", default = "30")]
    pub shutdown_timeout_secs: Lenient<u64>,

    #[envconfig(default = "true")]
    pub export_prometheus: bool,

    #[envconfig(default = "false")]
    pub metrics_placeholder_counter: bool,

    #[envconfig(nested = true)]
    pub logging: LoggingConfig,

    #[envconfig(nested = true)]
    pub database: DatabaseConfig,

    #[envconfig(nested = true)]
    pub redis: RedisConfig,

    #[envconfig(nested = true)]
    pub security: SecurityConfig,

    #[envconfig(nested = true)]
    pub health_check: HealthCheckConfig,
}

impl Config {
    /// Address to listen on, using `default_port` when `PORT` is absent or unparseable.
    pub fn bind_address(&self, default_port: u16) -> SocketAddr {
        let host = self.host.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let port = self
            .port
            .and_then(Lenient::get)
            .unwrap_or(default_port);
        SocketAddr::new(host, port)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(
            self.shutdown_timeout_secs
                .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        )
    }

    pub fn is_development(&self) -> bool {
        self.environment == DEFAULT_ENVIRONMENT
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Database settings with their derived fields resolved.
    pub fn database(&self) -> DatabaseSettings {
        DatabaseSettings {
            host: self.database.db_host.clone(),
            port: self.database.db_port.unwrap_or(DEFAULT_DB_PORT),
            name: self.database.db_name.clone(),
            ssl: self.is_production(),
            pool_min: self.database.db_pool_min.unwrap_or(DEFAULT_DB_POOL_MIN),
            pool_max: self.database.db_pool_max.unwrap_or(DEFAULT_DB_POOL_MAX),
        }
    }
}

#[derive(Envconfig, Clone, Debug)]
pub struct LoggingConfig {
    #[envconfig(default = "info")]
    pub log_level: Lenient<Level>,

    #[envconfig(default = "json")]
    pub log_format: Lenient<LogFormat>,
}

impl LoggingConfig {
    pub fn level(&self) -> Level {
        self.log_level.unwrap_or(Level::INFO)
    }

    pub fn format(&self) -> LogFormat {
        self.log_format.unwrap_or(LogFormat::Json)
    }
}

// The sections below are loaded for the services' benefit but nothing in the
// operational surface reads them.

#[derive(Envconfig, Clone, Debug)]
pub struct DatabaseConfig {
    #[envconfig(default = "localhost")]
    pub db_host: String,
    #[envconfig(default = "5432")]
    pub db_port: Lenient<u16>,
    #[envconfig(default = "devops_demo")]
    pub db_name: String,
    #[envconfig(default = "2")]
    pub db_pool_min: Lenient<u32>,
    #[envconfig(default = "10")]
    pub db_pool_max: Lenient<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub ssl: bool,
    pub pool_min: u32,
    pub pool_max: u32,
}

#[derive(Envconfig, Clone, Debug)]
pub struct RedisConfig {
    #[envconfig(default = "localhost")]
    pub redis_host: String,
    #[envconfig(default = "6379")]
    pub redis_port: Lenient<u16>,
    pub redis_password: Option<String>,
    #[envconfig(default = "0")]
    pub redis_db: Lenient<u32>,
}

impl RedisConfig {
    pub fn port(&self) -> u16 {
        self.redis_port.unwrap_or(DEFAULT_REDIS_PORT)
    }

    pub fn db(&self) -> u32 {
        self.redis_db.unwrap_or(DEFAULT_REDIS_DB)
    }
}

#[derive(Envconfig, Clone, Debug)]
pub struct SecurityConfig {
    #[envconfig(default = "*")]
    pub cors_origin: String,
    #[envconfig(default = "100")]
    pub rate_limit_max: Lenient<u32>,
    #[envconfig(default = "dev-secret")]
    pub jwt_secret: String,
    #[envconfig(default = "24h")]
    pub jwt_expires_in: String,
}

impl SecurityConfig {
    pub fn cors_credentials(&self) -> bool {
        true
    }

    pub fn rate_limit_max(&self) -> u32 {
        self.rate_limit_max.unwrap_or(DEFAULT_RATE_LIMIT_MAX)
    }

    pub fn rate_limit_window(&self) -> Duration {
        RATE_LIMIT_WINDOW
    }
}

#[derive(Envconfig, Clone, Debug)]
pub struct HealthCheckConfig {
    #[envconfig(default = "5000")]
    pub health_timeout: Lenient<u64>,
    #[envconfig(default = "30000")]
    pub health_interval: Lenient<u64>,
}

impl HealthCheckConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout.unwrap_or(DEFAULT_HEALTH_TIMEOUT_MS))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.health_interval.unwrap_or(DEFAULT_HEALTH_INTERVAL_MS))
    }
}
