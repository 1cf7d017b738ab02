use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

const DEFAULT_ENV: &str = "development";
const DEFAULT_LOG_LEVEL: &str = "info";
const CONFIG_DIR: &str = "config";
const DEV_DEFAULT_JWT_SECRET: &str =
    "development_only_secret_key_do_not_use_outside_local_testing";

/// Application configuration, layered from config files and `APP__*`
/// environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,

    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,
    #[serde(default = "default_db_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default)]
    pub auto_migrate: bool,

    pub jwt_secret: String,

    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,

    /// Comma-separated list of allowed CORS origins; unset means permissive
    /// CORS in development and no CORS outside it.
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,
}

fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_timeout_secs() -> u64 {
    30
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Socket address built from the configured host and port.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| {
                ConfigError::Message(format!(
                    "invalid bind address {}:{}",
                    self.host, self.port
                ))
            })
    }
}

/// Initializes tracing using the provided log level as the default filter.
/// `RUST_LOG`, when set, wins over the configured level.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("ledgerline_api={level},tower_http=debug");
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration.
///
/// Layers, last one wins:
/// 1. Built-in defaults
/// 2. config/default.toml
/// 3. config/{env}.toml (env from RUN_ENV or APP_ENV)
/// 4. APP__* environment variables
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("environment", DEFAULT_ENV)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8080)?
        .set_default("database_url", "sqlite://ledgerline.db?mode=rwc")?
        .set_default("auto_migrate", true)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{CONFIG_DIR}/default")).required(false))
        .add_source(File::with_name(&format!("{CONFIG_DIR}/{run_env}")).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    // jwt_secret has no production default: outside development it must come
    // from the environment or a config file.
    let mut cfg: AppConfig = match config.get_string("jwt_secret") {
        Ok(_) => config.try_deserialize()?,
        Err(_) if run_env == DEFAULT_ENV => {
            let config = Config::builder()
                .add_source(config)
                .set_default("jwt_secret", DEV_DEFAULT_JWT_SECRET)?
                .build()?;
            config.try_deserialize()?
        }
        Err(_) => {
            return Err(ConfigError::Message(
                "jwt_secret must be set via APP__JWT_SECRET or a config file".to_string(),
            ))
        }
    };

    cfg.environment = run_env;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            environment: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            auto_migrate: true,
            jwt_secret: DEV_DEFAULT_JWT_SECRET.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
            cors_allowed_origins: None,
        }
    }

    #[test]
    fn bind_addr_uses_configured_host() {
        let mut cfg = base_config();
        cfg.host = "127.0.0.1".to_string();
        cfg.port = 9090;
        assert_eq!(cfg.bind_addr().unwrap().to_string(), "127.0.0.1:9090");

        cfg.host = "not a host".to_string();
        assert!(cfg.bind_addr().is_err());
    }

    #[test]
    fn development_detection_is_case_insensitive() {
        let mut cfg = base_config();
        cfg.environment = "Development".to_string();
        assert!(cfg.is_development());

        cfg.environment = "production".to_string();
        assert!(!cfg.is_development());
    }
}
