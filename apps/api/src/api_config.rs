use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use staffguard_core::AppError;
use tracing_subscriber::EnvFilter;

/// Backend used for resolved permission sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionCacheBackend {
    Redis,
    InMemory,
    Disabled,
}

impl FromStr for PermissionCacheBackend {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" | "in_memory" => Ok(Self::InMemory),
            "disabled" | "none" => Ok(Self::Disabled),
            other => Err(AppError::Validation(format!(
                "PERMISSION_CACHE_BACKEND must be one of 'redis', 'memory' or 'disabled', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub redis_url: Option<String>,
    pub api_host: String,
    pub api_port: u16,
    pub cache_backend: PermissionCacheBackend,
    pub cache_key_prefix: String,
    pub cache_ttl_seconds: u32,
    pub role_sync_throttle_seconds: u32,
    pub authorization_timeout: Duration,
    pub background_task_timeout: Duration,
    pub internal_service_secret: Option<String>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        let mut config = Self::from_lookup(|name| env::var(name).ok())?;
        config.migrate_only = migrate_only;
        Ok(config)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| AppError::Validation("DATABASE_URL is required".to_owned()))?;
        let redis_url = lookup("REDIS_URL");

        let cache_backend = match lookup("PERMISSION_CACHE_BACKEND") {
            Some(value) => value.parse::<PermissionCacheBackend>()?,
            None if redis_url.is_some() => PermissionCacheBackend::Redis,
            None => PermissionCacheBackend::InMemory,
        };

        if cache_backend == PermissionCacheBackend::Redis && redis_url.is_none() {
            return Err(AppError::Validation(
                "REDIS_URL is required when PERMISSION_CACHE_BACKEND=redis".to_owned(),
            ));
        }

        let authorization_timeout_ms = parse_or(&lookup, "AUTHORIZATION_TIMEOUT_MS", 2_000_u64)?;
        let background_task_timeout_ms =
            parse_or(&lookup, "BACKGROUND_TASK_TIMEOUT_MS", 5_000_u64)?;
        if authorization_timeout_ms == 0 || background_task_timeout_ms == 0 {
            return Err(AppError::Validation(
                "AUTHORIZATION_TIMEOUT_MS and BACKGROUND_TASK_TIMEOUT_MS must be greater than zero"
                    .to_owned(),
            ));
        }

        Ok(Self {
            migrate_only: false,
            database_url,
            redis_url,
            api_host: lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned()),
            api_port: parse_or(&lookup, "API_PORT", 3001_u16)?,
            cache_backend,
            cache_key_prefix: lookup("PERMISSION_CACHE_KEY_PREFIX")
                .unwrap_or_else(|| "staffguard".to_owned()),
            cache_ttl_seconds: parse_or(&lookup, "PERMISSION_CACHE_TTL_SECONDS", 300_u32)?,
            role_sync_throttle_seconds: parse_or(&lookup, "ROLE_SYNC_THROTTLE_SECONDS", 60_u32)?,
            authorization_timeout: Duration::from_millis(authorization_timeout_ms),
            background_task_timeout: Duration::from_millis(background_task_timeout_ms),
            internal_service_secret: lookup("INTERNAL_SERVICE_SECRET"),
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        None => Ok(default),
    }
}
