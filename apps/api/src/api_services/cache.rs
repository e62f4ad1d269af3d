use std::sync::Arc;
use std::time::Duration;

use staffguard_application::PermissionCache;
use staffguard_core::{AppError, AppResult};
use staffguard_infrastructure::{
    DisabledPermissionCache, InMemoryPermissionCache, RedisPermissionCache,
};
use tracing::{info, warn};

use crate::api_config::{ApiConfig, PermissionCacheBackend};

const REDIS_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Cache selected at startup together with the client it talks through.
pub(super) struct PermissionCacheSetup {
    pub cache: Arc<dyn PermissionCache>,
    pub backend: &'static str,
    pub redis_client: Option<redis::Client>,
}

pub(super) fn build_redis_client(redis_url: &str) -> AppResult<redis::Client> {
    redis::Client::open(redis_url)
        .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))
}

/// Builds the configured cache. An unreachable Redis degrades to no caching instead of
/// failing startup.
pub(super) async fn build_permission_cache(config: &ApiConfig) -> AppResult<PermissionCacheSetup> {
    let redis_client = config
        .redis_url
        .as_deref()
        .map(build_redis_client)
        .transpose()?;

    let setup = match config.cache_backend {
        PermissionCacheBackend::Disabled => PermissionCacheSetup {
            cache: Arc::new(DisabledPermissionCache),
            backend: "disabled",
            redis_client,
        },
        PermissionCacheBackend::InMemory => PermissionCacheSetup {
            cache: Arc::new(InMemoryPermissionCache::new()),
            backend: "memory",
            redis_client,
        },
        PermissionCacheBackend::Redis => {
            let redis_client = redis_client.ok_or_else(|| {
                AppError::Validation(
                    "REDIS_URL is required when PERMISSION_CACHE_BACKEND=redis".to_owned(),
                )
            })?;

            match check_redis(&redis_client).await {
                Ok(()) => PermissionCacheSetup {
                    cache: Arc::new(RedisPermissionCache::new(
                        redis_client.clone(),
                        config.cache_key_prefix.clone(),
                    )),
                    backend: "redis",
                    redis_client: Some(redis_client),
                },
                Err(error) => {
                    warn!(error = %error, "redis unreachable, permission caching disabled");
                    PermissionCacheSetup {
                        cache: Arc::new(DisabledPermissionCache),
                        backend: "disabled",
                        redis_client: Some(redis_client),
                    }
                }
            }
        }
    };

    info!(backend = setup.backend, "permission cache configured");
    Ok(setup)
}

async fn check_redis(redis_client: &redis::Client) -> AppResult<()> {
    let check = async {
        let mut connection = redis_client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("redis connection failed: {error}")))?;
        redis::cmd("PING")
            .query_async::<String>(&mut connection)
            .await
            .map_err(|error| AppError::Internal(format!("redis ping failed: {error}")))?;
        Ok(())
    };

    tokio::time::timeout(REDIS_CHECK_TIMEOUT, check)
        .await
        .map_err(|_| AppError::Internal("redis ping timed out".to_owned()))?
}
