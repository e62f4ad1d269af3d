use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::{HealthDependencyStatus, HealthResponse};
use crate::state::AppState;

mod checks;

use checks::{check_postgres, check_redis};

/// Reports readiness. Only Postgres gates readiness; a failing cache degrades service.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let postgres = check_postgres(state.postgres_pool.clone()).await;
    let redis = check_redis(state.redis_client.clone()).await;

    let ready = is_healthy(postgres.status);
    let status = match (ready, redis.status) {
        (false, _) => "unavailable",
        (true, "error") => "degraded",
        (true, _) => "ok",
    };
    let http_status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        http_status,
        Json(HealthResponse {
            status,
            ready,
            postgres,
            redis,
            permission_cache: state.cache_backend,
        }),
    )
}

fn is_healthy(status: &str) -> bool {
    status == "ok"
}
