use actix_web::{web, HttpResponse};

use crate::app_state::AppState;

/// GET /health
///
/// Reports 503 when the database does not answer.
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let database = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    let body = serde_json::json!({
        "status": if database { "ok" } else { "degraded" },
        "database": database,
        "service": "community-service",
        "version": env!("CARGO_PKG_VERSION"),
    });

    if database {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
