use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::Json,
    BoxError,
};
use serde_json::{json, Value};

use crate::models::errors::AppError;
use crate::AppState;

/// Plain-text liveness probe
pub async fn root() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Backend is running!")
}

/// Liveness plus a database round-trip. Always 200; a down database is reported, not fatal.
pub async fn health_check(State(app_state): State<AppState>) -> Json<Value> {
    let database = match app_state.store.ping().await {
        Ok(()) => "up",
        Err(e) => {
            tracing::warn!("Health check could not reach the database: {}", e);
            "down"
        }
    };

    Json(json!({
        "status": "ok",
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::not_found("Route", uri.path())
}

pub async fn method_not_allowed(method: Method) -> AppError {
    AppError::method_not_allowed(method.as_str())
}

/// Turns errors raised by the middleware stack into JSON responses
pub async fn handle_middleware_error(error: BoxError) -> AppError {
    if error.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("Request timed out");
        AppError::RequestTimeout
    } else {
        AppError::internal_error(format!("Unhandled middleware error: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_elapsed_timeout_maps_to_request_timeout() {
        let error: BoxError = Box::new(tower::timeout::error::Elapsed::new());
        assert!(matches!(
            handle_middleware_error(error).await,
            AppError::RequestTimeout
        ));

        let other: BoxError = "boom".into();
        assert!(matches!(
            handle_middleware_error(other).await,
            AppError::InternalError { .. }
        ));
    }
}
