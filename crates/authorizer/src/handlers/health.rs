//! Health check handler.

use crate::models::HealthResponse;
use axum::Json;

/// Liveness probe handler.
///
/// Does not touch the key set; an unreachable issuer shows up as denies,
/// not as an unhealthy process.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let Json(response) = health_check().await;
        assert_eq!(response.status, "healthy");
    }
}
