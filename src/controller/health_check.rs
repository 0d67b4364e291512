use std::sync::Arc;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Router};
use tracing::warn;
use crate::services::reservation_service::ReservationService;

pub fn router(reservation_service: Arc<ReservationService>) -> Router {
    Router::new()
        .route("/health", get(get_health_check))
        .route_layer(Extension(reservation_service))
}

/// Healthy when the store answers a plateau listing
async fn get_health_check(
    Extension(reservation_service): Extension<Arc<ReservationService>>,
) -> Result<StatusCode, StatusCode>
{
    reservation_service
        .get_all_plateaus()
        .await
        .map(|_| StatusCode::OK)
        .map_err(|e| {
            warn!("Health check failed due to: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        })
}
