use std::sync::Arc;
use axum::{Extension, Json, Router};
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tracing::warn;
use crate::controller::AppState;
use crate::error::ReservationError;
use crate::models::reservation::NewReservation;
use crate::services::reservation_service::ReservationService;

pub fn router(app_state: AppState) -> Router {
    let mut router = Router::new()
        .route("/reservations", get(get_all_reservations).post(add_reservation))
        .route("/reservations/plateaus", get(get_all_plateaus))
        .route("/reservations/plateaus/:plateau_id", get(get_plateau))
        .route(
            "/reservations/plateaus/:plateau_id/reservations",
            get(get_plateau_reservations),
        )
        .route("/reservations/items", get(get_all_items))
        .route("/reservations/items/:item_id", get(get_item))
        .route(
            "/reservations/:reservation_id",
            get(get_reservation).delete(delete_reservation),
        );

    if app_state.allow_reset {
        router = router.route("/reservations/reset", post(reset_database));
    }

    router.route_layer(Extension(app_state.reservation_service))
}

fn log_rejection(action: &str, e: &ReservationError) {
    // Store failures are logged when rendered
    if !matches!(e, ReservationError::Store(_)) {
        warn!("Rejected {} due to: {}", action, e);
    }
}

pub async fn get_all_reservations(
    Extension(reservation_service): Extension<Arc<ReservationService>>,
) -> impl IntoResponse {
    match reservation_service.get_all_reservations().await {
        Ok(reservations) => (StatusCode::OK, Json(reservations)).into_response(),
        Err(e) => {
            log_rejection("reservation listing", &e);
            e.into_response()
        }
    }
}

pub async fn add_reservation(
    Extension(reservation_service): Extension<Arc<ReservationService>>,
    Json(body): Json<NewReservation>,
) -> impl IntoResponse {
    match reservation_service.create_reservation(body).await {
        Ok(reservation) => (StatusCode::CREATED, Json(reservation)).into_response(),
        Err(e) => {
            log_rejection("reservation", &e);
            e.into_response()
        }
    }
}

pub async fn get_reservation(
    Extension(reservation_service): Extension<Arc<ReservationService>>,
    Path(reservation_id): Path<String>,
) -> impl IntoResponse {
    match reservation_service.get_reservation_by_id(&reservation_id).await {
        Ok(reservation) => (StatusCode::OK, Json(reservation)).into_response(),
        Err(e) => {
            log_rejection("reservation lookup", &e);
            e.into_response()
        }
    }
}

pub async fn delete_reservation(
    Extension(reservation_service): Extension<Arc<ReservationService>>,
    Path(reservation_id): Path<String>,
) -> impl IntoResponse {
    match reservation_service.delete_reservation(&reservation_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            log_rejection("cancellation", &e);
            e.into_response()
        }
    }
}

pub async fn get_all_plateaus(
    Extension(reservation_service): Extension<Arc<ReservationService>>,
) -> impl IntoResponse {
    match reservation_service.get_all_plateaus().await {
        Ok(plateaus) => (StatusCode::OK, Json(plateaus)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_plateau(
    Extension(reservation_service): Extension<Arc<ReservationService>>,
    Path(plateau_id): Path<String>,
) -> impl IntoResponse {
    match reservation_service.get_plateau_by_id(&plateau_id).await {
        Ok(plateau) => (StatusCode::OK, Json(plateau)).into_response(),
        Err(e) => {
            log_rejection("plateau lookup", &e);
            e.into_response()
        }
    }
}

pub async fn get_plateau_reservations(
    Extension(reservation_service): Extension<Arc<ReservationService>>,
    Path(plateau_id): Path<String>,
) -> impl IntoResponse {
    match reservation_service.get_reservations_for_plateau(&plateau_id).await {
        Ok(reservations) => (StatusCode::OK, Json(reservations)).into_response(),
        Err(e) => {
            log_rejection("plateau reservation listing", &e);
            e.into_response()
        }
    }
}

pub async fn get_all_items(
    Extension(reservation_service): Extension<Arc<ReservationService>>,
) -> impl IntoResponse {
    match reservation_service.get_all_items().await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_item(
    Extension(reservation_service): Extension<Arc<ReservationService>>,
    Path(item_id): Path<String>,
) -> impl IntoResponse {
    match reservation_service.get_item_by_id(&item_id).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => {
            log_rejection("item lookup", &e);
            e.into_response()
        }
    }
}

pub async fn reset_database(
    Extension(reservation_service): Extension<Arc<ReservationService>>,
) -> impl IntoResponse {
    match reservation_service.reset_database().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::router_endpoints;
    use crate::services::reservation_service::test_helpers::seeded_service;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app(allow_reset: bool) -> Router {
        let app_state = AppState {
            reservation_service: Arc::new(seeded_service().await),
            allow_reset,
        };
        router_endpoints(app_state)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        // extractor rejections answer in plain text
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    // 2024-05-01T10:00:00Z and friends, in epoch milliseconds
    const TEN: i64 = 1_714_557_600_000;
    const HOUR: i64 = 3_600_000;

    fn booking(plateau_id: &str, start: i64, end: i64, items: &[&str]) -> Value {
        json!({
            "clientName": "Ana",
            "plateauId": plateau_id,
            "itemIds": items,
            "startTime": start,
            "endTime": end,
        })
    }

    #[tokio::test]
    async fn create_list_and_cancel_reservation() {
        let app = app(false).await;

        let (status, created) = send(
            &app,
            Method::POST,
            "/reservations",
            Some(booking("P", TEN, TEN + HOUR, &["A"])),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["plateauName"], "Plateau P");
        assert_eq!(created["startTime"], "2024-05-01T10:00:00Z");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, listed) = send(&app, Method::GET, "/reservations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, fetched) = send(&app, Method::GET, &format!("/reservations/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["id"], id.as_str());

        let (status, _) = send(&app, Method::DELETE, &format!("/reservations/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, Method::DELETE, &format!("/reservations/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains(&id));
    }

    #[tokio::test]
    async fn overlapping_booking_conflicts_and_touching_one_succeeds() {
        let app = app(false).await;
        let (status, _) = send(&app, Method::POST, "/reservations", Some(booking("P", TEN, TEN + HOUR, &[]))).await;
        assert_eq!(status, StatusCode::CREATED);

        let half = HOUR / 2;
        let (status, body) = send(
            &app,
            Method::POST,
            "/reservations",
            Some(booking("P", TEN + half, TEN + HOUR + half, &[])),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Requested time slot not available");

        let (status, _) = send(
            &app,
            Method::POST,
            "/reservations",
            Some(booking("P", TEN + HOUR, TEN + 2 * HOUR, &[])),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn invalid_requests_are_client_errors() {
        let app = app(false).await;

        let (status, _) = send(&app, Method::POST, "/reservations", Some(booking("Z", TEN, TEN + HOUR, &[]))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            Method::POST,
            "/reservations",
            Some(booking("P", TEN, TEN + HOUR, &["C"])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains('C'));

        let (status, _) = send(&app, Method::POST, "/reservations", Some(booking("P", TEN, TEN, &[]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/reservations", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, listed) = send(&app, Method::GET, "/reservations", None).await;
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unrenderable_years_never_reach_the_listings() {
        let app = app(false).await;

        // year -91
        let negative = -65_000_000_000_000_i64;
        let (status, body) = send(
            &app,
            Method::POST,
            "/reservations",
            Some(booking("P", negative, negative + HOUR, &[])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Start time must precede end time, both within years 0 to 9999");

        // year 10000
        let beyond = 253_402_300_800_000_i64 + HOUR;
        let (status, _) = send(
            &app,
            Method::POST,
            "/reservations",
            Some(booking("P", beyond, beyond + HOUR, &[])),
        )
        .await;
        assert!(status.is_client_error());

        let (status, listed) = send(&app, Method::GET, "/reservations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(listed.as_array().unwrap().is_empty());

        let (status, listed) = send(&app, Method::GET, "/reservations/plateaus/P/reservations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reference_data_endpoints() {
        let app = app(false).await;

        let (status, plateaus) = send(&app, Method::GET, "/reservations/plateaus", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(plateaus[0]["allowedItems"], json!(["A", "B"]));
        assert_eq!(plateaus[0]["maxCapacity"], 10);

        let (status, items) = send(&app, Method::GET, "/reservations/items", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(items.as_array().unwrap().len(), 3);

        let (status, item) = send(&app, Method::GET, "/reservations/items/B", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["name"], "Item B");

        let (status, _) = send(&app, Method::GET, "/reservations/plateaus/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, reservations) = send(&app, Method::GET, "/reservations/plateaus/Q/reservations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(reservations.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_is_only_routed_when_allowed() {
        let locked = app(false).await;
        let (status, _) = send(&locked, Method::POST, "/reservations/reset", None).await;
        assert_ne!(status, StatusCode::NO_CONTENT);

        let open = app(true).await;
        send(&open, Method::POST, "/reservations", Some(booking("P", TEN, TEN + HOUR, &[]))).await;
        let (status, _) = send(&open, Method::POST, "/reservations/reset", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, listed) = send(&open, Method::GET, "/reservations", None).await;
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn health_and_fallback() {
        let app = app(false).await;
        let (status, _) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::GET, "/nowhere", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No endpoint at /nowhere");
    }
}
