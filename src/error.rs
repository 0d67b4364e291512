use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ReservationError {
    #[error("Plateau {0} does not exist")]
    PlateauNotFound(String),

    #[error("Item {0} does not exist")]
    ItemNotFound(String),

    #[error("Reservation {0} does not exist")]
    ReservationNotFound(String),

    #[error("Items not allowed for plateau {plateau_id}: {}", .items.join(", "))]
    InvalidItems {
        plateau_id: String,
        items: Vec<String>,
    },

    #[error("Start time must precede end time, both within years 0 to 9999")]
    InvalidTimeRange,

    #[error("Client name must not be empty")]
    InvalidClientName,

    #[error("Requested time slot not available")]
    SlotUnavailable,

    #[error("Storage error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl ReservationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReservationError::PlateauNotFound(_)
            | ReservationError::ItemNotFound(_)
            | ReservationError::ReservationNotFound(_) => StatusCode::NOT_FOUND,
            ReservationError::InvalidItems { .. }
            | ReservationError::InvalidTimeRange
            | ReservationError::InvalidClientName => StatusCode::BAD_REQUEST,
            ReservationError::SlotUnavailable => StatusCode::CONFLICT,
            ReservationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ReservationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ReservationError::Store(e) => {
                error!("Reservation store failure: {:#}", e);
                "Something went wrong, please try again.".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
