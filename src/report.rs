use crate::probe::ProbeOutcome;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDateTime;
use serde::Serialize;

pub const CONFIG_MISSING_MESSAGE: &str =
    "Missing DB env vars. Set DB_HOST, DB_USER, DB_PASSWORD, DB_NAME (and optionally DB_PORT).";

/// JSON body returned by `/db`
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct DbReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db: Option<DbInfo>,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct DbInfo {
    pub now: NaiveDateTime,
    pub version: String,
}

impl DbReport {
    fn failure(error: String) -> Self {
        Self {
            ok: false,
            error: Some(error),
            db: None,
        }
    }
}

/// Map a probe outcome to the HTTP status and body
#[must_use]
pub fn format(outcome: ProbeOutcome) -> (StatusCode, DbReport) {
    match outcome {
        ProbeOutcome::ConfigMissing => (
            StatusCode::BAD_REQUEST,
            DbReport::failure(CONFIG_MISSING_MESSAGE.to_string()),
        ),
        ProbeOutcome::ConnectionFailed(message) | ProbeOutcome::QueryFailed(message) => {
            (StatusCode::INTERNAL_SERVER_ERROR, DbReport::failure(message))
        }
        ProbeOutcome::Success {
            server_time,
            server_version,
        } => (
            StatusCode::OK,
            DbReport {
                ok: true,
                error: None,
                db: Some(DbInfo {
                    now: server_time,
                    version: server_version,
                }),
            },
        ),
    }
}

impl IntoResponse for ProbeOutcome {
    fn into_response(self) -> Response {
        let (status, report) = format(self);
        (status, Json(report)).into_response()
    }
}
