// src/http/handlers.rs

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::disks::list_disks;
use crate::errors::JobError;
use crate::job::{Credential, JobRequest};
use crate::orchestrator::Frame;
use crate::types::{JobKind, WipeMethod};

use super::sse::{frame_stream, single_frame};
use super::AppState;

/// `POST /api/wipe` body. Any field may be missing; validation reports it.
#[derive(Debug, Default, Deserialize)]
pub struct WipeBody {
    pub device: Option<String>,
    pub method: Option<String>,
    #[serde(rename = "sudoPassword")]
    pub sudo_password: Option<String>,
}

/// `POST /api/factory-reset` body.
#[derive(Debug, Default, Deserialize)]
pub struct FactoryResetBody {
    #[serde(rename = "sudoPassword")]
    pub sudo_password: Option<String>,
}

fn error_json(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub async fn alive() -> &'static str {
    "Backend alive!"
}

pub async fn disks(State(state): State<AppState>) -> Response {
    match list_disks(&state.disks_command).await {
        Ok(disks) => Json(json!({ "disks": disks })).into_response(),
        Err(e) => {
            error!(error = %format!("{e:#}"), "disk listing failed");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "lsblk failed")
        }
    }
}

pub async fn submit_wipe(
    State(state): State<AppState>,
    body: Result<Json<WipeBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return error_json(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let method = match non_empty(body.method) {
        Some(raw) => match raw.parse::<WipeMethod>() {
            Ok(method) => Some(method),
            Err(msg) => return submit_rejected(JobError::InvalidRequest(msg)),
        },
        None => None,
    };

    let request = JobRequest {
        kind: JobKind::Wipe,
        target: non_empty(body.device),
        method,
        credential: non_empty(body.sudo_password).map(Credential::new),
    };
    submit(&state, request)
}

pub async fn submit_factory_reset(
    State(state): State<AppState>,
    body: Result<Json<FactoryResetBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return error_json(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let request = JobRequest {
        kind: JobKind::FactoryReset,
        target: None,
        method: None,
        credential: non_empty(body.sudo_password).map(Credential::new),
    };
    submit(&state, request)
}

fn submit(state: &AppState, request: JobRequest) -> Response {
    match state.orchestrator.submit(request) {
        Ok(message) => (StatusCode::ACCEPTED, Json(json!({ "message": message }))).into_response(),
        Err(err) => submit_rejected(err),
    }
}

fn submit_rejected(err: JobError) -> Response {
    match err {
        JobError::InvalidRequest(msg) => error_json(StatusCode::BAD_REQUEST, msg),
        err @ JobError::Conflict(_) => error_json(StatusCode::BAD_REQUEST, err.to_string()),
        other => error_json(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

pub async fn wipe_progress(State(state): State<AppState>) -> Response {
    progress(&state, JobKind::Wipe)
}

pub async fn factory_progress(State(state): State<AppState>) -> Response {
    progress(&state, JobKind::FactoryReset)
}

fn progress(state: &AppState, kind: JobKind) -> Response {
    match state.orchestrator.attach(kind) {
        Ok(rx) => frame_stream(rx).into_response(),
        Err(JobError::NoActiveJob(kind)) => {
            (StatusCode::BAD_REQUEST, kind.idle_message()).into_response()
        }
        Err(err @ JobError::AlreadyAttached(_)) => {
            warn!(%kind, "rejecting second progress subscriber");
            single_frame(Frame::Error(err.to_string())).into_response()
        }
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

pub async fn wipe_live(State(state): State<AppState>) -> Response {
    live_status(&state, JobKind::Wipe).await
}

pub async fn factory_live(State(state): State<AppState>) -> Response {
    live_status(&state, JobKind::FactoryReset).await
}

async fn live_status(state: &AppState, kind: JobKind) -> Response {
    match state.orchestrator.status(kind).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => error_json(StatusCode::NOT_FOUND, format!("no {kind} status recorded")),
        Err(e) => {
            error!(%kind, error = %e, "failed to read journal");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "journal read failed")
        }
    }
}
