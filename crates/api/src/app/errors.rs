use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pantry_infra::LedgerError;

/// Status, error code and message for a ledger error.
pub fn ledger_error_parts(err: LedgerError) -> (StatusCode, &'static str, String) {
    match err {
        LedgerError::InvalidKey(msg) => (StatusCode::BAD_REQUEST, "invalid_key", msg),
        LedgerError::StoreUnavailable(msg) => {
            tracing::error!(error = %msg, "document store call failed");
            (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
        }
        LedgerError::CorruptRecord(msg) => {
            tracing::error!(error = %msg, "corrupt inventory record");
            (StatusCode::INTERNAL_SERVER_ERROR, "corrupt_record", msg)
        }
        LedgerError::InvariantViolation(msg) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
    }
}

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    let (status, code, msg) = ledger_error_parts(err);
    json_error(status, code, msg)
}

/// `{"error","message"}` body for a ledger error, without the status.
pub fn ledger_error_body(err: LedgerError) -> serde_json::Value {
    let (_, code, msg) = ledger_error_parts(err);
    error_body(code, msg)
}

pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(rejection.status(), "invalid_body", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (status, axum::Json(error_body(code, message))).into_response()
}

fn error_body(code: &'static str, message: impl Into<String>) -> serde_json::Value {
    json!({
        "error": code,
        "message": message.into(),
    })
}
