//! Shared handler utilities used across RPC domains.

use crate::server::AppState;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use ghostfest_core::{AdminSession, GhostfestApi, GhostfestError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Extract an optional string parameter, supporting both snake_case and camelCase.
pub(crate) fn get_str_param<'a>(params: &'a Value, snake: &str, camel: &str) -> Option<&'a str> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_str())
}

/// Extract a required string parameter or return an error.
pub(crate) fn require_str_param(
    params: &Value,
    snake: &str,
    camel: &str,
) -> ghostfest_core::Result<String> {
    get_str_param(params, snake, camel)
        .map(String::from)
        .ok_or_else(|| GhostfestError::InvalidParams {
            message: format!("Missing required parameter: {}", snake),
        })
}

/// Extract an optional i64 parameter, supporting both snake_case and camelCase.
///
/// Numeric strings are accepted too, since ids often come from form fields.
pub(crate) fn get_i64_param(params: &Value, snake: &str, camel: &str) -> Option<i64> {
    let value = params.get(snake).or_else(|| params.get(camel))?;
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Extract a required i64 parameter or return an error.
pub(crate) fn require_i64_param(
    params: &Value,
    snake: &str,
    camel: &str,
) -> ghostfest_core::Result<i64> {
    get_i64_param(params, snake, camel).ok_or_else(|| GhostfestError::InvalidParams {
        message: format!("Missing required parameter: {}", snake),
    })
}

/// Amount as typed by staff: a string or a number, kept raw for lenient parsing.
pub(crate) fn get_amount_param(params: &Value, snake: &str, camel: &str) -> Option<String> {
    match params.get(snake).or_else(|| params.get(camel))? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Deserialize the whole params object into a typed form.
pub(crate) fn parse_params<T: DeserializeOwned>(params: &Value) -> ghostfest_core::Result<T> {
    serde_json::from_value(params.clone()).map_err(|e| GhostfestError::InvalidParams {
        message: e.to_string(),
    })
}

/// The token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Run a core call on the blocking pool.
///
/// SQLite access and password hashing block the calling thread.
pub(crate) async fn run_blocking<T, F>(state: &AppState, op: F) -> ghostfest_core::Result<T>
where
    F: FnOnce(&GhostfestApi) -> ghostfest_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let api = Arc::clone(&state.api);
    tokio::task::spawn_blocking(move || op(&api))
        .await
        .map_err(|e| GhostfestError::TaskFailed(e.to_string()))?
}

/// Resolve the caller's session or fail with `Unauthorized`.
pub(crate) async fn require_session(
    state: &AppState,
    token: Option<&str>,
) -> ghostfest_core::Result<AdminSession> {
    let token = token.ok_or(GhostfestError::Unauthorized)?;
    state
        .sessions
        .get(token)
        .await
        .ok_or(GhostfestError::Unauthorized)
}
