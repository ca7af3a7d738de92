//! JSON-RPC request handlers, split by audience.

mod admin;
mod public;
mod shared;

pub(crate) use shared::{
    bearer_token, get_amount_param, parse_params, require_i64_param, require_session,
    require_str_param, run_blocking,
};

use crate::server::AppState;
use crate::wrapper::wrap_response;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use ghostfest_core::config::DatabaseConfig;
use ghostfest_core::export::EXPORT_FILE_NAME;
use ghostfest_core::{AdminSession, GhostfestError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

// ============================================================================
// JSON-RPC types
// ============================================================================

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
            id,
        }
    }
}

// ============================================================================
// HTTP endpoints
// ============================================================================

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Main JSON-RPC handler.
pub async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let method = &request.method;
    let params = request.params.unwrap_or(Value::Object(Default::default()));
    let id = request.id.clone();

    // Params may carry passwords; only the method name is logged.
    debug!("RPC call: {}", method);

    if method == "health_check" {
        return (
            StatusCode::OK,
            Json(JsonRpcResponse::success(id, json!({"status": "ok"}))),
        );
    }

    let token = bearer_token(&headers);
    let result = dispatch_method(&state, method, &params, token).await;

    match result {
        Ok(value) => {
            let wrapped = wrap_response(method, value);
            (StatusCode::OK, Json(JsonRpcResponse::success(id, wrapped)))
        }
        Err(e) => {
            error!("RPC error for {}: {}", method, e);
            let code = e.to_rpc_error_code();
            (
                StatusCode::OK,
                Json(JsonRpcResponse::error(id, code, e.to_string())),
            )
        }
    }
}

/// CSV download of every submission.
pub async fn handle_export_csv(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session = authorize_download(&state, &headers).await?;
    let csv = run_blocking(&state, move |api| api.export_csv(&session)).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, attachment(EXPORT_FILE_NAME)),
        ],
        csv,
    )
        .into_response())
}

/// Consistent snapshot of the database file.
pub async fn handle_backup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session = authorize_download(&state, &headers).await?;
    let bytes = run_blocking(&state, move |api| api.backup(&session)).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment(DatabaseConfig::BACKUP_DOWNLOAD_NAME),
            ),
        ],
        bytes,
    )
        .into_response())
}

fn attachment(file_name: &str) -> String {
    format!("attachment; filename=\"{}\"", file_name)
}

async fn authorize_download(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AdminSession, ApiError> {
    require_session(state, bearer_token(headers))
        .await
        .map_err(ApiError::from)
}

/// Plain HTTP error for the download routes.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<GhostfestError> for ApiError {
    fn from(err: GhostfestError) -> Self {
        let status = match err {
            GhostfestError::Unauthorized | GhostfestError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            GhostfestError::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => {
                error!("Download failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.message,
                "status": self.status.as_u16(),
            })),
        )
            .into_response()
    }
}

// ============================================================================
// Method dispatcher
// ============================================================================

/// Dispatch a method call to the appropriate handler.
async fn dispatch_method(
    state: &AppState,
    method: &str,
    params: &Value,
    token: Option<&str>,
) -> ghostfest_core::Result<Value> {
    match method {
        // Public intake and lookup
        "get_intake_status" => public::get_intake_status(state, params).await,
        "register" => public::register(state, params).await,
        "review" => public::review(state, params).await,
        "check_order" => public::check_order(state, params).await,
        "select_entry" => public::select_entry(state, params).await,
        "last_logins" => public::last_logins(state, params).await,
        "admin_login" => public::admin_login(state, params).await,

        "admin_logout" => match token {
            Some(token) => admin::admin_logout(state, token).await,
            None => Err(GhostfestError::Unauthorized),
        },

        _ => {
            let Some(handler) = AdminMethod::from_name(method) else {
                warn!("Method not found: {}", method);
                return Err(GhostfestError::MethodNotFound(method.to_string()));
            };
            let session = require_session(state, token).await?;
            handler.call(state, &session, params).await
        }
    }
}

/// Methods that require a logged-in session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdminMethod {
    Whoami,
    Dashboard,
    Refresh,
    MarkPaid,
    GetSubmission,
    EditSubmission,
    SendReminder,
    TogglePause,
    RequestPauseApproval,
    UndoEdit,
    UndoDelete,
    OwnerWhatsapp,
    DeleteSubmission,
    RequestDeleteApproval,
    History,
}

impl AdminMethod {
    fn from_name(method: &str) -> Option<Self> {
        let handler = match method {
            "whoami" => Self::Whoami,
            "dashboard" => Self::Dashboard,
            "refresh" => Self::Refresh,
            "mark_paid" => Self::MarkPaid,
            "get_submission" => Self::GetSubmission,
            "edit_submission" => Self::EditSubmission,
            "send_reminder" => Self::SendReminder,
            "toggle_pause" => Self::TogglePause,
            "request_pause_approval" => Self::RequestPauseApproval,
            "undo_edit" => Self::UndoEdit,
            "undo_delete" => Self::UndoDelete,
            "owner_whatsapp" => Self::OwnerWhatsapp,
            "delete_submission" => Self::DeleteSubmission,
            "request_delete_approval" => Self::RequestDeleteApproval,
            "history" => Self::History,
            _ => return None,
        };
        Some(handler)
    }

    async fn call(
        self,
        state: &AppState,
        session: &AdminSession,
        params: &Value,
    ) -> ghostfest_core::Result<Value> {
        match self {
            Self::Whoami => admin::whoami(state, session, params).await,
            Self::Dashboard => admin::dashboard(state, session, params).await,
            Self::Refresh => admin::refresh(state, session, params).await,
            Self::MarkPaid => admin::mark_paid(state, session, params).await,
            Self::GetSubmission => admin::get_submission(state, session, params).await,
            Self::EditSubmission => admin::edit_submission(state, session, params).await,
            Self::SendReminder => admin::send_reminder(state, session, params).await,
            Self::TogglePause => admin::toggle_pause(state, session, params).await,
            Self::RequestPauseApproval => {
                admin::request_pause_approval(state, session, params).await
            }
            Self::UndoEdit => admin::undo_edit(state, session, params).await,
            Self::UndoDelete => admin::undo_delete(state, session, params).await,
            Self::OwnerWhatsapp => admin::owner_whatsapp(state, session, params).await,
            Self::DeleteSubmission => admin::delete_submission(state, session, params).await,
            Self::RequestDeleteApproval => {
                admin::request_delete_approval(state, session, params).await
            }
            Self::History => admin::history(state, session, params).await,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::build_router;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use ghostfest_core::{GhostfestApi, SeedAccount};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_router() -> (TempDir, axum::Router) {
        let temp_dir = TempDir::new().unwrap();
        let api = GhostfestApi::builder(temp_dir.path())
            .owner_phone("60111122222")
            .seed_account(SeedAccount::parse("Wilson:owner:owner-pw").unwrap())
            .seed_account(SeedAccount::parse("Lily:admin:admin-pw").unwrap())
            .build()
            .unwrap();
        let router = build_router(Arc::new(AppState::new(api)));
        (temp_dir, router)
    }

    async fn rpc(router: &axum::Router, token: Option<&str>, method: &str, params: Value) -> Value {
        let body = json!({"jsonrpc": "2.0", "method": method, "params": params, "id": 1});
        let mut request = Request::post("/rpc").header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = router
            .clone()
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(router: &axum::Router, username: &str, password: &str) -> String {
        let response = rpc(
            router,
            None,
            "admin_login",
            json!({"username": username, "password": password}),
        )
        .await;
        response["result"]["token"].as_str().unwrap().to_string()
    }

    fn registration() -> Value {
        json!({
            "boat": "yes",
            "gender": "male",
            "name_cn": "陈大文",
            "country_code": "+60",
            "phone": "123456789",
            "payment_method": "tng",
            "entries": [
                {"option": "祖先", "name_cn": "陈公", "calendar": "lunar", "year": "1950"}
            ]
        })
    }

    #[test]
    fn test_json_rpc_response_success() {
        let response = JsonRpcResponse::success(Some(json!(1)), json!({"data": "test"}));
        assert!(response.error.is_none());
        assert!(response.result.is_some());
    }

    #[test]
    fn test_json_rpc_response_error() {
        let response = JsonRpcResponse::error(Some(json!(1)), -32600, "Test error".into());
        assert!(response.error.is_some());
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, -32600);
    }

    #[test]
    fn test_admin_method_names() {
        assert_eq!(AdminMethod::from_name("mark_paid"), Some(AdminMethod::MarkPaid));
        assert_eq!(AdminMethod::from_name("register"), None);
        assert_eq!(AdminMethod::from_name("shutdown"), None);
    }

    #[tokio::test]
    async fn test_health_routes() {
        let (_temp, router) = test_router();
        for path in ["/health", "/healthz"] {
            let response = router
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = rpc(&router, None, "health_check", json!({})).await;
        assert_eq!(response["result"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let (_temp, router) = test_router();
        let response = rpc(&router, None, "shutdown", json!({})).await;
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["id"], 1);
    }

    #[tokio::test]
    async fn test_register_and_check_order() {
        let (_temp, router) = test_router();

        let response = rpc(&router, None, "register", registration()).await;
        assert_eq!(response["result"]["status"], "created");
        assert_eq!(response["result"]["order_id"], "6789");

        let response = rpc(&router, None, "check_order", json!({"order_id": "6789"})).await;
        assert_eq!(response["result"]["status"], "single");
        assert_eq!(response["result"]["phone"], "+60123456789");

        let response = rpc(&router, None, "get_intake_status", json!({})).await;
        assert_eq!(response["result"]["success"], true);
        assert_eq!(response["result"]["paused"], false);
    }

    #[tokio::test]
    async fn test_register_accepts_any_payment_method_case() {
        let (_temp, router) = test_router();

        let mut params = registration();
        params["payment_method"] = json!("TNG");
        let response = rpc(&router, None, "register", params).await;
        assert_eq!(response["result"]["status"], "created");

        let mut params = registration();
        params["name_cn"] = json!("王小明");
        params["phone"] = json!("198887777");
        params["payment_method"] = json!("Bank_Transfer");
        let response = rpc(&router, None, "register", params).await;
        assert_eq!(response["result"]["status"], "created");

        let token = login(&router, "Lily", "admin-pw").await;
        let response = rpc(&router, Some(&token), "refresh", json!({})).await;
        let methods: Vec<&str> = response["result"]["orders"]
            .as_array()
            .unwrap()
            .iter()
            .map(|order| order["payment_method"].as_str().unwrap())
            .collect();
        assert!(methods.contains(&"tng"));
        assert!(methods.contains(&"bank_transfer"));
    }

    #[tokio::test]
    async fn test_dashboard_page_far_past_the_end_is_empty() {
        let (_temp, router) = test_router();
        rpc(&router, None, "register", registration()).await;
        let token = login(&router, "Lily", "admin-pw").await;

        let response = rpc(
            &router,
            Some(&token),
            "dashboard",
            json!({"page": u64::MAX}),
        )
        .await;
        assert!(response["error"].is_null());
        assert!(response["result"]["orders"].as_array().unwrap().is_empty());
        assert_eq!(response["result"]["pagination"]["has_next"], false);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_params() {
        let (_temp, router) = test_router();
        let response = rpc(&router, None, "register", json!({"name_cn": "陈"})).await;
        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_admin_methods_need_a_session() {
        let (_temp, router) = test_router();

        let response = rpc(&router, None, "dashboard", json!({})).await;
        assert_eq!(response["error"]["code"], -32010);

        let response = rpc(&router, Some("not-a-token"), "history", json!({})).await;
        assert_eq!(response["error"]["code"], -32010);

        let response = rpc(
            &router,
            None,
            "admin_login",
            json!({"username": "Wilson", "password": "wrong"}),
        )
        .await;
        assert_eq!(response["error"]["code"], -32010);
    }

    #[tokio::test]
    async fn test_admin_session_flow() {
        let (_temp, router) = test_router();
        rpc(&router, None, "register", registration()).await;
        let token = login(&router, "Lily", "admin-pw").await;

        let response = rpc(&router, Some(&token), "whoami", json!({})).await;
        assert_eq!(response["result"]["username"], "Lily");
        assert_eq!(response["result"]["role"], "admin");

        let response = rpc(&router, Some(&token), "dashboard", json!({"per_page": 5})).await;
        let orders = response["result"]["orders"].as_array().unwrap();
        assert_eq!(orders.len(), 1);
        let id = orders[0]["id"].as_i64().unwrap();

        let response = rpc(
            &router,
            Some(&token),
            "mark_paid",
            json!({"id": id, "payment_amount": "38"}),
        )
        .await;
        assert_eq!(response["result"]["paid"], true);

        // Admins need owner approval to delete
        let response = rpc(&router, Some(&token), "delete_submission", json!({"id": id})).await;
        assert_eq!(response["error"]["code"], -32011);

        let response = rpc(&router, Some(&token), "request_delete_approval", json!({"id": id})).await;
        let link = response["result"]["whatsapp_link"].as_str().unwrap();
        assert!(link.starts_with("https://wa.me/60111122222?text="));

        let response = rpc(&router, Some(&token), "admin_logout", json!({})).await;
        assert_eq!(response["result"]["success"], true);
        let response = rpc(&router, Some(&token), "whoami", json!({})).await;
        assert_eq!(response["error"]["code"], -32010);

        let response = rpc(&router, None, "last_logins", json!({})).await;
        assert!(response["result"]["last_logins"]["Lily"].is_string());
    }

    #[tokio::test]
    async fn test_downloads_require_a_token() {
        let (_temp, router) = test_router();

        for path in ["/admin/export.csv", "/admin/backup"] {
            let response = router
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_export_csv_download() {
        let (_temp, router) = test_router();
        rpc(&router, None, "register", registration()).await;
        let token = login(&router, "Wilson", "owner-pw").await;

        let response = router
            .clone()
            .oneshot(
                Request::get("/admin/export.csv")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains(EXPORT_FILE_NAME));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let csv = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(csv.contains("陈大文"));
    }
}
