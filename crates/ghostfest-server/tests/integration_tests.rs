//! Integration tests for the ghostfest-server binary.
//!
//! These spawn the real server on a free port and drive it over HTTP the
//! way the registration page and the dashboard do.

use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncBufReadExt;

/// Make an RPC call and return the `result`, or the `error` as a string.
async fn rpc_call(
    port: u16,
    token: Option<&str>,
    method: &str,
    params: Value,
) -> Result<Value, String> {
    let json = rpc_call_raw(port, token, method, params).await?;
    if let Some(error) = json.get("error") {
        return Err(error.to_string());
    }
    Ok(json.get("result").cloned().unwrap_or(Value::Null))
}

/// Make an RPC call and return the full JSON-RPC payload.
async fn rpc_call_raw(
    port: u16,
    token: Option<&str>,
    method: &str,
    params: Value,
) -> Result<Value, String> {
    let client = reqwest::Client::new();
    let mut request = client
        .post(format!("http://127.0.0.1:{}/rpc", port))
        .json(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .timeout(Duration::from_secs(10));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response = request.send().await.map_err(|e| e.to_string())?;

    response.json::<Value>().await.map_err(|e| e.to_string())
}

/// Check health endpoint.
async fn check_health(port: u16) -> bool {
    let client = reqwest::Client::new();
    if let Ok(response) = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        if let Ok(json) = response.json::<Value>().await {
            return json.get("status").and_then(|v| v.as_str()) == Some("ok");
        }
    }
    false
}

/// Wait for server to be ready.
async fn wait_for_server(port: u16, timeout_secs: u64) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(timeout_secs) {
        if check_health(port).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

struct ServerHandle {
    child: tokio::process::Child,
    port: u16,
    stdout_drain: Option<tokio::task::JoinHandle<()>>,
}

impl ServerHandle {
    async fn stop(mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.start_kill();
    }
}

/// Start the server binary and wait until `/health` is ready.
async fn start_server(data_dir: &std::path::Path) -> Result<ServerHandle, String> {
    let binary = PathBuf::from(env!("CARGO_BIN_EXE_ghostfest-server"));

    let mut child = tokio::process::Command::new(&binary)
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg("0")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--owner-phone")
        .arg("60111122222")
        .arg("--public-url")
        .arg("https://ghostfest.example")
        .arg("--account")
        .arg("Wilson:owner:owner-pw")
        .arg("--account")
        .arg("Lily:admin:admin-pw")
        .env_remove("GHOSTFEST_ACCOUNTS")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("failed to spawn ghostfest-server: {e}"))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| "failed to capture stdout".to_string())?;
    let mut lines = tokio::io::BufReader::new(stdout).lines();

    let mut discovered_port: Option<u16> = None;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(250), lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                if let Some(value) = line.strip_prefix("SERVER_PORT=") {
                    let parsed = value
                        .trim()
                        .parse::<u16>()
                        .map_err(|e| format!("invalid SERVER_PORT value '{value}': {e}"))?;
                    discovered_port = Some(parsed);
                    break;
                }
            }
            Ok(Ok(None)) => break,
            Ok(Err(err)) => return Err(format!("failed to read server stdout: {err}")),
            Err(_) => continue,
        }
    }

    let port = discovered_port
        .ok_or_else(|| "SERVER_PORT line not emitted by ghostfest-server".to_string())?;
    if !wait_for_server(port, 15).await {
        return Err(format!("ghostfest-server failed health check on port {port}"));
    }

    let stdout_drain =
        tokio::spawn(async move { while let Ok(Some(_)) = lines.next_line().await {} });

    Ok(ServerHandle {
        child,
        port,
        stdout_drain: Some(stdout_drain),
    })
}

fn registration(name_cn: &str, phone: &str) -> Value {
    json!({
        "boat": "yes",
        "gender": "female",
        "name_cn": name_cn,
        "country_code": "+60",
        "phone": phone,
        "payment_method": "bank_transfer",
        "entries": [
            {"option": "祖先", "name_cn": "林公", "calendar": "solar", "year": "1948", "month": "3", "day": "12"},
            {"option": "无主孤魂", "name_cn": "", "calendar": "", "year": ""}
        ]
    })
}

fn error_code(result: Result<Value, String>) -> i64 {
    let err = result.expect_err("call should fail");
    let error: Value = serde_json::from_str(&err).expect("error is JSON");
    error["code"].as_i64().expect("error has a code")
}

async fn login(port: u16, username: &str, password: &str) -> String {
    let result = rpc_call(
        port,
        None,
        "admin_login",
        json!({"username": username, "password": password}),
    )
    .await
    .expect("login succeeds");
    result["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn test_public_registration_flow() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_server(temp_dir.path()).await.expect("server starts");
    let port = server.port;

    let status = rpc_call(port, None, "get_intake_status", json!({})).await.unwrap();
    assert_eq!(status["paused"], false);

    let created = rpc_call(port, None, "register", registration("林美丽", "0123334444"))
        .await
        .unwrap();
    assert_eq!(created["status"], "created");
    assert_eq!(created["order_id"], "4444");

    // Same name and phone asks for confirmation before overwriting
    let again = rpc_call(port, None, "register", registration("林美丽", "0123334444"))
        .await
        .unwrap();
    assert_eq!(again["status"], "needs_confirmation");

    let review = rpc_call(
        port,
        None,
        "review",
        json!({"order_id": "4444", "phone": created["phone"]}),
    )
    .await
    .unwrap();
    assert_eq!(review["order"]["name_cn"], "林美丽");
    assert_eq!(review["entries"].as_array().unwrap().len(), 2);

    let check = rpc_call(port, None, "check_order", json!({"order_id": "4444"}))
        .await
        .unwrap();
    assert_eq!(check["status"], "single");

    let missing = rpc_call(port, None, "check_order", json!({"order_id": "0000"}))
        .await
        .unwrap();
    assert_eq!(missing["status"], "not_found");

    server.stop().await;
}

#[tokio::test]
async fn test_staff_dashboard_flow() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_server(temp_dir.path()).await.expect("server starts");
    let port = server.port;

    rpc_call(port, None, "register", registration("林美丽", "0123334444"))
        .await
        .unwrap();

    // Admin calls without a token are refused
    assert_eq!(
        error_code(rpc_call(port, None, "dashboard", json!({})).await),
        -32010
    );
    assert_eq!(
        error_code(
            rpc_call(
                port,
                None,
                "admin_login",
                json!({"username": "Lily", "password": "nope"})
            )
            .await
        ),
        -32010
    );

    let token = login(port, "Lily", "admin-pw").await;
    let dashboard = rpc_call(port, Some(&token), "dashboard", json!({"search": "林"}))
        .await
        .unwrap();
    assert_eq!(dashboard["num_orders"], 1);
    let id = dashboard["orders"][0]["id"].as_i64().unwrap();

    let paid = rpc_call(
        port,
        Some(&token),
        "mark_paid",
        json!({"id": id, "payment_amount": 0}),
    )
    .await
    .unwrap();
    assert_eq!(paid["paid"], true);

    // Admins cannot pause intake directly
    assert_eq!(
        error_code(rpc_call(port, Some(&token), "toggle_pause", json!({})).await),
        -32011
    );

    let owner = login(port, "Wilson", "owner-pw").await;
    let paused = rpc_call(port, Some(&owner), "toggle_pause", json!({}))
        .await
        .unwrap();
    assert_eq!(paused["paused"], true);
    assert_eq!(
        error_code(
            rpc_call(port, None, "register", registration("王小明", "0198887777")).await
        ),
        -32012
    );

    rpc_call(port, Some(&owner), "delete_submission", json!({"id": id}))
        .await
        .unwrap();
    let restored = rpc_call(port, Some(&owner), "undo_delete", json!({}))
        .await
        .unwrap();
    assert_eq!(restored["submission"]["id"], id);

    let history = rpc_call(port, Some(&owner), "history", json!({}))
        .await
        .unwrap();
    assert!(!history["logs"].as_array().unwrap().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_downloads() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_server(temp_dir.path()).await.expect("server starts");
    let port = server.port;

    rpc_call(port, None, "register", registration("林美丽", "0123334444"))
        .await
        .unwrap();
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://127.0.0.1:{}/admin/export.csv", port))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);

    let token = login(port, "Wilson", "owner-pw").await;
    let response = client
        .get(format!("http://127.0.0.1:{}/admin/export.csv", port))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let csv = response.text().await.unwrap();
    assert!(csv.contains("林美丽"));

    let response = client
        .get(format!("http://127.0.0.1:{}/admin/backup", port))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let bytes = response.bytes().await.unwrap();
    assert!(bytes.starts_with(b"SQLite format 3"));

    server.stop().await;
}

#[tokio::test]
async fn test_bad_account_seed_exits() {
    let temp_dir = TempDir::new().unwrap();
    let status = tokio::process::Command::new(env!("CARGO_BIN_EXE_ghostfest-server"))
        .arg("--port")
        .arg("0")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .arg("--account")
        .arg("Wilson:guest:pw")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .unwrap();
    assert!(!status.success());
}
