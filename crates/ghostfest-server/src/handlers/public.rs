//! Public handlers: intake, order lookup and staff login.

use super::{parse_params, require_str_param, run_blocking};
use crate::server::AppState;
use ghostfest_core::RegistrationForm;
use serde_json::{json, Value};
use tracing::info;

pub async fn get_intake_status(state: &AppState, _params: &Value) -> ghostfest_core::Result<Value> {
    let paused = run_blocking(state, |api| api.intake_paused()).await?;
    Ok(json!(paused))
}

pub async fn register(state: &AppState, params: &Value) -> ghostfest_core::Result<Value> {
    let form: RegistrationForm = parse_params(params)?;
    let outcome = run_blocking(state, move |api| api.register(form)).await?;
    Ok(serde_json::to_value(outcome)?)
}

pub async fn review(state: &AppState, params: &Value) -> ghostfest_core::Result<Value> {
    let order_id = require_str_param(params, "order_id", "orderId")?;
    let phone = require_str_param(params, "phone", "phone")?;
    let view = run_blocking(state, move |api| api.review(&order_id, &phone)).await?;
    Ok(serde_json::to_value(view)?)
}

pub async fn check_order(state: &AppState, params: &Value) -> ghostfest_core::Result<Value> {
    let code = require_str_param(params, "order_id", "orderId")?;
    let result = run_blocking(state, move |api| api.check_order(&code)).await?;
    Ok(serde_json::to_value(result)?)
}

pub async fn select_entry(state: &AppState, params: &Value) -> ghostfest_core::Result<Value> {
    let selection = require_str_param(params, "selection", "selection")?;
    let order = run_blocking(state, move |api| api.select_entry(&selection)).await?;
    Ok(serde_json::to_value(order)?)
}

pub async fn last_logins(state: &AppState, _params: &Value) -> ghostfest_core::Result<Value> {
    let logins = run_blocking(state, |api| api.last_logins()).await?;
    Ok(serde_json::to_value(logins)?)
}

pub async fn admin_login(state: &AppState, params: &Value) -> ghostfest_core::Result<Value> {
    let username = require_str_param(params, "username", "username")?;
    let password = require_str_param(params, "password", "password")?;
    let session = run_blocking(state, move |api| api.login(&username, &password)).await?;
    let role = session.role;
    let username = session.username.clone();
    let token = state.sessions.create(session).await;
    info!("Issued session for '{}'", username);
    Ok(json!({
        "token": token,
        "username": username,
        "role": role,
    }))
}
