//! Admin handlers. Every function here runs with an authenticated session.

use super::{get_amount_param, parse_params, require_i64_param, run_blocking};
use crate::server::AppState;
use ghostfest_core::{AdminSession, DashboardQuery, EditForm};
use serde_json::{json, Value};

pub async fn admin_logout(state: &AppState, token: &str) -> ghostfest_core::Result<Value> {
    if let Some(session) = state.sessions.remove(token).await {
        run_blocking(state, move |api| api.logout(&session)).await?;
    }
    Ok(json!(true))
}

pub async fn whoami(
    _state: &AppState,
    session: &AdminSession,
    _params: &Value,
) -> ghostfest_core::Result<Value> {
    Ok(serde_json::to_value(session)?)
}

pub async fn dashboard(
    state: &AppState,
    session: &AdminSession,
    params: &Value,
) -> ghostfest_core::Result<Value> {
    let query: DashboardQuery = parse_params(params)?;
    let session = session.clone();
    let view = run_blocking(state, move |api| api.dashboard(&session, &query)).await?;
    Ok(serde_json::to_value(view)?)
}

pub async fn refresh(
    state: &AppState,
    _session: &AdminSession,
    _params: &Value,
) -> ghostfest_core::Result<Value> {
    let orders = run_blocking(state, |api| api.refresh()).await?;
    Ok(serde_json::to_value(orders)?)
}

pub async fn mark_paid(
    state: &AppState,
    session: &AdminSession,
    params: &Value,
) -> ghostfest_core::Result<Value> {
    let id = require_i64_param(params, "id", "id")?;
    let amount = get_amount_param(params, "payment_amount", "paymentAmount");
    let session = session.clone();
    let result =
        run_blocking(state, move |api| api.mark_paid(&session, id, amount.as_deref())).await?;
    Ok(serde_json::to_value(result)?)
}

pub async fn get_submission(
    state: &AppState,
    _session: &AdminSession,
    params: &Value,
) -> ghostfest_core::Result<Value> {
    let id = require_i64_param(params, "id", "id")?;
    let view = run_blocking(state, move |api| api.edit_view(id)).await?;
    Ok(serde_json::to_value(view)?)
}

pub async fn edit_submission(
    state: &AppState,
    session: &AdminSession,
    params: &Value,
) -> ghostfest_core::Result<Value> {
    let id = require_i64_param(params, "id", "id")?;
    let form: EditForm = match params.get("changes") {
        Some(changes) => parse_params(changes)?,
        None => parse_params(params)?,
    };
    let session = session.clone();
    let updated = run_blocking(state, move |api| api.edit(&session, id, form)).await?;
    Ok(serde_json::to_value(updated)?)
}

pub async fn send_reminder(
    state: &AppState,
    session: &AdminSession,
    params: &Value,
) -> ghostfest_core::Result<Value> {
    let id = require_i64_param(params, "id", "id")?;
    let session = session.clone();
    let response = run_blocking(state, move |api| api.send_reminder(&session, id)).await?;
    Ok(serde_json::to_value(response)?)
}

pub async fn toggle_pause(
    state: &AppState,
    session: &AdminSession,
    _params: &Value,
) -> ghostfest_core::Result<Value> {
    let session = session.clone();
    let paused = run_blocking(state, move |api| api.toggle_pause(&session)).await?;
    Ok(json!(paused))
}

pub async fn request_pause_approval(
    state: &AppState,
    session: &AdminSession,
    _params: &Value,
) -> ghostfest_core::Result<Value> {
    let session = session.clone();
    let link = run_blocking(state, move |api| api.request_pause_approval(&session)).await?;
    Ok(serde_json::to_value(link)?)
}

pub async fn undo_edit(
    state: &AppState,
    session: &AdminSession,
    _params: &Value,
) -> ghostfest_core::Result<Value> {
    let session = session.clone();
    let restored = run_blocking(state, move |api| api.undo_edit(&session)).await?;
    Ok(serde_json::to_value(restored)?)
}

pub async fn undo_delete(
    state: &AppState,
    session: &AdminSession,
    _params: &Value,
) -> ghostfest_core::Result<Value> {
    let session = session.clone();
    let restored = run_blocking(state, move |api| api.undo_delete(&session)).await?;
    Ok(serde_json::to_value(restored)?)
}

pub async fn owner_whatsapp(
    state: &AppState,
    _session: &AdminSession,
    _params: &Value,
) -> ghostfest_core::Result<Value> {
    Ok(json!(state.api.owner_phone()?))
}

pub async fn delete_submission(
    state: &AppState,
    session: &AdminSession,
    params: &Value,
) -> ghostfest_core::Result<Value> {
    let id = require_i64_param(params, "id", "id")?;
    let session = session.clone();
    run_blocking(state, move |api| api.delete(&session, id)).await?;
    Ok(json!(true))
}

pub async fn request_delete_approval(
    state: &AppState,
    session: &AdminSession,
    params: &Value,
) -> ghostfest_core::Result<Value> {
    let id = require_i64_param(params, "id", "id")?;
    let session = session.clone();
    let link =
        run_blocking(state, move |api| api.request_delete_approval(&session, id)).await?;
    Ok(serde_json::to_value(link)?)
}

pub async fn history(
    state: &AppState,
    _session: &AdminSession,
    _params: &Value,
) -> ghostfest_core::Result<Value> {
    let logs = run_blocking(state, |api| api.history()).await?;
    Ok(serde_json::to_value(logs)?)
}
