//! Response wrapping for frontend compatibility.
//!
//! The registration page and dashboard expect `{success: bool, ...data}`
//! for scalar and list results, while structured results are returned as-is.

use serde_json::{json, Value};

/// Wrap API responses to match the frontend's expected format.
pub fn wrap_response(method: &str, result: Value) -> Value {
    match method {
        // Scalar wrappers
        "get_intake_status" | "toggle_pause" => {
            json!({
                "success": true,
                "paused": result.as_bool().unwrap_or(false)
            })
        }

        "owner_whatsapp" => {
            json!({
                "success": true,
                "phone": if result.is_null() { json!("") } else { result }
            })
        }

        // List wrappers
        "refresh" => {
            json!({
                "success": true,
                "orders": if result.is_null() { json!([]) } else { result }
            })
        }

        "history" => {
            json!({
                "success": true,
                "logs": if result.is_null() { json!([]) } else { result }
            })
        }

        "last_logins" => {
            json!({
                "success": true,
                "last_logins": if result.is_null() { json!({}) } else { result }
            })
        }

        // Restored records
        "undo_edit" | "undo_delete" => {
            json!({
                "success": true,
                "submission": result
            })
        }

        // Bool methods
        "admin_logout" | "delete_submission" => {
            json!({
                "success": result.as_bool().unwrap_or(false)
            })
        }

        // send_reminder already carries {success, data | error}
        "send_reminder" => result,

        // Default: return as-is (tagged outcomes, views and links)
        _ => result,
    }
}
