pub mod config;
pub mod core;
pub mod grades;

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::ipc::error::err;
use crate::ipc::types::Request;

/// Deserializes `params[key]`, answering `bad_params` when it is missing or malformed.
pub(crate) fn required_param<T: DeserializeOwned>(
    req: &Request,
    key: &str,
) -> Result<T, serde_json::Value> {
    let Some(raw) = req.params.get(key).filter(|v| !v.is_null()) else {
        return Err(err(&req.id, "bad_params", format!("missing params.{}", key), None));
    };
    serde_json::from_value(raw.clone()).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("invalid params.{}", key),
            Some(json!({ "reason": e.to_string() })),
        )
    })
}

pub(crate) fn optional_param<T: DeserializeOwned>(
    req: &Request,
    key: &str,
) -> Result<Option<T>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(_) => required_param(req, key).map(Some),
    }
}
