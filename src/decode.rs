use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::SensorLinkError;

/// Decodes a pipeline payload into `T`.
///
/// A missing payload is treated as JSON `null`.
pub(crate) fn decode_payload<T: DeserializeOwned>(
    operation: &str,
    payload: Option<Value>,
) -> Result<T, SensorLinkError> {
    let value = payload.unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|err| {
        SensorLinkError::Decode(format!("unexpected response shape for {operation}: {err}"))
    })
}
