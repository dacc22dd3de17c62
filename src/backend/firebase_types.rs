use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::BackendError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PasswordRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub return_secure_token: bool,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct PasswordResponse {
    pub local_id: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: String,
}

#[derive(Deserialize, Debug)]
pub(super) struct RefreshResponse {
    pub user_id: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: String,
}

#[derive(Deserialize, Debug)]
pub(super) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Deserialize, Debug)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub(super) struct RunQueryItem {
    #[serde(default)]
    pub document: Option<FirestoreDocument>,
}

#[derive(Deserialize, Debug)]
pub(super) struct FirestoreDocument {
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Maps an Identity Toolkit error message onto our error kinds.
pub(super) fn identity_error(status: u16, message: &str) -> BackendError {
    let code = message.split([' ', ':']).next().unwrap_or(message);
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
        | "USER_DISABLED" => BackendError::InvalidCredentials,
        "EMAIL_EXISTS" => BackendError::EmailExists,
        "WEAK_PASSWORD" => BackendError::WeakPassword(message.to_string()),
        "PERMISSION_DENIED" => BackendError::PermissionDenied(message.to_string()),
        _ => BackendError::Status {
            status,
            message: message.to_string(),
        },
    }
}

/// Plain JSON to a Firestore typed value.
pub(super) fn to_firestore(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // integerValue travels as a string
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(to_firestore).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": fields_to_firestore(map) } }),
    }
}

pub(super) fn fields_to_firestore(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (k.clone(), to_firestore(v)))
        .collect()
}

/// Firestore typed value back to plain JSON. Timestamps become RFC 3339 strings.
pub(super) fn from_firestore(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = obj.iter().next() else {
        return Value::Null;
    };
    match kind.as_str() {
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map_or(Value::Null, Value::from),
        "doubleValue" => inner.as_f64().map_or(Value::Null, Value::from),
        "stringValue" | "timestampValue" | "referenceValue" | "booleanValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|vs| vs.iter().map(from_firestore).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(fields_from_firestore)
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

pub(super) fn fields_from_firestore(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (k.clone(), from_firestore(v)))
        .collect()
}
