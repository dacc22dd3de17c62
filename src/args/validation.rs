use serde_json::Value;
use std::{fs, path::PathBuf};

use super::types::{Args, BackendKind};

impl Args {
    /// # Errors
    ///
    /// Will return `Err` if the firebase backend is missing its credentials,
    /// a seed file is given for a backend that can't take one, or the
    /// message lifetime is zero
    pub fn validate(&self) -> Result<(), String> {
        if self.message_ttl_ms == 0 {
            return Err("--message-ttl-ms must be greater than zero".to_string());
        }
        if self.backend == BackendKind::Firebase {
            if self.firebase_api_key.as_deref().is_none_or(str::is_empty) {
                return Err("Firebase API key is required".to_string());
            }
            if self.firebase_project_id.as_deref().is_none_or(str::is_empty) {
                return Err("Firebase project id is required".to_string());
            }
            if self.seed_json.is_some() {
                return Err("--seed-json can only be used with the memory backend".to_string());
            }
        }
        Ok(())
    }
}

/// # Errors
///
/// Will return `Err` if the file is not readable or is not valid json in the
/// seed format
pub fn check_readable_file_and_json(file: &str) -> Result<Value, String> {
    let path = PathBuf::from(file);
    if !path.is_file() || fs::metadata(&path).is_err() {
        return Err(format!("The json file '{file}' is not readable."));
    }
    let contents =
        fs::read_to_string(&path).map_err(|e| format!("The json file '{file}' is not readable: {e}"))?;
    let json: Value = serde_json::from_str(&contents)
        .map_err(|e| format!("The json file '{file}' is not valid json: {e}"))?;
    validate_json_format(&json)?;
    Ok(json)
}

/// Validate the seed file format
/// format we expect is this:
/// { "accounts": [{"name": "..", "email": "..", "password": ".."}, ...]
/// , "scores": [{"player": "..", "course": "..", "score": <number>, "user": ".."}, ...]
/// , "players": [{"name": "..", "email": "..", "handicap": "..", "user": ".."}, ...]
/// }
///
/// # Errors
///
/// Will return `Err` if the json is not in the correct format
pub fn validate_json_format(json: &Value) -> Result<(), String> {
    use FieldKind::{Number, Str};

    let Some(top) = json.as_object() else {
        return Err("The json file is not in the correct format. Expected an object.".to_string());
    };

    let expected_keys = ["accounts", "scores", "players"];
    for key in top.keys() {
        if !expected_keys.contains(&key.as_str()) {
            return Err(format!(
                "The json file is not in the correct format. Expected keys: {expected_keys:?}"
            ));
        }
    }

    check_entries(json, "accounts", &[("name", Str), ("email", Str), ("password", Str)])?;
    check_entries(
        json,
        "scores",
        &[("player", Str), ("course", Str), ("score", Number), ("user", Str)],
    )?;
    check_entries(
        json,
        "players",
        &[("name", Str), ("email", Str), ("handicap", Str), ("user", Str)],
    )?;
    Ok(())
}

#[derive(Clone, Copy)]
enum FieldKind {
    Str,
    Number,
}

impl FieldKind {
    fn accepts(self, v: &Value) -> bool {
        match self {
            Self::Str => v.is_string(),
            Self::Number => v.is_number(),
        }
    }
}

fn check_entries(json: &Value, key: &str, fields: &[(&str, FieldKind)]) -> Result<(), String> {
    let Some(entries) = json.get(key) else {
        return Ok(());
    };
    let Some(entries) = entries.as_array() else {
        return Err(format!("The json key {key} is not in the correct format. Expected an array."));
    };
    for entry in entries {
        for (field, kind) in fields {
            if !entry.get(*field).is_some_and(|v| kind.accepts(v)) {
                return Err(format!(
                    "The json key {key}.{field} is missing or has the wrong type."
                ));
            }
        }
    }
    Ok(())
}
