//! Parsing of bridge responses.
//!
//! The bridge reports success and failure in-band: mutations answer with an
//! array of `{"success": {...}}` / `{"error": {...}}` objects, reads answer
//! with a plain object or an array holding a single error.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Deserialize)]
struct BridgeError {
    #[serde(rename = "type")]
    code: u16,
    address: Option<String>,
    description: Option<String>,
}

/// Every error object in an array of result objects.
pub(crate) fn errors(entries: &[Value]) -> Vec<Error> {
    entries
        .iter()
        .filter_map(|entry| entry.get("error"))
        .filter_map(|error| serde_json::from_value::<BridgeError>(error.clone()).ok())
        .map(|e| Error::api(e.code, e.address.as_deref(), e.description.as_deref()))
        .collect()
}

/// Returns the first error object in an error array, if any.
pub(crate) fn first_error(value: &Value) -> Option<Error> {
    errors(value.as_array()?).into_iter().next()
}

/// Unwrap an array of result objects without treating errors as failure.
///
/// State writes can partially succeed, so the caller sorts through the
/// success and error entries itself.
pub(crate) fn into_entries(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(entries) => Ok(entries),
        other => Err(Error::UnexpectedResponse(other)),
    }
}

/// Expect an array of result objects.
pub(crate) fn expect_array(value: Value) -> Result<Vec<Value>> {
    if let Some(error) = first_error(&value) {
        return Err(error);
    }
    match value {
        Value::Array(entries) => Ok(entries),
        other => Err(Error::UnexpectedResponse(other)),
    }
}

/// Expect a plain JSON object.
pub(crate) fn expect_object(value: Value) -> Result<Map<String, Value>> {
    if let Some(error) = first_error(&value) {
        return Err(error);
    }
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::UnexpectedResponse(other)),
    }
}

pub(crate) fn successes(entries: &[Value]) -> impl Iterator<Item = &Map<String, Value>> {
    entries
        .iter()
        .filter_map(|entry| entry.get("success"))
        .filter_map(Value::as_object)
}

/// The first string found under `key` in any success object.
pub(crate) fn first_success_str(entries: &[Value], key: &str) -> Option<String> {
    successes(entries)
        .filter_map(|success| success.get(key))
        .find_map(Value::as_str)
        .map(String::from)
}

/// Decode `{"/lights/1/state/bri": 200}` success entries into
/// `("bri", 200)` pairs.
pub(crate) fn state_changes(entries: &[Value]) -> Vec<(String, Value)> {
    successes(entries)
        .flat_map(|success| success.iter())
        .filter(|(address, _)| address.starts_with('/'))
        .filter_map(|(address, value)| {
            address
                .rsplit('/')
                .next()
                .filter(|attribute| !attribute.is_empty())
                .map(|attribute| (attribute.to_string(), value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiErrorKind;
    use serde_json::json;

    #[test]
    fn test_error_array() {
        let value = json!([{"error": {
            "type": 101,
            "address": "",
            "description": "link button not pressed"
        }}]);
        let err = expect_array(value).unwrap_err();
        assert_eq!(err.api_kind(), Some(ApiErrorKind::LinkButtonNotPressed));
    }

    #[test]
    fn test_error_wins_over_success() {
        let value = json!([
            {"success": {"/lights/1/state/on": true}},
            {"error": {"type": 201, "address": "/lights/1/state/bri"}}
        ]);
        let err = expect_array(value).unwrap_err();
        assert_eq!(err.api_kind(), Some(ApiErrorKind::LightIsOff));
    }

    #[test]
    fn test_into_entries_keeps_partial_success() {
        let entries = into_entries(json!([
            {"success": {"/lights/1/state/on": false}},
            {"error": {"type": 201, "address": "/lights/1/state/bri"}}
        ]))
        .unwrap();
        assert_eq!(state_changes(&entries), vec![("on".to_string(), json!(false))]);
        let errors = errors(&entries);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].api_kind(), Some(ApiErrorKind::LightIsOff));
        assert!(into_entries(json!({})).is_err());
    }

    #[test]
    fn test_expect_object() {
        assert!(expect_object(json!({"lights": {}})).is_ok());
        assert_eq!(
            expect_object(json!("nope")).unwrap_err(),
            Error::UnexpectedResponse(json!("nope"))
        );
        let err = expect_object(json!([{"error": {"type": 1}}])).unwrap_err();
        assert_eq!(err.api_kind(), Some(ApiErrorKind::UnauthorizedUser));
    }

    #[test]
    fn test_first_success_str() {
        let entries = vec![json!({"success": {"username": "83b7780291a6ceffbe0bd049104df"}})];
        assert_eq!(
            first_success_str(&entries, "username").as_deref(),
            Some("83b7780291a6ceffbe0bd049104df")
        );
        assert!(first_success_str(&entries, "id").is_none());
    }

    #[test]
    fn test_state_changes() {
        let entries = vec![
            json!({"success": {"/lights/1/state/bri": 200}}),
            json!({"success": {"/groups/3/action/on": true}}),
            json!({"success": {"id": "4"}}),
        ];
        let changes = state_changes(&entries);
        assert_eq!(
            changes,
            vec![
                ("bri".to_string(), json!(200)),
                ("on".to_string(), json!(true)),
            ]
        );
    }
}
