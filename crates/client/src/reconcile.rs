//! Failure message reconstruction
//!
//! The proxy can fail with several envelope shapes depending on where the
//! failure happened. This reduces any of them to one readable line.

use replenish_common::Messages;
use serde_json::{Map, Value};

/// Joins validation messages taken from a `detail` array
pub const DETAIL_SEPARATOR: &str = " | ";

/// Build the message shown for a non-success proxy response.
///
/// Precedence: `detail` messages, then the `error` string, then the raw text
/// of a body that is not structured, then a status line template.
pub fn failure_message(status: u16, status_text: &str, body: &str, messages: &Messages) -> String {
    let fallback = || messages.status_error(status, status_text);

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => {
            let details = detail_messages(&map);
            if !details.is_empty() {
                return details.join(DETAIL_SEPARATOR);
            }
            map.get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(fallback)
        }
        Ok(Value::String(text)) => non_blank(text).unwrap_or_else(fallback),
        Ok(_) => fallback(),
        Err(_) => non_blank(body.to_string()).unwrap_or_else(fallback),
    }
}

/// `msg`/`message` strings from a FastAPI-style `detail` array, looked up at
/// the top level first and under `details` otherwise
fn detail_messages(map: &Map<String, Value>) -> Vec<String> {
    let entries = map
        .get("detail")
        .and_then(Value::as_array)
        .or_else(|| {
            map.get("details")
                .and_then(|details| details.get("detail"))
                .and_then(Value::as_array)
        });

    entries
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    entry
                        .get("msg")
                        .and_then(Value::as_str)
                        .or_else(|| entry.get("message").and_then(Value::as_str))
                        .map(str::to_string)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replenish_common::Locale;

    fn message(status: u16, status_text: &str, body: &str) -> String {
        failure_message(status, status_text, body, Messages::for_locale(Locale::En))
    }

    #[test]
    fn test_nested_detail_messages_are_joined() {
        let body = r#"{"details":{"detail":[{"msg":"bad cogs"},{"msg":"bad consumption"}]}}"#;
        assert_eq!(message(422, "Unprocessable Entity", body), "bad cogs | bad consumption");
    }

    #[test]
    fn test_detail_messages_override_error() {
        let body = r#"{
            "error": "Could not fetch data from the server",
            "status": 422,
            "details": {"detail": [{"loc": ["body", "cogs"], "msg": "field required"}]}
        }"#;
        assert_eq!(message(422, "Unprocessable Entity", body), "field required");
    }

    #[test]
    fn test_top_level_detail_and_message_key() {
        let body = r#"{"detail":[{"message":"first"},{"code":7},"plain",{"msg":"second"}]}"#;
        assert_eq!(message(400, "Bad Request", body), "first | second");
    }

    #[test]
    fn test_top_level_detail_wins_over_nested() {
        let body = r#"{"detail":[],"details":{"detail":[{"msg":"nested"}]},"error":"base"}"#;
        assert_eq!(message(400, "Bad Request", body), "base");
    }

    #[test]
    fn test_error_string_used_when_no_details() {
        let body = r#"{"error":"Invalid response from the server","raw":"oops"}"#;
        assert_eq!(message(502, "Bad Gateway", body), "Invalid response from the server");

        // A string `detail` is not an array of messages
        let body = r#"{"error":"Could not fetch data from the server","details":{"detail":"overloaded"}}"#;
        assert_eq!(message(503, "Service Unavailable", body), "Could not fetch data from the server");
    }

    #[test]
    fn test_raw_text_body() {
        assert_eq!(message(500, "Internal Server Error", "upstream exploded"), "upstream exploded");
        assert_eq!(message(500, "Internal Server Error", r#""quoted text""#), "quoted text");
    }

    #[test]
    fn test_status_template_fallback() {
        assert_eq!(message(404, "Not Found", ""), "Error 404: Not Found");
        assert_eq!(message(500, "", "   "), "Error 500: Could not reach the server");
        assert_eq!(message(418, "I'm a teapot", "[1,2]"), "Error 418: I'm a teapot");
        assert_eq!(message(400, "Bad Request", r#"{"status":400}"#), "Error 400: Bad Request");
    }
}
