//! Inbound action messages.
//!
//! Every message is a JSON object tagged by `action`:
//!
//! ```json
//! {"action": "fetchStatus", "ticker": "AAPL"}
//! {"action": "fetchInsiderData", "ticker": "AAPL"}
//! {"action": "aiAnalyze", "ticker": "AAPL", "companyName": "Apple Inc.", "apiKey": "...", "provider": "gemini"}
//! {"action": "aiAnalyzeWithSearch", ...}
//! ```
//!
//! Responses are the per-action result contracts; failures are always
//! `{"success": false, "error": ..., "code": ...}`.

use crate::ai::AiRequest;
use crate::error::{Result, ScreenError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parsed inbound action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    FetchStatus { ticker: String },
    FetchInsiderData { ticker: String },
    AiAnalyze(AiRequest),
    /// Same as `AiAnalyze` with search forced on.
    AiAnalyzeWithSearch(AiRequest),
}

impl Action {
    /// Action name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Action::FetchStatus { .. } => "fetchStatus",
            Action::FetchInsiderData { .. } => "fetchInsiderData",
            Action::AiAnalyze(_) => "aiAnalyze",
            Action::AiAnalyzeWithSearch(_) => "aiAnalyzeWithSearch",
        }
    }
}

/// Parse an action message.
pub fn parse_action(message: Value) -> Result<Action> {
    let name = message
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| ScreenError::InvalidInput("missing 'action' field".into()))?
        .to_string();
    serde_json::from_value(message)
        .map_err(|e| ScreenError::InvalidInput(format!("bad '{name}' message: {e}")))
}

/// The failure contract for any action.
pub fn error_value(err: &ScreenError) -> Value {
    serde_json::json!({
        "success": false,
        "error": err.to_string(),
        "code": err.code(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Provider;
    use serde_json::json;

    #[test]
    fn test_parse_fetch_status() {
        let action = parse_action(json!({"action": "fetchStatus", "ticker": "AAPL"})).unwrap();
        assert_eq!(
            action,
            Action::FetchStatus {
                ticker: "AAPL".into()
            }
        );
        assert_eq!(action.name(), "fetchStatus");
    }

    #[test]
    fn test_parse_ai_analyze() {
        let action = parse_action(json!({
            "action": "aiAnalyzeWithSearch",
            "ticker": "AAPL",
            "companyName": "Apple Inc.",
            "apiKey": "k",
            "provider": "openai"
        }))
        .unwrap();
        let Action::AiAnalyzeWithSearch(req) = action else {
            panic!("wrong variant");
        };
        assert_eq!(req.provider, Provider::OpenAi);
        assert_eq!(req.company_name, "Apple Inc.");
    }

    #[test]
    fn test_unknown_and_missing_actions() {
        let err = parse_action(json!({"action": "deleteEverything"})).unwrap_err();
        assert!(matches!(err, ScreenError::InvalidInput(_)));
        assert!(err.to_string().contains("deleteEverything"));

        let err = parse_action(json!({"ticker": "AAPL"})).unwrap_err();
        assert!(err.to_string().contains("missing 'action'"));

        assert!(parse_action(json!({"action": "fetchStatus"})).is_err());
    }

    #[test]
    fn test_error_value() {
        let v = error_value(&ScreenError::Configuration("no key".into()));
        assert_eq!(v["success"], false);
        assert_eq!(v["code"], "E_CONFIG");
        assert_eq!(v["error"], "Configuration error: no key");
    }
}
