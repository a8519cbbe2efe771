//! Run submission and the trace it produces

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Natural-language intent submitted by the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

impl RunRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            agent_id: None,
        }
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Whitespace-only intents are never submitted
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Final summary of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One step of the run trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Step-specific fields such as `progress` or `fix`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response to a run submission.
///
/// Unknown top-level fields (for example a gateway error envelope) are kept
/// in `extra` so the payload can be shown to the operator verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RunSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<RunEvent>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunResult {
    /// Decodes a run response, keeping an object whose known fields have an
    /// unexpected shape as untyped `extra`
    pub fn from_value(body: Value) -> Result<Self, serde_json::Error> {
        match serde_json::from_value::<Self>(body.clone()) {
            Ok(result) => Ok(result),
            Err(err) => match body {
                Value::Object(extra) => Ok(Self {
                    extra,
                    ..Self::default()
                }),
                _ => Err(err),
            },
        }
    }

    /// Ordered trace, empty when the backend sent none
    pub fn events(&self) -> &[RunEvent] {
        self.events.as_deref().unwrap_or_default()
    }

    pub fn execution_id(&self) -> Option<&str> {
        self.result.as_ref()?.execution_id.as_deref()
    }

    /// Error reported in the payload itself, if any
    pub fn error(&self) -> Option<&str> {
        self.extra.get("error").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_requests_are_detected() {
        assert!(RunRequest::new("   \n").is_blank());
        assert!(!RunRequest::new("plan a launch").is_blank());
    }

    #[test]
    fn agent_id_is_omitted_when_unset() {
        let body = serde_json::to_value(RunRequest::new("hi")).unwrap();
        assert_eq!(body, json!({ "text": "hi" }));

        let body = serde_json::to_value(RunRequest::new("hi").with_agent("default")).unwrap();
        assert_eq!(body, json!({ "text": "hi", "agent_id": "default" }));
    }

    #[test]
    fn run_result_keeps_payload_verbatim() {
        let payload = json!({
            "result": { "execution_id": "e1", "result": "ok" },
            "events": [{ "event": "start" }, { "event": "node", "node": "n1" }, { "event": "end" }]
        });

        let parsed: RunResult = serde_json::from_value(payload.clone()).unwrap();
        assert_eq!(parsed.execution_id(), Some("e1"));
        assert_eq!(parsed.events().len(), 3);
        assert_eq!(parsed.events()[1].node.as_deref(), Some("n1"));
        assert_eq!(serde_json::to_value(&parsed).unwrap(), payload);
    }

    #[test]
    fn step_specific_event_fields_are_kept() {
        let payload = json!({
            "result": { "execution_id": "e2", "result": "ok" },
            "events": [
                { "event": "start", "node": "n1", "progress": { "step": 1, "total": 3 } },
                { "event": "healing_failed", "node": "n1", "fix": { "strategy": "retry", "attempts": 2 } },
                { "event": "end" }
            ]
        });

        let parsed: RunResult = serde_json::from_value(payload.clone()).unwrap();
        assert_eq!(parsed.events()[0].extra["progress"]["total"], 3);
        assert_eq!(parsed.events()[1].extra["fix"]["strategy"], "retry");
        assert_eq!(serde_json::to_value(&parsed).unwrap(), payload);
    }

    #[test]
    fn unexpected_shape_is_kept_untyped() {
        let payload = json!({ "events": "not-a-list", "result": 7 });

        let parsed = RunResult::from_value(payload.clone()).unwrap();
        assert!(parsed.events().is_empty());
        assert_eq!(serde_json::to_value(&parsed).unwrap(), payload);

        assert!(RunResult::from_value(json!("plain text")).is_err());
    }

    #[test]
    fn error_envelope_survives_as_extra_fields() {
        let payload = json!({ "error": "backend_unreachable", "detail": "timed out" });

        let parsed: RunResult = serde_json::from_value(payload.clone()).unwrap();
        assert_eq!(parsed.error(), Some("backend_unreachable"));
        assert!(parsed.events().is_empty());
        assert_eq!(serde_json::to_value(&parsed).unwrap(), payload);
    }
}
