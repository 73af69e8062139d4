use serde::{Deserialize, Serialize};

/// An inbound trigger event from the integration service.
///
/// The payload is deliberately opaque: it is rendered to text and handed to
/// the assistant as-is, never parsed or validated here.
///
/// # Examples
///
/// ```
/// use herald_core::TriggerEvent;
///
/// let event: TriggerEvent = serde_json::from_str(
///     r#"{"trigger_name":"github_pull_request_event","payload":{"pull_request":{"number":42}}}"#,
/// )
/// .unwrap();
/// assert!(event.matches("github_pull_request_event"));
/// assert!(event.payload_text().contains("42"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Name of the trigger that produced this event.
    #[serde(default)]
    pub trigger_name: String,
    /// Raw event payload as delivered.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl TriggerEvent {
    /// Render the payload as the text submitted to the assistant.
    pub fn payload_text(&self) -> String {
        self.payload.to_string()
    }

    /// Whether this event belongs to `trigger` (names compare case-insensitively).
    pub fn matches(&self, trigger: &str) -> bool {
        self.trigger_name.eq_ignore_ascii_case(trigger)
    }
}
