use herald_assistant::ToolDefinition;

/// The four remote capabilities the assistant may invoke.
///
/// The set is fixed: registration always passes exactly these four,
/// regardless of which model or endpoint was selected.
///
/// # Examples
///
/// ```
/// use herald_toolset::Capability;
///
/// assert_eq!(Capability::ALL.len(), 4);
/// assert_eq!(
///     Capability::CreateIssue.wire_name(),
///     "GITHUB_CREATE_AN_ISSUE"
/// );
/// assert_eq!(
///     Capability::from_wire_name("SLACK_SENDS_A_MESSAGE_TO_A_SLACK_CHANNEL"),
///     Some(Capability::SendChatMessage)
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Fetch a pull request and its diff.
    ReadPullRequest,
    /// Attach a review to a pull request.
    CreatePullRequestReview,
    /// File a tracking issue.
    CreateIssue,
    /// Send a plain-text message to a chat channel.
    SendChatMessage,
}

impl Capability {
    /// Every capability, in registration order.
    pub const ALL: [Capability; 4] = [
        Capability::ReadPullRequest,
        Capability::CreatePullRequestReview,
        Capability::CreateIssue,
        Capability::SendChatMessage,
    ];

    /// Stable wire name used by the integration service.
    pub fn wire_name(self) -> &'static str {
        match self {
            Capability::ReadPullRequest => "GITHUB_GET_A_PULL_REQUEST",
            Capability::CreatePullRequestReview => "GITHUB_CREATE_A_REVIEW_FOR_A_PULL_REQUEST",
            Capability::CreateIssue => "GITHUB_CREATE_AN_ISSUE",
            Capability::SendChatMessage => "SLACK_SENDS_A_MESSAGE_TO_A_SLACK_CHANNEL",
        }
    }

    /// Look up a capability by its wire name.
    pub fn from_wire_name(name: &str) -> Option<Capability> {
        Capability::ALL.iter().copied().find(|c| c.wire_name() == name)
    }

    fn description(self) -> &'static str {
        match self {
            Capability::ReadPullRequest => "Fetch a pull request, including its diff and metadata",
            Capability::CreatePullRequestReview => {
                "Create a review on a pull request with a comment body"
            }
            Capability::CreateIssue => "Create an issue in a repository",
            Capability::SendChatMessage => "Send a plain-text message to a Slack channel",
        }
    }

    fn parameters(self) -> serde_json::Value {
        match self {
            Capability::ReadPullRequest => serde_json::json!({
                "type": "object",
                "properties": {
                    "owner": { "type": "string", "description": "Repository owner" },
                    "repo": { "type": "string", "description": "Repository name" },
                    "pull_number": { "type": "integer", "description": "Pull request number" }
                },
                "required": ["owner", "repo", "pull_number"]
            }),
            Capability::CreatePullRequestReview => serde_json::json!({
                "type": "object",
                "properties": {
                    "owner": { "type": "string", "description": "Repository owner" },
                    "repo": { "type": "string", "description": "Repository name" },
                    "pull_number": { "type": "integer", "description": "Pull request number" },
                    "body": { "type": "string", "description": "Review body in markdown" },
                    "event": {
                        "type": "string",
                        "enum": ["COMMENT", "APPROVE", "REQUEST_CHANGES"],
                        "description": "Review event type"
                    }
                },
                "required": ["owner", "repo", "pull_number", "body", "event"]
            }),
            Capability::CreateIssue => serde_json::json!({
                "type": "object",
                "properties": {
                    "owner": { "type": "string", "description": "Repository owner" },
                    "repo": { "type": "string", "description": "Repository name" },
                    "title": { "type": "string", "description": "Issue title" },
                    "body": { "type": "string", "description": "Issue body" }
                },
                "required": ["owner", "repo", "title"]
            }),
            Capability::SendChatMessage => serde_json::json!({
                "type": "object",
                "properties": {
                    "channel": { "type": "string", "description": "Destination channel id" },
                    "text": { "type": "string", "description": "Plain-text message" }
                },
                "required": ["channel", "text"]
            }),
        }
    }

    /// Provider-format tool definition for this capability.
    pub fn tool_definition(self) -> ToolDefinition {
        ToolDefinition::function(self.wire_name(), self.description(), self.parameters())
    }

    /// Tool definitions for the full capability set, in registration order.
    pub fn tool_definitions() -> Vec<ToolDefinition> {
        Capability::ALL.iter().map(|c| c.tool_definition()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_four_capabilities() {
        let tools = Capability::tool_definitions();
        assert_eq!(tools.len(), 4);
    }

    #[test]
    fn wire_names_round_trip() {
        for cap in Capability::ALL {
            assert_eq!(Capability::from_wire_name(cap.wire_name()), Some(cap));
        }
        assert_eq!(Capability::from_wire_name("GITHUB_DELETE_EVERYTHING"), None);
    }

    #[test]
    fn definitions_are_function_tools_with_object_schemas() {
        for tool in Capability::tool_definitions() {
            let json = serde_json::to_value(&tool).unwrap();
            assert_eq!(json["type"], "function");
            assert_eq!(json["function"]["parameters"]["type"], "object");
            assert!(json["function"]["name"].as_str().unwrap().len() > 0);
        }
    }

    #[test]
    fn chat_schema_requires_channel_and_text() {
        let tool = Capability::SendChatMessage.tool_definition();
        let json = serde_json::to_value(&tool).unwrap();
        let required = json["function"]["parameters"]["required"].as_array().unwrap();
        assert!(required.contains(&serde_json::json!("channel")));
        assert!(required.contains(&serde_json::json!("text")));
    }
}
