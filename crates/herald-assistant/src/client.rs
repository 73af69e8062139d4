use std::time::Duration;

use herald_core::{ApiTarget, HeraldError};
use serde::de::DeserializeOwned;

use crate::types::{
    Assistant, AssistantId, CreateAssistantRequest, Message, MessageRole, Run, RunId, Thread,
    ThreadId, ToolOutput,
};

/// Client for an OpenAI-compatible Assistants API endpoint.
///
/// Works against the direct provider or any proxy exposing the same surface;
/// the base URL and credential come from the resolved [`ApiTarget`].
///
/// # Examples
///
/// ```
/// use herald_core::ApiTarget;
/// use herald_assistant::AssistantClient;
///
/// let target = ApiTarget::Direct { api_key: "sk-test".into() };
/// let client = AssistantClient::new(&target).unwrap();
/// ```
pub struct AssistantClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AssistantClient {
    /// Create a new client for the selected endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Assistant`] if the HTTP client cannot be built.
    pub fn new(target: &ApiTarget) -> Result<Self, HeraldError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| HeraldError::Assistant(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: target.base_url().trim_end_matches('/').to_string(),
            api_key: target.api_key().to_string(),
        })
    }

    /// Register the assistant: name, description, instructions, model, and
    /// the full capability set. Called exactly once at startup.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Assistant`] on transport errors or non-success
    /// responses; the caller treats this as fatal to startup.
    pub async fn create_assistant(
        &self,
        request: &CreateAssistantRequest,
    ) -> Result<Assistant, HeraldError> {
        self.post("/assistants", &serde_json::to_value(request)?)
            .await
    }

    /// Create an empty conversation thread.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Assistant`] on transport or API errors.
    pub async fn create_thread(&self) -> Result<Thread, HeraldError> {
        self.post("/threads", &serde_json::json!({})).await
    }

    /// Append a message to `thread`.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Assistant`] on transport or API errors.
    pub async fn create_message(
        &self,
        thread: &ThreadId,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, HeraldError> {
        let body = serde_json::json!({ "role": role, "content": content });
        self.post(&format!("/threads/{thread}/messages"), &body)
            .await
    }

    /// Start a run of `assistant` against `thread`.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Assistant`] on transport or API errors.
    pub async fn create_run(
        &self,
        thread: &ThreadId,
        assistant: &AssistantId,
    ) -> Result<Run, HeraldError> {
        let body = serde_json::json!({ "assistant_id": assistant });
        self.post(&format!("/threads/{thread}/runs"), &body).await
    }

    /// Fetch the current state of a run, including any pending tool calls.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Assistant`] on transport or API errors.
    pub async fn get_run(&self, thread: &ThreadId, run: &RunId) -> Result<Run, HeraldError> {
        let url = format!("{}/threads/{thread}/runs/{run}", self.base_url);
        let response = self
            .request(self.client.get(&url))
            .send()
            .await
            .map_err(|e| HeraldError::Assistant(format!("request failed: {e}")))?;
        Self::read_json(response).await
    }

    /// Submit executed tool outputs so a blocked run can continue.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Assistant`] on transport or API errors.
    pub async fn submit_tool_outputs(
        &self,
        thread: &ThreadId,
        run: &RunId,
        outputs: &[ToolOutput],
    ) -> Result<Run, HeraldError> {
        let body = serde_json::json!({ "tool_outputs": outputs });
        self.post(
            &format!("/threads/{thread}/runs/{run}/submit_tool_outputs"),
            &body,
        )
        .await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, HeraldError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .request(self.client.post(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| HeraldError::Assistant(format!("request failed: {e}")))?;
        Self::read_json(response).await
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, HeraldError> {
        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(HeraldError::Assistant(format!(
                "assistant API error {status}: {body_text}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| HeraldError::Assistant(format!("failed to parse response: {e}")))
    }
}
