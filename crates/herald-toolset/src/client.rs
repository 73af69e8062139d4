use std::time::Duration;

use herald_core::HeraldError;

use crate::catalog::Capability;

/// Client for the tool-integration service's action API.
///
/// Executes the concrete actions (fetch PR, post review, create issue, send
/// chat message) the model requests during a run. The service owns the
/// provider connections; this client only relays name + arguments.
///
/// # Examples
///
/// ```
/// use herald_toolset::ToolsetClient;
///
/// let client = ToolsetClient::new("https://backend.composio.dev", "ck-test").unwrap();
/// ```
pub struct ToolsetClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ToolsetClient {
    /// Create a new client for the integration service.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Toolset`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, HeraldError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| HeraldError::Toolset(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Execute one action and return the service's raw JSON result.
    ///
    /// `name` must be one of the registered capability wire names; anything
    /// else is rejected locally without a network call, since the model can
    /// only have learned names from the registration set.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Toolset`] for unknown names, transport errors,
    /// or non-success responses.
    pub async fn execute_action(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, HeraldError> {
        if Capability::from_wire_name(name).is_none() {
            return Err(HeraldError::Toolset(format!(
                "unknown action '{name}' requested"
            )));
        }

        let url = format!("{}/api/v2/actions/{name}/execute", self.base_url);
        let body = serde_json::json!({ "input": arguments });

        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| HeraldError::Toolset(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(HeraldError::Toolset(format!(
                "action '{name}' failed with {status}: {body_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| HeraldError::Toolset(format!("failed to parse action result: {e}")))
    }
}
