use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HeraldError;

/// Default base URL when reviewing through the OpenRouter-compatible proxy.
pub const PROXY_BASE_URL: &str = "https://openrouter.ai/api/v1";
/// Base URL for the direct provider endpoint.
pub const DIRECT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default model when the proxy endpoint is selected.
pub const PROXY_DEFAULT_MODEL: &str = "qwen/qwq-32b:free";
/// Default model when the direct endpoint is selected.
pub const DIRECT_DEFAULT_MODEL: &str = "gpt-4o";

/// Top-level configuration loaded from `herald.toml`.
///
/// Supports layered resolution: env vars > local config > defaults, with a
/// single interactive prompt as the last resort for the channel id.
///
/// # Examples
///
/// ```
/// use herald_core::HeraldConfig;
///
/// let config = HeraldConfig::default();
/// assert_eq!(config.toolset.trigger, "github_pull_request_event");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeraldConfig {
    /// Assistant provider settings.
    #[serde(default)]
    pub assistant: AssistantConfig,
    /// Tool-integration service settings.
    #[serde(default)]
    pub toolset: ToolsetConfig,
    /// Chat delivery settings.
    #[serde(default)]
    pub channel: ChannelConfig,
}

impl HeraldConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Io`] if the file cannot be read, or
    /// [`HeraldError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use herald_core::HeraldConfig;
    /// use std::path::Path;
    ///
    /// let config = HeraldConfig::from_file(Path::new("herald.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, HeraldError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use herald_core::HeraldConfig;
    ///
    /// let toml = r#"
    /// [channel]
    /// id = "C123"
    /// "#;
    /// let config = HeraldConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.channel.id.as_deref(), Some("C123"));
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, HeraldError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Assistant provider configuration.
///
/// # Examples
///
/// ```
/// use herald_core::AssistantConfig;
///
/// let config = AssistantConfig::default();
/// assert_eq!(config.name, "PR Review Assistant");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Model identifier. Defaults per endpoint when unset.
    pub model: Option<String>,
    /// API key for the direct provider endpoint.
    pub api_key: Option<String>,
    /// API key for the OpenRouter-compatible proxy endpoint.
    pub proxy_api_key: Option<String>,
    /// Base URL override for the proxy endpoint.
    pub base_url: Option<String>,
    /// Display name for the registered assistant.
    #[serde(default = "default_assistant_name")]
    pub name: String,
    /// Description for the registered assistant.
    #[serde(default = "default_assistant_description")]
    pub description: String,
}

fn default_assistant_name() -> String {
    "PR Review Assistant".into()
}

fn default_assistant_description() -> String {
    "An assistant to help you with reviewing PRs".into()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: None,
            api_key: None,
            proxy_api_key: None,
            base_url: None,
            name: default_assistant_name(),
            description: default_assistant_description(),
        }
    }
}

/// Tool-integration service configuration.
///
/// # Examples
///
/// ```
/// use herald_core::ToolsetConfig;
///
/// let config = ToolsetConfig::default();
/// assert_eq!(config.poll_interval_secs, 2);
/// assert_eq!(config.run_timeout_secs, 600);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsetConfig {
    /// API key for the integration service.
    pub api_key: Option<String>,
    /// Base URL of the integration service.
    #[serde(default = "default_toolset_base_url")]
    pub base_url: String,
    /// Trigger name to subscribe to.
    #[serde(default = "default_trigger")]
    pub trigger: String,
    /// Seconds between run status polls while waiting for tool calls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Ceiling in seconds on a single run's tool-call resolution. 0 disables.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
}

fn default_toolset_base_url() -> String {
    "https://backend.composio.dev".into()
}

fn default_trigger() -> String {
    "github_pull_request_event".into()
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_run_timeout_secs() -> u64 {
    600
}

impl Default for ToolsetConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_toolset_base_url(),
            trigger: default_trigger(),
            poll_interval_secs: default_poll_interval_secs(),
            run_timeout_secs: default_run_timeout_secs(),
        }
    }
}

/// Chat delivery configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Destination channel identifier for plain-text summaries.
    pub id: Option<String>,
}

/// Which assistant endpoint the process talks to.
///
/// The proxy is preferred whenever a proxy credential is available; otherwise
/// the direct provider key is required.
///
/// # Examples
///
/// ```
/// use herald_core::{ApiTarget, PROXY_DEFAULT_MODEL};
///
/// let target = ApiTarget::Proxy {
///     base_url: "https://openrouter.ai/api/v1".into(),
///     api_key: "or-key".into(),
/// };
/// assert_eq!(target.default_model(), PROXY_DEFAULT_MODEL);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiTarget {
    /// OpenRouter-compatible proxy endpoint.
    Proxy {
        /// Proxy base URL.
        base_url: String,
        /// Proxy credential.
        api_key: String,
    },
    /// Direct provider endpoint.
    Direct {
        /// Provider credential.
        api_key: String,
    },
}

impl ApiTarget {
    /// Base URL for API requests against this target.
    pub fn base_url(&self) -> &str {
        match self {
            ApiTarget::Proxy { base_url, .. } => base_url,
            ApiTarget::Direct { .. } => DIRECT_BASE_URL,
        }
    }

    /// Credential for this target.
    pub fn api_key(&self) -> &str {
        match self {
            ApiTarget::Proxy { api_key, .. } => api_key,
            ApiTarget::Direct { api_key } => api_key,
        }
    }

    /// Model used when the configuration names none.
    pub fn default_model(&self) -> &'static str {
        match self {
            ApiTarget::Proxy { .. } => PROXY_DEFAULT_MODEL,
            ApiTarget::Direct { .. } => DIRECT_DEFAULT_MODEL,
        }
    }
}

/// Fully resolved runtime settings.
///
/// Produced once at startup by [`HeraldConfig::resolve`]; no remote call is
/// made before resolution succeeds, and nothing here changes afterwards.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Destination chat channel, guaranteed non-empty.
    pub channel_id: String,
    /// Selected assistant endpoint and credential.
    pub target: ApiTarget,
    /// Model identifier sent at assistant registration.
    pub model: String,
    /// Integration service credential.
    pub toolset_api_key: String,
    /// Integration service base URL.
    pub toolset_base_url: String,
    /// Trigger name the listener subscribes to.
    pub trigger: String,
    /// Interval between run status polls.
    pub poll_interval: Duration,
    /// Ceiling on a single run's resolution, `None` when disabled.
    pub run_timeout: Option<Duration>,
    /// Display name for the registered assistant.
    pub assistant_name: String,
    /// Description for the registered assistant.
    pub assistant_description: String,
}

/// Source of environment variables.
///
/// Injectable so resolution is testable without mutating process globals.
/// Empty values are treated as unset.
pub trait EnvSource {
    /// Look up `key`, returning `None` for unset or empty values.
    fn var(&self, key: &str) -> Option<String>;
}

/// [`EnvSource`] backed by the process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned().filter(|v| !v.trim().is_empty())
    }
}

/// Source of interactive input for missing configuration.
pub trait PromptSource {
    /// Display `message` and read one trimmed line.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Io`] if the input source fails.
    fn prompt_line(&mut self, message: &str) -> Result<String, HeraldError>;
}

/// [`PromptSource`] backed by stderr + stdin.
///
/// EOF yields an empty string, which resolution rejects as a configuration
/// error rather than proceeding with an empty value.
pub struct StdinPrompt;

impl PromptSource for StdinPrompt {
    fn prompt_line(&mut self, message: &str) -> Result<String, HeraldError> {
        eprint!("{message}");
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

impl HeraldConfig {
    /// Resolve runtime settings from config, environment, and (last resort)
    /// one interactive prompt for the channel id.
    ///
    /// Precedence is env var, then config file, then prompt/default. The
    /// proxy endpoint wins whenever `OPENROUTER_API_KEY` (or the config
    /// equivalent) is present; the prompt is never invoked when `CHANNEL_ID`
    /// is already set.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Config`] if the channel id is empty after all
    /// three sources, if no assistant credential is available, or if the
    /// integration service credential is missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use herald_core::{HeraldConfig, PromptSource, HeraldError};
    ///
    /// struct NoPrompt;
    /// impl PromptSource for NoPrompt {
    ///     fn prompt_line(&mut self, _: &str) -> Result<String, HeraldError> {
    ///         panic!("prompt must not run");
    ///     }
    /// }
    ///
    /// let env: HashMap<String, String> = [
    ///     ("CHANNEL_ID", "C123"),
    ///     ("OPENAI_API_KEY", "sk-test"),
    ///     ("COMPOSIO_API_KEY", "ck-test"),
    /// ]
    /// .into_iter()
    /// .map(|(k, v)| (k.to_string(), v.to_string()))
    /// .collect();
    ///
    /// let runtime = HeraldConfig::default()
    ///     .resolve(&env, &mut NoPrompt)
    ///     .unwrap();
    /// assert_eq!(runtime.channel_id, "C123");
    /// ```
    pub fn resolve(
        &self,
        env: &dyn EnvSource,
        prompt: &mut dyn PromptSource,
    ) -> Result<RuntimeConfig, HeraldError> {
        let channel_id = self.resolve_channel(env, prompt)?;
        let target = self.resolve_target(env)?;

        let model = self
            .assistant
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| target.default_model().to_string());

        let toolset_api_key = env
            .var("COMPOSIO_API_KEY")
            .or_else(|| non_empty(self.toolset.api_key.clone()))
            .ok_or_else(|| {
                HeraldError::Config(
                    "integration service API key is required; set COMPOSIO_API_KEY".into(),
                )
            })?;

        let run_timeout = match self.toolset.run_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(RuntimeConfig {
            channel_id,
            target,
            model,
            toolset_api_key,
            toolset_base_url: self.toolset.base_url.clone(),
            trigger: self.toolset.trigger.clone(),
            poll_interval: Duration::from_secs(self.toolset.poll_interval_secs.max(1)),
            run_timeout,
            assistant_name: self.assistant.name.clone(),
            assistant_description: self.assistant.description.clone(),
        })
    }

    fn resolve_channel(
        &self,
        env: &dyn EnvSource,
        prompt: &mut dyn PromptSource,
    ) -> Result<String, HeraldError> {
        if let Some(id) = env.var("CHANNEL_ID") {
            return Ok(id);
        }
        if let Some(id) = non_empty(self.channel.id.clone()) {
            return Ok(id);
        }
        let entered = prompt.prompt_line("Enter channel id: ")?;
        if entered.is_empty() {
            return Err(HeraldError::Config(
                "channel id is required; set CHANNEL_ID or [channel] id in herald.toml".into(),
            ));
        }
        Ok(entered)
    }

    fn resolve_target(&self, env: &dyn EnvSource) -> Result<ApiTarget, HeraldError> {
        let proxy_key = env
            .var("OPENROUTER_API_KEY")
            .or_else(|| non_empty(self.assistant.proxy_api_key.clone()));
        if let Some(api_key) = proxy_key {
            let base_url = env
                .var("BASE_URL")
                .or_else(|| non_empty(self.assistant.base_url.clone()))
                .unwrap_or_else(|| PROXY_BASE_URL.to_string());
            return Ok(ApiTarget::Proxy { base_url, api_key });
        }

        let direct_key = env
            .var("OPENAI_API_KEY")
            .or_else(|| non_empty(self.assistant.api_key.clone()));
        match direct_key {
            Some(api_key) => Ok(ApiTarget::Direct { api_key }),
            None => Err(HeraldError::Config(
                "no assistant credential found; set OPENROUTER_API_KEY for the proxy \
                 endpoint or OPENAI_API_KEY for the direct endpoint"
                    .into(),
            )),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PanicPrompt;

    impl PromptSource for PanicPrompt {
        fn prompt_line(&mut self, _message: &str) -> Result<String, HeraldError> {
            panic!("interactive prompt must not be reached");
        }
    }

    struct ScriptedPrompt(Vec<String>);

    impl PromptSource for ScriptedPrompt {
        fn prompt_line(&mut self, _message: &str) -> Result<String, HeraldError> {
            Ok(self.0.remove(0))
        }
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = HeraldConfig::default();
        assert_eq!(config.toolset.trigger, "github_pull_request_event");
        assert_eq!(config.toolset.poll_interval_secs, 2);
        assert_eq!(config.toolset.run_timeout_secs, 600);
        assert_eq!(config.assistant.name, "PR Review Assistant");
        assert!(config.channel.id.is_none());
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[channel]
id = "C42"
"#;
        let config = HeraldConfig::from_toml(toml).unwrap();
        assert_eq!(config.channel.id.as_deref(), Some("C42"));
        assert_eq!(config.toolset.poll_interval_secs, 2);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[assistant]
model = "gpt-4o-mini"
proxy_api_key = "or-key"
base_url = "https://proxy.internal/api/v1"

[toolset]
api_key = "ck-key"
trigger = "github_pull_request_event"
run_timeout_secs = 0

[channel]
id = "C99"
"#;
        let config = HeraldConfig::from_toml(toml).unwrap();
        assert_eq!(config.assistant.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.toolset.run_timeout_secs, 0);
        assert_eq!(config.channel.id.as_deref(), Some("C99"));
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = HeraldConfig::from_toml("").unwrap();
        assert_eq!(config.toolset.trigger, "github_pull_request_event");
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = HeraldConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }

    #[test]
    fn env_channel_skips_prompt() {
        let env = env(&[
            ("CHANNEL_ID", "C123"),
            ("OPENAI_API_KEY", "sk-1"),
            ("COMPOSIO_API_KEY", "ck-1"),
        ]);
        let runtime = HeraldConfig::default()
            .resolve(&env, &mut PanicPrompt)
            .unwrap();
        assert_eq!(runtime.channel_id, "C123");
        assert_eq!(runtime.target, ApiTarget::Direct { api_key: "sk-1".into() });
    }

    #[test]
    fn proxy_preferred_when_both_credentials_present() {
        let env = env(&[
            ("CHANNEL_ID", "C123"),
            ("OPENAI_API_KEY", "sk-1"),
            ("OPENROUTER_API_KEY", "or-1"),
            ("COMPOSIO_API_KEY", "ck-1"),
        ]);
        let runtime = HeraldConfig::default()
            .resolve(&env, &mut PanicPrompt)
            .unwrap();
        assert_eq!(
            runtime.target,
            ApiTarget::Proxy {
                base_url: PROXY_BASE_URL.into(),
                api_key: "or-1".into(),
            }
        );
        assert_eq!(runtime.model, PROXY_DEFAULT_MODEL);
    }

    #[test]
    fn base_url_env_overrides_proxy_default() {
        let env = env(&[
            ("CHANNEL_ID", "C123"),
            ("OPENROUTER_API_KEY", "or-1"),
            ("BASE_URL", "https://proxy.example/api/v1"),
            ("COMPOSIO_API_KEY", "ck-1"),
        ]);
        let runtime = HeraldConfig::default()
            .resolve(&env, &mut PanicPrompt)
            .unwrap();
        assert_eq!(runtime.target.base_url(), "https://proxy.example/api/v1");
    }

    #[test]
    fn direct_endpoint_uses_direct_defaults() {
        let env = env(&[
            ("CHANNEL_ID", "C123"),
            ("OPENAI_API_KEY", "sk-1"),
            ("COMPOSIO_API_KEY", "ck-1"),
        ]);
        let runtime = HeraldConfig::default()
            .resolve(&env, &mut PanicPrompt)
            .unwrap();
        assert_eq!(runtime.target.base_url(), DIRECT_BASE_URL);
        assert_eq!(runtime.model, DIRECT_DEFAULT_MODEL);
    }

    #[test]
    fn configured_model_beats_endpoint_default() {
        let env = env(&[
            ("CHANNEL_ID", "C123"),
            ("OPENROUTER_API_KEY", "or-1"),
            ("COMPOSIO_API_KEY", "ck-1"),
        ]);
        let mut config = HeraldConfig::default();
        config.assistant.model = Some("mistral/large".into());
        let runtime = config.resolve(&env, &mut PanicPrompt).unwrap();
        assert_eq!(runtime.model, "mistral/large");
    }

    #[test]
    fn missing_credentials_fail_without_placeholder() {
        let env = env(&[("CHANNEL_ID", "C123"), ("COMPOSIO_API_KEY", "ck-1")]);
        let err = HeraldConfig::default()
            .resolve(&env, &mut PanicPrompt)
            .unwrap_err();
        assert!(matches!(err, HeraldError::Config(_)));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn prompt_supplies_channel_when_env_and_file_are_silent() {
        let env = env(&[("OPENAI_API_KEY", "sk-1"), ("COMPOSIO_API_KEY", "ck-1")]);
        let mut prompt = ScriptedPrompt(vec!["C777".into()]);
        let runtime = HeraldConfig::default().resolve(&env, &mut prompt).unwrap();
        assert_eq!(runtime.channel_id, "C777");
    }

    #[test]
    fn empty_prompt_answer_is_rejected() {
        let env = env(&[("OPENAI_API_KEY", "sk-1"), ("COMPOSIO_API_KEY", "ck-1")]);
        let mut prompt = ScriptedPrompt(vec!["".into()]);
        let err = HeraldConfig::default()
            .resolve(&env, &mut prompt)
            .unwrap_err();
        assert!(matches!(err, HeraldError::Config(_)));
        assert!(err.to_string().contains("channel id"));
    }

    #[test]
    fn whitespace_env_values_count_as_unset() {
        let env = env(&[
            ("CHANNEL_ID", "C123"),
            ("OPENROUTER_API_KEY", "   "),
            ("OPENAI_API_KEY", "sk-1"),
            ("COMPOSIO_API_KEY", "ck-1"),
        ]);
        let runtime = HeraldConfig::default()
            .resolve(&env, &mut PanicPrompt)
            .unwrap();
        assert_eq!(runtime.target, ApiTarget::Direct { api_key: "sk-1".into() });
    }

    #[test]
    fn missing_toolset_key_is_a_config_error() {
        let env = env(&[("CHANNEL_ID", "C123"), ("OPENAI_API_KEY", "sk-1")]);
        let err = HeraldConfig::default()
            .resolve(&env, &mut PanicPrompt)
            .unwrap_err();
        assert!(err.to_string().contains("COMPOSIO_API_KEY"));
    }

    #[test]
    fn zero_run_timeout_disables_deadline() {
        let env = env(&[
            ("CHANNEL_ID", "C123"),
            ("OPENAI_API_KEY", "sk-1"),
            ("COMPOSIO_API_KEY", "ck-1"),
        ]);
        let mut config = HeraldConfig::default();
        config.toolset.run_timeout_secs = 0;
        let runtime = config.resolve(&env, &mut PanicPrompt).unwrap();
        assert!(runtime.run_timeout.is_none());
    }

    #[test]
    fn file_values_fill_in_behind_env() {
        let env = env(&[("OPENAI_API_KEY", "sk-1")]);
        let mut config = HeraldConfig::default();
        config.channel.id = Some("C-from-file".into());
        config.toolset.api_key = Some("ck-from-file".into());
        let runtime = config.resolve(&env, &mut PanicPrompt).unwrap();
        assert_eq!(runtime.channel_id, "C-from-file");
        assert_eq!(runtime.toolset_api_key, "ck-from-file");
    }
}
