use std::time::Duration;

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use herald_core::{HeraldError, TriggerEvent};
use tracing::{debug, warn};

/// Sentinel the service sends when it will deliver no further events.
const DONE_SENTINEL: &str = "[DONE]";

/// Subscription handle for one trigger on the integration service.
///
/// The service relays webhook deliveries over a server-sent-event stream;
/// Herald holds the connection open and reads events as they arrive, so the
/// application itself never polls.
///
/// # Examples
///
/// ```
/// use herald_toolset::TriggerListener;
///
/// let listener = TriggerListener::new(
///     "https://backend.composio.dev",
///     "ck-test",
///     "github_pull_request_event",
/// )
/// .unwrap();
/// assert_eq!(listener.trigger(), "github_pull_request_event");
/// ```
pub struct TriggerListener {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    trigger: String,
}

impl TriggerListener {
    /// Create a listener for `trigger`.
    ///
    /// The HTTP client carries a connect timeout but no overall deadline:
    /// the event stream is expected to stay open for the process lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Listener`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: &str, trigger: &str) -> Result<Self, HeraldError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| HeraldError::Listener(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            trigger: trigger.to_string(),
        })
    }

    /// The trigger name this listener filters on.
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Open the event stream.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Listener`] if the subscription request fails
    /// or is refused.
    pub async fn subscribe(&self) -> Result<EventStream, HeraldError> {
        let url = format!("{}/api/v2/triggers/subscribe", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("triggerNames", self.trigger.as_str())])
            .header("X-API-Key", &self.api_key)
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| HeraldError::Listener(format!("subscription failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(HeraldError::Listener(format!(
                "subscription refused with {status}: {body_text}"
            )));
        }

        Ok(EventStream {
            inner: response.bytes_stream().boxed(),
            parser: SseParser::default(),
            pending: Vec::new(),
            trigger: self.trigger.clone(),
        })
    }
}

/// An open trigger event stream.
///
/// Yields only events matching the subscribed trigger name; keep-alives,
/// comments, foreign triggers, and malformed payloads are skipped with a log
/// line rather than surfaced as errors.
pub struct EventStream {
    inner: BoxStream<'static, reqwest::Result<Bytes>>,
    parser: SseParser,
    pending: Vec<String>,
    trigger: String,
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("pending", &self.pending)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

impl EventStream {
    /// Wait for the next matching event.
    ///
    /// Returns `Ok(None)` when the service ends the stream (either by
    /// closing the connection or via the `[DONE]` sentinel).
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Listener`] on transport failure; the stream
    /// is unusable afterwards.
    pub async fn next_event(&mut self) -> Result<Option<TriggerEvent>, HeraldError> {
        loop {
            while !self.pending.is_empty() {
                let data = self.pending.remove(0);
                if data == DONE_SENTINEL {
                    return Ok(None);
                }
                match serde_json::from_str::<TriggerEvent>(&data) {
                    Ok(event) if event.matches(&self.trigger) => return Ok(Some(event)),
                    Ok(event) => {
                        debug!(trigger = %event.trigger_name, "skipping event for other trigger");
                    }
                    Err(e) => {
                        warn!(error = %e, "skipping malformed event payload");
                    }
                }
            }

            match self.inner.next().await {
                None => return Ok(None),
                Some(Err(e)) => {
                    return Err(HeraldError::Listener(format!("event stream failed: {e}")));
                }
                Some(Ok(bytes)) => {
                    let chunk = String::from_utf8_lossy(&bytes).into_owned();
                    self.pending.extend(self.parser.feed(&chunk));
                }
            }
        }
    }
}

/// Incremental server-sent-event parser.
///
/// Accumulates `data:` lines until the blank-line terminator; multi-line
/// data is joined with `\n`. Comment lines and non-data fields are ignored.
#[derive(Default)]
struct SseParser {
    buffer: String,
    data_lines: Vec<String>,
}

impl SseParser {
    fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let raw: String = self.buffer.drain(..=pos).collect();
            let line = raw.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                if !self.data_lines.is_empty() {
                    events.push(self.data_lines.join("\n"));
                    self.data_lines.clear();
                }
            } else if let Some(rest) = line.strip_prefix("data:") {
                self.data_lines
                    .push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
            }
            // ':' comments and fields like `event:` / `id:` fall through.
        }
        events
    }
}
