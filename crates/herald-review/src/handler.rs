use std::sync::Arc;

use herald_assistant::{AssistantClient, AssistantId, MessageRole, RunId, ThreadId};
use herald_core::{HeraldError, TriggerEvent};
use tracing::{debug, info};

use crate::resolver::ResolveRun;

/// Handles one trigger event end to end.
///
/// The sequence is strict and never retried: render the payload, create a
/// thread, post the payload as a user message, start a run, resolve its tool
/// calls once. An error at any step propagates immediately; the same event
/// never gets a second thread or run.
pub struct ReviewHandler {
    assistant: Arc<AssistantClient>,
    assistant_id: AssistantId,
    resolver: Arc<dyn ResolveRun>,
}

/// Remote identifiers produced for one handled event.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    /// The thread created for this event.
    pub thread_id: ThreadId,
    /// The run started against it.
    pub run_id: RunId,
}

impl ReviewHandler {
    /// Create a handler bound to a registered assistant.
    pub fn new(
        assistant: Arc<AssistantClient>,
        assistant_id: AssistantId,
        resolver: Arc<dyn ResolveRun>,
    ) -> Self {
        Self {
            assistant,
            assistant_id,
            resolver,
        }
    }

    /// Review the pull request described by `event`.
    ///
    /// Replaying an event deliberately produces a fresh thread and run; no
    /// deduplication key is derived from the payload.
    ///
    /// # Errors
    ///
    /// Propagates the first failing step's error without retrying.
    pub async fn handle(&self, event: &TriggerEvent) -> Result<ReviewOutcome, HeraldError> {
        info!("pull request event received");
        let payload_text = event.payload_text();
        debug!(payload = %payload_text, "event payload");

        let thread = self.assistant.create_thread().await?;
        info!(thread_id = %thread.id, "created review thread");

        self.assistant
            .create_message(&thread.id, MessageRole::User, &payload_text)
            .await?;

        info!(
            url = %playground_url(&self.assistant_id, &thread.id),
            "review thread available"
        );

        let run = self.assistant.create_run(&thread.id, &self.assistant_id).await?;
        info!(run_id = %run.id, "started review run");

        self.resolver.resolve(&thread.id, &run.id).await?;
        info!(thread_id = %thread.id, run_id = %run.id, "review completed");

        Ok(ReviewOutcome {
            thread_id: thread.id,
            run_id: run.id,
        })
    }
}

/// Operator link to inspect a thread in the provider's playground.
pub fn playground_url(assistant: &AssistantId, thread: &ThreadId) -> String {
    format!(
        "https://platform.openai.com/playground/assistants?assistant={assistant}&thread={thread}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use herald_core::ApiTarget;

    struct RecordingResolver {
        calls: Mutex<Vec<(ThreadId, RunId)>>,
        fail: bool,
    }

    impl RecordingResolver {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail,
            })
        }

        fn calls(&self) -> Vec<(ThreadId, RunId)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResolveRun for RecordingResolver {
        async fn resolve(&self, thread: &ThreadId, run: &RunId) -> Result<(), HeraldError> {
            self.calls.lock().unwrap().push((thread.clone(), run.clone()));
            if self.fail {
                return Err(HeraldError::Toolset("resolution blew up".into()));
            }
            Ok(())
        }
    }

    fn client(url: &str) -> Arc<AssistantClient> {
        Arc::new(
            AssistantClient::new(&ApiTarget::Proxy {
                base_url: url.to_string(),
                api_key: "test-key".into(),
            })
            .unwrap(),
        )
    }

    fn event() -> TriggerEvent {
        TriggerEvent {
            trigger_name: "github_pull_request_event".into(),
            payload: serde_json::json!({"pull_request": {"number": 42, "title": "fix bug"}}),
        }
    }

    async fn mock_thread(server: &mut mockito::Server, hits: usize) -> mockito::Mock {
        server
            .mock("POST", "/threads")
            .with_body(r#"{"id": "thread_1"}"#)
            .expect(hits)
            .create_async()
            .await
    }

    async fn mock_message(server: &mut mockito::Server, hits: usize) -> mockito::Mock {
        server
            .mock("POST", "/threads/thread_1/messages")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "role": "user",
                "content": r#"{"pull_request":{"number":42,"title":"fix bug"}}"#,
            })))
            .with_body(r#"{"id": "msg_1"}"#)
            .expect(hits)
            .create_async()
            .await
    }

    async fn mock_run(server: &mut mockito::Server, hits: usize) -> mockito::Mock {
        server
            .mock("POST", "/threads/thread_1/runs")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "assistant_id": "asst_1",
            })))
            .with_body(r#"{"id": "run_1", "status": "queued"}"#)
            .expect(hits)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn one_event_means_one_thread_one_message_one_run() {
        let mut server = mockito::Server::new_async().await;
        let thread = mock_thread(&mut server, 1).await;
        let message = mock_message(&mut server, 1).await;
        let run = mock_run(&mut server, 1).await;

        let resolver = RecordingResolver::new(false);
        let handler = ReviewHandler::new(
            client(&server.url()),
            AssistantId("asst_1".into()),
            resolver.clone(),
        );

        let outcome = handler.handle(&event()).await.unwrap();
        assert_eq!(outcome.thread_id, ThreadId("thread_1".into()));
        assert_eq!(outcome.run_id, RunId("run_1".into()));

        thread.assert_async().await;
        message.assert_async().await;
        run.assert_async().await;
        assert_eq!(
            resolver.calls(),
            vec![(ThreadId("thread_1".into()), RunId("run_1".into()))]
        );
    }

    #[tokio::test]
    async fn resolver_failure_does_not_spawn_a_second_run() {
        let mut server = mockito::Server::new_async().await;
        let thread = mock_thread(&mut server, 1).await;
        let _message = mock_message(&mut server, 1).await;
        let run = mock_run(&mut server, 1).await;

        let resolver = RecordingResolver::new(true);
        let handler = ReviewHandler::new(
            client(&server.url()),
            AssistantId("asst_1".into()),
            resolver.clone(),
        );

        let err = handler.handle(&event()).await.unwrap_err();
        assert!(err.to_string().contains("resolution blew up"));

        // One attempt at every step, no implicit retry.
        thread.assert_async().await;
        run.assert_async().await;
        assert_eq!(resolver.calls().len(), 1);
    }

    #[tokio::test]
    async fn replayed_event_gets_a_fresh_thread_and_run() {
        let mut server = mockito::Server::new_async().await;
        let thread = mock_thread(&mut server, 2).await;
        let _message = mock_message(&mut server, 2).await;
        let run = mock_run(&mut server, 2).await;

        let resolver = RecordingResolver::new(false);
        let handler = ReviewHandler::new(
            client(&server.url()),
            AssistantId("asst_1".into()),
            resolver.clone(),
        );

        let same_event = event();
        handler.handle(&same_event).await.unwrap();
        handler.handle(&same_event).await.unwrap();

        thread.assert_async().await;
        run.assert_async().await;
        assert_eq!(resolver.calls().len(), 2);
    }

    #[tokio::test]
    async fn thread_failure_stops_before_message_and_run() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/threads")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;
        let message = mock_message(&mut server, 0).await;
        let run = mock_run(&mut server, 0).await;

        let resolver = RecordingResolver::new(false);
        let handler = ReviewHandler::new(
            client(&server.url()),
            AssistantId("asst_1".into()),
            resolver.clone(),
        );

        assert!(handler.handle(&event()).await.is_err());
        message.assert_async().await;
        run.assert_async().await;
        assert!(resolver.calls().is_empty());
    }

    #[test]
    fn playground_url_carries_both_ids() {
        let url = playground_url(&AssistantId("asst_9".into()), &ThreadId("thread_9".into()));
        assert!(url.contains("assistant=asst_9"));
        assert!(url.contains("thread=thread_9"));
    }
}
