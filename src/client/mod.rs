//! Chat-completion interaction client.
//!
//! One logical operation per call: build the wire request, POST it through
//! the shared [`Transport`], then interpret the response either as a single
//! JSON document (plain mode) or as a `data:`-prefixed pseudo-event stream.
//! The line-level parsing rules live in [`sse`]; this module layers the push
//! adapter (mutate a caller-owned [`ChatItem`], pace progress notifications)
//! and the pull adapter (lazy fragment stream) on top of them.

pub mod sse;
pub mod transport;
pub mod wire;

use crate::chat::{self, ChatItem, ChatItemStatus};
use crate::config::ChatConfig;
use anyhow::Context;
use futures_core::stream::BoxStream;
use sse::LineEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use transport::Transport;
use wire::{ChatMessage, ChatRequest, ChatResponse};

/// Optional zero-argument progress callback, invoked at commit points.
pub type ProgressNotifier<'a> = &'a mut (dyn FnMut() + Send);

/// Cadence of streaming progress updates.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Delay before the in-flight notification, ahead of the first line.
    pub initial_delay: Duration,
    /// Delay before each subsequent commit notification.
    pub update_delay: Duration,
    /// Commit once per this many content-bearing lines.
    pub commit_cycle: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(375),
            update_delay: Duration::from_millis(125),
            commit_cycle: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    config: ChatConfig,
    transport: Transport,
    pacing: Pacing,
}

impl ChatClient {
    /// Build the transport eagerly; the connection pool lives as long as the
    /// client and is shared by clones.
    pub fn new(config: ChatConfig) -> anyhow::Result<Self> {
        let transport = Transport::new(config.base_url()?, config.retry_waits())?;
        Ok(Self {
            config,
            transport,
            pacing: Pacing::default(),
        })
    }

    /// Override the progress cadence (defaults match the service constants).
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    fn build_request(&self, question: &str) -> ChatRequest {
        ChatRequest {
            messages: vec![ChatMessage::new(self.config.role.clone(), question)],
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            stream: self.config.stream,
        }
    }

    async fn send(&self, question: &str) -> anyhow::Result<reqwest::Response> {
        self.transport
            .post_json(
                &self.config.chat_completions_url_fragment,
                &self.build_request(question),
            )
            .await
    }

    /// Plain mode: one JSON document in, one final answer out.
    ///
    /// A body that fails to decode is logged and yields an empty answer;
    /// that is a legitimate outcome, not an error. The notifier fires
    /// exactly once, after the answer is assigned.
    pub async fn plain_request(
        &self,
        item: &mut ChatItem,
        mut notifier: Option<ProgressNotifier<'_>>,
    ) -> anyhow::Result<()> {
        let response = self.send(&item.question).await?;
        let payload = response
            .text()
            .await
            .context("failed to read the completion response body")?;

        let answer = match serde_json::from_str::<ChatResponse>(&payload) {
            Ok(envelope) => envelope.joined_content(),
            Err(err) => {
                tracing::warn!(payload = %payload, error = %err, "failed to decode ChatResponse body");
                String::new()
            }
        };

        item.answer = answer.trim().to_string();
        item.is_multiline = chat::is_multiline(&item.answer);
        item.status = ChatItemStatus::Complete;

        if let Some(n) = notifier.as_mut() {
            n();
        }
        Ok(())
    }

    /// Streaming push mode: consume the pseudo-event stream to the end,
    /// committing the accumulated answer to `item` on a cadence.
    ///
    /// Commits happen on content-bearing line counts 0, N, 2N, ... plus one
    /// unconditional trimmed commit at stream end. Pacing delays only apply
    /// when a notifier is present. Dropping the returned future cancels the
    /// read promptly and leaves the last committed partial answer in place.
    pub async fn streaming_request(
        &self,
        item: &mut ChatItem,
        mut notifier: Option<ProgressNotifier<'_>>,
    ) -> anyhow::Result<()> {
        let response = self.send(&item.question).await?;
        item.status = ChatItemStatus::Streaming;

        // Signal that the request is in flight before reading any line.
        notify_progress(&mut notifier, self.pacing.initial_delay).await;

        let mut body = response.bytes_stream();
        let mut scanner = sse::LineScanner::new();
        let mut answer = String::new();
        let mut refresh_counter: u64 = 0;
        let mut done = false;

        while !done {
            let Some(chunk) = body.next().await else {
                break;
            };
            let bytes = chunk.context("network error while reading the completion stream")?;
            for line in scanner.push(&bytes) {
                if self
                    .apply_line(&line, item, &mut answer, &mut refresh_counter, &mut notifier)
                    .await
                {
                    done = true;
                    break;
                }
            }
        }

        if !done {
            if let Some(line) = scanner.finish() {
                self.apply_line(&line, item, &mut answer, &mut refresh_counter, &mut notifier)
                    .await;
            }
        }

        item.answer = answer.trim().to_string();
        item.is_multiline = chat::is_multiline(&item.answer);
        item.status = ChatItemStatus::Complete;
        notify_progress(&mut notifier, self.pacing.update_delay).await;
        Ok(())
    }

    /// Apply one stream line; returns true when the termination sentinel was
    /// reached.
    async fn apply_line(
        &self,
        line: &str,
        item: &mut ChatItem,
        answer: &mut String,
        refresh_counter: &mut u64,
        notifier: &mut Option<ProgressNotifier<'_>>,
    ) -> bool {
        match sse::classify_line(line) {
            LineEvent::Done => true,
            LineEvent::Skip => false,
            LineEvent::Content(fragment) => {
                answer.push_str(&fragment);

                let commit = *refresh_counter % self.pacing.commit_cycle == 0;
                *refresh_counter += 1;
                if commit {
                    item.answer = answer.clone();
                    item.is_multiline = chat::is_multiline(&item.answer);
                    notify_progress(notifier, self.pacing.update_delay).await;
                }
                false
            }
        }
    }

    /// Streaming pull mode: a lazy, forward-only stream of per-line content
    /// fragments. The caller accumulates; there is no separate final event
    /// and no trimming. A mid-stream network error surfaces as one `Err`
    /// item and ends the stream.
    pub async fn fragment_stream(
        &self,
        question: &str,
    ) -> anyhow::Result<BoxStream<'static, anyhow::Result<String>>> {
        let response = self.send(question).await?;

        let (tx, rx) = mpsc::channel::<anyhow::Result<String>>(64);

        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut scanner = sse::LineScanner::new();

            while let Some(chunk) = body.next().await {
                let bytes = match chunk {
                    Ok(b) => b,
                    Err(err) => {
                        let _ = tx
                            .send(Err(anyhow::Error::new(err)
                                .context("network error while reading the completion stream")))
                            .await;
                        return;
                    }
                };

                for line in scanner.push(&bytes) {
                    match sse::classify_line(&line) {
                        LineEvent::Done => return,
                        LineEvent::Skip => {}
                        LineEvent::Content(fragment) => {
                            if tx.send(Ok(fragment)).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            }

            if let Some(line) = scanner.finish() {
                if let LineEvent::Content(fragment) = sse::classify_line(&line) {
                    let _ = tx.send(Ok(fragment)).await;
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// No notifier means no pacing delay either; parsing proceeds unthrottled.
async fn notify_progress(notifier: &mut Option<ProgressNotifier<'_>>, delay: Duration) {
    if let Some(n) = notifier.as_mut() {
        tokio::time::sleep(delay).await;
        n();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChatConfig {
        ChatConfig {
            base_uri: "http://localhost:9/".to_string(),
            chat_completions_url_fragment: "v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            role: "user".to_string(),
            max_tokens: 128,
            stream: true,
            retry_wait_ms: vec![10],
        }
    }

    #[test]
    fn request_carries_config_and_question() {
        let client = ChatClient::new(config()).unwrap();
        let req = client.build_request("why is the sky blue?");
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].role.as_deref(), Some("user"));
        assert_eq!(req.messages[0].content.as_deref(), Some("why is the sky blue?"));
        assert_eq!(req.model, "gpt-4o-mini");
        assert_eq!(req.max_tokens, 128);
        assert!(req.stream);
    }

    #[test]
    fn default_pacing_matches_service_constants() {
        let pacing = Pacing::default();
        assert_eq!(pacing.initial_delay, Duration::from_millis(375));
        assert_eq!(pacing.update_delay, Duration::from_millis(125));
        assert_eq!(pacing.commit_cycle, 10);
    }
}
