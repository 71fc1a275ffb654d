//! Session lifecycle: cancel-then-replace, buffer accumulation,
//! snapshot publication.

use std::pin::pin;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::decode::StreamDecoder;
use crate::error::ClientError;
use crate::http::PromptClient;

/// What the UI renders: the growing buffer, a loading flag and an
/// optional user-visible error.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub buffer: String,
    pub loading: bool,
    pub error: Option<String>,
    /// Write fence. Only the session that installed this epoch may
    /// mutate the snapshot; late writes from superseded sessions are
    /// dropped.
    epoch: u64,
}

impl SessionSnapshot {
    fn idle() -> Self {
        Self {
            buffer: String::new(),
            loading: false,
            error: None,
            epoch: 0,
        }
    }
}

/// Owns at most one active generation session.
///
/// Submitting always supersedes: the previous session's token is
/// cancelled before the new session touches any state, so the snapshot
/// never has two writers. Must be used inside a tokio runtime.
pub struct SessionManager {
    client: PromptClient,
    active: Option<CancellationToken>,
    epoch: u64,
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl SessionManager {
    pub fn new(client: PromptClient) -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::idle());
        Self {
            client,
            active: None,
            epoch: 0,
            tx: Arc::new(tx),
        }
    }

    /// Watch the session snapshot; a new value is published after
    /// every appended fragment and on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Start a generation, superseding any session still in flight.
    ///
    /// Returns the read loop's join handle so callers can await
    /// completion; the UI path typically ignores it and watches the
    /// snapshot instead.
    pub fn submit(&mut self, prompt: impl Into<String>) -> JoinHandle<()> {
        if let Some(previous) = self.active.take() {
            previous.cancel();
        }

        let token = CancellationToken::new();
        self.active = Some(token.clone());
        self.epoch += 1;
        let epoch = self.epoch;

        self.tx.send_replace(SessionSnapshot {
            buffer: String::new(),
            loading: true,
            error: None,
            epoch,
        });

        let client = self.client.clone();
        let tx = self.tx.clone();
        let prompt = prompt.into();

        tokio::spawn(async move {
            let outcome = run_session(&client, &prompt, &token, &tx, epoch).await;

            // Cleanup runs on every exit path so the UI never sticks
            // in a loading state. Cancellation stays silent.
            tx.send_modify(|snapshot| {
                if snapshot.epoch != epoch {
                    return;
                }
                snapshot.loading = false;
                if let Err(err) = &outcome {
                    if !matches!(err, ClientError::Cancelled) {
                        snapshot.error = Some(err.to_string());
                    }
                }
            });
        })
    }

    /// Cancel the active session, if any, without starting a new one.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel();
        }
    }
}

async fn run_session(
    client: &PromptClient,
    prompt: &str,
    token: &CancellationToken,
    tx: &watch::Sender<SessionSnapshot>,
    epoch: u64,
) -> Result<(), ClientError> {
    let stream = tokio::select! {
        _ = token.cancelled() => return Err(ClientError::Cancelled),
        opened = client.open_stream(prompt) => opened?,
    };

    let mut stream = pin!(stream);
    let mut decoder = StreamDecoder::new();

    loop {
        let next = tokio::select! {
            _ = token.cancelled() => return Err(ClientError::Cancelled),
            next = stream.next() => next,
        };

        match next {
            Some(Ok(bytes)) => {
                let text = decoder.decode(&bytes);
                if text.is_empty() {
                    continue;
                }
                tx.send_modify(|snapshot| {
                    if snapshot.epoch == epoch {
                        snapshot.buffer.push_str(&text);
                    }
                });
            }
            Some(Err(err)) => {
                // An abnormal close after output has started is not
                // distinguishable from completion over a chunked body;
                // keep whatever already streamed.
                debug!(error = %err, "stream ended abnormally, keeping partial output");
                return Ok(());
            }
            None => {
                let tail = decoder.finish();
                if !tail.is_empty() {
                    tx.send_modify(|snapshot| {
                        if snapshot.epoch == epoch {
                            snapshot.buffer.push_str(&tail);
                        }
                    });
                }
                return Ok(());
            }
        }
    }
}
