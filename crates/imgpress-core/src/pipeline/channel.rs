//! Progress relay from the batch worker to the interactive front end.
//!
//! One producer (the worker), one consumer (the interactive loop). The
//! channel is unbounded and ordered: no message is ever dropped, and the
//! consumer observes messages in emission order. The consumer polls on a
//! fixed short cadence and drains everything queued per tick.

use tokio::sync::mpsc;

use crate::types::RunSummary;

/// The closed set of messages the worker emits.
#[derive(Debug, Clone)]
pub enum ProgressMessage {
    /// One human-readable log line
    Log(String),

    /// Items finished so far out of the work-list total
    Progress { done: usize, total: usize },

    /// Terminal message: the run is over
    Done(RunSummary),
}

/// Create a connected sender/receiver pair.
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender { tx }, ProgressReceiver { rx })
}

/// Worker-side handle. Sends never block; a send after the consumer is gone
/// is silently dropped (the run finishes regardless of who is watching).
#[derive(Clone)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<ProgressMessage>,
}

impl ProgressSender {
    pub fn log(&self, line: impl Into<String>) {
        let _ = self.tx.send(ProgressMessage::Log(line.into()));
    }

    pub fn progress(&self, done: usize, total: usize) {
        let _ = self.tx.send(ProgressMessage::Progress { done, total });
    }

    pub fn done(&self, summary: RunSummary) {
        let _ = self.tx.send(ProgressMessage::Done(summary));
    }
}

/// Consumer-side handle.
pub struct ProgressReceiver {
    rx: mpsc::UnboundedReceiver<ProgressMessage>,
}

impl ProgressReceiver {
    /// Drain all currently queued messages without waiting.
    pub fn drain(&mut self) -> Vec<ProgressMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Await the next message; `None` once the producer is gone and the
    /// queue is empty.
    pub async fn recv(&mut self) -> Option<ProgressMessage> {
        self.rx.recv().await
    }
}
