//! Fire-and-forget result recording.
//!
//! `BackgroundRecorder` moves persistence writes off the session thread.
//! Results are queued on a channel and applied by a single worker thread in
//! submission order. Failed writes are logged and dropped; they never reach
//! the engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{QuickfireError, Result};
use crate::storage::{PersistenceAdapter, ResultRecord, ResultSink};

enum Message {
    Record(ResultRecord),
    Flush(Sender<()>),
}

/// Counts of handled results.
#[derive(Debug, Default)]
struct Counters {
    recorded: AtomicUsize,
    failed: AtomicUsize,
}

/// Result sink that writes through a persistence adapter on a worker thread.
///
/// Dropping the recorder drains the queue and joins the worker.
pub struct BackgroundRecorder {
    sender: Option<Sender<Message>>,
    worker: Option<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl BackgroundRecorder {
    /// Start a worker writing to the given adapter.
    pub fn spawn(adapter: Arc<dyn PersistenceAdapter>) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<Message>();
        let counters = Arc::new(Counters::default());
        let worker_counters = Arc::clone(&counters);

        let worker = thread::Builder::new()
            .name("quickfire-recorder".to_string())
            .spawn(move || {
                for message in receiver {
                    match message {
                        Message::Record(record) => match adapter.record_result(&record) {
                            Ok(()) => {
                                worker_counters.recorded.fetch_add(1, Ordering::SeqCst);
                            }
                            Err(err) => {
                                worker_counters.failed.fetch_add(1, Ordering::SeqCst);
                                tracing::warn!(
                                    item = %record.item_id,
                                    session = %record.session_id,
                                    "failed to record result, discarding: {}",
                                    err
                                );
                            }
                        },
                        Message::Flush(ack) => {
                            let _ = ack.send(());
                        }
                    }
                }
            })
            .map_err(|e| QuickfireError::persistence("recorder", e.to_string()))?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            counters,
        })
    }

    /// Block until every result submitted so far has been handled.
    pub fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };
        let (ack_tx, ack_rx) = mpsc::channel();
        if sender.send(Message::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    /// Number of results written successfully.
    pub fn recorded(&self) -> usize {
        self.counters.recorded.load(Ordering::SeqCst)
    }

    /// Number of results whose write failed.
    pub fn failed(&self) -> usize {
        self.counters.failed.load(Ordering::SeqCst)
    }
}

impl ResultSink for BackgroundRecorder {
    fn submit(&self, record: ResultRecord) {
        let Some(sender) = &self.sender else {
            return;
        };
        if let Err(mpsc::SendError(Message::Record(record))) =
            sender.send(Message::Record(record))
        {
            tracing::warn!(item = %record.item_id, "recorder stopped, dropping result");
        }
    }
}

impl Drop for BackgroundRecorder {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once the queue is drained.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("recorder worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for BackgroundRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundRecorder")
            .field("recorded", &self.recorded())
            .field("failed", &self.failed())
            .finish()
    }
}
