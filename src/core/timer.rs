//! Countdown tick source.
//!
//! `TickTimer` posts an event into a channel once per interval from a
//! background thread. The engine never sees the thread: the owner of the
//! receiving end feeds each event to `ChallengeEngine::tick`, so ticks and
//! answers are applied one at a time on the same thread.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{QuickfireError, Result};

/// Periodic event source. Stops on `cancel` or drop.
pub struct TickTimer {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl TickTimer {
    /// Post `make_event()` to `events` every `interval`.
    ///
    /// The timer also stops by itself once the receiving end is gone.
    pub fn start<E, F>(interval: Duration, events: Sender<E>, make_event: F) -> Result<Self>
    where
        E: Send + 'static,
        F: Fn() -> E + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let worker = thread::Builder::new()
            .name("quickfire-timer".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if events.send(make_event()).is_err() {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| QuickfireError::config(format!("Failed to start timer: {}", e)))?;

        Ok(Self {
            stop: Some(stop_tx),
            worker: Some(worker),
        })
    }

    /// Stop the timer. No event is posted after this returns.
    pub fn cancel(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("timer thread panicked");
            }
        }
    }

    /// Whether the timer is still running.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }
}

impl Drop for TickTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for TickTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickTimer")
            .field("running", &self.is_running())
            .finish()
    }
}
