//! Reconnect timers backed by `tokio::time`.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

use super::connection_manager::{Scheduler, TimerId};

/// Emitted when a scheduled timer elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired(pub TimerId);

/// [`Scheduler`] that runs one sleep task per timer.
pub struct TokioScheduler {
    fired: mpsc::UnboundedSender<TimerFired>,
    tasks: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(fired: mpsc::UnboundedSender<TimerFired>) -> Self {
        Self {
            fired,
            tasks: HashMap::new(),
        }
    }

    /// Creates a scheduler together with the receiver its firings arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TimerFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, timer: TimerId, delay: Duration) {
        self.tasks.retain(|_, task| !task.is_finished());
        trace!(?timer, ?delay, "scheduling timer");

        let fired = self.fired.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = fired.send(TimerFired(timer));
        });
        if let Some(previous) = self.tasks.insert(timer, task) {
            previous.abort();
        }
    }

    fn cancel(&mut self, timer: TimerId) {
        if let Some(task) = self.tasks.remove(&timer) {
            trace!(?timer, "cancelling timer");
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for task in self.tasks.values() {
            task.abort();
        }
    }
}
