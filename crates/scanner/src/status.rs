use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::info;

const IDLE: &str = "Idle";

/// FIFO of human-readable progress lines plus the most recent one.
///
/// The run publishes, the frontend drains. Draining does not affect
/// [`current_status`](Self::current_status).
#[derive(Debug)]
pub struct StatusChannel {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    pending: VecDeque<String>,
    current: String,
}

impl StatusChannel {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                pending: VecDeque::new(),
                current: IDLE.to_string(),
            }),
        }
    }

    pub fn publish(&self, event: impl Into<String>) {
        let event = event.into();
        info!(target: "scanner::status", "{event}");
        let mut inner = self.inner.lock();
        inner.current.clone_from(&event);
        inner.pending.push_back(event);
    }

    pub fn drain_all(&self) -> Vec<String> {
        self.inner.lock().pending.drain(..).collect()
    }

    pub fn current_status(&self) -> String {
        self.inner.lock().current.clone()
    }
}

impl Default for StatusChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/status_tests.rs"]
mod tests;
