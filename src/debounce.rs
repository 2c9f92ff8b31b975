//! Debounced recalculation.
//!
//! Rapid edits coalesce into a single call once the input has been quiet
//! for the edit's window. A new edit replaces the pending one and restarts
//! the window, so only the latest value is ever delivered.

use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Quiet periods used for form edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DebounceSettings {
    /// Window for near-empty values (the user just started typing or cleared a field)
    pub short_ms: u64,
    /// Window for substantive edits
    pub long_ms: u64,
    /// Values with fewer trimmed characters than this count as near-empty
    pub near_empty_len: usize,
}

impl Default for DebounceSettings {
    fn default() -> Self {
        Self {
            short_ms: 300,
            long_ms: 1200,
            near_empty_len: 3,
        }
    }
}

impl DebounceSettings {
    pub fn window_for(&self, value: &str) -> Duration {
        if value.trim().chars().count() < self.near_empty_len {
            Duration::from_millis(self.short_ms)
        } else {
            Duration::from_millis(self.long_ms)
        }
    }
}

enum Command<T> {
    Trigger(T, Duration),
    Cancel,
}

/// Handle to a background debounce task.
///
/// Dropping the handle flushes any pending value and stops the task.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<Command<T>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the debounce task. `handler` runs on its own task for every
    /// value that survives its quiet period. Must be called inside a Tokio
    /// runtime.
    pub fn spawn<F, Fut>(mut handler: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command<T>>();

        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                let (mut latest, mut window) = match command {
                    Command::Trigger(value, window) => (value, window),
                    Command::Cancel => continue,
                };

                let fire = loop {
                    tokio::select! {
                        next = rx.recv() => match next {
                            Some(Command::Trigger(value, w)) => {
                                latest = value;
                                window = w;
                            }
                            Some(Command::Cancel) => break false,
                            None => break true,
                        },
                        _ = tokio::time::sleep(window) => break true,
                    }
                };

                if fire {
                    tokio::spawn(handler(latest));
                } else {
                    debug!("Pending recalculation cancelled");
                }
            }
        });

        Self { tx }
    }

    /// Schedule `value`, superseding anything still pending.
    /// Returns false if the task has stopped.
    pub fn trigger(&self, value: T, window: Duration) -> bool {
        self.tx.send(Command::Trigger(value, window)).is_ok()
    }

    /// Drop the pending value without delivering it.
    pub fn cancel(&self) {
        let _ = self.tx.send(Command::Cancel);
    }
}
