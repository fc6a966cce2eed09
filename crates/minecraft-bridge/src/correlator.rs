//! Fan-out of console output to in-flight commands
//!
//! The console has no request ids, so every registered command sees every
//! stdout line and judges relevance itself.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

/// Lines buffered per command before further lines are dropped for it
pub const DEFAULT_RESPONSE_BUFFER: usize = 10;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Identifier of one in-flight command
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandId(String);

impl CommandId {
    /// Time-based id with a process-wide sequence suffix
    pub fn generate() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("cmd-{}-{}", nanos, seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry of response channels keyed by command id
#[derive(Debug)]
pub struct ResponseCorrelator {
    subscribers: Mutex<HashMap<CommandId, mpsc::Sender<String>>>,
    capacity: usize,
    dropped: AtomicU64,
}

impl Default for ResponseCorrelator {
    fn default() -> Self {
        Self::new(DEFAULT_RESPONSE_BUFFER)
    }
}

impl ResponseCorrelator {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    // A panic while holding the map cannot leave it half-updated
    fn subscribers(&self) -> MutexGuard<'_, HashMap<CommandId, mpsc::Sender<String>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open a response channel for `id`. Must happen before the command is
    /// written, so no reply line is missed.
    pub fn register(self: &Arc<Self>, id: CommandId) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers().insert(id.clone(), tx);
        debug!(id = %id, "Registered response subscription");
        Subscription {
            id,
            rx,
            correlator: Arc::clone(self),
        }
    }

    /// Remove `id`, closing its channel. Returns whether it was registered.
    pub fn unregister(&self, id: &CommandId) -> bool {
        self.subscribers().remove(id).is_some()
    }

    /// Offer `line` to every registered command without waiting.
    ///
    /// A full buffer loses the line for that command only. Returns how many
    /// commands accepted it.
    pub fn fan_out(&self, line: &str) -> usize {
        let subscribers = self.subscribers();
        let mut delivered = 0;
        for (id, tx) in subscribers.iter() {
            match tx.try_send(line.to_string()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    debug!(id = %id, "Response buffer full, dropping line");
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
        delivered
    }

    /// Close every channel so pending waits end
    pub fn close_all(&self) {
        let mut subscribers = self.subscribers();
        if !subscribers.is_empty() {
            debug!(count = subscribers.len(), "Closing response subscriptions");
        }
        subscribers.clear();
    }

    /// Number of registered commands
    pub fn active(&self) -> usize {
        self.subscribers().len()
    }

    /// Lines dropped because a command's buffer was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Receiving end for one command. Unregisters itself when dropped.
#[derive(Debug)]
pub struct Subscription {
    id: CommandId,
    rx: mpsc::Receiver<String>,
    correlator: Arc<ResponseCorrelator>,
}

impl Subscription {
    pub fn id(&self) -> &CommandId {
        &self.id
    }

    /// Next line, or `None` once the channel is closed and drained
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.correlator.unregister(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_ids_are_unique() {
        let a = CommandId::generate();
        let b = CommandId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("cmd-"));
    }

    #[tokio::test]
    async fn test_fan_out_reaches_every_subscriber() {
        let correlator = Arc::new(ResponseCorrelator::default());
        let mut a = correlator.register(CommandId::generate());
        let mut b = correlator.register(CommandId::generate());

        assert_eq!(correlator.fan_out("hello"), 2);
        assert_eq!(a.recv().await.as_deref(), Some("hello"));
        assert_eq!(b.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_full_buffer_only_affects_its_owner() {
        let correlator = Arc::new(ResponseCorrelator::new(2));
        let _slow = correlator.register(CommandId::generate());
        let mut fast = correlator.register(CommandId::generate());

        correlator.fan_out("1");
        correlator.fan_out("2");
        assert_eq!(fast.recv().await.as_deref(), Some("1"));
        assert_eq!(fast.recv().await.as_deref(), Some("2"));

        // slow is full now; fast still gets the line
        assert_eq!(correlator.fan_out("3"), 1);
        assert_eq!(fast.recv().await.as_deref(), Some("3"));
        assert_eq!(correlator.dropped(), 1);
    }

    #[tokio::test]
    async fn test_drop_unregisters() {
        let correlator = Arc::new(ResponseCorrelator::default());
        let sub = correlator.register(CommandId::generate());
        let id = sub.id().clone();
        assert_eq!(correlator.active(), 1);

        drop(sub);
        assert_eq!(correlator.active(), 0);
        assert!(!correlator.unregister(&id));
        assert_eq!(correlator.fan_out("nobody listening"), 0);
    }

    #[tokio::test]
    async fn test_close_all_ends_waits() {
        let correlator = Arc::new(ResponseCorrelator::default());
        let mut sub = correlator.register(CommandId::generate());
        correlator.fan_out("last words");
        correlator.close_all();

        // Buffered lines are still delivered before the close is seen
        assert_eq!(sub.recv().await.as_deref(), Some("last words"));
        assert_eq!(sub.recv().await, None);
        assert_eq!(correlator.active(), 0);
    }
}
