use std::sync::Arc;

use tokio::sync::watch;

/// The banner's one-shot "initialized" signal.
///
/// Published once by the banner bootstrap; any number of waiters resolve
/// when it is, and waiters arriving later resolve immediately.
#[derive(Clone)]
pub struct InitSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for InitSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl InitSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Mark the banner initialized. Returns false if it already was.
    pub fn publish(&self) -> bool {
        self.tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        })
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the signal has been published.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot see a closed channel.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready};

    #[test]
    fn test_wait_resolves_after_publish() {
        let signal = InitSignal::new();
        let mut waiter = tokio_test::task::spawn(signal.wait());
        assert_pending!(waiter.poll());

        assert!(signal.publish());
        assert!(waiter.is_woken());
        assert_ready!(waiter.poll());
    }

    #[test]
    fn test_publish_is_one_shot() {
        let signal = InitSignal::new();
        assert!(!signal.is_ready());
        assert!(signal.publish());
        assert!(!signal.publish());
        assert!(signal.is_ready());
    }

    #[test]
    fn test_late_waiter_resolves_immediately() {
        let signal = InitSignal::new();
        signal.publish();
        let mut waiter = tokio_test::task::spawn(signal.wait());
        assert_ready!(waiter.poll());
    }
}
