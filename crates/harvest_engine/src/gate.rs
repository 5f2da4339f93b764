use std::sync::Arc;

use tokio::sync::watch;

/// Cross-thread pause signal between the front end and a running harvest.
///
/// `set_paused` never blocks and may be called from any thread. The harvest
/// suspends in `await_resumed` between pages; a page already being fetched is
/// never interrupted.
#[derive(Debug, Clone)]
pub struct PauseGate {
    tx: Arc<watch::Sender<bool>>,
}

impl PauseGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn set_paused(&self, paused: bool) {
        self.tx.send_replace(paused);
    }

    pub fn is_paused(&self) -> bool {
        *self.tx.borrow()
    }

    /// Suspends until the gate is open. Returns whether it had to wait.
    pub async fn await_resumed(&self) -> bool {
        let mut rx = self.tx.subscribe();
        if !*rx.borrow_and_update() {
            return false;
        }
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|paused| !*paused).await;
        true
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::PauseGate;
    use std::time::Duration;

    #[tokio::test]
    async fn open_gate_does_not_wait() {
        let gate = PauseGate::new();
        assert!(!gate.await_resumed().await);
    }

    #[tokio::test]
    async fn paused_gate_blocks_until_cleared() {
        let gate = PauseGate::new();
        gate.set_paused(true);

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.await_resumed().await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!waiter.is_finished());

        gate.set_paused(false);
        let waited = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("waiter resumes")
            .expect("task ok");
        assert!(waited);
    }

    #[test]
    fn toggling_is_visible_across_clones() {
        let gate = PauseGate::new();
        let other = gate.clone();
        gate.set_paused(true);
        assert!(other.is_paused());
        other.set_paused(false);
        assert!(!gate.is_paused());
    }
}
