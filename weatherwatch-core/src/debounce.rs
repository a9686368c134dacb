//! Quiet-interval gate in front of suggestion lookups.
//!
//! Each `schedule` aborts the pending timer and starts a new one, so a burst
//! of calls releases only its last value. Released values are tagged with a
//! generation number; `accept` rejects anything that was superseded or
//! canceled after its timer had already fired.

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// A value released after the quiet interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub generation: u64,
    pub value: T,
}

#[derive(Debug)]
pub struct DebounceGate<T> {
    delay: Duration,
    generation: u64,
    pending: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<Fired<T>>,
}

impl<T> DebounceGate<T> {
    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value, if any. It will never be released.
    pub fn cancel(&mut self) {
        if self.pending.is_some() {
            debug!(generation = self.generation, "debounce canceled");
        }
        self.abort_pending();
        self.generation += 1;
    }

    /// True only for the latest scheduled value, and only once.
    pub fn accept(&mut self, fired: &Fired<T>) -> bool {
        if fired.generation != self.generation || self.pending.is_none() {
            debug!(
                generation = fired.generation,
                current = self.generation,
                "stale debounce dropped"
            );
            return false;
        }
        self.pending = None;
        true
    }
}

impl<T: Send + 'static> DebounceGate<T> {
    pub fn new(delay: Duration, tx: mpsc::UnboundedSender<Fired<T>>) -> Self {
        Self { delay, generation: 0, pending: None, tx }
    }

    /// A gate plus the receiving end of its channel.
    pub fn channel(delay: Duration) -> (Self, mpsc::UnboundedReceiver<Fired<T>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(delay, tx), rx)
    }

    /// Release `value` once `delay` passes without another call.
    pub fn schedule(&mut self, value: T) {
        self.abort_pending();
        self.generation += 1;

        let generation = self.generation;
        let delay = self.delay;
        let tx = self.tx.clone();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone only when the owner is shutting down.
            let _ = tx.send(Fired { generation, value });
        }));
    }
}

impl<T> Drop for DebounceGate<T> {
    fn drop(&mut self) {
        self.abort_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn burst_releases_only_the_last_value() {
        let (mut gate, mut rx) = DebounceGate::channel(DEFAULT_DEBOUNCE);

        gate.schedule("P");
        sleep(Duration::from_millis(100)).await;
        gate.schedule("Pa");
        sleep(Duration::from_millis(299)).await;
        gate.schedule("Par");
        sleep(Duration::from_millis(301)).await;

        let fired = rx.try_recv().expect("one value released");
        assert_eq!(fired.value, "Par");
        assert!(gate.accept(&fired));
        assert!(rx.try_recv().is_err());
        assert!(!gate.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_released_before_the_quiet_interval() {
        let (mut gate, mut rx) = DebounceGate::channel(DEFAULT_DEBOUNCE);

        gate.schedule("Lon");
        sleep(Duration::from_millis(299)).await;

        assert!(rx.try_recv().is_err());
        assert!(gate.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_pending_value() {
        let (mut gate, mut rx) = DebounceGate::channel(DEFAULT_DEBOUNCE);

        gate.schedule("Ber");
        sleep(Duration::from_millis(100)).await;
        gate.cancel();
        sleep(Duration::from_secs(1)).await;

        assert!(rx.try_recv().is_err());
        assert!(!gate.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn accept_rejects_superseded_and_repeated_values() {
        let (mut gate, _rx) = DebounceGate::channel(DEFAULT_DEBOUNCE);

        gate.schedule("Ro");
        let stale = Fired { generation: 1, value: "Ro" };
        gate.schedule("Rom");
        assert!(!gate.accept(&stale));

        let current = Fired { generation: 2, value: "Rom" };
        assert!(gate.accept(&current));
        assert!(!gate.accept(&current));
    }

    #[tokio::test(start_paused = true)]
    async fn accept_rejects_value_fired_before_cancel() {
        let (mut gate, _rx) = DebounceGate::channel(DEFAULT_DEBOUNCE);

        gate.schedule("Kyiv");
        let fired = Fired { generation: 1, value: "Kyiv" };
        gate.cancel();

        assert!(!gate.accept(&fired));
    }
}
