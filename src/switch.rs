use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::task::JoinHandle;

/// Keeps at most one request alive: starting a new one aborts the previous
/// task and invalidates its [`Ticket`], so a late result can be recognised and
/// dropped even if it slipped past the abort.
#[derive(Debug, Default)]
pub struct SwitchLatest {
    latest: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl Ticket {
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }
}

impl SwitchLatest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel whatever is in flight and hand out the ticket for the next request.
    pub fn begin(&mut self) -> Ticket {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            generation,
            latest: Arc::clone(&self.latest),
        }
    }

    pub fn track(&mut self, task: JoinHandle<()>) {
        if let Some(old) = self.task.replace(task) {
            old.abort();
        }
    }

    /// Wait for the tracked request, if any, to finish.
    pub async fn settle(&mut self) {
        let Some(task) = self.task.take() else { return };
        if let Err(err) = task.await {
            if !err.is_cancelled() {
                tracing::error!("request task failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_only_latest_ticket_is_current() {
        let mut switch = SwitchLatest::new();
        let first = switch.begin();
        assert!(first.is_current());

        let second = switch.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
    }

    #[tokio::test]
    async fn test_begin_aborts_previous_task() {
        let mut switch = SwitchLatest::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        switch.begin();
        switch.track(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            let _ = tx.send(());
        }));

        switch.begin();
        // the sender is dropped by the abort instead of firing
        assert!(rx.await.is_err());
        switch.settle().await;
    }

    #[tokio::test]
    async fn test_settle_waits() {
        let mut switch = SwitchLatest::new();
        let done = Arc::new(AtomicU64::new(0));
        let flag = Arc::clone(&done);

        switch.begin();
        switch.track(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            flag.store(1, Ordering::SeqCst);
        }));
        switch.settle().await;

        assert_eq!(done.load(Ordering::SeqCst), 1);
    }
}
