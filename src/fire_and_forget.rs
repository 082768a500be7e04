// src/fire_and_forget.rs
// Fire-and-forget write queue (spec §5 "Ordering guarantees", §9 design
// notes): address auto-save, search-history tracking, conversation
// logging, and training/sentiment recording must never block
// `processMessage`. Modeled as a bounded-capacity task queue with
// drop-on-overflow and a dropped-task counter, grounded in the teacher's
// `background::watcher::FileWatcher::run` (`crates/mira-server/src/background/watcher.rs`):
// a bounded `mpsc::channel` fed via `try_send` from a caller that must never
// block, logging and discarding on a full channel instead of backpressuring.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

type BoxedJob = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Clone)]
pub struct FireAndForgetQueue {
    sender: mpsc::Sender<BoxedJob>,
    dropped: Arc<AtomicU64>,
}

impl FireAndForgetQueue {
    /// Spawns the background worker and returns a handle. `capacity` bounds
    /// the queue; once full, new jobs are dropped rather than applying
    /// backpressure to the caller.
    pub fn spawn(capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<BoxedJob>(capacity);
        let dropped = Arc::new(AtomicU64::new(0));

        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                job.await;
            }
        });

        Self { sender, dropped }
    }

    /// Enqueues `job`. Never blocks the caller: if the queue is full the
    /// job is dropped and the drop counter incremented (spec §5, §9).
    pub fn submit<F>(&self, label: &'static str, job: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let wrapped: BoxedJob = Box::pin(async move {
            if let Err(e) = job.await {
                tracing::warn!(error = %e, task = label, "fire-and-forget task failed");
            }
        });

        match self.sender.try_send(wrapped) {
            Ok(()) => {}
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(task = label, "fire-and-forget queue full, dropping task");
            }
        }
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[tokio::test]
    async fn submitted_job_eventually_runs() {
        let queue = FireAndForgetQueue::spawn(8);
        let ran = Arc::new(AtomicBool::new(false));
        let ran2 = ran.clone();

        queue.submit("test", async move {
            ran2.store(true, Ordering::SeqCst);
            Ok(())
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn failing_job_is_swallowed_not_propagated() {
        let queue = FireAndForgetQueue::spawn(8);
        queue.submit("test", async move { anyhow::bail!("boom") });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(queue.dropped_count(), 0);
    }
}
