// Cancellable fixed-period tasks used by the progress and emotion samplers

use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Shortest period a task will run with
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Flag shared between a task and its ticks.
///
/// Results produced by a tick are delivered through [`Liveness::run_if_live`].
/// The flag is checked immediately before delivery and no lock is held while
/// the delivery runs, so [`ScheduledTask::cancel`] never waits on a consumer
/// and a consumer may call back into whatever owns the task.
#[derive(Clone)]
pub struct Liveness {
    open: Arc<AtomicBool>,
}

impl Liveness {
    fn new() -> Self {
        Self {
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Run `f` only if the owning task is still live. Returns whether it ran.
    pub fn run_if_live<F: FnOnce()>(&self, f: F) -> bool {
        if !self.is_live() {
            return false;
        }
        f();
        true
    }

    pub fn is_live(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.open.store(false, Ordering::Release);
    }
}

/// A periodic task owned by the component that started it
pub struct ScheduledTask {
    name: &'static str,
    token: CancellationToken,
    liveness: Liveness,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    /// Spawn `tick` every `period`, first firing one period from now.
    ///
    /// A zero period is raised to one millisecond. Must be called from within
    /// a tokio runtime.
    pub fn spawn<F>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut(Liveness) -> BoxFuture<'static, ()> + Send + 'static,
    {
        let period = if period < MIN_PERIOD {
            warn!("{} period {:?} too short, using {:?}", name, period, MIN_PERIOD);
            MIN_PERIOD
        } else {
            period
        };

        let token = CancellationToken::new();
        let liveness = Liveness::new();

        let task_token = token.clone();
        let task_liveness = liveness.clone();
        let first_tick = Instant::now() + period;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if !task_liveness.is_live() {
                            break;
                        }
                        tick(task_liveness.clone()).await;
                    }
                }
            }

            debug!("{} loop exited", name);
        });

        debug!("{} loop started ({:?} period)", name, period);

        Self {
            name,
            token,
            liveness,
            handle: Some(handle),
        }
    }

    /// Cancel the task. Safe to call more than once.
    pub fn cancel(&mut self) {
        self.liveness.close();
        self.token.cancel();

        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("{} loop cancelled", self.name);
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some() && !self.token.is_cancelled()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::AtomicUsize;

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let mut task = ScheduledTask::spawn("test", Duration::from_secs(5), move |live| {
            let counter = Arc::clone(&counter);
            async move {
                live.run_if_live(|| {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
            .boxed()
        });

        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 0, "No tick at start");

        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert!(count.load(Ordering::SeqCst) >= 2);

        task.cancel();
        task.cancel();
        assert!(!task.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_cancel() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let mut task = ScheduledTask::spawn("test", Duration::from_secs(1), move |live| {
            let counter = Arc::clone(&counter);
            async move {
                live.run_if_live(|| {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
            .boxed()
        });

        task.cancel();
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_result_is_discarded() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = tokio::sync::watch::channel(false);

        let sink = Arc::clone(&delivered);
        let mut task = ScheduledTask::spawn("test", Duration::from_secs(1), move |live| {
            let sink = Arc::clone(&sink);
            let mut release = release_rx.clone();
            async move {
                // Simulated slow inference
                let _ = release.wait_for(|go| *go).await;
                live.run_if_live(|| {
                    sink.fetch_add(1, Ordering::SeqCst);
                });
            }
            .boxed()
        });

        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;

        // Snapshot the liveness a tick would hold, then cancel mid-flight
        let probe = task.liveness.clone();
        task.cancel();
        release_tx.send(true).ok();
        settle().await;

        assert!(!probe.run_if_live(|| {}));
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_still_ticks() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let mut task = ScheduledTask::spawn("test", Duration::ZERO, move |live| {
            let counter = Arc::clone(&counter);
            async move {
                live.run_if_live(|| {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
            .boxed()
        });

        tokio::time::advance(Duration::from_millis(5)).await;
        settle().await;

        assert!(task.is_running());
        assert!(count.load(Ordering::SeqCst) >= 1);
        task.cancel();
    }

    #[test]
    fn test_cancel_does_not_wait_for_delivery() {
        let liveness = Liveness::new();
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (finish_tx, finish_rx) = std::sync::mpsc::channel::<()>();

        let consumer = {
            let liveness = liveness.clone();
            std::thread::spawn(move || {
                liveness.run_if_live(|| {
                    entered_tx.send(()).unwrap();
                    finish_rx.recv().unwrap();
                })
            })
        };

        entered_rx.recv().unwrap();
        // Delivery is still running; closing must not block on it
        liveness.close();
        assert!(!liveness.run_if_live(|| {}));

        finish_tx.send(()).unwrap();
        assert!(consumer.join().unwrap());
    }
}
