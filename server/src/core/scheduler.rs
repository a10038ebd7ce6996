//! Fixed-cadence task scheduler
//!
//! A [`PollScheduler`] runs one task on a fixed interval, first tick
//! immediately. `stop()` is synchronous and idempotent: it signals the loop
//! and aborts the task, so nothing runs after it returns.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::clock::Clock;

struct RunningTask {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct PollScheduler {
    interval: Duration,
    clock: Arc<dyn Clock>,
    running: Mutex<Option<RunningTask>>,
    ticks: Arc<AtomicU64>,
}

impl PollScheduler {
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval,
            clock,
            running: Mutex::new(None),
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the loop. Returns false if it is already running.
    ///
    /// `task` receives the clock's time at each tick. A tick that falls due
    /// while the previous run is still going is skipped.
    pub fn start<F, Fut>(&self, mut task: F) -> bool
    where
        F: FnMut(DateTime<Utc>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut running = self.running.lock();
        if running
            .as_ref()
            .is_some_and(|current| !current.handle.is_finished())
        {
            return false;
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let clock = Arc::clone(&self.clock);
        let ticks = Arc::clone(&self.ticks);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;

                    _ = stop_rx.changed() => {
                        tracing::debug!("Poll scheduler stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        ticks.fetch_add(1, Ordering::Relaxed);
                        task(clock.now()).await;
                    }
                }
            }
        });

        tracing::debug!(interval_secs = interval.as_secs(), "Poll scheduler started");
        *running = Some(RunningTask { stop_tx, handle });
        true
    }

    /// Stop the loop. Returns false if it was not running.
    pub fn stop(&self) -> bool {
        match self.running.lock().take() {
            Some(task) => {
                let _ = task.stop_tx.send(true);
                task.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Number of ticks fired since creation
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{ManualClock, SystemClock};
    use chrono::TimeZone;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_on_interval() {
        let scheduler = PollScheduler::new(Duration::from_secs(30), Arc::new(SystemClock));
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        assert!(scheduler.start(move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }));

        // Ticks at 0s, 30s, 60s and 90s
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 4);
        assert_eq!(scheduler.ticks(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_final() {
        let scheduler = PollScheduler::new(Duration::from_secs(10), Arc::new(SystemClock));
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        scheduler.start(move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(scheduler.is_running());

        assert!(scheduler.stop());
        assert!(!scheduler.stop());
        assert!(!scheduler.is_running());

        let after_stop = runs.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_rejected() {
        let scheduler = PollScheduler::new(Duration::from_secs(10), Arc::new(SystemClock));
        assert!(scheduler.start(|_| async {}));
        assert!(!scheduler.start(|_| async {}));

        scheduler.stop();
        assert!(scheduler.start(|_| async {}));
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_receives_clock_time() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(now));
        let scheduler = PollScheduler::new(Duration::from_secs(5), clock);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        scheduler.start(move |at| {
            sink.lock().push(at);
            async {}
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(seen.lock().as_slice(), &[now]);
    }
}
