use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const IDLE_DISPLAY: &str = "00:00:00";

/// Renders `now - start` as `HH:MM:SS`. A start in the future counts as zero.
pub fn format_elapsed(start: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let total = (now - start).num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// The single periodic tick source of a session.
///
/// Each tick recomputes the elapsed time from the stored start timestamp, so
/// missed ticks (a suspended host view, a busy runtime) never accumulate drift.
/// Rendered values are published on a watch channel.
pub struct Ticker {
    period: Duration,
    display: Arc<watch::Sender<String>>,
    ticks: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        let (display, _) = watch::channel(IDLE_DISPLAY.to_string());
        Self {
            period,
            display: Arc::new(display),
            ticks: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    /// Starts ticking from `started_at`. Returns `false` without spawning
    /// anything if a tick source is already running.
    pub fn start(&mut self, started_at: DateTime<Utc>) -> bool {
        if self.is_running() {
            return false;
        }

        self.display.send_replace(IDLE_DISPLAY.to_string());
        let display = Arc::clone(&self.display);
        let ticks = Arc::clone(&self.ticks);
        let period = self.period;

        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                ticks.fetch_add(1, Ordering::Relaxed);
                display.send_replace(format_elapsed(started_at, Utc::now()));
            }
        }));
        true
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.display.send_replace(IDLE_DISPLAY.to_string());
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.display.subscribe()
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
