use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// How often the displayed counter is allowed to advance.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

pub type ProgressFn = Arc<dyn Fn(u64) + Send + Sync>;

/// Smooths a bursty completion signal into a rate-limited counter.
///
/// `actual` is bumped synchronously as pages complete; `displayed` trails it,
/// advancing by at most one unit per tick, so a burst of page completions
/// reads as steady motion on a progress indicator. The observable sequence
/// handed to the callback is monotonically non-decreasing.
pub struct ProgressReporter {
    actual: Arc<AtomicU64>,
    displayed: Arc<AtomicU64>,
    callback: ProgressFn,
    ticker: JoinHandle<()>,
}

impl ProgressReporter {
    pub fn new(on_progress: impl Fn(u64) + Send + Sync + 'static) -> Self {
        let actual = Arc::new(AtomicU64::new(0));
        let displayed = Arc::new(AtomicU64::new(0));
        let callback: ProgressFn = Arc::new(on_progress);

        let ticker = tokio::spawn({
            let actual = actual.clone();
            let displayed = displayed.clone();
            let callback = callback.clone();
            async move {
                let mut interval = tokio::time::interval(TICK_INTERVAL);
                loop {
                    interval.tick().await;
                    let behind = displayed.load(Ordering::Acquire) < actual.load(Ordering::Acquire);
                    if behind {
                        let shown = displayed.fetch_add(1, Ordering::AcqRel) + 1;
                        callback(shown);
                    }
                }
            }
        });

        Self {
            actual,
            displayed,
            callback,
            ticker,
        }
    }

    /// Record one completed unit of work.
    pub fn increment(&self) {
        self.actual.fetch_add(1, Ordering::AcqRel);
    }

    pub fn actual(&self) -> u64 {
        self.actual.load(Ordering::Acquire)
    }

    pub fn displayed(&self) -> u64 {
        self.displayed.load(Ordering::Acquire)
    }

    /// Stop the ticker and snap the displayed counter to the actual count,
    /// invoking the callback one final time. Consumes the reporter so a run
    /// finalizes exactly once.
    pub fn finalize(self) -> u64 {
        self.ticker.abort();
        let total = self.actual.load(Ordering::Acquire);
        self.displayed.store(total, Ordering::Release);
        (self.callback)(total);
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn finalize_snaps_displayed_to_actual() {
        let reporter = ProgressReporter::new(|_| {});
        for _ in 0..37 {
            reporter.increment();
        }
        assert_eq!(reporter.actual(), 37);
        let total = reporter.finalize();
        assert_eq!(total, 37);
    }

    #[tokio::test]
    async fn callback_sequence_is_non_decreasing() {
        let seen: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ProgressReporter::new(move |v| sink.lock().unwrap().push(v));

        for _ in 0..5 {
            reporter.increment();
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
        reporter.finalize();

        let seen = seen.lock().unwrap();
        assert_eq!(*seen.last().unwrap(), 5);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn finalize_with_no_work_reports_zero() {
        let reporter = ProgressReporter::new(|_| {});
        assert_eq!(reporter.finalize(), 0);
    }
}
