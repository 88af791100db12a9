// src/session/timer.rs

use std::{future::Future, time::Duration};

use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

/// A once-per-second countdown running on its own task.
///
/// When the budget reaches zero the expiry future runs exactly once.
/// `cancel()` or dropping the countdown stops it; expiry is then never run.
pub struct Countdown {
    remaining: watch::Receiver<u64>,
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl Countdown {
    pub fn start<F, Fut>(budget: Duration, on_expire: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let seconds = budget.as_secs();
        let (tx, remaining) = watch::channel(seconds);
        let (cancel, mut cancelled) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            let mut left = seconds;
            while left > 0 {
                tokio::select! {
                    _ = &mut cancelled => return,
                    _ = ticker.tick() => {
                        left -= 1;
                        tx.send_replace(left);
                    }
                }
            }

            tracing::debug!("Countdown of {}s expired", seconds);
            on_expire().await;
        });

        Self {
            remaining,
            cancel: Some(cancel),
            handle,
        }
    }

    pub fn remaining_seconds(&self) -> u64 {
        *self.remaining.borrow()
    }

    /// Receiver that observes every tick.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.remaining.clone()
    }

    /// Stops the countdown before expiry. Has no effect once expired.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Formats seconds as `MM:SS`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expiry_runs_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let countdown = Countdown::start(Duration::from_secs(3), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut ticks = countdown.subscribe();
        while *ticks.borrow_and_update() > 0 {
            ticks.changed().await.unwrap();
        }
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(countdown.remaining_seconds(), 0);
        assert!(countdown.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_expiry() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let mut countdown = Countdown::start(Duration::from_secs(10), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(countdown.remaining_seconds(), 6);
        countdown.cancel();

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(countdown.remaining_seconds() > 0);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(1800), "30:00");
        assert_eq!(format_clock(299), "04:59");
        assert_eq!(format_clock(0), "00:00");
    }
}
