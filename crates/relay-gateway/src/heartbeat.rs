//! Fixed-period heartbeat timer

use std::future::pending;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Timer that is idle until Hello arrives
///
/// The first tick lands one full period after [`start`](Self::start); ticks
/// never fire in bursts after a stall.
#[derive(Debug, Default)]
pub struct HeartbeatTimer {
    interval: Option<Interval>,
}

impl HeartbeatTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) with `period`
    pub fn start(&mut self, period: Duration) {
        let period = period.max(MIN_PERIOD);
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    pub fn stop(&mut self) {
        self.interval = None;
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Wait for the next tick; never completes while stopped
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let mut timer = HeartbeatTimer::new();
        timer.start(Duration::from_millis(1000));
        let started = Instant::now();

        timer.tick().await;
        assert_eq!(started.elapsed(), Duration::from_millis(1000));

        timer.tick().await;
        assert_eq!(started.elapsed(), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timer_never_fires() {
        let mut timer = HeartbeatTimer::new();
        assert!(!timer.is_running());
        assert!(timeout(Duration::from_secs(60), timer.tick()).await.is_err());

        timer.start(Duration::from_secs(1));
        timer.stop();
        assert!(timeout(Duration::from_secs(60), timer.tick()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_rearms_from_now() {
        let mut timer = HeartbeatTimer::new();
        timer.start(Duration::from_millis(1000));
        tokio::time::sleep(Duration::from_millis(900)).await;

        timer.start(Duration::from_millis(1000));
        let restarted = Instant::now();
        timer.tick().await;
        assert_eq!(restarted.elapsed(), Duration::from_millis(1000));
    }
}
