//! Session-owned scheduling
//!
//! Both types live inside one connection task and are dropped with it, so
//! closing a session cancels everything it had armed. Both wait forever
//! when there is nothing to do, which lets them sit in a `select!` loop.

use std::future;
use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// One-shot deferred actions
#[derive(Debug)]
pub struct Timers<T> {
    pending: Vec<(Instant, T)>,
}

impl<T: Copy> Timers<T> {
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    pub fn schedule(&mut self, timer: T, delay: Duration) {
        self.pending.push((Instant::now() + delay, timer));
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Wait for the earliest timer and remove it. Cancel safe.
    pub async fn next_due(&mut self) -> T {
        let Some((index, deadline)) = self
            .pending
            .iter()
            .enumerate()
            .min_by_key(|(_, (at, _))| *at)
            .map(|(i, (at, _))| (i, *at))
        else {
            return future::pending().await;
        };
        time::sleep_until(deadline).await;
        self.pending.remove(index).1
    }
}

impl<T: Copy> Default for Timers<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-rate movement tick; the first tick fires as soon as it starts
#[derive(Debug, Default)]
pub struct Ticker {
    interval: Option<Interval>,
}

impl Ticker {
    pub fn idle() -> Self {
        Self { interval: None }
    }

    pub fn start(&mut self, period: Duration) {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    pub fn stop(&mut self) {
        self.interval = None;
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timers_fire_in_deadline_order() {
        let start = Instant::now();
        let mut timers = Timers::new();
        timers.schedule('b', Duration::from_millis(200));
        timers.schedule('a', Duration::from_millis(100));
        assert_eq!(timers.len(), 2);

        assert_eq!(timers.next_due().await, 'a');
        assert_eq!(start.elapsed(), Duration::from_millis(100));
        assert_eq!(timers.next_due().await, 'b');
        assert_eq!(start.elapsed(), Duration::from_millis(200));
        assert!(timers.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timers_never_fire() {
        let mut timers = Timers::new();
        timers.schedule(1u8, Duration::from_millis(10));
        timers.cancel_all();
        let waited = time::timeout(Duration::from_secs(5), timers.next_due()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_waits_stay_pending() {
        let mut timers = Timers::<u8>::new();
        let mut due = tokio_test::task::spawn(timers.next_due());
        tokio_test::assert_pending!(due.poll());
        drop(due);

        let mut ticker = Ticker::idle();
        let mut tick = tokio_test::task::spawn(ticker.tick());
        tokio_test::assert_pending!(tick.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_period_and_stop() {
        let mut ticker = Ticker::idle();
        assert!(time::timeout(Duration::from_secs(1), ticker.tick()).await.is_err());

        let start = Instant::now();
        ticker.start(Duration::from_millis(50));
        for n in 0..5u32 {
            ticker.tick().await;
            assert_eq!(start.elapsed(), Duration::from_millis(50) * n);
        }

        ticker.stop();
        assert!(!ticker.is_running());
        assert!(time::timeout(Duration::from_secs(1), ticker.tick()).await.is_err());
    }
}
