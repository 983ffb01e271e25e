//! Inter-item pacing so the upstream service sees at most one item per interval.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

/// Called by the batch driver before each item.
pub trait RequestPacer {
    fn pace(&mut self);
}

/// Token bucket with burst 1: the first call passes immediately, later calls
/// block until one interval has elapsed since the previous permit.
pub struct GovernorPacer {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl GovernorPacer {
    pub fn new(interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let quota = Quota::with_period(interval)
            .expect("interval is clamped to be non-zero")
            .allow_burst(NonZeroU32::new(1).expect("non-zero limiter burst"));
        Self {
            limiter: RateLimiter::direct(quota),
        }
    }
}

impl RequestPacer for GovernorPacer {
    fn pace(&mut self) {
        loop {
            match self.limiter.check() {
                Ok(()) => return,
                Err(not_until) => {
                    let wait = not_until.wait_time_from(self.limiter.clock().now());
                    std::thread::sleep(wait.max(Duration::from_millis(1)));
                }
            }
        }
    }
}
