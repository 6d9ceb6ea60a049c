//! Deterministic clock and id sources for tests.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::repo::{Clock, IdGenerator};

/// Advances one second on every reading.
pub struct SteppingClock {
    start: OffsetDateTime,
    ticks: AtomicI64,
}

impl SteppingClock {
    pub fn starting_at(start: OffsetDateTime) -> Self {
        Self {
            start,
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> OffsetDateTime {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.start + Duration::seconds(tick)
    }
}

/// Hands out `Uuid::from_u128(1)`, `(2)`, ...
#[derive(Default)]
pub struct SequentialIds(AtomicU64);

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> Uuid {
        Uuid::from_u128(u128::from(self.0.fetch_add(1, Ordering::SeqCst) + 1))
    }
}
