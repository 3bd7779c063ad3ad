//! Time source for note timestamps.

use chrono::{DateTime, Duration, SubsecRound, Utc};

/// Wall-clock source used by the store.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// `Utc::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Current time at the millisecond precision notes are persisted with.
pub(crate) fn stamp(clock: &dyn Clock) -> DateTime<Utc> {
    clock.now().trunc_subsecs(3)
}

/// Next `updated_at` after `previous`: the current time, or one millisecond
/// past `previous` when the clock has not moved beyond it.
pub(crate) fn advance(clock: &dyn Clock, previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = stamp(clock);
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}
