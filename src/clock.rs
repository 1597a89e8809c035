use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

/// Source of "now" for period generation and status transitions.
///
/// Status changes hinge on date comparisons against today, so the current
/// date is injected rather than read ambiently. Production wires in
/// [`SystemClock`]; tests pin a [`FixedClock`] to exercise boundaries.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn now(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.today().and_time(NaiveTime::MIN))
    }
}

pub type SharedClock = Arc<dyn Clock>;

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
