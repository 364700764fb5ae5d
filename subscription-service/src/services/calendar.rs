use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::sync::Arc;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Resolves "today" at the business's civil offset rather than in UTC.
#[derive(Clone)]
pub struct BusinessCalendar {
    offset: FixedOffset,
    clock: Arc<dyn Clock>,
}

impl BusinessCalendar {
    pub fn new(offset: FixedOffset, clock: Arc<dyn Clock>) -> Self {
        Self { offset, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.offset).date_naive()
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}
