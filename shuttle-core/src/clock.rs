use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike, Utc};
use std::sync::{Mutex, PoisonError};

/// Source of "now" in the operating civil time zone.
///
/// Every component that reasons about "today" or the current minute of the day
/// (synchronizer, allocation engine, cancellation cutoff) must read the same clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn minutes_now(&self) -> i32 {
        let now = self.now();
        (now.hour() * 60 + now.minute()) as i32
    }

    fn offset(&self) -> FixedOffset {
        *self.now().offset()
    }
}

/// Builds the operating offset from a minutes-east-of-UTC setting (IST is 330).
pub fn operating_offset(minutes_east: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes_east.checked_mul(60)?)
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Settable clock for tests and replaying a given service day.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Clock pinned to `date` at `hour:minute` in the given offset.
    pub fn at(date: NaiveDate, hour: u32, minute: u32, offset: FixedOffset) -> Option<Self> {
        let local = date.and_hms_opt(hour, minute, 0)?;
        let now = local.and_local_timezone(offset).single()?;
        Some(Self::new(now))
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
