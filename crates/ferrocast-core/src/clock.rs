//! Time source injected into the loader and its cache.

use std::sync::Mutex;
use std::time::Duration;

use time::OffsetDateTime;

use crate::CalendarDate;

/// Supplies "now" to components that would otherwise read the system clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    /// Current UTC calendar day.
    fn today(&self) -> CalendarDate {
        CalendarDate::from_date(self.now().date())
    }
}

/// Wall-clock time in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock frozen at midnight UTC of `date`.
    pub fn at_date(date: CalendarDate) -> Self {
        Self::new(date.into_inner().midnight().assume_utc())
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        self.now
            .lock()
            .map(|now| *now)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_across_days() {
        let clock = ManualClock::at_date(CalendarDate::parse("2024-01-01").expect("valid"));
        assert_eq!(clock.today().to_string(), "2024-01-01");

        clock.advance(Duration::from_secs(36 * 3600));
        assert_eq!(clock.today().to_string(), "2024-01-02");
    }
}
