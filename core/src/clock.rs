//! Report clock: the caller's notion of "now" and "today".
//!
//! RULE: Nothing in the pipeline reads the system clock directly.
//! Every time-sensitive decision (visibility, due-soon predicates)
//! takes a ReportClock so results are reproducible in tests.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportClock {
    pub now: NaiveDateTime,
}

impl ReportClock {
    pub fn fixed(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// The caller's local wall clock.
    pub fn local_now() -> Self {
        Self {
            now: Local::now().naive_local(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }

    pub fn tomorrow(&self) -> Option<NaiveDate> {
        self.today().succ_opt()
    }

    /// `now + minutes`, saturating at the calendar maximum.
    pub fn horizon(&self, minutes: i64) -> NaiveDateTime {
        self.now
            .checked_add_signed(Duration::minutes(minutes))
            .unwrap_or(NaiveDateTime::MAX)
    }
}
