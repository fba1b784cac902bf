//! Analysis cycles that tanks are archived under.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use std::{fmt, str::FromStr};

use crate::errors::StitchErr;

/// An analysis cycle, a date and an hour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cycle {
    time: NaiveDateTime,
}

impl Cycle {
    /// The usual number of hours between cycles.
    pub const DEFAULT_HOURS_BETWEEN: i64 = 6;

    /// Build a cycle from a `YYYYMMDD` date and an `HH` hour, as they appear in tank paths.
    pub fn new(date: &str, hour: &str) -> Result<Self, StitchErr> {
        if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StitchErr::InvalidCycle(format!(
                "date must be YYYYMMDD, got {:?}",
                date
            )));
        }
        let day = NaiveDate::parse_from_str(date, "%Y%m%d")?;

        if hour.len() != 2 || !hour.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StitchErr::InvalidCycle(format!(
                "hour must be HH, got {:?}",
                hour
            )));
        }
        let hour: u32 = hour
            .parse()
            .map_err(|_| StitchErr::InvalidCycle(format!("bad hour {:?}", hour)))?;

        let time = day
            .and_hms_opt(hour, 0, 0)
            .ok_or_else(|| StitchErr::InvalidCycle(format!("hour out of range: {}", hour)))?;

        Ok(Cycle { time })
    }

    /// The date part, `YYYYMMDD`.
    pub fn ymd(self) -> String {
        self.time.format("%Y%m%d").to_string()
    }

    /// The hour part, `HH`.
    pub fn hh(self) -> String {
        format!("{:02}", self.time.hour())
    }

    /// Create an iterator of all the cycles between two cycles, inclusive.
    ///
    /// Cycles sit on a grid starting at 00Z and stepping `hours_between` hours. The first cycle
    /// yielded is the first grid point at or after `start`.
    pub fn all_between(
        start: Cycle,
        end: Cycle,
        hours_between: i64,
    ) -> impl Iterator<Item = Cycle> {
        let delta_t = Duration::hours(hours_between.max(1));

        //
        // Find a good start time.
        //
        let mut round_start = start.time - Duration::hours(i64::from(start.time.hour()));
        while round_start < start.time {
            round_start += delta_t;
        }

        let end = end.time;
        std::iter::successors(Some(round_start), move |time| Some(*time + delta_t))
            .take_while(move |time| *time <= end)
            .map(|time| Cycle { time })
    }
}

impl FromStr for Cycle {
    type Err = StitchErr;

    /// Parse `YYYYMMDDHH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 10 || !s.is_ascii() {
            return Err(StitchErr::InvalidCycle(format!(
                "cycle must be YYYYMMDDHH, got {:?}",
                s
            )));
        }

        Cycle::new(&s[..8], &s[8..])
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.ymd(), self.hh())
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
