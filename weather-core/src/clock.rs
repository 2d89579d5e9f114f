//! Wall-clock time at the queried place.
//!
//! "Tonight" and "at 8 PM" mean the place's evening, not the machine's, so
//! clock times in a query are read in the place's zone and then compared as
//! instants against forecast periods.

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::model::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaceClock {
    /// IANA zone reported by the regional source.
    Zone(Tz),
    /// Solar offset from longitude, used when no zone is known.
    Fixed(FixedOffset),
}

impl PlaceClock {
    /// Clock for a place, preferring a named zone such as `America/New_York`.
    pub fn for_place(time_zone: Option<&str>, coord: &Coordinate) -> Self {
        match time_zone.and_then(|name| name.parse::<Tz>().ok()) {
            Some(tz) => Self::Zone(tz),
            None => Self::from_longitude(coord.longitude),
        }
    }

    pub fn from_longitude(longitude: f64) -> Self {
        let hours = (longitude / 15.0).round().clamp(-12.0, 12.0) as i32;
        let offset = FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix());
        Self::Fixed(offset)
    }

    /// Wall time at the place for the instant `at`.
    pub fn local(&self, at: DateTime<Utc>) -> NaiveDateTime {
        self.localize(at).naive_local()
    }

    pub fn localize(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Self::Zone(tz) => at.with_timezone(tz).fixed_offset(),
            Self::Fixed(offset) => at.with_timezone(offset),
        }
    }

    /// The instant a place wall time refers to. Repeated hours resolve to the
    /// first occurrence; skipped hours (DST gap) resolve to one hour later.
    pub fn instant(&self, wall: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Self::Zone(tz) => {
                let found = match tz.from_local_datetime(&wall) {
                    LocalResult::None => tz.from_local_datetime(&(wall + chrono::Duration::hours(1))),
                    found => found,
                };
                found.earliest().map(|dt| dt.with_timezone(&Utc))
            }
            Self::Fixed(offset) => offset.from_local_datetime(&wall).earliest().map(|dt| dt.with_timezone(&Utc)),
        }
    }
}
