//! Live 12-hour clock for a fixed time zone.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("unknown time zone '{0}'")]
    UnknownZone(String),
}

/// Displayed parts of the current time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockReading {
    /// Hour without padding, 1-12
    pub hours: String,
    /// Two-digit minute
    pub minutes: String,
    /// "AM" or "PM"
    pub day_period: String,
    pub second: u32,
}

impl ClockReading {
    /// The separator blinks: visible on even seconds
    pub fn colon_visible(&self) -> bool {
        self.second % 2 == 0
    }
}

impl fmt::Display for ClockReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.hours, self.minutes, self.day_period)
    }
}

/// Recomputes the reading once per interval
#[derive(Debug)]
pub struct Clock {
    zone: Tz,
    interval: Duration,
    last_tick: Option<Instant>,
    reading: Option<ClockReading>,
}

impl Clock {
    pub fn new(zone_name: &str, interval: Duration) -> Result<Self, ClockError> {
        let zone: Tz = zone_name
            .parse()
            .map_err(|_| ClockError::UnknownZone(zone_name.to_string()))?;
        Ok(Clock {
            zone,
            interval,
            last_tick: None,
            reading: None,
        })
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn reading_at(&self, wall: DateTime<Utc>) -> ClockReading {
        let local = wall.with_timezone(&self.zone);
        ClockReading {
            hours: local.format("%-I").to_string(),
            minutes: local.format("%M").to_string(),
            day_period: local.format("%p").to_string(),
            second: local.second(),
        }
    }

    /// Update the reading on the first call and then once per interval.
    /// Returns true when the reading was recomputed.
    pub fn tick(&mut self, now: Instant, wall: DateTime<Utc>) -> bool {
        let due = match self.last_tick {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if due {
            self.reading = Some(self.reading_at(wall));
            self.last_tick = Some(now);
        }
        due
    }

    pub fn reading(&self) -> Option<&ClockReading> {
        self.reading.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn taipei() -> Clock {
        Clock::new("Asia/Taipei", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_afternoon_in_taipei() {
        // 05:05 UTC is 13:05 in Taipei
        let wall = Utc.with_ymd_and_hms(2024, 3, 7, 5, 5, 0).unwrap();
        let reading = taipei().reading_at(wall);
        assert_eq!(reading.hours, "1");
        assert_eq!(reading.minutes, "05");
        assert_eq!(reading.day_period, "PM");
        assert_eq!(reading.to_string(), "1:05 PM");
    }

    #[test]
    fn test_midnight_and_noon() {
        let clock = taipei();
        let midnight = Utc.with_ymd_and_hms(2024, 3, 6, 16, 0, 0).unwrap();
        assert_eq!(clock.reading_at(midnight).to_string(), "12:00 AM");
        let noon = Utc.with_ymd_and_hms(2024, 3, 7, 4, 30, 0).unwrap();
        assert_eq!(clock.reading_at(noon).to_string(), "12:30 PM");
    }

    #[test]
    fn test_unknown_zone_fails_fast() {
        let err = Clock::new("Mars/Olympus_Mons", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ClockError::UnknownZone(ref z) if z == "Mars/Olympus_Mons"));
    }

    #[test]
    fn test_tick_once_per_interval() {
        let mut clock = taipei();
        let t0 = Instant::now();
        let wall = Utc.with_ymd_and_hms(2024, 3, 7, 5, 5, 0).unwrap();

        assert!(clock.reading().is_none());
        assert!(clock.tick(t0, wall));
        assert_eq!(clock.reading().map(|r| r.to_string()).as_deref(), Some("1:05 PM"));

        let later = wall + chrono::Duration::minutes(1);
        assert!(!clock.tick(t0 + Duration::from_millis(500), later));
        assert_eq!(clock.reading().map(|r| r.to_string()).as_deref(), Some("1:05 PM"));

        assert!(clock.tick(t0 + Duration::from_secs(1), later));
        assert_eq!(clock.reading().map(|r| r.to_string()).as_deref(), Some("1:06 PM"));
    }

    #[test]
    fn test_colon_blinks() {
        let clock = taipei();
        let even = Utc.with_ymd_and_hms(2024, 3, 7, 5, 5, 2).unwrap();
        let odd = Utc.with_ymd_and_hms(2024, 3, 7, 5, 5, 3).unwrap();
        assert!(clock.reading_at(even).colon_visible());
        assert!(!clock.reading_at(odd).colon_visible());
    }
}
