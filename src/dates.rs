//! Date ranges and the evenly spaced bucket boundaries used to slice an analysis window.

use chrono::{DateTime, Datelike, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default distance between two bucket boundaries.
pub const DEFAULT_STEP_WEEKS: i64 = 1;

/// Default number of weeks covered by a report.
pub const DEFAULT_ANALYSIS_WEEKS: i64 = 12;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateRangeError {
    #[error("invalid date range: start {start} should precede end {end}")]
    Inverted {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("date range must have both bounds or neither (start: {start:?}, end: {end:?})")]
    HalfOpen {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },

    #[error("date range is empty")]
    Empty,

    #[error("bucket step must be positive, got {0}")]
    NonPositiveStep(Duration),

    #[error("an analysis window of {0} weeks is out of the supported date range")]
    WindowOverflow(i64),
}

/// An inclusive-exclusive `[start, end)` pair of timestamps, or the empty range.
///
/// The empty range is a sentinel for "no diff requested".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange", into = "RawDateRange")]
pub struct DateRange {
    bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DateRangeError> {
        if start >= end {
            return Err(DateRangeError::Inverted { start, end });
        }
        Ok(Self {
            bounds: Some((start, end)),
        })
    }

    pub fn empty() -> Self {
        Self { bounds: None }
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.bounds.map(|(start, _)| start)
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.bounds.map(|(_, end)| end)
    }

    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.bounds
    }

    /// Bucket boundaries spanning this range, `step` apart.
    pub fn buckets(&self, step: Duration) -> Result<DateSequence, DateRangeError> {
        let (start, end) = self.bounds.ok_or(DateRangeError::Empty)?;
        build_date_sequence(start, end, step)
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds {
            None => write!(f, "DateRange()"),
            Some((start, end)) => write!(
                f,
                "DateRange({}, {})",
                format_timestamp(&start),
                format_timestamp(&end)
            ),
        }
    }
}

/// Wire form of [`DateRange`]: `{"start": <timestamp|null>, "end": <timestamp|null>}`.
#[derive(Serialize, Deserialize)]
struct RawDateRange {
    #[serde(with = "nullable_timestamp")]
    start: Option<DateTime<Utc>>,
    #[serde(with = "nullable_timestamp")]
    end: Option<DateTime<Utc>>,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = DateRangeError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        match (raw.start, raw.end) {
            (None, None) => Ok(DateRange::empty()),
            (Some(start), Some(end)) => DateRange::new(start, end),
            (start, end) => Err(DateRangeError::HalfOpen { start, end }),
        }
    }
}

impl From<DateRange> for RawDateRange {
    fn from(range: DateRange) -> Self {
        Self {
            start: range.start(),
            end: range.end(),
        }
    }
}

mod nullable_timestamp {
    use super::{format_timestamp, parse_timestamp};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&format_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| parse_timestamp(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Renders a timestamp as RFC 3339 with second precision and a `Z` suffix.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses RFC 3339 timestamps, also accepting offsets written without a colon (`+0000`).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|ts| ts.with_timezone(&Utc))
}

/// Lazy sequence `start, start + step, ...` (all `< end`) terminated by exactly `end`.
///
/// The iterator is `Clone`, so a sequence can be replayed from any position.
#[derive(Debug, Clone)]
pub struct DateSequence {
    current: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
    finished: bool,
}

impl Iterator for DateSequence {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.current < self.end {
            let current = self.current;
            self.current = current + self.step;
            Some(current)
        } else {
            self.finished = true;
            Some(self.end)
        }
    }
}

pub fn build_date_sequence(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
) -> Result<DateSequence, DateRangeError> {
    if start >= end {
        return Err(DateRangeError::Inverted { start, end });
    }
    if step <= Duration::zero() {
        return Err(DateRangeError::NonPositiveStep(step));
    }
    Ok(DateSequence {
        current: start,
        end,
        step,
        finished: false,
    })
}

pub fn utc_now() -> DateTime<Utc> {
    Utc::now()
}

/// Moves `ts` back to the Monday of its week, keeping the time of day.
pub fn start_of_week(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts - Duration::days(ts.weekday().num_days_from_monday() as i64)
}

/// The report window: `weeks` full weeks before the current week's Monday, up to `now`.
pub fn analysis_range(now: DateTime<Utc>, weeks: i64) -> Result<DateRange, DateRangeError> {
    let start = Duration::try_weeks(weeks)
        .and_then(|window| start_of_week(now).checked_sub_signed(window))
        .ok_or(DateRangeError::WindowOverflow(weeks))?;
    DateRange::new(start, now)
}
