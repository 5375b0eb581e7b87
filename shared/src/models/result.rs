//! Query result model.
//!
//! A [`QueryResult`] records when a connector started and finished executing
//! its query, together with the provenance labels of the connector that ran
//! it. The content of the rows returned by the query is never captured.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Serialize, Serializer};

/// Timing and provenance metadata for one successful query execution.
///
/// Timestamps are held at millisecond resolution. The constructor enforces
/// `end >= start` and derives `duration` from the two timestamps, so the
/// duration always equals `end - start` exactly.
///
/// The serialized form keeps the field names consumers of the output file
/// already rely on:
///
/// ```json
/// {"queryStart":1700000000000,"queryEnd":1700000000042,"duration":42000000,"fromSite":"a","toSite":"b"}
/// ```
///
/// `queryStart` and `queryEnd` are epoch milliseconds, `duration` is in
/// nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    #[serde(rename = "queryStart", with = "chrono::serde::ts_milliseconds")]
    start: DateTime<Utc>,

    #[serde(rename = "queryEnd", with = "chrono::serde::ts_milliseconds")]
    end: DateTime<Utc>,

    #[serde(serialize_with = "serialize_nanos")]
    duration: TimeDelta,

    #[serde(rename = "fromSite")]
    source: String,

    #[serde(rename = "toSite")]
    destination: String,
}

impl QueryResult {
    /// Creates a result for an execution that ran from `start` to `end`.
    ///
    /// Both instants are truncated to whole milliseconds. If the wall clock
    /// stepped backwards during the execution, `end` is clamped to `start`
    /// and the duration is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{TimeDelta, Utc};
    /// use shared::models::QueryResult;
    ///
    /// let start = Utc::now();
    /// let result = QueryResult::new(start, start - TimeDelta::seconds(1), "a", "b");
    /// assert_eq!(result.end(), result.start());
    /// assert_eq!(result.duration(), TimeDelta::zero());
    /// ```
    #[must_use]
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        let start = truncate_to_millis(start);
        let end = truncate_to_millis(end).max(start);

        Self {
            start,
            end,
            duration: end - start,
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Instant the execution began.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Instant the execution completed.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Time spent executing, always `end - start`.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.duration
    }

    /// Label of the site the data was read from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Label of the site the data is destined for.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }
}

fn truncate_to_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(instant.timestamp_millis()).unwrap_or(instant)
}

fn serialize_nanos<S>(duration: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_i64(duration.num_nanoseconds().unwrap_or(i64::MAX))
}
