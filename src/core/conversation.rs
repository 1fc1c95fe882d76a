//! Conversation file names
//!
//! Conversation logs encode their start time in the file name:
//! - `YYYYMMDD-Topic.md`
//! - `YYYYMMDD-HHMM-Topic.md`

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Date (and optional time) parsed from a conversation file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationStamp {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub topic: String,
}

impl ConversationStamp {
    /// Parse a file name (or a path, whose last segment is used)
    pub fn parse(name: &str) -> Option<Self> {
        let file = name.rsplit('/').next().unwrap_or(name);
        let stem = file.rsplit_once('.').map(|(s, _)| s).unwrap_or(file);

        let mut parts = stem.splitn(3, '-');
        let date_part = parts.next()?;
        let date = parse_compact_date(date_part)?;

        let second = parts.next().unwrap_or("");
        let rest = parts.next();

        let (time, topic) = match rest {
            Some(rest) if second.len() == 4 && second.bytes().all(|b| b.is_ascii_digit()) => {
                let time = NaiveTime::parse_from_str(second, "%H%M").ok()?;
                (Some(time), rest.to_string())
            }
            Some(rest) => (None, format!("{}-{}", second, rest)),
            None => (None, second.to_string()),
        };

        Some(Self { date, time, topic })
    }

    /// Point in time used for recency ordering (midnight when no time given)
    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or(NaiveTime::MIN))
    }

    /// Human-readable form: `YYYY-MM-DD` or `YYYY-MM-DD HH:MM`
    pub fn display(&self) -> String {
        match self.time {
            Some(time) => format!("{} {}", self.date.format("%Y-%m-%d"), time.format("%H:%M")),
            None => self.date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Parse `YYYYMMDD`
pub fn parse_compact_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").ok()
}

/// Parse a user-supplied date, `YYYY-MM-DD` or `YYYYMMDD`
pub fn parse_date_arg(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_compact_date(s))
}

/// Sort paths newest first by their file name stamp
///
/// Names without a parseable stamp keep their relative order and go last.
pub fn sort_by_recency(paths: Vec<String>) -> Vec<(String, Option<ConversationStamp>)> {
    let mut stamped: Vec<_> = paths
        .into_iter()
        .map(|p| {
            let stamp = ConversationStamp::parse(&p);
            (p, stamp)
        })
        .collect();

    stamped.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => b.timestamp().cmp(&a.timestamp()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    stamped
}
