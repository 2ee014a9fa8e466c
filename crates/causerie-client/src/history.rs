//! In-memory history maintenance and local search.

use std::str::FromStr;

use causerie_shared::constants::HISTORY_LIMIT;
use causerie_shared::Conversation;
use chrono::{DateTime, Duration, Local, Utc};

/// Insert or replace `record` by id.
///
/// A replaced record keeps its position, creation date and tags. A new
/// record goes to the front; the oldest entries beyond the limit are
/// dropped.
pub fn upsert(history: &mut Vec<Conversation>, mut record: Conversation) {
    match history.iter_mut().find(|c| c.id == record.id) {
        Some(existing) => {
            record.created_at = existing.created_at;
            record.tags = std::mem::take(&mut existing.tags);
            *existing = record;
        }
        None => {
            history.insert(0, record);
            history.truncate(HISTORY_LIMIT);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryFilter {
    #[default]
    All,
    /// Same local calendar day.
    Today,
    /// Last 7 days.
    Week,
    /// Last 30 days.
    Month,
}

impl FromStr for HistoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" | "" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(format!("unknown filter '{other}'")),
        }
    }
}

impl HistoryFilter {
    pub fn accepts(self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::All => true,
            Self::Today => {
                created_at.with_timezone(&Local).date_naive()
                    == now.with_timezone(&Local).date_naive()
            }
            Self::Week => created_at >= now - Duration::days(7),
            Self::Month => created_at >= now - Duration::days(30),
        }
    }
}

/// Conversations matching `query` (title or any message text,
/// case-insensitive) and `filter`, in history order.
pub fn search<'a>(
    history: &'a [Conversation],
    query: &str,
    filter: HistoryFilter,
    now: DateTime<Utc>,
) -> Vec<&'a Conversation> {
    history
        .iter()
        .filter(|c| c.matches_query(query))
        .filter(|c| filter.accepts(c.created_at, now))
        .collect()
}

/// Compact age label: `3j`, `2h`, `5min`, or `maintenant`.
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - at;
    if elapsed.num_days() > 0 {
        format!("{}j", elapsed.num_days())
    } else if elapsed.num_hours() > 0 {
        format!("{}h", elapsed.num_hours())
    } else if elapsed.num_minutes() > 0 {
        format!("{}min", elapsed.num_minutes())
    } else {
        "maintenant".to_string()
    }
}
