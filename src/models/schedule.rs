//! Schedule entry model.
//!
//! Schedule entries are authored in the schedule grid and only read here.
//! Times are site-local wall-clock times on a single calendar day.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled block of work for one agent on one day.
///
/// The interval is half-open, `[start_time, end_time)`. An `end_time` of
/// `00:00` means the block runs to the end of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Unique identifier for the entry.
    pub id: Uuid,
    /// The scheduled agent.
    pub agent_id: Uuid,
    /// The activity being worked (phones, chat, training...).
    pub activity_type_id: Uuid,
    /// The calendar day of the entry.
    pub date: NaiveDate,
    /// Scheduled start, site-local.
    pub start_time: NaiveTime,
    /// Scheduled end, site-local.
    pub end_time: NaiveTime,
}

impl ScheduleEntry {
    /// Returns the entry as a pair of site-local datetimes, or `None` if the
    /// end does not come after the start.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::ScheduleEntry;
    /// use chrono::{NaiveDate, NaiveTime};
    /// use uuid::Uuid;
    ///
    /// let entry = ScheduleEntry {
    ///     id: Uuid::nil(),
    ///     agent_id: Uuid::nil(),
    ///     activity_type_id: Uuid::nil(),
    ///     date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
    ///     start_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
    ///     end_time: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
    /// };
    /// let (start, end) = entry.span().unwrap();
    /// assert_eq!((end - start).num_hours(), 2);
    /// ```
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = self.date.and_time(self.start_time);
        let end = if self.end_time == NaiveTime::MIN {
            self.date.and_time(NaiveTime::MIN) + Duration::days(1)
        } else {
            self.date.and_time(self.end_time)
        };
        (end > start).then_some((start, end))
    }

    /// Returns the scheduled length in minutes, or zero for an invalid entry.
    pub fn scheduled_minutes(&self) -> i64 {
        self.span()
            .map(|(start, end)| (end - start).num_minutes())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_entry(start: &str, end: &str) -> ScheduleEntry {
        ScheduleEntry {
            id: Uuid::new_v4(),
            agent_id: Uuid::new_v4(),
            activity_type_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            start_time: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            end_time: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
        }
    }

    #[test]
    fn test_span_day_shift() {
        let entry = make_entry("09:00", "17:00");
        let (start, end) = entry.span().unwrap();
        assert_eq!(start.to_string(), "2026-01-15 09:00:00");
        assert_eq!(end.to_string(), "2026-01-15 17:00:00");
        assert_eq!(entry.scheduled_minutes(), 480);
    }

    #[test]
    fn test_span_midnight_end_runs_to_end_of_day() {
        let entry = make_entry("23:30", "00:00");
        let (_, end) = entry.span().unwrap();
        assert_eq!(end.to_string(), "2026-01-16 00:00:00");
        assert_eq!(entry.scheduled_minutes(), 30);
    }

    #[test]
    fn test_span_rejects_inverted_entry() {
        let entry = make_entry("17:00", "09:00");
        assert_eq!(entry.span(), None);
        assert_eq!(entry.scheduled_minutes(), 0);
    }

    #[test]
    fn test_span_rejects_zero_length_entry() {
        let entry = make_entry("09:00", "09:00");
        assert_eq!(entry.span(), None);
    }

    #[test]
    fn test_deserialize_entry() {
        let json = r#"{
            "id": "6f1c2c1e-8f7a-4d7e-9d4b-4f6b1f0a2c11",
            "agent_id": "0b6d8b36-4c4f-4d59-bd6f-3f0f6f0c1a22",
            "activity_type_id": "9d2a7c55-1f1e-4b0a-8d88-0e8d1b7c3f33",
            "date": "2026-01-15",
            "start_time": "09:00:00",
            "end_time": "13:30:00"
        }"#;

        let entry: ScheduleEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.scheduled_minutes(), 270);
    }
}
