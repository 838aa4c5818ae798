//! Attendance time accounting.
//!
//! Every screen and export derives worked time, lateness and presence from
//! the functions here, so the figures agree everywhere. Nothing in this
//! module performs I/O or reads the clock: the caller passes `now`.
//!
//! Malformed or partial input never produces an error. It degrades to the
//! sentinels documented on each function.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fmt;

use crate::model::attendance::AttendanceRecord;
use crate::model::settings::ExpectedStart;

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Parse a stored time of day. Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}

/// Whole hours and minutes worked. Minutes are truncated, never rounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct WorkedDuration {
    pub hours: i64,
    pub minutes: i64,
}

impl WorkedDuration {
    pub const ZERO: WorkedDuration = WorkedDuration { hours: 0, minutes: 0 };

    fn from_duration(d: Duration) -> Self {
        let total = d.num_minutes().max(0);
        Self {
            hours: total / 60,
            minutes: total % 60,
        }
    }

    /// `H:MM`
    pub fn as_clock(&self) -> String {
        format!("{}:{:02}", self.hours, self.minutes)
    }
}

/// `Hh Mm`
impl fmt::Display for WorkedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkedTime {
    /// No check-in yet; duration is undefined.
    NotStarted,
    Worked(WorkedDuration),
}

impl WorkedTime {
    pub fn duration(&self) -> Option<WorkedDuration> {
        match self {
            WorkedTime::NotStarted => None,
            WorkedTime::Worked(d) => Some(*d),
        }
    }

    pub fn label(&self) -> String {
        match self {
            WorkedTime::NotStarted => "No iniciado".to_string(),
            WorkedTime::Worked(d) => d.to_string(),
        }
    }

    pub fn clock_label(&self) -> String {
        match self {
            WorkedTime::NotStarted => "No iniciado".to_string(),
            WorkedTime::Worked(d) => d.as_clock(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lateness {
    /// No check-in to judge.
    NotApplicable,
    OnTime,
    Late { minutes: i64 },
}

impl Lateness {
    /// Minutes late for tabular display; zero unless late.
    pub fn minutes(&self) -> i64 {
        match self {
            Lateness::Late { minutes } => *minutes,
            _ => 0,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Lateness::NotApplicable => "N/A".to_string(),
            Lateness::OnTime => "A tiempo".to_string(),
            Lateness::Late { minutes } => format!("{} minutos", minutes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    pub fn label(&self) -> &'static str {
        match self {
            Presence::Present => "Presente",
            Presence::Absent => "Falto",
        }
    }
}

/// A span read off two times of day is never negative: a shift or break
/// that crosses midnight ends on the next day.
fn wrap_midnight(d: Duration) -> Duration {
    if d < Duration::zero() {
        d + Duration::hours(24)
    } else {
        d
    }
}

/// Longest span, in hours, an open shift can report.
const MAX_OPEN_SHIFT_HOURS: i64 = 24;

/// `now` earlier than the check-in counts as nothing worked yet. A record
/// left open on an earlier day stops growing after a full day.
fn open_span(start: NaiveDateTime, now: NaiveDateTime) -> Duration {
    (now - start).clamp(Duration::zero(), Duration::hours(MAX_OPEN_SHIFT_HOURS))
}

/// Time worked on `record`, counting up to `now` while there is no exit.
///
/// A finished lunch (both ends stamped) is subtracted. A lunch still in
/// progress is not: the clock keeps running through it until the end is
/// stamped. Unparseable times yield `0h 0m`.
pub fn elapsed_worked(record: &AttendanceRecord, now: NaiveDateTime) -> WorkedTime {
    let Some(enter) = record.enter.as_deref() else {
        return WorkedTime::NotStarted;
    };

    WorkedTime::Worked(worked_span(record, enter, now).unwrap_or(WorkedDuration::ZERO))
}

fn worked_span(record: &AttendanceRecord, enter: &str, now: NaiveDateTime) -> Option<WorkedDuration> {
    let enter = parse_time_of_day(enter)?;
    let mut worked = match record.exit.as_deref() {
        Some(exit) => wrap_midnight(parse_time_of_day(exit)? - enter),
        // Open shift: measured against the full `now`, never wrapped.
        None => open_span(record.date.and_time(enter), now),
    };

    if let (Some(lunch_start), Some(lunch_end)) =
        (record.lunch_start.as_deref(), record.lunch_end.as_deref())
    {
        let lunch = parse_time_of_day(lunch_end)? - parse_time_of_day(lunch_start)?;
        worked = worked - wrap_midnight(lunch);
    }

    Some(WorkedDuration::from_duration(worked))
}

/// How late the check-in was against `expected`.
///
/// Missing or unparseable check-in is `NotApplicable`. Arriving exactly at
/// or before the expected start is `OnTime`.
pub fn lateness(record: &AttendanceRecord, expected: ExpectedStart) -> Lateness {
    let Some(enter) = record.enter.as_deref().and_then(parse_time_of_day) else {
        return Lateness::NotApplicable;
    };

    if enter <= expected.time() {
        Lateness::OnTime
    } else {
        Lateness::Late {
            minutes: (enter - expected.time()).num_minutes().abs(),
        }
    }
}

pub fn presence_status(record: &AttendanceRecord) -> Presence {
    if record.enter.is_some() {
        Presence::Present
    } else {
        Presence::Absent
    }
}

/// Derived label only; "on break" is never stored.
pub fn is_on_break(record: &AttendanceRecord) -> bool {
    record.lunch_start.is_some() && record.lunch_end.is_none() && record.exit.is_none()
}

/// `HH:MM` for table cells, `N/A` when missing or unreadable.
pub fn display_time(raw: Option<&str>) -> String {
    raw.and_then(parse_time_of_day)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Everything a status panel or report row shows for one record.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSummary {
    pub worked: Option<WorkedDuration>,
    pub worked_label: String,
    pub worked_clock: String,
    pub lateness: Lateness,
    pub late_minutes: i64,
    pub lateness_label: String,
    pub presence: Presence,
    pub presence_label: &'static str,
    pub on_break: bool,
}

pub fn summarize(record: &AttendanceRecord, expected: ExpectedStart, now: NaiveDateTime) -> AttendanceSummary {
    let worked = elapsed_worked(record, now);
    let late = lateness(record, expected);
    let presence = presence_status(record);

    AttendanceSummary {
        worked: worked.duration(),
        worked_label: worked.label(),
        worked_clock: worked.clock_label(),
        lateness: late,
        late_minutes: late.minutes(),
        lateness_label: late.label(),
        presence,
        presence_label: presence.label(),
        on_break: is_on_break(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn seven() -> ExpectedStart {
        "07:00".parse().unwrap()
    }

    fn record(enter: Option<&str>, exit: Option<&str>) -> AttendanceRecord {
        AttendanceRecord {
            enter: enter.map(str::to_string),
            exit: exit.map(str::to_string),
            ..AttendanceRecord::new(7, day())
        }
    }

    fn with_lunch(mut r: AttendanceRecord, start: Option<&str>, end: Option<&str>) -> AttendanceRecord {
        r.lunch_start = start.map(str::to_string);
        r.lunch_end = end.map(str::to_string);
        r
    }

    fn worked(h: i64, m: i64) -> WorkedTime {
        WorkedTime::Worked(WorkedDuration { hours: h, minutes: m })
    }

    #[test]
    fn no_check_in_means_nothing_to_measure() {
        let r = with_lunch(record(None, None), Some("12:00"), None);
        assert_eq!(elapsed_worked(&r, at(10, 0)), WorkedTime::NotStarted);
        assert_eq!(lateness(&r, seven()), Lateness::NotApplicable);
        assert_eq!(presence_status(&r), Presence::Absent);
        assert_eq!(elapsed_worked(&r, at(10, 0)).label(), "No iniciado");
        assert_eq!(lateness(&r, seven()).label(), "N/A");
    }

    #[test]
    fn arriving_exactly_on_time() {
        let r = record(Some("07:00"), None);
        let late = lateness(&r, seven());
        assert_eq!(late, Lateness::OnTime);
        assert_eq!(late.minutes(), 0);
        assert_eq!(late.label(), "A tiempo");
    }

    #[test]
    fn arriving_early_is_on_time() {
        let r = record(Some("06:41"), None);
        assert_eq!(lateness(&r, seven()), Lateness::OnTime);
    }

    #[test]
    fn late_by_fifteen_minutes() {
        let r = record(Some("07:15"), None);
        let late = lateness(&r, seven());
        assert_eq!(late, Lateness::Late { minutes: 15 });
        assert_eq!(late.minutes(), 15);
        assert_eq!(late.label(), "15 minutos");
    }

    #[test]
    fn late_minutes_truncate_seconds() {
        let r = record(Some("07:15:59"), None);
        assert_eq!(lateness(&r, seven()), Lateness::Late { minutes: 15 });
    }

    #[test]
    fn unreadable_check_in_is_not_judged() {
        let r = record(Some("not-a-time"), None);
        assert_eq!(lateness(&r, seven()), Lateness::NotApplicable);
        assert_eq!(presence_status(&r), Presence::Present);
    }

    #[test]
    fn full_day_without_lunch() {
        let r = record(Some("09:00"), Some("17:00"));
        let w = elapsed_worked(&r, at(23, 0));
        assert_eq!(w, worked(8, 0));
        assert_eq!(w.label(), "8h 0m");
        assert_eq!(w.clock_label(), "8:00");
    }

    #[test]
    fn finished_lunch_is_subtracted() {
        let r = with_lunch(record(Some("09:00"), Some("17:00")), Some("12:00"), Some("13:00"));
        assert_eq!(elapsed_worked(&r, at(23, 0)), worked(7, 0));
    }

    #[test]
    fn shift_across_midnight() {
        let r = record(Some("22:00"), Some("02:00"));
        assert_eq!(elapsed_worked(&r, at(12, 0)), worked(4, 0));
    }

    #[test]
    fn lunch_across_midnight() {
        let r = with_lunch(record(Some("20:00"), Some("04:00")), Some("23:30"), Some("00:15"));
        assert_eq!(elapsed_worked(&r, at(12, 0)), worked(7, 15));
    }

    #[test]
    fn malformed_check_in_degrades_to_zero() {
        let r = record(Some("not-a-time"), None);
        let w = elapsed_worked(&r, at(12, 0));
        assert_eq!(w, worked(0, 0));
        assert_eq!(w.label(), "0h 0m");
    }

    #[test]
    fn malformed_lunch_degrades_to_zero() {
        let r = with_lunch(record(Some("08:00"), Some("16:00")), Some("12:00"), Some("??"));
        assert_eq!(elapsed_worked(&r, at(12, 0)), worked(0, 0));
    }

    #[test]
    fn in_progress_shift_counts_up_to_now() {
        let r = record(Some("07:10"), None);
        assert_eq!(elapsed_worked(&r, at(9, 55)), worked(2, 45));
    }

    #[test]
    fn in_progress_shift_never_decreases() {
        let r = with_lunch(record(Some("07:00"), None), Some("12:00"), Some("12:30"));
        let mut previous = WorkedDuration::ZERO;
        for minute in (7 * 60..24 * 60).step_by(7) {
            let now = at(minute / 60, minute % 60);
            let current = elapsed_worked(&r, now).duration().unwrap();
            assert!(current >= previous, "{current} < {previous} at {now}");
            previous = current;
        }
    }

    #[test]
    fn now_before_check_in_is_zero_not_a_full_day() {
        let r = record(Some("09:00"), None);
        assert_eq!(elapsed_worked(&r, at(8, 59)), worked(0, 0));
        assert_eq!(elapsed_worked(&r, at(9, 0)), worked(0, 0));
        assert_eq!(elapsed_worked(&r, at(9, 1)), worked(0, 1));
    }

    #[test]
    fn open_shift_across_midnight_counts_into_next_day() {
        let r = record(Some("22:00"), None);
        let next_day = day().succ_opt().unwrap().and_hms_opt(1, 0, 0).unwrap();
        assert_eq!(elapsed_worked(&r, next_day), worked(3, 0));
    }

    #[test]
    fn record_left_open_on_a_past_day_stops_at_a_full_day() {
        let r = record(Some("08:00"), None);
        let days_later = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap().and_hms_opt(9, 0, 0).unwrap();
        assert_eq!(elapsed_worked(&r, days_later), worked(24, 0));
        assert_eq!(elapsed_worked(&r, days_later).clock_label(), "24:00");
    }

    #[test]
    fn stale_open_record_subtracts_finished_lunch_from_the_cap() {
        let r = with_lunch(record(Some("08:00"), None), Some("12:00"), Some("13:00"));
        let days_later = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap().and_hms_opt(9, 0, 0).unwrap();
        assert_eq!(elapsed_worked(&r, days_later), worked(23, 0));
    }

    #[test]
    fn unfinished_lunch_keeps_accumulating() {
        let r = with_lunch(record(Some("08:00"), None), Some("12:00"), None);
        let at_noon = elapsed_worked(&r, at(12, 0)).duration().unwrap();
        let later = elapsed_worked(&r, at(12, 40)).duration().unwrap();
        assert_eq!(at_noon, WorkedDuration { hours: 4, minutes: 0 });
        assert_eq!(later, WorkedDuration { hours: 4, minutes: 40 });
        assert!(is_on_break(&r));
    }

    #[test]
    fn worked_minutes_are_truncated() {
        let r = record(Some("08:00:00"), Some("08:59:59"));
        assert_eq!(elapsed_worked(&r, at(12, 0)), worked(0, 59));
    }

    #[test]
    fn clock_format_pads_minutes() {
        let d = WorkedDuration { hours: 3, minutes: 5 };
        assert_eq!(d.as_clock(), "3:05");
        assert_eq!(d.to_string(), "3h 5m");
    }

    #[test]
    fn on_break_is_derived() {
        let working = record(Some("08:00"), None);
        assert!(!is_on_break(&working));
        let back = with_lunch(record(Some("08:00"), None), Some("12:00"), Some("12:30"));
        assert!(!is_on_break(&back));
    }

    #[test]
    fn table_cells_normalise_time() {
        assert_eq!(display_time(Some("07:05:33")), "07:05");
        assert_eq!(display_time(Some("7:05")), "07:05");
        assert_eq!(display_time(Some("garbage")), "N/A");
        assert_eq!(display_time(None), "N/A");
    }

    #[test]
    fn summary_combines_all_figures() {
        let r = with_lunch(record(Some("07:20"), None), Some("12:00"), None);
        let s = summarize(&r, seven(), at(12, 20));
        assert_eq!(s.worked, Some(WorkedDuration { hours: 5, minutes: 0 }));
        assert_eq!(s.worked_clock, "5:00");
        assert_eq!(s.late_minutes, 20);
        assert_eq!(s.lateness_label, "20 minutos");
        assert_eq!(s.presence, Presence::Present);
        assert_eq!(s.presence_label, "Presente");
        assert!(s.on_break);
    }
}
