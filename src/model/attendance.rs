use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

/// One employee's attendance for one calendar date.
///
/// Times are kept as the text the database returns (`HH:MM` or
/// `HH:MM:SS`) so malformed values reach the calculator untouched.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 12)]
    pub user_id: u64,

    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "07:04", nullable = true)]
    pub enter: Option<String>,

    #[schema(example = "16:30", nullable = true)]
    pub exit: Option<String>,

    #[schema(example = "12:00", nullable = true)]
    pub lunch_start: Option<String>,

    #[schema(example = "12:45", nullable = true)]
    pub lunch_end: Option<String>,
}

impl AttendanceRecord {
    /// An empty record for `date`, nothing stamped yet.
    pub fn new(user_id: u64, date: NaiveDate) -> Self {
        Self {
            id: 0,
            user_id,
            date,
            enter: None,
            exit: None,
            lunch_start: None,
            lunch_end: None,
        }
    }
}

/// A single stamp an employee can record on today's attendance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Transition {
    Enter,
    LunchStart,
    LunchEnd,
    Exit,
}

#[derive(Debug, Display, PartialEq, Eq)]
pub enum TransitionError {
    #[display(fmt = "Already checked in today")]
    AlreadyCheckedIn,
    #[display(fmt = "No check-in found for today")]
    NotCheckedIn,
    #[display(fmt = "Already checked out today")]
    AlreadyCheckedOut,
    #[display(fmt = "Lunch already started")]
    LunchAlreadyStarted,
    #[display(fmt = "Lunch has not started")]
    LunchNotStarted,
    #[display(fmt = "Lunch already finished")]
    LunchAlreadyEnded,
    #[display(fmt = "Lunch still in progress")]
    LunchInProgress,
}

impl std::error::Error for TransitionError {}

impl Transition {
    /// Column written by this transition.
    pub fn column(&self) -> &'static str {
        match self {
            Transition::Enter => "enter",
            Transition::LunchStart => "lunch_start",
            Transition::LunchEnd => "lunch_end",
            Transition::Exit => "exit",
        }
    }

    /// Fields fill strictly forward: enter, lunch start, lunch end, exit.
    /// A field already stamped can never be stamped again.
    pub fn check(&self, record: Option<&AttendanceRecord>) -> Result<(), TransitionError> {
        let record = match (self, record) {
            (Transition::Enter, None) => return Ok(()),
            (Transition::Enter, Some(r)) if r.enter.is_none() => return Ok(()),
            (Transition::Enter, Some(_)) => return Err(TransitionError::AlreadyCheckedIn),
            (_, None) => return Err(TransitionError::NotCheckedIn),
            (_, Some(r)) => r,
        };

        if record.enter.is_none() {
            return Err(TransitionError::NotCheckedIn);
        }
        if record.exit.is_some() {
            return Err(TransitionError::AlreadyCheckedOut);
        }

        match self {
            Transition::LunchStart if record.lunch_start.is_some() => {
                Err(TransitionError::LunchAlreadyStarted)
            }
            Transition::LunchEnd if record.lunch_start.is_none() => {
                Err(TransitionError::LunchNotStarted)
            }
            Transition::LunchEnd if record.lunch_end.is_some() => {
                Err(TransitionError::LunchAlreadyEnded)
            }
            Transition::Exit if record.lunch_start.is_some() && record.lunch_end.is_none() => {
                Err(TransitionError::LunchInProgress)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record(enter: Option<&str>, ls: Option<&str>, le: Option<&str>, exit: Option<&str>) -> AttendanceRecord {
        AttendanceRecord {
            enter: enter.map(str::to_string),
            lunch_start: ls.map(str::to_string),
            lunch_end: le.map(str::to_string),
            exit: exit.map(str::to_string),
            ..AttendanceRecord::new(1, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
        }
    }

    #[test]
    fn parses_path_segments() {
        assert_eq!(Transition::from_str("enter").unwrap(), Transition::Enter);
        assert_eq!(Transition::from_str("lunch-start").unwrap(), Transition::LunchStart);
        assert_eq!(Transition::from_str("lunch-end").unwrap(), Transition::LunchEnd);
        assert_eq!(Transition::from_str("exit").unwrap(), Transition::Exit);
        assert!(Transition::from_str("lunch_start").is_err());
        assert_eq!(Transition::LunchEnd.to_string(), "lunch-end");
    }

    #[test]
    fn check_in_only_once() {
        assert_eq!(Transition::Enter.check(None), Ok(()));
        let r = record(Some("07:00"), None, None, None);
        assert_eq!(Transition::Enter.check(Some(&r)), Err(TransitionError::AlreadyCheckedIn));
    }

    #[test]
    fn nothing_before_check_in() {
        for t in [Transition::LunchStart, Transition::LunchEnd, Transition::Exit] {
            assert_eq!(t.check(None), Err(TransitionError::NotCheckedIn));
        }
    }

    #[test]
    fn lunch_moves_forward() {
        let working = record(Some("07:00"), None, None, None);
        assert_eq!(Transition::LunchStart.check(Some(&working)), Ok(()));
        assert_eq!(Transition::LunchEnd.check(Some(&working)), Err(TransitionError::LunchNotStarted));

        let on_break = record(Some("07:00"), Some("12:00"), None, None);
        assert_eq!(
            Transition::LunchStart.check(Some(&on_break)),
            Err(TransitionError::LunchAlreadyStarted)
        );
        assert_eq!(Transition::LunchEnd.check(Some(&on_break)), Ok(()));
        assert_eq!(Transition::Exit.check(Some(&on_break)), Err(TransitionError::LunchInProgress));

        let back = record(Some("07:00"), Some("12:00"), Some("12:40"), None);
        assert_eq!(Transition::LunchEnd.check(Some(&back)), Err(TransitionError::LunchAlreadyEnded));
        assert_eq!(Transition::Exit.check(Some(&back)), Ok(()));
    }

    #[test]
    fn closed_record_rejects_everything() {
        let done = record(Some("07:00"), None, None, Some("16:00"));
        assert_eq!(Transition::Exit.check(Some(&done)), Err(TransitionError::AlreadyCheckedOut));
        assert_eq!(
            Transition::LunchStart.check(Some(&done)),
            Err(TransitionError::AlreadyCheckedOut)
        );
        assert_eq!(Transition::Enter.check(Some(&done)), Err(TransitionError::AlreadyCheckedIn));
    }
}
