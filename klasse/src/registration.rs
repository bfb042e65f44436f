//! Registration window status and the Norwegian labels shown next to it.

use std::fmt::Display;

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Europe::Oslo;
use serde::{Deserialize, Serialize};

use crate::models::Attendance;

const SHORT_MONTHS: [&str; 12] = [
    "jan.", "feb.", "mar.", "apr.", "mai", "jun.", "jul.", "aug.", "sep.", "okt.", "nov.", "des.",
];

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Open,
    Closed,
}
impl Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Open => write!(f, "Åpen"),
            RegistrationStatus::Closed => write!(f, "Stengt"),
        }
    }
}

/// Open while `register_start <= now <= register_end`; closed without attendance or bounds.
pub fn registration_status(attendance: Option<&Attendance>, now: DateTime<Utc>) -> RegistrationStatus {
    let window = attendance.and_then(|a| Some((a.register_start?, a.register_end?)));
    match window {
        Some((start, end)) if start <= now && now <= end => RegistrationStatus::Open,
        _ => RegistrationStatus::Closed,
    }
}

/// Oslo wall time, e.g. `16. okt., 18:00`.
pub fn format_norwegian_date(instant: DateTime<Utc>) -> String {
    let local = instant.with_timezone(&Oslo);
    format!(
        "{}. {}, {:02}:{:02}",
        local.day(),
        SHORT_MONTHS[local.month0() as usize],
        local.hour(),
        local.minute()
    )
}

/// `"<start> - <end>"`, `None` when the attendance or either bound is missing.
pub fn format_registration_period<F>(attendance: Option<&Attendance>, format_date: F) -> Option<String>
where
    F: Fn(DateTime<Utc>) -> String,
{
    let attendance = attendance?;
    let start = format_date(attendance.register_start?);
    let end = format_date(attendance.register_end?);
    Some(format!("{start} - {end}"))
}

/// `Påmeldte: 12/40`, or `Påmeldte: 12` for pools without a capacity.
pub fn capacity_label(count: usize, capacity: Option<u32>) -> String {
    match capacity {
        Some(max) if max > 0 => format!("Påmeldte: {count}/{max}"),
        _ => format!("Påmeldte: {count}"),
    }
}

pub fn waitlist_label(count: usize) -> String {
    format!("Venteliste: {count}")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, m, d, h, min, 0).unwrap()
    }

    fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> Attendance {
        Attendance {
            register_start: Some(start),
            register_end: Some(end),
            ..Attendance::default()
        }
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let attendance = window(at(10, 1, 10, 0), at(10, 20, 10, 0));

        assert_eq!(registration_status(Some(&attendance), at(10, 1, 10, 0)), RegistrationStatus::Open);
        assert_eq!(registration_status(Some(&attendance), at(10, 20, 10, 0)), RegistrationStatus::Open);
        assert_eq!(registration_status(Some(&attendance), at(9, 30, 10, 0)), RegistrationStatus::Closed);
        assert_eq!(registration_status(Some(&attendance), at(10, 21, 10, 0)), RegistrationStatus::Closed);
    }

    #[test]
    fn missing_attendance_is_closed() {
        assert_eq!(registration_status(None, at(10, 1, 0, 0)), RegistrationStatus::Closed);
        assert_eq!(
            registration_status(Some(&Attendance::default()), at(10, 1, 0, 0)),
            RegistrationStatus::Closed
        );
        assert_eq!(RegistrationStatus::Closed.to_string(), "Stengt");
        assert_eq!(RegistrationStatus::Open.to_string(), "Åpen");
    }

    #[test]
    fn dates_are_shown_in_oslo_time() {
        // CEST, UTC+2
        assert_eq!(format_norwegian_date(at(10, 16, 16, 0)), "16. okt., 18:00");
        // CET, UTC+1
        assert_eq!(format_norwegian_date(at(11, 3, 8, 5)), "3. nov., 09:05");
        assert_eq!(format_norwegian_date(at(5, 31, 22, 30)), "1. jun., 00:30");
    }

    #[test]
    fn periods_need_both_bounds() {
        let attendance = window(at(10, 1, 10, 0), at(10, 20, 10, 0));
        assert_eq!(
            format_registration_period(Some(&attendance), format_norwegian_date).as_deref(),
            Some("1. okt., 12:00 - 20. okt., 12:00")
        );

        let open_ended = Attendance {
            register_start: Some(at(10, 1, 10, 0)),
            ..Attendance::default()
        };
        assert_eq!(format_registration_period(Some(&open_ended), format_norwegian_date), None);
        assert_eq!(format_registration_period(None, format_norwegian_date), None);
    }

    #[test]
    fn capacity_labels() {
        assert_eq!(capacity_label(12, Some(40)), "Påmeldte: 12/40");
        assert_eq!(capacity_label(12, None), "Påmeldte: 12");
        assert_eq!(capacity_label(3, Some(0)), "Påmeldte: 3");
        assert_eq!(waitlist_label(2), "Venteliste: 2");
    }
}
