//! Occurrence matching for repeating appointments.
//!
//! All arithmetic is done on plain calendar dates (`NaiveDate`), so there is
//! no timezone drift at month or year boundaries. An anchor day that does not
//! exist in a target month (the 31st, Feb 29) yields no occurrence for that
//! month; dates are never clamped.

use chrono::{Datelike, Duration, NaiveDate};

use crate::appointment::{Appointment, RepeatPattern};
use crate::constants::NEXT_OCCURRENCE_SEARCH_DAYS;

/// Whether `target` is an occurrence of `appointment`.
///
/// Exceptions are not considered here: a cancelled occurrence still "occurs",
/// see [`crate::exception::resolve`].
pub fn occurs_on(appointment: &Appointment, target: NaiveDate) -> bool {
    let Some(pattern) = appointment.repeat_pattern else {
        return target == appointment.date;
    };

    if target < appointment.date {
        return false;
    }
    if appointment.end_date.is_some_and(|end| target > end) {
        return false;
    }

    pattern_matches(pattern, appointment.date, target)
}

/// Pattern check for `target >= anchor`.
fn pattern_matches(pattern: RepeatPattern, anchor: NaiveDate, target: NaiveDate) -> bool {
    let day_offset = (target - anchor).num_days();

    match pattern {
        RepeatPattern::Weekly => day_offset % 7 == 0,
        RepeatPattern::Biweekly => day_offset % 14 == 0,
        RepeatPattern::Monthly => {
            target.day() == anchor.day() && month_difference(anchor, target) >= 0
        }
        RepeatPattern::Quarterly => {
            let months = month_difference(anchor, target);
            target.day() == anchor.day() && months >= 0 && months % 3 == 0
        }
        RepeatPattern::Yearly => {
            target.month() == anchor.month()
                && target.day() == anchor.day()
                && target.year() >= anchor.year()
        }
    }
}

fn month_difference(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

/// First occurrence on or after `from`, ignoring exceptions.
pub fn next_occurrence(appointment: &Appointment, from: NaiveDate) -> Option<NaiveDate> {
    let start = from.max(appointment.date);

    if !appointment.is_recurring() {
        return (appointment.date >= from).then_some(appointment.date);
    }

    let mut day = start;
    let limit = start
        .checked_add_signed(Duration::days(NEXT_OCCURRENCE_SEARCH_DAYS))
        .unwrap_or(NaiveDate::MAX);
    while day <= limit {
        if appointment.end_date.is_some_and(|end| day > end) {
            return None;
        }
        if occurs_on(appointment, day) {
            return Some(day);
        }
        day = day.succ_opt()?;
    }
    None
}
