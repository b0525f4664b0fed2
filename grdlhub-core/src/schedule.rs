//! Expanding appointments into the occurrences of a date range.

use chrono::NaiveDate;
use tracing::debug;

use crate::appointment::Appointment;
use crate::date_range::DateRange;
use crate::exception::{self, Resolution};
use crate::recurrence::occurs_on;

/// One dated instance of an appointment, with exceptions already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub date: NaiveDate,
    /// Effective fields for this date
    pub appointment: Appointment,
    /// Whether a `modified` exception shaped this occurrence
    pub modified: bool,
}

impl Occurrence {
    pub fn appointment_id(&self) -> &str {
        &self.appointment.id
    }
}

/// The occurrence of `appointment` on `date`, unless it doesn't occur or is cancelled.
pub fn occurrence_on(appointment: &Appointment, date: NaiveDate) -> Option<Occurrence> {
    if !occurs_on(appointment, date) {
        return None;
    }
    let modified = matches!(
        exception::resolve(appointment, date),
        Resolution::Modified(_)
    );
    exception::effective(appointment, date).map(|effective| Occurrence {
        date,
        appointment: effective,
        modified,
    })
}

/// All non-cancelled occurrences in `range`, sorted by date, time, then title.
pub fn expand(appointments: &[Appointment], range: &DateRange) -> Vec<Occurrence> {
    let mut occurrences: Vec<Occurrence> = range
        .days()
        .flat_map(move |day| {
            appointments
                .iter()
                .filter_map(move |appt| occurrence_on(appt, day))
        })
        .collect();

    occurrences.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(a.appointment.time.cmp(&b.appointment.time))
            .then_with(|| a.appointment.title.cmp(&b.appointment.title))
    });

    debug!(
        from = %range.from,
        to = %range.to,
        appointments = appointments.len(),
        occurrences = occurrences.len(),
        "Expanded schedule"
    );

    occurrences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::{AppointmentPatch, Category, Exception, RepeatPattern};
    use chrono::NaiveTime;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn meeting() -> Appointment {
        let mut appt = Appointment::new("Meeting", Category::Event, date("2025-01-06"));
        appt.time = NaiveTime::from_hms_opt(18, 30, 0);
        appt.repeat_pattern = Some(RepeatPattern::Weekly);
        appt
    }

    #[test]
    fn test_expand_skips_cancelled_and_marks_modified() {
        let mut appt = meeting();
        appt.set_exception(Exception::cancelled(date("2025-01-13")));
        appt.set_exception(Exception::modified(
            date("2025-01-20"),
            AppointmentPatch {
                place: Some("Hall B".into()),
                ..Default::default()
            },
        ));

        let range = DateRange::month_of(date("2025-01-01"));
        let occurrences = expand(&[appt], &range);

        let dates: Vec<_> = occurrences.iter().map(|o| o.date).collect();
        assert_eq!(
            dates,
            vec![date("2025-01-06"), date("2025-01-20"), date("2025-01-27")]
        );
        assert!(occurrences[1].modified);
        assert_eq!(occurrences[1].appointment.place.as_deref(), Some("Hall B"));
        assert!(!occurrences[0].modified);
    }

    #[test]
    fn test_expand_orders_same_day_by_time() {
        let late = meeting();
        let mut early = Appointment::new("Cart Witnessing", Category::Event, date("2025-01-06"));
        early.time = NaiveTime::from_hms_opt(9, 0, 0);

        let range = DateRange::new(date("2025-01-06"), date("2025-01-06")).unwrap();
        let occurrences = expand(&[late, early], &range);

        assert_eq!(occurrences[0].appointment.title, "Cart Witnessing");
        assert_eq!(occurrences[1].appointment.title, "Meeting");
    }

    #[test]
    fn test_occurrence_on_non_occurrence() {
        assert!(occurrence_on(&meeting(), date("2025-01-07")).is_none());
    }
}
