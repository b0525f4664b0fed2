//! Staffing and availability summaries over a date range.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::appointment::{Appointment, Category, ExceptionAction};
use crate::availability::{Availability, AvailabilityStatus};
use crate::date_range::DateRange;
use crate::recurrence::occurs_on;
use crate::schedule::{Occurrence, expand};
use crate::user::User;

#[derive(Debug, Clone)]
pub struct ScheduleReport {
    pub range: DateRange,
    /// Occurrences that take place (cancelled ones excluded)
    pub occurrences: usize,
    pub cancelled: usize,
    pub modified: usize,
    /// Designations per user, busiest first
    pub assignments: Vec<AssignmentCount>,
    /// Event occurrences nobody is designated to
    pub unstaffed: Vec<Occurrence>,
    /// Designated users who said they are not available
    pub unavailable_designees: Vec<UnavailableDesignee>,
    /// Responses of designated users, one per (user, occurrence)
    pub availability: AvailabilityTally,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentCount {
    pub user_id: String,
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnavailableDesignee {
    pub date: NaiveDate,
    pub title: String,
    pub user_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailabilityTally {
    pub available: usize,
    pub not_available: usize,
    pub not_submitted: usize,
}

impl AvailabilityTally {
    fn add(&mut self, status: AvailabilityStatus) {
        match status {
            AvailabilityStatus::Available => self.available += 1,
            AvailabilityStatus::NotAvailable => self.not_available += 1,
            AvailabilityStatus::NotSubmitted => self.not_submitted += 1,
        }
    }
}

impl ScheduleReport {
    pub fn build(
        appointments: &[Appointment],
        users: &[User],
        availability: &[Availability],
        range: DateRange,
    ) -> Self {
        let occurrences = expand(appointments, &range);

        let cancelled = appointments
            .iter()
            .flat_map(|appt| {
                appt.exceptions.iter().filter(move |e| {
                    matches!(e.action, ExceptionAction::Cancelled)
                        && range.contains(e.date)
                        && occurs_on(appt, e.date)
                })
            })
            .count();

        let names: HashMap<&str, &str> = users
            .iter()
            .map(|u| (u.id.as_str(), u.name.as_str()))
            .collect();
        let responses: HashMap<(&str, &str, NaiveDate), &Availability> = availability
            .iter()
            .map(|a| ((a.user_id.as_str(), a.appointment_id.as_str(), a.date), a))
            .collect();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut tally = AvailabilityTally::default();
        let mut unavailable_designees = Vec::new();
        let mut unstaffed = Vec::new();

        for occ in &occurrences {
            let appt = &occ.appointment;

            if appt.category == Category::Event
                && appt.designations.is_empty()
                && appt.privilege_group.is_none()
            {
                unstaffed.push(occ.clone());
            }

            for user_id in &appt.designations {
                *counts.entry(user_id.as_str()).or_default() += 1;

                let status = AvailabilityStatus::from(
                    responses
                        .get(&(user_id.as_str(), appt.id.as_str(), occ.date))
                        .copied(),
                );
                tally.add(status);

                if status == AvailabilityStatus::NotAvailable {
                    unavailable_designees.push(UnavailableDesignee {
                        date: occ.date,
                        title: appt.title.clone(),
                        user_name: names.get(user_id.as_str()).unwrap_or(&"?").to_string(),
                    });
                }
            }
        }

        let mut assignments: Vec<AssignmentCount> = counts
            .into_iter()
            .map(|(user_id, count)| AssignmentCount {
                user_id: user_id.to_string(),
                name: names.get(user_id).unwrap_or(&"?").to_string(),
                count,
            })
            .collect();
        assignments.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

        ScheduleReport {
            range,
            occurrences: occurrences.len(),
            cancelled,
            modified: occurrences.iter().filter(|o| o.modified).count(),
            assignments,
            unstaffed,
            unavailable_designees,
            availability: tally,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::{AppointmentPatch, Exception, RepeatPattern};
    use chrono::NaiveTime;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn user(id: &str, name: &str) -> User {
        let mut u = User::new(name, format!("{id}@example.com"));
        u.id = id.to_string();
        u
    }

    #[test]
    fn test_report_counts_assignments_and_responses() {
        let mut meeting = Appointment::new("Meeting", Category::Event, date("2025-01-06"));
        meeting.id = "a1".into();
        meeting.time = NaiveTime::from_hms_opt(18, 30, 0);
        meeting.repeat_pattern = Some(RepeatPattern::Weekly);
        meeting.designations = vec!["u1".into()];
        meeting.set_exception(Exception::cancelled(date("2025-01-13")));
        meeting.set_exception(Exception::modified(
            date("2025-01-20"),
            AppointmentPatch {
                designations: Some(vec!["u2".into()]),
                ..Default::default()
            },
        ));

        let mut open = Appointment::new("Cart", Category::Event, date("2025-01-08"));
        open.time = NaiveTime::from_hms_opt(9, 0, 0);

        let users = vec![user("u1", "Anna"), user("u2", "Ben")];
        let availability = vec![
            Availability::new("u1", "a1", date("2025-01-06"), true),
            Availability::new("u2", "a1", date("2025-01-20"), false),
        ];

        let report = ScheduleReport::build(
            &[meeting, open],
            &users,
            &availability,
            DateRange::month_of(date("2025-01-01")),
        );

        // Jan 6, 20, 27 + the cart on Jan 8
        assert_eq!(report.occurrences, 4);
        assert_eq!(report.cancelled, 1);
        assert_eq!(report.modified, 1);
        assert_eq!(report.assignments[0].name, "Anna");
        assert_eq!(report.assignments[0].count, 2);
        assert_eq!(report.assignments[1].count, 1);
        assert_eq!(report.unstaffed.len(), 1);
        assert_eq!(
            report.availability,
            AvailabilityTally {
                available: 1,
                not_available: 1,
                not_submitted: 1,
            }
        );
        assert_eq!(report.unavailable_designees[0].user_name, "Ben");
    }
}
