//! Resolving single-occurrence exceptions.

use chrono::NaiveDate;

use crate::appointment::{Appointment, AppointmentPatch, ExceptionAction};

/// What an exception says about one occurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// No exception: base fields apply.
    None,
    /// Occurrence is removed from every schedule.
    Cancelled,
    /// Occurrence shows the base fields overlaid with this patch.
    Modified(&'a AppointmentPatch),
}

impl Resolution<'_> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Resolution::Cancelled)
    }
}

/// Look up the exception recorded for `date` (exact date match).
pub fn resolve(appointment: &Appointment, date: NaiveDate) -> Resolution<'_> {
    match appointment.exception_on(date).map(|e| &e.action) {
        None => Resolution::None,
        Some(ExceptionAction::Cancelled) => Resolution::Cancelled,
        Some(ExceptionAction::Modified { modified_data }) => Resolution::Modified(modified_data),
    }
}

/// Effective appointment for `date`, or `None` when that occurrence is cancelled.
pub fn effective(appointment: &Appointment, date: NaiveDate) -> Option<Appointment> {
    match resolve(appointment, date) {
        Resolution::None => Some(appointment.clone()),
        Resolution::Cancelled => None,
        Resolution::Modified(patch) => Some(patch.apply(appointment)),
    }
}
