//! Appointment documents, single-occurrence exceptions and partial patches.
//!
//! An appointment is either single (occurs only on its anchor `date`) or
//! recurring (`repeat_pattern` set, optionally bounded by `end_date`).
//! Per-date changes to a recurring appointment are stored as [`Exception`]s
//! on the appointment itself, at most one per date.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{HubError, HubResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Event,
    Task,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Category::Event => write!(f, "event"),
            Category::Task => write!(f, "task"),
        }
    }
}

impl FromStr for Category {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "event" => Ok(Category::Event),
            "task" => Ok(Category::Task),
            other => Err(HubError::validation(format!(
                "Unknown category '{other}' (expected event or task)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatPattern {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl fmt::Display for RepeatPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            RepeatPattern::Weekly => "weekly",
            RepeatPattern::Biweekly => "biweekly",
            RepeatPattern::Monthly => "monthly",
            RepeatPattern::Quarterly => "quarterly",
            RepeatPattern::Yearly => "yearly",
        };
        write!(f, "{s}")
    }
}

impl FromStr for RepeatPattern {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weekly" => Ok(RepeatPattern::Weekly),
            "biweekly" => Ok(RepeatPattern::Biweekly),
            "monthly" => Ok(RepeatPattern::Monthly),
            "quarterly" => Ok(RepeatPattern::Quarterly),
            "yearly" => Ok(RepeatPattern::Yearly),
            other => Err(HubError::validation(format!(
                "Unknown repeat pattern '{other}' (expected weekly, biweekly, monthly, quarterly or yearly)"
            ))),
        }
    }
}

/// A scheduled appointment (event or task).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub title: String,
    pub category: Category,
    /// Anchor date. For recurring appointments, the first occurrence.
    pub date: NaiveDate,
    #[serde(
        default,
        with = "crate::serde_time::option_hhmm",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,

    // Recurrence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_pattern: Option<RepeatPattern>,
    /// Inclusive upper bound for recurrence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Sorted by date, at most one per date
    #[serde(default, deserialize_with = "deserialize_exceptions")]
    pub exceptions: Vec<Exception>,

    // Assignment
    /// Designated user ids (event path)
    #[serde(default, alias = "designatedUsers")]
    pub designations: Vec<String>,
    /// Privilege id whose holders share the task (task path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privilege_group: Option<String>,

    // Bookkeeping
    /// Bumped on every persisted write
    #[serde(default)]
    pub revision: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Appointment {
    pub fn new(title: impl Into<String>, category: Category, date: NaiveDate) -> Self {
        Appointment {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            category,
            date,
            time: None,
            place: None,
            duration_minutes: None,
            repeat_pattern: None,
            end_date: None,
            exceptions: Vec::new(),
            designations: Vec::new(),
            privilege_group: None,
            revision: 0,
            created_by: None,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.repeat_pattern.is_some()
    }

    /// Check field-level invariants before a write.
    pub fn validate(&self) -> HubResult<()> {
        if self.title.trim().is_empty() {
            return Err(HubError::validation("Title is required"));
        }
        if self.category == Category::Event && self.time.is_none() {
            return Err(HubError::validation(format!(
                "Event '{}' needs a time",
                self.title
            )));
        }
        if self.duration_minutes == Some(0) {
            return Err(HubError::validation("Duration must be at least one minute"));
        }
        if self.end_date.is_some() && !self.is_recurring() {
            return Err(HubError::validation(
                "An end date only applies to repeating appointments",
            ));
        }
        if self.exceptions.windows(2).any(|w| w[0].date >= w[1].date) {
            return Err(HubError::validation(
                "Exceptions must be unique per date and sorted",
            ));
        }
        Ok(())
    }

    pub fn exception_on(&self, date: NaiveDate) -> Option<&Exception> {
        self.exceptions
            .binary_search_by_key(&date, |e| e.date)
            .ok()
            .map(|i| &self.exceptions[i])
    }

    /// Insert an exception, replacing any existing one on the same date.
    pub fn set_exception(&mut self, exception: Exception) {
        match self
            .exceptions
            .binary_search_by_key(&exception.date, |e| e.date)
        {
            Ok(i) => self.exceptions[i] = exception,
            Err(i) => self.exceptions.insert(i, exception),
        }
    }

    /// Remove the exception on `date`. Returns whether one existed.
    pub fn clear_exception(&mut self, date: NaiveDate) -> bool {
        match self.exceptions.binary_search_by_key(&date, |e| e.date) {
            Ok(i) => {
                self.exceptions.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    /// Stop the series from `cutover` on (inclusive), keeping everything before it.
    ///
    /// Sets `end_date` to the day before `cutover` (never extends an earlier
    /// end date) and drops exceptions that now fall after the end.
    pub fn end_series(&mut self, cutover: NaiveDate) -> HubResult<NaiveDate> {
        if !self.is_recurring() {
            return Err(HubError::validation(format!(
                "'{}' does not repeat; delete it instead",
                self.title
            )));
        }
        let last_day = cutover
            .pred_opt()
            .ok_or_else(|| HubError::validation(format!("Invalid cutover date {cutover}")))?;

        let end = match self.end_date {
            Some(existing) if existing < last_day => existing,
            _ => last_day,
        };
        self.end_date = Some(end);
        self.exceptions.retain(|e| e.date <= end);
        Ok(end)
    }

    /// Replace base fields with a patch and drop every per-date exception.
    pub fn apply_to_series(&mut self, patch: &AppointmentPatch) {
        *self = patch.apply(self);
        self.exceptions.clear();
    }
}

impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Stored documents may list exceptions in insertion order, with repeats.
/// Sort them by date and keep the last entry written for each date.
fn deserialize_exceptions<'de, D>(deserializer: D) -> Result<Vec<Exception>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let mut raw = Vec::<Exception>::deserialize(deserializer)?;
    raw.sort_by_key(|e| e.date);

    let mut exceptions: Vec<Exception> = Vec::with_capacity(raw.len());
    for exception in raw {
        match exceptions.last_mut() {
            Some(last) if last.date == exception.date => *last = exception,
            _ => exceptions.push(exception),
        }
    }
    Ok(exceptions)
}

/// A change to one occurrence of a recurring appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exception {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub action: ExceptionAction,
}

impl Exception {
    pub fn cancelled(date: NaiveDate) -> Self {
        Exception {
            date,
            action: ExceptionAction::Cancelled,
        }
    }

    pub fn modified(date: NaiveDate, patch: AppointmentPatch) -> Self {
        Exception {
            date,
            action: ExceptionAction::Modified {
                modified_data: patch,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ExceptionAction {
    Cancelled,
    Modified {
        #[serde(rename = "modifiedData", default)]
        modified_data: AppointmentPatch,
    },
}

/// Partial overlay of appointment fields. `None` means "keep the base value".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        with = "crate::serde_time::option_hhmm",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privilege_group: Option<String>,
}

impl AppointmentPatch {
    pub fn is_empty(&self) -> bool {
        *self == AppointmentPatch::default()
    }

    /// Base record + patch -> effective record. The base is not modified.
    pub fn apply(&self, base: &Appointment) -> Appointment {
        let mut effective = base.clone();
        if let Some(title) = &self.title {
            effective.title = title.clone();
        }
        if let Some(time) = self.time {
            effective.time = Some(time);
        }
        if let Some(place) = &self.place {
            effective.place = Some(place.clone());
        }
        if let Some(minutes) = self.duration_minutes {
            effective.duration_minutes = Some(minutes);
        }
        if let Some(designations) = &self.designations {
            effective.designations = designations.clone();
        }
        if let Some(group) = &self.privilege_group {
            effective.privilege_group = Some(group.clone());
        }
        effective
    }

    /// Fold `newer` on top of this patch (newer fields win).
    pub fn merged_with(&self, newer: &AppointmentPatch) -> AppointmentPatch {
        AppointmentPatch {
            title: newer.title.clone().or_else(|| self.title.clone()),
            time: newer.time.or(self.time),
            place: newer.place.clone().or_else(|| self.place.clone()),
            duration_minutes: newer.duration_minutes.or(self.duration_minutes),
            designations: newer
                .designations
                .clone()
                .or_else(|| self.designations.clone()),
            privilege_group: newer
                .privilege_group
                .clone()
                .or_else(|| self.privilege_group.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn weekly_meeting() -> Appointment {
        let mut appt = Appointment::new("Midweek Meeting", Category::Event, date("2025-01-06"));
        appt.time = NaiveTime::from_hms_opt(18, 30, 0);
        appt.repeat_pattern = Some(RepeatPattern::Weekly);
        appt
    }

    #[test]
    fn test_set_exception_replaces_same_date() {
        let mut appt = weekly_meeting();
        appt.set_exception(Exception::cancelled(date("2025-01-13")));
        appt.set_exception(Exception::modified(
            date("2025-01-13"),
            AppointmentPatch {
                place: Some("Hall B".into()),
                ..Default::default()
            },
        ));

        let on_13th: Vec<_> = appt
            .exceptions
            .iter()
            .filter(|e| e.date == date("2025-01-13"))
            .collect();
        assert_eq!(on_13th.len(), 1);
        assert!(matches!(
            on_13th[0].action,
            ExceptionAction::Modified { .. }
        ));
    }

    #[test]
    fn test_set_exception_keeps_dates_sorted() {
        let mut appt = weekly_meeting();
        appt.set_exception(Exception::cancelled(date("2025-01-27")));
        appt.set_exception(Exception::cancelled(date("2025-01-13")));
        appt.set_exception(Exception::cancelled(date("2025-01-20")));

        let dates: Vec<_> = appt.exceptions.iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![date("2025-01-13"), date("2025-01-20"), date("2025-01-27")]
        );
        assert!(appt.validate().is_ok());
    }

    #[test]
    fn test_apply_to_series_clears_exceptions() {
        let mut appt = weekly_meeting();
        appt.set_exception(Exception::cancelled(date("2025-01-13")));
        appt.apply_to_series(&AppointmentPatch {
            time: NaiveTime::from_hms_opt(19, 0, 0),
            ..Default::default()
        });

        assert!(appt.exceptions.is_empty());
        assert_eq!(appt.time, NaiveTime::from_hms_opt(19, 0, 0));
    }

    #[test]
    fn test_patch_apply_leaves_base_untouched() {
        let base = weekly_meeting();
        let patch = AppointmentPatch {
            time: NaiveTime::from_hms_opt(19, 0, 0),
            ..Default::default()
        };

        let effective = patch.apply(&base);

        assert_eq!(effective.time, NaiveTime::from_hms_opt(19, 0, 0));
        assert_eq!(effective.title, base.title);
        assert_eq!(base.time, NaiveTime::from_hms_opt(18, 30, 0));
    }

    #[test]
    fn test_end_series_sets_day_before_cutover_and_prunes() {
        let mut appt = weekly_meeting();
        appt.set_exception(Exception::cancelled(date("2025-01-13")));
        appt.set_exception(Exception::cancelled(date("2025-02-03")));

        let end = appt.end_series(date("2025-01-27")).unwrap();

        assert_eq!(end, date("2025-01-26"));
        assert_eq!(appt.end_date, Some(date("2025-01-26")));
        assert_eq!(appt.exceptions.len(), 1);
    }

    #[test]
    fn test_end_series_never_extends_existing_end() {
        let mut appt = weekly_meeting();
        appt.end_date = Some(date("2025-01-10"));

        appt.end_series(date("2025-03-01")).unwrap();

        assert_eq!(appt.end_date, Some(date("2025-01-10")));
    }

    #[test]
    fn test_end_series_rejects_single_appointment() {
        let mut appt = Appointment::new("Visit", Category::Task, date("2025-01-06"));
        assert!(matches!(
            appt.end_series(date("2025-01-07")),
            Err(HubError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_requires_time_for_events() {
        let appt = Appointment::new("Assembly", Category::Event, date("2025-01-06"));
        assert!(appt.validate().is_err());

        let task = Appointment::new("Cleaning", Category::Task, date("2025-01-06"));
        assert!(task.validate().is_ok());
    }

    #[test]
    fn test_document_shape_uses_camel_case_field_names() {
        let mut appt = weekly_meeting();
        appt.set_exception(Exception::modified(
            date("2025-01-13"),
            AppointmentPatch {
                time: NaiveTime::from_hms_opt(19, 0, 0),
                ..Default::default()
            },
        ));

        let json = serde_json::to_value(&appt).unwrap();

        assert_eq!(json["repeatPattern"], "weekly");
        assert_eq!(json["time"], "18:30");
        assert_eq!(json["exceptions"][0]["action"], "modified");
        assert_eq!(json["exceptions"][0]["date"], "2025-01-13");
        assert_eq!(json["exceptions"][0]["modifiedData"]["time"], "19:00");
    }

    #[test]
    fn test_reads_unsorted_exceptions_in_date_order() {
        let json = r#"{
            "id": "a1",
            "title": "Midweek Meeting",
            "category": "event",
            "date": "2025-01-06",
            "time": "18:30",
            "repeatPattern": "weekly",
            "exceptions": [
                {"date": "2025-01-27", "action": "cancelled"},
                {"date": "2025-01-13", "action": "cancelled"},
                {"date": "2025-01-20", "action": "cancelled"},
                {"date": "2025-01-13", "action": "modified", "modifiedData": {"place": "Hall B"}}
            ]
        }"#;

        let mut appt: Appointment = serde_json::from_str(json).unwrap();

        let dates: Vec<_> = appt.exceptions.iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![date("2025-01-13"), date("2025-01-20"), date("2025-01-27")]
        );
        assert!(matches!(
            appt.exception_on(date("2025-01-13")).map(|e| &e.action),
            Some(ExceptionAction::Modified { .. })
        ));
        assert_eq!(
            appt.exception_on(date("2025-01-27")),
            Some(&Exception::cancelled(date("2025-01-27")))
        );
        assert!(appt.validate().is_ok());

        appt.set_exception(Exception::cancelled(date("2025-02-03")));
        assert!(appt.validate().is_ok());
    }

    #[test]
    fn test_reads_designated_users_alias() {
        let json = r#"{
            "id": "a1",
            "title": "Field Service",
            "category": "event",
            "date": "2025-01-06",
            "time": "09:30",
            "designatedUsers": ["u1", "u2"],
            "exceptions": [{"date": "2025-01-13", "action": "cancelled"}]
        }"#;

        let appt: Appointment = serde_json::from_str(json).unwrap();

        assert_eq!(appt.designations, vec!["u1", "u2"]);
        assert_eq!(appt.exceptions[0], Exception::cancelled(date("2025-01-13")));
        assert_eq!(appt.revision, 0);
    }
}
