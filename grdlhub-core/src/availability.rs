//! Per-user availability for single occurrences.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub user_id: String,
    pub appointment_id: String,
    pub date: NaiveDate,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Availability {
    pub fn new(user_id: &str, appointment_id: &str, date: NaiveDate, available: bool) -> Self {
        Availability {
            user_id: user_id.to_string(),
            appointment_id: appointment_id.to_string(),
            date,
            available,
            updated_at: Some(Utc::now()),
        }
    }

    /// Document id: one record per (user, appointment, date).
    pub fn key(user_id: &str, appointment_id: &str, date: NaiveDate) -> String {
        format!("{}_{}_{}", user_id, appointment_id, date.format("%Y-%m-%d"))
    }

    pub fn status(&self) -> AvailabilityStatus {
        if self.available {
            AvailabilityStatus::Available
        } else {
            AvailabilityStatus::NotAvailable
        }
    }
}

/// Availability as shown to people: a missing record means "not yet submitted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AvailabilityStatus {
    NotSubmitted,
    Available,
    NotAvailable,
}

impl From<Option<&Availability>> for AvailabilityStatus {
    fn from(record: Option<&Availability>) -> Self {
        record.map_or(AvailabilityStatus::NotSubmitted, Availability::status)
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AvailabilityStatus::NotSubmitted => write!(f, "not submitted"),
            AvailabilityStatus::Available => write!(f, "available"),
            AvailabilityStatus::NotAvailable => write!(f, "not available"),
        }
    }
}
