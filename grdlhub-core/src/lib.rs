//! Core scheduling logic for GrdlHub.
//!
//! - `recurrence`, `exception` and `schedule` turn appointments into dated occurrences
//! - `designation` decides who may be designated and how many
//! - `store` persists typed documents as JSON files
//! - `hub` owns the store, validates writes and publishes appointment snapshots

pub mod appointment;
pub mod availability;
pub mod config;
pub mod constants;
pub mod date_range;
pub mod designation;
pub mod error;
pub mod event_type;
pub mod exception;
pub mod hub;
pub mod privilege;
pub mod recurrence;
pub mod report;
pub mod schedule;
pub mod serde_time;
pub mod store;
pub mod user;

pub use appointment::{
    Appointment, AppointmentPatch, Category, Exception, ExceptionAction, RepeatPattern,
};
pub use availability::{Availability, AvailabilityStatus};
pub use crate::config::HubConfig;
pub use date_range::DateRange;
pub use error::{HubError, HubResult};
pub use event_type::EventType;
pub use hub::{EditScope, Hub, HubSettings};
pub use privilege::Privilege;
pub use schedule::Occurrence;
pub use user::{Role, User, UserStatus};
