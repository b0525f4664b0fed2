pub mod appointment;
pub mod availability;
pub mod edit;
pub mod event_type;
pub mod privilege;
pub mod report;
pub mod schedule;
pub mod user;
