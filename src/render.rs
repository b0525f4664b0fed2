//! TUI rendering traits for grdlhub types.
//!
//! Extension traits that add colored terminal rendering to grdlhub-core
//! types using owo_colors.

use std::collections::HashMap;

use grdlhub_core::report::ScheduleReport;
use grdlhub_core::serde_time::format_hhmm;
use grdlhub_core::{
    Appointment, AvailabilityStatus, Category, EventType, Occurrence, Privilege, User, UserStatus,
};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

/// User id -> display name, for rendering designations.
pub struct Names(HashMap<String, String>);

impl Names {
    pub fn new(users: &[User]) -> Self {
        Names(
            users
                .iter()
                .map(|u| (u.id.clone(), u.name.clone()))
                .collect(),
        )
    }

    pub fn join(&self, ids: &[String]) -> String {
        ids.iter()
            .map(|id| self.0.get(id).map_or(id.as_str(), String::as_str))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn time_label(appt: &Appointment) -> String {
    appt.time
        .as_ref()
        .map(format_hhmm)
        .unwrap_or_else(|| "--:--".to_string())
}

impl Render for Category {
    fn render(&self) -> String {
        match self {
            Category::Event => "event".blue().to_string(),
            Category::Task => "task".magenta().to_string(),
        }
    }
}

impl Render for Appointment {
    fn render(&self) -> String {
        let repeat = match (self.repeat_pattern, self.end_date) {
            (Some(p), Some(end)) => format!("{} until {}", p, end),
            (Some(p), None) => p.to_string(),
            (None, _) => "once".to_string(),
        };

        format!(
            "{}  {} {}  {}  {} {}",
            short_id(&self.id).dimmed(),
            self.date,
            time_label(self),
            self.title.bold(),
            self.category.render(),
            format!("({}, rev {})", repeat, self.revision).dimmed()
        )
    }
}

impl Render for AvailabilityStatus {
    fn render(&self) -> String {
        match self {
            AvailabilityStatus::Available => self.to_string().green().to_string(),
            AvailabilityStatus::NotAvailable => self.to_string().red().to_string(),
            AvailabilityStatus::NotSubmitted => self.to_string().dimmed().to_string(),
        }
    }
}

impl Render for Privilege {
    fn render(&self) -> String {
        if self.active {
            self.name.clone()
        } else {
            format!("{} {}", self.name.dimmed(), "(inactive)".dimmed())
        }
    }
}

impl Render for User {
    fn render(&self) -> String {
        let status = match self.status {
            UserStatus::Active => self.status.to_string().green().to_string(),
            UserStatus::Invited => self.status.to_string().yellow().to_string(),
            UserStatus::Disabled => self.status.to_string().red().to_string(),
        };
        let admin = if self.is_admin() { " admin" } else { "" };

        format!("{} <{}> {}{}", self.name.bold(), self.email, status, admin)
    }
}

impl Render for EventType {
    fn render(&self) -> String {
        let privilege = self
            .required_privilege
            .as_deref()
            .map(|p| format!(", requires {}", p))
            .unwrap_or_default();

        format!(
            "{} {} {}",
            self.name.bold(),
            self.category.render(),
            format!("(max {}{})", self.max_designations, privilege).dimmed()
        )
    }
}

/// One schedule line; designations shown by name.
pub fn render_occurrence(occ: &Occurrence, names: &Names) -> String {
    let appt = &occ.appointment;

    let mut line = format!(
        "{} {}  {}",
        occ.date.format("%a %Y-%m-%d"),
        time_label(appt),
        appt.title.bold()
    );
    if let Some(place) = &appt.place {
        line.push_str(&format!(" @ {}", place));
    }
    if !appt.designations.is_empty() {
        line.push_str(&format!("  {}", names.join(&appt.designations).cyan()));
    }
    if occ.modified {
        line.push_str(&format!(" {}", "(changed)".yellow()));
    }
    line.push_str(&format!("  {}", short_id(occ.appointment_id()).dimmed()));
    line
}

impl Render for ScheduleReport {
    fn render(&self) -> String {
        let mut lines = vec![
            format!("{} {} .. {}", "Report".bold(), self.range.from, self.range.to),
            format!(
                "   {} occurrences, {} cancelled, {} changed",
                self.occurrences, self.cancelled, self.modified
            ),
            format!(
                "   Responses: {} available, {} not available, {} not submitted",
                self.availability.available.green(),
                self.availability.not_available.red(),
                self.availability.not_submitted.dimmed()
            ),
        ];

        if !self.assignments.is_empty() {
            lines.push(String::new());
            lines.push("Designations".bold().to_string());
            for a in &self.assignments {
                lines.push(format!("   {:>3}  {}", a.count, a.name));
            }
        }

        if !self.unstaffed.is_empty() {
            lines.push(String::new());
            lines.push("Nobody designated".yellow().bold().to_string());
            for occ in &self.unstaffed {
                lines.push(format!("   {}  {}", occ.date, occ.appointment.title));
            }
        }

        if !self.unavailable_designees.is_empty() {
            lines.push(String::new());
            lines.push("Designated but not available".red().bold().to_string());
            for d in &self.unavailable_designees {
                lines.push(format!("   {}  {}  {}", d.date, d.title, d.user_name));
            }
        }

        lines.join("\n")
    }
}
