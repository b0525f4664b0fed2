//! The hub owns the document store and is the only writer.
//!
//! Every write is validated here before it reaches the store. Appointment
//! writes are serialized through one lock, checked against the caller's
//! expected revision when one is given, and followed by a fresh snapshot
//! pushed to all subscribers.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::appointment::{Appointment, AppointmentPatch, Exception, ExceptionAction};
use crate::availability::{Availability, AvailabilityStatus};
use crate::config::HubConfig;
use crate::constants::DEFAULT_MAX_DESIGNATIONS;
use crate::date_range::DateRange;
use crate::designation;
use crate::error::{HubError, HubResult};
use crate::event_type::{self, EventType};
use crate::privilege::{Privilege, find_active_by_name};
use crate::recurrence::occurs_on;
use crate::report::ScheduleReport;
use crate::schedule::{self, Occurrence};
use crate::store::JsonStore;
use crate::user::{Role, User, UserStatus};

/// Full list of appointments as of the latest write.
pub type AppointmentSnapshot = Arc<Vec<Appointment>>;

/// Which part of a recurring appointment an edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    /// Store the change as an exception for this date only
    ThisOccurrence(NaiveDate),
    /// Change the base record and drop all exceptions
    AllOccurrences,
}

#[derive(Debug, Clone)]
pub struct HubSettings {
    pub default_max_designations: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        HubSettings {
            default_max_designations: DEFAULT_MAX_DESIGNATIONS,
        }
    }
}

impl From<&HubConfig> for HubSettings {
    fn from(config: &HubConfig) -> Self {
        HubSettings {
            default_max_designations: config.default_max_designations,
        }
    }
}

pub struct Hub {
    store: JsonStore,
    settings: HubSettings,
    appointment_lock: Mutex<()>,
    snapshots: watch::Sender<AppointmentSnapshot>,
}

impl Hub {
    pub async fn open(store: JsonStore, settings: HubSettings) -> HubResult<Self> {
        let initial = store.list::<Appointment>().await?;
        let (snapshots, _) = watch::channel(Arc::new(initial));

        Ok(Hub {
            store,
            settings,
            appointment_lock: Mutex::new(()),
            snapshots,
        })
    }

    pub async fn from_config(config: &HubConfig) -> HubResult<Self> {
        let store = JsonStore::open(config.data_path()).await?;
        Self::open(store, HubSettings::from(config)).await
    }

    /// Receive a full appointment snapshot after every appointment write.
    pub fn subscribe(&self) -> watch::Receiver<AppointmentSnapshot> {
        self.snapshots.subscribe()
    }

    /// Callers hold `appointment_lock`, so snapshots go out in write order.
    async fn publish(&self) {
        match self.store.list::<Appointment>().await {
            Ok(all) => {
                debug!(appointments = all.len(), "Publishing appointment snapshot");
                self.snapshots.send_replace(Arc::new(all));
            }
            Err(e) => warn!(error = %e, "Could not refresh appointment snapshot"),
        }
    }

    // PRIVILEGES:

    pub async fn list_privileges(&self) -> HubResult<Vec<Privilege>> {
        let mut privileges = self.store.list::<Privilege>().await?;
        privileges.sort_by_key(|p| p.name.to_lowercase());
        Ok(privileges)
    }

    pub async fn privilege_by_name(&self, name: &str) -> HubResult<Privilege> {
        self.list_privileges()
            .await?
            .into_iter()
            .find(|p| p.has_name(name))
            .ok_or_else(|| HubError::not_found("Privilege", name))
    }

    pub async fn add_privilege(&self, name: &str) -> HubResult<Privilege> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HubError::validation("Privilege name is required"));
        }
        if self.list_privileges().await?.iter().any(|p| p.has_name(name)) {
            return Err(HubError::validation(format!(
                "A privilege named '{name}' already exists"
            )));
        }

        let privilege = Privilege::new(name);
        self.store.put(&privilege).await?;

        info!(privilege = %privilege.name, id = %privilege.id, "Added privilege");
        Ok(privilege)
    }

    pub async fn set_privilege_active(&self, name: &str, active: bool) -> HubResult<Privilege> {
        let mut privilege = self.privilege_by_name(name).await?;
        privilege.active = active;
        self.store.put(&privilege).await?;

        info!(privilege = %privilege.name, active, "Changed privilege state");
        Ok(privilege)
    }

    // USERS:

    pub async fn list_users(&self) -> HubResult<Vec<User>> {
        let mut users = self.store.list::<User>().await?;
        users.sort_by_key(|u| u.name.to_lowercase());
        Ok(users)
    }

    pub async fn get_user(&self, id: &str) -> HubResult<User> {
        self.store
            .get::<User>(id)
            .await?
            .ok_or_else(|| HubError::not_found("User", id))
    }

    pub async fn user_by_email(&self, email: &str) -> HubResult<User> {
        self.list_users()
            .await?
            .into_iter()
            .find(|u| u.has_email(email))
            .ok_or_else(|| HubError::not_found("User", email))
    }

    pub async fn add_user(&self, name: &str, email: &str, role: Role) -> HubResult<User> {
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() {
            return Err(HubError::validation("Name is required"));
        }
        if !email.contains('@') {
            return Err(HubError::validation(format!(
                "'{email}' is not an email address"
            )));
        }
        if self.list_users().await?.iter().any(|u| u.has_email(email)) {
            return Err(HubError::validation(format!(
                "A user with email '{email}' already exists"
            )));
        }

        let mut user = User::new(name, email);
        user.role = role;
        self.store.put(&user).await?;

        info!(user = %user.name, id = %user.id, "Added user");
        Ok(user)
    }

    pub async fn grant_privilege(&self, email: &str, privilege_name: &str) -> HubResult<User> {
        let mut user = self.user_by_email(email).await?;
        let privilege = self.privilege_by_name(privilege_name).await?;
        if !privilege.active {
            return Err(HubError::validation(format!(
                "Privilege '{}' is inactive",
                privilege.name
            )));
        }

        if !user.holds(&privilege.id) {
            user.privileges.push(privilege.id.clone());
            self.store.put(&user).await?;
            info!(user = %user.name, privilege = %privilege.name, "Granted privilege");
        }
        Ok(user)
    }

    pub async fn revoke_privilege(&self, email: &str, privilege_name: &str) -> HubResult<User> {
        let mut user = self.user_by_email(email).await?;
        let privilege = self.privilege_by_name(privilege_name).await?;

        if user.holds(&privilege.id) {
            user.privileges.retain(|p| *p != privilege.id);
            self.store.put(&user).await?;
            info!(user = %user.name, privilege = %privilege.name, "Revoked privilege");
        }
        Ok(user)
    }

    pub async fn set_user_status(&self, email: &str, status: UserStatus) -> HubResult<User> {
        let mut user = self.user_by_email(email).await?;
        user.status = status;
        self.store.put(&user).await?;

        info!(user = %user.name, %status, "Changed user status");
        Ok(user)
    }

    // EVENT TYPES:

    pub async fn list_event_types(&self) -> HubResult<Vec<EventType>> {
        let mut types = self.store.list::<EventType>().await?;
        types.sort_by_key(|t| t.name.to_lowercase());
        Ok(types)
    }

    pub async fn add_event_type(&self, event_type: EventType) -> HubResult<EventType> {
        event_type.validate()?;

        if self
            .list_event_types()
            .await?
            .iter()
            .any(|t| t.matches_title(&event_type.name))
        {
            return Err(HubError::validation(format!(
                "An event type named '{}' already exists",
                event_type.name
            )));
        }
        if let Some(required) = &event_type.required_privilege {
            let privileges = self.list_privileges().await?;
            if find_active_by_name(&privileges, required).is_none() {
                return Err(HubError::not_found("Privilege", required.as_str()));
            }
        }

        {
            let _guard = self.appointment_lock.lock().await;

            for appointment in self.store.list::<Appointment>().await? {
                let over_cap = effective_records(&appointment).find(|record| {
                    event_type.matches_title(&record.title)
                        && record.designations.len() > event_type.max_designations
                });
                if let Some(record) = over_cap {
                    return Err(HubError::validation(format!(
                        "'{}' on {} already has {} designated; '{}' would allow {}",
                        record.title,
                        record.date,
                        record.designations.len(),
                        event_type.name,
                        event_type.max_designations
                    )));
                }
            }

            self.store.put(&event_type).await?;
        }

        info!(event_type = %event_type.name, max = event_type.max_designations, "Added event type");
        Ok(event_type)
    }

    // APPOINTMENTS:

    pub async fn list_appointments(&self) -> HubResult<Vec<Appointment>> {
        let mut appointments = self.store.list::<Appointment>().await?;
        appointments.sort_by(|a, b| a.date.cmp(&b.date).then(a.time.cmp(&b.time)));
        Ok(appointments)
    }

    pub async fn get_appointment(&self, id: &str) -> HubResult<Appointment> {
        self.store
            .get::<Appointment>(id)
            .await?
            .ok_or_else(|| HubError::not_found("Appointment", id))
    }

    /// Look up by full id or by an unambiguous id prefix.
    pub async fn find_appointment(&self, id_or_prefix: &str) -> HubResult<Appointment> {
        if let Ok(Some(appointment)) = self.store.get::<Appointment>(id_or_prefix).await {
            return Ok(appointment);
        }

        let mut matches: Vec<Appointment> = self
            .store
            .find(|a: &Appointment| a.id.starts_with(id_or_prefix))
            .await?;

        match matches.len() {
            0 => Err(HubError::not_found("Appointment", id_or_prefix)),
            1 => Ok(matches.remove(0)),
            n => Err(HubError::validation(format!(
                "'{id_or_prefix}' matches {n} appointments; use more characters"
            ))),
        }
    }

    pub async fn create_appointment(&self, mut appointment: Appointment) -> HubResult<Appointment> {
        {
            let _guard = self.appointment_lock.lock().await;
            let rules = self.assignment_rules().await?;

            if self
                .store
                .get::<Appointment>(&appointment.id)
                .await?
                .is_some()
            {
                return Err(HubError::validation(format!(
                    "Appointment '{}' already exists",
                    appointment.id
                )));
            }

            rules.normalize(&mut appointment);
            appointment.validate()?;
            rules.check(&appointment)?;
            appointment.revision = 1;

            self.store.put(&appointment).await?;
            self.publish().await;
        }

        info!(
            appointment = %appointment.title,
            id = %appointment.id,
            date = %appointment.date,
            repeat = ?appointment.repeat_pattern,
            "Created appointment"
        );
        Ok(appointment)
    }

    /// Edit an appointment, either one occurrence or the whole series.
    ///
    /// A single-occurrence edit of a recurring appointment is stored as a
    /// `modified` exception, folded into any earlier modification of the
    /// same date. An all-occurrences edit (and any edit of a single
    /// appointment) rewrites the base record and clears every exception.
    pub async fn edit_appointment(
        &self,
        id: &str,
        scope: EditScope,
        patch: AppointmentPatch,
        expected_revision: Option<u64>,
    ) -> HubResult<Appointment> {
        if patch.is_empty() {
            return Err(HubError::validation("Nothing to change"));
        }

        let updated = self
            .update_appointment(id, expected_revision, |appt| {
                match scope {
                    EditScope::ThisOccurrence(date) => {
                        if !occurs_on(appt, date) {
                            return Err(occurrence_not_found(appt, date));
                        }
                        if appt.is_recurring() {
                            let patch = match appt.exception_on(date).map(|e| &e.action) {
                                Some(ExceptionAction::Modified { modified_data }) => {
                                    modified_data.merged_with(&patch)
                                }
                                _ => patch,
                            };
                            appt.set_exception(Exception::modified(date, patch));
                        } else {
                            appt.apply_to_series(&patch);
                        }
                    }
                    EditScope::AllOccurrences => appt.apply_to_series(&patch),
                }
                Ok(())
            })
            .await?;

        info!(appointment = %updated.title, id = %updated.id, ?scope, "Edited appointment");
        Ok(updated)
    }

    pub async fn cancel_occurrence(
        &self,
        id: &str,
        date: NaiveDate,
        expected_revision: Option<u64>,
    ) -> HubResult<Appointment> {
        let updated = self
            .update_appointment(id, expected_revision, |appt| {
                if !appt.is_recurring() {
                    return Err(HubError::validation(format!(
                        "'{}' does not repeat; delete it instead",
                        appt.title
                    )));
                }
                if !occurs_on(appt, date) {
                    return Err(occurrence_not_found(appt, date));
                }
                appt.set_exception(Exception::cancelled(date));
                Ok(())
            })
            .await?;

        info!(appointment = %updated.title, %date, "Cancelled occurrence");
        Ok(updated)
    }

    /// Undo a cancellation or modification of one occurrence.
    pub async fn restore_occurrence(
        &self,
        id: &str,
        date: NaiveDate,
        expected_revision: Option<u64>,
    ) -> HubResult<Appointment> {
        let updated = self
            .update_appointment(id, expected_revision, |appt| {
                if appt.clear_exception(date) {
                    Ok(())
                } else {
                    Err(HubError::not_found(
                        "Exception",
                        format!("{} on {}", appt.title, date),
                    ))
                }
            })
            .await?;

        info!(appointment = %updated.title, %date, "Restored occurrence");
        Ok(updated)
    }

    /// Stop a series from `cutover` on, keeping earlier occurrences.
    pub async fn end_series(
        &self,
        id: &str,
        cutover: NaiveDate,
        expected_revision: Option<u64>,
    ) -> HubResult<Appointment> {
        let updated = self
            .update_appointment(id, expected_revision, |appt| {
                appt.end_series(cutover).map(|_| ())
            })
            .await?;

        info!(appointment = %updated.title, end = ?updated.end_date, "Ended series");
        Ok(updated)
    }

    /// Delete an appointment and its availability records.
    ///
    /// A repeating appointment that already started has history and must be
    /// ended with [`Hub::end_series`] instead.
    pub async fn delete_appointment(&self, id: &str, today: NaiveDate) -> HubResult<()> {
        {
            let _guard = self.appointment_lock.lock().await;
            let appointment = self.get_appointment(id).await?;

            if appointment.is_recurring() && appointment.date < today {
                return Err(HubError::validation(format!(
                    "'{}' has past occurrences; end the series instead of deleting it",
                    appointment.title
                )));
            }

            self.store.delete::<Appointment>(id).await?;

            let records: Vec<Availability> = self
                .store
                .find(|a: &Availability| a.appointment_id == id)
                .await?;
            for record in &records {
                let key = Availability::key(&record.user_id, &record.appointment_id, record.date);
                self.store.delete::<Availability>(&key).await?;
            }

            info!(
                appointment = %appointment.title,
                id,
                availability_records = records.len(),
                "Deleted appointment"
            );
            self.publish().await;
        }

        Ok(())
    }

    /// Load, check revision, change, validate, bump revision, write, publish.
    async fn update_appointment<F>(
        &self,
        id: &str,
        expected_revision: Option<u64>,
        change: F,
    ) -> HubResult<Appointment>
    where
        F: FnOnce(&mut Appointment) -> HubResult<()>,
    {
        let _guard = self.appointment_lock.lock().await;
        let rules = self.assignment_rules().await?;
        let stored = self.get_appointment(id).await?;

        if let Some(expected) = expected_revision {
            if expected != stored.revision {
                return Err(HubError::Conflict {
                    id: stored.id,
                    expected,
                    actual: stored.revision,
                });
            }
        }

        let mut updated = stored.clone();
        change(&mut updated)?;
        rules.normalize(&mut updated);
        updated.validate()?;
        rules.check(&updated)?;
        updated.revision = stored.revision + 1;

        self.store.put(&updated).await?;
        self.publish().await;
        Ok(updated)
    }

    async fn assignment_rules(&self) -> HubResult<AssignmentRules> {
        Ok(AssignmentRules {
            users: self.store.list().await?,
            privileges: self.store.list().await?,
            event_types: self.store.list().await?,
            default_max: self.settings.default_max_designations,
        })
    }

    // ELIGIBILITY:

    /// Users who may be designated to an appointment.
    ///
    /// When the title is in the event type catalog with a required privilege,
    /// only its holders (plus current designees) qualify. Otherwise everyone
    /// who is not disabled does.
    pub async fn eligible_users(&self, appointment_id: &str) -> HubResult<Vec<User>> {
        let appointment = self.get_appointment(appointment_id).await?;
        let users = self.list_users().await?;
        let event_types = self.list_event_types().await?;

        let required = event_type::for_title(&event_types, &appointment.title)
            .and_then(|t| t.required_privilege.clone());

        match required {
            Some(required) => {
                let privileges = self.list_privileges().await?;
                let eligible = designation::eligible_users(
                    &users,
                    &privileges,
                    &required,
                    &appointment.designations,
                )?;
                Ok(eligible.into_iter().cloned().collect())
            }
            None => Ok(users
                .into_iter()
                .filter(|u| {
                    u.status != UserStatus::Disabled || appointment.designations.contains(&u.id)
                })
                .collect()),
        }
    }

    // AVAILABILITY:

    pub async fn set_availability(
        &self,
        user_id: &str,
        appointment_id: &str,
        date: NaiveDate,
        available: bool,
    ) -> HubResult<Availability> {
        let user = self.get_user(user_id).await?;

        let _guard = self.appointment_lock.lock().await;
        let appointment = self.get_appointment(appointment_id).await?;

        if schedule::occurrence_on(&appointment, date).is_none() {
            return Err(if occurs_on(&appointment, date) {
                HubError::validation(format!(
                    "'{}' on {} is cancelled",
                    appointment.title, date
                ))
            } else {
                occurrence_not_found(&appointment, date)
            });
        }

        let record = Availability::new(&user.id, &appointment.id, date, available);
        self.store.put(&record).await?;

        info!(user = %user.name, appointment = %appointment.title, %date, available, "Recorded availability");
        Ok(record)
    }

    pub async fn availability_status(
        &self,
        user_id: &str,
        appointment_id: &str,
        date: NaiveDate,
    ) -> HubResult<AvailabilityStatus> {
        let record = self
            .store
            .get::<Availability>(&Availability::key(user_id, appointment_id, date))
            .await?;
        Ok(AvailabilityStatus::from(record.as_ref()))
    }

    /// Every user who is not disabled, with their response for one occurrence.
    pub async fn availability_for(
        &self,
        appointment_id: &str,
        date: NaiveDate,
    ) -> HubResult<Vec<(User, AvailabilityStatus)>> {
        let appointment = self.get_appointment(appointment_id).await?;
        let records: Vec<Availability> = self
            .store
            .find(|a: &Availability| a.appointment_id == appointment.id && a.date == date)
            .await?;

        Ok(self
            .list_users()
            .await?
            .into_iter()
            .filter(|u| u.status != UserStatus::Disabled)
            .map(|u| {
                let status =
                    AvailabilityStatus::from(records.iter().find(|r| r.user_id == u.id));
                (u, status)
            })
            .collect())
    }

    // SCHEDULES:

    pub async fn schedule(&self, range: &DateRange) -> HubResult<Vec<Occurrence>> {
        let appointments = self.store.list::<Appointment>().await?;
        Ok(schedule::expand(&appointments, range))
    }

    /// Occurrences a user is designated to, or shares through a privilege group.
    pub async fn schedule_for_user(
        &self,
        user_id: &str,
        range: &DateRange,
    ) -> HubResult<Vec<Occurrence>> {
        let user = self.get_user(user_id).await?;

        Ok(self
            .schedule(range)
            .await?
            .into_iter()
            .filter(|occ| {
                let appt = &occ.appointment;
                appt.designations.contains(&user.id)
                    || appt.privilege_group.as_ref().is_some_and(|g| user.holds(g))
            })
            .collect())
    }

    pub async fn report(&self, range: DateRange) -> HubResult<ScheduleReport> {
        let appointments = self.store.list::<Appointment>().await?;
        let users = self.store.list::<User>().await?;
        let availability = self
            .store
            .find(|a: &Availability| range.contains(a.date))
            .await?;

        Ok(ScheduleReport::build(
            &appointments,
            &users,
            &availability,
            range,
        ))
    }
}

/// The base record followed by each modified occurrence as it takes effect.
fn effective_records(appointment: &Appointment) -> impl Iterator<Item = Appointment> + '_ {
    let modified = appointment
        .exceptions
        .iter()
        .filter_map(|exception| match &exception.action {
            ExceptionAction::Modified { modified_data } => {
                let mut record = modified_data.apply(appointment);
                record.date = exception.date;
                Some(record)
            }
            ExceptionAction::Cancelled => None,
        });

    std::iter::once(appointment.clone()).chain(modified)
}

fn occurrence_not_found(appointment: &Appointment, date: NaiveDate) -> HubError {
    HubError::not_found("Occurrence", format!("{} on {}", appointment.title, date))
}

/// Reference and cap checks for designations, base and per-date.
struct AssignmentRules {
    users: Vec<User>,
    privileges: Vec<Privilege>,
    event_types: Vec<EventType>,
    default_max: usize,
}

impl AssignmentRules {
    fn max_for(&self, title: &str) -> usize {
        event_type::for_title(&self.event_types, title)
            .map_or(self.default_max, |t| t.max_designations)
    }

    fn normalize(&self, appointment: &mut Appointment) {
        appointment.designations = designation::normalize(&appointment.designations);

        for exception in &mut appointment.exceptions {
            if let ExceptionAction::Modified { modified_data } = &mut exception.action {
                if let Some(ids) = modified_data.designations.as_mut() {
                    let normalized = designation::normalize(ids);
                    *ids = normalized;
                }
            }
        }
    }

    fn check(&self, appointment: &Appointment) -> HubResult<()> {
        self.check_effective(appointment)?;

        for exception in &appointment.exceptions {
            if let ExceptionAction::Modified { modified_data } = &exception.action {
                self.check_effective(&modified_data.apply(appointment))?;
            }
        }
        Ok(())
    }

    fn check_effective(&self, appointment: &Appointment) -> HubResult<()> {
        designation::check_cap(
            &appointment.designations,
            self.max_for(&appointment.title),
        )?;

        if let Some(missing) = appointment
            .designations
            .iter()
            .find(|id| !self.users.iter().any(|u| &u.id == *id))
        {
            return Err(HubError::not_found("User", missing.as_str()));
        }

        if let Some(group) = &appointment.privilege_group {
            if !self.privileges.iter().any(|p| &p.id == group) {
                return Err(HubError::not_found("Privilege", group.as_str()));
            }
        }
        Ok(())
    }
}
