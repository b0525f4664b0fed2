//! End-to-end scheduling scenarios through the hub and its JSON store.

use chrono::{NaiveDate, NaiveTime};
use grdlhub_core::date_range::DateRange;
use grdlhub_core::hub::{EditScope, Hub, HubSettings};
use grdlhub_core::recurrence::occurs_on;
use grdlhub_core::store::JsonStore;
use grdlhub_core::{Appointment, AppointmentPatch, Category, EventType, RepeatPattern, Role};
use tempfile::TempDir;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn monday_meeting() -> Appointment {
    let mut appt = Appointment::new("Midweek Meeting", Category::Event, date("2025-01-06"));
    appt.time = NaiveTime::from_hms_opt(18, 30, 0);
    appt.repeat_pattern = Some(RepeatPattern::Weekly);
    appt
}

async fn open_hub() -> (Hub, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::open(dir.path()).await.unwrap();
    let hub = Hub::open(store, HubSettings::default()).await.unwrap();
    (hub, dir)
}

fn january() -> DateRange {
    DateRange::month_of(date("2025-01-01"))
}

#[test]
fn test_weekly_occurrence_and_end_date() {
    let appt = monday_meeting();
    assert!(occurs_on(&appt, date("2025-01-13")));
    assert!(!occurs_on(&appt, date("2025-01-14")));

    let mut ended = monday_meeting();
    ended.end_date = Some(date("2025-01-10"));
    assert!(!occurs_on(&ended, date("2025-01-13")));
    assert!(occurs_on(&ended, date("2025-01-06")));
}

#[tokio::test]
async fn test_cancelled_occurrence_left_out_of_schedule() {
    let (hub, _dir) = open_hub().await;
    let appt = hub.create_appointment(monday_meeting()).await.unwrap();

    hub.cancel_occurrence(&appt.id, date("2025-01-13"), None)
        .await
        .unwrap();

    let dates: Vec<_> = hub
        .schedule(&january())
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.date)
        .collect();

    assert!(!dates.contains(&date("2025-01-13")));
    assert!(dates.contains(&date("2025-01-06")));
    assert!(dates.contains(&date("2025-01-20")));
}

#[tokio::test]
async fn test_modified_occurrence_shows_new_time_only_that_day() {
    let (hub, _dir) = open_hub().await;
    let appt = hub.create_appointment(monday_meeting()).await.unwrap();

    hub.edit_appointment(
        &appt.id,
        EditScope::ThisOccurrence(date("2025-01-13")),
        AppointmentPatch {
            time: NaiveTime::from_hms_opt(19, 0, 0),
            ..Default::default()
        },
        None,
    )
    .await
    .unwrap();

    let schedule = hub.schedule(&january()).await.unwrap();
    let time_on = |d: &str| {
        schedule
            .iter()
            .find(|o| o.date == date(d))
            .and_then(|o| o.appointment.time)
    };

    assert_eq!(time_on("2025-01-13"), NaiveTime::from_hms_opt(19, 0, 0));
    assert_eq!(time_on("2025-01-06"), NaiveTime::from_hms_opt(18, 30, 0));
    assert_eq!(time_on("2025-01-20"), NaiveTime::from_hms_opt(18, 30, 0));
}

#[tokio::test]
async fn test_field_service_eligibility_keeps_previous_designee() {
    let (hub, _dir) = open_hub().await;

    hub.add_privilege("Field Service").await.unwrap();
    let u1 = hub
        .add_user("Anna", "anna@example.com", Role::User)
        .await
        .unwrap();
    let u2 = hub
        .add_user("Ben", "ben@example.com", Role::User)
        .await
        .unwrap();
    hub.grant_privilege(&u1.email, "Field Service").await.unwrap();

    let mut event_type = EventType::new("Field Service Meeting", Category::Event, 3);
    event_type.required_privilege = Some("Field Service".into());
    hub.add_event_type(event_type).await.unwrap();

    let mut appt = Appointment::new("Field Service Meeting", Category::Event, date("2025-01-11"));
    appt.time = NaiveTime::from_hms_opt(9, 30, 0);
    let appt = hub.create_appointment(appt).await.unwrap();

    let eligible: Vec<String> = hub
        .eligible_users(&appt.id)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(eligible, vec![u1.id.clone()]);

    hub.edit_appointment(
        &appt.id,
        EditScope::AllOccurrences,
        AppointmentPatch {
            designations: Some(vec![u2.id.clone()]),
            ..Default::default()
        },
        None,
    )
    .await
    .unwrap();

    let eligible: Vec<String> = hub
        .eligible_users(&appt.id)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(eligible, vec![u1.id, u2.id]);
}

#[tokio::test]
async fn test_documents_survive_reopening_the_store() {
    let (hub, dir) = open_hub().await;
    let appt = hub.create_appointment(monday_meeting()).await.unwrap();
    hub.cancel_occurrence(&appt.id, date("2025-01-13"), None)
        .await
        .unwrap();
    drop(hub);

    let store = JsonStore::open(dir.path()).await.unwrap();
    let reopened = Hub::open(store, HubSettings::default()).await.unwrap();

    let loaded = reopened.get_appointment(&appt.id).await.unwrap();
    assert_eq!(loaded.exceptions.len(), 1);
    assert_eq!(loaded.revision, 2);
    assert_eq!(reopened.subscribe().borrow().len(), 1);
}

#[tokio::test]
async fn test_unsorted_stored_exceptions_still_resolve() {
    let dir = tempfile::tempdir().unwrap();
    JsonStore::open(dir.path()).await.unwrap();
    std::fs::write(
        dir.path().join("appointments").join("a1.json"),
        r#"{
            "id": "a1",
            "title": "Midweek Meeting",
            "category": "event",
            "date": "2025-01-06",
            "time": "18:30",
            "repeatPattern": "weekly",
            "exceptions": [
                {"date": "2025-01-27", "action": "cancelled"},
                {"date": "2025-01-13", "action": "cancelled"},
                {"date": "2025-01-20", "action": "cancelled"}
            ]
        }"#,
    )
    .unwrap();

    let store = JsonStore::open(dir.path()).await.unwrap();
    let hub = Hub::open(store, HubSettings::default()).await.unwrap();

    let dates: Vec<_> = hub
        .schedule(&january())
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.date)
        .collect();
    assert_eq!(dates, vec![date("2025-01-06")]);

    let updated = hub
        .restore_occurrence("a1", date("2025-01-20"), None)
        .await
        .unwrap();
    assert_eq!(updated.exceptions.len(), 2);
    assert!(occurs_on(&updated, date("2025-01-20")));
}
