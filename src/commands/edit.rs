use anyhow::{Result, bail};
use grdlhub_core::{AppointmentPatch, EditScope, Hub};
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::parse;

pub struct EditArgs {
    pub on: Option<String>,
    pub all: bool,
    pub title: Option<String>,
    pub time: Option<String>,
    pub place: Option<String>,
    pub duration: Option<String>,
    pub designate: Vec<String>,
    pub clear_designations: bool,
    pub group: Option<String>,
    pub if_revision: Option<u64>,
}

pub async fn edit(hub: &Hub, id: &str, args: EditArgs) -> Result<()> {
    let appt = parse::appointment(hub, id).await?;

    let scope = match (&args.on, args.all) {
        (Some(date), _) => EditScope::ThisOccurrence(parse::date(date)?),
        (None, true) => EditScope::AllOccurrences,
        (None, false) if appt.is_recurring() => bail!(
            "'{}' repeats. Use --on <date> for one occurrence or --all for every occurrence",
            appt.title
        ),
        (None, false) => EditScope::AllOccurrences,
    };

    let designations = if args.clear_designations {
        Some(Vec::new())
    } else if args.designate.is_empty() {
        None
    } else {
        Some(parse::user_ids(hub, &args.designate).await?)
    };

    let privilege_group = match &args.group {
        Some(name) => Some(hub.privilege_by_name(name).await?.id),
        None => None,
    };

    let patch = AppointmentPatch {
        title: args.title,
        time: args.time.as_deref().map(parse::time).transpose()?,
        place: args.place,
        duration_minutes: args
            .duration
            .as_deref()
            .map(parse::duration_minutes)
            .transpose()?,
        designations,
        privilege_group,
    };

    let updated = hub
        .edit_appointment(&appt.id, scope, patch, args.if_revision)
        .await?;

    match scope {
        EditScope::ThisOccurrence(date) if updated.is_recurring() => {
            println!("{} {} on {}", "Changed".green(), updated.title.bold(), date);
        }
        _ => println!("{} {}", "Updated".green(), updated.render()),
    }
    Ok(())
}

pub async fn cancel(hub: &Hub, id: &str, date: &str, if_revision: Option<u64>) -> Result<()> {
    let appt = parse::appointment(hub, id).await?;
    let date = parse::date(date)?;

    let updated = hub.cancel_occurrence(&appt.id, date, if_revision).await?;
    println!("{} {} on {}", "Cancelled".red(), updated.title.bold(), date);
    Ok(())
}

pub async fn restore(hub: &Hub, id: &str, date: &str, if_revision: Option<u64>) -> Result<()> {
    let appt = parse::appointment(hub, id).await?;
    let date = parse::date(date)?;

    let updated = hub.restore_occurrence(&appt.id, date, if_revision).await?;
    println!("{} {} on {}", "Restored".green(), updated.title.bold(), date);
    Ok(())
}

pub async fn end(hub: &Hub, id: &str, cutover: &str, if_revision: Option<u64>) -> Result<()> {
    let appt = parse::appointment(hub, id).await?;
    let cutover = parse::date(cutover)?;

    let updated = hub.end_series(&appt.id, cutover, if_revision).await?;
    println!("{} {}", "Ended".yellow(), updated.render());
    Ok(())
}
