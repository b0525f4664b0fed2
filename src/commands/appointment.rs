use anyhow::Result;
use chrono::NaiveDate;
use dialoguer::Confirm;
use grdlhub_core::exception::resolve;
use grdlhub_core::recurrence::next_occurrence;
use grdlhub_core::schedule::occurrence_on;
use grdlhub_core::{Appointment, Category, ExceptionAction, Hub, RepeatPattern};
use owo_colors::OwoColorize;

use crate::render::{Names, Render, render_occurrence};
use crate::utils::parse;

pub struct NewArgs {
    pub title: String,
    pub date: String,
    pub time: Option<String>,
    pub place: Option<String>,
    pub duration: Option<String>,
    pub repeat: Option<String>,
    pub until: Option<String>,
    pub category: String,
    pub designate: Vec<String>,
    pub group: Option<String>,
}

pub async fn new(hub: &Hub, args: NewArgs) -> Result<()> {
    let category: Category = args.category.parse()?;
    let mut appt = Appointment::new(args.title, category, parse::date(&args.date)?);

    appt.time = args.time.as_deref().map(parse::time).transpose()?;
    appt.place = args.place;
    appt.duration_minutes = args
        .duration
        .as_deref()
        .map(parse::duration_minutes)
        .transpose()?;
    appt.repeat_pattern = args
        .repeat
        .as_deref()
        .map(str::parse::<RepeatPattern>)
        .transpose()?;
    appt.end_date = args.until.as_deref().map(parse::date).transpose()?;
    appt.designations = parse::user_ids(hub, &args.designate).await?;
    if let Some(group) = &args.group {
        appt.privilege_group = Some(hub.privilege_by_name(group).await?.id);
    }

    let appt = hub.create_appointment(appt).await?;

    println!("{} {}", "Created".green(), appt.render());
    Ok(())
}

pub async fn list(hub: &Hub) -> Result<()> {
    let appointments = hub.list_appointments().await?;
    if appointments.is_empty() {
        println!("{}", "No appointments yet".dimmed());
        return Ok(());
    }

    for appt in &appointments {
        println!("{}", appt.render());
    }
    Ok(())
}

pub async fn show(hub: &Hub, id: &str, json: bool) -> Result<()> {
    let appt = parse::appointment(hub, id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&appt)?);
        return Ok(());
    }

    let names = Names::new(&hub.list_users().await?);

    println!("{}", appt.render());
    println!("   id: {}", appt.id);
    if let Some(place) = &appt.place {
        println!("   place: {}", place);
    }
    if let Some(minutes) = appt.duration_minutes {
        println!("   duration: {} min", minutes);
    }
    if !appt.designations.is_empty() {
        println!("   designated: {}", names.join(&appt.designations).cyan());
    }
    if let Some(group) = &appt.privilege_group {
        let group = hub
            .list_privileges()
            .await?
            .into_iter()
            .find(|p| &p.id == group)
            .map_or_else(|| group.clone(), |p| p.name);
        println!("   shared with: {}", group);
    }

    for exception in &appt.exceptions {
        match &exception.action {
            ExceptionAction::Cancelled => {
                println!("   {} {}", exception.date, "cancelled".red());
            }
            ExceptionAction::Modified { .. } => {
                if let Some(occ) = occurrence_on(&appt, exception.date) {
                    println!("   {}", render_occurrence(&occ, &names));
                }
            }
        }
    }
    Ok(())
}

/// Print whether (and how) an appointment takes place on `date`.
pub async fn occurs(hub: &Hub, id: &str, date: &str) -> Result<()> {
    let appt = parse::appointment(hub, id).await?;
    let date = parse::date(date)?;

    match occurrence_on(&appt, date) {
        Some(occ) => {
            let names = Names::new(&hub.list_users().await?);
            println!("{}", render_occurrence(&occ, &names));
        }
        None => {
            if resolve(&appt, date).is_cancelled() {
                println!("{} is cancelled on {}", appt.title.bold(), date);
            } else {
                println!("{} does not take place on {}", appt.title.bold(), date);
            }
            if let Some(next) = next_after(&appt, date) {
                println!("   next: {}", next.format("%a %Y-%m-%d"));
            }
        }
    }
    Ok(())
}

fn next_after(appt: &Appointment, date: NaiveDate) -> Option<NaiveDate> {
    next_occurrence(appt, date.succ_opt()?)
}

pub async fn delete(hub: &Hub, id: &str, yes: bool, today: NaiveDate) -> Result<()> {
    let appt = parse::appointment(hub, id).await?;

    if !yes {
        println!("{}", appt.render());
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete '{}'?", appt.title))
            .default(false)
            .interact()?;

        if !confirmed {
            return Ok(());
        }
    }

    hub.delete_appointment(&appt.id, today).await?;
    println!("{} {}", "Deleted".red(), appt.title.bold());
    Ok(())
}
