use anyhow::Result;
use chrono::NaiveDate;
use grdlhub_core::{DateRange, Hub};
use owo_colors::OwoColorize;

use crate::render::{Names, Render, render_occurrence};
use crate::utils::parse;

pub async fn run(
    hub: &Hub,
    from: Option<&str>,
    to: Option<&str>,
    user: Option<&str>,
    today: NaiveDate,
) -> Result<()> {
    let range = DateRange::from_args(from, to, today)?;

    let occurrences = match user {
        Some(email) => {
            let user = hub.user_by_email(email).await?;
            hub.schedule_for_user(&user.id, &range).await?
        }
        None => hub.schedule(&range).await?,
    };

    if occurrences.is_empty() {
        println!(
            "{}",
            format!("Nothing scheduled {} .. {}", range.from, range.to).dimmed()
        );
        return Ok(());
    }

    let names = Names::new(&hub.list_users().await?);
    for occ in &occurrences {
        let line = render_occurrence(occ, &names);
        if occ.date == today {
            println!("{}", line.reversed());
        } else {
            println!("{}", line);
        }
    }
    Ok(())
}

pub async fn eligible(hub: &Hub, id: &str) -> Result<()> {
    let appt = parse::appointment(hub, id).await?;
    let users = hub.eligible_users(&appt.id).await?;

    println!("{}", appt.render());
    if users.is_empty() {
        println!("   {}", "Nobody is eligible".yellow());
        return Ok(());
    }

    for user in &users {
        let marker = if appt.designations.contains(&user.id) {
            "*".cyan().to_string()
        } else {
            " ".to_string()
        };
        println!(" {} {}", marker, user.render());
    }
    Ok(())
}
