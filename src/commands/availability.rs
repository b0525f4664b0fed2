use anyhow::Result;
use grdlhub_core::Hub;
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::parse;

pub async fn set(hub: &Hub, id: &str, date: &str, email: &str, available: bool) -> Result<()> {
    let appt = parse::appointment(hub, id).await?;
    let date = parse::date(date)?;
    let user = hub.user_by_email(email).await?;

    let record = hub
        .set_availability(&user.id, &appt.id, date, available)
        .await?;

    println!(
        "{} for {} on {}: {}",
        user.name.bold(),
        appt.title,
        date,
        record.status().render()
    );
    Ok(())
}

pub async fn show(hub: &Hub, id: &str, date: &str) -> Result<()> {
    let appt = parse::appointment(hub, id).await?;
    let date = parse::date(date)?;

    let responses = hub.availability_for(&appt.id, date).await?;

    println!("{} {}", appt.title.bold(), date);
    if responses.is_empty() {
        println!("   {}", "No users".dimmed());
        return Ok(());
    }

    for (user, status) in &responses {
        println!("   {:<24} {}", user.name, status.render());
    }
    Ok(())
}
