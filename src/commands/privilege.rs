use anyhow::Result;
use grdlhub_core::Hub;
use owo_colors::OwoColorize;

use crate::render::Render;

pub async fn add(hub: &Hub, name: &str) -> Result<()> {
    let privilege = hub.add_privilege(name).await?;
    println!("{} {}", "Added privilege".green(), privilege.name.bold());
    Ok(())
}

pub async fn list(hub: &Hub) -> Result<()> {
    let privileges = hub.list_privileges().await?;
    if privileges.is_empty() {
        println!("{}", "No privileges yet".dimmed());
        return Ok(());
    }

    for privilege in &privileges {
        println!("   {}", privilege.render());
    }
    Ok(())
}

pub async fn set_active(hub: &Hub, name: &str, active: bool) -> Result<()> {
    let privilege = hub.set_privilege_active(name, active).await?;
    let state = if active { "active" } else { "inactive" };
    println!("{} is now {}", privilege.name.bold(), state);
    Ok(())
}
