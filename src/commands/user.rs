use anyhow::Result;
use grdlhub_core::{Hub, Role, UserStatus};
use owo_colors::OwoColorize;

use crate::render::Render;

pub async fn add(hub: &Hub, name: &str, email: &str, admin: bool) -> Result<()> {
    let role = if admin { Role::Admin } else { Role::User };
    let user = hub.add_user(name, email, role).await?;

    println!("{} {}", "Added".green(), user.render());
    Ok(())
}

pub async fn list(hub: &Hub) -> Result<()> {
    let users = hub.list_users().await?;
    if users.is_empty() {
        println!("{}", "No users yet".dimmed());
        return Ok(());
    }

    let privileges = hub.list_privileges().await?;
    for user in &users {
        println!("   {}", user.render());

        let held: Vec<&str> = privileges
            .iter()
            .filter(|p| user.holds(&p.id))
            .map(|p| p.name.as_str())
            .collect();
        if !held.is_empty() {
            println!("      {}", held.join(", ").dimmed());
        }
    }
    Ok(())
}

pub async fn grant(hub: &Hub, email: &str, privilege: &str) -> Result<()> {
    let user = hub.grant_privilege(email, privilege).await?;
    println!("{} {} to {}", "Granted".green(), privilege, user.name.bold());
    Ok(())
}

pub async fn revoke(hub: &Hub, email: &str, privilege: &str) -> Result<()> {
    let user = hub.revoke_privilege(email, privilege).await?;
    println!("{} {} from {}", "Revoked".yellow(), privilege, user.name.bold());
    Ok(())
}

pub async fn set_status(hub: &Hub, email: &str, status: &str) -> Result<()> {
    let status: UserStatus = status.parse()?;
    let user = hub.set_user_status(email, status).await?;
    println!("{}", user.render());
    Ok(())
}
