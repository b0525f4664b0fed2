use anyhow::Result;
use grdlhub_core::{Category, EventType, Hub};
use owo_colors::OwoColorize;

use crate::render::Render;

pub async fn add(
    hub: &Hub,
    name: String,
    category: &str,
    max: usize,
    privilege: Option<String>,
) -> Result<()> {
    let category: Category = category.parse()?;

    let mut event_type = EventType::new(name, category, max);
    event_type.required_privilege = privilege;
    let event_type = hub.add_event_type(event_type).await?;

    println!("{} {}", "Added".green(), event_type.render());
    Ok(())
}

pub async fn list(hub: &Hub) -> Result<()> {
    let types = hub.list_event_types().await?;
    if types.is_empty() {
        println!("{}", "No event types yet".dimmed());
        return Ok(());
    }

    for event_type in &types {
        println!("   {}", event_type.render());
    }
    Ok(())
}
