use anyhow::Result;
use chrono::NaiveDate;
use grdlhub_core::{DateRange, Hub};

use crate::render::Render;

pub async fn run(
    hub: &Hub,
    from: Option<&str>,
    to: Option<&str>,
    today: NaiveDate,
) -> Result<()> {
    let range = DateRange::from_args(from, to, today)?;
    let report = hub.report(range).await?;

    println!("{}", report.render());
    Ok(())
}
