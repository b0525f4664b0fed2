//! Argument parsing shared by commands.

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveTime};
use grdlhub_core::date_range::parse_date;
use grdlhub_core::serde_time::parse_hhmm;
use grdlhub_core::{Appointment, Hub};

pub fn date(input: &str) -> Result<NaiveDate> {
    Ok(parse_date(input)?)
}

pub fn time(input: &str) -> Result<NaiveTime> {
    parse_hhmm(input).ok_or_else(|| anyhow!("Invalid time '{}'. Expected HH:MM", input))
}

/// Parse "45m", "1h30m", "2h" into whole minutes.
pub fn duration_minutes(input: &str) -> Result<u32> {
    let duration = humantime::parse_duration(input.trim())
        .with_context(|| format!("Invalid duration '{}'. Try 45m or 1h30m", input))?;

    let minutes = duration.as_secs() / 60;
    if minutes == 0 {
        anyhow::bail!("Duration '{}' is shorter than a minute", input);
    }
    u32::try_from(minutes).with_context(|| format!("Duration '{}' is too long", input))
}

/// Resolve user emails to user ids.
pub async fn user_ids(hub: &Hub, emails: &[String]) -> Result<Vec<String>> {
    let mut ids = Vec::with_capacity(emails.len());
    for email in emails {
        ids.push(hub.user_by_email(email).await?.id);
    }
    Ok(ids)
}

pub async fn appointment(hub: &Hub, id_or_prefix: &str) -> Result<Appointment> {
    Ok(hub.find_appointment(id_or_prefix).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_minutes() {
        assert_eq!(duration_minutes("45m").unwrap(), 45);
        assert_eq!(duration_minutes("1h 30m").unwrap(), 90);
        assert_eq!(duration_minutes("2h").unwrap(), 120);
        assert!(duration_minutes("30s").is_err());
        assert!(duration_minutes("soon").is_err());
    }

    #[test]
    fn test_time() {
        assert_eq!(time("19:00").unwrap(), NaiveTime::from_hms_opt(19, 0, 0).unwrap());
        assert!(time("7pm").is_err());
    }
}
