use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::db::models::RequestStatus;

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_request_status(value: &str) -> Result<RequestStatus> {
    RequestStatus::parse(value).ok_or_else(|| anyhow!("unknown request status '{value}'"))
}
