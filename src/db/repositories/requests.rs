use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, types::Value, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_request_status},
    models::{RequestFilter, RescueRequest},
};

const SELECT_COLUMNS: &str = "id, created_at, full_name, phone_number, status, notes, address, \
     latitude, longitude, accuracy, manual_override, source";

fn row_to_request(row: &Row) -> Result<RescueRequest> {
    let created_at: String = row.get("created_at")?;
    let status: String = row.get("status")?;

    Ok(RescueRequest {
        id: row.get("id")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        full_name: row.get("full_name")?,
        phone_number: row.get("phone_number")?,
        status: parse_request_status(&status)?,
        notes: row.get("notes")?,
        address: row.get("address")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        accuracy: row.get("accuracy")?,
        manual_override: row.get("manual_override")?,
        source: row.get("source")?,
    })
}

impl Database {
    /// Create is the only write: stored requests are immutable.
    pub async fn insert_request(&self, request: &RescueRequest) -> Result<()> {
        let record = request.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO rescue_requests
                     (id, created_at, full_name, phone_number, status, notes, address,
                      latitude, longitude, accuracy, manual_override, source)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    record.id,
                    record.created_at.to_rfc3339(),
                    record.full_name,
                    record.phone_number,
                    record.status.as_str(),
                    record.notes,
                    record.address,
                    record.latitude,
                    record.longitude,
                    record.accuracy,
                    record.manual_override,
                    record.source,
                ],
            )
            .context("failed to insert rescue request")?;
            Ok(())
        })
        .await
    }

    /// Filtered, sorted listing. The search term matches case-insensitively
    /// against name, phone, or address; an empty result is not an error.
    pub async fn list_requests(&self, filter: RequestFilter) -> Result<Vec<RescueRequest>> {
        self.execute(move |conn| {
            let mut sql = format!("SELECT {SELECT_COLUMNS} FROM rescue_requests");
            let mut clauses: Vec<&str> = Vec::new();
            let mut bindings: Vec<Value> = Vec::new();

            if let Some(status) = filter.status.as_ref() {
                clauses.push("status = ?");
                bindings.push(Value::Text(status.clone()));
            }

            if let Some(search) = filter.search.as_ref() {
                // unicode_lower is registered on the connection; SQLite's
                // LOWER() would miss uppercase Vietnamese letters.
                clauses.push(
                    "(unicode_lower(full_name) LIKE ? \
                     OR unicode_lower(COALESCE(phone_number, '')) LIKE ? \
                     OR unicode_lower(COALESCE(address, '')) LIKE ?)",
                );
                let pattern = format!("%{}%", search.to_lowercase());
                for _ in 0..3 {
                    bindings.push(Value::Text(pattern.clone()));
                }
            }

            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }

            // Sort column and direction come from whitelisting enums, never
            // from raw input.
            sql.push_str(&format!(
                " ORDER BY {} {}",
                filter.sort_by.column(),
                filter.sort_dir.sql()
            ));

            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bindings))?;
            let mut requests = Vec::new();
            while let Some(row) = rows.next()? {
                requests.push(row_to_request(row)?);
            }

            Ok(requests)
        })
        .await
    }
}
