use serde::{Deserialize, Serialize};

/// Whitelisted sort columns for the listing view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CreatedAt,
    Status,
    FullName,
    PhoneNumber,
    Address,
}

impl SortField {
    /// Unknown or absent values fall back to `created_at`.
    pub fn normalize(value: Option<&str>) -> Self {
        match value {
            Some("status") => SortField::Status,
            Some("full_name") => SortField::FullName,
            Some("phone_number") => SortField::PhoneNumber,
            Some("address") => SortField::Address,
            _ => SortField::CreatedAt,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Status => "status",
            SortField::FullName => "full_name",
            SortField::PhoneNumber => "phone_number",
            SortField::Address => "address",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything other than an explicit `asc` sorts descending.
    pub fn normalize(value: Option<&str>) -> Self {
        if value == Some("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Listing-view query. `status` is kept raw: an unknown value simply matches
/// nothing, and `None` applies no restriction.
#[derive(Debug, Clone)]
pub struct RequestFilter {
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort_by: SortField,
    pub sort_dir: SortDirection,
}

impl Default for RequestFilter {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            sort_by: SortField::CreatedAt,
            sort_dir: SortDirection::Desc,
        }
    }
}
