use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::location::Coordinate;

/// Fixed triage classification. The stored values are the localized labels
/// the intake form presents; there is no separate internal code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestStatus {
    #[serde(rename = "khẩn cấp")]
    Emergency,
    #[serde(rename = "cần hỗ trợ sớm")]
    NeedsHelpSoon,
    #[serde(rename = "an toàn tạm thời")]
    TemporarilySafe,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Emergency => "khẩn cấp",
            RequestStatus::NeedsHelpSoon => "cần hỗ trợ sớm",
            RequestStatus::TemporarilySafe => "an toàn tạm thời",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "khẩn cấp" => Some(RequestStatus::Emergency),
            "cần hỗ trợ sớm" => Some(RequestStatus::NeedsHelpSoon),
            "an toàn tạm thời" => Some(RequestStatus::TemporarilySafe),
            _ => None,
        }
    }
}

/// A stored rescue request. Immutable once created: no update or delete
/// operation exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescueRequest {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
    pub manual_override: bool,
    pub source: String,
}

impl RescueRequest {
    /// Latitude and longitude are written together or not at all.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinate { lat, lng }),
            _ => None,
        }
    }
}

/// Client submission payload; optional fields are omitted rather than null.
/// `status` stays optional so validation (not deserialization) rejects a
/// missing value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RescueRequestPayload {
    pub full_name: String,
    pub phone_number: Option<String>,
    pub status: Option<RequestStatus>,
    pub notes: Option<String>,
    pub address: Option<String>,
    pub coords: Option<Coordinate>,
    pub accuracy: Option<f64>,
    pub manual_override: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_localized_labels() {
        for status in [
            RequestStatus::Emergency,
            RequestStatus::NeedsHelpSoon,
            RequestStatus::TemporarilySafe,
        ] {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RequestStatus::parse("unknown"), None);
    }

    #[test]
    fn payload_deserializes_with_omitted_optionals() {
        let payload: RescueRequestPayload = serde_json::from_str(
            r#"{"fullName":"Nguyễn Văn A","status":"khẩn cấp"}"#,
        )
        .expect("payload");
        assert_eq!(payload.full_name, "Nguyễn Văn A");
        assert_eq!(payload.status, Some(RequestStatus::Emergency));
        assert_eq!(payload.phone_number, None);
        assert_eq!(payload.coords, None);
        assert!(!payload.manual_override);
    }
}
