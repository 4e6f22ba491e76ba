use chrono::Utc;
use log::info;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::{RequestFilter, RescueRequest, RescueRequestPayload, SortDirection, SortField};
use crate::events::AppEvent;
use crate::App;

use super::share::{compose_share_message, ShareInput};

pub(crate) const REQUEST_SOURCE: &str = "webapp";
const VALIDATION_MESSAGE: &str = "Vui lòng điền họ tên và tình trạng.";

/// Keeps at most the leading 11 digits; everything else is stripped.
fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).take(11).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates and stores a new rescue request. Rejected submissions never
/// touch the store.
pub async fn submit_request(
    app: &App,
    payload: RescueRequestPayload,
) -> Result<RescueRequest, String> {
    let full_name = payload.full_name.trim().to_string();
    let Some(status) = payload.status else {
        return Err(VALIDATION_MESSAGE.to_string());
    };
    if full_name.is_empty() {
        return Err(VALIDATION_MESSAGE.to_string());
    }

    // The form may omit coordinates; fall back to whatever the location
    // reconciler currently holds. Accuracy is whole meters either way.
    let (coords, accuracy, manual_override) = match payload.coords {
        Some(coordinate) => (
            Some(coordinate),
            payload.accuracy.map(f64::round),
            payload.manual_override,
        ),
        None => {
            let snapshot = app.location.snapshot().await;
            let reading = snapshot.state.reading();
            (
                reading.as_ref().map(|r| r.coordinate),
                reading.as_ref().and_then(|r| r.accuracy_m),
                snapshot.manual_override_active,
            )
        }
    };

    let request = RescueRequest {
        id: Uuid::new_v4().to_string(),
        created_at: Utc::now(),
        full_name,
        phone_number: payload.phone_number.as_deref().and_then(normalize_phone),
        status,
        notes: clean_optional(payload.notes),
        address: clean_optional(payload.address),
        latitude: coords.map(|c| c.lat),
        longitude: coords.map(|c| c.lng),
        accuracy: coords.and(accuracy),
        manual_override,
        source: REQUEST_SOURCE.to_string(),
    };

    app.db
        .insert_request(&request)
        .await
        .map_err(|e| e.to_string())?;

    info!("stored rescue request {}", request.id);
    app.events.emit(AppEvent::RequestSaved {
        request: request.clone(),
    });

    Ok(request)
}

/// Raw listing parameters as they arrive from the client. Unknown sort
/// fields and directions fall back to defaults instead of erroring.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListRequestsQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl ListRequestsQuery {
    fn into_filter(self) -> RequestFilter {
        RequestFilter {
            status: clean_optional(self.status).filter(|s| s != "all"),
            search: clean_optional(self.search),
            sort_by: SortField::normalize(self.sort_by.as_deref()),
            sort_dir: SortDirection::normalize(self.sort_dir.as_deref()),
        }
    }
}

pub async fn list_requests(
    app: &App,
    query: ListRequestsQuery,
) -> Result<Vec<RescueRequest>, String> {
    app.db
        .list_requests(query.into_filter())
        .await
        .map_err(|e| e.to_string())
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareOutcome {
    pub request: RescueRequest,
    pub message: String,
}

/// Saves the request, then renders the distress message from the stored
/// record. Nothing is composed if the save fails.
pub async fn save_and_share(
    app: &App,
    payload: RescueRequestPayload,
) -> Result<ShareOutcome, String> {
    let request = submit_request(app, payload).await?;
    let message = compose_share_message(&ShareInput::from(&request));
    Ok(ShareOutcome { request, message })
}

/// Live preview of the distress message while the form is being filled in.
/// Does not validate and does not store anything.
pub async fn preview_share_message(app: &App, payload: RescueRequestPayload) -> String {
    let (coordinate, accuracy_m) = match payload.coords {
        Some(coordinate) => (Some(coordinate), payload.accuracy.map(f64::round)),
        None => {
            let snapshot = app.location.snapshot().await;
            let reading = snapshot.state.reading();
            (
                reading.as_ref().map(|r| r.coordinate),
                reading.as_ref().and_then(|r| r.accuracy_m),
            )
        }
    };

    compose_share_message(&ShareInput {
        full_name: payload.full_name,
        phone_number: clean_optional(payload.phone_number),
        status: payload.status,
        address: payload.address,
        notes: payload.notes,
        coordinate,
        accuracy_m,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use uuid::Uuid;

    use super::*;
    use crate::db::models::RequestStatus;
    use crate::location::Coordinate;

    fn temp_data_dir() -> PathBuf {
        std::env::temp_dir().join(format!("flood-rescue-test-{}", Uuid::new_v4()))
    }

    async fn test_app() -> App {
        App::new(temp_data_dir()).expect("app")
    }

    fn payload(full_name: &str, status: Option<RequestStatus>) -> RescueRequestPayload {
        RescueRequestPayload {
            full_name: full_name.to_string(),
            status,
            ..RescueRequestPayload::default()
        }
    }

    #[tokio::test]
    async fn submission_without_name_or_status_is_rejected_before_storing() {
        let app = test_app().await;

        let missing_status = submit_request(&app, payload("Nguyễn Văn An", None)).await;
        assert_eq!(missing_status.unwrap_err(), VALIDATION_MESSAGE);

        let blank_name =
            submit_request(&app, payload("   ", Some(RequestStatus::Emergency))).await;
        assert_eq!(blank_name.unwrap_err(), VALIDATION_MESSAGE);

        let stored = list_requests(&app, ListRequestsQuery::default())
            .await
            .expect("list");
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn minimal_valid_submission_is_stored() {
        let app = test_app().await;

        let request = submit_request(&app, payload("Nguyễn Văn An", Some(RequestStatus::Emergency)))
            .await
            .expect("submit");

        assert_eq!(request.status, RequestStatus::Emergency);
        assert_eq!(request.phone_number, None);
        assert_eq!(request.coordinate(), None);
        assert_eq!(request.source, REQUEST_SOURCE);

        let stored = list_requests(&app, ListRequestsQuery::default())
            .await
            .expect("list");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, request.id);
    }

    #[tokio::test]
    async fn phone_numbers_are_normalized_to_leading_digits() {
        let app = test_app().await;

        let mut input = payload("Trần Thị Bình", Some(RequestStatus::NeedsHelpSoon));
        input.phone_number = Some("+84 (09) 12-345-678 ext 99".to_string());

        let request = submit_request(&app, input).await.expect("submit");
        assert_eq!(request.phone_number.as_deref(), Some("84091234567"));
    }

    #[tokio::test]
    async fn coordinates_fall_back_to_the_location_reconciler() {
        let app = test_app().await;
        app.location
            .set_manual(Coordinate { lat: 16.06, lng: 108.21 })
            .await;

        let request = submit_request(&app, payload("Lê Văn Cường", Some(RequestStatus::Emergency)))
            .await
            .expect("submit");

        assert_eq!(
            request.coordinate().map(|c| (c.lat, c.lng)),
            Some((16.06, 108.21))
        );
        assert!(request.manual_override);
    }

    #[tokio::test]
    async fn save_and_share_composes_from_the_stored_record() {
        let app = test_app().await;

        let mut input = payload("Phạm Thị Dung", Some(RequestStatus::TemporarilySafe));
        input.phone_number = Some("0912345678".to_string());
        input.coords = Some(Coordinate { lat: 16.047079, lng: 108.20623 });
        input.accuracy = Some(12.6);

        let outcome = save_and_share(&app, input).await.expect("share");
        assert!(outcome.message.starts_with("Tôi là Phạm Thị Dung."));
        assert!(outcome.message.contains("SĐT: 0912345678."));
        assert!(outcome.message.contains("Tình trạng: an toàn tạm thời."));
        // Accuracy arrives fractional but the message shows whole meters.
        assert!(outcome.message.contains("Toạ độ: 16.04708, 108.20623 (±13m)."));
        assert_eq!(outcome.request.accuracy, Some(13.0));
        assert_eq!(outcome.request.status, RequestStatus::TemporarilySafe);
    }

    #[test]
    fn list_query_normalizes_all_and_unknown_sorts() {
        let query = ListRequestsQuery {
            status: Some("all".to_string()),
            search: Some("  ".to_string()),
            sort_by: Some("nonsense".to_string()),
            sort_dir: Some("DESCENDING".to_string()),
        };
        let filter = query.into_filter();
        assert_eq!(filter.status, None);
        assert_eq!(filter.search, None);
        assert_eq!(filter.sort_by, SortField::CreatedAt);
        assert_eq!(filter.sort_dir, SortDirection::Desc);
    }
}
