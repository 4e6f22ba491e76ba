use crate::db::models::{RequestStatus, RescueRequest};
use crate::location::Coordinate;

/// Shown instead of a message while the form is still too empty to share.
pub const SHARE_PROMPT: &str = "Điền họ tên và số điện thoại để tạo nội dung cầu cứu.";

/// Everything the distress message mentions. Borrowed from the live form
/// or from a stored request.
#[derive(Debug, Clone, Default)]
pub struct ShareInput {
    pub full_name: String,
    pub phone_number: Option<String>,
    pub status: Option<RequestStatus>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub coordinate: Option<Coordinate>,
    pub accuracy_m: Option<f64>,
}

impl From<&RescueRequest> for ShareInput {
    fn from(request: &RescueRequest) -> Self {
        Self {
            full_name: request.full_name.clone(),
            phone_number: request.phone_number.clone(),
            status: Some(request.status),
            address: request.address.clone(),
            notes: request.notes.clone(),
            coordinate: request.coordinate(),
            accuracy_m: request.accuracy,
        }
    }
}

/// Renders the copy-pasteable distress message. Every field degrades to a
/// placeholder line so the message always reads as complete sentences.
pub fn compose_share_message(input: &ShareInput) -> String {
    let name = input.full_name.trim();
    let phone = input
        .phone_number
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    if name.is_empty() && phone.is_none() {
        return SHARE_PROMPT.to_string();
    }

    let phone_line = match phone {
        Some(phone) => format!("SĐT: {phone}."),
        None => "Chưa cung cấp SĐT.".to_string(),
    };

    let status_line = match input.status {
        Some(status) => format!("Tình trạng: {}.", status.as_str()),
        None => "Tình trạng: chưa chọn.".to_string(),
    };

    let address_line = input
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| format!("Địa chỉ báo về: {a}."))
        .unwrap_or_default();

    let coords_line = match input.coordinate {
        Some(coordinate) => {
            let accuracy = match input.accuracy_m {
                Some(accuracy) => accuracy.to_string(),
                None => "?".to_string(),
            };
            format!(
                "Toạ độ: {:.5}, {:.5} (±{}m).",
                coordinate.lat, coordinate.lng, accuracy
            )
        }
        None => "Toạ độ: chưa xác định.".to_string(),
    };

    let notes_line = input
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| format!("Chi tiết: {n}."))
        .unwrap_or_else(|| "Chưa có mô tả thêm.".to_string());

    // Fixed template slots; a missing address leaves a doubled space.
    format!(
        "Tôi là {name}. {phone_line} {status_line} {address_line} {coords_line} {notes_line}"
    )
}
