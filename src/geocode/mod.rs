//! Free-text address lookup against a Nominatim-style endpoint.

mod client;

pub use client::{GeocodeMatch, Geocoder};

use thiserror::Error;

/// User-visible geocoding failures. Display strings are the messages the
/// intake form shows.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeocodeError {
    /// The trimmed query was empty; detected before any network call.
    #[error("Thiếu địa chỉ để tìm kiếm.")]
    EmptyQuery,
    /// The upstream returned zero results. User-correctable, not a fault.
    #[error("Không tìm thấy địa điểm phù hợp.")]
    NoMatch,
    /// The upstream request errored or returned a non-success status.
    /// The detail is logged, not shown.
    #[error("Không thể kết nối dịch vụ bản đồ.")]
    Upstream(String),
}
