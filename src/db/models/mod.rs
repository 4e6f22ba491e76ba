pub mod query;
pub mod request;

pub use query::{RequestFilter, SortDirection, SortField};
pub use request::{RequestStatus, RescueRequest, RescueRequestPayload};
