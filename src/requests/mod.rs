//! Rescue request intake: validation, persistence, and the shareable
//! distress message.

pub mod commands;
pub mod share;

pub use commands::{ListRequestsQuery, ShareOutcome};
pub use share::{compose_share_message, ShareInput};
