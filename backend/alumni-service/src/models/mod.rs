pub mod chat;
pub mod connection;
pub mod group_chat;
pub mod group_message;
pub mod job_post;
pub mod pagination;
pub mod read_state;
pub mod user;

pub use chat::*;
pub use connection::*;
pub use group_chat::*;
pub use group_message::*;
pub use job_post::*;
pub use pagination::*;
pub use read_state::*;
pub use user::*;

/// Trim `value` and treat blank as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn validate_not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}
