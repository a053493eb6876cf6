use thiserror::Error;

pub const MAX_NAME_LEN: usize = 20;

/// Reasons a create/join request is refused. The display text is sent to the
/// client verbatim in the failure acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("Room not found")]
    RoomNotFound,
    #[error("Room is full")]
    RoomFull,
    #[error("Please enter a nickname")]
    MissingName,
    #[error("Nickname cannot exceed {MAX_NAME_LEN} characters")]
    NameTooLong,
}

/// Trims a nickname and checks it is usable.
pub fn validate_name(name: &str) -> Result<&str, JoinError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(JoinError::MissingName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(JoinError::NameTooLong);
    }
    Ok(name)
}
