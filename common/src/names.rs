use thiserror::Error;

use crate::constants::DEFAULT_ROOM;

pub const MAX_DISPLAY_NAME_LENGTH: usize = 16;
pub const MAX_ROOM_CODE_LENGTH: usize = 16;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("Display name must not be empty.")]
    Empty,
    #[error("Display name must be at most {MAX_DISPLAY_NAME_LENGTH} characters long.")]
    TooLong,
    #[error("Display name contains invalid character: {0:?}.")]
    InvalidCharacter(char),
    #[error("Room code must be at most {MAX_ROOM_CODE_LENGTH} characters long.")]
    RoomTooLong,
    #[error("Room code contains invalid character: {0:?}.")]
    RoomInvalidCharacter(char),
}

/// Display names are self-declared and need not be unique, so only their shape is checked.
pub fn sanitize_display_name(input: &str) -> Result<String, NameError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(NameError::Empty);
    }

    if trimmed.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        return Err(NameError::TooLong);
    }

    if let Some(invalid) = trimmed.chars().find(|ch| ch.is_control()) {
        return Err(NameError::InvalidCharacter(invalid));
    }

    Ok(trimmed.to_string())
}

/// Normalizes a room code to lowercase. A blank code selects the default room.
pub fn sanitize_room_code(input: &str) -> Result<String, NameError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Ok(DEFAULT_ROOM.to_string());
    }

    if trimmed.chars().count() > MAX_ROOM_CODE_LENGTH {
        return Err(NameError::RoomTooLong);
    }

    if let Some(invalid) = trimmed
        .chars()
        .find(|ch| !ch.is_ascii_alphanumeric() && *ch != '_' && *ch != '-')
    {
        return Err(NameError::RoomInvalidCharacter(invalid));
    }

    Ok(trimmed.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_rejects_empty_display_names() {
        assert_eq!(sanitize_display_name("   "), Err(NameError::Empty));
    }

    #[test]
    fn sanitize_rejects_display_names_that_are_too_long() {
        let long_name = "abcdefghijklmnopq"; // 17 characters.
        assert_eq!(sanitize_display_name(long_name), Err(NameError::TooLong));
    }

    #[test]
    fn sanitize_rejects_control_characters() {
        assert_eq!(
            sanitize_display_name("bad\u{7}name"),
            Err(NameError::InvalidCharacter('\u{7}'))
        );
    }

    #[test]
    fn sanitize_accepts_spaces_and_unicode() {
        assert_eq!(
            sanitize_display_name("  Zoë the Great "),
            Ok("Zoë the Great".to_string())
        );
    }

    #[test]
    fn blank_room_code_selects_default_room() {
        assert_eq!(sanitize_room_code("  "), Ok(DEFAULT_ROOM.to_string()));
    }

    #[test]
    fn room_codes_are_lowercased() {
        assert_eq!(sanitize_room_code(" Team-A "), Ok("team-a".to_string()));
    }

    #[test]
    fn room_codes_reject_punctuation() {
        assert_eq!(
            sanitize_room_code("room!"),
            Err(NameError::RoomInvalidCharacter('!'))
        );
    }
}
