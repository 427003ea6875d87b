//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted player name.
const MAX_NAME_LEN: usize = 24;
/// Longest accepted custom card text.
const MAX_CARD_TEXT_LEN: usize = 200;

/// Validates a player display name: 1 to 24 characters after trimming, no
/// control characters.
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("player_name_empty");
        err.message = Some("Player name must not be empty".into());
        return Err(err);
    }

    if trimmed.chars().count() > MAX_NAME_LEN {
        let mut err = ValidationError::new("player_name_length");
        err.message =
            Some(format!("Player name must be at most {MAX_NAME_LEN} characters").into());
        return Err(err);
    }

    if trimmed.chars().any(char::is_control) {
        let mut err = ValidationError::new("player_name_format");
        err.message = Some("Player name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates custom card text: 1 to 200 characters after trimming.
pub fn validate_card_text(text: &str) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("card_text_empty");
        err.message = Some("Card text must not be empty".into());
        return Err(err);
    }

    if trimmed.chars().count() > MAX_CARD_TEXT_LEN {
        let mut err = ValidationError::new("card_text_length");
        err.message =
            Some(format!("Card text must be at most {MAX_CARD_TEXT_LEN} characters").into());
        return Err(err);
    }

    Ok(())
}

/// Validates a prompt card's pick count (1 to 3).
pub fn validate_pick(pick: u8) -> Result<(), ValidationError> {
    if !(1..=3).contains(&pick) {
        let mut err = ValidationError::new("pick_range");
        err.message = Some(format!("Pick must be between 1 and 3 (got {pick})").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_player_name_valid() {
        assert!(validate_player_name("Alice").is_ok());
        assert!(validate_player_name("  Bob  ").is_ok());
        assert!(validate_player_name("Player One").is_ok());
    }

    #[test]
    fn test_validate_player_name_invalid() {
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name("   ").is_err());
        assert!(validate_player_name(&"x".repeat(25)).is_err());
        assert!(validate_player_name("bad\nname").is_err());
    }

    #[test]
    fn test_validate_card_text() {
        assert!(validate_card_text("a perfectly normal card").is_ok());
        assert!(validate_card_text("").is_err());
        assert!(validate_card_text("  ").is_err());
        assert!(validate_card_text(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_pick() {
        assert!(validate_pick(1).is_ok());
        assert!(validate_pick(3).is_ok());
        assert!(validate_pick(0).is_err());
        assert!(validate_pick(4).is_err());
    }
}
