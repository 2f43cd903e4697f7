//! Validation helpers for outbound command payloads.

use validator::ValidationError;

/// Longest team name the panel will send.
pub const MAX_TEAM_NAME_CHARS: usize = 32;

/// Validates that a team name is non-blank and reasonably short.
///
/// # Examples
///
/// ```ignore
/// validate_team_name("The Beatles") // Ok
/// validate_team_name("   ")         // Err - blank
/// ```
pub fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("team_name_blank");
        err.message = Some("Team name must not be empty".into());
        return Err(err);
    }

    let length = trimmed.chars().count();
    if length > MAX_TEAM_NAME_CHARS {
        let mut err = ValidationError::new("team_name_length");
        err.message = Some(
            format!("Team name must be at most {MAX_TEAM_NAME_CHARS} characters (got {length})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that an identifier (team, user, playlist) is not blank.
pub fn validate_identifier(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        let mut err = ValidationError::new("identifier_blank");
        err.message = Some("Identifier must not be empty".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_team_name_valid() {
        assert!(validate_team_name("Team 1").is_ok());
        assert!(validate_team_name("  Padded  ").is_ok());
        assert!(validate_team_name(&"x".repeat(MAX_TEAM_NAME_CHARS)).is_ok());
    }

    #[test]
    fn test_validate_team_name_invalid() {
        assert!(validate_team_name("").is_err());
        assert!(validate_team_name(" \t ").is_err());
        assert!(validate_team_name(&"x".repeat(MAX_TEAM_NAME_CHARS + 1)).is_err());
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("team_0").is_ok());
        assert!(validate_identifier("").is_err());
    }
}
