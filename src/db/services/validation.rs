/// Length limit shared by every free-text column.
pub const MAX_FIELD_LENGTH: usize = 255;

/// Trims `value` and checks it is non-blank and within [`MAX_FIELD_LENGTH`].
/// Returns the trimmed text, or a message naming `field`.
pub fn required_text(field: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("The {field} field may not be blank."));
    }
    check_length(field, trimmed)?;
    Ok(trimmed.to_string())
}

pub fn check_length(field: &str, value: &str) -> Result<(), String> {
    if value.chars().count() > MAX_FIELD_LENGTH {
        return Err(format!(
            "The {field} field may not be longer than {MAX_FIELD_LENGTH} characters."
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_trims() {
        assert_eq!(required_text("name", "  Vegan ").unwrap(), "Vegan");
    }

    #[test]
    fn test_required_text_rejects_blank() {
        assert_eq!(
            required_text("name", "   ").unwrap_err(),
            "The name field may not be blank."
        );
    }

    #[test]
    fn test_length_limit_counts_characters() {
        let at_limit = "é".repeat(MAX_FIELD_LENGTH);
        assert!(check_length("name", &at_limit).is_ok());
        assert!(check_length("name", &format!("{at_limit}x")).is_err());
    }
}
