//! Common validation utilities.

use validator::ValidationError;

/// Validates that a fuel level is a percentage (0 to 100).
pub fn validate_fuel_level(level: f64) -> Result<(), ValidationError> {
    if (0.0..=100.0).contains(&level) {
        Ok(())
    } else {
        let mut err = ValidationError::new("fuel_range");
        err.message = Some("Fuel level must be between 0 and 100".into());
        Err(err)
    }
}

/// Validates that speed is non-negative.
pub fn validate_speed(speed: f64) -> Result<(), ValidationError> {
    if speed >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("speed_range");
        err.message = Some("Speed must be non-negative".into());
        Err(err)
    }
}

/// Validates that a monetary or volume amount is non-negative.
pub fn validate_amount(amount: f64) -> Result<(), ValidationError> {
    if amount >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("amount_range");
        err.message = Some("Amount must be non-negative".into());
        Err(err)
    }
}

/// Validates that a notification tag is non-blank and reasonably short.
pub fn validate_tag(tag: &str) -> Result<(), ValidationError> {
    if tag.trim().is_empty() || tag.len() > 128 {
        let mut err = ValidationError::new("tag_format");
        err.message = Some("Tag must be between 1 and 128 characters".into());
        Err(err)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_fuel_level() {
        assert!(validate_fuel_level(0.0).is_ok());
        assert!(validate_fuel_level(100.0).is_ok());
        assert!(validate_fuel_level(-0.1).is_err());
        assert!(validate_fuel_level(100.1).is_err());
    }

    #[test]
    fn test_validate_speed() {
        assert!(validate_speed(0.0).is_ok());
        assert!(validate_speed(88.0).is_ok());
        assert!(validate_speed(-1.0).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(0.0).is_ok());
        assert!(validate_amount(-5.0).is_err());
    }

    #[test]
    fn test_validate_tag() {
        assert!(validate_tag("fuel-request").is_ok());
        assert!(validate_tag("   ").is_err());
        assert!(validate_tag(&"x".repeat(129)).is_err());
    }
}
