// Error handling utilities for consistent error messages and exit codes

use std::process;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing resources, rejected moves, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Minimal email check: something on both sides of an '@'
pub fn validate_email(email: &str) -> Result<(), String> {
    match email.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(format!("Invalid email: '{}'. Email must contain '@'.", email)),
    }
}

/// Validate an interest value (finite, non-negative)
pub fn validate_interest_value(value: f64) -> Result<f64, String> {
    if !value.is_finite() || value < 0.0 {
        Err(format!("Invalid value: {}. Value must be a non-negative number.", value))
    } else {
        Ok(value)
    }
}

/// Validate a stage color tag (color name or "#rrggbb")
pub fn validate_color(color: &str) -> Result<(), String> {
    if crate::cli::output::is_valid_color(color) {
        Ok(())
    } else {
        Err(format!(
            "Invalid color: '{}'. Use a color name (e.g. blue, bright_green) or #rrggbb.",
            color
        ))
    }
}
