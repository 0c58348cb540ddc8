//! Input validation for agreement form submissions.
//!
//! Every violation is collected into a [`ValidationErrors`] accumulator so
//! the form can surface all problems at once instead of one per round-trip.

use std::fmt;

/// Validation error with a descriptive, user-facing message.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// Human-readable error message
    pub message: String,
    /// Suggestion for how to fix the error
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Create error for an empty required field.
    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{label} must not be empty"))
            .with_suggestion(format!("Fill in the {} field", label.to_lowercase()))
    }

    /// Create error for an amount that is not a number.
    pub fn invalid_amount(field: &str, value: &str) -> Self {
        Self::new(field, format!("Amount '{value}' is not a valid number"))
            .with_suggestion("Enter the amount as a number, e.g. 5000.00")
    }

    /// Create error for a zero or negative amount.
    pub fn non_positive_amount(field: &str, value: &str) -> Self {
        Self::new(field, format!("Amount '{value}' must be greater than zero"))
            .with_suggestion("Enter an amount above 0.00")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {suggestion}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors with formatted output.
#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Formatted multi-line message suitable for an inline form response.
    pub fn to_message(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }

        let mut parts = vec![format!(
            "Validation failed: {} error(s) found",
            self.errors.len()
        )];
        for (i, error) in self.errors.iter().enumerate() {
            parts.push(format!("{}. {}", i + 1, error));
        }
        parts.join("\n")
    }

    /// Convert to Result - Ok if no errors, Err with formatted message
    /// otherwise.
    pub fn into_result(self) -> Result<(), String> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.to_message())
        }
    }
}

// ============================================================================
// Validation functions
// ============================================================================

/// Validate that a string is not empty after trimming.
pub fn validate_required(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    }
}

/// Validate a currency-formatted amount and return the parsed value.
///
/// Accepts a leading `$` and thousands separators ("5000.00", "$5,000.00").
/// Pushes an error and returns `None` for empty, non-numeric, non-finite or
/// non-positive values.
pub fn validate_amount(value: &str, field: &str, errors: &mut ValidationErrors) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(ValidationError::empty_field(field, "Agreement Amount"));
        return None;
    }

    match parse_amount(trimmed) {
        Some(amount) if amount > 0.0 => Some(amount),
        Some(_) => {
            errors.add(ValidationError::non_positive_amount(field, trimmed));
            None
        }
        None => {
            errors.add(ValidationError::invalid_amount(field, trimmed));
            None
        }
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '$' | ',')).collect();
    let amount: f64 = cleaned.trim().parse().ok()?;
    amount.is_finite().then_some(amount)
}
