use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::error::ApiError;

pub const MAX_NAME_LENGTH: usize = 200;

/// Collects per-field problems and turns them into one validation error
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, problem: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| problem.into());
    }

    /// Required, non-blank, at most [`MAX_NAME_LENGTH`] characters
    pub fn name(&mut self, field: &str, value: &str) {
        if let Err(problem) = validate_name(value) {
            self.add(field, problem);
        }
    }

    pub fn optional_name(&mut self, field: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.name(field, value);
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if let Err(problem) = validate_email_format(value) {
            self.add(field, problem);
        }
    }

    pub fn optional_email(&mut self, field: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.email(field, value);
        }
    }

    pub fn positive(&mut self, field: &str, value: Decimal) {
        if value <= Decimal::ZERO {
            self.add(field, "Must be greater than zero");
        }
    }

    pub fn optional_positive(&mut self, field: &str, value: Option<Decimal>) {
        if let Some(value) = value {
            self.positive(field, value);
        }
    }

    pub fn date_order(&mut self, start: Option<NaiveDate>, end_field: &str, end: Option<NaiveDate>) {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                self.add(end_field, "Cannot be before the start date");
            }
        }
    }

    pub fn currency(&mut self, field: &str, value: &str) {
        if value.len() != 3 || !value.chars().all(|c| c.is_ascii_uppercase()) {
            self.add(field, "Must be a three-letter ISO currency code");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Validation failed", Some(self.0)))
        }
    }
}

pub fn validate_name(value: &str) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("Cannot be empty".to_string());
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(format!("Must be at most {} characters", MAX_NAME_LENGTH));
    }
    Ok(())
}

/// Basic email validation for contact and invitation addresses.
pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err("Invalid email format".to_string());
    }
    if email.chars().any(char::is_whitespace) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}
