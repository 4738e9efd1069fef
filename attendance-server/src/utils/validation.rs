//! Input validation helpers
//!
//! Centralized text length constants, validation functions and the
//! server-side normalization applied to field edits before they are stored.

use std::collections::HashSet;

use rust_decimal::Decimal;
use shared::models::{EmployeeCreate, FieldEdit};

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Employee names, skills, machine lines
pub const MAX_NAME_LEN: usize = 200;

/// Attendance summary, warning text
pub const MAX_NOTE_LEN: usize = 500;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

pub const MIN_PASSWORD_LEN: usize = 6;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")).with_detail("field", field));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate an email address shape (local@domain.tld)
pub fn validate_email(email: &str) -> Result<(), AppError> {
    validate_required_text(email, "email", MAX_EMAIL_LEN)?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && domain.contains('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::validation("Invalid email format").with_detail("field", "email"));
    }
    Ok(())
}

/// Validate a create-employee payload
pub fn validate_create(payload: &EmployeeCreate) -> Result<(), AppError> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_email(&payload.email)?;
    if payload.password.len() < MIN_PASSWORD_LEN || payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be {MIN_PASSWORD_LEN}-{MAX_PASSWORD_LEN} characters"
        ))
        .with_detail("field", "password"));
    }
    Ok(())
}

// ── Field edit normalization ────────────────────────────────────────

/// Normalize a single-field edit into the value that will be stored.
///
/// Strings are trimmed, empty list entries dropped, skills de-duplicated
/// (case-insensitive, first spelling kept) and overtime rounded to 2 dp.
pub fn normalize_edit(edit: FieldEdit) -> Result<FieldEdit, AppError> {
    let normalized = match edit {
        FieldEdit::Name(name) => {
            validate_required_text(&name, "name", MAX_NAME_LEN)?;
            FieldEdit::Name(name.trim().to_string())
        }
        FieldEdit::Attendance(text) => {
            let text = text.trim().to_string();
            check_len(&text, "attendance", MAX_NOTE_LEN)?;
            FieldEdit::Attendance(text)
        }
        FieldEdit::Warnings(warnings) => {
            let warnings = clean_list(warnings);
            for w in &warnings {
                check_len(w, "warnings", MAX_NOTE_LEN)?;
            }
            FieldEdit::Warnings(warnings)
        }
        FieldEdit::Skills(skills) => {
            let mut seen = HashSet::new();
            let skills: Vec<String> = clean_list(skills)
                .into_iter()
                .filter(|s| seen.insert(s.to_lowercase()))
                .collect();
            for s in &skills {
                check_len(s, "skills", MAX_NAME_LEN)?;
            }
            FieldEdit::Skills(skills)
        }
        FieldEdit::OvertimeHours(hours) => {
            if hours < Decimal::ZERO {
                return Err(AppError::validation("overtime_hours must not be negative")
                    .with_detail("field", "overtime_hours"));
            }
            FieldEdit::OvertimeHours(hours.round_dp(2))
        }
        FieldEdit::MachineLine(line) => {
            let line = line.map(|l| l.trim().to_string()).filter(|l| !l.is_empty());
            if let Some(l) = &line {
                check_len(l, "machine_line", MAX_NAME_LEN)?;
            }
            FieldEdit::MachineLine(line)
        }
        other @ (FieldEdit::ClockInStatus(_)
        | FieldEdit::JobSchedule(_)
        | FieldEdit::LeaveDays(_)) => other,
    };
    Ok(normalized)
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn check_len(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}
