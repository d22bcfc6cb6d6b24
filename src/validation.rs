//! Input validation and data-quality diagnostics.
//!
//! Two kinds of findings:
//! - [`ValidationError`]: structural roster problems that make solving
//!   pointless (duplicate names, missing coverage skills).
//! - [`Diagnostic`]: a single input row that was skipped or defaulted.
//!   Diagnostics never stop a run; they are collected so data-quality
//!   issues stay visible.

use std::collections::HashSet;
use std::fmt;

use tracing::warn;

use crate::models::{Skill, StaffMember};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two staff records share an id.
    DuplicateId,
    /// Two staff records share a display name.
    DuplicateName,
    /// A staff record has an empty name.
    EmptyName,
    /// No schedulable member has a required coverage skill.
    MissingSkill,
    /// No schedulable members at all.
    NoSchedulableStaff,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates a staff roster before solving.
///
/// Checks:
/// 1. No duplicate ids
/// 2. No duplicate or empty names (matrix rows key on names)
/// 3. At least one schedulable member
/// 4. Each coverage skill is held by some schedulable member
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_roster(staff: &[StaffMember]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for s in staff {
        if !ids.insert(s.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate staff ID: {}", s.id),
            ));
        }
        if s.name.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyName,
                format!("Staff '{}' has an empty name", s.id),
            ));
        } else if !names.insert(s.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateName,
                format!("Duplicate staff name: {}", s.name),
            ));
        }
    }

    let active: Vec<&StaffMember> = staff.iter().filter(|s| s.is_schedulable()).collect();
    if active.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoSchedulableStaff,
            "Roster has no schedulable staff",
        ));
    } else {
        for skill in Skill::ALL {
            if !active.iter().any(|s| s.has_skill(skill)) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MissingSkill,
                    format!("No schedulable staff with {} skill", skill.label()),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// One skipped or defaulted input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Source table or input name.
    pub source: String,
    /// Zero-based row index within the source.
    pub row: usize,
    /// What was wrong.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.source, self.row, self.message)
    }
}

/// Collected diagnostics for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a skipped row and logs it.
    pub fn push(&mut self, source: impl Into<String>, row: usize, message: impl Into<String>) {
        let entry = Diagnostic {
            source: source.into(),
            row,
            message: message.into(),
        };
        warn!(event = "row_skipped", source = %entry.source, row = entry.row, message = %entry.message);
        self.entries.push(entry);
    }

    /// Appends another collection.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was skipped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries for one source.
    pub fn for_source<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.entries.iter().filter(move |d| d.source == source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_roster() -> Vec<StaffMember> {
        vec![
            StaffMember::new("u1").with_name("Aiko").language_a().veteran(),
            StaffMember::new("u2").with_name("Ben").language_b(),
            StaffMember::admin("root").with_name("Admin"),
        ]
    }

    #[test]
    fn test_valid_roster() {
        assert!(validate_roster(&sample_roster()).is_ok());
    }

    #[test]
    fn test_duplicate_id_and_name() {
        let mut roster = sample_roster();
        roster.push(StaffMember::new("u1").with_name("Aiko"));

        let errors = validate_roster(&roster).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::DuplicateId));
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::DuplicateName));
    }

    #[test]
    fn test_empty_name() {
        let mut roster = sample_roster();
        roster.push(StaffMember::new("u9").with_name("  "));
        let errors = validate_roster(&roster).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::EmptyName);
    }

    #[test]
    fn test_missing_skill_ignores_admins() {
        let roster = vec![
            StaffMember::new("u1").language_a().language_b(),
            StaffMember::admin("root").veteran(),
        ];
        let errors = validate_roster(&roster).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::MissingSkill);
        assert!(errors[0].message.contains("veteran"));
    }

    #[test]
    fn test_no_schedulable_staff() {
        let errors = validate_roster(&[StaffMember::admin("root")]).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::NoSchedulableStaff);
    }

    #[test]
    fn test_diagnostics_collect() {
        let mut diags = Diagnostics::new();
        diags.push("leave_requests", 3, "unparseable date 'x'");
        let mut more = Diagnostics::new();
        more.push("staff", 0, "bad target");
        diags.extend(more);

        assert_eq!(diags.len(), 2);
        assert_eq!(diags.for_source("staff").count(), 1);
        assert_eq!(diags.entries()[0].to_string(), "leave_requests[3]: unparseable date 'x'");
    }
}
