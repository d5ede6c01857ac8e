//! # Error Types
//!
//! Domain-specific error types for stockbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockbook-core errors (this file)                                      │
//! │  └── ValidationError  - Input validation failures (pure, per field)     │
//! │                                                                         │
//! │  stockbook-db errors (separate crate)                                   │
//! │  └── DbError          - Storage failures AND business-rule violations   │
//! │                         enforced in SQL (insufficient stock, conflicts) │
//! │                                                                         │
//! │  API errors (in app)                                                    │
//! │  └── ApiError         - What the frontend sees (status + JSON body)     │
//! │                                                                         │
//! │  Flow: ValidationError → DbError → ApiError → Frontend                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business rules like stock sufficiency are checked by the database layer
//! as atomic conditional updates, so their error variants live in `DbError`
//! rather than here. This crate only knows about pure, per-field input
//! validation.
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field name, bounds)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any storage operation runs, so a
/// validation failure never mutates state.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid enum tag).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// The name of the field the error refers to.
    ///
    /// Used by the API layer to build field-level error lists.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustBeNonNegative { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
