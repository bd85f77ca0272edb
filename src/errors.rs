//! Unified error type for the club treasury.
//!
//! Errors fall into three groups: store failures (`Database`), input problems caught
//! before any store round-trip (`Validation`, `InvalidAmount`, `InvalidPeriod`), and
//! business-rule rejections (`DuplicatePayment`). Rows that fail boundary validation
//! after a fetch surface as `InvalidRow`.

use sea_orm::DbErr;
use thiserror::Error;

/// All errors produced by the library and the command-line front end.
#[derive(Debug, Error)]
pub enum Error {
    /// Connectivity or query failure reported by the data store
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A required field is missing or malformed
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// Human-readable reason
        message: String,
    },

    /// Amount is negative, NaN or infinite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Month outside 1..=12 or a year chrono cannot represent
    #[error("Invalid period: month {month}, year {year}")]
    InvalidPeriod {
        /// Requested month
        month: u32,
        /// Requested year
        year: i32,
    },

    /// The member already has a dues payment for the period
    #[error("Member {member_id} has already paid dues for {month}/{year}")]
    DuplicatePayment {
        /// Member that already paid
        member_id: i64,
        /// Month of the existing payment
        month: u32,
        /// Year of the existing payment
        year: i32,
    },

    /// Update or delete targeted a row that does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record ("member", "budget", ...)
        entity: &'static str,
        /// Primary key that was looked up
        id: i64,
    },

    /// A fetched row could not be converted into a typed record
    #[error("Invalid row in {table}: {message}")]
    InvalidRow {
        /// Table the row came from
        table: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the failure
        message: String,
    },

    /// I/O failure outside the data store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] on a required field left empty.
    #[must_use]
    pub fn required(field: &'static str) -> Self {
        Self::Validation {
            field,
            message: "is required".to_string(),
        }
    }

    /// Whether the error was caught before the store was touched.
    #[must_use]
    pub const fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InvalidAmount { .. }
                | Self::InvalidPeriod { .. }
                | Self::DuplicatePayment { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
