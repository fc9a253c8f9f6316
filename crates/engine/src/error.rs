//! Errors the engine can return.
//!
//! Every validation failure maps to a dedicated variant so callers can react
//! to the specific reason (and tests can assert on it). `StoreUnavailable`
//! wraps the underlying store error and is retried by the caller, never by
//! the engine. [`CompensationFailed`] is the one condition that requires
//! operator attention: the personal-ledger rollback itself failed, leaving an
//! orphaned personal entry behind.
//!
//! [`CompensationFailed`]: EngineError::CompensationFailed

use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Budget already exists: {0}")]
    DuplicateBudget(String),
    #[error("Limits exceed target: {0}")]
    LimitsExceedTarget(String),
    #[error("Contribution limit exceeded: {0}")]
    ContributionLimitExceeded(String),
    #[error("Contribution would exceed target: {0}")]
    ContributionWouldExceedTarget(String),
    #[error("Personal budget exceeded: {0}")]
    PersonalBudgetExceeded(String),
    #[error("Not an admin: {0}")]
    NotAdmin(String),
    #[error("Wrong phase: {0}")]
    WrongPhase(String),
    #[error("Spending limit exceeded: {0}")]
    SpendingLimitExceeded(String),
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),
    #[error("Household not empty: {0}")]
    HouseholdNotEmpty(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid role: {0}")]
    InvalidRole(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid month: {0}")]
    InvalidMonth(String),
    /// The compensating delete after a failed ledger write itself failed.
    /// The personal-ledger entry `entry_id` is now orphaned and must be
    /// reconciled manually.
    #[error("Compensation failed for personal entry {entry_id}: {source}")]
    CompensationFailed {
        entry_id: Uuid,
        #[source]
        source: Box<EngineError>,
    },
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::DuplicateBudget(a), Self::DuplicateBudget(b)) => a == b,
            (Self::LimitsExceedTarget(a), Self::LimitsExceedTarget(b)) => a == b,
            (Self::ContributionLimitExceeded(a), Self::ContributionLimitExceeded(b)) => a == b,
            (Self::ContributionWouldExceedTarget(a), Self::ContributionWouldExceedTarget(b)) => {
                a == b
            }
            (Self::PersonalBudgetExceeded(a), Self::PersonalBudgetExceeded(b)) => a == b,
            (Self::NotAdmin(a), Self::NotAdmin(b)) => a == b,
            (Self::WrongPhase(a), Self::WrongPhase(b)) => a == b,
            (Self::SpendingLimitExceeded(a), Self::SpendingLimitExceeded(b)) => a == b,
            (Self::InvalidLimit(a), Self::InvalidLimit(b)) => a == b,
            (Self::HouseholdNotEmpty(a), Self::HouseholdNotEmpty(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidRole(a), Self::InvalidRole(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidMonth(a), Self::InvalidMonth(b)) => a == b,
            (
                Self::CompensationFailed {
                    entry_id: a,
                    source: sa,
                },
                Self::CompensationFailed {
                    entry_id: b,
                    source: sb,
                },
            ) => a == b && sa == sb,
            (Self::StoreUnavailable(a), Self::StoreUnavailable(b)) => {
                a.to_string() == b.to_string()
            }
            _ => false,
        }
    }
}
