//! The limit validator.
//!
//! Stateless predicates deciding whether a proposed action is allowed against
//! a [`BudgetSummary`] snapshot. They perform no I/O, so every rule can be
//! unit-tested without a store; the ops layer calls them against a snapshot
//! read freshly inside the commit transaction.

use crate::{
    BudgetPhase, BudgetSummary, EngineError, HouseholdRole, MonthlyBudget, ResultEngine,
};

fn require_positive(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// Whether `user_id` may contribute `amount_minor` right now.
///
/// `personal_remaining_minor` is the member's remaining *personal* budget for
/// the month, supplied by the personal-ledger collaborator. A member without
/// an assigned cap (stored limit 0 or no row) is unlimited up to the target.
pub fn can_contribute(
    summary: &BudgetSummary,
    user_id: &str,
    amount_minor: i64,
    personal_remaining_minor: i64,
) -> ResultEngine<()> {
    require_positive(amount_minor)?;

    if summary.budget.phase != BudgetPhase::Collecting {
        return Err(EngineError::WrongPhase(
            "budget is no longer collecting".to_string(),
        ));
    }
    if amount_minor > personal_remaining_minor {
        return Err(EngineError::PersonalBudgetExceeded(format!(
            "amount {amount_minor} exceeds personal remaining {personal_remaining_minor}"
        )));
    }
    if amount_minor > summary.remaining_to_target_minor() {
        return Err(EngineError::ContributionWouldExceedTarget(format!(
            "amount {amount_minor} exceeds remaining target {}",
            summary.remaining_to_target_minor()
        )));
    }
    if let Some(member) = summary.member(user_id)
        && let Some(remaining) = member.remaining_contribution_minor
        && amount_minor > remaining
    {
        return Err(EngineError::ContributionLimitExceeded(format!(
            "amount {amount_minor} exceeds remaining limit {remaining} for {user_id}"
        )));
    }
    Ok(())
}

/// Whether `user_id` may spend `amount_minor` from the pool right now.
///
/// A member with no spending limit assigned at the transition cannot spend.
pub fn can_spend(summary: &BudgetSummary, user_id: &str, amount_minor: i64) -> ResultEngine<()> {
    require_positive(amount_minor)?;

    if summary.budget.phase != BudgetPhase::Spending {
        return Err(EngineError::WrongPhase(
            "budget is not in the spending phase".to_string(),
        ));
    }
    let remaining = summary
        .member(user_id)
        .and_then(|m| m.remaining_spending_minor)
        .ok_or_else(|| {
            EngineError::SpendingLimitExceeded(format!("no spending limit assigned to {user_id}"))
        })?;
    if amount_minor > remaining {
        return Err(EngineError::SpendingLimitExceeded(format!(
            "amount {amount_minor} exceeds remaining limit {remaining} for {user_id}"
        )));
    }
    Ok(())
}

/// Preconditions of budget creation.
///
/// `member_limits` are the non-admin caps as entered; the admin's own cap is
/// never part of them (it is derived as the remainder). `existing` is the
/// budget already stored for the same household and month, if any.
pub fn can_create_budget(
    role: HouseholdRole,
    existing: Option<&MonthlyBudget>,
    target_minor: i64,
    member_limits: &[(String, i64)],
    personal_remaining_minor: i64,
) -> ResultEngine<()> {
    if !role.can_create_budget() {
        return Err(EngineError::NotAdmin(
            "only the admin can create a budget".to_string(),
        ));
    }
    if let Some(budget) = existing {
        return Err(EngineError::DuplicateBudget(format!(
            "budget for {} already exists",
            budget.month
        )));
    }
    if target_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "target_minor must be > 0".to_string(),
        ));
    }
    if target_minor > personal_remaining_minor {
        return Err(EngineError::PersonalBudgetExceeded(format!(
            "target {target_minor} exceeds personal remaining {personal_remaining_minor}"
        )));
    }

    let mut sum_minor: i64 = 0;
    for (user_id, limit_minor) in member_limits {
        if *limit_minor < 0 {
            return Err(EngineError::InvalidAmount(format!(
                "limit for {user_id} must be >= 0"
            )));
        }
        sum_minor += limit_minor;
    }
    if sum_minor > target_minor {
        return Err(EngineError::LimitsExceedTarget(format!(
            "limits sum {sum_minor} exceeds target {target_minor}"
        )));
    }
    Ok(())
}

/// Preconditions of the one-way Collecting→Spending transition.
pub fn can_transition(
    role: HouseholdRole,
    summary: &BudgetSummary,
    spending_limits: &[(String, i64)],
) -> ResultEngine<()> {
    if !role.can_transition() {
        return Err(EngineError::NotAdmin(
            "only the admin can enable spending".to_string(),
        ));
    }
    if summary.budget.phase != BudgetPhase::Collecting {
        return Err(EngineError::WrongPhase(
            "budget is already spending".to_string(),
        ));
    }
    if !summary.goal_reached() {
        return Err(EngineError::WrongPhase(format!(
            "goal not reached: {} of {}",
            summary.total_contributed_minor, summary.budget.target_minor
        )));
    }
    for (user_id, limit_minor) in spending_limits {
        if *limit_minor < 0 {
            return Err(EngineError::InvalidAmount(format!(
                "spending limit for {user_id} must be >= 0"
            )));
        }
    }
    Ok(())
}
