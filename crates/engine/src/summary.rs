//! Derived aggregates over a budget's ledger.
//!
//! Totals, per-member breakdowns and percentages are always recomputed from
//! the full set of contribution/expense rows, never stored. The read costs a
//! little more; in exchange the aggregates can never drift from the ledger of
//! record, and recomputing twice from the same snapshot is guaranteed to
//! yield identical results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    Contribution, Expense, MonthlyBudget, contribution_limits, spending_limits,
};

/// Percentage of `amount_minor` over `total_minor`, with an empty total
/// yielding 0 instead of a division by zero.
#[must_use]
pub fn percentage(amount_minor: i64, total_minor: i64) -> f64 {
    if total_minor == 0 {
        return 0.0;
    }
    amount_minor as f64 / total_minor as f64 * 100.0
}

/// One member's view of a budget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberBreakdown {
    pub user_id: String,
    /// `None` means no cap (stored limit of 0 or no row).
    pub contribution_limit_minor: Option<i64>,
    pub contributed_minor: i64,
    /// `max(0, limit - contributed)`; `None` while the member is uncapped.
    pub remaining_contribution_minor: Option<i64>,
    pub contribution_share_percent: f64,
    /// `None` means no spending limit was assigned; such a member cannot
    /// spend from the pool.
    pub spending_limit_minor: Option<i64>,
    pub spent_minor: i64,
    pub remaining_spending_minor: Option<i64>,
    pub spending_share_percent: f64,
}

/// A single entry of the interleaved activity feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub kind: ActivityKind,
    pub user_id: String,
    pub amount_minor: i64,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Contribution,
    Spend,
}

/// Snapshot of a budget derived from its full ledger.
///
/// This is both the presentation aggregate and the input the
/// [limit validator](crate::validate) decides against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub budget: MonthlyBudget,
    pub total_contributed_minor: i64,
    pub total_spent_minor: i64,
    /// Sorted by user id for deterministic output.
    pub members: Vec<MemberBreakdown>,
}

impl BudgetSummary {
    /// Recomputes the whole snapshot from ledger rows.
    ///
    /// Members are the union of limit rows and ledger rows, so departed
    /// members with history keep appearing in totals.
    #[must_use]
    pub fn compute(
        budget: MonthlyBudget,
        contribution_limits: &[contribution_limits::Model],
        spending_limits: &[spending_limits::Model],
        contributions: &[Contribution],
        expenses: &[Expense],
    ) -> Self {
        let mut contributed: BTreeMap<String, i64> = BTreeMap::new();
        let mut spent: BTreeMap<String, i64> = BTreeMap::new();

        let mut total_contributed_minor = 0;
        for row in contributions {
            total_contributed_minor += row.amount_minor;
            *contributed.entry(row.user_id.clone()).or_insert(0) += row.amount_minor;
        }

        let mut total_spent_minor = 0;
        for row in expenses {
            total_spent_minor += row.amount_minor;
            *spent.entry(row.user_id.clone()).or_insert(0) += row.amount_minor;
        }

        let mut contribution_caps: BTreeMap<String, i64> = BTreeMap::new();
        for row in contribution_limits {
            contribution_caps.insert(row.user_id.clone(), row.limit_minor);
        }
        let mut spending_caps: BTreeMap<String, i64> = BTreeMap::new();
        for row in spending_limits {
            spending_caps.insert(row.user_id.clone(), row.limit_minor);
        }

        let mut user_ids: Vec<String> = contribution_caps
            .keys()
            .chain(spending_caps.keys())
            .chain(contributed.keys())
            .chain(spent.keys())
            .cloned()
            .collect();
        user_ids.sort();
        user_ids.dedup();

        let members = user_ids
            .into_iter()
            .map(|user_id| {
                let contributed_minor = contributed.get(&user_id).copied().unwrap_or(0);
                let spent_minor = spent.get(&user_id).copied().unwrap_or(0);
                let contribution_limit_minor = contribution_caps
                    .get(&user_id)
                    .copied()
                    .filter(|limit| *limit != contribution_limits::UNLIMITED);
                let spending_limit_minor = spending_caps.get(&user_id).copied();

                MemberBreakdown {
                    remaining_contribution_minor: contribution_limit_minor
                        .map(|limit| (limit - contributed_minor).max(0)),
                    contribution_share_percent: percentage(
                        contributed_minor,
                        total_contributed_minor,
                    ),
                    remaining_spending_minor: spending_limit_minor
                        .map(|limit| (limit - spent_minor).max(0)),
                    spending_share_percent: percentage(spent_minor, total_spent_minor),
                    user_id,
                    contribution_limit_minor,
                    contributed_minor,
                    spending_limit_minor,
                    spent_minor,
                }
            })
            .collect();

        Self {
            budget,
            total_contributed_minor,
            total_spent_minor,
            members,
        }
    }

    pub fn member(&self, user_id: &str) -> Option<&MemberBreakdown> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    /// Whether the pooled total has reached the target.
    #[must_use]
    pub fn goal_reached(&self) -> bool {
        self.total_contributed_minor >= self.budget.target_minor
    }

    #[must_use]
    pub fn remaining_to_target_minor(&self) -> i64 {
        (self.budget.target_minor - self.total_contributed_minor).max(0)
    }
}

/// Interleaves contributions and expenses, newest first.
#[must_use]
pub fn activity_feed(contributions: &[Contribution], expenses: &[Expense]) -> Vec<ActivityEntry> {
    let mut feed: Vec<ActivityEntry> = contributions
        .iter()
        .map(|c| ActivityEntry {
            kind: ActivityKind::Contribution,
            user_id: c.user_id.clone(),
            amount_minor: c.amount_minor,
            note: c.note.clone(),
            occurred_at: c.occurred_at,
        })
        .chain(expenses.iter().map(|e| ActivityEntry {
            kind: ActivityKind::Spend,
            user_id: e.user_id.clone(),
            amount_minor: e.amount_minor,
            note: e.note.clone(),
            occurred_at: e.occurred_at,
        }))
        .collect();
    feed.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    feed
}
