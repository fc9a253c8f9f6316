//! Budget lifecycle: creation (Collecting) and the one-way transition to
//! Spending, plus the aggregate reads.
//!
//! All validation is pre-commit: nothing is written unless every check of
//! the proposed action has passed inside the same transaction that performs
//! the writes.

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    BudgetMonth, BudgetPhase, BudgetSummary, ChangeKind, Contribution, EngineError, Expense,
    MonthlyBudget, PersonalLedger, ResultEngine, budgets, contribution_limits, contributions,
    expenses, spending_limits,
    summary::{ActivityEntry, activity_feed},
    validate,
};

use super::{Engine, with_tx};

impl<P: PersonalLedger> Engine<P> {
    /// Fresh aggregate read: loads the budget's full ledger and limit rows
    /// and recomputes the snapshot. Callers validate against this, never
    /// against anything cached earlier in the session.
    pub(super) async fn load_summary(
        &self,
        db: &DatabaseTransaction,
        budget: MonthlyBudget,
    ) -> ResultEngine<BudgetSummary> {
        let budget_id = budget.id.to_string();

        let contribution_limit_rows = contribution_limits::Entity::find()
            .filter(contribution_limits::Column::BudgetId.eq(budget_id.clone()))
            .all(db)
            .await?;
        let spending_limit_rows = spending_limits::Entity::find()
            .filter(spending_limits::Column::BudgetId.eq(budget_id.clone()))
            .all(db)
            .await?;
        let (contribution_rows, expense_rows) = self.load_ledger(db, &budget_id).await?;

        Ok(BudgetSummary::compute(
            budget,
            &contribution_limit_rows,
            &spending_limit_rows,
            &contribution_rows,
            &expense_rows,
        ))
    }

    async fn load_ledger(
        &self,
        db: &DatabaseTransaction,
        budget_id: &str,
    ) -> ResultEngine<(Vec<Contribution>, Vec<Expense>)> {
        let contribution_rows = contributions::Entity::find()
            .filter(contributions::Column::BudgetId.eq(budget_id.to_string()))
            .all(db)
            .await?
            .into_iter()
            .map(Contribution::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        let expense_rows = expenses::Entity::find()
            .filter(expenses::Column::BudgetId.eq(budget_id.to_string()))
            .all(db)
            .await?
            .into_iter()
            .map(Expense::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok((contribution_rows, expense_rows))
    }

    fn check_limit_users(limits: &[(String, i64)], admin: &str) -> ResultEngine<()> {
        for (index, (user_id, _)) in limits.iter().enumerate() {
            if user_id == admin {
                return Err(EngineError::InvalidLimit(
                    "the admin limit is derived, not entered".to_string(),
                ));
            }
            if limits[..index].iter().any(|(other, _)| other == user_id) {
                return Err(EngineError::InvalidLimit(format!(
                    "duplicate limit for {user_id}"
                )));
            }
        }
        Ok(())
    }

    /// Creates the household's budget for a month, in the Collecting phase.
    ///
    /// `member_limits` carries the non-admin caps; the caller's own cap is
    /// stored as the remainder `target − sum(member_limits)`. The target is
    /// cross-checked against the admin's remaining personal budget for the
    /// month. Emits a `limitsSet` event on success.
    pub async fn create_budget(
        &self,
        household_id: &str,
        month: BudgetMonth,
        target_minor: i64,
        member_limits: &[(String, i64)],
        user_id: &str,
    ) -> ResultEngine<Uuid> {
        let budget_id = with_tx!(self, |db_tx| {
            let (_, role) = self
                .require_membership(&db_tx, household_id, user_id)
                .await?;
            let existing = self
                .find_budget_for_month(&db_tx, household_id, &month.to_string())
                .await?;
            let personal_remaining_minor =
                self.personal.remaining_budget(user_id, month).await?;

            validate::can_create_budget(
                role,
                existing.as_ref(),
                target_minor,
                member_limits,
                personal_remaining_minor,
            )?;
            Self::check_limit_users(member_limits, user_id)?;

            let mut sum_minor = 0;
            for (member, limit_minor) in member_limits {
                self.membership_role(&db_tx, household_id, member)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("membership not exists".to_string()))?;
                sum_minor += limit_minor;
            }

            let budget = MonthlyBudget::new(
                household_id.to_string(),
                month,
                target_minor,
                user_id.to_string(),
                Utc::now(),
            )?;
            let budget_id = budget.id;
            budgets::ActiveModel::from(&budget).insert(&db_tx).await?;

            for (member, limit_minor) in member_limits {
                let row = contribution_limits::ActiveModel {
                    budget_id: ActiveValue::Set(budget_id.to_string()),
                    user_id: ActiveValue::Set(member.clone()),
                    limit_minor: ActiveValue::Set(*limit_minor),
                };
                row.insert(&db_tx).await?;
            }

            // Admin cap = remainder. A remainder of 0 stores the "unlimited"
            // sentinel, which the target ceiling still bounds.
            let admin_row = contribution_limits::ActiveModel {
                budget_id: ActiveValue::Set(budget_id.to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                limit_minor: ActiveValue::Set(target_minor - sum_minor),
            };
            admin_row.insert(&db_tx).await?;

            Ok(budget_id)
        })?;

        self.emit(budget_id, ChangeKind::LimitsSet);
        Ok(budget_id)
    }

    /// Moves a budget from Collecting to Spending and writes the per-member
    /// spending limits. Irreversible: contributions already pooled cannot be
    /// handed back, so no path returns to Collecting. Emits `phaseChange`.
    pub async fn transition_to_spending(
        &self,
        budget_id: Uuid,
        spending_limit_rows: &[(String, i64)],
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let budget = self.require_budget(&db_tx, budget_id).await?;
            let household_id = budget.household_id.clone();
            let (_, role) = self
                .require_membership(&db_tx, &household_id, user_id)
                .await?;

            let summary = self.load_summary(&db_tx, budget).await?;
            validate::can_transition(role, &summary, spending_limit_rows)?;

            for (index, (member, _)) in spending_limit_rows.iter().enumerate() {
                self.membership_role(&db_tx, &household_id, member)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("membership not exists".to_string()))?;
                if spending_limit_rows[..index]
                    .iter()
                    .any(|(other, _)| other == member)
                {
                    return Err(EngineError::InvalidLimit(format!(
                        "duplicate spending limit for {member}"
                    )));
                }
            }

            let phase_update = budgets::ActiveModel {
                id: ActiveValue::Set(budget_id.to_string()),
                phase: ActiveValue::Set(BudgetPhase::Spending.as_str().to_string()),
                ..Default::default()
            };
            phase_update.update(&db_tx).await?;

            for (member, limit_minor) in spending_limit_rows {
                let row = spending_limits::ActiveModel {
                    budget_id: ActiveValue::Set(budget_id.to_string()),
                    user_id: ActiveValue::Set(member.clone()),
                    limit_minor: ActiveValue::Set(*limit_minor),
                };
                row.insert(&db_tx).await?;
            }

            tracing::info!(%budget_id, "budget entered the spending phase");
            Ok(())
        })?;

        self.emit(budget_id, ChangeKind::PhaseChange);
        Ok(())
    }

    /// Looks up the household's budget for a month, if one exists.
    pub async fn find_budget(
        &self,
        household_id: &str,
        month: BudgetMonth,
        user_id: &str,
    ) -> ResultEngine<Option<MonthlyBudget>> {
        with_tx!(self, |db_tx| {
            self.require_household_read(&db_tx, household_id, user_id)
                .await?;
            self.find_budget_for_month(&db_tx, household_id, &month.to_string())
                .await
        })
    }

    /// Recomputes the full aggregate snapshot for a budget.
    pub async fn budget_summary(
        &self,
        budget_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<BudgetSummary> {
        with_tx!(self, |db_tx| {
            let budget = self.require_budget(&db_tx, budget_id).await?;
            self.require_household_read(&db_tx, &budget.household_id, user_id)
                .await?;
            self.load_summary(&db_tx, budget).await
        })
    }

    /// Activity feed for a budget: contributions and expenses interleaved,
    /// newest first.
    pub async fn budget_activity(
        &self,
        budget_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<ActivityEntry>> {
        with_tx!(self, |db_tx| {
            let budget = self.require_budget(&db_tx, budget_id).await?;
            self.require_household_read(&db_tx, &budget.household_id, user_id)
                .await?;
            let (contribution_rows, expense_rows) =
                self.load_ledger(&db_tx, &budget_id.to_string()).await?;
            Ok(activity_feed(&contribution_rows, &expense_rows))
        })
    }
}
