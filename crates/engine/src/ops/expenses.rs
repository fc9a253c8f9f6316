//! Spend recording against a Spending-phase budget.
//!
//! Same read-validate-write shape as contributions, but no compensation:
//! tagging an expense creates no second record in another store.

use chrono::{DateTime, Utc};
use sea_orm::{TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    ChangeKind, EngineError, Expense, PersonalLedger, ResultEngine, expenses,
    util::normalize_optional_text, validate,
};

use super::{Engine, with_tx};

impl<P: PersonalLedger> Engine<P> {
    /// Records a spend against the member's spending limit.
    ///
    /// Emits a `spend` change event on success.
    pub async fn record_spend(
        &self,
        budget_id: Uuid,
        amount_minor: i64,
        category: Option<&str>,
        note: Option<&str>,
        user_id: &str,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        let expense_id = with_tx!(self, |db_tx| {
            let budget = self.require_budget(&db_tx, budget_id).await?;
            let (_, role) = self
                .require_membership(&db_tx, &budget.household_id, user_id)
                .await?;
            if !role.can_spend() {
                return Err(EngineError::NotAdmin(format!(
                    "{user_id} cannot spend as a viewer"
                )));
            }

            let summary = self.load_summary(&db_tx, budget).await?;
            validate::can_spend(&summary, user_id, amount_minor)?;

            let expense = Expense::new(
                budget_id,
                user_id.to_string(),
                amount_minor,
                normalize_optional_text(category),
                normalize_optional_text(note),
                occurred_at,
            )?;
            let expense_id = expense.id;
            expenses::ActiveModel::from(&expense).insert(&db_tx).await?;
            Ok(expense_id)
        })?;

        self.emit(budget_id, ChangeKind::Spend);
        Ok(expense_id)
    }
}
