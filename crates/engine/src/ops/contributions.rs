//! Contribution recording: the one cross-store saga in the engine.
//!
//! A contribution mirrors a debit in the member's personal ledger, which is a
//! separate store; the two writes cannot share a transaction. The order is:
//!
//! 1. validate against a fresh aggregate (no debit on an obvious reject);
//! 2. debit the personal ledger;
//! 3. re-validate against another fresh read *inside* the shared-store
//!    transaction and insert the contribution row;
//! 4. if step 3 fails, compensate by deleting the personal entry again.
//!
//! The fresh re-read in step 3 is what bounds the lost-update race between
//! concurrent members to the validate→write gap. A failed compensation is
//! surfaced as `CompensationFailed` and logged for manual reconciliation,
//! never swallowed.

use chrono::{DateTime, Utc};
use sea_orm::{TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    ChangeKind, Contribution, EngineError, PersonalLedger, ResultEngine, contributions,
    util::normalize_optional_text, validate,
};

use super::{Engine, with_tx};

impl<P: PersonalLedger> Engine<P> {
    /// Records a contribution to a Collecting budget.
    ///
    /// Returns the id of the new ledger row. On success a `contribution`
    /// change event is emitted; on any failure the personal ledger is left
    /// as it was, or a [`CompensationFailed`] error reports that it was not.
    ///
    /// [`CompensationFailed`]: EngineError::CompensationFailed
    pub async fn record_contribution(
        &self,
        budget_id: Uuid,
        amount_minor: i64,
        note: Option<&str>,
        user_id: &str,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        let note = normalize_optional_text(note);

        // Pre-debit pass: same checks the commit pass will repeat, so an
        // invalid request never touches the personal ledger at all.
        let (month, personal_remaining_minor) = with_tx!(self, |db_tx| {
            let budget = self.require_budget(&db_tx, budget_id).await?;
            let (_, role) = self
                .require_membership(&db_tx, &budget.household_id, user_id)
                .await?;
            if !role.can_contribute() {
                return Err(EngineError::NotAdmin(format!(
                    "{user_id} cannot contribute as a viewer"
                )));
            }

            let month = budget.month;
            let personal_remaining_minor =
                self.personal.remaining_budget(user_id, month).await?;
            let summary = self.load_summary(&db_tx, budget).await?;
            validate::can_contribute(&summary, user_id, amount_minor, personal_remaining_minor)?;
            Ok((month, personal_remaining_minor))
        })?;

        let entry_id = self
            .personal
            .debit(user_id, month, amount_minor, note.as_deref())
            .await?;

        let result: ResultEngine<Uuid> = with_tx!(self, |db_tx| {
            // Fresh read immediately before the write: another session may
            // have moved the totals since the pre-debit pass.
            let budget = self.require_budget(&db_tx, budget_id).await?;
            let summary = self.load_summary(&db_tx, budget).await?;
            validate::can_contribute(&summary, user_id, amount_minor, personal_remaining_minor)?;

            let contribution = Contribution::new(
                budget_id,
                user_id.to_string(),
                amount_minor,
                note.clone(),
                entry_id,
                occurred_at,
            )?;
            let contribution_id = contribution.id;
            contributions::ActiveModel::from(&contribution)
                .insert(&db_tx)
                .await?;
            Ok(contribution_id)
        });

        match result {
            Ok(contribution_id) => {
                self.emit(budget_id, ChangeKind::Contribution);
                Ok(contribution_id)
            }
            Err(original) => self.compensate_debit(entry_id, original).await,
        }
    }

    /// Undoes the personal debit after a failed shared-ledger write, then
    /// surfaces the original error.
    async fn compensate_debit(
        &self,
        entry_id: Uuid,
        original: EngineError,
    ) -> ResultEngine<Uuid> {
        match self.personal.delete_entry(entry_id).await {
            Ok(()) => {
                tracing::warn!(%entry_id, error = %original, "contribution rolled back; personal debit compensated");
                Err(original)
            }
            Err(delete_err) => {
                tracing::error!(
                    %entry_id,
                    original = %original,
                    error = %delete_err,
                    "compensating delete failed; personal entry orphaned, manual reconciliation required"
                );
                Err(EngineError::CompensationFailed {
                    entry_id,
                    source: Box::new(delete_err),
                })
            }
        }
    }
}
