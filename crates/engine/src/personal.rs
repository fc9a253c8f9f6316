//! The personal-ledger collaborator.
//!
//! Each member's private transactions live in a store of their own, outside
//! the engine's database, so the two can never share a transaction. A
//! contribution mirrors a debit there; when the shared-ledger write fails
//! after the debit already succeeded, the engine compensates by deleting the
//! entry again through [`PersonalLedger::delete_entry`].

use uuid::Uuid;

use crate::{BudgetMonth, ResultEngine};

/// Store of the members' personal transactions.
///
/// Implementations report infrastructure failures as
/// [`EngineError::StoreUnavailable`]; the engine never retries them itself.
///
/// [`EngineError::StoreUnavailable`]: crate::EngineError::StoreUnavailable
pub trait PersonalLedger {
    /// The member's remaining personal budget for the month, in minor units.
    fn remaining_budget(
        &self,
        user_id: &str,
        month: BudgetMonth,
    ) -> impl Future<Output = ResultEngine<i64>> + Send;

    /// Records the personal debit mirroring a contribution and returns the
    /// new entry's id.
    fn debit(
        &self,
        user_id: &str,
        month: BudgetMonth,
        amount_minor: i64,
        note: Option<&str>,
    ) -> impl Future<Output = ResultEngine<Uuid>> + Send;

    /// Compensating delete of a previously created entry.
    fn delete_entry(&self, entry_id: Uuid) -> impl Future<Output = ResultEngine<()>> + Send;
}
