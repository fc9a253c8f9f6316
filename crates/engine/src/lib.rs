//! Household pooled-budget engine.
//!
//! Several members of a household pool personal funds into a shared monthly
//! budget, then spend from that pool under individually assigned limits.
//! This crate is the lifecycle and ledger engine behind that feature:
//!
//! - the two-phase budget lifecycle (Collecting → Spending, one-way);
//! - the append-only contribution/expense ledger;
//! - the pure limit validator ([`validate`]) and the aggregation engine
//!   ([`BudgetSummary`]) that recomputes every total from the ledger;
//! - household/membership administration with a single-admin invariant;
//! - the change-propagation contract ([`ChangeListener`]) and the
//!   personal-ledger saga ([`PersonalLedger`]).
//!
//! The engine is an embedded library: the application hands it a connected
//! database, a personal-ledger implementation and (optionally) a change
//! listener through [`Engine::builder`], and calls its async operations.

pub use budgets::{BudgetPhase, MonthlyBudget};
pub use contributions::Contribution;
pub use error::EngineError;
pub use events::{ChangeEvent, ChangeKind, ChangeListener, NullListener};
pub use expenses::Expense;
pub use households::Household;
pub use memberships::HouseholdRole;
pub use month::BudgetMonth;
pub use ops::{Engine, EngineBuilder};
pub use personal::PersonalLedger;
pub use summary::{ActivityEntry, ActivityKind, BudgetSummary, MemberBreakdown, percentage};

pub mod budgets;
pub mod contribution_limits;
pub mod contributions;
mod error;
mod events;
pub mod expenses;
pub mod households;
pub mod memberships;
mod month;
mod ops;
mod personal;
pub mod spending_limits;
pub mod summary;
pub mod users;
mod util;
pub mod validate;

type ResultEngine<T> = Result<T, EngineError>;
