//! Change propagation contract.
//!
//! After every successful commit the engine publishes a small domain event so
//! other sessions observing the same budget re-derive their aggregates. The
//! transport (polling, push, socket) belongs to the collaborator behind
//! [`ChangeListener`]; delivery is fire-and-forget and never affects the
//! committed write, which is why `publish` is infallible. Consumers must
//! tolerate a missed event by re-fetching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Contribution,
    Spend,
    PhaseChange,
    LimitsSet,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub budget_id: Uuid,
    pub kind: ChangeKind,
    pub occurred_at: DateTime<Utc>,
}

/// Outbound notification sink supplied by the embedding application.
pub trait ChangeListener: Send + Sync {
    fn publish(&self, event: ChangeEvent);
}

/// Listener that drops every event. Used when no propagation is wired up.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullListener;

impl ChangeListener for NullListener {
    fn publish(&self, _event: ChangeEvent) {}
}
