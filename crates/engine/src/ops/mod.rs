use chrono::Utc;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{
    ChangeEvent, ChangeKind, ChangeListener, EngineError, NullListener, PersonalLedger,
    ResultEngine,
};

mod access;
mod budgets;
mod contributions;
mod expenses;
mod households;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// The body and the commit run inside one async block, so every failure in
/// between (including begin/commit themselves) becomes the macro's value
/// instead of returning from the enclosing function. Callers that must react
/// to a failed transaction, like the contribution saga, bind the result.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let result: crate::ResultEngine<_> = async {
            let $tx = $self.database.begin().await?;
            match $body {
                Ok(value) => {
                    $tx.commit().await?;
                    Ok(value)
                }
                Err(err) => Err(err),
            }
        }
        .await;
        result
    }};
}

pub(crate) use with_tx;

/// The household budget engine.
///
/// Holds the shared-ledger database, the personal-ledger collaborator and the
/// change listener. No other state: every decision is made against the latest
/// committed rows, never an in-process cache.
pub struct Engine<P> {
    database: DatabaseConnection,
    personal: P,
    listener: Box<dyn ChangeListener>,
}

impl<P: PersonalLedger> Engine<P> {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder<P> {
        EngineBuilder::default()
    }

    /// Fire-and-forget change notification. A listener failure is the
    /// listener's problem; the commit already happened.
    pub(crate) fn emit(&self, budget_id: Uuid, kind: ChangeKind) {
        self.listener.publish(ChangeEvent {
            budget_id,
            kind,
            occurred_at: Utc::now(),
        });
    }
}

/// The builder for `Engine`
pub struct EngineBuilder<P> {
    database: DatabaseConnection,
    personal: Option<P>,
    listener: Box<dyn ChangeListener>,
}

impl<P> Default for EngineBuilder<P> {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            personal: None,
            listener: Box::new(NullListener),
        }
    }
}

impl<P: PersonalLedger> EngineBuilder<P> {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder<P> {
        self.database = db;
        self
    }

    /// Pass the required personal-ledger collaborator.
    pub fn personal_ledger(mut self, personal: P) -> EngineBuilder<P> {
        self.personal = Some(personal);
        self
    }

    /// Pass an optional change listener (defaults to [`NullListener`]).
    pub fn listener(mut self, listener: impl ChangeListener + 'static) -> EngineBuilder<P> {
        self.listener = Box::new(listener);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultEngine<Engine<P>> {
        let personal = self
            .personal
            .ok_or_else(|| EngineError::KeyNotFound("personal ledger not configured".to_string()))?;
        Ok(Engine {
            database: self.database,
            personal,
            listener: self.listener,
        })
    }
}
