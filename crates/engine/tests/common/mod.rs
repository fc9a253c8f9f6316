//! Shared fixtures: in-memory database, a fake personal ledger and a
//! recording change listener.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, atomic::AtomicBool, atomic::Ordering};

use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    BudgetMonth, ChangeEvent, ChangeListener, Engine, EngineError, PersonalLedger,
};
use migration::MigratorTrait;

/// A contribution row inserted behind the engine's back while a debit is in
/// flight, standing in for a concurrent session.
pub struct InjectedContribution {
    pub db: DatabaseConnection,
    pub budget_id: Uuid,
    pub user_id: String,
    pub amount_minor: i64,
}

#[derive(Default)]
struct FakeLedgerInner {
    remaining: Mutex<HashMap<String, i64>>,
    entries: Mutex<HashMap<Uuid, (String, i64)>>,
    inject_on_debit: Mutex<Option<InjectedContribution>>,
    fail_delete: AtomicBool,
}

/// In-memory stand-in for the personal-ledger store.
#[derive(Clone, Default)]
pub struct FakeLedger {
    inner: Arc<FakeLedgerInner>,
}

impl FakeLedger {
    pub fn set_remaining(&self, user_id: &str, amount_minor: i64) {
        self.inner
            .remaining
            .lock()
            .unwrap()
            .insert(user_id.to_string(), amount_minor);
    }

    pub fn entry_count(&self) -> usize {
        self.inner.entries.lock().unwrap().len()
    }

    pub fn has_entry(&self, entry_id: Uuid) -> bool {
        self.inner.entries.lock().unwrap().contains_key(&entry_id)
    }

    pub fn fail_next_delete(&self) {
        self.inner.fail_delete.store(true, Ordering::SeqCst);
    }

    pub fn inject_next_debit(&self, injected: InjectedContribution) {
        *self.inner.inject_on_debit.lock().unwrap() = Some(injected);
    }
}

impl PersonalLedger for FakeLedger {
    async fn remaining_budget(
        &self,
        user_id: &str,
        _month: BudgetMonth,
    ) -> Result<i64, EngineError> {
        Ok(self
            .inner
            .remaining
            .lock()
            .unwrap()
            .get(user_id)
            .copied()
            .unwrap_or(1_000_000))
    }

    async fn debit(
        &self,
        user_id: &str,
        _month: BudgetMonth,
        amount_minor: i64,
        _note: Option<&str>,
    ) -> Result<Uuid, EngineError> {
        let entry_id = Uuid::new_v4();
        {
            let mut entries = self.inner.entries.lock().unwrap();
            entries.insert(entry_id, (user_id.to_string(), amount_minor));
        }
        {
            let mut remaining = self.inner.remaining.lock().unwrap();
            let balance = remaining.entry(user_id.to_string()).or_insert(1_000_000);
            *balance -= amount_minor;
        }

        let injected = self.inner.inject_on_debit.lock().unwrap().take();
        if let Some(injected) = injected {
            insert_contribution_row(
                &injected.db,
                injected.budget_id,
                &injected.user_id,
                injected.amount_minor,
            )
            .await;
        }
        Ok(entry_id)
    }

    async fn delete_entry(&self, entry_id: Uuid) -> Result<(), EngineError> {
        if self.inner.fail_delete.swap(false, Ordering::SeqCst) {
            return Err(EngineError::KeyNotFound(
                "personal ledger unreachable".to_string(),
            ));
        }
        let removed = self.inner.entries.lock().unwrap().remove(&entry_id);
        if let Some((user_id, amount_minor)) = removed {
            let mut remaining = self.inner.remaining.lock().unwrap();
            if let Some(balance) = remaining.get_mut(&user_id) {
                *balance += amount_minor;
            }
        }
        Ok(())
    }
}

/// Collects every published change event.
#[derive(Clone, Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ChangeListener for RecordingListener {
    fn publish(&self, event: ChangeEvent) {
        self.events.lock().unwrap().push(event);
    }
}

async fn insert_contribution_row(
    db: &DatabaseConnection,
    budget_id: Uuid,
    user_id: &str,
    amount_minor: i64,
) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO contributions \
         (id, budget_id, user_id, amount_minor, note, personal_entry_id, occurred_at) \
         VALUES (?, ?, ?, ?, NULL, ?, ?)",
        vec![
            Uuid::new_v4().to_string().into(),
            budget_id.to_string().into(),
            user_id.into(),
            amount_minor.into(),
            Uuid::new_v4().to_string().into(),
            Utc::now().into(),
        ],
    ))
    .await
    .unwrap();
}

pub async fn seed_user(db: &DatabaseConnection, username: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password, created_at) VALUES (?, ?, ?)",
        vec![username.into(), "password".into(), Utc::now().into()],
    ))
    .await
    .unwrap();
}

pub async fn engine_with_db() -> (
    Engine<FakeLedger>,
    FakeLedger,
    RecordingListener,
    DatabaseConnection,
) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    for username in ["alice", "bob", "carol"] {
        seed_user(&db, username).await;
    }

    let ledger = FakeLedger::default();
    let listener = RecordingListener::default();
    let engine = Engine::builder()
        .database(db.clone())
        .personal_ledger(ledger.clone())
        .listener(listener.clone())
        .build()
        .unwrap();
    (engine, ledger, listener, db)
}
