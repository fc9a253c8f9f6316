//! End-to-end lifecycle: create a budget, pool contributions under limits,
//! transition to spending, spend under limits, and the personal-ledger
//! compensation path.

mod common;

use engine::{BudgetMonth, BudgetPhase, ChangeKind, Engine, EngineError, HouseholdRole};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use common::{FakeLedger, InjectedContribution, RecordingListener, engine_with_db};

fn august() -> BudgetMonth {
    BudgetMonth::new(2026, 8).unwrap()
}

/// Household of alice (admin) and bob (member) with a Collecting budget:
/// target 50 000, bob capped at 20 000, alice holding the 30 000 remainder.
async fn setup_collecting() -> (
    Engine<FakeLedger>,
    FakeLedger,
    RecordingListener,
    DatabaseConnection,
    String,
    Uuid,
) {
    let (engine, ledger, listener, db) = engine_with_db().await;
    let household_id = engine
        .new_household("Casa Verde", None, "alice")
        .await
        .unwrap();
    engine
        .add_member(&household_id, "bob", HouseholdRole::Member, "alice")
        .await
        .unwrap();
    let budget_id = engine
        .create_budget(
            &household_id,
            august(),
            50_000,
            &[("bob".to_string(), 20_000)],
            "alice",
        )
        .await
        .unwrap();
    (engine, ledger, listener, db, household_id, budget_id)
}

async fn fill_to_target(engine: &Engine<FakeLedger>, budget_id: Uuid) {
    engine
        .record_contribution(budget_id, 20_000, None, "bob", chrono::Utc::now())
        .await
        .unwrap();
    engine
        .record_contribution(budget_id, 30_000, None, "alice", chrono::Utc::now())
        .await
        .unwrap();
}

#[tokio::test]
async fn contribution_updates_totals_and_remaining() {
    let (engine, ledger, listener, _db, _household_id, budget_id) = setup_collecting().await;

    engine
        .record_contribution(budget_id, 15_000, Some("payday"), "bob", chrono::Utc::now())
        .await
        .unwrap();

    let summary = engine.budget_summary(budget_id, "bob").await.unwrap();
    assert_eq!(summary.total_contributed_minor, 15_000);
    assert_eq!(summary.remaining_to_target_minor(), 35_000);
    assert!(!summary.goal_reached());

    let bob = summary.member("bob").unwrap();
    assert_eq!(bob.contributed_minor, 15_000);
    assert_eq!(bob.remaining_contribution_minor, Some(5_000));
    assert_eq!(bob.contribution_share_percent, 100.0);

    let alice = summary.member("alice").unwrap();
    assert_eq!(alice.contribution_limit_minor, Some(30_000));
    assert_eq!(alice.contributed_minor, 0);

    assert_eq!(ledger.entry_count(), 1);
    let kinds: Vec<ChangeKind> = listener.events().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ChangeKind::LimitsSet, ChangeKind::Contribution]);
}

#[tokio::test]
async fn over_limit_contribution_writes_nothing() {
    let (engine, ledger, _listener, _db, _household_id, budget_id) = setup_collecting().await;

    engine
        .record_contribution(budget_id, 15_000, None, "bob", chrono::Utc::now())
        .await
        .unwrap();

    // 6 000 over a remaining cap of 5 000: rejected before any debit.
    let err = engine
        .record_contribution(budget_id, 6_000, None, "bob", chrono::Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ContributionLimitExceeded(_)));

    let summary = engine.budget_summary(budget_id, "bob").await.unwrap();
    assert_eq!(summary.total_contributed_minor, 15_000);
    assert_eq!(engine.budget_activity(budget_id, "bob").await.unwrap().len(), 1);
    assert_eq!(ledger.entry_count(), 1);
}

#[tokio::test]
async fn contribution_rejected_when_personal_budget_short() {
    let (engine, ledger, _listener, _db, _household_id, budget_id) = setup_collecting().await;
    ledger.set_remaining("bob", 4_000);

    let err = engine
        .record_contribution(budget_id, 5_000, None, "bob", chrono::Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PersonalBudgetExceeded(_)));
    assert_eq!(ledger.entry_count(), 0);
}

#[tokio::test]
async fn viewer_cannot_contribute_and_non_member_sees_nothing() {
    let (engine, _ledger, _listener, _db, household_id, budget_id) = setup_collecting().await;
    engine
        .add_member(&household_id, "carol", HouseholdRole::Viewer, "alice")
        .await
        .unwrap();

    let err = engine
        .record_contribution(budget_id, 1_000, None, "carol", chrono::Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotAdmin(_)));

    // A viewer may read.
    assert!(engine.budget_summary(budget_id, "carol").await.is_ok());

    // A non-member gets the same answer as for a missing budget.
    engine
        .remove_member(&household_id, "carol", "alice")
        .await
        .unwrap();
    let err = engine.budget_summary(budget_id, "carol").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn duplicate_budget_for_same_month_is_rejected() {
    let (engine, _ledger, _listener, _db, household_id, _budget_id) = setup_collecting().await;

    let err = engine
        .create_budget(&household_id, august(), 10_000, &[], "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateBudget(_)));

    // Another month is fine.
    engine
        .create_budget(
            &household_id,
            BudgetMonth::new(2026, 9).unwrap(),
            10_000,
            &[],
            "alice",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn member_cannot_create_budget_and_limits_must_fit_target() {
    let (engine, _ledger, _listener, _db) = engine_with_db().await;
    let household_id = engine.new_household("Flat 12", None, "alice").await.unwrap();
    engine
        .add_member(&household_id, "bob", HouseholdRole::Member, "alice")
        .await
        .unwrap();

    let err = engine
        .create_budget(&household_id, august(), 10_000, &[], "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotAdmin(_)));

    let err = engine
        .create_budget(
            &household_id,
            august(),
            10_000,
            &[("bob".to_string(), 12_000)],
            "alice",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::LimitsExceedTarget(_)));

    // The admin's cap is the remainder, never entered directly.
    let err = engine
        .create_budget(
            &household_id,
            august(),
            10_000,
            &[("alice".to_string(), 5_000)],
            "alice",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidLimit(_)));

    // One cap per member.
    let err = engine
        .create_budget(
            &household_id,
            august(),
            10_000,
            &[("bob".to_string(), 2_000), ("bob".to_string(), 3_000)],
            "alice",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidLimit(_)));
}

#[tokio::test]
async fn transition_is_one_way_and_gates_on_the_goal() {
    let (engine, _ledger, listener, _db, _household_id, budget_id) = setup_collecting().await;

    let limits = vec![("alice".to_string(), 20_000), ("bob".to_string(), 30_000)];

    // Short of the goal: no transition.
    let err = engine
        .transition_to_spending(budget_id, &limits, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::WrongPhase(_)));

    fill_to_target(&engine, budget_id).await;

    let err = engine
        .transition_to_spending(budget_id, &limits, "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotAdmin(_)));

    let duplicated = vec![("bob".to_string(), 25_000), ("bob".to_string(), 25_000)];
    let err = engine
        .transition_to_spending(budget_id, &duplicated, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidLimit(_)));

    engine
        .transition_to_spending(budget_id, &limits, "alice")
        .await
        .unwrap();

    let summary = engine.budget_summary(budget_id, "alice").await.unwrap();
    assert_eq!(summary.budget.phase, BudgetPhase::Spending);
    assert_eq!(summary.member("bob").unwrap().spending_limit_minor, Some(30_000));

    // No way back, and no further pooling.
    let err = engine
        .transition_to_spending(budget_id, &limits, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::WrongPhase(_)));
    let err = engine
        .record_contribution(budget_id, 1_000, None, "bob", chrono::Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::WrongPhase(_)));

    let kinds: Vec<ChangeKind> = listener.events().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ChangeKind::LimitsSet,
            ChangeKind::Contribution,
            ChangeKind::Contribution,
            ChangeKind::PhaseChange,
        ]
    );
}

#[tokio::test]
async fn spending_respects_per_member_limits() {
    let (engine, _ledger, listener, _db, _household_id, budget_id) = setup_collecting().await;
    fill_to_target(&engine, budget_id).await;
    engine
        .transition_to_spending(
            budget_id,
            &[("alice".to_string(), 20_000), ("bob".to_string(), 30_000)],
            "alice",
        )
        .await
        .unwrap();

    engine
        .record_spend(
            budget_id,
            25_000,
            Some("groceries"),
            Some("week 1"),
            "bob",
            chrono::Utc::now(),
        )
        .await
        .unwrap();

    let summary = engine.budget_summary(budget_id, "bob").await.unwrap();
    assert_eq!(summary.total_spent_minor, 25_000);
    let bob = summary.member("bob").unwrap();
    assert_eq!(bob.spent_minor, 25_000);
    assert_eq!(bob.remaining_spending_minor, Some(5_000));
    assert_eq!(bob.spending_share_percent, 100.0);

    let err = engine
        .record_spend(budget_id, 6_000, None, None, "bob", chrono::Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SpendingLimitExceeded(_)));

    assert_eq!(listener.events().last().unwrap().kind, ChangeKind::Spend);
}

#[tokio::test]
async fn member_without_spending_limit_cannot_spend() {
    let (engine, _ledger, _listener, _db, _household_id, budget_id) = setup_collecting().await;
    fill_to_target(&engine, budget_id).await;

    // Only alice gets a spending limit.
    engine
        .transition_to_spending(budget_id, &[("alice".to_string(), 50_000)], "alice")
        .await
        .unwrap();

    let err = engine
        .record_spend(budget_id, 1_000, None, None, "bob", chrono::Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SpendingLimitExceeded(_)));
}

#[tokio::test]
async fn activity_feed_interleaves_newest_first() {
    let (engine, _ledger, _listener, _db, _household_id, budget_id) = setup_collecting().await;
    let base = chrono::Utc::now();

    engine
        .record_contribution(budget_id, 20_000, None, "bob", base)
        .await
        .unwrap();
    engine
        .record_contribution(
            budget_id,
            30_000,
            None,
            "alice",
            base + chrono::TimeDelta::minutes(1),
        )
        .await
        .unwrap();
    engine
        .transition_to_spending(budget_id, &[("bob".to_string(), 30_000)], "alice")
        .await
        .unwrap();
    engine
        .record_spend(
            budget_id,
            5_000,
            None,
            None,
            "bob",
            base + chrono::TimeDelta::minutes(2),
        )
        .await
        .unwrap();

    let feed = engine.budget_activity(budget_id, "bob").await.unwrap();
    assert_eq!(feed.len(), 3);
    assert_eq!(feed[0].amount_minor, 5_000);
    assert_eq!(feed[1].user_id, "alice");
    assert_eq!(feed[2].user_id, "bob");
}

#[tokio::test]
async fn concurrent_fill_rolls_back_the_personal_debit() {
    let (engine, ledger, listener, db, _household_id, budget_id) = setup_collecting().await;

    engine
        .record_contribution(budget_id, 10_000, None, "bob", chrono::Utc::now())
        .await
        .unwrap();
    assert_eq!(ledger.entry_count(), 1);

    // While bob's debit is in flight, another session fills the budget.
    ledger.inject_next_debit(InjectedContribution {
        db: db.clone(),
        budget_id,
        user_id: "alice".to_string(),
        amount_minor: 40_000,
    });

    let err = engine
        .record_contribution(budget_id, 5_000, None, "bob", chrono::Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ContributionWouldExceedTarget(_)));

    // The compensating delete removed bob's second debit again.
    assert_eq!(ledger.entry_count(), 1);

    let summary = engine.budget_summary(budget_id, "bob").await.unwrap();
    assert_eq!(summary.total_contributed_minor, 50_000);
    assert_eq!(summary.member("bob").unwrap().contributed_minor, 10_000);

    // No contribution event for the rolled-back attempt.
    let kinds: Vec<ChangeKind> = listener.events().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ChangeKind::LimitsSet, ChangeKind::Contribution]);
}

#[tokio::test]
async fn failed_compensation_reports_the_orphaned_entry() {
    let (engine, ledger, _listener, db, _household_id, budget_id) = setup_collecting().await;

    ledger.inject_next_debit(InjectedContribution {
        db: db.clone(),
        budget_id,
        user_id: "alice".to_string(),
        amount_minor: 50_000,
    });
    ledger.fail_next_delete();

    let err = engine
        .record_contribution(budget_id, 5_000, None, "bob", chrono::Utc::now())
        .await
        .unwrap_err();
    match err {
        EngineError::CompensationFailed { entry_id, source } => {
            assert!(ledger.has_entry(entry_id));
            assert!(matches!(*source, EngineError::KeyNotFound(_)));
        }
        other => panic!("expected CompensationFailed, got {other:?}"),
    }

    // The shared ledger holds only the injected row; bob's attempt is absent.
    let summary = engine.budget_summary(budget_id, "bob").await.unwrap();
    assert_eq!(summary.total_contributed_minor, 50_000);
    assert_eq!(summary.member("bob").unwrap().contributed_minor, 0);
}
