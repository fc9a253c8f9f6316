//! Initial schema migration - creates all tables from scratch.
//!
//! Schema for the household pooled-budget engine:
//!
//! - `users`: identity anchor for foreign keys (auth lives elsewhere)
//! - `households`: groups pooling money
//! - `household_memberships`: per-user role within a household
//! - `monthly_budgets`: one pooled budget per household and month
//! - `contribution_limits`: per-member caps during Collecting
//! - `spending_limits`: per-member caps during Spending
//! - `contributions`: append-only contribution ledger
//! - `budget_expenses`: append-only spend ledger

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
    CreatedAt,
}

#[derive(Iden)]
enum Households {
    Table,
    Id,
    Name,
    ImageRef,
    CreatedAt,
}

#[derive(Iden)]
enum HouseholdMemberships {
    Table,
    HouseholdId,
    UserId,
    Role,
}

#[derive(Iden)]
enum MonthlyBudgets {
    Table,
    Id,
    HouseholdId,
    Month,
    TargetMinor,
    Phase,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum ContributionLimits {
    Table,
    BudgetId,
    UserId,
    LimitMinor,
}

#[derive(Iden)]
enum SpendingLimits {
    Table,
    BudgetId,
    UserId,
    LimitMinor,
}

#[derive(Iden)]
enum Contributions {
    Table,
    Id,
    BudgetId,
    UserId,
    AmountMinor,
    Note,
    PersonalEntryId,
    OccurredAt,
}

#[derive(Iden)]
enum BudgetExpenses {
    Table,
    Id,
    BudgetId,
    UserId,
    AmountMinor,
    Category,
    Note,
    OccurredAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Households
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Households::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Households::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Households::Name).string().not_null())
                    .col(ColumnDef::new(Households::ImageRef).string())
                    .col(ColumnDef::new(Households::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Household memberships
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(HouseholdMemberships::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HouseholdMemberships::HouseholdId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HouseholdMemberships::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HouseholdMemberships::Role)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(HouseholdMemberships::HouseholdId)
                            .col(HouseholdMemberships::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-household_memberships-household_id")
                            .from(HouseholdMemberships::Table, HouseholdMemberships::HouseholdId)
                            .to(Households::Table, Households::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-household_memberships-user_id")
                            .from(HouseholdMemberships::Table, HouseholdMemberships::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Monthly budgets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(MonthlyBudgets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MonthlyBudgets::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MonthlyBudgets::HouseholdId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MonthlyBudgets::Month).string().not_null())
                    .col(
                        ColumnDef::new(MonthlyBudgets::TargetMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MonthlyBudgets::Phase).string().not_null())
                    .col(
                        ColumnDef::new(MonthlyBudgets::CreatedBy)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyBudgets::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-monthly_budgets-household_id")
                            .from(MonthlyBudgets::Table, MonthlyBudgets::HouseholdId)
                            .to(Households::Table, Households::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One budget per household and month.
        manager
            .create_index(
                Index::create()
                    .name("idx-monthly_budgets-household_id-month-unique")
                    .table(MonthlyBudgets::Table)
                    .col(MonthlyBudgets::HouseholdId)
                    .col(MonthlyBudgets::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Contribution limits
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ContributionLimits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContributionLimits::BudgetId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContributionLimits::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContributionLimits::LimitMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ContributionLimits::BudgetId)
                            .col(ContributionLimits::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-contribution_limits-budget_id")
                            .from(ContributionLimits::Table, ContributionLimits::BudgetId)
                            .to(MonthlyBudgets::Table, MonthlyBudgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Spending limits
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SpendingLimits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SpendingLimits::BudgetId).string().not_null())
                    .col(ColumnDef::new(SpendingLimits::UserId).string().not_null())
                    .col(
                        ColumnDef::new(SpendingLimits::LimitMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(SpendingLimits::BudgetId)
                            .col(SpendingLimits::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-spending_limits-budget_id")
                            .from(SpendingLimits::Table, SpendingLimits::BudgetId)
                            .to(MonthlyBudgets::Table, MonthlyBudgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Contributions (append-only ledger)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Contributions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contributions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contributions::BudgetId).string().not_null())
                    .col(ColumnDef::new(Contributions::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Contributions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Contributions::Note).string())
                    .col(
                        ColumnDef::new(Contributions::PersonalEntryId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Contributions::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-contributions-budget_id")
                            .from(Contributions::Table, Contributions::BudgetId)
                            .to(MonthlyBudgets::Table, MonthlyBudgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-contributions-budget_id-occurred_at")
                    .table(Contributions::Table)
                    .col(Contributions::BudgetId)
                    .col(Contributions::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Budget expenses (append-only ledger)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BudgetExpenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetExpenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BudgetExpenses::BudgetId).string().not_null())
                    .col(ColumnDef::new(BudgetExpenses::UserId).string().not_null())
                    .col(
                        ColumnDef::new(BudgetExpenses::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BudgetExpenses::Category).string())
                    .col(ColumnDef::new(BudgetExpenses::Note).string())
                    .col(
                        ColumnDef::new(BudgetExpenses::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_expenses-budget_id")
                            .from(BudgetExpenses::Table, BudgetExpenses::BudgetId)
                            .to(MonthlyBudgets::Table, MonthlyBudgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budget_expenses-budget_id-occurred_at")
                    .table(BudgetExpenses::Table)
                    .col(BudgetExpenses::BudgetId)
                    .col(BudgetExpenses::OccurredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Table::drop().table(BudgetExpenses::Table).to_owned(),
            Table::drop().table(Contributions::Table).to_owned(),
            Table::drop().table(SpendingLimits::Table).to_owned(),
            Table::drop().table(ContributionLimits::Table).to_owned(),
            Table::drop().table(MonthlyBudgets::Table).to_owned(),
            Table::drop().table(HouseholdMemberships::Table).to_owned(),
            Table::drop().table(Households::Table).to_owned(),
            Table::drop().table(Users::Table).to_owned(),
        ] {
            manager.drop_table(table).await?;
        }
        Ok(())
    }
}
