//! Per-member contribution caps for the Collecting phase.
//!
//! The sum of all limits never exceeds the budget target; the creating
//! admin's own limit is always the remainder and is derived, never entered.
//! A stored limit of 0 means "unlimited": the member is uncapped up to the
//! budget target.

use sea_orm::entity::prelude::*;

/// Stored value meaning "no cap for this member".
pub const UNLIMITED: i64 = 0;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "contribution_limits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub budget_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub limit_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::BudgetId",
        to = "super::budgets::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    MonthlyBudgets,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MonthlyBudgets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
