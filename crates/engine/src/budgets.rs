//! Monthly budget rows and the two-phase lifecycle.
//!
//! A `MonthlyBudget` is one household's pooled budget for one calendar month.
//! It starts in `Collecting` and moves exactly once to `Spending`; there is
//! no path back, because contributions already made are irrevocable. The
//! target amount is fixed at creation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BudgetMonth, EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPhase {
    Collecting,
    Spending,
}

impl BudgetPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Collecting => "collecting",
            Self::Spending => "spending",
        }
    }
}

impl TryFrom<&str> for BudgetPhase {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "collecting" => Ok(Self::Collecting),
            "spending" => Ok(Self::Spending),
            other => Err(EngineError::WrongPhase(format!(
                "invalid budget phase: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBudget {
    pub id: Uuid,
    pub household_id: String,
    pub month: BudgetMonth,
    pub target_minor: i64,
    pub phase: BudgetPhase,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl MonthlyBudget {
    pub fn new(
        household_id: String,
        month: BudgetMonth,
        target_minor: i64,
        created_by: String,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if target_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "target_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            household_id,
            month,
            target_minor,
            phase: BudgetPhase::Collecting,
            created_by,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "monthly_budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub household_id: String,
    pub month: String,
    pub target_minor: i64,
    pub phase: String,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::households::Entity",
        from = "Column::HouseholdId",
        to = "super::households::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Households,
    #[sea_orm(has_many = "super::contributions::Entity")]
    Contributions,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::households::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Households.def()
    }
}

impl Related<super::contributions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contributions.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&MonthlyBudget> for ActiveModel {
    fn from(value: &MonthlyBudget) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            household_id: ActiveValue::Set(value.household_id.clone()),
            month: ActiveValue::Set(value.month.to_string()),
            target_minor: ActiveValue::Set(value.target_minor),
            phase: ActiveValue::Set(value.phase.as_str().to_string()),
            created_by: ActiveValue::Set(value.created_by.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for MonthlyBudget {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "budget")?,
            household_id: model.household_id,
            month: model.month.parse()?,
            target_minor: model.target_minor,
            phase: BudgetPhase::try_from(model.phase.as_str())?,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}
