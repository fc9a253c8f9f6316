//! Contribution ledger rows.
//!
//! A `Contribution` is an immutable entry in the append-only ledger: once
//! written it is never edited or deleted. `personal_entry_id` points at the
//! personal-ledger entry it mirrors, kept for traceability and for the
//! compensating rollback when the two stores diverge mid-write.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub user_id: String,
    pub amount_minor: i64,
    pub note: Option<String>,
    pub personal_entry_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

impl Contribution {
    pub fn new(
        budget_id: Uuid,
        user_id: String,
        amount_minor: i64,
        note: Option<String>,
        personal_entry_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            budget_id,
            user_id,
            amount_minor,
            note,
            personal_entry_id,
            occurred_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "contributions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub budget_id: String,
    pub user_id: String,
    pub amount_minor: i64,
    pub note: Option<String>,
    pub personal_entry_id: String,
    pub occurred_at: DateTimeUtc,
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

impl From<&Contribution> for ActiveModel {
    fn from(value: &Contribution) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            budget_id: ActiveValue::Set(value.budget_id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            amount_minor: ActiveValue::Set(value.amount_minor),
            note: ActiveValue::Set(value.note.clone()),
            personal_entry_id: ActiveValue::Set(value.personal_entry_id.to_string()),
            occurred_at: ActiveValue::Set(value.occurred_at),
        }
    }
}

impl TryFrom<Model> for Contribution {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "contribution")?,
            budget_id: parse_uuid(&model.budget_id, "budget")?,
            user_id: model.user_id,
            amount_minor: model.amount_minor,
            note: model.note,
            personal_entry_id: parse_uuid(&model.personal_entry_id, "personal entry")?,
            occurred_at: model.occurred_at,
        })
    }
}
