//! Role lookups and `require_*` guards shared by the ops modules.

use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, HouseholdRole, MonthlyBudget, PersonalLedger, ResultEngine, budgets, households,
    memberships, users,
};

use super::Engine;

impl<P: PersonalLedger> Engine<P> {
    pub(super) async fn find_household(
        &self,
        db: &DatabaseTransaction,
        household_id: &str,
    ) -> ResultEngine<Option<households::Model>> {
        households::Entity::find_by_id(household_id.to_string())
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn membership_role(
        &self,
        db: &DatabaseTransaction,
        household_id: &str,
        user_id: &str,
    ) -> ResultEngine<Option<HouseholdRole>> {
        let row = memberships::Entity::find_by_id((household_id.to_string(), user_id.to_string()))
            .one(db)
            .await?;
        row.as_ref()
            .map(|m| HouseholdRole::try_from(m.role.as_str()))
            .transpose()
    }

    /// Household lookup for a caller with any role. Non-members get the same
    /// `KeyNotFound` as a missing household, so membership is not probeable.
    pub(super) async fn require_household_read(
        &self,
        db: &DatabaseTransaction,
        household_id: &str,
        user_id: &str,
    ) -> ResultEngine<households::Model> {
        let model = self
            .find_household(db, household_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("household not exists".to_string()))?;
        if self
            .membership_role(db, household_id, user_id)
            .await?
            .is_none()
        {
            return Err(EngineError::KeyNotFound("household not exists".to_string()));
        }
        Ok(model)
    }

    /// Household lookup plus the caller's role in it.
    pub(super) async fn require_membership(
        &self,
        db: &DatabaseTransaction,
        household_id: &str,
        user_id: &str,
    ) -> ResultEngine<(households::Model, HouseholdRole)> {
        let model = self
            .find_household(db, household_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("household not exists".to_string()))?;
        let role = self
            .membership_role(db, household_id, user_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("household not exists".to_string()))?;
        Ok((model, role))
    }

    pub(super) async fn require_admin(
        &self,
        db: &DatabaseTransaction,
        household_id: &str,
        user_id: &str,
    ) -> ResultEngine<households::Model> {
        let (model, role) = self.require_membership(db, household_id, user_id).await?;
        if !role.can_manage_household() {
            return Err(EngineError::NotAdmin(format!(
                "{user_id} is not the household admin"
            )));
        }
        Ok(model)
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<()> {
        let exists = users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .is_some();
        if !exists {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }
        Ok(())
    }

    pub(super) async fn require_budget(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
    ) -> ResultEngine<MonthlyBudget> {
        let model = budgets::Entity::find_by_id(budget_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("budget not exists".to_string()))?;
        MonthlyBudget::try_from(model)
    }

    pub(super) async fn find_budget_for_month(
        &self,
        db: &DatabaseTransaction,
        household_id: &str,
        month: &str,
    ) -> ResultEngine<Option<MonthlyBudget>> {
        let model = budgets::Entity::find()
            .filter(budgets::Column::HouseholdId.eq(household_id.to_string()))
            .filter(budgets::Column::Month.eq(month.to_string()))
            .one(db)
            .await?;
        model.map(MonthlyBudget::try_from).transpose()
    }
}
