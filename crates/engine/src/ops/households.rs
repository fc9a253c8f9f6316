//! Household administration: creation, membership changes, the single-admin
//! invariant and dissolution.

use chrono::Utc;
use sea_orm::{ActiveValue, PaginatorTrait, QueryFilter, Statement, TransactionTrait, prelude::*};

use crate::{
    EngineError, Household, HouseholdRole, PersonalLedger, ResultEngine, households, memberships,
    util::{normalize_optional_text, normalize_required_name},
};

use super::{Engine, with_tx};

impl<P: PersonalLedger> Engine<P> {
    /// Creates a household; the creator becomes its admin.
    pub async fn new_household(
        &self,
        name: &str,
        image_ref: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<String> {
        let name = normalize_required_name(name, "household")?;
        let household = Household::new(name, normalize_optional_text(image_ref), Utc::now());
        let household_id = household.id.clone();
        let household_model: households::ActiveModel = (&household).into();

        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;
            household_model.insert(&db_tx).await?;

            let admin = memberships::ActiveModel {
                household_id: ActiveValue::Set(household_id.clone()),
                user_id: ActiveValue::Set(user_id.to_string()),
                role: ActiveValue::Set(HouseholdRole::Admin.as_str().to_string()),
            };
            admin.insert(&db_tx).await?;

            Ok(household_id)
        })
    }

    /// Renames a household (admin-only).
    pub async fn rename_household(
        &self,
        household_id: &str,
        name: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        let name = normalize_required_name(name, "household")?;
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, household_id, user_id).await?;
            let model = households::ActiveModel {
                id: ActiveValue::Set(household_id.to_string()),
                name: ActiveValue::Set(name),
                ..Default::default()
            };
            model.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Sets or clears the household image reference (admin-only). The image
    /// bytes live in an external object store; the engine only keeps the key.
    pub async fn set_household_image(
        &self,
        household_id: &str,
        image_ref: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, household_id, user_id).await?;
            let model = households::ActiveModel {
                id: ActiveValue::Set(household_id.to_string()),
                image_ref: ActiveValue::Set(normalize_optional_text(image_ref)),
                ..Default::default()
            };
            model.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Adds a member or viewer (admin-only).
    ///
    /// The admin role is never granted here: a household has exactly one
    /// admin, and the seat moves only through [`transfer_admin`].
    ///
    /// [`transfer_admin`]: Engine::transfer_admin
    pub async fn add_member(
        &self,
        household_id: &str,
        member_username: &str,
        role: HouseholdRole,
        user_id: &str,
    ) -> ResultEngine<()> {
        if role == HouseholdRole::Admin {
            return Err(EngineError::InvalidRole(
                "cannot add a second admin; use transfer_admin".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, household_id, user_id).await?;
            self.require_user_exists(&db_tx, member_username).await?;

            if self
                .membership_role(&db_tx, household_id, member_username)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(member_username.to_string()));
            }

            let membership = memberships::ActiveModel {
                household_id: ActiveValue::Set(household_id.to_string()),
                user_id: ActiveValue::Set(member_username.to_string()),
                role: ActiveValue::Set(role.as_str().to_string()),
            };
            membership.insert(&db_tx).await?;
            Ok(())
        })
    }

    /// Switches an existing member between member and viewer (admin-only).
    pub async fn update_member_role(
        &self,
        household_id: &str,
        member_username: &str,
        role: HouseholdRole,
        user_id: &str,
    ) -> ResultEngine<()> {
        if role == HouseholdRole::Admin {
            return Err(EngineError::InvalidRole(
                "cannot promote to admin; use transfer_admin".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, household_id, user_id).await?;

            let current = self
                .membership_role(&db_tx, household_id, member_username)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("membership not exists".to_string()))?;
            if current == HouseholdRole::Admin {
                return Err(EngineError::InvalidRole(
                    "cannot demote the admin; transfer the role first".to_string(),
                ));
            }

            let membership = memberships::ActiveModel {
                household_id: ActiveValue::Set(household_id.to_string()),
                user_id: ActiveValue::Set(member_username.to_string()),
                role: ActiveValue::Set(role.as_str().to_string()),
            };
            membership.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Removes a member (admin-only). The admin seat cannot be vacated this
    /// way; ledger rows written by the departed member remain untouched.
    pub async fn remove_member(
        &self,
        household_id: &str,
        member_username: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, household_id, user_id).await?;

            let current = self
                .membership_role(&db_tx, household_id, member_username)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("membership not exists".to_string()))?;
            if current == HouseholdRole::Admin {
                return Err(EngineError::InvalidRole(
                    "cannot remove the admin; transfer the role first".to_string(),
                ));
            }

            memberships::Entity::delete_by_id((
                household_id.to_string(),
                member_username.to_string(),
            ))
            .exec(&db_tx)
            .await?;
            Ok(())
        })
    }

    /// Moves the admin seat to another member as one atomic
    /// demote-and-promote, so there is never zero or two admins.
    pub async fn transfer_admin(
        &self,
        household_id: &str,
        new_admin_username: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        if new_admin_username == user_id {
            return Err(EngineError::InvalidRole(
                "already the household admin".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, household_id, user_id).await?;
            self.membership_role(&db_tx, household_id, new_admin_username)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("membership not exists".to_string()))?;

            let demoted = memberships::ActiveModel {
                household_id: ActiveValue::Set(household_id.to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                role: ActiveValue::Set(HouseholdRole::Member.as_str().to_string()),
            };
            demoted.update(&db_tx).await?;

            let promoted = memberships::ActiveModel {
                household_id: ActiveValue::Set(household_id.to_string()),
                user_id: ActiveValue::Set(new_admin_username.to_string()),
                role: ActiveValue::Set(HouseholdRole::Admin.as_str().to_string()),
            };
            promoted.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Dissolves a household. Allowed only while the admin is the sole
    /// member, so no one else's pooled history disappears under them.
    pub async fn delete_household(&self, household_id: &str, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, household_id, user_id).await?;

            let member_count = memberships::Entity::find()
                .filter(memberships::Column::HouseholdId.eq(household_id.to_string()))
                .count(&db_tx)
                .await?;
            if member_count > 1 {
                return Err(EngineError::HouseholdNotEmpty(household_id.to_string()));
            }

            // Explicit cascade within one DB transaction; not every
            // relationship is FK-backed with ON DELETE CASCADE.
            let backend = self.database.get_database_backend();
            for sql in [
                "DELETE FROM contributions WHERE budget_id IN (SELECT id FROM monthly_budgets WHERE household_id = ?);",
                "DELETE FROM budget_expenses WHERE budget_id IN (SELECT id FROM monthly_budgets WHERE household_id = ?);",
                "DELETE FROM contribution_limits WHERE budget_id IN (SELECT id FROM monthly_budgets WHERE household_id = ?);",
                "DELETE FROM spending_limits WHERE budget_id IN (SELECT id FROM monthly_budgets WHERE household_id = ?);",
                "DELETE FROM monthly_budgets WHERE household_id = ?;",
                "DELETE FROM household_memberships WHERE household_id = ?;",
                "DELETE FROM households WHERE id = ?;",
            ] {
                db_tx
                    .execute(Statement::from_sql_and_values(
                        backend,
                        sql,
                        vec![household_id.into()],
                    ))
                    .await?;
            }

            Ok(())
        })
    }

    /// Lists memberships of a household (any member may look).
    pub async fn list_members(
        &self,
        household_id: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<(String, HouseholdRole)>> {
        with_tx!(self, |db_tx| {
            self.require_household_read(&db_tx, household_id, user_id)
                .await?;

            let rows = memberships::Entity::find()
                .filter(memberships::Column::HouseholdId.eq(household_id.to_string()))
                .all(&db_tx)
                .await?;
            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                out.push((row.user_id, HouseholdRole::try_from(row.role.as_str())?));
            }
            Ok(out)
        })
    }

    /// Returns a household visible to the caller.
    pub async fn household(&self, household_id: &str, user_id: &str) -> ResultEngine<Household> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_household_read(&db_tx, household_id, user_id)
                .await?;
            Ok(Household::from(model))
        })
    }
}
