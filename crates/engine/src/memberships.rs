//! Household memberships and the role capability table.
//!
//! Roles form a closed set; every engine action checks a named capability on
//! [`HouseholdRole`] instead of comparing strings at the call site. A
//! household has exactly one admin at any instant while any other member
//! exists; the admin seat moves only through an atomic demote-and-promote
//! (see `Engine::transfer_admin`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseholdRole {
    Admin,
    Member,
    Viewer,
}

impl HouseholdRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }

    /// Add/remove members, rename, dissolve.
    pub fn can_manage_household(self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn can_create_budget(self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn can_transition(self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn can_contribute(self) -> bool {
        matches!(self, Self::Admin | Self::Member)
    }

    pub fn can_spend(self) -> bool {
        matches!(self, Self::Admin | Self::Member)
    }
}

impl TryFrom<&str> for HouseholdRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            "viewer" => Ok(Self::Viewer),
            other => Err(EngineError::InvalidRole(format!(
                "invalid household role: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "household_memberships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub household_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub role: String,
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
}

impl Related<super::households::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Households.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_strings() {
        for role in [
            HouseholdRole::Admin,
            HouseholdRole::Member,
            HouseholdRole::Viewer,
        ] {
            assert_eq!(HouseholdRole::try_from(role.as_str()).unwrap(), role);
        }
        assert!(HouseholdRole::try_from("owner").is_err());
    }

    #[test]
    fn capability_table_matches_roles() {
        assert!(HouseholdRole::Admin.can_create_budget());
        assert!(HouseholdRole::Admin.can_transition());
        assert!(HouseholdRole::Admin.can_contribute());

        assert!(!HouseholdRole::Member.can_create_budget());
        assert!(!HouseholdRole::Member.can_manage_household());
        assert!(HouseholdRole::Member.can_contribute());
        assert!(HouseholdRole::Member.can_spend());

        assert!(!HouseholdRole::Viewer.can_contribute());
        assert!(!HouseholdRole::Viewer.can_spend());
        assert!(!HouseholdRole::Viewer.can_transition());
    }
}
