//! Group permission checking.
//!
//! Group permissions are held by group roles. Which roles apply to an
//! account depends on its relation to the group:
//!
//! - anonymous visitors get the group type's `anonymous` roles
//! - authenticated non-members get its `outsider` roles
//! - members get its `member` roles plus the roles assigned to them
//!
//! Site admins and accounts with `bypass group access` hold every group
//! permission.

mod checker;
mod token;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub use checker::RolePermissionChecker;
pub use token::{PermissionTable, PermissionToken, RelationAction};

use crate::models::Account;

/// Answers "does this account hold this permission in this group?".
#[async_trait]
pub trait GroupPermissionChecker: Send + Sync {
    /// Check a group permission. A group that doesn't exist grants nothing.
    async fn has_permission(
        &self,
        group_id: Uuid,
        permission: &PermissionToken,
        account: &Account,
    ) -> Result<bool>;
}

/// Outcome of an access check.
///
/// `Neutral` means this check has no opinion; callers fall back to their
/// own default (usually deny).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessResult {
    Allowed,
    Neutral,
}

impl AccessResult {
    /// `Allowed` if the condition holds, `Neutral` otherwise.
    pub fn allowed_if(condition: bool) -> Self {
        if condition {
            Self::Allowed
        } else {
            Self::Neutral
        }
    }

    pub fn is_allowed(&self) -> bool {
        *self == Self::Allowed
    }
}

/// Operations checked against individual entities and relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityOperation {
    View,
    Update,
    Delete,
}
