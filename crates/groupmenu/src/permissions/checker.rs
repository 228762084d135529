//! Role-based group permission checker.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::{GroupPermissionChecker, PermissionToken};
use crate::models::{Account, Group, GroupRole, RoleAudience, site_permissions};
use crate::storage::GroupStorage;

/// Computes group permissions from the roles stored with the group type.
#[derive(Clone)]
pub struct RolePermissionChecker {
    storage: Arc<dyn GroupStorage>,
}

impl RolePermissionChecker {
    pub fn new(storage: Arc<dyn GroupStorage>) -> Self {
        Self { storage }
    }

    /// Load the roles that apply to an account within a group.
    pub async fn applicable_roles(&self, group: &Group, account: &Account) -> Result<Vec<GroupRole>> {
        let roles = self.storage.group_roles(&group.group_type).await?;

        if account.is_anonymous() {
            return Ok(roles
                .into_iter()
                .filter(|r| r.audience == RoleAudience::Anonymous)
                .collect());
        }

        let Some(membership) = group.membership(account.id) else {
            return Ok(roles
                .into_iter()
                .filter(|r| r.audience == RoleAudience::Outsider)
                .collect());
        };

        Ok(roles
            .into_iter()
            .filter(|r| r.audience == RoleAudience::Member || membership.roles.contains(&r.id))
            .collect())
    }
}

impl std::fmt::Debug for RolePermissionChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RolePermissionChecker").finish_non_exhaustive()
    }
}

#[async_trait]
impl GroupPermissionChecker for RolePermissionChecker {
    async fn has_permission(
        &self,
        group_id: Uuid,
        permission: &PermissionToken,
        account: &Account,
    ) -> Result<bool> {
        // Admins and bypass holders skip group roles entirely
        if account.has_permission(site_permissions::BYPASS_GROUP_ACCESS) {
            return Ok(true);
        }

        let Some(group) = self.storage.load_group(group_id).await? else {
            debug!(%group_id, "permission check on missing group");
            return Ok(false);
        };

        let roles = self.applicable_roles(&group, account).await?;
        Ok(roles.iter().any(|r| r.grants(permission.as_str())))
    }
}
