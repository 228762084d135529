//! The acting user.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Anonymous account UUID (nil UUID).
pub const ANONYMOUS_ACCOUNT_ID: Uuid = Uuid::nil();

/// Site-wide permission names this module checks outside of groups.
pub mod site_permissions {
    /// Manage every menu, including menus that are not attached to a group.
    pub const ADMINISTER_MENU: &str = "administer menu";

    /// Skip group permission checks entirely.
    pub const BYPASS_GROUP_ACCESS: &str = "bypass group access";
}

/// The account a request acts on behalf of.
///
/// Site permissions are carried on the account; group permissions are
/// computed per group by a [`crate::permissions::GroupPermissionChecker`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "default_true")]
    pub authenticated: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Account {
    /// The anonymous account.
    pub fn anonymous() -> Self {
        Self {
            id: ANONYMOUS_ACCOUNT_ID,
            name: "anonymous".to_string(),
            authenticated: false,
            is_admin: false,
            permissions: Vec::new(),
        }
    }

    /// An authenticated account with the given site permissions.
    pub fn authenticated(id: Uuid, name: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            id,
            name: name.into(),
            authenticated: true,
            is_admin: false,
            permissions,
        }
    }

    /// Check if this is the anonymous account.
    pub fn is_anonymous(&self) -> bool {
        !self.authenticated || self.id == ANONYMOUS_ACCOUNT_ID
    }

    /// Check a site-wide permission. Admins have all of them.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_admin || self.permissions.iter().any(|p| p == permission)
    }
}
