//! Group, group type, group role, and membership records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Group type: the template that decides which relation plugins a group may use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupType {
    /// Machine name (e.g., "community").
    pub id: String,

    /// Human-readable label.
    pub label: String,

    /// Description for admin UI.
    #[serde(default)]
    pub description: Option<String>,
}

/// Which accounts a group role applies to without being assigned explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleAudience {
    /// Unauthenticated visitors.
    Anonymous,
    /// Authenticated accounts that are not members of the group.
    Outsider,
    /// Every member of the group.
    Member,
    /// Only members the role was assigned to.
    Assigned,
}

impl RoleAudience {
    /// Database / config representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Outsider => "outsider",
            Self::Member => "member",
            Self::Assigned => "assigned",
        }
    }

    /// Parse the database / config representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "anonymous" => Some(Self::Anonymous),
            "outsider" => Some(Self::Outsider),
            "member" => Some(Self::Member),
            "assigned" => Some(Self::Assigned),
            _ => None,
        }
    }
}

/// A role defined on a group type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRole {
    /// Machine name, unique across group types (e.g., "community-editor").
    pub id: String,

    /// Group type this role belongs to.
    pub group_type: String,

    pub label: String,

    pub audience: RoleAudience,

    /// Admin roles hold every group permission.
    #[serde(default)]
    pub admin: bool,

    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl GroupRole {
    /// Check whether this role grants a permission.
    pub fn grants(&self, permission: &str) -> bool {
        self.admin || self.permissions.contains(permission)
    }
}

/// A member of a group and the roles explicitly assigned to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMembership {
    pub user_id: Uuid,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// A group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,

    /// Group type machine name.
    pub group_type: String,

    pub label: String,

    #[serde(default)]
    pub members: Vec<GroupMembership>,
}

impl Group {
    /// Find the membership record for an account, if it is a member.
    pub fn membership(&self, user_id: Uuid) -> Option<&GroupMembership> {
        self.members.iter().find(|m| m.user_id == user_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn audience_round_trip_through_str() {
        for audience in [
            RoleAudience::Anonymous,
            RoleAudience::Outsider,
            RoleAudience::Member,
            RoleAudience::Assigned,
        ] {
            assert_eq!(RoleAudience::parse(audience.as_str()), Some(audience));
        }
        assert_eq!(RoleAudience::parse("insider"), None);
    }

    #[test]
    fn admin_role_grants_anything() {
        let role = GroupRole {
            id: "community-admin".to_string(),
            group_type: "community".to_string(),
            label: "Admin".to_string(),
            audience: RoleAudience::Assigned,
            admin: true,
            permissions: BTreeSet::new(),
        };
        assert!(role.grants("edit group_menu:menu entity"));
    }

    #[test]
    fn group_role_yaml_defaults() {
        let yaml = "id: community-member\ngroup_type: community\nlabel: Member\naudience: member\n";
        let role: GroupRole = serde_yml::from_str(yaml).unwrap();
        assert!(!role.admin);
        assert!(role.permissions.is_empty());
        assert_eq!(role.audience, RoleAudience::Member);
    }

    #[test]
    fn membership_lookup() {
        let user = Uuid::now_v7();
        let group = Group {
            id: Uuid::now_v7(),
            group_type: "community".to_string(),
            label: "Gardeners".to_string(),
            members: vec![GroupMembership {
                user_id: user,
                roles: vec!["community-editor".to_string()],
            }],
        };
        assert!(group.membership(user).is_some());
        assert!(group.membership(Uuid::now_v7()).is_none());
    }
}
