//! Relation permission tokens.
//!
//! Every relation plugin exposes the same family of permissions, named
//! `"{operation} {plugin_id} {scope}"`, e.g. `update group_menu:menu entity`
//! or `delete group_menu:menu content`. Tokens are built once per plugin when
//! it is registered and looked up from a [`PermissionTable`] afterwards.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// An operation a group permission can grant on a relation plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationAction {
    /// View related entities.
    ViewEntity,
    /// Create an entity and relate it to the group.
    CreateEntity,
    /// Update related entities.
    UpdateEntity,
    /// Delete related entities.
    DeleteEntity,
    /// Pick related entities on other entities' forms (menus on the node form).
    EditEntity,
    /// View relationships.
    ViewRelation,
    /// Relate an existing entity to the group.
    CreateRelation,
    /// Update relationships.
    UpdateRelation,
    /// Delete relationships.
    DeleteRelation,
}

impl RelationAction {
    /// Every action, in permission listing order.
    pub const ALL: [RelationAction; 9] = [
        Self::ViewEntity,
        Self::CreateEntity,
        Self::UpdateEntity,
        Self::DeleteEntity,
        Self::EditEntity,
        Self::ViewRelation,
        Self::CreateRelation,
        Self::UpdateRelation,
        Self::DeleteRelation,
    ];

    /// Verb part of the permission name.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::ViewEntity | Self::ViewRelation => "view",
            Self::CreateEntity | Self::CreateRelation => "create",
            Self::UpdateEntity | Self::UpdateRelation => "update",
            Self::DeleteEntity | Self::DeleteRelation => "delete",
            Self::EditEntity => "edit",
        }
    }

    /// Scope part of the permission name: the entity itself or the relationship.
    pub fn scope(&self) -> &'static str {
        match self {
            Self::ViewEntity
            | Self::CreateEntity
            | Self::UpdateEntity
            | Self::DeleteEntity
            | Self::EditEntity => "entity",
            Self::ViewRelation
            | Self::CreateRelation
            | Self::UpdateRelation
            | Self::DeleteRelation => "content",
        }
    }

    /// Build the permission token for a plugin.
    pub fn token_for(&self, plugin_id: &str) -> PermissionToken {
        PermissionToken(format!("{} {plugin_id} {}", self.operation(), self.scope()))
    }
}

/// A group permission name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PermissionToken(String);

impl PermissionToken {
    /// Wrap a permission name that is not derived from a relation plugin.
    pub fn new(permission: impl Into<String>) -> Self {
        Self(permission.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PermissionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Permission tokens of every registered relation plugin.
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    tokens: BTreeMap<(String, RelationAction), PermissionToken>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and store the tokens of a plugin for the given actions.
    pub fn register(&mut self, plugin_id: &str, actions: impl IntoIterator<Item = RelationAction>) {
        for action in actions {
            self.tokens
                .insert((plugin_id.to_string(), action), action.token_for(plugin_id));
        }
    }

    /// Look up a token. Returns `None` if the plugin doesn't expose the action.
    pub fn get(&self, plugin_id: &str, action: RelationAction) -> Option<&PermissionToken> {
        self.tokens.get(&(plugin_id.to_string(), action))
    }

    /// Check whether any token of a plugin is registered.
    pub fn has_plugin(&self, plugin_id: &str) -> bool {
        self.tokens.keys().any(|(id, _)| id == plugin_id)
    }

    /// Iterate over `(plugin_id, action, token)`, ordered by plugin then action.
    pub fn iter(&self) -> impl Iterator<Item = (&str, RelationAction, &PermissionToken)> {
        self.tokens
            .iter()
            .map(|((plugin_id, action), token)| (plugin_id.as_str(), *action, token))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
