//! Relation plugins.
//!
//! A relation plugin lets a group type relate one kind of entity to its
//! groups. Group types install plugins as relation types; see
//! [`crate::models::GroupRelationType`].

mod group_menu;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

pub use group_menu::{GroupMenuAccess, GroupMenuPlugin, menu_relation_type_ids};

use crate::error::{GroupMenuError, GroupMenuResult};
use crate::models::RelationTypeSettings;
use crate::permissions::{PermissionTable, PermissionToken, RelationAction};

/// A permission a plugin exposes, before it is turned into a token.
#[derive(Debug, Clone)]
pub struct PermissionDefinition {
    pub action: RelationAction,
    pub title: String,
    pub description: Option<String>,
}

impl PermissionDefinition {
    pub fn new(action: RelationAction, title: impl Into<String>) -> Self {
        Self {
            action,
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Definition of a relation plugin.
pub trait RelationPlugin: Send + Sync {
    /// Plugin ID (e.g., "group_menu:menu").
    fn id(&self) -> &str;

    fn label(&self) -> &str;

    fn description(&self) -> &str;

    /// Entity type the plugin relates to groups (e.g., "menu").
    fn entity_type(&self) -> &str;

    /// Settings a newly installed relation type starts with.
    fn default_settings(&self) -> RelationTypeSettings {
        RelationTypeSettings::default()
    }

    /// Group permissions this plugin exposes.
    fn permissions(&self) -> Vec<PermissionDefinition>;
}

/// A registered permission, as listed to administrators.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionListing {
    pub plugin_id: String,
    pub permission: PermissionToken,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Registered relation plugins and their permission tokens.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, Arc<dyn RelationPlugin>>,
    permissions: PermissionTable,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the plugins this crate provides.
    pub fn with_defaults() -> GroupMenuResult<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(GroupMenuPlugin))?;
        Ok(registry)
    }

    /// Register a plugin and build its permission tokens.
    pub fn register(&mut self, plugin: Arc<dyn RelationPlugin>) -> GroupMenuResult<()> {
        let id = plugin.id().to_string();
        if self.plugins.contains_key(&id) {
            return Err(GroupMenuError::DuplicatePlugin(id));
        }

        let actions: Vec<RelationAction> = plugin.permissions().iter().map(|p| p.action).collect();
        self.permissions.register(&id, actions);
        debug!(plugin = %id, "registered relation plugin");

        self.plugins.insert(id, plugin);
        Ok(())
    }

    pub fn get(&self, plugin_id: &str) -> Option<&Arc<dyn RelationPlugin>> {
        self.plugins.get(plugin_id)
    }

    /// Iterate over plugins, ordered by ID.
    pub fn plugins(&self) -> impl Iterator<Item = &Arc<dyn RelationPlugin>> {
        self.plugins.values()
    }

    pub fn permission_table(&self) -> &PermissionTable {
        &self.permissions
    }

    /// Every permission of every plugin with its title, ordered by plugin.
    pub fn permission_listing(&self) -> Vec<PermissionListing> {
        let mut listing = Vec::new();
        for (plugin_id, plugin) in &self.plugins {
            for definition in plugin.permissions() {
                let Some(token) = self.permissions.get(plugin_id, definition.action) else {
                    continue;
                };
                listing.push(PermissionListing {
                    plugin_id: plugin_id.clone(),
                    permission: token.clone(),
                    title: definition.title,
                    description: definition.description,
                });
            }
        }
        listing
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .field("permissions", &self.permissions.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    struct NodePlugin;

    impl RelationPlugin for NodePlugin {
        fn id(&self) -> &str {
            "group_node:article"
        }

        fn label(&self) -> &str {
            "Group node (Article)"
        }

        fn description(&self) -> &str {
            "Adds Article content to groups."
        }

        fn entity_type(&self) -> &str {
            "node"
        }

        fn permissions(&self) -> Vec<PermissionDefinition> {
            vec![PermissionDefinition::new(
                RelationAction::ViewEntity,
                "Article: View content",
            )]
        }
    }

    #[test]
    fn defaults_register_group_menu() {
        let registry = PluginRegistry::with_defaults().unwrap();
        assert!(registry.get("group_menu:menu").is_some());
        assert!(
            registry
                .permission_table()
                .get("group_menu:menu", RelationAction::EditEntity)
                .is_some()
        );
    }

    #[test]
    fn duplicate_plugin_is_rejected() {
        let mut registry = PluginRegistry::with_defaults().unwrap();
        let err = registry.register(Arc::new(GroupMenuPlugin)).unwrap_err();
        assert!(matches!(err, GroupMenuError::DuplicatePlugin(id) if id == "group_menu:menu"));
    }

    #[test]
    fn listing_is_ordered_by_plugin() {
        let mut registry = PluginRegistry::with_defaults().unwrap();
        registry.register(Arc::new(NodePlugin)).unwrap();

        let listing = registry.permission_listing();
        assert_eq!(listing.len(), 10);
        assert_eq!(listing[0].plugin_id, "group_menu:menu");
        assert_eq!(listing[9].plugin_id, "group_node:article");
        assert_eq!(listing[9].permission.as_str(), "view group_node:article entity");
        assert_eq!(registry.plugins().count(), 2);
    }
}
