//! Offers group menus on content forms.
//!
//! For each content type config object (`node.type.<type>`) being read, the
//! menus of every group the account may place content in are appended to
//! `third_party_settings.menu_ui.available_menus`:
//!
//! 1. Find the group types that install `group_node:<type>` with the
//!    `node_form_group_menu` setting on.
//! 2. Find the `group_menu:menu` relation types of those group types and
//!    their relationships.
//! 3. Keep each related menu that still exists and whose group grants the
//!    account `edit group_menu:menu entity`.
//!
//! A name that yields no menus gets no overlay at all.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::{ConfigOverlay, ConfigOverride};
use crate::error::{GroupMenuError, GroupMenuResult};
use crate::models::{Account, ItemTypeConfig, is_item_type_config};
use crate::permissions::{GroupPermissionChecker, PermissionTable, PermissionToken, RelationAction};
use crate::plugin::GroupMenuPlugin;
use crate::storage::{
    ConfigStore, GroupStorage, MenuStorage, RelationTypeFilter, RelationshipFilter,
};

/// Relation plugin ID prefix for content types related to groups.
const GROUP_NODE_PLUGIN_PREFIX: &str = "group_node:";

/// Memoized lookups of one resolution.
///
/// Create one per [`GroupMenuConfigOverrides::resolve_in`] call and drop it
/// afterwards; nothing in it is invalidated.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    /// Decoded config objects by name (None = missing or malformed).
    configs: HashMap<String, Option<ItemTypeConfig>>,

    /// Opted-in group types by content type.
    group_types: HashMap<String, BTreeSet<String>>,

    /// Permission check results by (group, account).
    permissions: HashMap<(Uuid, Uuid), bool>,

    /// Whether a related menu exists, by menu ID.
    menus: HashMap<String, bool>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Config override that exposes group menus on content forms.
#[derive(Clone)]
pub struct GroupMenuConfigOverrides {
    config: Arc<dyn ConfigStore>,
    groups: Arc<dyn GroupStorage>,
    menus: Arc<dyn MenuStorage>,
    checker: Arc<dyn GroupPermissionChecker>,
    edit_token: PermissionToken,
}

impl GroupMenuConfigOverrides {
    pub const CACHE_SUFFIX: &'static str = "GroupMenuConfigOverrides";

    /// Create the override. Fails if the group menu plugin isn't registered.
    pub fn new(
        config: Arc<dyn ConfigStore>,
        groups: Arc<dyn GroupStorage>,
        menus: Arc<dyn MenuStorage>,
        checker: Arc<dyn GroupPermissionChecker>,
        table: &PermissionTable,
    ) -> GroupMenuResult<Self> {
        let edit_token = table
            .get(GroupMenuPlugin::ID, RelationAction::EditEntity)
            .cloned()
            .ok_or_else(|| GroupMenuError::PluginNotRegistered(GroupMenuPlugin::ID.to_string()))?;

        Ok(Self {
            config,
            groups,
            menus,
            checker,
            edit_token,
        })
    }

    /// Resolve overlays for a batch of config names with a fresh context.
    pub async fn resolve(
        &self,
        names: &[String],
        account: &Account,
    ) -> Result<BTreeMap<String, ConfigOverlay>> {
        let mut ctx = ResolutionContext::new();
        self.resolve_in(&mut ctx, names, account).await
    }

    /// Resolve overlays for a batch of config names.
    ///
    /// Names that aren't content type config objects, don't exist, are
    /// malformed, or yield no menus are absent from the result. Storage
    /// errors abort the batch.
    pub async fn resolve_in(
        &self,
        ctx: &mut ResolutionContext,
        names: &[String],
        account: &Account,
    ) -> Result<BTreeMap<String, ConfigOverlay>> {
        let mut overlays = BTreeMap::new();

        for name in names {
            if !is_item_type_config(name) || overlays.contains_key(name) {
                continue;
            }

            let Some(base) = self.base_config(ctx, name).await? else {
                debug!(config = %name, "no content type config, skipping");
                continue;
            };

            let group_types = self.enabled_group_types(ctx, &base.type_name).await?;
            if group_types.is_empty() {
                debug!(config = %name, "no group type offers menus for this content type");
                continue;
            }

            let menus = self.editable_menus(ctx, &group_types, account).await?;
            if menus.is_empty() {
                debug!(config = %name, account = %account.id, "no editable group menus");
                continue;
            }

            // Keep the stored list as-is and append only menus it lacks
            let mut available_menus = base.available_menus.clone();
            for menu in menus {
                if !available_menus.contains(&menu) {
                    available_menus.push(menu);
                }
            }

            overlays.insert(name.clone(), ConfigOverlay { available_menus });
        }

        Ok(overlays)
    }

    /// Load and decode a content type config object, once per context.
    async fn base_config(
        &self,
        ctx: &mut ResolutionContext,
        name: &str,
    ) -> Result<Option<ItemTypeConfig>> {
        if let Some(config) = ctx.configs.get(name) {
            return Ok(config.clone());
        }

        let config = self
            .config
            .read(name)
            .await?
            .as_ref()
            .and_then(ItemTypeConfig::from_value);
        ctx.configs.insert(name.to_string(), config.clone());

        Ok(config)
    }

    /// Group types that offer their menus on a content type's form.
    async fn enabled_group_types(
        &self,
        ctx: &mut ResolutionContext,
        type_name: &str,
    ) -> Result<BTreeSet<String>> {
        if let Some(group_types) = ctx.group_types.get(type_name) {
            return Ok(group_types.clone());
        }

        let filter =
            RelationTypeFilter::new().with_plugin_id(format!("{GROUP_NODE_PLUGIN_PREFIX}{type_name}"));
        let group_types: BTreeSet<String> = self
            .groups
            .relation_types(&filter)
            .await?
            .into_iter()
            .filter(|rt| rt.settings.node_form_group_menu)
            .map(|rt| rt.group_type)
            .collect();

        ctx.group_types
            .insert(type_name.to_string(), group_types.clone());
        Ok(group_types)
    }

    /// Menus related to groups of the given types that the account may edit,
    /// in relationship order without repeats.
    async fn editable_menus(
        &self,
        ctx: &mut ResolutionContext,
        group_types: &BTreeSet<String>,
        account: &Account,
    ) -> Result<Vec<String>> {
        let filter = RelationTypeFilter::new()
            .with_plugin_id(GroupMenuPlugin::ID)
            .with_group_types(group_types.clone());
        let relation_types: BTreeSet<String> = self
            .groups
            .relation_types(&filter)
            .await?
            .into_iter()
            .map(|rt| rt.id)
            .collect();

        if relation_types.is_empty() {
            return Ok(Vec::new());
        }

        let relationships = self
            .groups
            .relationships(&RelationshipFilter::new().with_relation_types(relation_types))
            .await?;

        let mut menus = Vec::new();
        for relationship in relationships {
            if menus.contains(&relationship.entity_id) {
                continue;
            }
            if self.can_edit(ctx, relationship.group_id, account).await?
                && self.menu_exists(ctx, &relationship.entity_id).await?
            {
                menus.push(relationship.entity_id);
            }
        }

        Ok(menus)
    }

    /// Relationships can outlive their menu; those are skipped.
    async fn menu_exists(&self, ctx: &mut ResolutionContext, menu_id: &str) -> Result<bool> {
        if let Some(exists) = ctx.menus.get(menu_id) {
            return Ok(*exists);
        }

        let exists = self.menus.load_menu(menu_id).await?.is_some();
        if !exists {
            debug!(menu = %menu_id, "relationship points at a missing menu, skipping");
        }
        ctx.menus.insert(menu_id.to_string(), exists);
        Ok(exists)
    }

    async fn can_edit(
        &self,
        ctx: &mut ResolutionContext,
        group_id: Uuid,
        account: &Account,
    ) -> Result<bool> {
        let key = (group_id, account.id);
        if let Some(allowed) = ctx.permissions.get(&key) {
            return Ok(*allowed);
        }

        let allowed = self
            .checker
            .has_permission(group_id, &self.edit_token, account)
            .await?;
        ctx.permissions.insert(key, allowed);
        Ok(allowed)
    }
}

impl std::fmt::Debug for GroupMenuConfigOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupMenuConfigOverrides")
            .field("edit_token", &self.edit_token)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ConfigOverride for GroupMenuConfigOverrides {
    async fn load_overrides(
        &self,
        names: &[String],
        account: &Account,
    ) -> Result<BTreeMap<String, Value>> {
        let overlays = self.resolve(names, account).await?;
        Ok(overlays
            .into_iter()
            .map(|(name, overlay)| (name, overlay.to_value()))
            .collect())
    }

    fn cache_suffix(&self) -> &str {
        Self::CACHE_SUFFIX
    }
}
