//! The group menu relation plugin (`group_menu:menu`).

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use super::{PermissionDefinition, RelationPlugin};
use crate::error::{GroupMenuError, GroupMenuResult};
use crate::list::Operation;
use crate::models::{Account, Group, GroupRelationship, RelationTypeSettings, site_permissions};
use crate::permissions::{
    AccessResult, EntityOperation, GroupPermissionChecker, PermissionTable, PermissionToken,
    RelationAction,
};
use crate::storage::{GroupStorage, RelationTypeFilter, RelationshipFilter};

/// Relates menus to groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupMenuPlugin;

impl GroupMenuPlugin {
    pub const ID: &'static str = "group_menu:menu";
    pub const ENTITY_TYPE: &'static str = "menu";
    pub const LABEL: &'static str = "Group menu";

    /// Key of the "Create menu" group operation.
    pub const CREATE_OPERATION: &'static str = "groupmenu-create";
}

impl RelationPlugin for GroupMenuPlugin {
    fn id(&self) -> &str {
        Self::ID
    }

    fn label(&self) -> &str {
        Self::LABEL
    }

    fn description(&self) -> &str {
        "Adds menus to groups both publicly and privately."
    }

    fn entity_type(&self) -> &str {
        Self::ENTITY_TYPE
    }

    /// Menus belong to at most one group, and their group type's menus are
    /// offered on node forms unless the site builder turns it off.
    fn default_settings(&self) -> RelationTypeSettings {
        RelationTypeSettings {
            group_cardinality: 0,
            entity_cardinality: 1,
            node_form_group_menu: true,
        }
    }

    fn permissions(&self) -> Vec<PermissionDefinition> {
        // Shared prefixes keep the permissions sorted together
        let entity = format!("{} - Entity:", Self::LABEL);
        let relation = format!("{} - Relationship:", Self::LABEL);
        let entity_type = Self::ENTITY_TYPE;

        vec![
            PermissionDefinition::new(
                RelationAction::ViewEntity,
                format!("{entity} View {entity_type} entities"),
            ),
            PermissionDefinition::new(
                RelationAction::CreateEntity,
                format!("{entity} Add {entity_type} entities"),
            )
            .with_description(format!(
                "Allows you to create a new {entity_type} entity and relate it to the group."
            )),
            PermissionDefinition::new(
                RelationAction::UpdateEntity,
                format!("{entity} Edit {entity_type} entities"),
            ),
            PermissionDefinition::new(
                RelationAction::DeleteEntity,
                format!("{entity} Delete {entity_type} entities"),
            ),
            PermissionDefinition::new(
                RelationAction::EditEntity,
                format!("{entity} Use {entity_type} entities on content forms"),
            )
            .with_description(format!(
                "Allows you to place content in the group's {entity_type} entities."
            )),
            PermissionDefinition::new(
                RelationAction::ViewRelation,
                format!("{relation} View entity relations"),
            ),
            PermissionDefinition::new(
                RelationAction::CreateRelation,
                format!("{relation} Add entity relation"),
            )
            .with_description(format!(
                "Allows you to relate an existing {entity_type} entity to the group."
            )),
            PermissionDefinition::new(
                RelationAction::UpdateRelation,
                format!("{relation} Edit entity relations"),
            ),
            PermissionDefinition::new(
                RelationAction::DeleteRelation,
                format!("{relation} Delete entity relations"),
            ),
        ]
    }
}

/// IDs of every relation type that installs the group menu plugin.
pub async fn menu_relation_type_ids(storage: &dyn GroupStorage) -> Result<BTreeSet<String>> {
    let relation_types = storage
        .relation_types(&RelationTypeFilter::new().with_plugin_id(GroupMenuPlugin::ID))
        .await?;

    Ok(relation_types.into_iter().map(|rt| rt.id).collect())
}

/// Access decisions for group menus and their relationships.
#[derive(Clone)]
pub struct GroupMenuAccess {
    storage: Arc<dyn GroupStorage>,
    checker: Arc<dyn GroupPermissionChecker>,
    create_entity: PermissionToken,
    view_entity: PermissionToken,
    update_entity: PermissionToken,
    delete_entity: PermissionToken,
    view_relation: PermissionToken,
    update_relation: PermissionToken,
    delete_relation: PermissionToken,
}

impl GroupMenuAccess {
    /// Create the access handler. Fails if the group menu plugin isn't registered.
    pub fn new(
        storage: Arc<dyn GroupStorage>,
        checker: Arc<dyn GroupPermissionChecker>,
        table: &PermissionTable,
    ) -> GroupMenuResult<Self> {
        let token = |action| {
            table
                .get(GroupMenuPlugin::ID, action)
                .cloned()
                .ok_or_else(|| GroupMenuError::PluginNotRegistered(GroupMenuPlugin::ID.to_string()))
        };

        Ok(Self {
            create_entity: token(RelationAction::CreateEntity)?,
            view_entity: token(RelationAction::ViewEntity)?,
            update_entity: token(RelationAction::UpdateEntity)?,
            delete_entity: token(RelationAction::DeleteEntity)?,
            view_relation: token(RelationAction::ViewRelation)?,
            update_relation: token(RelationAction::UpdateRelation)?,
            delete_relation: token(RelationAction::DeleteRelation)?,
            storage,
            checker,
        })
    }

    /// Operations the plugin adds to a group's operation links.
    pub async fn group_operations(&self, group: &Group, account: &Account) -> Result<Vec<Operation>> {
        let mut operations = Vec::new();

        if self
            .checker
            .has_permission(group.id, &self.create_entity, account)
            .await?
        {
            operations.push(Operation::new(
                GroupMenuPlugin::CREATE_OPERATION,
                "Create menu",
                format!("/group/{}/content/create/{}", group.id, GroupMenuPlugin::ID),
                30,
            ));
        }

        Ok(operations)
    }

    /// Access to a menu relationship itself.
    pub async fn relationship_access(
        &self,
        relationship: &GroupRelationship,
        operation: EntityOperation,
        account: &Account,
    ) -> Result<AccessResult> {
        let token = match operation {
            EntityOperation::View => &self.view_relation,
            EntityOperation::Update => &self.update_relation,
            EntityOperation::Delete => &self.delete_relation,
        };

        let allowed = self
            .checker
            .has_permission(relationship.group_id, token, account)
            .await?;
        Ok(AccessResult::allowed_if(allowed))
    }

    /// Access to a menu.
    ///
    /// `administer menu` covers every menu. Beyond that, a menu related to
    /// groups is accessible through the entity permission of any of its
    /// groups; a menu related to no group gets `Neutral`.
    pub async fn menu_access(
        &self,
        menu_id: &str,
        operation: EntityOperation,
        account: &Account,
    ) -> Result<AccessResult> {
        if account.has_permission(site_permissions::ADMINISTER_MENU) {
            return Ok(AccessResult::Allowed);
        }

        let relation_types = menu_relation_type_ids(self.storage.as_ref()).await?;
        if relation_types.is_empty() {
            return Ok(AccessResult::Neutral);
        }

        let relationships = self
            .storage
            .relationships(
                &RelationshipFilter::new()
                    .with_relation_types(relation_types)
                    .with_entity(menu_id),
            )
            .await?;

        let token = match operation {
            EntityOperation::View => &self.view_entity,
            EntityOperation::Update => &self.update_entity,
            EntityOperation::Delete => &self.delete_entity,
        };

        let groups: BTreeSet<_> = relationships.iter().map(|r| r.group_id).collect();
        for group_id in groups {
            if self.checker.has_permission(group_id, token, account).await? {
                return Ok(AccessResult::Allowed);
            }
        }

        debug!(menu = %menu_id, ?operation, "no group grants menu access");
        Ok(AccessResult::Neutral)
    }
}

impl std::fmt::Debug for GroupMenuAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupMenuAccess").finish_non_exhaustive()
    }
}
