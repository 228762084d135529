//! Menus related to one group.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use super::{Cells, ContentListProvider, OPERATIONS_COLUMN, Operation, drop_columns};
use crate::models::{Account, Group, GroupRelationship};
use crate::permissions::EntityOperation;
use crate::plugin::{GroupMenuAccess, GroupMenuPlugin, menu_relation_type_ids};
use crate::storage::{GroupStorage, Page, RelationshipFilter};

/// Columns of the general relationship list this list doesn't show.
const HIDDEN_COLUMNS: &[&str] = &["entity_type", "plugin"];

/// Lists a group's menu relationships with their operations.
#[derive(Clone)]
pub struct GroupMenuContentListProvider {
    storage: Arc<dyn GroupStorage>,
    access: GroupMenuAccess,
    group: Group,
    account: Account,
    page: Page,
    destination: String,
}

impl GroupMenuContentListProvider {
    pub fn new(
        storage: Arc<dyn GroupStorage>,
        access: GroupMenuAccess,
        group: Group,
        account: Account,
    ) -> Self {
        let destination = format!("/group/{}/menus", group.id);
        Self {
            storage,
            access,
            group,
            account,
            page: Page::default(),
            destination,
        }
    }

    /// Show at most `limit` relationships per page (None = all).
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.page.size = limit;
        self
    }

    /// Show the zero-based page `number`.
    pub fn with_page(mut self, number: usize) -> Self {
        self.page.number = number;
        self
    }

    /// Where relation operations return to when done.
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Relationships of this group, restricted to group menu relation types
    /// when any are installed.
    async fn filter(&self) -> Result<RelationshipFilter> {
        let filter = RelationshipFilter::new().with_group(self.group.id);
        let relation_types = menu_relation_type_ids(self.storage.as_ref()).await?;
        if relation_types.is_empty() {
            return Ok(filter);
        }
        Ok(filter.with_relation_types(relation_types))
    }
}

/// Header of the general group relationship list.
fn relationship_header() -> Cells {
    vec![
        ("id", "ID".to_string()),
        ("label", "Content label".to_string()),
        ("entity_type", "Entity type".to_string()),
        ("plugin", "Plugin used".to_string()),
        (OPERATIONS_COLUMN, "Operations".to_string()),
    ]
}

/// Row of the general group relationship list.
fn relationship_row(relationship: &GroupRelationship) -> Cells {
    vec![
        ("id", relationship.id.to_string()),
        ("label", relationship.label.clone()),
        ("entity_type", GroupMenuPlugin::ENTITY_TYPE.to_string()),
        ("plugin", GroupMenuPlugin::LABEL.to_string()),
    ]
}

#[async_trait]
impl ContentListProvider for GroupMenuContentListProvider {
    type Id = Uuid;
    type Entity = GroupRelationship;

    /// Without any group menu relation type installed every relationship of
    /// the group is listed.
    async fn entity_ids(&self) -> Result<Vec<Uuid>> {
        let filter = self.filter().await?.with_page(self.page);
        let relationships = self.storage.relationships(&filter).await?;
        Ok(relationships.into_iter().map(|r| r.id).collect())
    }

    async fn load(&self, ids: &[Uuid]) -> Result<Vec<GroupRelationship>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let relationships = self.storage.relationships(&self.filter().await?).await?;

        Ok(ids
            .iter()
            .filter_map(|id| relationships.iter().find(|r| r.id == *id).cloned())
            .collect())
    }

    fn entity_id(&self, relationship: &GroupRelationship) -> Uuid {
        relationship.id
    }

    fn header(&self) -> Cells {
        let mut header = relationship_header();
        drop_columns(&mut header, HIDDEN_COLUMNS);
        header
    }

    fn row(&self, relationship: &GroupRelationship) -> Cells {
        let mut row = relationship_row(relationship);
        drop_columns(&mut row, HIDDEN_COLUMNS);
        row
    }

    async fn operations(&self, relationship: &GroupRelationship) -> Result<Vec<Operation>> {
        let mut operations = Vec::new();
        let base = format!("/group/{}/content/{}", relationship.group_id, relationship.id);

        if self
            .access
            .relationship_access(relationship, EntityOperation::Update, &self.account)
            .await?
            .is_allowed()
        {
            operations.push(Operation::new("edit", "Edit relation", format!("{base}/edit"), 10));
        }
        if self
            .access
            .relationship_access(relationship, EntityOperation::Delete, &self.account)
            .await?
            .is_allowed()
        {
            operations.push(Operation::new(
                "delete",
                "Delete relation",
                format!("{base}/delete"),
                100,
            ));
        }

        // Relation operations return to this list
        let mut operations: Vec<Operation> = operations
            .into_iter()
            .map(|op| op.with_query("destination", self.destination.clone()))
            .collect();

        let menu_url = format!("/admin/structure/menu/manage/{}", relationship.entity_id);
        if self
            .access
            .menu_access(&relationship.entity_id, EntityOperation::Update, &self.account)
            .await?
            .is_allowed()
        {
            operations.push(Operation::new(
                "view-entity",
                "View related entity",
                menu_url.clone(),
                101,
            ));
            operations.push(Operation::new(
                "edit-entity",
                "Edit related entity",
                menu_url.clone(),
                102,
            ));
        }
        if self
            .access
            .menu_access(&relationship.entity_id, EntityOperation::Delete, &self.account)
            .await?
            .is_allowed()
        {
            operations.push(Operation::new(
                "delete-entity",
                "Delete related entity",
                format!("{menu_url}/delete"),
                103,
            ));
        }

        Ok(operations)
    }

    fn empty_text(&self) -> String {
        "There are no menus related to this group yet.".to_string()
    }
}

impl std::fmt::Debug for GroupMenuContentListProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupMenuContentListProvider")
            .field("group", &self.group.id)
            .field("page", &self.page)
            .finish_non_exhaustive()
    }
}
