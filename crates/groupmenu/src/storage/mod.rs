//! Read access to host state.
//!
//! Everything this module knows about the host goes through three small
//! traits:
//!
//! - [`ConfigStore`] - raw config objects keyed by name (e.g. `node.type.article`)
//! - [`GroupStorage`] - groups, group roles, relation types, relationships
//! - [`MenuStorage`] - menus
//!
//! Two backends implement all three: [`SnapshotStore`] (a directory of YAML
//! files loaded into memory) and [`PgStore`] (PostgreSQL).
//!
//! # Usage
//!
//! ```ignore
//! let store = SnapshotStore::load_dir(Path::new("./site")).await?;
//! let article = store.read("node.type.article").await?;
//! let menu_types = store
//!     .relation_types(&RelationTypeFilter::new().with_plugin_id("group_menu:menu"))
//!     .await?;
//! ```

mod postgres;
pub mod snapshot;

use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub use postgres::{PgStore, missing_tables};
pub use snapshot::SnapshotStore;

use crate::models::{Group, GroupRelationType, GroupRelationship, GroupRole, Menu};

/// Raw config object storage.
///
/// Returns the stored object as-is; overrides are never applied here.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read a config object by name. Returns `None` if it doesn't exist.
    async fn read(&self, name: &str) -> Result<Option<serde_json::Value>>;

    /// List config object names starting with `prefix`, sorted.
    async fn list_names(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Filter for relation type queries.
///
/// Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct RelationTypeFilter {
    /// Match a single relation plugin ID.
    pub plugin_id: Option<String>,

    /// Match relation types installed on any of these group types.
    pub group_types: Option<BTreeSet<String>>,
}

impl RelationTypeFilter {
    /// Create a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by relation plugin ID.
    pub fn with_plugin_id(mut self, plugin_id: impl Into<String>) -> Self {
        self.plugin_id = Some(plugin_id.into());
        self
    }

    /// Filter by owning group type.
    pub fn with_group_types(mut self, group_types: BTreeSet<String>) -> Self {
        self.group_types = Some(group_types);
        self
    }

    /// Check a relation type against this filter.
    pub fn matches(&self, relation_type: &GroupRelationType) -> bool {
        self.plugin_id
            .as_deref()
            .is_none_or(|p| p == relation_type.plugin_id)
            && self
                .group_types
                .as_ref()
                .is_none_or(|types| types.contains(&relation_type.group_type))
    }
}

/// One page of a result set ordered by ID.
///
/// The default page holds everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    /// Items per page. None = no pager.
    pub size: Option<usize>,

    /// Zero-based page number. Ignored without a page size.
    pub number: usize,
}

impl Page {
    /// Page `number` of pages holding `size` items.
    pub fn new(size: Option<usize>, number: usize) -> Self {
        Self { size, number }
    }

    /// Number of items before this page.
    pub fn offset(&self) -> usize {
        self.size.map_or(0, |size| size.saturating_mul(self.number))
    }

    /// Cut this page out of an ordered sequence.
    pub fn slice<T>(&self, items: impl Iterator<Item = T>) -> Vec<T> {
        let items = items.skip(self.offset());
        match self.size {
            Some(size) => items.take(size).collect(),
            None => items.collect(),
        }
    }
}

/// Filter for relationship queries.
///
/// Unset fields match everything. Results are ordered by relationship ID.
#[derive(Debug, Clone, Default)]
pub struct RelationshipFilter {
    /// Match relationships of any of these relation types.
    pub relation_types: Option<BTreeSet<String>>,

    /// Match relationships owned by this group.
    pub group_id: Option<Uuid>,

    /// Match relationships pointing at this entity.
    pub entity_id: Option<String>,

    /// Which page of the matching relationships to return.
    pub page: Page,
}

impl RelationshipFilter {
    /// Create a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by relation type.
    pub fn with_relation_types(mut self, relation_types: BTreeSet<String>) -> Self {
        self.relation_types = Some(relation_types);
        self
    }

    /// Filter by owning group.
    pub fn with_group(mut self, group_id: Uuid) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Filter by related entity.
    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Return one page of results.
    pub fn with_page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }

    /// Check a relationship against this filter (ignores `page`).
    pub fn matches(&self, relationship: &GroupRelationship) -> bool {
        self.relation_types
            .as_ref()
            .is_none_or(|types| types.contains(&relationship.relation_type))
            && self.group_id.is_none_or(|g| g == relationship.group_id)
            && self
                .entity_id
                .as_deref()
                .is_none_or(|e| e == relationship.entity_id)
    }
}

/// Group data storage.
#[async_trait]
pub trait GroupStorage: Send + Sync {
    /// Load a group (with its memberships) by ID.
    async fn load_group(&self, id: Uuid) -> Result<Option<Group>>;

    /// List the roles defined on a group type.
    async fn group_roles(&self, group_type: &str) -> Result<Vec<GroupRole>>;

    /// List relation types matching a filter, ordered by ID.
    async fn relation_types(&self, filter: &RelationTypeFilter) -> Result<Vec<GroupRelationType>>;

    /// List relationships matching a filter, ordered by ID.
    async fn relationships(&self, filter: &RelationshipFilter) -> Result<Vec<GroupRelationship>>;
}

/// Menu storage.
#[async_trait]
pub trait MenuStorage: Send + Sync {
    /// Load a menu by ID.
    async fn load_menu(&self, id: &str) -> Result<Option<Menu>>;

    /// List one page of menu IDs not in `exclude`, sorted by ID.
    async fn list_menu_ids(&self, exclude: &BTreeSet<String>, page: Page) -> Result<Vec<String>>;
}

/// Entity kinds understood by the snapshot loader and the database schema.
pub mod entity_kinds {
    /// Group type definitions.
    pub const GROUP_TYPE: &str = "group_type";

    /// Group role definitions.
    pub const GROUP_ROLE: &str = "group_role";

    /// Groups with their memberships.
    pub const GROUP: &str = "group";

    /// Relation plugins installed on group types.
    pub const GROUP_RELATION_TYPE: &str = "group_relation_type";

    /// Entities related to groups.
    pub const GROUP_RELATIONSHIP: &str = "group_relationship";

    /// Menus.
    pub const MENU: &str = "menu";

    /// Accounts (snapshot only; the host owns user storage).
    pub const ACCOUNT: &str = "account";
}
