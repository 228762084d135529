//! Admin entity lists.
//!
//! A [`ContentListProvider`] supplies the IDs, columns, and operation links
//! of one list; [`ContentListProvider::render`] assembles them into a
//! [`ListTable`]. Columns are keyed so a provider can drop columns it
//! inherits from a more general list.

mod group_menu;
mod menu;

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

pub use group_menu::GroupMenuContentListProvider;
pub use menu::MenuListProvider;

/// Keyed cells of a header or row, in display order.
pub type Cells = Vec<(&'static str, String)>;

/// Key of the operations column.
pub const OPERATIONS_COLUMN: &str = "operations";

/// An operation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub key: String,
    pub title: String,
    pub url: String,
    pub weight: i32,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
}

impl Operation {
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        weight: i32,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            url: url.into(),
            weight,
            query: BTreeMap::new(),
        }
    }

    /// Add a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// The URL with its query string, percent-encoded.
    pub fn href(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }

        let query: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("{}?{}", self.url, query.join("&"))
    }
}

/// Sort operations by weight, then key.
pub fn sort_operations(operations: &mut [Operation]) {
    operations.sort_by(|a, b| a.weight.cmp(&b.weight).then_with(|| a.key.cmp(&b.key)));
}

/// Remove columns by key.
pub fn drop_columns(cells: &mut Cells, keys: &[&str]) {
    cells.retain(|(key, _)| !keys.contains(key));
}

/// One rendered row.
#[derive(Debug, Clone, Serialize)]
pub struct ListRow {
    pub id: String,
    pub cells: Cells,
    pub operations: Vec<Operation>,
}

/// A rendered list.
#[derive(Debug, Clone, Serialize)]
pub struct ListTable {
    pub header: Cells,
    pub rows: Vec<ListRow>,
    /// Shown instead of rows when the list is empty.
    pub empty: String,
}

impl ListTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Supplies one admin list.
#[async_trait]
pub trait ContentListProvider: Send + Sync {
    type Id: ToString + Send + Sync;
    type Entity: Send + Sync;

    /// IDs of the entities to list, in display order.
    async fn entity_ids(&self) -> Result<Vec<Self::Id>>;

    /// Load entities, preserving the order of `ids`. Missing ones are skipped.
    async fn load(&self, ids: &[Self::Id]) -> Result<Vec<Self::Entity>>;

    fn entity_id(&self, entity: &Self::Entity) -> Self::Id;

    fn header(&self) -> Cells;

    fn row(&self, entity: &Self::Entity) -> Cells;

    /// Operation links for an entity, in any order.
    async fn operations(&self, entity: &Self::Entity) -> Result<Vec<Operation>>;

    fn empty_text(&self) -> String {
        "There are no items yet.".to_string()
    }

    async fn render(&self) -> Result<ListTable> {
        let ids = self.entity_ids().await?;
        let entities = self.load(&ids).await?;

        let mut rows = Vec::with_capacity(entities.len());
        for entity in &entities {
            let mut operations = self.operations(entity).await?;
            sort_operations(&mut operations);
            rows.push(ListRow {
                id: self.entity_id(entity).to_string(),
                cells: self.row(entity),
                operations,
            });
        }

        Ok(ListTable {
            header: self.header(),
            rows,
            empty: self.empty_text(),
        })
    }
}
