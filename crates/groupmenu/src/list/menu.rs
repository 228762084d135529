//! Menu overview that leaves out group menus.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::{Cells, ContentListProvider, OPERATIONS_COLUMN, Operation};
use crate::models::{Account, Menu, site_permissions};
use crate::plugin::menu_relation_type_ids;
use crate::storage::{GroupStorage, MenuStorage, Page, RelationshipFilter};

/// Lists every menu that isn't related to a group.
#[derive(Clone)]
pub struct MenuListProvider {
    groups: Arc<dyn GroupStorage>,
    menus: Arc<dyn MenuStorage>,
    account: Account,
    page: Page,
}

impl MenuListProvider {
    pub fn new(groups: Arc<dyn GroupStorage>, menus: Arc<dyn MenuStorage>, account: Account) -> Self {
        Self {
            groups,
            menus,
            account,
            page: Page::default(),
        }
    }

    /// Show at most `limit` menus per page (None = all).
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.page.size = limit;
        self
    }

    /// Show the zero-based page `number`.
    pub fn with_page(mut self, number: usize) -> Self {
        self.page.number = number;
        self
    }

    /// Menus related to any group, or None without a group menu relation type.
    pub async fn group_menu_ids(&self) -> Result<Option<BTreeSet<String>>> {
        let relation_types = menu_relation_type_ids(self.groups.as_ref()).await?;
        if relation_types.is_empty() {
            return Ok(None);
        }

        let relationships = self
            .groups
            .relationships(&RelationshipFilter::new().with_relation_types(relation_types))
            .await?;

        Ok(Some(relationships.into_iter().map(|r| r.entity_id).collect()))
    }
}

#[async_trait]
impl ContentListProvider for MenuListProvider {
    type Id = String;
    type Entity = Menu;

    /// Without any group menu relation type installed the overview is empty.
    async fn entity_ids(&self) -> Result<Vec<String>> {
        let Some(exclude) = self.group_menu_ids().await? else {
            return Ok(Vec::new());
        };
        self.menus.list_menu_ids(&exclude, self.page).await
    }

    async fn load(&self, ids: &[String]) -> Result<Vec<Menu>> {
        let mut menus = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(menu) = self.menus.load_menu(id).await? {
                menus.push(menu);
            }
        }
        Ok(menus)
    }

    fn entity_id(&self, menu: &Menu) -> String {
        menu.id.clone()
    }

    fn header(&self) -> Cells {
        vec![
            ("title", "Title".to_string()),
            ("description", "Description".to_string()),
            (OPERATIONS_COLUMN, "Operations".to_string()),
        ]
    }

    fn row(&self, menu: &Menu) -> Cells {
        vec![
            ("title", menu.label.clone()),
            ("description", menu.description.clone().unwrap_or_default()),
        ]
    }

    async fn operations(&self, menu: &Menu) -> Result<Vec<Operation>> {
        if !self.account.has_permission(site_permissions::ADMINISTER_MENU) {
            return Ok(Vec::new());
        }

        let url = format!("/admin/structure/menu/manage/{}", menu.id);
        Ok(vec![
            Operation::new("edit", "Edit menu", url.clone(), 10),
            Operation::new("delete", "Delete", format!("{url}/delete"), 100),
        ])
    }

    fn empty_text(&self) -> String {
        "There are no menus yet.".to_string()
    }
}

impl std::fmt::Debug for MenuListProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuListProvider")
            .field("account", &self.account.name)
            .field("page", &self.page)
            .finish_non_exhaustive()
    }
}
