#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`Site`] builds host state in a [`SnapshotStore`] and wires the real
//! services over it with [`AppState::from_snapshot`]. IDs are allocated from
//! a counter so relationship order is deterministic.

#![allow(dead_code)]

use std::collections::BTreeMap;

use serde_json::json;
use uuid::Uuid;

use groupmenu::models::{
    Account, Group, GroupMembership, GroupRelationType, GroupRelationship, GroupRole, GroupType,
    Menu, RelationTypeSettings, RoleAudience, config_name,
};
use groupmenu::state::AppState;
use groupmenu::storage::SnapshotStore;

pub const MENU_PLUGIN: &str = "group_menu:menu";

/// Group permissions held by the `{group_type}-editor` role.
pub const EDITOR_PERMISSIONS: &[&str] = &[
    "edit group_menu:menu entity",
    "view group_menu:menu entity",
    "create group_menu:menu entity",
    "update group_menu:menu entity",
    "delete group_menu:menu entity",
    "update group_menu:menu content",
    "delete group_menu:menu content",
];

/// Builder for test host state.
pub struct Site {
    store: SnapshotStore,
    groups: BTreeMap<Uuid, Group>,
    next_id: u128,
}

impl Default for Site {
    fn default() -> Self {
        Self::new()
    }
}

impl Site {
    pub fn new() -> Self {
        Self {
            store: SnapshotStore::new(),
            groups: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn next_uuid(&mut self) -> Uuid {
        let id = Uuid::from_u128(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a `node.type.<type_name>` config object offering `menus`.
    pub fn add_content_type(&mut self, type_name: &str, menus: &[&str]) {
        self.store.insert_config(
            config_name(type_name),
            json!({
                "type": type_name,
                "name": type_name,
                "third_party_settings": {"menu_ui": {"available_menus": menus, "parent": "main:"}}
            }),
        );
    }

    /// Add a raw config object.
    pub fn add_config(&mut self, name: &str, value: serde_json::Value) {
        self.store.insert_config(name, value);
    }

    /// Add a group type with a `member` role (no permissions) and an
    /// assignable `editor` role holding [`EDITOR_PERMISSIONS`].
    pub fn add_group_type(&mut self, id: &str) {
        self.store.insert_group_type(GroupType {
            id: id.to_string(),
            label: id.to_string(),
            description: None,
        });
        self.store.insert_group_role(GroupRole {
            id: format!("{id}-member"),
            group_type: id.to_string(),
            label: "Member".to_string(),
            audience: RoleAudience::Member,
            admin: false,
            permissions: Default::default(),
        });
        self.store.insert_group_role(GroupRole {
            id: format!("{id}-editor"),
            group_type: id.to_string(),
            label: "Editor".to_string(),
            audience: RoleAudience::Assigned,
            admin: false,
            permissions: EDITOR_PERMISSIONS.iter().map(|p| p.to_string()).collect(),
        });
    }

    /// Install `group_node:<content_type>` on a group type.
    pub fn add_node_plugin(&mut self, group_type: &str, content_type: &str, node_form_group_menu: bool) {
        self.store.insert_relation_type(GroupRelationType {
            id: format!("{group_type}-group_node-{content_type}"),
            group_type: group_type.to_string(),
            plugin_id: format!("group_node:{content_type}"),
            label: String::new(),
            settings: RelationTypeSettings {
                node_form_group_menu,
                ..RelationTypeSettings::default()
            },
        });
    }

    /// Install the group menu plugin on a group type.
    pub fn add_menu_plugin(&mut self, group_type: &str) {
        self.store.insert_relation_type(GroupRelationType {
            id: menu_relation_type(group_type),
            group_type: group_type.to_string(),
            plugin_id: MENU_PLUGIN.to_string(),
            label: "Group menu".to_string(),
            settings: RelationTypeSettings {
                entity_cardinality: 1,
                node_form_group_menu: true,
                ..RelationTypeSettings::default()
            },
        });
    }

    pub fn add_menu(&mut self, id: &str) {
        self.store.insert_menu(Menu {
            id: id.to_string(),
            label: format!("Menu {id}"),
            description: Some(format!("The {id} menu")),
        });
    }

    pub fn add_group(&mut self, group_type: &str, label: &str) -> Uuid {
        let id = self.next_uuid();
        self.groups.insert(
            id,
            Group {
                id,
                group_type: group_type.to_string(),
                label: label.to_string(),
                members: Vec::new(),
            },
        );
        id
    }

    /// Relate a menu (created if needed) to a group.
    pub fn attach_menu(&mut self, group: Uuid, menu: &str) -> Uuid {
        let group_type = self.groups[&group].group_type.clone();
        self.add_menu(menu);
        self.attach(group, &menu_relation_type(&group_type), menu)
    }

    /// Relate an entity to a group through any relation type.
    pub fn attach(&mut self, group: Uuid, relation_type: &str, entity_id: &str) -> Uuid {
        let id = self.next_uuid();
        self.store.insert_relationship(GroupRelationship {
            id,
            relation_type: relation_type.to_string(),
            group_id: group,
            entity_id: entity_id.to_string(),
            label: entity_id.to_string(),
            created: id.as_u128() as i64,
        });
        id
    }

    /// An authenticated account with the given site permissions.
    pub fn account(&mut self, name: &str, permissions: &[&str]) -> Account {
        let account = Account::authenticated(
            self.next_uuid(),
            name,
            permissions.iter().map(|p| p.to_string()).collect(),
        );
        self.store.insert_account(account.clone());
        account
    }

    /// Make an account a member of a group with extra assigned roles.
    pub fn join(&mut self, group: Uuid, account: &Account, roles: &[&str]) {
        let group = self.groups.get_mut(&group).unwrap();
        group.members.push(GroupMembership {
            user_id: account.id,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        });
    }

    /// A new member of `group` holding the editor role.
    pub fn editor(&mut self, group: Uuid, name: &str) -> Account {
        let account = self.account(name, &[]);
        let role = format!("{}-editor", self.groups[&group].group_type);
        self.join(group, &account, &[&role]);
        account
    }

    /// A new member of `group` without extra roles.
    pub fn member(&mut self, group: Uuid, name: &str) -> Account {
        let account = self.account(name, &[]);
        self.join(group, &account, &[]);
        account
    }

    pub fn build(mut self) -> AppState {
        for (_, group) in std::mem::take(&mut self.groups) {
            self.store.insert_group(group);
        }
        AppState::from_snapshot(self.store).unwrap()
    }
}

pub fn menu_relation_type(group_type: &str) -> String {
    format!("{group_type}-group_menu-menu")
}

pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// The `node.type.article` / `gt1` / `g1` / `main` site: `gt1` offers its
/// menus on article forms and `g1` has `main` attached.
pub struct ArticleSite {
    pub site: Site,
    pub g1: Uuid,
}

pub fn article_site() -> ArticleSite {
    let mut site = Site::new();
    site.add_content_type("article", &[]);
    site.add_content_type("page", &["footer"]);
    site.add_group_type("gt1");
    site.add_node_plugin("gt1", "article", true);
    site.add_menu_plugin("gt1");
    let g1 = site.add_group("gt1", "g1");
    site.attach_menu(g1, "main");
    ArticleSite { site, g1 }
}
