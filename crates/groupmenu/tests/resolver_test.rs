//! Content form menu override tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{Site, article_site, menu_relation_type, names};
use groupmenu::models::{AVAILABLE_MENUS_POINTER, Account, site_permissions};
use serde_json::json;

#[tokio::test]
async fn editor_of_owning_group_gets_menu() {
    let mut fixture = article_site();
    let editor = fixture.site.editor(fixture.g1, "editor");
    let state = fixture.site.build();

    let result = state
        .overrides()
        .resolve(&names(&["node.type.article"]), &editor)
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result["node.type.article"].available_menus, vec!["main"]);
}

#[tokio::test]
async fn deleted_menu_is_not_offered() {
    let mut fixture = article_site();
    let editor = fixture.site.editor(fixture.g1, "editor");
    // relationship left behind after its menu was deleted
    fixture
        .site
        .attach(fixture.g1, &menu_relation_type("gt1"), "deleted");
    let state = fixture.site.build();

    let result = state
        .overrides()
        .resolve(&names(&["node.type.article"]), &editor)
        .await
        .unwrap();

    assert_eq!(result["node.type.article"].available_menus, vec!["main"]);
}

#[tokio::test]
async fn only_deleted_menus_means_no_entry() {
    let mut site = Site::new();
    site.add_content_type("article", &[]);
    site.add_group_type("gt1");
    site.add_node_plugin("gt1", "article", true);
    site.add_menu_plugin("gt1");
    let g1 = site.add_group("gt1", "g1");
    site.attach(g1, &menu_relation_type("gt1"), "deleted");
    let editor = site.editor(g1, "editor");
    let state = site.build();

    let result = state
        .overrides()
        .resolve(&names(&["node.type.article"]), &editor)
        .await
        .unwrap();

    assert!(result.is_empty());
}

#[tokio::test]
async fn actor_without_permission_gets_no_entry() {
    let mut fixture = article_site();
    let member = fixture.site.member(fixture.g1, "member");
    let outsider = fixture.site.account("outsider", &[]);
    let state = fixture.site.build();

    for account in [member, outsider, Account::anonymous()] {
        let result = state
            .overrides()
            .resolve(&names(&["node.type.article"]), &account)
            .await
            .unwrap();
        assert!(
            !result.contains_key("node.type.article"),
            "{} must not get an overlay",
            account.name
        );
    }
}

#[tokio::test]
async fn names_without_content_types_resolve_to_nothing() {
    let mut fixture = article_site();
    let editor = fixture.site.editor(fixture.g1, "editor");
    let state = fixture.site.build();

    let result = state
        .overrides()
        .resolve(
            &names(&["system.site", "menu_ui.settings", "node.settings"]),
            &editor,
        )
        .await
        .unwrap();
    assert!(result.is_empty());

    let result = state.overrides().resolve(&[], &editor).await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn content_type_without_opted_in_group_type_is_absent() {
    let mut site = Site::new();
    site.add_content_type("article", &[]);
    site.add_content_type("page", &[]);
    site.add_group_type("gt1");
    // Installed for article but with the setting off; not installed for page
    site.add_node_plugin("gt1", "article", false);
    site.add_menu_plugin("gt1");
    let g1 = site.add_group("gt1", "g1");
    site.attach_menu(g1, "main");
    let editor = site.editor(g1, "editor");
    let state = site.build();

    let result = state
        .overrides()
        .resolve(&names(&["node.type.article", "node.type.page"]), &editor)
        .await
        .unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn opted_in_group_type_without_menu_plugin_is_absent() {
    let mut site = Site::new();
    site.add_content_type("article", &[]);
    site.add_group_type("gt1");
    site.add_node_plugin("gt1", "article", true);
    let g1 = site.add_group("gt1", "g1");
    let editor = site.editor(g1, "editor");
    let state = site.build();

    let result = state
        .overrides()
        .resolve(&names(&["node.type.article"]), &editor)
        .await
        .unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn only_menus_of_editable_groups_of_opted_in_types() {
    let mut site = Site::new();
    site.add_content_type("article", &["main"]);
    for group_type in ["club", "team", "archive"] {
        site.add_group_type(group_type);
        site.add_menu_plugin(group_type);
    }
    site.add_node_plugin("club", "article", true);
    site.add_node_plugin("team", "article", true);
    site.add_node_plugin("archive", "article", false);

    let chess = site.add_group("club", "Chess club");
    let rowing = site.add_group("club", "Rowing club");
    let red = site.add_group("team", "Red team");
    let old = site.add_group("archive", "Old stuff");
    site.attach_menu(chess, "chess-menu");
    site.attach_menu(rowing, "rowing-menu");
    site.attach_menu(red, "red-menu");
    site.attach_menu(old, "old-menu");

    let editor = site.editor(chess, "editor");
    let red_role = "team-editor";
    site.join(red, &editor, &[red_role]);
    let old_role = "archive-editor";
    site.join(old, &editor, &[old_role]);
    // Plain member of rowing: no edit permission there
    site.join(rowing, &editor, &[]);
    let state = site.build();

    let result = state
        .overrides()
        .resolve(&names(&["node.type.article"]), &editor)
        .await
        .unwrap();

    assert_eq!(
        result["node.type.article"].available_menus,
        vec!["main", "chess-menu", "red-menu"]
    );
}

#[tokio::test]
async fn menus_are_not_repeated() {
    let mut site = Site::new();
    site.add_content_type("article", &["main", "main"]);
    site.add_group_type("gt1");
    site.add_node_plugin("gt1", "article", true);
    site.add_menu_plugin("gt1");
    let g1 = site.add_group("gt1", "g1");
    let g2 = site.add_group("gt1", "g2");
    site.attach_menu(g1, "main");
    site.attach_menu(g1, "shared");
    site.attach_menu(g2, "shared");
    let editor = site.editor(g1, "editor");
    site.join(g2, &editor, &["gt1-editor"]);
    let state = site.build();

    let result = state
        .overrides()
        .resolve(&names(&["node.type.article"]), &editor)
        .await
        .unwrap();

    // The stored list is kept as-is; only missing menus are appended
    assert_eq!(
        result["node.type.article"].available_menus,
        vec!["main", "main", "shared"]
    );
}

#[tokio::test]
async fn overlay_emitted_when_all_menus_already_offered() {
    let mut site = Site::new();
    site.add_content_type("article", &["main"]);
    site.add_group_type("gt1");
    site.add_node_plugin("gt1", "article", true);
    site.add_menu_plugin("gt1");
    let g1 = site.add_group("gt1", "g1");
    site.attach_menu(g1, "main");
    let editor = site.editor(g1, "editor");
    let state = site.build();

    let result = state
        .overrides()
        .resolve(&names(&["node.type.article"]), &editor)
        .await
        .unwrap();
    assert_eq!(result["node.type.article"].available_menus, vec!["main"]);
}

#[tokio::test]
async fn bypass_account_gets_every_menu_of_opted_in_types() {
    let mut fixture = article_site();
    let g2 = fixture.site.add_group("gt1", "g2");
    fixture.site.attach_menu(g2, "other");
    let bypass = fixture
        .site
        .account("bypass", &[site_permissions::BYPASS_GROUP_ACCESS]);
    let state = fixture.site.build();

    let result = state
        .overrides()
        .resolve(&names(&["node.type.article"]), &bypass)
        .await
        .unwrap();
    assert_eq!(
        result["node.type.article"].available_menus,
        vec!["main", "other"]
    );
}

#[tokio::test]
async fn resolution_is_idempotent() {
    let mut fixture = article_site();
    let editor = fixture.site.editor(fixture.g1, "editor");
    let state = fixture.site.build();

    let batch = names(&["node.type.article", "node.type.page", "system.site"]);
    let first = state.overrides().resolve(&batch, &editor).await.unwrap();
    let second = state.overrides().resolve(&batch, &editor).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn batch_members_do_not_interfere() {
    let mut fixture = article_site();
    fixture.site.add_node_plugin("gt1", "page", true);
    fixture
        .site
        .add_config("node.type.broken", json!({"label": "no type key"}));
    let editor = fixture.site.editor(fixture.g1, "editor");
    let state = fixture.site.build();

    let together = state
        .overrides()
        .resolve(
            &names(&["node.type.broken", "node.type.article", "node.type.page"]),
            &editor,
        )
        .await
        .unwrap();
    let alone = state
        .overrides()
        .resolve(&names(&["node.type.article"]), &editor)
        .await
        .unwrap();

    assert_eq!(together["node.type.article"], alone["node.type.article"]);
    assert_eq!(together["node.type.page"].available_menus, vec!["footer", "main"]);
    assert!(!together.contains_key("node.type.broken"));
}

#[tokio::test]
async fn merged_config_shows_menus_without_touching_storage() {
    let mut fixture = article_site();
    let editor = fixture.site.editor(fixture.g1, "editor");
    let state = fixture.site.build();

    let merged = state
        .config_factory()
        .get("node.type.article", &editor)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(merged.pointer(AVAILABLE_MENUS_POINTER), Some(&json!(["main"])));
    // Sibling settings survive the merge
    assert_eq!(merged.pointer("/third_party_settings/menu_ui/parent"), Some(&json!("main:")));

    let stored = state
        .config_store()
        .read("node.type.article")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.pointer(AVAILABLE_MENUS_POINTER), Some(&json!([])));

    let anonymous = state
        .config_factory()
        .get("node.type.article", &Account::anonymous())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(anonymous, stored);
}
