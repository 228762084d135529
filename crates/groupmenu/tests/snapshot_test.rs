//! End-to-end tests over the demo snapshot in `demos/site`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;

use groupmenu::list::{ContentListProvider, MenuListProvider};
use groupmenu::models::Account;
use groupmenu::state::AppState;
use groupmenu::storage::SnapshotStore;

fn demo_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/site")
}

async fn demo_state() -> AppState {
    let store = SnapshotStore::load_dir(&demo_dir()).await.unwrap();
    assert!(
        store.warnings().is_empty(),
        "demo snapshot has warnings: {:?}",
        store.warnings()
    );
    AppState::from_snapshot(store).unwrap()
}

#[tokio::test]
async fn menu_editor_gets_club_menu_on_articles_only() {
    let state = demo_state().await;
    let alice = state.account(Some("alice"), &[], false).unwrap();

    let names = state
        .config_store()
        .list_names(groupmenu::models::CONFIG_PREFIX)
        .await
        .unwrap();
    assert_eq!(names, vec!["node.type.article", "node.type.page"]);

    let result = state.overrides().resolve(&names, &alice).await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(
        result["node.type.article"].available_menus,
        vec!["main", "gardening"]
    );
}

#[tokio::test]
async fn plain_member_gets_nothing() {
    let state = demo_state().await;
    let bob = state.account(Some("bob"), &[], false).unwrap();

    let result = state
        .overrides()
        .resolve(&["node.type.article".to_string()], &bob)
        .await
        .unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn overview_hides_club_menu() {
    let state = demo_state().await;

    let ids = MenuListProvider::new(
        state.groups().clone(),
        state.menus().clone(),
        Account::anonymous(),
    )
    .entity_ids()
    .await
    .unwrap();
    assert_eq!(ids, vec!["footer", "main"]);
}
