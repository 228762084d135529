//! In-memory host state loaded from a directory of YAML files.
//!
//! One file per record. File naming: `{kind}.{id}.yml` for the entity kinds
//! in [`entity_kinds`], e.g. `group_type.community.yml` or
//! `group.019483a7-b1c2-7def-8012-abcdef123456.yml`. Any other YAML file is a
//! raw config object named after its file stem, e.g. `node.type.article.yml`.
//!
//! Loading never fails on a bad file: unreadable, oversized, unparsable, or
//! duplicate files are skipped and recorded as warnings.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    ConfigStore, GroupStorage, MenuStorage, Page, RelationTypeFilter, RelationshipFilter,
    entity_kinds,
};
use crate::models::{
    Account, Group, GroupRelationType, GroupRelationship, GroupRole, GroupType, Menu,
};

/// Maximum snapshot file size (10 MB). Larger files are skipped.
const MAX_SNAPSHOT_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Entity kinds recognised in file names.
const KNOWN_KINDS: &[&str] = &[
    entity_kinds::GROUP_TYPE,
    entity_kinds::GROUP_ROLE,
    entity_kinds::GROUP,
    entity_kinds::GROUP_RELATION_TYPE,
    entity_kinds::GROUP_RELATIONSHIP,
    entity_kinds::MENU,
    entity_kinds::ACCOUNT,
];

/// What a snapshot file holds, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnapshotFile<'a> {
    Entity { kind: &'a str, id: &'a str },
    Config { name: &'a str },
}

/// Classify a snapshot file name. Returns `None` for non-YAML files.
fn parse_snapshot_filename(filename: &str) -> Option<SnapshotFile<'_>> {
    let stem = filename
        .strip_suffix(".yml")
        .or_else(|| filename.strip_suffix(".yaml"))?;

    if stem.is_empty() {
        return None;
    }

    if let Some((kind, id)) = stem.split_once('.')
        && KNOWN_KINDS.contains(&kind)
    {
        if id.is_empty() {
            return None;
        }
        return Some(SnapshotFile::Entity { kind, id });
    }

    Some(SnapshotFile::Config { name: stem })
}

/// Host state held in memory.
#[derive(Debug, Default, Clone)]
pub struct SnapshotStore {
    config: BTreeMap<String, Value>,
    group_types: BTreeMap<String, GroupType>,
    group_roles: BTreeMap<String, GroupRole>,
    groups: BTreeMap<Uuid, Group>,
    relation_types: BTreeMap<String, GroupRelationType>,
    relationships: BTreeMap<Uuid, GroupRelationship>,
    menus: BTreeMap<String, Menu>,
    accounts: BTreeMap<Uuid, Account>,
    warnings: Vec<String>,
}

impl SnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every snapshot file in `dir`.
    pub async fn load_dir(dir: &Path) -> Result<Self> {
        let mut store = Self::new();
        let mut files = Vec::new();

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("failed to read snapshot directory {}", dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            let Some(os_name) = path.file_name() else {
                continue;
            };
            let filename = match os_name.to_str() {
                Some(n) if !n.starts_with('.') && (n.ends_with(".yml") || n.ends_with(".yaml")) => {
                    n.to_string()
                }
                Some(_) => continue,
                None => {
                    store.warnings.push(format!(
                        "skipping file with non-UTF-8 name: {}",
                        path.display()
                    ));
                    continue;
                }
            };

            // Symlinks could point outside the snapshot directory
            let metadata = match tokio::fs::symlink_metadata(&path).await {
                Ok(m) => m,
                Err(e) => {
                    store
                        .warnings
                        .push(format!("failed to read metadata for {filename}: {e}"));
                    continue;
                }
            };
            if metadata.file_type().is_symlink() {
                store.warnings.push(format!("skipping symlink: {filename}"));
                continue;
            }
            if metadata.len() > MAX_SNAPSHOT_FILE_SIZE {
                store.warnings.push(format!(
                    "skipping {filename}: file size {} bytes exceeds limit of {MAX_SNAPSHOT_FILE_SIZE} bytes",
                    metadata.len()
                ));
                continue;
            }

            files.push((filename, path));
        }

        files.sort();

        for (filename, path) in files {
            let Some(file) = parse_snapshot_filename(&filename) else {
                store
                    .warnings
                    .push(format!("skipping unrecognized file: {filename}"));
                continue;
            };

            let content = match tokio::fs::read_to_string(&path).await {
                Ok(c) => c,
                Err(e) => {
                    store
                        .warnings
                        .push(format!("failed to read {}: {e}", path.display()));
                    continue;
                }
            };

            if let Err(e) = store.insert_yaml(file, &filename, &content) {
                store
                    .warnings
                    .push(format!("failed to parse {filename}: {e:#}"));
            }
        }

        store.check_references();

        for warning in &store.warnings {
            warn!(dir = %dir.display(), "{warning}");
        }
        info!(
            dir = %dir.display(),
            config = store.config.len(),
            groups = store.groups.len(),
            relationships = store.relationships.len(),
            menus = store.menus.len(),
            "snapshot loaded"
        );

        Ok(store)
    }

    /// Warnings collected while loading.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Look up an account by UUID or by name.
    pub fn find_account(&self, key: &str) -> Option<&Account> {
        if let Ok(id) = key.parse::<Uuid>() {
            return self.accounts.get(&id);
        }
        self.accounts.values().find(|a| a.name == key)
    }

    pub fn insert_config(&mut self, name: impl Into<String>, value: Value) {
        self.config.insert(name.into(), value);
    }

    pub fn insert_group_type(&mut self, group_type: GroupType) {
        self.group_types.insert(group_type.id.clone(), group_type);
    }

    pub fn insert_group_role(&mut self, role: GroupRole) {
        self.group_roles.insert(role.id.clone(), role);
    }

    pub fn insert_group(&mut self, group: Group) {
        self.groups.insert(group.id, group);
    }

    pub fn insert_relation_type(&mut self, relation_type: GroupRelationType) {
        self.relation_types
            .insert(relation_type.id.clone(), relation_type);
    }

    pub fn insert_relationship(&mut self, relationship: GroupRelationship) {
        self.relationships.insert(relationship.id, relationship);
    }

    pub fn insert_menu(&mut self, menu: Menu) {
        self.menus.insert(menu.id.clone(), menu);
    }

    pub fn insert_account(&mut self, account: Account) {
        self.accounts.insert(account.id, account);
    }

    /// Parse one file's content and add it, keeping the first record per ID.
    fn insert_yaml(&mut self, file: SnapshotFile<'_>, filename: &str, content: &str) -> Result<()> {
        let warnings = &mut self.warnings;

        match file {
            SnapshotFile::Config { name } => {
                let value: Value =
                    serde_yml::from_str(content).context("invalid config object YAML")?;
                insert_first(&mut self.config, name.to_string(), value, filename, warnings);
            }
            SnapshotFile::Entity { kind, id } => match kind {
                entity_kinds::GROUP_TYPE => {
                    let record: GroupType =
                        serde_yml::from_str(content).context("invalid group_type YAML")?;
                    check_id(filename, id, &record.id, warnings);
                    insert_first(&mut self.group_types, record.id.clone(), record, filename, warnings);
                }
                entity_kinds::GROUP_ROLE => {
                    let record: GroupRole =
                        serde_yml::from_str(content).context("invalid group_role YAML")?;
                    check_id(filename, id, &record.id, warnings);
                    insert_first(&mut self.group_roles, record.id.clone(), record, filename, warnings);
                }
                entity_kinds::GROUP => {
                    let record: Group =
                        serde_yml::from_str(content).context("invalid group YAML")?;
                    check_id(filename, id, &record.id, warnings);
                    insert_first(&mut self.groups, record.id, record, filename, warnings);
                }
                entity_kinds::GROUP_RELATION_TYPE => {
                    let record: GroupRelationType = serde_yml::from_str(content)
                        .context("invalid group_relation_type YAML")?;
                    check_id(filename, id, &record.id, warnings);
                    insert_first(
                        &mut self.relation_types,
                        record.id.clone(),
                        record,
                        filename,
                        warnings,
                    );
                }
                entity_kinds::GROUP_RELATIONSHIP => {
                    let record: GroupRelationship = serde_yml::from_str(content)
                        .context("invalid group_relationship YAML")?;
                    check_id(filename, id, &record.id, warnings);
                    insert_first(&mut self.relationships, record.id, record, filename, warnings);
                }
                entity_kinds::MENU => {
                    let record: Menu = serde_yml::from_str(content).context("invalid menu YAML")?;
                    check_id(filename, id, &record.id, warnings);
                    insert_first(&mut self.menus, record.id.clone(), record, filename, warnings);
                }
                entity_kinds::ACCOUNT => {
                    let record: Account =
                        serde_yml::from_str(content).context("invalid account YAML")?;
                    check_id(filename, id, &record.id, warnings);
                    insert_first(&mut self.accounts, record.id, record, filename, warnings);
                }
                other => anyhow::bail!("unknown entity kind '{other}'"),
            },
        }

        Ok(())
    }

    /// Record dangling references between loaded records as warnings.
    fn check_references(&mut self) {
        let mut warnings = Vec::new();

        for role in self.group_roles.values() {
            if !self.group_types.contains_key(&role.group_type) {
                warnings.push(format!(
                    "group_role '{}' references unknown group type '{}'",
                    role.id, role.group_type
                ));
            }
        }

        for group in self.groups.values() {
            if !self.group_types.contains_key(&group.group_type) {
                warnings.push(format!(
                    "group '{}' references unknown group type '{}'",
                    group.id, group.group_type
                ));
            }
            for member in &group.members {
                for role in &member.roles {
                    if !self.group_roles.contains_key(role) {
                        warnings.push(format!(
                            "group '{}' assigns unknown role '{role}' to {}",
                            group.id, member.user_id
                        ));
                    }
                }
            }
        }

        for relation_type in self.relation_types.values() {
            if !self.group_types.contains_key(&relation_type.group_type) {
                warnings.push(format!(
                    "group_relation_type '{}' references unknown group type '{}'",
                    relation_type.id, relation_type.group_type
                ));
            }
        }

        for relationship in self.relationships.values() {
            if !self.groups.contains_key(&relationship.group_id) {
                warnings.push(format!(
                    "group_relationship '{}' references unknown group '{}'",
                    relationship.id, relationship.group_id
                ));
            }
            if !self.relation_types.contains_key(&relationship.relation_type) {
                warnings.push(format!(
                    "group_relationship '{}' references unknown relation type '{}'",
                    relationship.id, relationship.relation_type
                ));
            }
        }

        self.warnings.extend(warnings);
    }
}

/// Warn when the ID in a file name disagrees with the ID inside the file.
fn check_id(filename: &str, filename_id: &str, content_id: impl Display, warnings: &mut Vec<String>) {
    let content_id = content_id.to_string();
    if content_id != filename_id {
        warnings.push(format!(
            "{filename}: filename ID '{filename_id}' does not match content ID '{content_id}'"
        ));
    }
}

/// Insert unless the key is taken; a second record with the same ID is skipped.
fn insert_first<K: Ord + Display, V>(
    map: &mut BTreeMap<K, V>,
    key: K,
    value: V,
    filename: &str,
    warnings: &mut Vec<String>,
) {
    if map.contains_key(&key) {
        warnings.push(format!("{filename}: duplicate record with ID '{key}' (skipped)"));
    } else {
        map.insert(key, value);
    }
}

#[async_trait]
impl ConfigStore for SnapshotStore {
    async fn read(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.config.get(name).cloned())
    }

    async fn list_names(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .config
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl GroupStorage for SnapshotStore {
    async fn load_group(&self, id: Uuid) -> Result<Option<Group>> {
        Ok(self.groups.get(&id).cloned())
    }

    async fn group_roles(&self, group_type: &str) -> Result<Vec<GroupRole>> {
        Ok(self
            .group_roles
            .values()
            .filter(|role| role.group_type == group_type)
            .cloned()
            .collect())
    }

    async fn relation_types(&self, filter: &RelationTypeFilter) -> Result<Vec<GroupRelationType>> {
        Ok(self
            .relation_types
            .values()
            .filter(|rt| filter.matches(rt))
            .cloned()
            .collect())
    }

    async fn relationships(&self, filter: &RelationshipFilter) -> Result<Vec<GroupRelationship>> {
        let matching = self
            .relationships
            .values()
            .filter(|r| filter.matches(r))
            .cloned();

        Ok(filter.page.slice(matching))
    }
}

#[async_trait]
impl MenuStorage for SnapshotStore {
    async fn load_menu(&self, id: &str) -> Result<Option<Menu>> {
        Ok(self.menus.get(id).cloned())
    }

    async fn list_menu_ids(&self, exclude: &BTreeSet<String>, page: Page) -> Result<Vec<String>> {
        let ids = self.menus.keys().filter(|id| !exclude.contains(*id)).cloned();

        Ok(page.slice(ids))
    }
}
