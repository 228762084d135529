//! PostgreSQL implementation of the storage traits.
//!
//! Reads the tables created by `migrations/0001_group_menu.sql`. Every query
//! is read-only; the host CMS owns writes.

use std::collections::{BTreeSet, HashSet};

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::{
    ConfigStore, GroupStorage, MenuStorage, Page, RelationTypeFilter, RelationshipFilter,
};
use crate::models::{
    Group, GroupMembership, GroupRelationType, GroupRelationship, GroupRole, Menu,
    RelationTypeSettings, RoleAudience,
};

/// Database-backed host state.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new PgStore with a database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore").field("pool", &"PgPool").finish()
    }
}

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: Uuid,
    group_type: String,
    label: String,
}

#[derive(sqlx::FromRow)]
struct MembershipRow {
    user_id: Uuid,
    roles: Json<Vec<String>>,
}

#[derive(sqlx::FromRow)]
struct GroupRoleRow {
    id: String,
    group_type: String,
    label: String,
    audience: String,
    admin: bool,
    permissions: Json<BTreeSet<String>>,
}

impl TryFrom<GroupRoleRow> for GroupRole {
    type Error = anyhow::Error;

    fn try_from(row: GroupRoleRow) -> Result<Self> {
        let audience = RoleAudience::parse(&row.audience).with_context(|| {
            format!("group role '{}' has unknown audience '{}'", row.id, row.audience)
        })?;

        Ok(Self {
            id: row.id,
            group_type: row.group_type,
            label: row.label,
            audience,
            admin: row.admin,
            permissions: row.permissions.0,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RelationTypeRow {
    id: String,
    group_type: String,
    plugin_id: String,
    label: String,
    settings: Json<RelationTypeSettings>,
}

impl From<RelationTypeRow> for GroupRelationType {
    fn from(row: RelationTypeRow) -> Self {
        Self {
            id: row.id,
            group_type: row.group_type,
            plugin_id: row.plugin_id,
            label: row.label,
            settings: row.settings.0,
        }
    }
}

/// Convert an optional ID set into a bindable array.
fn as_array(ids: Option<&BTreeSet<String>>) -> Option<Vec<String>> {
    ids.map(|ids| ids.iter().cloned().collect())
}

/// Convert a page into bindable `LIMIT` (NULL = no limit) and `OFFSET` values.
fn as_limit_offset(page: Page) -> (Option<i64>, i64) {
    let to_i64 = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
    (page.size.map(to_i64), to_i64(page.offset()))
}

#[async_trait]
impl ConfigStore for PgStore {
    async fn read(&self, name: &str) -> Result<Option<serde_json::Value>> {
        let data: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT data FROM config WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .context("failed to read config object")?;

        Ok(data)
    }

    async fn list_names(&self, prefix: &str) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM config WHERE starts_with(name, $1) ORDER BY name",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await
        .context("failed to list config names")?;

        Ok(names)
    }
}

#[async_trait]
impl GroupStorage for PgStore {
    async fn load_group(&self, id: Uuid) -> Result<Option<Group>> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT id, group_type, label FROM groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch group")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let members = sqlx::query_as::<_, MembershipRow>(
            "SELECT user_id, roles FROM group_membership WHERE group_id = $1 ORDER BY user_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch group memberships")?;

        Ok(Some(Group {
            id: row.id,
            group_type: row.group_type,
            label: row.label,
            members: members
                .into_iter()
                .map(|m| GroupMembership {
                    user_id: m.user_id,
                    roles: m.roles.0,
                })
                .collect(),
        }))
    }

    async fn group_roles(&self, group_type: &str) -> Result<Vec<GroupRole>> {
        let rows = sqlx::query_as::<_, GroupRoleRow>(
            r#"
            SELECT id, group_type, label, audience, admin, permissions
            FROM group_role
            WHERE group_type = $1
            ORDER BY id
            "#,
        )
        .bind(group_type)
        .fetch_all(&self.pool)
        .await
        .context("failed to list group roles")?;

        rows.into_iter().map(GroupRole::try_from).collect()
    }

    async fn relation_types(&self, filter: &RelationTypeFilter) -> Result<Vec<GroupRelationType>> {
        let rows = sqlx::query_as::<_, RelationTypeRow>(
            r#"
            SELECT id, group_type, plugin_id, label, settings
            FROM group_relation_type
            WHERE ($1::text IS NULL OR plugin_id = $1)
                AND ($2::text[] IS NULL OR group_type = ANY($2))
            ORDER BY id
            "#,
        )
        .bind(filter.plugin_id.as_deref())
        .bind(as_array(filter.group_types.as_ref()))
        .fetch_all(&self.pool)
        .await
        .context("failed to list group relation types")?;

        Ok(rows.into_iter().map(GroupRelationType::from).collect())
    }

    async fn relationships(&self, filter: &RelationshipFilter) -> Result<Vec<GroupRelationship>> {
        let (limit, offset) = as_limit_offset(filter.page);
        let relationships = sqlx::query_as::<_, GroupRelationship>(
            r#"
            SELECT id, relation_type, group_id, entity_id, label, created
            FROM group_relationship
            WHERE ($1::text[] IS NULL OR relation_type = ANY($1))
                AND ($2::uuid IS NULL OR group_id = $2)
                AND ($3::text IS NULL OR entity_id = $3)
            ORDER BY id
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(as_array(filter.relation_types.as_ref()))
        .bind(filter.group_id)
        .bind(filter.entity_id.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("failed to list group relationships")?;

        Ok(relationships)
    }
}

#[async_trait]
impl MenuStorage for PgStore {
    async fn load_menu(&self, id: &str) -> Result<Option<Menu>> {
        let menu = sqlx::query_as::<_, Menu>("SELECT id, label, description FROM menu WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch menu")?;

        Ok(menu)
    }

    async fn list_menu_ids(&self, exclude: &BTreeSet<String>, page: Page) -> Result<Vec<String>> {
        let exclude: Vec<String> = exclude.iter().cloned().collect();
        let (limit, offset) = as_limit_offset(page);

        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM menu WHERE id <> ALL($1) ORDER BY id LIMIT $2 OFFSET $3",
        )
        .bind(&exclude)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("failed to list menus")?;

        Ok(ids)
    }
}

/// Check that the tables this store reads exist.
pub async fn missing_tables(pool: &PgPool) -> Result<Vec<String>> {
    const TABLES: &[&str] = &[
        "config",
        "group_type",
        "group_role",
        "groups",
        "group_membership",
        "group_relation_type",
        "group_relationship",
        "menu",
    ];

    let present: Vec<String> = sqlx::query_scalar(
        "SELECT table_name::text FROM information_schema.tables WHERE table_schema = current_schema()",
    )
    .fetch_all(pool)
    .await
    .context("failed to list tables")?;
    let present: HashSet<String> = present.into_iter().collect();

    Ok(TABLES
        .iter()
        .filter(|t| !present.contains(**t))
        .map(|t| t.to_string())
        .collect())
}
