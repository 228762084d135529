//! Relation types (which plugin a group type has installed) and relationships
//! (an entity placed in a group).

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Per-installation settings of a relation plugin on a group type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationTypeSettings {
    /// How many times an entity may be added to the same group (0 = unlimited).
    #[serde(default)]
    pub group_cardinality: u32,

    /// How many groups an entity may belong to (0 = unlimited).
    #[serde(default)]
    pub entity_cardinality: u32,

    /// Offer this group type's menus on the node form of the related content type.
    #[serde(default, deserialize_with = "truthy")]
    pub node_form_group_menu: bool,
}

/// Accept `true`/`false` as well as the `0`/`1` integers older exports carry.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        serde_json::Value::String(s) => !s.is_empty() && s != "0",
        _ => false,
    })
}

/// A relation plugin installed on a group type (the "relation kind").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRelationType {
    /// Machine name (e.g., "community-group_menu-menu").
    pub id: String,

    /// Group type that installed the plugin.
    pub group_type: String,

    /// Relation plugin ID (e.g., "group_menu:menu", "group_node:article").
    pub plugin_id: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub settings: RelationTypeSettings,
}

/// An entity related to a group through a relation type.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GroupRelationship {
    pub id: Uuid,

    /// Relation type machine name.
    pub relation_type: String,

    /// Owning group.
    pub group_id: Uuid,

    /// ID of the related entity (a menu machine name for group menus).
    pub entity_id: String,

    #[serde(default)]
    pub label: String,

    /// Unix timestamp when created.
    #[serde(default)]
    pub created: i64,
}
