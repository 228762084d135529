//! Menu record.

use serde::{Deserialize, Serialize};

/// A named menu (e.g., "main", "footer", or a group's own menu).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Menu {
    /// Machine name.
    pub id: String,

    pub label: String,

    #[serde(default)]
    pub description: Option<String>,
}
