//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL. When None, only a snapshot backend is available.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Directory of YAML snapshot files. Takes precedence over the database.
    pub snapshot_dir: Option<PathBuf>,

    /// Page size of the menu overview and group menu lists (default: 50, 0 = no pager).
    pub menu_list_limit: Option<usize>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let snapshot_dir = env::var("SNAPSHOT_DIR")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let menu_list_limit: usize = env::var("MENU_LIST_LIMIT")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .context("MENU_LIST_LIMIT must be a valid usize")?;

        Ok(Self {
            database_url,
            database_max_connections,
            snapshot_dir,
            menu_list_limit: page_limit(menu_list_limit),
        })
    }
}

/// Map a configured page size to a list limit (0 disables paging).
pub fn page_limit(size: usize) -> Option<usize> {
    (size > 0).then_some(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_page_size_disables_paging() {
        assert_eq!(page_limit(0), None);
        assert_eq!(page_limit(50), Some(50));
    }
}
