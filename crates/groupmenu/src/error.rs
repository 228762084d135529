//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by this module's services.
///
/// Storage failures are not part of this enum; they travel as `anyhow::Error`
/// with context attached by the backend.
#[derive(Debug, Error)]
pub enum GroupMenuError {
    #[error("group not found: {0}")]
    GroupNotFound(Uuid),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("relation plugin already registered: {0}")]
    DuplicatePlugin(String),

    #[error("relation plugin not registered: {0}")]
    PluginNotRegistered(String),

    #[error("no backend configured: set SNAPSHOT_DIR or DATABASE_URL")]
    NoBackend,

    #[error("database schema incomplete, missing tables: {}", .0.join(", "))]
    MissingTables(Vec<String>),
}

/// Result type alias using GroupMenuError.
pub type GroupMenuResult<T> = Result<T, GroupMenuError>;
