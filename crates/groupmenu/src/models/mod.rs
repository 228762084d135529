//! Records read from the host CMS.
//!
//! The module never writes any of these; they are snapshots of host state
//! taken at read time.

pub mod account;
pub mod group;
pub mod item_type;
pub mod menu;
pub mod relation;

pub use account::{ANONYMOUS_ACCOUNT_ID, Account, site_permissions};
pub use group::{Group, GroupMembership, GroupRole, GroupType, RoleAudience};
pub use item_type::{
    AVAILABLE_MENUS_POINTER, CONFIG_PREFIX, ItemTypeConfig, config_name, is_item_type_config,
};
pub use menu::Menu;
pub use relation::{GroupRelationType, GroupRelationship, RelationTypeSettings};
