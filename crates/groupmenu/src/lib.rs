//! Group menus for a Drupal-style CMS.
//!
//! Menus can be related to groups. Group members with the right group
//! permission get those menus offered on content forms: the content type
//! config objects (`node.type.<type>`) are overridden at read time by
//! [`overrides::GroupMenuConfigOverrides`]. The menu overview leaves group
//! menus out, and each group gets its own menu list.
//!
//! The main entry point for inspecting a site is the `groupmenu` binary.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod list;
pub mod models;
pub mod overrides;
pub mod permissions;
pub mod plugin;
pub mod state;
pub mod storage;
