//! Read-time config overrides.
//!
//! An override contributes partial config objects ("overlays") that the
//! [`ConfigFactory`] merges over the stored objects whenever they are read.
//! Nothing is ever written back to storage.

mod factory;
mod resolver;

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};

pub use factory::{ConfigFactory, merge};
pub use resolver::{GroupMenuConfigOverrides, ResolutionContext};

use crate::models::Account;

/// The part of a content type config object the group menu override replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigOverlay {
    /// Full replacement for `third_party_settings.menu_ui.available_menus`.
    pub available_menus: Vec<String>,
}

impl ConfigOverlay {
    /// The overlay as a partial config object.
    pub fn to_value(&self) -> Value {
        json!({
            "third_party_settings": {
                "menu_ui": {
                    "available_menus": self.available_menus,
                },
            },
        })
    }
}

/// A source of read-time config overrides.
#[async_trait]
pub trait ConfigOverride: Send + Sync {
    /// Overlays for the requested names, as partial config objects.
    ///
    /// Names without an override are absent from the result.
    async fn load_overrides(
        &self,
        names: &[String],
        account: &Account,
    ) -> Result<BTreeMap<String, Value>>;

    /// Distinguishes cached config objects that had this override applied.
    fn cache_suffix(&self) -> &str;
}
