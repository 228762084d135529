//! Content type ("node type") configuration as seen by the menu override.
//!
//! Content type config objects are named `node.type.<type>` and carry the
//! menus offered on the content form under
//! `third_party_settings.menu_ui.available_menus`.

use serde_json::Value;

/// Prefix shared by every content type config object name.
pub const CONFIG_PREFIX: &str = "node.type.";

/// JSON pointer to the available menus setting inside a content type config object.
pub const AVAILABLE_MENUS_POINTER: &str = "/third_party_settings/menu_ui/available_menus";

/// Check whether a config object name denotes a content type.
pub fn is_item_type_config(name: &str) -> bool {
    name.strip_prefix(CONFIG_PREFIX)
        .is_some_and(|type_name| !type_name.is_empty())
}

/// Config object name for a content type.
pub fn config_name(type_name: &str) -> String {
    format!("{CONFIG_PREFIX}{type_name}")
}

/// The parts of a content type config object the menu override reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTypeConfig {
    /// Content type machine name (the `type` key).
    pub type_name: String,

    /// Menus currently offered on the content form.
    pub available_menus: Vec<String>,
}

impl ItemTypeConfig {
    /// Decode a raw config object.
    ///
    /// Returns `None` when the object is malformed: no string `type`, or an
    /// `available_menus` value that is not a list. A missing list means no
    /// menus are offered.
    pub fn from_value(value: &Value) -> Option<Self> {
        let type_name = value.get("type")?.as_str()?;
        if type_name.is_empty() {
            return None;
        }

        let available_menus = match value.pointer(AVAILABLE_MENUS_POINTER) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(menus)) => menus
                .iter()
                .filter_map(|m| m.as_str().map(str::to_string))
                .collect(),
            Some(_) => return None,
        };

        Some(Self {
            type_name: type_name.to_string(),
            available_menus,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recognizes_content_type_names() {
        assert!(is_item_type_config("node.type.article"));
        assert!(!is_item_type_config("node.type."));
        assert!(!is_item_type_config("node.types.article"));
        assert!(!is_item_type_config("system.site"));
        assert_eq!(config_name("page"), "node.type.page");
    }

    #[test]
    fn decodes_available_menus() {
        let config = ItemTypeConfig::from_value(&json!({
            "type": "article",
            "name": "Article",
            "third_party_settings": {"menu_ui": {"available_menus": ["main", "footer"], "parent": "main:"}}
        }))
        .unwrap();

        assert_eq!(config.type_name, "article");
        assert_eq!(config.available_menus, vec!["main", "footer"]);
    }

    #[test]
    fn missing_menu_settings_means_no_menus() {
        let config = ItemTypeConfig::from_value(&json!({"type": "page"})).unwrap();
        assert!(config.available_menus.is_empty());
    }

    #[test]
    fn malformed_objects_are_rejected() {
        assert!(ItemTypeConfig::from_value(&json!({"name": "Article"})).is_none());
        assert!(ItemTypeConfig::from_value(&json!({"type": 5})).is_none());
        assert!(ItemTypeConfig::from_value(&json!({"type": ""})).is_none());
        assert!(
            ItemTypeConfig::from_value(&json!({
                "type": "article",
                "third_party_settings": {"menu_ui": {"available_menus": "main"}}
            }))
            .is_none()
        );
    }
}
