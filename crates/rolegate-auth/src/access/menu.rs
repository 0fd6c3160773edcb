//! Menu structure used for transitive menu permissions.

use serde::{Deserialize, Serialize};

/// A menu node and its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,

    #[serde(default)]
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_child(mut self, child: MenuItem) -> Self {
        self.children.push(child);
        self
    }

    /// Finds `id` in this subtree.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&MenuItem> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// The application menu.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuConfig {
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

impl MenuConfig {
    #[must_use]
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self { items }
    }

    /// Finds a menu item anywhere in the tree.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&MenuItem> {
        self.items.iter().find_map(|item| item.find(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_nested_item() {
        let menu = MenuConfig::new(vec![
            MenuItem::new("orders").with_child(MenuItem::new("orders.list")),
            MenuItem::new("admin")
                .with_child(MenuItem::new("admin.users").with_child(MenuItem::new("admin.users.roles"))),
        ]);

        assert_eq!(menu.find("admin.users.roles").map(|i| i.id.as_str()), Some("admin.users.roles"));
        assert_eq!(menu.find("orders").map(|i| i.children.len()), Some(1));
        assert!(menu.find("missing").is_none());
    }

    #[test]
    fn test_menu_from_json() {
        let menu: MenuConfig = serde_json::from_str(
            r#"{"items":[{"id":"M","children":[{"id":"M.sub"}]}]}"#,
        )
        .unwrap();

        assert_eq!(menu.find("M.sub"), Some(&MenuItem::new("M.sub")));
    }
}
