//! Element roles and hit paths.
//!
//! A pointer-down carries the chain of roles from the element under the
//! pointer up to the panel root, innermost first. "Is this inside a button?"
//! is then an ancestry query over that chain against a configurable
//! allow-list.

use serde::{Deserialize, Serialize};

/// Role of one element in a panel's UI tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementRole {
    Button,
    Link,
    Input,
    Select,
    Textarea,
    Title,
    Header,
    Body,
    Text,
    Panel,
}

/// Roles from the hit element up to the panel root, innermost first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HitPath(Vec<ElementRole>);

impl HitPath {
    pub fn new(roles: impl IntoIterator<Item = ElementRole>) -> Self {
        Self(roles.into_iter().collect())
    }

    /// Extend with the ancestors enclosing this path.
    pub fn within(mut self, ancestors: impl IntoIterator<Item = ElementRole>) -> Self {
        self.0.extend(ancestors);
        self
    }

    pub fn roles(&self) -> &[ElementRole] {
        &self.0
    }

    pub fn innermost(&self) -> Option<ElementRole> {
        self.0.first().copied()
    }

    /// True when the hit element is, or sits inside, any of `roles`.
    pub fn has_ancestor_in(&self, roles: &[ElementRole]) -> bool {
        self.0.iter().any(|r| roles.contains(r))
    }
}

/// Roles that own their pointer events; a press on them never starts a drag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractiveRoles(pub Vec<ElementRole>);

impl Default for InteractiveRoles {
    fn default() -> Self {
        Self(vec![
            ElementRole::Button,
            ElementRole::Link,
            ElementRole::Input,
            ElementRole::Select,
            ElementRole::Textarea,
        ])
    }
}

impl InteractiveRoles {
    pub fn blocks_drag(&self, path: &HitPath) -> bool {
        path.has_ancestor_in(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_inside_button_is_interactive() {
        let path = HitPath::new([ElementRole::Text, ElementRole::Button]).within([
            ElementRole::Header,
            ElementRole::Panel,
        ]);
        assert!(InteractiveRoles::default().blocks_drag(&path));
        assert_eq!(path.innermost(), Some(ElementRole::Text));
    }

    #[test]
    fn title_is_not_interactive() {
        let path = HitPath::new([ElementRole::Title, ElementRole::Header, ElementRole::Panel]);
        assert!(!InteractiveRoles::default().blocks_drag(&path));
    }

    #[test]
    fn allow_list_is_configurable() {
        let path = HitPath::new([ElementRole::Title, ElementRole::Header]);
        let roles = InteractiveRoles(vec![ElementRole::Title]);
        assert!(roles.blocks_drag(&path));
    }

    #[test]
    fn roles_deserialize_lowercase() {
        let roles: InteractiveRoles = serde_json::from_str(r#"["button","textarea"]"#).unwrap();
        assert_eq!(roles.0, vec![ElementRole::Button, ElementRole::Textarea]);
    }
}
