use std::collections::HashMap;

/// What an element can do, derived from its tag. An element is a
/// `(tag, attributes, capabilities)` triple; the registry supplies the last
/// part instead of a subclass hierarchy keyed on tag names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementCapabilities {
    /// Accepts simulated typing (`input`, `textarea`).
    pub text_entry: bool,
    /// Is an option inside a selectable list.
    pub option: bool,
    /// Is a selectable list container.
    pub list: bool,
    pub clickable: bool,
}

/// Registry mapping lowercase tag names to capability sets.
///
/// A plain value, passed along explicitly with the configuration; callers
/// extend it to teach the action layer about custom elements.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    capabilities: HashMap<String, ElementCapabilities>,
}

impl CapabilityRegistry {
    /// An empty registry; every lookup reports no capabilities.
    pub fn empty() -> Self {
        Self {
            capabilities: HashMap::new(),
        }
    }

    /// Register or replace the capabilities for a tag.
    pub fn register(&mut self, tag: &str, capabilities: ElementCapabilities) {
        self.capabilities
            .insert(tag.to_ascii_lowercase(), capabilities);
    }

    /// Capabilities for a tag; unknown tags have none.
    pub fn capabilities(&self, tag: &str) -> ElementCapabilities {
        self.capabilities
            .get(&tag.to_ascii_lowercase())
            .copied()
            .unwrap_or_default()
    }
}

impl Default for CapabilityRegistry {
    /// The HTML form vocabulary.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(
            "input",
            ElementCapabilities {
                text_entry: true,
                clickable: true,
                ..Default::default()
            },
        );
        registry.register(
            "textarea",
            ElementCapabilities {
                text_entry: true,
                ..Default::default()
            },
        );
        registry.register(
            "select",
            ElementCapabilities {
                list: true,
                clickable: true,
                ..Default::default()
            },
        );
        registry.register(
            "option",
            ElementCapabilities {
                option: true,
                ..Default::default()
            },
        );
        registry.register(
            "button",
            ElementCapabilities {
                clickable: true,
                ..Default::default()
            },
        );
        registry.register(
            "a",
            ElementCapabilities {
                clickable: true,
                ..Default::default()
            },
        );
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_covers_the_form_vocabulary() {
        let registry = CapabilityRegistry::default();
        assert!(registry.capabilities("input").text_entry);
        assert!(registry.capabilities("textarea").text_entry);
        assert!(registry.capabilities("option").option);
        assert!(registry.capabilities("select").list);
        assert!(registry.capabilities("BUTTON").clickable);
    }

    #[test]
    fn unknown_tags_have_no_capabilities() {
        let registry = CapabilityRegistry::default();
        assert_eq!(registry.capabilities("div"), ElementCapabilities::default());
    }

    #[test]
    fn registrations_can_extend_the_defaults() {
        let mut registry = CapabilityRegistry::default();
        registry.register(
            "my-editor",
            ElementCapabilities {
                text_entry: true,
                ..Default::default()
            },
        );
        assert!(registry.capabilities("my-editor").text_entry);
    }
}
