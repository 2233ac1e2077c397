use crate::actions;
use crate::actions::registry::{CapabilityRegistry, ElementCapabilities};
use crate::core::{Config, Document, NativeElement};
use crate::errors::Result;
use std::cell::RefCell;

/// A resolved element: one native handle plus the context an action needs
/// (its document for settle waits, the configuration, the capability
/// registry). This is the user-facing action surface.
pub struct Element<'p, D: Document> {
    pub(crate) native: D::Element,
    pub(crate) document: &'p D,
    pub(crate) config: &'p Config,
    pub(crate) registry: &'p CapabilityRegistry,
    pub(crate) highlight_stack: RefCell<Vec<Option<String>>>,
}

impl<'p, D: Document> Element<'p, D> {
    pub(crate) fn new(
        native: D::Element,
        document: &'p D,
        config: &'p Config,
        registry: &'p CapabilityRegistry,
    ) -> Self {
        Self {
            native,
            document,
            config,
            registry,
            highlight_stack: RefCell::new(Vec::new()),
        }
    }

    pub fn native(&self) -> &D::Element {
        &self.native
    }

    pub fn tag_name(&self) -> Result<String> {
        self.native.tag_name()
    }

    pub fn attribute_value(&self, name: &str) -> Result<Option<String>> {
        self.native.attribute(name)
    }

    pub fn text(&self) -> Result<Option<String>> {
        self.native.text()
    }

    pub fn describe(&self) -> String {
        self.native.describe()
    }

    /// Capabilities registered for this element's tag.
    pub fn capabilities(&self) -> Result<ElementCapabilities> {
        Ok(self.registry.capabilities(&self.native.tag_name()?))
    }

    /// An element is enabled unless a `disabled` attribute is present with
    /// any value other than `false`.
    pub fn enabled(&self) -> Result<bool> {
        Ok(!boolean_attribute(self.native.attribute("disabled")?))
    }

    pub fn read_only(&self) -> Result<bool> {
        Ok(boolean_attribute(self.native.attribute("readonly")?))
    }

    /// Replace the current value by simulated typing: key-down/press/up per
    /// character, then a change event and a blur.
    pub fn type_text(&self, text: &str) -> Result<()> {
        actions::type_text::type_text(self, text, actions::type_text::TextEntryMode::Replace)
    }

    /// Type at the end of the current value without clearing it first and
    /// without the trailing change/blur.
    pub fn append_text(&self, text: &str) -> Result<()> {
        actions::type_text::type_text(self, text, actions::type_text::TextEntryMode::Append)
    }

    /// Clear the current value (the replace flow with empty text).
    pub fn clear(&self) -> Result<()> {
        self.type_text("")
    }

    /// Select this option element, firing `change` on its parent list.
    /// With `wait_for_complete` the call blocks until the document settles.
    pub fn select(&self, wait_for_complete: bool) -> Result<()> {
        actions::select::set_selected(self, true, wait_for_complete)
    }

    pub fn deselect(&self, wait_for_complete: bool) -> Result<()> {
        actions::select::set_selected(self, false, wait_for_complete)
    }

    /// Click and wait for the document to settle.
    pub fn click(&self) -> Result<()> {
        actions::click::click(self, true)
    }

    /// Click without waiting for any navigation the click may trigger.
    pub fn click_no_wait(&self) -> Result<()> {
        actions::click::click(self, false)
    }

    /// Toggle the highlight on this element. Calls nest: the original
    /// background color is restored only when every `on` has been matched
    /// by an `off`.
    pub fn highlight(&self, on: bool) -> Result<()> {
        if on {
            actions::highlight::on(self)
        } else {
            actions::highlight::off(self)
        }
    }
}

/// HTML boolean attribute semantics: present counts as set unless the
/// value spells `false`.
fn boolean_attribute(value: Option<String>) -> bool {
    match value {
        None => false,
        Some(v) => !v.eq_ignore_ascii_case("false"),
    }
}
