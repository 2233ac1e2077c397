use crate::errors::Result;
use std::collections::HashMap;

/// Wait policy for a fired DOM event.
///
/// `Block` dispatches the event synchronously and returns once every handler
/// has run; `NoWait` queues the dispatch and returns immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventWait {
    Block,
    NoWait,
}

/// Contract every backend element handle must satisfy.
///
/// A native element is a non-owning reference into a live page; it is not
/// thread-safe and must only be driven from the thread that owns its
/// browser session.
pub trait NativeElement {
    /// Lowercase tag name of the element.
    fn tag_name(&self) -> Result<String>;

    /// Read an attribute (or the reflected DOM property where one exists,
    /// e.g. `value`, `disabled`). `None` means the attribute is absent.
    fn attribute(&self, name: &str) -> Result<Option<String>>;

    fn set_attribute(&self, name: &str, value: &str) -> Result<()>;

    /// Visible text of the element, as computed by the engine.
    fn text(&self) -> Result<Option<String>>;

    /// Read a style property. An empty/absent declaration is `None`.
    fn style_property(&self, name: &str) -> Result<Option<String>>;

    /// Write a style property; an empty value removes the declaration.
    fn set_style_property(&self, name: &str, value: &str) -> Result<()>;

    /// Fire a named DOM event with the given properties under the given
    /// wait policy.
    fn fire_event(
        &self,
        name: &str,
        properties: &HashMap<String, String>,
        wait: EventWait,
    ) -> Result<()>;

    fn focus(&self) -> Result<()>;

    /// Parent element, if any.
    fn parent(&self) -> Result<Option<Self>>
    where
        Self: Sized;

    /// Short human-readable identification used in error messages.
    fn describe(&self) -> String;
}
