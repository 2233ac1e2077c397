use crate::core::{
    Backend, Config, Document, ElementCollection, EventWait, NativeElement, ReadyState,
};
use crate::errors::{AutomationError, Result};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::{Rc, Weak};

/// One event dispatched against a fake element (or queued, for `NoWait`).
#[derive(Debug, Clone)]
pub struct FiredEvent {
    pub name: String,
    pub properties: HashMap<String, String>,
    pub wait: EventWait,
}

struct ElementState {
    tag: String,
    attributes: RefCell<HashMap<String, String>>,
    text: RefCell<Option<String>>,
    style: RefCell<HashMap<String, String>>,
    style_writes: RefCell<Vec<(String, String)>>,
    events: RefCell<Vec<FiredEvent>>,
    failing_events: RefCell<HashSet<String>>,
    attribute_reads: Cell<usize>,
    focus_calls: Cell<usize>,
    parent: RefCell<Option<Weak<ElementState>>>,
}

impl ElementState {
    fn new(tag: &str, attrs: &[(&str, &str)]) -> Rc<Self> {
        Rc::new(Self {
            tag: tag.to_ascii_lowercase(),
            attributes: RefCell::new(
                attrs
                    .iter()
                    .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                    .collect(),
            ),
            text: RefCell::new(None),
            style: RefCell::new(HashMap::new()),
            style_writes: RefCell::new(Vec::new()),
            events: RefCell::new(Vec::new()),
            failing_events: RefCell::new(HashSet::new()),
            attribute_reads: Cell::new(0),
            focus_calls: Cell::new(0),
            parent: RefCell::new(None),
        })
    }
}

/// Handle onto one fake element. Clones share state.
#[derive(Clone)]
pub struct FakeElement {
    state: Rc<ElementState>,
}

impl std::fmt::Debug for FakeElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

impl FakeElement {
    /// Attribute read that bypasses the read counter; assertion helper.
    pub fn attribute_raw(&self, name: &str) -> Option<String> {
        self.state
            .attributes
            .borrow()
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    /// How many times the native attribute layer was queried.
    pub fn attribute_read_count(&self) -> usize {
        self.state.attribute_reads.get()
    }

    pub fn set_text(&self, text: &str) {
        *self.state.text.borrow_mut() = Some(text.to_string());
    }

    /// Seed a style declaration without recording a write.
    pub fn set_style(&self, name: &str, value: &str) {
        self.state
            .style
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    /// Current style declaration, bypassing the write log.
    pub fn style(&self, name: &str) -> Option<String> {
        self.state.style.borrow().get(name).cloned()
    }

    /// Every style write performed through the native contract.
    pub fn style_writes(&self) -> Vec<(String, String)> {
        self.state.style_writes.borrow().clone()
    }

    pub fn clear_style_writes(&self) {
        self.state.style_writes.borrow_mut().clear();
    }

    /// Every event fired at this element, in order.
    pub fn fired_events(&self) -> Vec<FiredEvent> {
        self.state.events.borrow().clone()
    }

    pub fn focus_count(&self) -> usize {
        self.state.focus_calls.get()
    }

    /// Make firing `name` fail from now on; the attempt is not recorded.
    pub fn fail_event(&self, name: &str) {
        self.state
            .failing_events
            .borrow_mut()
            .insert(name.to_string());
    }

    fn is_inside(&self, root: &Rc<ElementState>) -> bool {
        let mut cursor = self.state.parent.borrow().clone();
        while let Some(weak) = cursor {
            match weak.upgrade() {
                Some(parent) => {
                    if Rc::ptr_eq(&parent, root) {
                        return true;
                    }
                    cursor = parent.parent.borrow().clone();
                }
                None => return false,
            }
        }
        false
    }
}

impl NativeElement for FakeElement {
    fn tag_name(&self) -> Result<String> {
        Ok(self.state.tag.clone())
    }

    fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.state
            .attribute_reads
            .set(self.state.attribute_reads.get() + 1);
        Ok(self.attribute_raw(name))
    }

    fn set_attribute(&self, name: &str, value: &str) -> Result<()> {
        self.state
            .attributes
            .borrow_mut()
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    fn text(&self) -> Result<Option<String>> {
        Ok(self.state.text.borrow().clone())
    }

    fn style_property(&self, name: &str) -> Result<Option<String>> {
        Ok(self.style(name))
    }

    fn set_style_property(&self, name: &str, value: &str) -> Result<()> {
        self.state
            .style_writes
            .borrow_mut()
            .push((name.to_string(), value.to_string()));
        if value.is_empty() {
            self.state.style.borrow_mut().remove(name);
        } else {
            self.set_style(name, value);
        }
        Ok(())
    }

    fn fire_event(
        &self,
        name: &str,
        properties: &HashMap<String, String>,
        wait: EventWait,
    ) -> Result<()> {
        if self.state.failing_events.borrow().contains(name) {
            return Err(AutomationError::Native(format!(
                "event '{}' refused by {}",
                name,
                self.describe()
            )));
        }
        self.state.events.borrow_mut().push(FiredEvent {
            name: name.to_string(),
            properties: properties.clone(),
            wait,
        });
        Ok(())
    }

    fn focus(&self) -> Result<()> {
        self.state.focus_calls.set(self.state.focus_calls.get() + 1);
        Ok(())
    }

    fn parent(&self) -> Result<Option<Self>> {
        Ok(self
            .state
            .parent
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|state| FakeElement { state }))
    }

    fn describe(&self) -> String {
        let attributes = self.state.attributes.borrow();
        let mut description = format!("<{}", self.state.tag);
        for key in ["id", "name"] {
            if let Some(value) = attributes.get(key) {
                description.push_str(&format!(" {}=\"{}\"", key, value));
            }
        }
        description.push('>');
        description
    }
}

struct PageState {
    label: String,
    url: RefCell<String>,
    elements: RefCell<Vec<Rc<ElementState>>>,
    frames: RefCell<Vec<FakePage>>,
    scripted_states: RefCell<VecDeque<ReadyState>>,
    resting_state: Cell<ReadyState>,
    ready_polls: Cell<usize>,
    navigations: RefCell<Vec<String>>,
}

/// In-memory document. Clones share state; frames are fake pages owned by
/// their parent.
#[derive(Clone)]
pub struct FakePage {
    state: Rc<PageState>,
}

impl std::fmt::Debug for FakePage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FakePage({})", self.state.label)
    }
}

impl FakePage {
    pub fn new(label: &str) -> Self {
        Self {
            state: Rc::new(PageState {
                label: label.to_string(),
                url: RefCell::new("about:blank".to_string()),
                elements: RefCell::new(Vec::new()),
                frames: RefCell::new(Vec::new()),
                scripted_states: RefCell::new(VecDeque::new()),
                resting_state: Cell::new(ReadyState::Complete),
                ready_polls: Cell::new(0),
                navigations: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Append a top-level element, in document order.
    pub fn add_element(&self, tag: &str, attrs: &[(&str, &str)]) -> FakeElement {
        let state = ElementState::new(tag, attrs);
        self.state.elements.borrow_mut().push(state.clone());
        FakeElement { state }
    }

    /// Append an element below `parent`, in document order.
    pub fn add_child_element(
        &self,
        parent: &FakeElement,
        tag: &str,
        attrs: &[(&str, &str)],
    ) -> FakeElement {
        let element = self.add_element(tag, attrs);
        *element.state.parent.borrow_mut() = Some(Rc::downgrade(&parent.state));
        element
    }

    /// Attach a child frame.
    pub fn add_frame(&self, label: &str) -> FakePage {
        let frame = FakePage::new(label);
        self.state.frames.borrow_mut().push(frame.clone());
        frame
    }

    /// Queue ready states to serve, one per probe; the last one then
    /// sticks.
    pub fn script_ready_states(&self, states: Vec<ReadyState>) {
        *self.state.scripted_states.borrow_mut() = states.into();
    }

    /// Pin the ready state.
    pub fn set_ready_state(&self, state: ReadyState) {
        self.state.scripted_states.borrow_mut().clear();
        self.state.resting_state.set(state);
    }

    /// How many times the ready state was probed.
    pub fn ready_poll_count(&self) -> usize {
        self.state.ready_polls.get()
    }

    /// URLs this page was steered to.
    pub fn navigations(&self) -> Vec<String> {
        self.state.navigations.borrow().clone()
    }
}

impl Document for FakePage {
    type Element = FakeElement;
    type Collection = FakeCollection;

    fn ready_state(&self) -> Result<ReadyState> {
        self.state.ready_polls.set(self.state.ready_polls.get() + 1);
        if let Some(next) = self.state.scripted_states.borrow_mut().pop_front() {
            self.state.resting_state.set(next);
            return Ok(next);
        }
        Ok(self.state.resting_state.get())
    }

    fn frames(&self) -> Result<Vec<Self>> {
        Ok(self.state.frames.borrow().clone())
    }

    fn collection(&self) -> Result<FakeCollection> {
        Ok(FakeCollection {
            page: self.clone(),
            scope: None,
        })
    }

    fn scoped_collection(&self, root: &FakeElement) -> Result<FakeCollection> {
        Ok(FakeCollection {
            page: self.clone(),
            scope: Some(root.state.clone()),
        })
    }

    fn url(&self) -> Result<String> {
        Ok(self.state.url.borrow().clone())
    }

    fn label(&self) -> String {
        self.state.label.clone()
    }

    fn navigate(&self, url: &str) -> Result<()> {
        self.state.navigations.borrow_mut().push(url.to_string());
        *self.state.url.borrow_mut() = url.to_string();
        Ok(())
    }
}

/// Live view over a fake page's elements, optionally scoped to a subtree.
pub struct FakeCollection {
    page: FakePage,
    scope: Option<Rc<ElementState>>,
}

impl ElementCollection for FakeCollection {
    type Element = FakeElement;

    fn elements(&self) -> Result<Vec<FakeElement>> {
        Ok(self
            .page
            .state
            .elements
            .borrow()
            .iter()
            .map(|state| FakeElement {
                state: state.clone(),
            })
            .filter(|element| match &self.scope {
                None => true,
                Some(root) => element.is_inside(root),
            })
            .collect())
    }
}

/// Backend over a prepared fake page.
pub struct FakeBackend {
    page: FakePage,
    launched: bool,
    close_count: Rc<Cell<usize>>,
}

impl FakeBackend {
    pub fn new(page: FakePage) -> Self {
        Self {
            page,
            launched: false,
            close_count: Rc::new(Cell::new(0)),
        }
    }

    /// Shared counter of effective closes, for asserting idempotence after
    /// the backend has been moved into a session.
    pub fn close_count_handle(&self) -> Rc<Cell<usize>> {
        self.close_count.clone()
    }

    pub fn page(&self) -> FakePage {
        self.page.clone()
    }
}

impl Backend for FakeBackend {
    type Document = FakePage;

    fn launch(&mut self, _config: &Config) -> Result<()> {
        self.launched = true;
        Ok(())
    }

    fn document(&self) -> Result<FakePage> {
        if !self.launched {
            return Err(AutomationError::NotLaunched);
        }
        Ok(self.page.clone())
    }

    fn is_running(&self) -> bool {
        self.launched
    }

    fn close(&mut self) -> Result<()> {
        if self.launched {
            self.launched = false;
            self.close_count.set(self.close_count.get() + 1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_record_name_properties_and_wait_policy() {
        let page = FakePage::new("page");
        let element = page.add_element("input", &[]);
        let properties = HashMap::from([("key".to_string(), "a".to_string())]);
        element
            .fire_event("keydown", &properties, EventWait::Block)
            .unwrap();
        element
            .fire_event("blur", &HashMap::new(), EventWait::NoWait)
            .unwrap();

        let events = element.fired_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "keydown");
        assert_eq!(events[0].properties["key"], "a");
        assert_eq!(events[0].wait, EventWait::Block);
        assert_eq!(events[1].wait, EventWait::NoWait);
    }

    #[test]
    fn failing_events_error_without_being_recorded() {
        let page = FakePage::new("page");
        let element = page.add_element("input", &[]);
        element.fail_event("blur");
        assert!(element
            .fire_event("blur", &HashMap::new(), EventWait::NoWait)
            .is_err());
        assert!(element.fired_events().is_empty());
    }

    #[test]
    fn parents_link_back_and_scoping_follows_ancestry() {
        let page = FakePage::new("page");
        let form = page.add_element("form", &[]);
        let field = page.add_child_element(&form, "input", &[]);
        let stray = page.add_element("input", &[]);

        let parent = field.parent().unwrap().unwrap();
        assert_eq!(parent.tag_name().unwrap(), "form");
        assert!(stray.parent().unwrap().is_none());

        let scoped = page.scoped_collection(&form).unwrap();
        assert_eq!(scoped.elements().unwrap().len(), 1);
    }

    #[test]
    fn scripted_ready_states_are_served_in_order_then_stick() {
        let page = FakePage::new("page");
        page.script_ready_states(vec![ReadyState::Loading, ReadyState::Complete]);
        assert_eq!(page.ready_state().unwrap(), ReadyState::Loading);
        assert_eq!(page.ready_state().unwrap(), ReadyState::Complete);
        assert_eq!(page.ready_state().unwrap(), ReadyState::Complete);
        assert_eq!(page.ready_poll_count(), 3);
    }
}
