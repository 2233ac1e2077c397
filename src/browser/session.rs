use crate::actions::CapabilityRegistry;
use crate::constraints::Constraint;
use crate::core::{Backend, Config, Document, ReadyState};
use crate::dom::Element;
use crate::errors::{AutomationError, Result};
use crate::finder::ElementFinder;
use crate::wait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// A view over one document (the top-level page or a nested frame), bound
/// to the session's configuration and capability registry. Frame pages form
/// a tree; the parent hands out its children.
pub struct Page<'s, D: Document> {
    document: D,
    config: &'s Config,
    registry: &'s CapabilityRegistry,
}

impl<'s, D: Document> Page<'s, D> {
    pub(crate) fn new(document: D, config: &'s Config, registry: &'s CapabilityRegistry) -> Self {
        Self {
            document,
            config,
            registry,
        }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn url(&self) -> Result<String> {
        self.document.url()
    }

    pub fn ready_state(&self) -> Result<ReadyState> {
        self.document.ready_state()
    }

    pub fn label(&self) -> String {
        self.document.label()
    }

    /// Navigate and block until the new document settles.
    pub fn navigate(&self, url: &str) -> Result<()> {
        info!(url, "navigating");
        self.document.navigate(url)?;
        self.wait_for_complete()
    }

    /// Block until this document and every descendant frame report
    /// complete, or the configured timeout elapses.
    pub fn wait_for_complete(&self) -> Result<()> {
        wait::wait_for_complete(&self.document, &self.config.wait)
    }

    /// Direct child frames, in document order.
    pub fn frames(&self) -> Result<Vec<Page<'s, D>>> {
        Ok(self
            .document
            .frames()?
            .into_iter()
            .map(|frame| Page::new(frame, self.config, self.registry))
            .collect())
    }

    /// A finder over this whole document. `tags` pre-filters by tag name;
    /// empty means any tag.
    pub fn find(&self, tags: &[&str], constraint: Constraint) -> Result<ElementFinder<D::Collection>> {
        Ok(ElementFinder::new(
            self.document.collection()?,
            tags,
            constraint,
        ))
    }

    /// A finder scoped to the subtree below `root`.
    pub fn find_within(
        &self,
        root: &Element<'_, D>,
        tags: &[&str],
        constraint: Constraint,
    ) -> Result<ElementFinder<D::Collection>> {
        Ok(ElementFinder::new(
            self.document.scoped_collection(root.native())?,
            tags,
            constraint,
        ))
    }

    /// Resolve exactly one element; fails with `NoElementFound` otherwise.
    pub fn element(&self, tags: &[&str], constraint: Constraint) -> Result<Element<'_, D>> {
        let native = self.find(tags, constraint)?.require()?;
        Ok(self.wrap(native))
    }

    /// Resolve the first match, if any.
    pub fn try_element(
        &self,
        tags: &[&str],
        constraint: Constraint,
    ) -> Result<Option<Element<'_, D>>> {
        Ok(self.find(tags, constraint)?.first()?.map(|n| self.wrap(n)))
    }

    /// All matches, in document order.
    pub fn elements(&self, tags: &[&str], constraint: Constraint) -> Result<Vec<Element<'_, D>>> {
        Ok(self
            .find(tags, constraint)?
            .all()?
            .into_iter()
            .map(|n| self.wrap(n))
            .collect())
    }

    /// Resolve exactly one element inside `root`'s subtree.
    pub fn element_within(
        &self,
        root: &Element<'_, D>,
        tags: &[&str],
        constraint: Constraint,
    ) -> Result<Element<'_, D>> {
        let native = self.find_within(root, tags, constraint)?.require()?;
        Ok(self.wrap(native))
    }

    /// Id fast path through the collection.
    pub fn element_by_id(&self, id: &str) -> Result<Option<Element<'_, D>>> {
        use crate::core::ElementCollection;
        Ok(self
            .document
            .collection()?
            .element_by_id(id)?
            .map(|n| self.wrap(n)))
    }

    fn wrap(&self, native: D::Element) -> Element<'_, D> {
        Element::new(native, &self.document, self.config, self.registry)
    }
}

/// Owns exactly one native browser handle for its whole lifetime.
///
/// Exclusively owned: a session and the frame tree below it must only be
/// driven from one thread. Closing disposes every native resource the
/// session owns and is idempotent; dropping the session closes it as a
/// backstop.
pub struct BrowserSession<B: Backend> {
    backend: B,
    config: Config,
    registry: CapabilityRegistry,
    session_id: String,
    created_at: DateTime<Utc>,
    open: bool,
}

impl<B: Backend> BrowserSession<B> {
    pub fn new(mut backend: B, config: Config) -> Result<Self> {
        backend.launch(&config)?;
        let session_id = uuid::Uuid::new_v4().to_string();
        info!(session_id = %session_id, "browser session started");
        Ok(Self {
            backend,
            config,
            registry: CapabilityRegistry::default(),
            session_id,
            created_at: Utc::now(),
            open: true,
        })
    }

    /// Replace the capability registry, e.g. to teach the action layer
    /// about custom elements.
    pub fn set_registry(&mut self, registry: CapabilityRegistry) {
        self.registry = registry;
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.open && self.backend.is_running()
    }

    /// The top-level page.
    pub fn page(&self) -> Result<Page<'_, B::Document>> {
        if !self.open {
            return Err(AutomationError::NotLaunched);
        }
        Ok(Page::new(
            self.backend.document()?,
            &self.config,
            &self.registry,
        ))
    }

    /// Navigate the top-level page and wait for it to settle.
    pub fn navigate(&self, url: &str) -> Result<()> {
        self.page()?.navigate(url)
    }

    /// Close the native browser and release everything the session owns.
    /// Safe to call more than once.
    pub fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        debug!(session_id = %self.session_id, "closing browser session");
        self.backend.close()
    }
}

impl<B: Backend> Drop for BrowserSession<B> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
