use crate::constraints::Constraint;
use crate::core::{ElementCollection, NativeElement};
use crate::dom::AttributeBag;
use crate::errors::{AutomationError, Result};
use tracing::debug;

/// Walks an element collection and yields the elements whose attribute bag
/// satisfies a constraint.
///
/// The tag filter is a coarse pre-filter: candidates with other tags are
/// skipped before an attribute bag is built, so they never incur native
/// attribute reads. Results follow native document order; the finder never
/// re-orders. Zero matches is a valid outcome communicated through the
/// empty sequence; only `require` turns it into `NoElementFound`.
pub struct ElementFinder<C: ElementCollection> {
    collection: C,
    tags: Vec<String>,
    constraint: Constraint,
}

impl<C: ElementCollection> ElementFinder<C> {
    /// `tags` is the set of acceptable tag names; empty means any tag.
    pub fn new(collection: C, tags: &[&str], constraint: Constraint) -> Self {
        Self {
            collection,
            tags: tags.iter().map(|t| t.to_ascii_lowercase()).collect(),
            constraint,
        }
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    /// The lazy match sequence. Restartable: each call re-queries the
    /// underlying collection, since the page may have mutated since the
    /// last walk.
    pub fn matches(&self) -> Matches<'_, C> {
        let (target_index, core) = self.constraint.peel_index();
        Matches {
            finder: self,
            core,
            target_index,
            queue: None,
            matched: 0,
            done: false,
        }
    }

    /// First match in document order, or `None`. Evaluation stops at the
    /// first hit.
    pub fn first(&self) -> Result<Option<C::Element>> {
        self.matches().next().transpose()
    }

    /// All matches in document order.
    pub fn all(&self) -> Result<Vec<C::Element>> {
        self.matches().collect()
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(self.first()?.is_some())
    }

    /// Resolve exactly one element; zero matches surfaces `NoElementFound`.
    pub fn require(&self) -> Result<C::Element> {
        self.first()?.ok_or_else(|| {
            let scope = if self.tags.is_empty() {
                "element".to_string()
            } else {
                format!("<{}>", self.tags.join("|"))
            };
            debug!(constraint = %self.constraint, "no element matched");
            AutomationError::NoElementFound(format!("{} where {}", scope, self.constraint))
        })
    }
}

/// Lazy iterator over finder matches.
pub struct Matches<'f, C: ElementCollection> {
    finder: &'f ElementFinder<C>,
    core: &'f Constraint,
    target_index: Option<usize>,
    queue: Option<std::vec::IntoIter<C::Element>>,
    matched: usize,
    done: bool,
}

impl<C: ElementCollection> Matches<'_, C> {
    fn fetch(&mut self) -> Result<()> {
        if self.queue.is_some() {
            return Ok(());
        }
        let candidates = if self.finder.tags.is_empty() {
            self.finder.collection.elements()?
        } else {
            self.finder.collection.elements_by_tag(&self.finder.tags)?
        };
        self.queue = Some(candidates.into_iter());
        Ok(())
    }

    fn tag_accepted(&self, element: &C::Element) -> Result<bool> {
        if self.finder.tags.is_empty() {
            return Ok(true);
        }
        let tag = element.tag_name()?;
        Ok(self
            .finder
            .tags
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&tag)))
    }
}

impl<C: ElementCollection> Iterator for Matches<'_, C> {
    type Item = Result<C::Element>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Err(err) = self.fetch() {
            self.done = true;
            return Some(Err(err));
        }
        loop {
            let element = match self.queue.as_mut().and_then(|queue| queue.next()) {
                Some(element) => element,
                None => {
                    self.done = true;
                    return None;
                }
            };

            // cheap rejection first: no attribute bag for foreign tags
            match self.tag_accepted(&element) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }

            let satisfied = {
                let bag = AttributeBag::new(&element);
                self.core.matches(&bag)
            };
            match satisfied {
                Ok(false) => continue,
                Ok(true) => {
                    if let Some(target) = self.target_index {
                        if self.matched == target {
                            self.done = true;
                            return Some(Ok(element));
                        }
                        self.matched += 1;
                        continue;
                    }
                    return Some(Ok(element));
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ValueMatcher;
    use crate::core::Document;
    use crate::testing::FakePage;

    fn sample_page() -> FakePage {
        let page = FakePage::new("page");
        page.add_element("input", &[("name", "user"), ("id", "first")]);
        page.add_element("div", &[("name", "user")]);
        page.add_element("input", &[("name", "user"), ("id", "second")]);
        page.add_element("input", &[("name", "other")]);
        page.add_element("input", &[("name", "user"), ("id", "third")]);
        page
    }

    fn ids(elements: Vec<crate::testing::FakeElement>) -> Vec<String> {
        elements
            .into_iter()
            .map(|e| e.attribute("id").unwrap().unwrap_or_default())
            .collect()
    }

    #[test]
    fn matches_follow_document_order() {
        let page = sample_page();
        let finder = ElementFinder::new(
            page.collection().unwrap(),
            &["input"],
            Constraint::name("user"),
        );
        assert_eq!(ids(finder.all().unwrap()), vec!["first", "second", "third"]);
    }

    #[test]
    fn first_yields_the_first_in_document_order() {
        let page = sample_page();
        let finder = ElementFinder::new(
            page.collection().unwrap(),
            &["input"],
            Constraint::name("user"),
        );
        let element = finder.first().unwrap().unwrap();
        assert_eq!(element.attribute("id").unwrap().as_deref(), Some("first"));
    }

    #[test]
    fn first_stops_evaluating_after_the_first_hit() {
        let page = sample_page();
        let elements = page.collection().unwrap().elements().unwrap();
        let finder = ElementFinder::new(
            page.collection().unwrap(),
            &["input"],
            Constraint::name("user"),
        );
        finder.first().unwrap().unwrap();
        // the later matching inputs were never evaluated
        assert_eq!(elements[4].attribute_read_count(), 0);
    }

    #[test]
    fn index_counts_matches_not_collection_positions() {
        let page = sample_page();
        let finder = ElementFinder::new(
            page.collection().unwrap(),
            &["input"],
            Constraint::name("user").at_index(2),
        );
        let matches = finder.all().unwrap();
        assert_eq!(ids(matches), vec!["third"]);
    }

    #[test]
    fn index_past_the_end_is_empty_not_an_error() {
        let page = sample_page();
        let finder = ElementFinder::new(
            page.collection().unwrap(),
            &["input"],
            Constraint::name("user").at_index(9),
        );
        assert!(finder.all().unwrap().is_empty());
    }

    #[test]
    fn tag_filter_skips_without_native_attribute_reads() {
        let page = sample_page();
        let elements = page.collection().unwrap().elements().unwrap();
        let finder = ElementFinder::new(
            page.collection().unwrap(),
            &["input"],
            Constraint::name("user"),
        );
        finder.all().unwrap();
        // the div matches the constraint but not the tag filter
        assert_eq!(elements[1].attribute_read_count(), 0);
    }

    #[test]
    fn zero_matches_is_a_valid_empty_sequence() {
        let page = sample_page();
        let finder = ElementFinder::new(
            page.collection().unwrap(),
            &["input"],
            Constraint::name("missing"),
        );
        assert!(finder.all().unwrap().is_empty());
        assert!(!finder.exists().unwrap());
    }

    #[test]
    fn require_surfaces_no_element_found() {
        let page = sample_page();
        let finder = ElementFinder::new(
            page.collection().unwrap(),
            &["input"],
            Constraint::id("missing"),
        );
        let err = finder.require().unwrap_err();
        match err {
            AutomationError::NoElementFound(message) => {
                assert!(message.contains("id = 'missing'"));
                assert!(message.contains("<input>"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn sequence_is_restartable_over_a_mutated_page() {
        let page = sample_page();
        let finder = ElementFinder::new(
            page.collection().unwrap(),
            &["input"],
            Constraint::name("user"),
        );
        assert_eq!(finder.all().unwrap().len(), 3);
        page.add_element("input", &[("name", "user"), ("id", "fourth")]);
        assert_eq!(finder.all().unwrap().len(), 4);
    }

    #[test]
    fn regex_constraints_compose_with_finding() {
        let page = sample_page();
        let finder = ElementFinder::new(
            page.collection().unwrap(),
            &[],
            Constraint::with_attribute("id", ValueMatcher::pattern_str("^(first|third)$").unwrap()),
        );
        assert_eq!(ids(finder.all().unwrap()), vec!["first", "third"]);
    }

    #[test]
    fn scoped_collection_limits_the_walk_to_a_subtree() {
        let page = FakePage::new("page");
        let form = page.add_element("form", &[("id", "login")]);
        page.add_child_element(&form, "input", &[("name", "user"), ("id", "inside")]);
        page.add_element("input", &[("name", "user"), ("id", "outside")]);

        let scoped = page.scoped_collection(&form).unwrap();
        let finder = ElementFinder::new(scoped, &["input"], Constraint::name("user"));
        assert_eq!(ids(finder.all().unwrap()), vec!["inside"]);
    }
}
