use crate::constraints::AttributeLookup;
use crate::core::NativeElement;
use crate::errors::Result;
use std::cell::RefCell;
use std::collections::HashMap;

/// Cached, per-element view exposing attribute-name → value lookups.
///
/// Wraps exactly one native element. Lookups are normalized to lowercase;
/// known synonyms route to computed values (`text`/`innertext` → visible
/// text, `tag`/`tagname` → tag name) and the `style.` prefix routes to the
/// style namespace. Every result (including an absence) is cached so
/// repeated lookups during one constraint evaluation hit the native layer
/// once. The cache belongs to this element and is never shared.
pub struct AttributeBag<'a, E: NativeElement> {
    element: &'a E,
    cache: RefCell<HashMap<String, Option<String>>>,
}

impl<'a, E: NativeElement> AttributeBag<'a, E> {
    pub fn new(element: &'a E) -> Self {
        Self {
            element,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn element(&self) -> &E {
        self.element
    }

    fn fetch(&self, key: &str) -> Result<Option<String>> {
        if key == "text" || key == "innertext" {
            return self.element.text();
        }
        if key == "tag" || key == "tagname" {
            return Ok(Some(self.element.tag_name()?));
        }
        if let Some(property) = key.strip_prefix("style.") {
            return self.element.style_property(property);
        }
        self.element.attribute(key)
    }
}

impl<E: NativeElement> AttributeLookup for AttributeBag<'_, E> {
    fn value(&self, name: &str) -> Result<Option<String>> {
        let key = name.trim().to_ascii_lowercase();
        if let Some(cached) = self.cache.borrow().get(&key) {
            return Ok(cached.clone());
        }
        let fetched = self.fetch(&key)?;
        self.cache
            .borrow_mut()
            .insert(key, fetched.clone());
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePage;

    #[test]
    fn repeated_lookups_hit_the_native_layer_once() {
        let page = FakePage::new("page");
        let input = page.add_element("input", &[("name", "user")]);
        let bag = AttributeBag::new(&input);

        assert_eq!(bag.value("name").unwrap().as_deref(), Some("user"));
        assert_eq!(bag.value("name").unwrap().as_deref(), Some("user"));
        assert_eq!(bag.value("NAME").unwrap().as_deref(), Some("user"));
        assert_eq!(input.attribute_read_count(), 1);
    }

    #[test]
    fn absences_are_cached_too() {
        let page = FakePage::new("page");
        let input = page.add_element("input", &[]);
        let bag = AttributeBag::new(&input);

        assert_eq!(bag.value("placeholder").unwrap(), None);
        assert_eq!(bag.value("placeholder").unwrap(), None);
        assert_eq!(input.attribute_read_count(), 1);
    }

    #[test]
    fn text_synonyms_route_to_visible_text() {
        let page = FakePage::new("page");
        let link = page.add_element("a", &[("href", "/docs")]);
        link.set_text("Documentation");
        let bag = AttributeBag::new(&link);

        assert_eq!(bag.value("text").unwrap().as_deref(), Some("Documentation"));
        assert_eq!(
            bag.value("innertext").unwrap().as_deref(),
            Some("Documentation")
        );
        assert_eq!(input_reads(&link), 0);
    }

    #[test]
    fn tag_synonyms_route_to_tag_name() {
        let page = FakePage::new("page");
        let button = page.add_element("button", &[]);
        let bag = AttributeBag::new(&button);

        assert_eq!(bag.value("tag").unwrap().as_deref(), Some("button"));
        assert_eq!(bag.value("tagname").unwrap().as_deref(), Some("button"));
    }

    #[test]
    fn style_prefix_routes_to_style_namespace() {
        let page = FakePage::new("page");
        let div = page.add_element("div", &[]);
        div.set_style("display", "none");
        let bag = AttributeBag::new(&div);

        assert_eq!(bag.value("style.display").unwrap().as_deref(), Some("none"));
        assert_eq!(bag.value("style.color").unwrap(), None);
    }

    fn input_reads(element: &crate::testing::FakeElement) -> usize {
        element.attribute_read_count()
    }
}
