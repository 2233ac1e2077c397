use crate::errors::Result;
use crate::testing::fake::{FakeElement, FakePage};
use scraper::{ElementRef, Html};

/// Build a fake page from an HTML fixture.
///
/// Elements land in document order (depth-first, as parsed) with their
/// attributes and joined text, and parent links are preserved so subtree
/// scoping works. This is test tooling: the parse is a fixture loader, not
/// a rendering engine.
pub fn page_from_html(html: &str) -> Result<FakePage> {
    let document = Html::parse_document(html);
    let page = FakePage::new("page");
    add_subtree(&page, None, document.root_element());
    Ok(page)
}

fn add_subtree(page: &FakePage, parent: Option<&FakeElement>, node: ElementRef<'_>) {
    let attrs: Vec<(&str, &str)> = node.value().attrs().collect();
    let fake = match parent {
        Some(parent) => page.add_child_element(parent, node.value().name(), &attrs),
        None => page.add_element(node.value().name(), &attrs),
    };

    let text = node.text().collect::<Vec<_>>().join(" ");
    let text = text.trim();
    if !text.is_empty() {
        fake.set_text(text);
    }

    for child in node.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            add_subtree(page, Some(&fake), child_element);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::Constraint;
    use crate::core::{Document, ElementCollection, NativeElement};
    use crate::finder::ElementFinder;

    const LOGIN_PAGE: &str = r#"
        <html>
          <body>
            <h1>Sign in</h1>
            <form id="login">
              <input name="user" id="user-field" maxlength="10">
              <input name="pass" type="password">
              <button type="submit">Sign in</button>
            </form>
            <a href="/help">Need help?</a>
          </body>
        </html>
    "#;

    #[test]
    fn elements_arrive_in_document_order_with_attributes() {
        let page = page_from_html(LOGIN_PAGE).unwrap();
        let tags: Vec<String> = page
            .collection()
            .unwrap()
            .elements()
            .unwrap()
            .iter()
            .map(|e| e.tag_name().unwrap())
            .collect();
        assert_eq!(
            tags,
            vec!["html", "head", "body", "h1", "form", "input", "input", "button", "a"]
        );

        let user = page
            .collection()
            .unwrap()
            .element_by_id("user-field")
            .unwrap()
            .unwrap();
        assert_eq!(user.attribute("maxlength").unwrap().as_deref(), Some("10"));
    }

    #[test]
    fn text_is_joined_and_searchable() {
        let page = page_from_html(LOGIN_PAGE).unwrap();
        let finder = ElementFinder::new(
            page.collection().unwrap(),
            &["a"],
            Constraint::text("Need help?"),
        );
        let link = finder.require().unwrap();
        assert_eq!(link.attribute("href").unwrap().as_deref(), Some("/help"));
    }

    #[test]
    fn parent_links_support_subtree_scoping() {
        let page = page_from_html(LOGIN_PAGE).unwrap();
        let form = ElementFinder::new(
            page.collection().unwrap(),
            &["form"],
            Constraint::id("login"),
        )
        .require()
        .unwrap();

        let scoped = page.scoped_collection(&form).unwrap();
        let inputs = scoped.elements_by_tag(&["input".to_string()]).unwrap();
        assert_eq!(inputs.len(), 2);

        // the link sits outside the form
        let links = scoped.elements_by_tag(&["a".to_string()]).unwrap();
        assert!(links.is_empty());
    }
}
