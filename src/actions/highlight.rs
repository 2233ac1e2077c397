use crate::core::{Document, NativeElement};
use crate::dom::Element;
use crate::errors::Result;

const BACKGROUND: &str = "background-color";

/// Turn the highlight on.
///
/// The first call captures the element's current background color before
/// applying the highlight color; nested calls only push the highlight color
/// again, so re-entrant on/off pairs restore the correct original at the
/// end rather than an intermediate highlight.
pub(crate) fn on<D: Document>(element: &Element<'_, D>) -> Result<()> {
    if !element.config.actions.highlight {
        return Ok(());
    }
    let color = &element.config.actions.highlight_color;
    let mut stack = element.highlight_stack.borrow_mut();
    if stack.is_empty() {
        let original = element.native.style_property(BACKGROUND)?;
        element.native.set_style_property(BACKGROUND, color)?;
        stack.push(original);
    } else {
        stack.push(Some(color.clone()));
    }
    Ok(())
}

/// Turn the highlight off: pop once, and only write the style back when the
/// stack empties. An `off` without a matching `on` is a no-op.
pub(crate) fn off<D: Document>(element: &Element<'_, D>) -> Result<()> {
    if !element.config.actions.highlight {
        return Ok(());
    }
    let mut stack = element.highlight_stack.borrow_mut();
    let Some(saved) = stack.pop() else {
        return Ok(());
    };
    if stack.is_empty() {
        let restored = saved.unwrap_or_default();
        element.native.set_style_property(BACKGROUND, &restored)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::actions::CapabilityRegistry;
    use crate::core::Config;
    use crate::dom::Element;
    use crate::testing::FakePage;

    struct Fixture {
        page: FakePage,
        config: Config,
        registry: CapabilityRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                page: FakePage::new("page"),
                config: Config::default(),
                registry: CapabilityRegistry::default(),
            }
        }

        fn element(&self, attrs: &[(&str, &str)]) -> Element<'_, FakePage> {
            Element::new(
                self.page.add_element("input", attrs),
                &self.page,
                &self.config,
                &self.registry,
            )
        }
    }

    #[test]
    fn first_on_captures_and_last_off_restores_the_original() {
        let fixture = Fixture::new();
        let element = fixture.element(&[]);
        element.native().set_style("background-color", "red");
        element.native().clear_style_writes();

        element.highlight(true).unwrap();
        element.highlight(true).unwrap();
        element.highlight(true).unwrap();
        assert_eq!(
            element.native().style("background-color").as_deref(),
            Some("yellow")
        );
        // only the first `on` wrote the style
        assert_eq!(element.native().style_writes().len(), 1);

        element.highlight(false).unwrap();
        element.highlight(false).unwrap();
        // intermediate offs must not touch the style
        assert_eq!(element.native().style_writes().len(), 1);
        assert_eq!(
            element.native().style("background-color").as_deref(),
            Some("yellow")
        );

        element.highlight(false).unwrap();
        assert_eq!(
            element.native().style("background-color").as_deref(),
            Some("red")
        );
    }

    #[test]
    fn an_unset_background_is_cleared_on_restore() {
        let fixture = Fixture::new();
        let element = fixture.element(&[]);

        element.highlight(true).unwrap();
        assert_eq!(
            element.native().style("background-color").as_deref(),
            Some("yellow")
        );
        element.highlight(false).unwrap();
        assert_eq!(element.native().style("background-color"), None);
    }

    #[test]
    fn off_without_on_is_a_no_op() {
        let fixture = Fixture::new();
        let element = fixture.element(&[]);
        element.highlight(false).unwrap();
        assert!(element.native().style_writes().is_empty());
    }

    #[test]
    fn highlighting_can_be_disabled_by_configuration() {
        let mut fixture = Fixture::new();
        fixture.config.actions.highlight = false;
        let element = fixture.element(&[]);
        element.highlight(true).unwrap();
        assert!(element.native().style_writes().is_empty());
    }
}
