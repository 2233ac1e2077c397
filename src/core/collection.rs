use crate::core::element::NativeElement;
use crate::errors::Result;

/// Enumeration primitive the element finder drives.
///
/// Implementations must yield elements in native document order. A
/// collection may be re-queried at any time; it is a live view, not a
/// snapshot.
pub trait ElementCollection {
    type Element: NativeElement;

    /// All elements of the collection, in document order.
    fn elements(&self) -> Result<Vec<Self::Element>>;

    /// Elements whose tag name is in `tags` (case-insensitive), in document
    /// order. Backends override this when they can filter natively.
    fn elements_by_tag(&self, tags: &[String]) -> Result<Vec<Self::Element>> {
        let mut matching = Vec::new();
        for element in self.elements()? {
            let tag = element.tag_name()?;
            if tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                matching.push(element);
            }
        }
        Ok(matching)
    }

    /// Fast path for id lookups. The default implementation scans.
    fn element_by_id(&self, id: &str) -> Result<Option<Self::Element>> {
        for element in self.elements()? {
            if element.attribute("id")?.as_deref() == Some(id) {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }
}
