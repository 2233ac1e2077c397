use crate::actions::highlight;
use crate::core::{Document, EventWait, NativeElement};
use crate::dom::Element;
use crate::errors::{AutomationError, Result};
use crate::wait;
use std::collections::HashMap;
use tracing::debug;

/// Click a resolved element.
///
/// With `wait_for_complete` the click is dispatched synchronously and the
/// call blocks until the document settles, since clicks routinely trigger
/// navigation. Without it the event is fire-and-forget, for clicks that
/// open dialogs or otherwise never let a synchronous dispatch return.
pub(crate) fn click<D: Document>(element: &Element<'_, D>, wait_for_complete: bool) -> Result<()> {
    if !element.enabled()? {
        return Err(AutomationError::ElementDisabled(element.describe()));
    }

    debug!(element = %element.describe(), wait_for_complete, "click");

    highlight::on(element)?;
    let outcome = fire_click(element, wait_for_complete);
    let restored = highlight::off(element);
    outcome?;
    restored
}

fn fire_click<D: Document>(element: &Element<'_, D>, wait_for_complete: bool) -> Result<()> {
    element.native.focus()?;
    if wait_for_complete {
        element
            .native
            .fire_event("click", &HashMap::new(), EventWait::Block)?;
        wait::wait_for_complete(element.document, &element.config.wait)
    } else {
        element
            .native
            .fire_event("click", &HashMap::new(), EventWait::NoWait)
    }
}
