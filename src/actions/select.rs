use crate::core::{Document, EventWait, NativeElement};
use crate::dom::Element;
use crate::errors::{AutomationError, Result};
use crate::wait;
use std::collections::HashMap;
use tracing::debug;

/// Select or deselect an option element.
///
/// The option's `selected` attribute is set to the boolean's lowercase
/// string form, then a `change` event is fired on the **parent** list: the
/// list, not the option, is what change listeners are attached to. With
/// `wait_for_complete` the event is dispatched synchronously and the call
/// blocks until the document settles; otherwise it is fire-and-forget.
pub(crate) fn set_selected<D: Document>(
    element: &Element<'_, D>,
    selected: bool,
    wait_for_complete: bool,
) -> Result<()> {
    let capabilities = element.capabilities()?;
    if !capabilities.option {
        return Err(AutomationError::UnsupportedOperation(format!(
            "cannot select {}",
            element.describe()
        )));
    }
    if !element.enabled()? {
        return Err(AutomationError::ElementDisabled(element.describe()));
    }

    let native = &element.native;
    native.set_attribute("selected", if selected { "true" } else { "false" })?;

    let list = native.parent()?.ok_or_else(|| {
        AutomationError::Native(format!("option {} has no parent list", native.describe()))
    })?;

    debug!(
        option = %native.describe(),
        list = %list.describe(),
        selected,
        wait_for_complete,
        "option selection changed"
    );

    if wait_for_complete {
        list.fire_event("change", &HashMap::new(), EventWait::Block)?;
        wait::wait_for_complete(element.document, &element.config.wait)
    } else {
        list.fire_event("change", &HashMap::new(), EventWait::NoWait)
    }
}
