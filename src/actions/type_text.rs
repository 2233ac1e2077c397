use crate::actions::highlight;
use crate::core::{Document, EventWait, NativeElement};
use crate::dom::Element;
use crate::errors::{AutomationError, Result};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextEntryMode {
    /// Clear first, then type, then fire `change` and blur.
    Replace,
    /// Type at the end of the current value; no clear, no trailing
    /// change/blur.
    Append,
}

/// Simulated typing.
///
/// Preconditions fail before any DOM mutation: a disabled or read-only
/// field never sees a key event. Every character fires the full
/// key-down/key-press/key-up triple, even for control characters that
/// produce no visible text, so listeners behave as they would for a real
/// user.
pub(crate) fn type_text<D: Document>(
    element: &Element<'_, D>,
    text: &str,
    mode: TextEntryMode,
) -> Result<()> {
    let capabilities = element.capabilities()?;
    if !capabilities.text_entry {
        return Err(AutomationError::UnsupportedOperation(format!(
            "cannot type into {}",
            element.describe()
        )));
    }
    if !element.enabled()? {
        return Err(AutomationError::ElementDisabled(element.describe()));
    }
    if element.read_only()? {
        return Err(AutomationError::ElementReadOnly(element.describe()));
    }

    highlight::on(element)?;
    let outcome = run_entry(element, text, mode);
    let restored = highlight::off(element);
    outcome?;
    restored
}

fn run_entry<D: Document>(
    element: &Element<'_, D>,
    text: &str,
    mode: TextEntryMode,
) -> Result<()> {
    let native = &element.native;
    native.focus()?;

    if mode == TextEntryMode::Replace {
        // select-all, then drop the current value
        native.fire_event("select", &HashMap::new(), EventWait::Block)?;
        native.set_attribute("value", "")?;
    }

    let normalized = normalize_newlines(text);
    let typed = clip_to_capacity(native, &normalized, mode)?;
    if typed.len() < normalized.len() {
        debug!(
            element = %element.describe(),
            requested = normalized.chars().count(),
            typed = typed.chars().count(),
            "input clipped to the field's maxlength"
        );
    }

    for ch in typed.chars() {
        let properties = key_event_properties(ch);
        native.fire_event("keydown", &properties, EventWait::Block)?;
        native.fire_event("keypress", &properties, EventWait::Block)?;
        let current = native.attribute("value")?.unwrap_or_default();
        native.set_attribute("value", &format!("{current}{ch}"))?;
        native.fire_event("keyup", &properties, EventWait::Block)?;
    }

    if mode == TextEntryMode::Replace {
        native.fire_event("change", &HashMap::new(), EventWait::Block)?;
        // typing succeeded even when the trailing blur cannot be fired
        if let Err(err) = native.fire_event("blur", &HashMap::new(), EventWait::NoWait) {
            warn!(element = %element.describe(), error = %err, "blur after typing failed");
        }
    }
    Ok(())
}

/// Windows and bare-carriage-return line endings become a single `\n`.
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Respect a declared `maxlength`: the typed text may not push the value
/// past it. Unparseable declarations (including the DOM's `-1` for "unset")
/// mean no limit.
fn clip_to_capacity<E: NativeElement>(
    native: &E,
    text: &str,
    mode: TextEntryMode,
) -> Result<String> {
    let Some(raw) = native.attribute("maxlength")? else {
        return Ok(text.to_string());
    };
    let Ok(max) = raw.trim().parse::<usize>() else {
        return Ok(text.to_string());
    };
    let used = match mode {
        TextEntryMode::Replace => 0,
        TextEntryMode::Append => native
            .attribute("value")?
            .map(|value| value.chars().count())
            .unwrap_or(0),
    };
    Ok(text.chars().take(max.saturating_sub(used)).collect())
}

fn key_event_properties(ch: char) -> HashMap<String, String> {
    let code = (ch as u32).to_string();
    HashMap::from([
        ("key".to_string(), ch.to_string()),
        ("keyCode".to_string(), code.clone()),
        ("charCode".to_string(), code),
    ])
}
