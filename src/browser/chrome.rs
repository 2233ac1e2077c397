use crate::core::{
    Backend, Config, Document, ElementCollection, EventWait, NativeElement, ReadyState,
};
use crate::errors::{AutomationError, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::sync::Arc;
use tracing::debug;

/// Attribute stamped onto elements so evaluated JavaScript can refer to the
/// same node across calls.
const REF_ATTRIBUTE: &str = "data-btk-ref";

/// Chrome binding over `headless_chrome`. The whole DOM conversation runs
/// through `tab.evaluate`; elements get a stable identity by stamping a
/// `data-btk-ref` attribute on first enumeration.
pub struct ChromeBackend {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
}

impl ChromeBackend {
    pub fn new() -> Self {
        Self {
            browser: None,
            tab: None,
        }
    }
}

impl Default for ChromeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for ChromeBackend {
    type Document = ChromePage;

    fn launch(&mut self, config: &Config) -> Result<()> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.browser.viewport.width, config.browser.viewport.height
        );
        let user_agent_arg = config
            .browser
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];
        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }
        for arg in &config.browser.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.browser.headless)
            .args(args)
            .build()
            .map_err(|e| AutomationError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| AutomationError::LaunchFailed(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| AutomationError::LaunchFailed(e.to_string()))?;

        self.browser = Some(browser);
        self.tab = Some(tab);
        Ok(())
    }

    fn document(&self) -> Result<ChromePage> {
        let tab = self.tab.clone().ok_or(AutomationError::NotLaunched)?;
        Ok(ChromePage::top(tab))
    }

    fn is_running(&self) -> bool {
        self.browser.is_some()
    }

    fn close(&mut self) -> Result<()> {
        // dropping the handles tears the process down
        self.tab = None;
        self.browser = None;
        Ok(())
    }
}

/// One Chrome document: the top-level page (empty frame path) or a nested
/// frame addressed through `window.frames[..]`.
#[derive(Clone)]
pub struct ChromePage {
    tab: Arc<Tab>,
    frame_path: Vec<usize>,
}

impl ChromePage {
    fn top(tab: Arc<Tab>) -> Self {
        Self {
            tab,
            frame_path: Vec::new(),
        }
    }

    fn window_expr(&self) -> String {
        window_expr_for(&self.frame_path)
    }

    fn document_expr(&self) -> String {
        format!("{}.document", self.window_expr())
    }

    pub(crate) fn eval(&self, script: &str) -> Result<Value> {
        let remote = self
            .tab
            .evaluate(script, false)
            .map_err(|e| AutomationError::ScriptFailed(e.to_string()))?;
        Ok(remote.value.unwrap_or(Value::Null))
    }

    /// Evaluate a script that returns `JSON.stringify(..)` and decode it.
    /// Strings always come back by value, which object results do not.
    fn eval_json<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T> {
        let value = self.eval(script)?;
        let text = value.as_str().ok_or_else(|| {
            AutomationError::ScriptFailed("expected a JSON string result".to_string())
        })?;
        Ok(serde_json::from_str(text)?)
    }
}

impl Document for ChromePage {
    type Element = ChromeElement;
    type Collection = ChromeCollection;

    fn ready_state(&self) -> Result<ReadyState> {
        let script = format!(
            "(() => {{ try {{ return {}.readyState; }} catch (err) {{ return 'loading'; }} }})()",
            self.document_expr()
        );
        let value = self.eval(&script)?;
        Ok(ReadyState::parse(value.as_str().unwrap_or("loading")))
    }

    fn frames(&self) -> Result<Vec<Self>> {
        let script = format!(
            "(() => {{ try {{ return {}.frames.length; }} catch (err) {{ return 0; }} }})()",
            self.window_expr()
        );
        let count = self.eval(&script)?.as_u64().unwrap_or(0) as usize;
        Ok((0..count)
            .map(|index| {
                let mut frame_path = self.frame_path.clone();
                frame_path.push(index);
                ChromePage {
                    tab: self.tab.clone(),
                    frame_path,
                }
            })
            .collect())
    }

    fn collection(&self) -> Result<ChromeCollection> {
        Ok(ChromeCollection {
            page: self.clone(),
            scope: None,
        })
    }

    fn scoped_collection(&self, root: &ChromeElement) -> Result<ChromeCollection> {
        Ok(ChromeCollection {
            page: self.clone(),
            scope: Some(root.ref_id.clone()),
        })
    }

    fn url(&self) -> Result<String> {
        if self.frame_path.is_empty() {
            return Ok(self.tab.get_url());
        }
        let script = format!(
            "(() => {{ try {{ return {}.location.href; }} catch (err) {{ return ''; }} }})()",
            self.document_expr()
        );
        Ok(self
            .eval(&script)?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    fn label(&self) -> String {
        label_for(&self.frame_path)
    }

    fn navigate(&self, url: &str) -> Result<()> {
        if self.frame_path.is_empty() {
            self.tab
                .navigate_to(url)
                .map_err(|e| AutomationError::NavigationFailed(e.to_string()))?;
            self.tab
                .wait_until_navigated()
                .map_err(|e| AutomationError::NavigationFailed(e.to_string()))?;
            return Ok(());
        }
        let script = format!(
            "(() => {{ try {{ {}.location.href = {}; return true; }} catch (err) {{ return false; }} }})()",
            self.window_expr(),
            serde_json::to_string(url)?
        );
        if self.eval(&script)?.as_bool() != Some(true) {
            return Err(AutomationError::NavigationFailed(format!(
                "could not steer {} to {}",
                self.label(),
                url
            )));
        }
        Ok(())
    }
}

fn window_expr_for(frame_path: &[usize]) -> String {
    let mut expr = String::from("window");
    for index in frame_path {
        expr.push_str(&format!(".frames[{}]", index));
    }
    expr
}

fn label_for(frame_path: &[usize]) -> String {
    if frame_path.is_empty() {
        "page".to_string()
    } else {
        let path: Vec<String> = frame_path.iter().map(|i| i.to_string()).collect();
        format!("frame[{}]", path.join("."))
    }
}

#[derive(Deserialize)]
struct StampedRef {
    #[serde(rename = "ref")]
    ref_id: String,
    tag: String,
}

/// Live enumeration over one Chrome document (optionally a subtree).
pub struct ChromeCollection {
    page: ChromePage,
    scope: Option<String>,
}

impl ChromeCollection {
    fn fetch(&self, selector: &str) -> Result<Vec<ChromeElement>> {
        let root_expr = match &self.scope {
            // subtree scope: elements below the scoped root, root excluded
            Some(ref_id) => format!(
                "doc.querySelector('[{}=\"{}\"]')",
                REF_ATTRIBUTE, ref_id
            ),
            None => "doc".to_string(),
        };
        let script = format!(
            r#"(() => {{
                const win = {win};
                const doc = win.document;
                const root = {root};
                if (!root) {{ return JSON.stringify([]); }}
                const found = root.querySelectorAll({selector});
                const out = [];
                for (let i = 0; i < found.length; i++) {{
                    const el = found[i];
                    if (!el.hasAttribute('{ref_attr}')) {{
                        win.__btkRefSeq = (win.__btkRefSeq || 0) + 1;
                        el.setAttribute('{ref_attr}', String(win.__btkRefSeq));
                    }}
                    out.push({{ ref: el.getAttribute('{ref_attr}'), tag: el.tagName.toLowerCase() }});
                }}
                return JSON.stringify(out);
            }})()"#,
            win = self.page.window_expr(),
            root = root_expr,
            selector = serde_json::to_string(selector)?,
            ref_attr = REF_ATTRIBUTE,
        );
        let stamped: Vec<StampedRef> = self.page.eval_json(&script)?;
        debug!(
            count = stamped.len(),
            selector, "enumerated chrome elements"
        );
        Ok(stamped
            .into_iter()
            .map(|s| ChromeElement {
                page: self.page.clone(),
                ref_id: s.ref_id,
                tag: s.tag,
            })
            .collect())
    }
}

impl ElementCollection for ChromeCollection {
    type Element = ChromeElement;

    fn elements(&self) -> Result<Vec<ChromeElement>> {
        self.fetch("*")
    }

    fn elements_by_tag(&self, tags: &[String]) -> Result<Vec<ChromeElement>> {
        if tags.is_empty() {
            return self.elements();
        }
        self.fetch(&tags.join(","))
    }

    fn element_by_id(&self, id: &str) -> Result<Option<ChromeElement>> {
        let script = format!(
            r#"(() => {{
                const win = {win};
                const el = win.document.getElementById({id});
                if (!el) {{ return JSON.stringify(null); }}
                if (!el.hasAttribute('{ref_attr}')) {{
                    win.__btkRefSeq = (win.__btkRefSeq || 0) + 1;
                    el.setAttribute('{ref_attr}', String(win.__btkRefSeq));
                }}
                return JSON.stringify({{ ref: el.getAttribute('{ref_attr}'), tag: el.tagName.toLowerCase() }});
            }})()"#,
            win = self.page.window_expr(),
            id = serde_json::to_string(id)?,
            ref_attr = REF_ATTRIBUTE,
        );
        let stamped: Option<StampedRef> = self.page.eval_json(&script)?;
        Ok(stamped.map(|s| ChromeElement {
            page: self.page.clone(),
            ref_id: s.ref_id,
            tag: s.tag,
        }))
    }
}

#[derive(Deserialize)]
struct ValueProbe {
    found: bool,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Deserialize)]
struct ParentProbe {
    found: bool,
    #[serde(rename = "ref", default)]
    ref_id: Option<String>,
    #[serde(default)]
    tag: Option<String>,
}

/// One stamped element in a Chrome document.
#[derive(Clone)]
pub struct ChromeElement {
    page: ChromePage,
    ref_id: String,
    tag: String,
}

impl ChromeElement {
    /// Wrap `body` in a script that resolves this element first. The body
    /// sees `win`, `doc` and `el`, and must return a stringified object
    /// with a `found` field.
    fn element_script(&self, body: &str) -> String {
        format!(
            r#"(() => {{
                const win = {win};
                const doc = win.document;
                const el = doc.querySelector('[{ref_attr}="{ref_id}"]');
                if (!el) {{ return JSON.stringify({{ found: false }}); }}
                {body}
            }})()"#,
            win = self.page.window_expr(),
            ref_attr = REF_ATTRIBUTE,
            ref_id = self.ref_id,
            body = body,
        )
    }

    fn run(&self, body: &str) -> Result<ValueProbe> {
        let probe: ValueProbe = self.page.eval_json(&self.element_script(body))?;
        if !probe.found {
            return Err(AutomationError::Native(format!(
                "element no longer attached: {}",
                self.describe()
            )));
        }
        Ok(probe)
    }
}

/// Attribute names whose reflected DOM property spells differently.
const PROPERTY_ALIASES: &str =
    "{ readonly: 'readOnly', maxlength: 'maxLength', class: 'className', for: 'htmlFor' }";

impl NativeElement for ChromeElement {
    fn tag_name(&self) -> Result<String> {
        Ok(self.tag.clone())
    }

    fn attribute(&self, name: &str) -> Result<Option<String>> {
        // prefer the live reflected property (value, disabled, href, ...)
        // over the static attribute, like a user-visible read would
        let body = format!(
            r#"const name = {name};
                const aliases = {aliases};
                const prop = aliases[name] || name;
                if (prop in el) {{
                    const v = el[prop];
                    if (typeof v === 'boolean') {{ return JSON.stringify({{ found: true, value: v ? 'true' : 'false' }}); }}
                    if (typeof v === 'string') {{ return JSON.stringify({{ found: true, value: v }}); }}
                    if (typeof v === 'number') {{ return JSON.stringify({{ found: true, value: String(v) }}); }}
                }}
                const attr = el.getAttribute(name);
                return JSON.stringify({{ found: true, value: attr === null ? null : String(attr) }});"#,
            name = serde_json::to_string(&name.to_ascii_lowercase())?,
            aliases = PROPERTY_ALIASES,
        );
        Ok(self.run(&body)?.value)
    }

    fn set_attribute(&self, name: &str, value: &str) -> Result<()> {
        let body = format!(
            r#"const name = {name};
                const value = {value};
                const aliases = {aliases};
                const prop = aliases[name] || name;
                if (prop in el && typeof el[prop] === 'boolean') {{ el[prop] = value === 'true'; }}
                else if (name === 'value' && 'value' in el) {{ el.value = value; }}
                else {{ el.setAttribute(name, value); }}
                return JSON.stringify({{ found: true }});"#,
            name = serde_json::to_string(&name.to_ascii_lowercase())?,
            value = serde_json::to_string(value)?,
            aliases = PROPERTY_ALIASES,
        );
        self.run(&body).map(|_| ())
    }

    fn text(&self) -> Result<Option<String>> {
        Ok(self
            .run("return JSON.stringify({ found: true, value: el.innerText });")?
            .value)
    }

    fn style_property(&self, name: &str) -> Result<Option<String>> {
        let body = format!(
            r#"const name = {name};
                const inline = el.style.getPropertyValue(name);
                if (inline) {{ return JSON.stringify({{ found: true, value: inline }}); }}
                const view = el.ownerDocument.defaultView;
                const computed = view ? view.getComputedStyle(el).getPropertyValue(name) : '';
                return JSON.stringify({{ found: true, value: computed ? computed : null }});"#,
            name = serde_json::to_string(name)?,
        );
        Ok(self.run(&body)?.value)
    }

    fn set_style_property(&self, name: &str, value: &str) -> Result<()> {
        let body = format!(
            r#"const name = {name};
                const value = {value};
                if (value === '') {{ el.style.removeProperty(name); }}
                else {{ el.style.setProperty(name, value); }}
                return JSON.stringify({{ found: true }});"#,
            name = serde_json::to_string(name)?,
            value = serde_json::to_string(value)?,
        );
        self.run(&body).map(|_| ())
    }

    fn fire_event(
        &self,
        name: &str,
        properties: &HashMap<String, String>,
        wait: EventWait,
    ) -> Result<()> {
        let body = format!(
            r#"const name = {name};
                const props = {props};
                const dispatch = () => {{
                    const options = {{ bubbles: true, cancelable: true }};
                    let event;
                    if (name.indexOf('key') === 0) {{
                        event = new KeyboardEvent(name, Object.assign(options, {{ key: props.key || '' }}));
                    }} else if (name === 'click' || name.indexOf('mouse') === 0) {{
                        event = new MouseEvent(name, options);
                    }} else {{
                        event = new Event(name, options);
                    }}
                    el.dispatchEvent(event);
                }};
                if ({block}) {{ dispatch(); }} else {{ setTimeout(dispatch, 0); }}
                return JSON.stringify({{ found: true }});"#,
            name = serde_json::to_string(name)?,
            props = serde_json::to_string(properties)?,
            block = wait == EventWait::Block,
        );
        self.run(&body).map(|_| ())
    }

    fn focus(&self) -> Result<()> {
        self.run(
            "if (typeof el.focus === 'function') { el.focus(); } return JSON.stringify({ found: true });",
        )
        .map(|_| ())
    }

    fn parent(&self) -> Result<Option<Self>> {
        let body = format!(
            r#"const parent = el.parentElement;
                if (!parent) {{ return JSON.stringify({{ found: true, ref: null }}); }}
                if (!parent.hasAttribute('{ref_attr}')) {{
                    win.__btkRefSeq = (win.__btkRefSeq || 0) + 1;
                    parent.setAttribute('{ref_attr}', String(win.__btkRefSeq));
                }}
                return JSON.stringify({{ found: true, ref: parent.getAttribute('{ref_attr}'), tag: parent.tagName.toLowerCase() }});"#,
            ref_attr = REF_ATTRIBUTE,
        );
        let probe: ParentProbe = self.page.eval_json(&self.element_script(&body))?;
        if !probe.found {
            return Err(AutomationError::Native(format!(
                "element no longer attached: {}",
                self.describe()
            )));
        }
        Ok(match (probe.ref_id, probe.tag) {
            (Some(ref_id), Some(tag)) => Some(ChromeElement {
                page: self.page.clone(),
                ref_id,
                tag,
            }),
            _ => None,
        })
    }

    fn describe(&self) -> String {
        format!(
            "<{} {}=\"{}\"> in {}",
            self.tag,
            REF_ATTRIBUTE,
            self.ref_id,
            self.page.label()
        )
    }
}
