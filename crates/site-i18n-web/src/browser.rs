use crate::{
    BootError, COMPONENT_LOADED_EVENT, SWITCHER_ATTRIBUTE, settings_from_toml, widget_hook_path,
};
use site_i18n_core::{
    BootOutcome, Document, Environment, FetchError, FragmentFetcher, NavigationKind, SiteRuntime,
    SiteSettings, StorageError,
};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::{JsCast as _, JsValue};
use wasm_bindgen_futures::JsFuture;

type BrowserRuntime = SiteRuntime<BrowserEnvironment, BrowserDocument, BrowserFetcher>;

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// `window.location`, `localStorage` and `navigator.language`.
#[derive(Clone, Debug)]
pub struct BrowserEnvironment {
    window: web_sys::Window,
}

impl BrowserEnvironment {
    pub fn new(window: web_sys::Window) -> Self {
        Self { window }
    }

    fn storage(&self) -> Result<web_sys::Storage, StorageError> {
        match self.window.local_storage() {
            Ok(Some(storage)) => Ok(storage),
            Ok(None) => Err(StorageError::Unavailable(
                "localStorage is not provided".to_string(),
            )),
            Err(e) => Err(StorageError::Unavailable(describe(&e))),
        }
    }
}

impl Environment for BrowserEnvironment {
    fn current_path(&self) -> String {
        self.window
            .location()
            .pathname()
            .unwrap_or_else(|_| "/".to_string())
    }

    fn current_hash(&self) -> String {
        self.window.location().hash().unwrap_or_default()
    }

    fn read_preference(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StorageError::Rejected(describe(&e)))
    }

    fn write_preference(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Rejected(describe(&e)))
    }

    fn browser_language_tag(&self) -> Option<String> {
        self.window.navigator().language()
    }

    fn navigate_to(&self, url: &str, kind: NavigationKind) {
        let location = self.window.location();
        let result = match kind {
            NavigationKind::Replace => location.replace(url),
            NavigationKind::Push => location.assign(url),
        };
        if let Err(e) = result {
            tracing::error!("Navigation to '{}' failed: {}", url, describe(&e));
        }
    }
}

/// The live page DOM.
#[derive(Clone, Debug)]
pub struct BrowserDocument {
    window: web_sys::Window,
    document: web_sys::Document,
}

impl BrowserDocument {
    pub fn new(window: web_sys::Window, document: web_sys::Document) -> Self {
        Self { window, document }
    }

    fn elements_with(&self, attribute: &str) -> Vec<web_sys::Element> {
        let nodes = match self.document.query_selector_all(&format!("[{}]", attribute)) {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::warn!("Cannot query '[{}]': {}", attribute, describe(&e));
                return Vec::new();
            },
        };

        (0..nodes.length())
            .filter_map(|index| nodes.item(index))
            .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
            .collect()
    }
}

impl Document for BrowserDocument {
    type Element = web_sys::Element;

    fn query_selector(&self, selector: &str) -> Option<web_sys::Element> {
        match self.document.query_selector(selector) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Invalid selector '{}': {}", selector, describe(&e));
                None
            },
        }
    }

    fn replace_content(&self, element: &web_sys::Element, html: &str) {
        element.set_inner_html(html);
    }

    fn nav_elements(&self, attribute: &str) -> Vec<(web_sys::Element, String)> {
        self.elements_with(attribute)
            .into_iter()
            .filter_map(|element| {
                element
                    .get_attribute(attribute)
                    .map(|value| (element, value))
            })
            .collect()
    }

    fn mark_active(&self, element: &web_sys::Element, classes: &[String]) {
        let class_list = element.class_list();
        for class in classes {
            if let Err(e) = class_list.add_1(class) {
                tracing::warn!("Cannot add class '{}': {}", class, describe(&e));
            }
        }
        if let Err(e) = element.set_attribute("aria-current", "page") {
            tracing::warn!("Cannot set aria-current: {}", describe(&e));
        }
    }

    fn refresh_widgets(&self, hook: &str) -> bool {
        let path = widget_hook_path(hook);
        if path.is_empty() {
            return false;
        }

        let mut owner: JsValue = self.window.clone().into();
        let mut target = owner.clone();
        for segment in path {
            owner = target;
            target = match js_sys::Reflect::get(&owner, &JsValue::from_str(segment)) {
                Ok(value) if !value.is_undefined() && !value.is_null() => value,
                _ => return false,
            };
        }

        let Some(function) = target.dyn_ref::<js_sys::Function>() else {
            tracing::debug!("Widget hook '{}' is not a function", hook);
            return false;
        };

        match function.call0(&owner) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Widget hook '{}' threw: {}", hook, describe(&e));
                false
            },
        }
    }

    fn set_language(&self, tag: &str) {
        if let Some(root) = self.document.document_element()
            && let Err(e) = root.set_attribute("lang", tag)
        {
            tracing::warn!("Cannot set document language: {}", describe(&e));
        }
    }
}

/// Fragment retrieval through `window.fetch`.
#[derive(Clone, Debug)]
pub struct BrowserFetcher {
    window: web_sys::Window,
}

impl BrowserFetcher {
    pub fn new(window: web_sys::Window) -> Self {
        Self { window }
    }
}

impl FragmentFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let transport = |e: JsValue| FetchError::Transport(describe(&e));

        let response = JsFuture::from(self.window.fetch_with_str(url))
            .await
            .map_err(transport)?;
        let response: web_sys::Response = response.dyn_into().map_err(transport)?;
        if !response.ok() {
            return Err(FetchError::Status(response.status()));
        }

        let body = JsFuture::from(response.text().map_err(transport)?)
            .await
            .map_err(transport)?;
        body.as_string()
            .ok_or_else(|| FetchError::Transport("response body is not text".to_string()))
    }
}

/// Starts the page-load sequence for the current page.
///
/// Returns once the work is scheduled; assembly continues on the browser's
/// event loop.
pub fn boot(settings: SiteSettings) -> Result<(), BootError> {
    let window = web_sys::window().ok_or(BootError::NoWindow)?;
    let document = window.document().ok_or(BootError::NoDocument)?;

    let mut runtime = SiteRuntime::new(
        settings,
        BrowserEnvironment::new(window.clone()),
        BrowserDocument::new(window.clone(), document.clone()),
        BrowserFetcher::new(window),
    );

    let target = document.clone();
    runtime
        .assembler_mut()
        .on_loaded(move |event| dispatch_loaded(&target, event.name, event.element));

    let runtime = Rc::new(runtime);
    wasm_bindgen_futures::spawn_local(async move {
        match runtime.start().await {
            BootOutcome::Redirected => {},
            BootOutcome::Assembled(report) => {
                tracing::debug!(
                    "Assembled {} of {} component(s)",
                    report.loaded_count(),
                    report.outcomes.len()
                );
                bind_switcher(&runtime, &document);
            },
        }
    });

    Ok(())
}

/// JavaScript entry point: `startSite(configToml)`.
#[wasm_bindgen(js_name = startSite)]
pub fn start_site(config: &str) -> Result<(), JsValue> {
    let settings = settings_from_toml(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    boot(settings).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn dispatch_loaded(document: &web_sys::Document, name: &str, element: &web_sys::Element) {
    let detail = js_sys::Object::new();
    let fields = [
        ("name", JsValue::from_str(name)),
        ("element", element.clone().into()),
    ];
    for (key, value) in fields {
        if let Err(e) = js_sys::Reflect::set(&detail, &JsValue::from_str(key), &value) {
            tracing::warn!("Cannot build event detail: {}", describe(&e));
        }
    }

    let init = web_sys::CustomEventInit::new();
    init.set_detail(&detail);
    match web_sys::CustomEvent::new_with_event_init_dict(COMPONENT_LOADED_EVENT, &init) {
        Ok(event) => {
            if let Err(e) = document.dispatch_event(&event) {
                tracing::warn!("Cannot dispatch {}: {}", COMPONENT_LOADED_EVENT, describe(&e));
            }
        },
        Err(e) => tracing::warn!("Cannot create {}: {}", COMPONENT_LOADED_EVENT, describe(&e)),
    }
}

/// Points every `[data-lang]` element at its locale and switches on click.
fn bind_switcher(runtime: &Rc<BrowserRuntime>, document: &web_sys::Document) {
    let resolver = runtime.resolver();
    let env = resolver.environment();
    let links = resolver.switcher_links(&env.current_path(), &env.current_hash());

    let switchers = BrowserDocument::new(env.window.clone(), document.clone())
        .elements_with(SWITCHER_ATTRIBUTE);
    for element in switchers {
        let Some(tag) = element.get_attribute(SWITCHER_ATTRIBUTE) else {
            continue;
        };

        let link = resolver
            .settings()
            .locales()
            .find(&tag)
            .and_then(|locale| links.iter().find(|link| &link.locale == locale));
        if let Some(link) = link {
            if element.tag_name().eq_ignore_ascii_case("a")
                && let Err(e) = element.set_attribute("href", &link.url)
            {
                tracing::warn!("Cannot set switcher href: {}", describe(&e));
            }
            if link.active && let Err(e) = element.set_attribute("aria-current", "true") {
                tracing::warn!("Cannot mark active switcher: {}", describe(&e));
            }
        }

        let runtime = Rc::clone(runtime);
        let handler = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            event.prevent_default();
            let resolver = runtime.resolver();
            let env = resolver.environment();
            let outcome = resolver.switch_locale(&tag, &env.current_path(), &env.current_hash());
            tracing::debug!("Language switch to '{}': {:?}", tag, outcome);
        });
        if let Err(e) =
            element.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())
        {
            tracing::warn!("Cannot bind language switcher: {}", describe(&e));
        }
        handler.forget();
    }
}
