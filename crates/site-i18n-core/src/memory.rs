//! In-memory implementations of the capability traits.
//!
//! These back the test suites and let the routing and assembly logic run
//! outside a browser.

use crate::dom::Document;
use crate::env::{Environment, NavigationKind, StorageError};
use crate::fetch::{FetchError, FragmentFetcher};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

#[derive(Debug)]
struct EnvState {
    path: String,
    hash: String,
    storage: HashMap<String, String>,
    storage_available: bool,
    language_tag: Option<String>,
    navigations: Vec<(String, NavigationKind)>,
}

/// A fake browser window: location, local storage and navigator language.
#[derive(Debug)]
pub struct MemoryEnvironment {
    state: Mutex<EnvState>,
}

impl MemoryEnvironment {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(EnvState {
                path: path.into(),
                hash: String::new(),
                storage: HashMap::new(),
                storage_available: true,
                language_tag: None,
                navigations: Vec::new(),
            }),
        }
    }

    pub fn with_hash(self, hash: impl Into<String>) -> Self {
        self.state.lock().hash = hash.into();
        self
    }

    pub fn with_language_tag(self, tag: impl Into<String>) -> Self {
        self.state.lock().language_tag = Some(tag.into());
        self
    }

    pub fn with_preference(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.state.lock().storage.insert(key.into(), value.into());
        self
    }

    /// Makes every storage access fail, like a browser with storage disabled.
    pub fn with_storage_disabled(self) -> Self {
        self.state.lock().storage_available = false;
        self
    }

    pub fn stored(&self, key: &str) -> Option<String> {
        self.state.lock().storage.get(key).cloned()
    }

    /// Every navigation requested so far, oldest first.
    pub fn navigations(&self) -> Vec<(String, NavigationKind)> {
        self.state.lock().navigations.clone()
    }
}

impl Environment for MemoryEnvironment {
    fn current_path(&self) -> String {
        self.state.lock().path.clone()
    }

    fn current_hash(&self) -> String {
        self.state.lock().hash.clone()
    }

    fn read_preference(&self, key: &str) -> Result<Option<String>, StorageError> {
        let state = self.state.lock();
        if !state.storage_available {
            return Err(StorageError::Unavailable("storage disabled".to_string()));
        }
        Ok(state.storage.get(key).cloned())
    }

    fn write_preference(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        if !state.storage_available {
            return Err(StorageError::Unavailable("storage disabled".to_string()));
        }
        state.storage.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn browser_language_tag(&self) -> Option<String> {
        self.state.lock().language_tag.clone()
    }

    fn navigate_to(&self, url: &str, kind: NavigationKind) {
        self.state.lock().navigations.push((url.to_string(), kind));
    }
}

#[derive(Debug, Default)]
struct ElementState {
    html: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
}

/// Shared handle to a fake DOM element.
#[derive(Clone, Debug, Default)]
pub struct MemoryElement(Arc<Mutex<ElementState>>);

impl MemoryElement {
    pub fn html(&self) -> String {
        self.0.lock().html.clone()
    }

    pub fn classes(&self) -> Vec<String> {
        self.0.lock().classes.clone()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.lock().attributes.get(name).cloned()
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.0
            .lock()
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    /// Whether the element is marked as the current page.
    pub fn is_current_page(&self) -> bool {
        self.attribute("aria-current").as_deref() == Some("page")
    }

    pub fn ptr_eq(&self, other: &MemoryElement) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A fake page with placeholders, navigation elements and widget libraries.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    placeholders: Mutex<HashMap<String, MemoryElement>>,
    elements: Mutex<Vec<MemoryElement>>,
    widget_hooks: Mutex<HashSet<String>>,
    widget_refreshes: Mutex<usize>,
    language: Mutex<Option<String>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty element reachable through `selector`.
    pub fn add_placeholder(&self, selector: &str) -> MemoryElement {
        let element = MemoryElement::default();
        self.placeholders
            .lock()
            .insert(selector.to_string(), element.clone());
        element
    }

    /// Adds an element carrying `attribute="value"`.
    pub fn add_tagged(&self, attribute: &str, value: &str) -> MemoryElement {
        let element = MemoryElement::default();
        element.set_attribute(attribute, value);
        self.elements.lock().push(element.clone());
        element
    }

    /// Publishes a widget library under the global name `hook`.
    pub fn install_widget_hook(&self, hook: &str) {
        self.widget_hooks.lock().insert(hook.to_string());
    }

    pub fn widget_refreshes(&self) -> usize {
        *self.widget_refreshes.lock()
    }

    pub fn language(&self) -> Option<String> {
        self.language.lock().clone()
    }
}

impl Document for MemoryDocument {
    type Element = MemoryElement;

    fn query_selector(&self, selector: &str) -> Option<MemoryElement> {
        self.placeholders.lock().get(selector).cloned()
    }

    fn replace_content(&self, element: &MemoryElement, html: &str) {
        element.0.lock().html = html.to_string();
    }

    fn nav_elements(&self, attribute: &str) -> Vec<(MemoryElement, String)> {
        self.elements
            .lock()
            .iter()
            .filter_map(|element| {
                element
                    .attribute(attribute)
                    .map(|value| (element.clone(), value))
            })
            .collect()
    }

    fn mark_active(&self, element: &MemoryElement, classes: &[String]) {
        let mut state = element.0.lock();
        for class in classes {
            if !state.classes.contains(class) {
                state.classes.push(class.clone());
            }
        }
        state
            .attributes
            .insert("aria-current".to_string(), "page".to_string());
    }

    fn refresh_widgets(&self, hook: &str) -> bool {
        if !self.widget_hooks.lock().contains(hook) {
            return false;
        }
        *self.widget_refreshes.lock() += 1;
        true
    }

    fn set_language(&self, tag: &str) {
        *self.language.lock() = Some(tag.to_string());
    }
}

/// A fake network serving canned fragment responses.
///
/// Unknown URLs answer with status 404. Every fetch yields to the executor
/// once before completing, so concurrent fetches interleave.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    responses: HashMap<String, Result<String, FetchError>>,
    log: Mutex<Vec<FetchEvent>>,
}

/// A step in the life of a fake request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FetchEvent {
    Started(String),
    Finished(String),
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fragment(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.responses.insert(url.into(), Ok(html.into()));
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>, error: FetchError) -> Self {
        self.responses.insert(url.into(), Err(error));
        self
    }

    /// URLs requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.log
            .lock()
            .iter()
            .filter_map(|event| match event {
                FetchEvent::Started(url) => Some(url.clone()),
                FetchEvent::Finished(_) => None,
            })
            .collect()
    }

    pub fn events(&self) -> Vec<FetchEvent> {
        self.log.lock().clone()
    }
}

impl FragmentFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.log.lock().push(FetchEvent::Started(url.to_string()));
        YieldNow(false).await;
        self.log.lock().push(FetchEvent::Finished(url.to_string()));

        self.responses
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)))
    }
}

struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }
        self.0 = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
