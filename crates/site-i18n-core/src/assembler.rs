//! Fetches shared HTML fragments and injects them into page placeholders.

use crate::dom::Document;
use crate::fetch::{FetchError, FragmentFetcher};
use crate::locale::strip_locale_prefix;
use crate::resolver::rooted_rest;
use crate::settings::{ComponentDescriptor, SiteSettings};
use futures::future::join_all;
use std::sync::Arc;
use unic_langid::LanguageIdentifier;

/// Notification sent to observers after a fragment has been injected.
#[derive(Debug)]
pub struct ComponentLoaded<'a, El> {
    pub name: &'a str,
    pub element: &'a El,
}

type Observer<El> = Box<dyn Fn(&ComponentLoaded<'_, El>)>;

/// What happened to a single component.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ComponentOutcome {
    Loaded,
    /// No component with that name is registered.
    Unknown,
    /// The page has no element matching the component's selector.
    PlaceholderMissing,
    /// The fragment could not be retrieved; the placeholder is untouched.
    LoadFailed(FetchError),
}

/// Summary of one [`ComponentAssembler::load_all`] run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AssemblyReport {
    /// Outcome per component, in registration order.
    pub outcomes: Vec<(String, ComponentOutcome)>,
    /// Whether the widget library was found and re-initialized.
    pub widgets_refreshed: bool,
    /// Number of navigation elements marked active.
    pub highlighted: usize,
}

impl AssemblyReport {
    pub fn outcome(&self, name: &str) -> Option<&ComponentOutcome> {
        self.outcomes
            .iter()
            .find(|(component, _)| component == name)
            .map(|(_, outcome)| outcome)
    }

    pub fn loaded_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == ComponentOutcome::Loaded)
            .count()
    }
}

pub struct ComponentAssembler<D: Document, F> {
    settings: Arc<SiteSettings>,
    document: D,
    fetcher: F,
    observers: Vec<Observer<D::Element>>,
}

impl<D: Document, F: FragmentFetcher> ComponentAssembler<D, F> {
    pub fn new(settings: Arc<SiteSettings>, document: D, fetcher: F) -> Self {
        Self {
            settings,
            document,
            fetcher,
            observers: Vec::new(),
        }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Registers a callback invoked after every successful injection.
    pub fn on_loaded<O>(&mut self, observer: O)
    where
        O: Fn(&ComponentLoaded<'_, D::Element>) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// The fragment filename of component `name` for `locale`.
    ///
    /// Non-default locales get their tag inserted before the extension:
    /// `header.html` becomes `header-en.html`.
    pub fn fragment_file(&self, name: &str, locale: &LanguageIdentifier) -> Option<String> {
        let component = self.settings.components().get(name)?;
        Some(self.localized_file(component, locale))
    }

    fn localized_file(&self, component: &ComponentDescriptor, locale: &LanguageIdentifier) -> String {
        if self.settings.locales().is_default(locale) {
            return component.file.clone();
        }

        let file = component.file.as_str();
        let name_start = file.rfind('/').map_or(0, |idx| idx + 1);
        match file[name_start..].rfind('.') {
            Some(dot) if dot > 0 => {
                let (stem, ext) = file.split_at(name_start + dot);
                format!("{}-{}{}", stem, locale, ext)
            },
            _ => format!("{}-{}", file, locale),
        }
    }

    /// Joins the fragment base path and `file` with a single slash.
    pub fn fragment_url(&self, file: &str) -> String {
        let base = self.settings.fragment_base().trim_end_matches('/');
        let file = file.trim_start_matches('/');
        if base.is_empty() && !self.settings.fragment_base().starts_with('/') {
            file.to_string()
        } else {
            format!("{}/{}", base, file)
        }
    }

    /// Loads one component into its placeholder.
    ///
    /// Never fails: problems are logged and reported through the outcome.
    pub async fn load_one(&self, name: &str, locale: &LanguageIdentifier) -> ComponentOutcome {
        let Some(component) = self.settings.components().get(name) else {
            tracing::warn!("Component '{}' is not registered", name);
            return ComponentOutcome::Unknown;
        };

        let Some(element) = self.document.query_selector(&component.selector) else {
            tracing::warn!(
                "Placeholder '{}' for component '{}' not found",
                component.selector,
                name
            );
            return ComponentOutcome::PlaceholderMissing;
        };

        let url = self.fragment_url(&self.localized_file(component, locale));
        match self.fetcher.fetch(&url).await {
            Ok(html) => {
                self.document.replace_content(&element, &html);
                tracing::debug!("Loaded component '{}' from '{}'", name, url);
                self.notify(name, &element);
                ComponentOutcome::Loaded
            },
            Err(e) => {
                tracing::error!("Failed to load component '{}' from '{}': {}", name, url, e);
                ComponentOutcome::LoadFailed(e)
            },
        }
    }

    fn notify(&self, name: &str, element: &D::Element) {
        let event = ComponentLoaded { name, element };
        for observer in &self.observers {
            observer(&event);
        }
    }

    /// Loads every registered component concurrently, then re-initializes
    /// widgets and highlights the navigation once all loads have settled.
    pub async fn load_all(&self, locale: &LanguageIdentifier, current_path: &str) -> AssemblyReport {
        let names: Vec<&str> = self
            .settings
            .components()
            .iter()
            .map(|component| component.name.as_str())
            .collect();

        let outcomes = join_all(names.iter().map(|name| self.load_one(name, locale))).await;

        let widgets_refreshed = match self.settings.widget_hook() {
            Some(hook) => {
                let refreshed = self.document.refresh_widgets(hook);
                if !refreshed {
                    tracing::debug!("Widget library '{}' not present, skipping refresh", hook);
                }
                refreshed
            },
            None => false,
        };

        let highlighted = self.highlight_active_nav(current_path, locale);

        AssemblyReport {
            outcomes: names
                .into_iter()
                .map(str::to_string)
                .zip(outcomes)
                .collect(),
            widgets_refreshed,
            highlighted,
        }
    }

    /// Marks the navigation elements pointing at the current page as active.
    ///
    /// Returns the number of elements marked.
    pub fn highlight_active_nav(&self, current_path: &str, locale: &LanguageIdentifier) -> usize {
        let relative = if self.settings.locales().is_default(locale) {
            current_path.to_string()
        } else {
            strip_locale_prefix(locale, current_path)
                .map_or_else(|| current_path.to_string(), rooted_rest)
        };
        let normalized = relative
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let is_root = matches!(normalized, "/" | "" | "/index.html");

        let mut marked = 0;
        for (element, page) in self.document.nav_elements(self.settings.nav_attribute()) {
            let active = (page == *self.settings.home_marker() && is_root)
                || normalized.contains(&format!("/pages/{}/", page));
            if active {
                self.document
                    .mark_active(&element, self.settings.active_classes());
                marked += 1;
            }
        }
        marked
    }
}
