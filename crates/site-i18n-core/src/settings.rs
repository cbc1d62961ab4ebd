//! Immutable site configuration shared by the resolver and the assembler.

use crate::locale::SupportedLocales;
use bon::Builder;
use getset::Getters;
use thiserror::Error;
use unic_langid::LanguageIdentifier;

pub const DEFAULT_STORAGE_KEY: &str = "site-lang";
pub const DEFAULT_FRAGMENT_BASE: &str = "/components/";
pub const DEFAULT_NAV_ATTRIBUTE: &str = "data-page";
pub const DEFAULT_HOME_MARKER: &str = "home";
pub const DEFAULT_ACTIVE_CLASS: &str = "active";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Locale '{0}' is listed more than once")]
    DuplicateLocale(LanguageIdentifier),
    #[error("Component '{0}' is registered more than once")]
    DuplicateComponent(String),
    #[error("Component '{name}' has an empty {field}")]
    EmptyComponentField { name: String, field: &'static str },
}

/// A shared fragment and the placeholder it is injected into.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComponentDescriptor {
    /// The name of the component, e.g. `header`.
    pub name: String,
    /// CSS selector of the placeholder element.
    pub selector: String,
    /// Fragment filename used for the default locale, e.g. `header.html`.
    pub file: String,
}

impl ComponentDescriptor {
    pub fn new(
        name: impl Into<String>,
        selector: impl Into<String>,
        file: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            file: file.into(),
        }
    }
}

/// The fixed set of components assembled on every page, in registration order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ComponentRegistry {
    components: Vec<ComponentDescriptor>,
}

impl ComponentRegistry {
    pub fn new<I>(components: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = ComponentDescriptor>,
    {
        let mut registry = Vec::new();
        for component in components {
            for (field, value) in [
                ("name", &component.name),
                ("selector", &component.selector),
                ("file", &component.file),
            ] {
                if value.trim().is_empty() {
                    return Err(SettingsError::EmptyComponentField {
                        name: component.name.clone(),
                        field,
                    });
                }
            }

            if registry
                .iter()
                .any(|existing: &ComponentDescriptor| existing.name == component.name)
            {
                return Err(SettingsError::DuplicateComponent(component.name));
            }
            registry.push(component);
        }

        Ok(Self {
            components: registry,
        })
    }

    pub fn get(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.components.iter().find(|component| component.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Everything the resolver and the assembler need to know about a site.
///
/// Constructed once at startup and shared behind an `Arc`.
#[derive(Builder, Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct SiteSettings {
    /// The supported locales.
    locales: SupportedLocales,
    /// Storage key of the persisted locale preference.
    #[builder(into, default = DEFAULT_STORAGE_KEY.to_string())]
    storage_key: String,
    /// Base path the fragment files are served from.
    #[builder(into, default = DEFAULT_FRAGMENT_BASE.to_string())]
    fragment_base: String,
    #[builder(default)]
    components: ComponentRegistry,
    /// Attribute carrying the page identifier on navigation elements.
    #[builder(into, default = DEFAULT_NAV_ATTRIBUTE.to_string())]
    nav_attribute: String,
    /// Page identifier that marks the link to the site root.
    #[builder(into, default = DEFAULT_HOME_MARKER.to_string())]
    home_marker: String,
    /// Classes applied to the active navigation element.
    #[builder(default = vec![DEFAULT_ACTIVE_CLASS.to_string()])]
    active_classes: Vec<String>,
    /// Global name of a widget library to re-initialize after assembly.
    #[builder(into)]
    #[getset(skip)]
    widget_hook: Option<String>,
}

impl SiteSettings {
    pub fn widget_hook(&self) -> Option<&str> {
        self.widget_hook.as_deref()
    }

    pub fn default_locale(&self) -> &LanguageIdentifier {
        self.locales.default_locale()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unic_langid::langid;

    #[test]
    fn builder_applies_defaults() {
        let settings = SiteSettings::builder()
            .locales(SupportedLocales::single(langid!("ja")))
            .build();

        assert_eq!(settings.storage_key(), DEFAULT_STORAGE_KEY);
        assert_eq!(settings.fragment_base(), DEFAULT_FRAGMENT_BASE);
        assert_eq!(settings.nav_attribute(), DEFAULT_NAV_ATTRIBUTE);
        assert_eq!(settings.home_marker(), DEFAULT_HOME_MARKER);
        assert_eq!(settings.active_classes(), &vec!["active".to_string()]);
        assert!(settings.components().is_empty());
        assert_eq!(settings.widget_hook(), None);
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let result = ComponentRegistry::new([
            ComponentDescriptor::new("header", "#header", "header.html"),
            ComponentDescriptor::new("header", "#top", "top.html"),
        ]);

        assert!(matches!(result, Err(SettingsError::DuplicateComponent(name)) if name == "header"));
    }

    #[test]
    fn registry_rejects_empty_fields() {
        let result = ComponentRegistry::new([ComponentDescriptor::new("footer", " ", "footer.html")]);

        assert!(matches!(
            result,
            Err(SettingsError::EmptyComponentField { name, field: "selector" }) if name == "footer"
        ));
    }

    #[test]
    fn registry_keeps_registration_order() {
        let registry = ComponentRegistry::new([
            ComponentDescriptor::new("header", "#header", "header.html"),
            ComponentDescriptor::new("footer", "#footer", "footer.html"),
        ])
        .unwrap();

        let names: Vec<_> = registry.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["header", "footer"]);
        assert_eq!(registry.get("footer").unwrap().file, "footer.html");
        assert!(registry.get("sidebar").is_none());
    }
}
