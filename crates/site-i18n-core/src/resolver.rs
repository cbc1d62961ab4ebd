//! Locale routing: which language a page is in, whether a first-time visitor
//! should be redirected, and where the language switcher points.

use crate::env::{Environment, NavigationKind};
use crate::locale::{SupportedLocales, path_prefix};
use crate::settings::SiteSettings;
use std::sync::Arc;
use unic_langid::LanguageIdentifier;

/// Result of an explicit language switch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SwitchOutcome {
    /// The requested tag is not a supported locale; nothing happened.
    Rejected,
    /// The preference was stored and the page already shows that locale.
    Unchanged,
    /// The preference was stored and the browser was sent to this URL.
    Navigated(String),
}

/// One entry of a language switcher.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwitcherLink {
    pub locale: LanguageIdentifier,
    pub url: String,
    /// Whether the current page is already in this locale.
    pub active: bool,
}

#[derive(Debug)]
pub struct LocaleResolver<E> {
    settings: Arc<SiteSettings>,
    env: E,
}

impl<E: Environment> LocaleResolver<E> {
    pub fn new(settings: Arc<SiteSettings>, env: E) -> Self {
        Self { settings, env }
    }

    pub fn environment(&self) -> &E {
        &self.env
    }

    pub fn settings(&self) -> &SiteSettings {
        &self.settings
    }

    fn locales(&self) -> &SupportedLocales {
        self.settings.locales()
    }

    /// The locale of the page at `path`, derived from the URL shape alone.
    pub fn resolve_from_path(&self, path: &str) -> &LanguageIdentifier {
        self.locales().locale_for_path(path)
    }

    /// The stored preference, or `None` when nothing usable is stored.
    ///
    /// Storage failures and unsupported stored values are treated as "no
    /// preference".
    pub fn persisted_preference(&self) -> Option<&LanguageIdentifier> {
        let key = self.settings.storage_key();
        match self.env.read_preference(key) {
            Ok(Some(value)) => {
                let locale = self.locales().find(&value);
                if locale.is_none() {
                    tracing::warn!("Ignoring unsupported stored locale '{}'", value);
                }
                locale
            },
            Ok(None) => None,
            Err(e) => {
                tracing::debug!("Locale preference unreadable: {}", e);
                None
            },
        }
    }

    /// Stores `locale` as the preference. Failures are logged and ignored.
    pub fn set_persisted_preference(&self, locale: &LanguageIdentifier) {
        let key = self.settings.storage_key();
        if let Err(e) = self.env.write_preference(key, &locale.to_string()) {
            tracing::warn!("Failed to persist locale preference '{}': {}", locale, e);
        }
    }

    /// The supported locale matching the browser's language, else the default.
    pub fn detect_browser_locale(&self) -> &LanguageIdentifier {
        let locales = self.locales();
        let Some(tag) = self.env.browser_language_tag() else {
            return locales.default_locale();
        };

        match tag.trim().parse::<LanguageIdentifier>() {
            Ok(requested) => locales
                .negotiate(&requested)
                .unwrap_or(locales.default_locale()),
            Err(_) => {
                tracing::debug!("Unparseable browser language tag '{}'", tag);
                locales.default_locale()
            },
        }
    }

    /// Strips every reserved locale prefix from `path`.
    ///
    /// A missing leading `/` is added first, so `en/about/` is treated like
    /// `/en/about/`. A locale root such as `/en` or `/en/` becomes `/`.
    pub fn relative_path(&self, path: &str) -> String {
        let rooted = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        let mut current = rooted.as_str();
        while let Some((_, rest)) = self.locales().split_path(current) {
            current = rest;
        }
        rooted_rest(current)
    }

    /// The URL of the page at `path` in the `target` locale, keeping `hash`.
    pub fn url_for_locale(&self, target: &LanguageIdentifier, path: &str, hash: &str) -> String {
        let relative = self.relative_path(path);
        let mut url = if self.locales().is_default(target) {
            relative
        } else if relative == "/" {
            format!("{}/", path_prefix(target))
        } else {
            format!("{}{}", path_prefix(target), relative)
        };
        url.push_str(&normalize_hash(hash));
        url
    }

    /// Whether a visitor at `path` should be sent to their browser's locale.
    ///
    /// Only first-time visitors (no stored preference) on a default-locale
    /// page whose browser prefers a non-default locale qualify.
    pub fn should_auto_redirect(&self, path: &str) -> bool {
        if self.persisted_preference().is_some() {
            return false;
        }
        let locales = self.locales();
        locales.is_default(self.resolve_from_path(path))
            && !locales.is_default(self.detect_browser_locale())
    }

    /// Redirects without a history entry when [`Self::should_auto_redirect`]
    /// holds. Returns `true` when the page is navigating away.
    pub fn maybe_auto_redirect(&self, path: &str, hash: &str) -> bool {
        if !self.should_auto_redirect(path) {
            return false;
        }

        let target = self.detect_browser_locale();
        let url = self.url_for_locale(target, path, hash);
        tracing::info!("Redirecting first-time visitor to '{}' ({})", url, target);
        self.env.navigate_to(&url, NavigationKind::Replace);
        true
    }

    /// Handles an explicit language switch to the locale tagged `target`.
    pub fn switch_locale(&self, target: &str, path: &str, hash: &str) -> SwitchOutcome {
        let Some(locale) = self.locales().find(target) else {
            tracing::warn!("Ignoring switch to unsupported locale '{}'", target);
            return SwitchOutcome::Rejected;
        };

        self.set_persisted_preference(locale);

        let url = self.url_for_locale(locale, path, hash);
        let current = format!("{}{}", path, normalize_hash(hash));
        if url == current {
            return SwitchOutcome::Unchanged;
        }

        tracing::info!("Switching locale to {} at '{}'", locale, url);
        self.env.navigate_to(&url, NavigationKind::Push);
        SwitchOutcome::Navigated(url)
    }

    /// Page-load bookkeeping. Returns `true` when a redirect is under way and
    /// the caller must stop initializing the page.
    pub fn initialize(&self, path: &str, hash: &str) -> bool {
        if self.maybe_auto_redirect(path, hash) {
            return true;
        }

        if self.persisted_preference().is_none() {
            let locale = self.resolve_from_path(path);
            tracing::debug!("Recording first-visit locale {}", locale);
            self.set_persisted_preference(locale);
        }
        false
    }

    /// [`Self::initialize`] for the environment's current location.
    pub fn initialize_from_env(&self) -> bool {
        let path = self.env.current_path();
        let hash = self.env.current_hash();
        self.initialize(&path, &hash)
    }

    /// Links to the current page in every supported locale, default first.
    pub fn switcher_links(&self, path: &str, hash: &str) -> Vec<SwitcherLink> {
        let current = self.resolve_from_path(path);
        self.locales()
            .iter()
            .map(|locale| SwitcherLink {
                locale: locale.clone(),
                url: self.url_for_locale(locale, path, hash),
                active: locale == current,
            })
            .collect()
    }
}

/// Renders what is left after a locale prefix as an absolute path.
///
/// `""` becomes `/`, and a bare query or fragment (`?q`, `#top`) is hung off
/// the root.
pub(crate) fn rooted_rest(rest: &str) -> String {
    if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{}", rest)
    }
}

fn normalize_hash(hash: &str) -> String {
    match hash.trim_start_matches('#') {
        "" => String::new(),
        fragment => format!("#{}", fragment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEnvironment;
    use rstest::rstest;
    use unic_langid::langid;

    fn settings() -> Arc<SiteSettings> {
        Arc::new(
            SiteSettings::builder()
                .locales(SupportedLocales::new(langid!("ja"), [langid!("en")]).unwrap())
                .build(),
        )
    }

    #[rstest]
    #[case("", "")]
    #[case("#", "")]
    #[case("#contact", "#contact")]
    #[case("contact", "#contact")]
    fn normalize_hash_adds_single_marker(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_hash(input), expected);
    }

    #[rstest]
    #[case("/", "/")]
    #[case("", "/")]
    #[case("/en", "/")]
    #[case("/en/", "/")]
    #[case("/en/services/", "/services/")]
    #[case("/en/en/services/", "/services/")]
    #[case("/services/", "/services/")]
    #[case("services/", "/services/")]
    #[case("/en?ref=nav", "/?ref=nav")]
    #[case("en/about/", "/about/")]
    #[case("en", "/")]
    fn relative_path_strips_prefixes(#[case] path: &str, #[case] expected: &str) {
        let env = MemoryEnvironment::new("/");
        let resolver = LocaleResolver::new(settings(), &env);

        assert_eq!(resolver.relative_path(path), expected);
    }

    #[test]
    fn unsupported_stored_value_counts_as_absent() {
        let env = MemoryEnvironment::new("/").with_preference("site-lang", "fr");
        let resolver = LocaleResolver::new(settings(), &env);

        assert_eq!(resolver.persisted_preference(), None);
    }

    #[test]
    fn storage_failures_degrade_silently() {
        let env = MemoryEnvironment::new("/").with_storage_disabled();
        let resolver = LocaleResolver::new(settings(), &env);

        resolver.set_persisted_preference(&langid!("en"));

        assert_eq!(resolver.persisted_preference(), None);
        assert!(!resolver.initialize("/", ""));
        assert!(env.navigations().is_empty());
    }

    #[rstest]
    #[case(None, "ja")]
    #[case(Some("en-US"), "en")]
    #[case(Some("en"), "en")]
    #[case(Some("ja-JP"), "ja")]
    #[case(Some("de-DE"), "ja")]
    #[case(Some("???"), "ja")]
    fn detect_browser_locale_maps_language_subtag(
        #[case] tag: Option<&str>,
        #[case] expected: &str,
    ) {
        let mut env = MemoryEnvironment::new("/");
        if let Some(tag) = tag {
            env = env.with_language_tag(tag);
        }
        let resolver = LocaleResolver::new(settings(), &env);

        assert_eq!(resolver.detect_browser_locale().to_string(), expected);
    }

    #[test]
    fn switcher_links_cover_every_locale() {
        let env = MemoryEnvironment::new("/en/services/");
        let resolver = LocaleResolver::new(settings(), &env);

        let links = resolver.switcher_links("/en/services/", "#faq");

        assert_eq!(
            links,
            vec![
                SwitcherLink {
                    locale: langid!("ja"),
                    url: "/services/#faq".to_string(),
                    active: false,
                },
                SwitcherLink {
                    locale: langid!("en"),
                    url: "/en/services/#faq".to_string(),
                    active: true,
                },
            ]
        );
    }
}
