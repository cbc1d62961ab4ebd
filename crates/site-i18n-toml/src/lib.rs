#![doc = include_str!("../README.md")]

use serde::{Deserialize, Serialize};
use site_i18n_core::{
    ComponentDescriptor, ComponentRegistry, SettingsError, SiteSettings, SupportedLocales,
};
use std::path::Path;
use thiserror::Error;
use unic_langid::{LanguageIdentifier, LanguageIdentifierError};

pub const CONFIG_FILE_NAME: &str = "site.toml";

#[derive(Debug, Error)]
pub enum SiteConfigError {
    /// Configuration file not found.
    #[error("site.toml configuration file not found")]
    NotFound,
    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),
    /// A locale entry is not a valid language identifier.
    #[error("Invalid language identifier '{name}'")]
    InvalidLanguageIdentifier {
        /// The invalid identifier.
        name: String,
        /// The parsing error produced by `unic-langid`.
        #[source]
        source: LanguageIdentifierError,
    },
    /// A locale uses a subtag combination that cannot form a URL prefix.
    #[error("Language identifier '{name}' is not supported: {reason}")]
    UnsupportedLanguageIdentifier {
        /// The offending identifier.
        name: String,
        /// Explanation of why it is not supported.
        reason: String,
    },
    /// `locales` is non-empty but omits `default_locale`.
    #[error("Default locale '{0}' is missing from `locales`")]
    DefaultLocaleNotListed(String),
    /// The values parsed but do not form a consistent site.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Represents the `active_classes` field in `site.toml`.
/// Supports both a whitespace-separated string and an array of strings.
///
/// # Examples
///
/// ```toml
/// active_classes = "text-primary font-semibold"
/// ```
///
/// ```toml
/// active_classes = ["text-primary", "font-semibold"]
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ClassList {
    /// Classes separated by whitespace.
    Single(String),
    /// One class per entry.
    Multiple(Vec<String>),
}

impl ClassList {
    /// Returns the classes as a vector of strings.
    pub fn as_vec(&self) -> Vec<String> {
        match self {
            ClassList::Single(s) => s.split_whitespace().map(str::to_string).collect(),
            ClassList::Multiple(v) => v
                .iter()
                .map(|class| class.trim())
                .filter(|class| !class.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Returns true if there are no classes.
    pub fn is_empty(&self) -> bool {
        self.as_vec().is_empty()
    }
}

/// One `[[components]]` table.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ComponentConfig {
    /// The component name, e.g. `header`.
    pub name: String,
    /// CSS selector of the placeholder element.
    pub selector: String,
    /// Fragment filename for the default locale.
    pub file: String,
}

/// The contents of `site.toml`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SiteConfig {
    /// The locale served from the unprefixed root (e.g., "ja").
    pub default_locale: String,
    /// Every published locale. The default may be listed or omitted.
    #[serde(default)]
    pub locales: Vec<String>,
    /// Storage key of the persisted locale preference.
    #[serde(default)]
    pub storage_key: Option<String>,
    /// Base path the fragment files are served from.
    #[serde(default)]
    pub fragment_base: Option<String>,
    /// Attribute carrying the page identifier on navigation elements.
    #[serde(default)]
    pub nav_attribute: Option<String>,
    /// Page identifier of the home link.
    #[serde(default)]
    pub home_marker: Option<String>,
    /// Classes applied to the active navigation element.
    #[serde(default)]
    pub active_classes: Option<ClassList>,
    /// Global name of a widget library to re-initialize after assembly.
    #[serde(default)]
    pub widget_hook: Option<String>,
    /// Shared components, assembled in the listed order.
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

impl SiteConfig {
    /// Reads the configuration from a path.
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, SiteConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SiteConfigError::NotFound);
        }

        let content = fs_err::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reads `site.toml` from a directory.
    pub fn read_from_dir(dir: &Path) -> Result<Self, SiteConfigError> {
        Self::read_from_path(dir.join(CONFIG_FILE_NAME))
    }

    /// Parses configuration text, e.g. a `site.toml` embedded with `include_str!`.
    pub fn from_toml_str(content: &str) -> Result<Self, SiteConfigError> {
        let config: SiteConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Returns the configured default locale as a `LanguageIdentifier`.
    pub fn default_locale_identifier(&self) -> Result<LanguageIdentifier, SiteConfigError> {
        parse_locale(&self.default_locale)
    }

    /// Returns every configured locale, default first, without duplicates.
    pub fn locale_identifiers(&self) -> Result<Vec<LanguageIdentifier>, SiteConfigError> {
        Ok(self.supported_locales()?.iter().cloned().collect())
    }

    fn supported_locales(&self) -> Result<SupportedLocales, SiteConfigError> {
        let default = self.default_locale_identifier()?;
        let listed = self
            .locales
            .iter()
            .map(|name| parse_locale(name))
            .collect::<Result<Vec<_>, _>>()?;

        if !listed.is_empty() && !listed.contains(&default) {
            return Err(SiteConfigError::DefaultLocaleNotListed(
                self.default_locale.clone(),
            ));
        }

        Ok(SupportedLocales::new(default, listed)?)
    }

    /// Validates the configuration and builds the runtime settings.
    pub fn to_settings(&self) -> Result<SiteSettings, SiteConfigError> {
        let locales = self.supported_locales()?;
        let components = ComponentRegistry::new(self.components.iter().map(|component| {
            ComponentDescriptor::new(
                component.name.trim(),
                component.selector.trim(),
                component.file.trim(),
            )
        }))?;

        let active_classes = self
            .active_classes
            .as_ref()
            .map(ClassList::as_vec)
            .filter(|classes| !classes.is_empty());

        tracing::debug!(
            "Loaded site configuration with {} locale(s) and {} component(s)",
            locales.iter().count(),
            components.len()
        );

        Ok(SiteSettings::builder()
            .locales(locales)
            .components(components)
            .maybe_storage_key(self.storage_key.clone())
            .maybe_fragment_base(self.fragment_base.clone())
            .maybe_nav_attribute(self.nav_attribute.clone())
            .maybe_home_marker(self.home_marker.clone())
            .maybe_active_classes(active_classes)
            .maybe_widget_hook(self.widget_hook.clone())
            .build())
    }
}

fn parse_locale(name: &str) -> Result<LanguageIdentifier, SiteConfigError> {
    let lang = name.trim().parse::<LanguageIdentifier>().map_err(|source| {
        SiteConfigError::InvalidLanguageIdentifier {
            name: name.to_string(),
            source,
        }
    })?;

    ensure_supported_language_identifier(&lang, name)?;
    Ok(lang)
}

fn ensure_supported_language_identifier(
    lang: &LanguageIdentifier,
    original: &str,
) -> Result<(), SiteConfigError> {
    if lang.variants().next().is_some() {
        return Err(SiteConfigError::UnsupportedLanguageIdentifier {
            name: original.to_string(),
            reason: "variants are not supported".to_string(),
        });
    }

    if lang.language.as_str() == "und" {
        return Err(SiteConfigError::UnsupportedLanguageIdentifier {
            name: original.to_string(),
            reason: "a language subtag is required".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;
    use unic_langid::langid;

    const FULL_CONFIG: &str = r##"
default_locale = "ja"
locales = ["ja", "en"]
storage_key = "corp-lang"
fragment_base = "/partials/"
active_classes = "text-primary font-semibold"
widget_hook = "lucide"

[[components]]
name = "header"
selector = "#header-placeholder"
file = "header.html"

[[components]]
name = "footer"
selector = "#footer-placeholder"
file = "footer.html"
"##;

    #[test]
    fn test_read_from_path_success() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("site.toml");
        fs::write(&config_path, FULL_CONFIG).unwrap();

        let config = SiteConfig::read_from_path(&config_path).unwrap();

        assert_eq!(config.default_locale, "ja");
        assert_eq!(config.locales, vec!["ja", "en"]);
        assert_eq!(config.components.len(), 2);
    }

    #[test]
    fn test_read_from_dir_uses_site_toml() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), FULL_CONFIG).unwrap();

        let config = SiteConfig::read_from_dir(temp_dir.path()).unwrap();

        assert_eq!(config.storage_key.as_deref(), Some("corp-lang"));
    }

    #[test]
    fn test_read_from_path_file_not_found() {
        let result = SiteConfig::read_from_path("/non/existent/path/site.toml");
        assert!(matches!(result, Err(SiteConfigError::NotFound)));
    }

    #[test]
    fn test_read_from_path_invalid_toml() {
        let result = SiteConfig::from_toml_str(
            r#"
locales = ["ja"]
"#,
        );
        assert!(matches!(result, Err(SiteConfigError::ParseError(_))));
    }

    #[test]
    fn test_to_settings_full() {
        let settings = SiteConfig::from_toml_str(FULL_CONFIG)
            .unwrap()
            .to_settings()
            .unwrap();

        assert_eq!(settings.default_locale(), &langid!("ja"));
        assert_eq!(settings.locales().non_default(), &[langid!("en")]);
        assert_eq!(settings.storage_key(), "corp-lang");
        assert_eq!(settings.fragment_base(), "/partials/");
        assert_eq!(settings.nav_attribute(), "data-page");
        assert_eq!(
            settings.active_classes(),
            &vec!["text-primary".to_string(), "font-semibold".to_string()]
        );
        assert_eq!(settings.widget_hook(), Some("lucide"));
        assert_eq!(
            settings.components().get("footer").unwrap().selector,
            "#footer-placeholder"
        );
    }

    #[test]
    fn test_demo_config_is_valid() {
        let settings = SiteConfig::from_toml_str(include_str!("../../../demos/site.toml"))
            .unwrap()
            .to_settings()
            .unwrap();

        assert_eq!(settings.locales().iter().count(), 2);
        assert_eq!(settings.widget_hook(), Some("lucide.createIcons"));
        assert_eq!(settings.components().len(), 2);
    }

    #[test]
    fn test_to_settings_minimal_uses_defaults() {
        let settings = SiteConfig::from_toml_str(r#"default_locale = "en""#)
            .unwrap()
            .to_settings()
            .unwrap();

        assert_eq!(settings.default_locale(), &langid!("en"));
        assert!(settings.locales().non_default().is_empty());
        assert_eq!(settings.storage_key(), "site-lang");
        assert_eq!(settings.active_classes(), &vec!["active".to_string()]);
        assert!(settings.components().is_empty());
    }

    #[rstest]
    #[case("invalid-lang!")]
    #[case("e")]
    fn test_invalid_locale(#[case] name: &str) {
        let config = SiteConfig::from_toml_str(&format!("default_locale = \"{name}\"")).unwrap();

        assert!(matches!(
            config.to_settings(),
            Err(SiteConfigError::InvalidLanguageIdentifier { name: bad, .. }) if bad == name
        ));
    }

    #[test]
    fn test_variant_locale_is_unsupported() {
        let config = SiteConfig::from_toml_str(
            r#"
default_locale = "en"
locales = ["en", "de-DE-1996"]
"#,
        )
        .unwrap();

        assert!(matches!(
            config.locale_identifiers(),
            Err(SiteConfigError::UnsupportedLanguageIdentifier { name, .. }) if name == "de-DE-1996"
        ));
    }

    #[test]
    fn test_default_must_be_listed() {
        let config = SiteConfig::from_toml_str(
            r#"
default_locale = "ja"
locales = ["en", "fr"]
"#,
        )
        .unwrap();

        assert!(matches!(
            config.to_settings(),
            Err(SiteConfigError::DefaultLocaleNotListed(name)) if name == "ja"
        ));
    }

    #[test]
    fn test_duplicate_locale() {
        let config = SiteConfig::from_toml_str(
            r#"
default_locale = "ja"
locales = ["ja", "en", "EN"]
"#,
        )
        .unwrap();

        assert!(matches!(
            config.to_settings(),
            Err(SiteConfigError::Settings(SettingsError::DuplicateLocale(_)))
        ));
    }

    #[test]
    fn test_duplicate_component() {
        let config = SiteConfig::from_toml_str(
            r##"
default_locale = "ja"

[[components]]
name = "header"
selector = "#a"
file = "a.html"

[[components]]
name = "header"
selector = "#b"
file = "b.html"
"##,
        )
        .unwrap();

        assert!(matches!(
            config.to_settings(),
            Err(SiteConfigError::Settings(SettingsError::DuplicateComponent(name))) if name == "header"
        ));
    }

    #[test]
    fn test_locale_identifiers_default_first() {
        let config = SiteConfig::from_toml_str(
            r#"
default_locale = "ja"
locales = ["en", "ja", "zh-Hant"]
"#,
        )
        .unwrap();

        let codes: Vec<String> = config
            .locale_identifiers()
            .unwrap()
            .into_iter()
            .map(|lang| lang.to_string())
            .collect();

        assert_eq!(codes, vec!["ja", "en", "zh-Hant"]);
    }

    #[rstest]
    #[case(r#"active_classes = "a  b""#, vec!["a", "b"])]
    #[case(r#"active_classes = ["a", " b ", ""]"#, vec!["a", "b"])]
    fn test_class_list_forms(#[case] line: &str, #[case] expected: Vec<&str>) {
        let config =
            SiteConfig::from_toml_str(&format!("default_locale = \"ja\"\n{line}")).unwrap();

        assert_eq!(config.active_classes.unwrap().as_vec(), expected);
    }

    #[test]
    fn test_empty_class_list_falls_back_to_default() {
        let settings = SiteConfig::from_toml_str(
            r#"
default_locale = "ja"
active_classes = []
"#,
        )
        .unwrap()
        .to_settings()
        .unwrap();

        assert_eq!(settings.active_classes(), &vec!["active".to_string()]);
    }
}
