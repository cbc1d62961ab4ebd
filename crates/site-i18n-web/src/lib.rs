#![doc = include_str!("../README.md")]

#[cfg(target_arch = "wasm32")]
mod browser;

#[cfg(target_arch = "wasm32")]
pub use browser::{BrowserDocument, BrowserEnvironment, BrowserFetcher, boot, start_site};

use site_i18n_core::SiteSettings;
use site_i18n_toml::{SiteConfig, SiteConfigError};
use thiserror::Error;

/// Name of the `CustomEvent` dispatched on `document` after each injection.
pub const COMPONENT_LOADED_EVENT: &str = "component-loaded";

/// Attribute holding the target locale tag on language switcher elements.
pub const SWITCHER_ATTRIBUTE: &str = "data-lang";

#[derive(Debug, Error)]
pub enum BootError {
    #[error("No browser window is available")]
    NoWindow,
    #[error("The window has no document")]
    NoDocument,
    #[error(transparent)]
    Config(#[from] SiteConfigError),
}

/// Parses an embedded `site.toml` into settings.
pub fn settings_from_toml(config: &str) -> Result<SiteSettings, BootError> {
    Ok(SiteConfig::from_toml_str(config)?.to_settings()?)
}

/// Splits a widget hook such as `lucide.createIcons` into property names.
pub fn widget_hook_path(hook: &str) -> Vec<&str> {
    hook.split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn settings_from_toml_builds_settings() {
        let settings = settings_from_toml(
            r##"
default_locale = "ja"
locales = ["ja", "en"]
widget_hook = "lucide.createIcons"

[[components]]
name = "header"
selector = "#header-placeholder"
file = "header.html"
"##,
        )
        .unwrap();

        assert_eq!(settings.default_locale().to_string(), "ja");
        assert_eq!(settings.widget_hook(), Some("lucide.createIcons"));
        assert_eq!(settings.components().len(), 1);
    }

    #[test]
    fn settings_from_toml_reports_config_errors() {
        let result = settings_from_toml(r#"default_locale = "!!""#);

        assert!(matches!(
            result,
            Err(BootError::Config(
                SiteConfigError::InvalidLanguageIdentifier { .. }
            ))
        ));
    }

    #[rstest]
    #[case("lucide", vec!["lucide"])]
    #[case("lucide.createIcons", vec!["lucide", "createIcons"])]
    #[case(" a..b. ", vec!["a", "b"])]
    #[case("", vec![])]
    fn widget_hook_path_splits_on_dots(#[case] hook: &str, #[case] expected: Vec<&str>) {
        assert_eq!(widget_hook_path(hook), expected);
    }
}
