use crate::settings::SettingsError;
use unic_langid::LanguageIdentifier;

/// The closed set of locales a site is published in.
///
/// Exactly one locale is the default and lives at the unprefixed root. Every
/// other locale owns the reserved path prefix `/<tag>`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SupportedLocales {
    default: LanguageIdentifier,
    others: Vec<LanguageIdentifier>,
}

impl SupportedLocales {
    /// Builds the set from the default locale and the full list of locales.
    ///
    /// The default may appear in `locales` and is skipped there. Any other
    /// repeated locale is rejected.
    pub fn new<I>(default: LanguageIdentifier, locales: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = LanguageIdentifier>,
    {
        let mut others: Vec<LanguageIdentifier> = Vec::new();
        for lang in locales {
            if lang == default {
                continue;
            }
            if others.contains(&lang) {
                return Err(SettingsError::DuplicateLocale(lang));
            }
            others.push(lang);
        }

        Ok(Self { default, others })
    }

    /// A site published in a single language.
    pub fn single(default: LanguageIdentifier) -> Self {
        Self {
            default,
            others: Vec::new(),
        }
    }

    pub fn default_locale(&self) -> &LanguageIdentifier {
        &self.default
    }

    pub fn non_default(&self) -> &[LanguageIdentifier] {
        &self.others
    }

    /// Iterates over every supported locale, default first.
    pub fn iter(&self) -> impl Iterator<Item = &LanguageIdentifier> {
        std::iter::once(&self.default).chain(self.others.iter())
    }

    pub fn is_default(&self, lang: &LanguageIdentifier) -> bool {
        lang == &self.default
    }

    pub fn contains(&self, lang: &LanguageIdentifier) -> bool {
        self.iter().any(|candidate| candidate == lang)
    }

    /// Looks up a supported locale by its tag, e.g. `"en"` or `"EN"`.
    pub fn find(&self, tag: &str) -> Option<&LanguageIdentifier> {
        let requested = tag.trim().parse::<LanguageIdentifier>().ok()?;
        self.iter().find(|lang| **lang == requested)
    }

    /// Returns the locale a URL path belongs to.
    ///
    /// Paths under a reserved prefix belong to that locale; everything else,
    /// including malformed paths, belongs to the default locale.
    pub fn locale_for_path(&self, path: &str) -> &LanguageIdentifier {
        self.split_path(path)
            .map(|(lang, _)| lang)
            .unwrap_or(&self.default)
    }

    /// Splits a locale-prefixed path into its locale and the remainder.
    ///
    /// Returns `None` when the path is not under any reserved prefix.
    pub fn split_path<'a>(&self, path: &'a str) -> Option<(&LanguageIdentifier, &'a str)> {
        self.others.iter().find_map(|lang| {
            strip_locale_prefix(lang, path).map(|rest| (lang, rest))
        })
    }

    /// Picks the supported locale that best serves a requested language.
    ///
    /// Tries the exact locale first, then the bare language subtag, then any
    /// supported locale sharing the language subtag.
    pub fn negotiate(&self, requested: &LanguageIdentifier) -> Option<&LanguageIdentifier> {
        fallback_locales(requested)
            .into_iter()
            .find_map(|candidate| self.iter().find(|lang| **lang == candidate))
            .or_else(|| self.iter().find(|lang| lang.language == requested.language))
    }
}

/// Returns the reserved path prefix of a locale, e.g. `/en`.
pub fn path_prefix(lang: &LanguageIdentifier) -> String {
    format!("/{}", lang)
}

/// Strips `/<tag>` from the front of `path` when it is a whole segment.
///
/// `/en`, `/en/`, `/en/about/`, `/en?q` and `/en#top` all match `en`;
/// `/english/` does not.
pub fn strip_locale_prefix<'a>(lang: &LanguageIdentifier, path: &'a str) -> Option<&'a str> {
    let prefix = path_prefix(lang);
    let rest = path.strip_prefix(prefix.as_str())?;
    match rest.chars().next() {
        None | Some('/') | Some('?') | Some('#') => Some(rest),
        Some(_) => None,
    }
}

/// Returns the requested locale followed by its primary language when the
/// request carries region/script/variant subtags.
pub fn fallback_locales(requested: &LanguageIdentifier) -> Vec<LanguageIdentifier> {
    let mut locales = vec![requested.clone()];

    let needs_primary_fallback = requested.script.is_some()
        || requested.region.is_some()
        || requested.variants().next().is_some();

    if needs_primary_fallback
        && let Ok(primary) = requested.language.as_str().parse::<LanguageIdentifier>()
        && !locales.iter().any(|lang| lang == &primary)
    {
        locales.push(primary);
    }

    locales
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use unic_langid::langid;

    fn ja_en() -> SupportedLocales {
        SupportedLocales::new(langid!("ja"), [langid!("ja"), langid!("en")]).unwrap()
    }

    #[test]
    fn fallback_locales_includes_primary_language() {
        let requested = langid!("en-US");

        assert_eq!(
            fallback_locales(&requested),
            vec![langid!("en-US"), langid!("en")]
        );
    }

    #[test]
    fn new_skips_default_and_rejects_duplicates() {
        let locales = ja_en();
        assert_eq!(locales.non_default(), &[langid!("en")]);

        let err = SupportedLocales::new(langid!("ja"), [langid!("en"), langid!("en")]).unwrap_err();
        assert!(matches!(err, SettingsError::DuplicateLocale(lang) if lang == langid!("en")));
    }

    #[rstest]
    #[case("/", "ja")]
    #[case("", "ja")]
    #[case("/services/", "ja")]
    #[case("/en", "en")]
    #[case("/en/", "en")]
    #[case("/en/services/", "en")]
    #[case("/en?ref=nav", "en")]
    #[case("/english/", "ja")]
    #[case("/pages/en/", "ja")]
    #[case("not a path", "ja")]
    fn locale_for_path_matches_whole_segments(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(ja_en().locale_for_path(path).to_string(), expected);
    }

    #[rstest]
    #[case("en-US", Some("en"))]
    #[case("en", Some("en"))]
    #[case("EN-gb", Some("en"))]
    #[case("ja-JP", Some("ja"))]
    #[case("fr-FR", None)]
    fn negotiate_uses_language_subtag(#[case] requested: &str, #[case] expected: Option<&str>) {
        let requested: LanguageIdentifier = requested.parse().unwrap();
        let locales = ja_en();

        assert_eq!(
            locales.negotiate(&requested).map(ToString::to_string),
            expected.map(str::to_string)
        );
    }

    #[test]
    fn negotiate_matches_script_variants_by_language() {
        let locales =
            SupportedLocales::new(langid!("en"), [langid!("zh-Hant"), langid!("de")]).unwrap();

        assert_eq!(
            locales.negotiate(&langid!("zh-TW")),
            Some(&langid!("zh-Hant"))
        );
    }

    #[test]
    fn find_ignores_case_and_whitespace() {
        let locales = ja_en();

        assert_eq!(locales.find(" EN "), Some(&langid!("en")));
        assert_eq!(locales.find("ja"), Some(&langid!("ja")));
        assert_eq!(locales.find("fr"), None);
        assert_eq!(locales.find("not-a-tag!"), None);
    }
}
