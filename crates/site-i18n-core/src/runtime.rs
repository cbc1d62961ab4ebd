use crate::assembler::{AssemblyReport, ComponentAssembler};
use crate::dom::Document;
use crate::env::Environment;
use crate::fetch::FragmentFetcher;
use crate::resolver::LocaleResolver;
use crate::settings::SiteSettings;
use std::sync::Arc;

/// How a page load ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BootOutcome {
    /// The visitor is being sent to another locale; the page is unloading.
    Redirected,
    /// The page stayed and its components were assembled.
    Assembled(AssemblyReport),
}

/// Wires a [`LocaleResolver`] and a [`ComponentAssembler`] to one set of
/// settings and runs them in page-load order.
pub struct SiteRuntime<E, D: Document, F> {
    resolver: LocaleResolver<E>,
    assembler: ComponentAssembler<D, F>,
}

impl<E, D, F> SiteRuntime<E, D, F>
where
    E: Environment,
    D: Document,
    F: FragmentFetcher,
{
    pub fn new(settings: SiteSettings, env: E, document: D, fetcher: F) -> Self {
        let settings = Arc::new(settings);
        Self {
            resolver: LocaleResolver::new(Arc::clone(&settings), env),
            assembler: ComponentAssembler::new(settings, document, fetcher),
        }
    }

    pub fn resolver(&self) -> &LocaleResolver<E> {
        &self.resolver
    }

    pub fn assembler(&self) -> &ComponentAssembler<D, F> {
        &self.assembler
    }

    /// Mutable access, e.g. to register load observers before [`Self::start`].
    pub fn assembler_mut(&mut self) -> &mut ComponentAssembler<D, F> {
        &mut self.assembler
    }

    /// Runs the page-load sequence: locale bookkeeping and the optional
    /// first-visit redirect, then component assembly in the page's locale.
    pub async fn start(&self) -> BootOutcome {
        let env = self.resolver.environment();
        let path = env.current_path();
        let hash = env.current_hash();

        if self.resolver.initialize(&path, &hash) {
            return BootOutcome::Redirected;
        }

        let locale = self.resolver.resolve_from_path(&path);
        self.assembler.document().set_language(&locale.to_string());
        tracing::debug!("Assembling '{}' in locale {}", path, locale);

        BootOutcome::Assembled(self.assembler.load_all(locale, &path).await)
    }
}
