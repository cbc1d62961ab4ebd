#![doc = include_str!("../README.md")]

pub mod assembler;
pub mod dom;
pub mod env;
pub mod fetch;
pub mod locale;
pub mod memory;
pub mod resolver;
pub mod runtime;
pub mod settings;

// Re-export the key structs and traits for easy top-level access.
pub use assembler::{AssemblyReport, ComponentAssembler, ComponentLoaded, ComponentOutcome};
pub use dom::Document;
pub use env::{Environment, NavigationKind, StorageError};
pub use fetch::{FetchError, FragmentFetcher};
pub use locale::SupportedLocales;
pub use resolver::{LocaleResolver, SwitchOutcome, SwitcherLink};
pub use runtime::{BootOutcome, SiteRuntime};
pub use settings::{ComponentDescriptor, ComponentRegistry, SettingsError, SiteSettings};

pub use unic_langid::{LanguageIdentifier, langid};
