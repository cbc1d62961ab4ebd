use thiserror::Error;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StorageError {
    #[error("Persistent storage is unavailable: {0}")]
    Unavailable(String),
    #[error("Persistent storage rejected the operation: {0}")]
    Rejected(String),
}

/// How a navigation affects the session history.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NavigationKind {
    /// Replace the current history entry (automatic redirects).
    Replace,
    /// Push a new history entry, like following a link.
    Push,
}

/// Browser-global state the locale resolver depends on.
///
/// Production code binds this to `window.location`, `localStorage` and
/// `navigator.language`; tests use [`crate::memory::MemoryEnvironment`].
pub trait Environment {
    /// Path of the current URL, e.g. `/en/services/`.
    fn current_path(&self) -> String;

    /// Fragment of the current URL including the `#`, or an empty string.
    fn current_hash(&self) -> String;

    fn read_preference(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn write_preference(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// The user agent's preferred language tag, if it reports one.
    fn browser_language_tag(&self) -> Option<String>;

    fn navigate_to(&self, url: &str, kind: NavigationKind);
}

impl<T: Environment + ?Sized> Environment for &T {
    fn current_path(&self) -> String {
        (**self).current_path()
    }

    fn current_hash(&self) -> String {
        (**self).current_hash()
    }

    fn read_preference(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).read_preference(key)
    }

    fn write_preference(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).write_preference(key, value)
    }

    fn browser_language_tag(&self) -> Option<String> {
        (**self).browser_language_tag()
    }

    fn navigate_to(&self, url: &str, kind: NavigationKind) {
        (**self).navigate_to(url, kind)
    }
}
