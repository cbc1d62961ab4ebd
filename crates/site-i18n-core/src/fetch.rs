use thiserror::Error;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FetchError {
    #[error("Server answered with status {0}")]
    Status(u16),
    #[error("Request failed: {0}")]
    Transport(String),
}

/// Retrieves fragment markup over the network.
///
/// Implementations run on a single-threaded executor, so the returned future
/// is not required to be `Send`.
#[allow(async_fn_in_trait)]
pub trait FragmentFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<T: FragmentFetcher + ?Sized> FragmentFetcher for &T {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url).await
    }
}
