//! Errors raised while building providers.

use thiserror::Error;

/// An error building a [`StarknetFieldProvider`](crate::StarknetFieldProvider).
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// The auth token is not a valid header value.
    #[error("invalid auth token: {0}")]
    InvalidAuthToken(#[from] reqwest::header::InvalidHeaderValue),
    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}
