//! Error taxonomy for catalog operations.
//!
//! Frontends map each variant to a transport status; see the server module
//! of the application crate for the HTTP mapping.

use thiserror::Error;

use crate::models::ItemKey;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// Bad sort token or content-type-specific filter. Carries the message
    /// echoed back to the caller, including the offending value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Item absent or not published. The two cases are indistinguishable.
    #[error("{0} not found")]
    NotFound(ItemKey),

    /// A mutation that requires a viewer identity was called anonymously.
    #[error("a user identity is required")]
    Unauthorized,

    /// Any failure of the underlying store.
    #[error("store unavailable")]
    StoreUnavailable(#[from] anyhow::Error),
}

impl CatalogError {
    pub fn invalid(message: impl Into<String>) -> Self {
        CatalogError::InvalidArgument(message.into())
    }
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
