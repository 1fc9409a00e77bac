//! Catalog load failures.
//!
//! These never escape the core: [`crate::catalog::CatalogLoader`] logs them and falls back
//! to an empty catalog.

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("catalog source answered with status {0}")]
    Status(u16),
    #[error("could not decode records: {0}")]
    Decode(String),
    #[error("could not read records: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
