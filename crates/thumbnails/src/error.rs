//! Error types for thumbnail generation.

use preview_scroller::{BoxError, ScrollerError};
use thiserror::Error;

/// Errors raised by [`Thumbnail`](crate::Thumbnail).
#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// The source page reported non-finite or non-positive dimensions.
    #[error("page {page} has invalid dimensions {width}x{height}")]
    InvalidDimensions { page: usize, width: f64, height: f64 },

    /// Generation for a page failed. The cache entry is reset so a
    /// later request retries instead of deadlocking on a stale
    /// in-progress flag.
    #[error("failed to render thumbnail for page {page}: {source}")]
    Render { page: usize, source: BoxError },

    /// An operation that needs geometry ran before `init`.
    #[error("thumbnail generator is not initialized")]
    NotInitialized,

    /// An operation ran after `destroy`.
    #[error("thumbnail generator has been destroyed")]
    Destroyed,
}

/// Errors raised by [`ThumbnailsSidebar`](crate::ThumbnailsSidebar).
#[derive(Debug, Error)]
pub enum SidebarError {
    /// Geometry or generation setup failed.
    #[error(transparent)]
    Thumbnail(#[from] ThumbnailError),

    /// The underlying virtual scroller rejected its configuration.
    #[error(transparent)]
    Scroller(#[from] ScrollerError),
}
