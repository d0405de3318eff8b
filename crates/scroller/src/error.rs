//! Error types for the virtual scroller.
//!
//! Two kinds are kept distinct so callers can pattern-match instead of
//! relying on call-site try/catch placement: configuration errors are
//! fatal to `init` and must be fixed by the caller, while per-row render
//! failures are recoverable and swallowed (with logging) inside the
//! render pass.

use thiserror::Error;

/// Fatal configuration error, raised synchronously from
/// [`init`](crate::VirtualScroller::init) before any row work happens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// `total_items` was zero.
    #[error("total_items must be a positive integer")]
    InvalidTotalItems,

    /// `item_height` was zero, negative or not finite.
    #[error("item_height must be a positive finite number, got {0}")]
    InvalidItemHeight(f64),

    /// `container_height` was zero, negative or not finite.
    #[error("container_height must be a positive finite number, got {0}")]
    InvalidContainerHeight(f64),

    /// No `render_item_fn` callback was supplied.
    #[error("render_item_fn is required")]
    MissingRenderItemFn,

    /// `buffered_item_multiplier` was zero.
    #[error("buffered_item_multiplier must be a positive integer")]
    InvalidBufferedItemMultiplier,
}

/// Errors raised by [`VirtualScroller`](crate::VirtualScroller)
/// operations.
#[derive(Debug, Error)]
pub enum ScrollerError {
    /// The supplied configuration failed validation.
    #[error("invalid scroller config: {0}")]
    Config(#[from] ConfigError),

    /// `init` was called on an already-initialized scroller.
    #[error("virtual scroller is already initialized")]
    AlreadyInitialized,

    /// An operation that needs an initialized scroller ran before `init`.
    #[error("virtual scroller is not initialized")]
    NotInitialized,

    /// An operation ran after `destroy`.
    #[error("virtual scroller has been destroyed")]
    Destroyed,
}
