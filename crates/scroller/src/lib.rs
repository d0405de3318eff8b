//! Preview Virtual Scroller Library
//!
//! Windowed list virtualization over a large, fixed-size item collection.
//!
//! A [`VirtualScroller`] materializes only a bounded contiguous window of
//! rows out of potentially thousands, while reporting a list height that
//! covers the full collection so scrollbar semantics are preserved for
//! the sparse set of rows. Scroll offsets beyond a buffer threshold
//! trigger a single atomic window replacement; smaller movements stay
//! within the pre-rendered buffer and cost nothing.
//!
//! The scroller is headless: rows carry a consumer-supplied content type
//! instead of DOM nodes, produced by the required `render_item_fn`
//! callback. A failing callback is logged and leaves that row present
//! but empty - one bad item never aborts the window.
//!
//! # Example
//!
//! ```
//! use preview_scroller::{ScrollerConfig, VirtualScroller};
//!
//! let mut scroller: VirtualScroller<String> = VirtualScroller::new();
//! let config = ScrollerConfig::new(1000, 100.0, 500.0, |index| {
//!     Ok(Some(format!("row {index}")))
//! });
//! scroller.init(config).unwrap();
//!
//! // 5 rows fit the viewport; 3x that stays materialized.
//! assert_eq!(scroller.rows().len(), 15);
//!
//! // Scrolling far past the buffer re-renders the window.
//! scroller.on_scroll(50_000.0).unwrap();
//! assert_eq!(scroller.rows().first().map(|r| r.index()), Some(495));
//! ```

mod config;
mod error;
mod scroller;

pub use config::{
    BoxError, RenderItemFn, ScrollerConfig, WindowCallback, WindowInfo,
    DEFAULT_BUFFERED_ITEM_MULTIPLIER,
};
pub use error::{ConfigError, ScrollerError};
pub use scroller::{Row, ScrollerStats, VirtualScroller};
