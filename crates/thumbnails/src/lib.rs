//! Preview Thumbnails Library
//!
//! Page-thumbnail generation for the preview sidebar.
//!
//! [`Thumbnail`] turns a consumer-supplied [`PageRenderer`] into memoized
//! per-page images: results live in a FIFO-bounded cache, concurrent
//! requests for a page already being generated are deduplicated through
//! the cache's in-progress flag, and generation work is staggered across
//! frames by an explicit request queue with cancel-on-destroy semantics.
//!
//! [`ThumbnailsSidebar`] wires a [`Thumbnail`] to a
//! [`VirtualScroller`](preview_scroller::VirtualScroller): it computes the
//! thumbnail geometry from the first page, materializes cheap placeholder
//! rows, and requests images for the rendered window with on-screen rows
//! ahead of merely buffered ones.
//!
//! # Example
//!
//! ```
//! use preview_thumbnails::{BoxError, PageRenderer, ThumbnailImage, ThumbnailsSidebar};
//!
//! struct SolidRenderer;
//!
//! impl PageRenderer for SolidRenderer {
//!     fn page_count(&self) -> usize {
//!         100
//!     }
//!
//!     fn page_dimensions(&self, _page: usize) -> Result<(f64, f64), BoxError> {
//!         Ok((612.0, 792.0))
//!     }
//!
//!     fn rasterize(&self, _page: usize, width: u32, height: u32) -> Result<ThumbnailImage, BoxError> {
//!         Ok(ThumbnailImage {
//!             width,
//!             height,
//!             pixels: vec![0xff; (width * height * 4) as usize],
//!         })
//!     }
//! }
//!
//! let mut sidebar = ThumbnailsSidebar::new(SolidRenderer);
//! sidebar.init(600.0).unwrap();
//!
//! // Drive the frame loop until the queued generations drain.
//! while sidebar.process_frame().is_some() {}
//!
//! assert!(sidebar
//!     .scroller()
//!     .rows()
//!     .iter()
//!     .all(|row| row.content().is_some_and(|c| c.loaded)));
//! ```

mod error;
mod frame;
mod sidebar;
mod thumbnail;

pub use error::{SidebarError, ThumbnailError};
pub use frame::{CancellationToken, FrameQueue, RequestId};
pub use preview_scroller::BoxError;
pub use sidebar::{ThumbnailRow, ThumbnailsSidebar, SIDEBAR_MARGIN};
pub use thumbnail::{
    Completion, PageRenderer, RequestOutcome, Thumbnail, ThumbnailEntry, ThumbnailImage,
    ThumbnailOptions, THUMBNAIL_IMAGE_WIDTH, THUMBNAIL_TOTAL_WIDTH,
};
