//! Thumbnail sidebar: virtual scroller plus memoized generation.
//!
//! Rows are materialized cheaply as placeholders; the actual images are
//! produced by the shared [`Thumbnail`] generator and attached to rows
//! as the host drains the frame queue. Rows rebuilt after a scroll pick
//! their image straight from the cache, so a page is only ever
//! rasterized once while its cache entry lives.

use std::sync::{Arc, Mutex};

use preview_scroller::{ScrollerConfig, VirtualScroller, WindowInfo};
use tracing::warn;

use crate::error::SidebarError;
use crate::thumbnail::{Completion, PageRenderer, Thumbnail, ThumbnailImage, ThumbnailOptions};

/// Vertical gap between thumbnails, and the list's top/bottom margin,
/// in pixels.
pub const SIDEBAR_MARGIN: f64 = 15.0;

/// Content of one sidebar row.
#[derive(Debug, Clone)]
pub struct ThumbnailRow {
    /// Page this row shows.
    pub page_index: usize,
    /// Whether the image has been generated and attached.
    pub loaded: bool,
    /// The thumbnail image, once generated.
    pub image: Option<ThumbnailImage>,
}

/// Scrollable sidebar of page thumbnails.
///
/// Owns a [`VirtualScroller`] of [`ThumbnailRow`]s and a [`Thumbnail`]
/// generator shared with the scroller callbacks. Whenever the rendered
/// window changes, image requests are issued for every row in the new
/// window with the on-screen rows first, so visible thumbnails resolve
/// before merely buffered ones.
pub struct ThumbnailsSidebar<R> {
    thumbnail: Arc<Mutex<Thumbnail<R>>>,
    scroller: VirtualScroller<ThumbnailRow>,
}

impl<R: PageRenderer + 'static> ThumbnailsSidebar<R> {
    /// Create a sidebar with default generation options.
    pub fn new(renderer: R) -> Self {
        Self::with_options(renderer, ThumbnailOptions::default())
    }

    /// Create a sidebar with explicit generation options.
    pub fn with_options(renderer: R, options: ThumbnailOptions) -> Self {
        Self {
            thumbnail: Arc::new(Mutex::new(Thumbnail::with_options(renderer, options))),
            scroller: VirtualScroller::new(),
        }
    }

    /// Initialize the sidebar for a viewport of `container_height`
    /// pixels.
    ///
    /// Computes the shared thumbnail geometry from the first page, then
    /// initializes the scroller and issues image requests for the
    /// initial window. A first page with unusable dimensions aborts the
    /// whole initialization; no rows are created.
    pub fn init(&mut self, container_height: f64) -> Result<(), SidebarError> {
        let (thumbnail_height, page_count) = {
            let mut thumbnail = self.thumbnail.lock().unwrap();
            let height = thumbnail.init()?;
            (height, thumbnail.page_count())
        };

        let item_height = f64::from(thumbnail_height) + SIDEBAR_MARGIN;

        let render_handle = Arc::clone(&self.thumbnail);
        let init_handle = Arc::clone(&self.thumbnail);
        let scroll_handle = Arc::clone(&self.thumbnail);

        let config = ScrollerConfig::new(
            page_count,
            item_height,
            container_height,
            // Rows are cheap placeholders; a page already in the cache
            // is attached immediately so re-rendered windows never wait
            // for a second generation.
            move |index| {
                let image = render_handle.lock().unwrap().cached_image(index).cloned();
                Ok(Some(ThumbnailRow {
                    page_index: index,
                    loaded: image.is_some(),
                    image,
                }))
            },
        )
        .with_margin(SIDEBAR_MARGIN)
        .on_init(move |info| Self::request_window(&init_handle, info))
        .on_scroll_end(move |info| Self::request_window(&scroll_handle, info));

        self.scroller.init(config)?;
        Ok(())
    }

    /// Feed a scroll offset through to the scroller.
    ///
    /// When the movement is large enough to re-render the window, image
    /// requests for the new window are issued before this returns.
    pub fn on_scroll(&mut self, scroll_top: f64) -> Result<(), SidebarError> {
        self.scroller.on_scroll(scroll_top)?;
        Ok(())
    }

    /// Scroll so the thumbnail for `page_index` is visible, requesting
    /// images for the new window when one is rendered.
    pub fn scroll_into_view(&mut self, page_index: usize) -> Result<(), SidebarError> {
        self.scroller.scroll_into_view(page_index)?;
        Ok(())
    }

    /// Propagate a viewport height change.
    pub fn resize(&mut self, container_height: f64) -> Result<(), SidebarError> {
        self.scroller.resize(container_height)?;
        Ok(())
    }

    /// Drain one pending generation request and attach the produced
    /// image to its row, if that row is still materialized.
    ///
    /// Returns `None` when no work is pending. Intended to be called
    /// once per animation frame by the host.
    pub fn process_frame(&mut self) -> Option<Completion> {
        let completion = self.thumbnail.lock().unwrap().process_next()?;

        if let Ok(image) = &completion.result {
            // A row evicted from the window by a scroll in the meantime
            // simply keeps the image in the cache for its next render.
            if let Some(row) = self.scroller.item_content_mut(completion.page_index) {
                row.loaded = true;
                row.image = Some(image.clone());
            }
        }

        Some(completion)
    }

    /// Number of image requests waiting to be drained.
    pub fn pending_requests(&self) -> usize {
        self.thumbnail.lock().unwrap().pending_requests()
    }

    /// The underlying scroller, for row and geometry queries.
    pub fn scroller(&self) -> &VirtualScroller<ThumbnailRow> {
        &self.scroller
    }

    /// Tear down the sidebar: cancel pending generation requests,
    /// release the image cache and destroy the scroller. Idempotent.
    pub fn destroy(&mut self) {
        self.thumbnail.lock().unwrap().destroy();
        self.scroller.destroy();
    }

    /// Issue image requests for every row of `info`'s window, visible
    /// rows first.
    fn request_window(thumbnail: &Arc<Mutex<Thumbnail<R>>>, info: &WindowInfo) {
        let mut thumbnail = thumbnail.lock().unwrap();
        let visible = info.visible.clone();
        let exclude = visible.clone();
        let buffered = info.window().filter(move |index| !exclude.contains(index));

        for page_index in visible.chain(buffered) {
            if let Err(err) = thumbnail.request(page_index) {
                warn!(page_index, %err, "thumbnail request rejected");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ThumbnailError;
    use preview_scroller::{BoxError, ScrollerError};
    use std::collections::HashSet;

    struct StubRenderer {
        pages: usize,
        dimensions: (f64, f64),
        rasterized: Arc<Mutex<Vec<usize>>>,
        failing: HashSet<usize>,
    }

    impl StubRenderer {
        fn new(pages: usize) -> Self {
            Self {
                pages,
                dimensions: (612.0, 792.0),
                rasterized: Arc::new(Mutex::new(Vec::new())),
                failing: HashSet::new(),
            }
        }

        fn call_log(&self) -> Arc<Mutex<Vec<usize>>> {
            Arc::clone(&self.rasterized)
        }
    }

    impl PageRenderer for StubRenderer {
        fn page_count(&self) -> usize {
            self.pages
        }

        fn page_dimensions(&self, _page: usize) -> Result<(f64, f64), BoxError> {
            Ok(self.dimensions)
        }

        fn rasterize(
            &self,
            page: usize,
            width: u32,
            height: u32,
        ) -> Result<ThumbnailImage, BoxError> {
            self.rasterized.lock().unwrap().push(page);
            if self.failing.contains(&page) {
                return Err(format!("rasterize failed for page {page}").into());
            }
            Ok(ThumbnailImage {
                width,
                height,
                pixels: vec![0u8; (width * height * 4) as usize],
            })
        }
    }

    /// 100 US-letter pages and a 600px viewport: thumbnail height 195,
    /// row height 210, 3 visible rows, 9 materialized rows.
    fn init_sidebar(renderer: StubRenderer) -> ThumbnailsSidebar<StubRenderer> {
        let mut sidebar = ThumbnailsSidebar::new(renderer);
        sidebar.init(600.0).unwrap();
        sidebar
    }

    fn drain(sidebar: &mut ThumbnailsSidebar<StubRenderer>) -> Vec<usize> {
        std::iter::from_fn(|| sidebar.process_frame())
            .map(|completion| completion.page_index)
            .collect()
    }

    #[test]
    fn test_init_builds_placeholder_rows() {
        let sidebar = init_sidebar(StubRenderer::new(100));

        let rows = sidebar.scroller().rows();
        assert_eq!(rows.len(), 9);
        for row in rows {
            let content = row.content().unwrap();
            assert_eq!(content.page_index, row.index());
            assert!(!content.loaded);
            assert!(content.image.is_none());
        }

        // Full list height regardless of materialization.
        assert_eq!(sidebar.scroller().list_height(), 100.0 * 210.0 + 30.0);
        // One request per materialized row.
        assert_eq!(sidebar.pending_requests(), 9);
    }

    #[test]
    fn test_init_aborts_on_invalid_first_page() {
        let mut renderer = StubRenderer::new(100);
        renderer.dimensions = (612.0, 0.0);

        let mut sidebar = ThumbnailsSidebar::new(renderer);
        let err = sidebar.init(600.0).unwrap_err();
        assert!(matches!(
            err,
            SidebarError::Thumbnail(ThumbnailError::InvalidDimensions { page: 0, .. })
        ));
        assert!(!sidebar.scroller().is_initialized());
        assert!(sidebar.scroller().rows().is_empty());
    }

    #[test]
    fn test_init_rejects_empty_document() {
        let mut sidebar = ThumbnailsSidebar::new(StubRenderer::new(0));
        let err = sidebar.init(600.0).unwrap_err();
        assert!(matches!(
            err,
            SidebarError::Scroller(ScrollerError::Config(_))
        ));
    }

    #[test]
    fn test_frame_loop_attaches_images() {
        let mut sidebar = init_sidebar(StubRenderer::new(100));

        assert_eq!(drain(&mut sidebar), vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(sidebar.pending_requests(), 0);

        for row in sidebar.scroller().rows() {
            let content = row.content().unwrap();
            assert!(content.loaded);
            let image = content.image.as_ref().unwrap();
            assert_eq!(image.width, 300);
            assert_eq!(image.height, 389);
        }
    }

    #[test]
    fn test_visible_rows_requested_first() {
        let mut sidebar = init_sidebar(StubRenderer::new(100));
        drain(&mut sidebar);

        // Jump to an uncached region. Window is 47..56; visible rows
        // are 50..53 and must be generated before the buffered ones.
        sidebar.scroll_into_view(50).unwrap();
        assert_eq!(
            drain(&mut sidebar),
            vec![50, 51, 52, 47, 48, 49, 53, 54, 55]
        );
    }

    #[test]
    fn test_rerendered_window_reuses_cached_images() {
        let renderer = StubRenderer::new(100);
        let calls = renderer.call_log();
        let mut sidebar = init_sidebar(renderer);
        drain(&mut sidebar);

        sidebar.scroll_into_view(50).unwrap();
        drain(&mut sidebar);
        assert_eq!(calls.lock().unwrap().len(), 18);

        // Back to the top: every row in the window was generated
        // before, so rows come back loaded with zero new requests.
        sidebar.scroll_into_view(0).unwrap();
        assert_eq!(sidebar.pending_requests(), 0);
        assert!(sidebar.process_frame().is_none());
        assert!(sidebar
            .scroller()
            .rows()
            .iter()
            .all(|row| row.content().is_some_and(|c| c.loaded)));
        assert_eq!(calls.lock().unwrap().len(), 18);
    }

    #[test]
    fn test_small_scroll_schedules_nothing() {
        let mut sidebar = init_sidebar(StubRenderer::new(100));
        drain(&mut sidebar);

        // Within the buffer threshold: no re-render, no new requests.
        sidebar.on_scroll(100.0).unwrap();
        assert_eq!(sidebar.pending_requests(), 0);
    }

    #[test]
    fn test_scroll_beyond_buffer_requests_new_window() {
        let mut sidebar = init_sidebar(StubRenderer::new(100));
        drain(&mut sidebar);

        // 2000px > 630px buffer; window moves to 6..15, of which 6..9
        // are already cached.
        sidebar.on_scroll(2000.0).unwrap();
        assert_eq!(sidebar.pending_requests(), 6);
        assert_eq!(drain(&mut sidebar), vec![9, 10, 11, 12, 13, 14]);
    }

    #[test]
    fn test_failed_generation_leaves_row_placeholder() {
        let mut renderer = StubRenderer::new(100);
        renderer.failing.insert(2);
        let mut sidebar = init_sidebar(renderer);

        let mut failures = 0;
        while let Some(completion) = sidebar.process_frame() {
            if completion.result.is_err() {
                assert_eq!(completion.page_index, 2);
                failures += 1;
            }
        }
        assert_eq!(failures, 1);

        let rows = sidebar.scroller().rows();
        assert!(!rows[2].content().unwrap().loaded);
        assert!(rows[3].content().unwrap().loaded);
    }

    #[test]
    fn test_destroy_cancels_pending_generation() {
        let renderer = StubRenderer::new(100);
        let calls = renderer.call_log();
        let mut sidebar = init_sidebar(renderer);
        assert_eq!(sidebar.pending_requests(), 9);

        sidebar.destroy();
        assert!(sidebar.process_frame().is_none());
        assert!(calls.lock().unwrap().is_empty());
        assert!(sidebar.scroller().rows().is_empty());

        // Idempotent.
        sidebar.destroy();
    }

    #[test]
    fn test_resize_passthrough() {
        let mut sidebar = init_sidebar(StubRenderer::new(100));
        drain(&mut sidebar);

        // 300px viewport: 2 view items, 6 materialized rows. The
        // shrink path re-renders; cached rows come back loaded.
        sidebar.resize(300.0).unwrap();
        assert_eq!(sidebar.scroller().max_rendered_items(), 6);
        assert_eq!(sidebar.scroller().rows().len(), 6);
        assert!(sidebar
            .scroller()
            .rows()
            .iter()
            .all(|row| row.content().is_some_and(|c| c.loaded)));
    }
}
