//! Memoized per-page thumbnail generation.
//!
//! The cache entry's `in_progress` flag is the sole mechanism preventing
//! duplicate in-flight generation: requests for a page that is already
//! being generated resolve to a no-op sentinel instead of re-triggering
//! work. This is safe because every mutation happens on the single
//! event-loop thread between suspension points - there is no lock, only
//! cooperative checking of shared state before issuing new work.

use preview_cache::BoundedCache;
use preview_scroller::BoxError;
use tracing::debug;

use crate::error::ThumbnailError;
use crate::frame::{FrameQueue, RequestId};

/// Width thumbnails are laid out at, in pixels (sidebar width minus
/// margins).
pub const THUMBNAIL_TOTAL_WIDTH: f64 = 150.0;

/// Width thumbnails are rasterized at. Twice the layout width so the
/// image stays sharp on high-density displays.
pub const THUMBNAIL_IMAGE_WIDTH: u32 = (THUMBNAIL_TOTAL_WIDTH as u32) * 2;

/// A rasterized page image (RGBA).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Raw pixel data.
    pub pixels: Vec<u8>,
}

/// Cache entry for one page.
///
/// Lifecycle: absent -> `{in_progress: true}` (request issued) ->
/// `{in_progress: false, image: Some(..)}` (request completed). Terminal
/// for that key unless externally invalidated; a failed generation
/// resets the entry to absent so future attempts are not deadlocked.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailEntry {
    /// A generation request for this page has been issued and has not
    /// completed yet.
    pub in_progress: bool,
    /// The completed image, if any.
    pub image: Option<ThumbnailImage>,
}

/// Source of page content, provided by the consumer.
///
/// Failures reject the individual request; the thumbnail layer does not
/// retry, it resets the cache entry and moves on to the next item.
pub trait PageRenderer {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Intrinsic (unscaled) width and height of a page.
    fn page_dimensions(&self, page: usize) -> Result<(f64, f64), BoxError>;

    /// Rasterize a page into an image of exactly `width` x `height`.
    fn rasterize(&self, page: usize, width: u32, height: u32) -> Result<ThumbnailImage, BoxError>;
}

/// Per-request generation options.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailOptions {
    /// Override for the rasterization width; defaults to
    /// [`THUMBNAIL_IMAGE_WIDTH`].
    pub max_width: Option<u32>,
}

/// Outcome of a thumbnail request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The image is already cached; no work was scheduled.
    Cached,
    /// Generation for this page is already in flight; the caller must
    /// not duplicate the request.
    InFlight,
    /// A new generation request was queued.
    Scheduled(RequestId),
}

/// Record of one drained generation request.
#[derive(Debug)]
pub struct Completion {
    /// Id the request was scheduled under.
    pub request_id: RequestId,
    /// Page the request was for.
    pub page_index: usize,
    /// The generated image, or the failure that reset the cache entry.
    pub result: Result<ThumbnailImage, ThumbnailError>,
}

struct Geometry {
    /// Width : height ratio of the first page. Pages with a different
    /// ratio are fitted against it.
    page_ratio: f64,
    thumbnail_height: u32,
}

/// Memoized thumbnail generator over a [`PageRenderer`].
///
/// Owns the bounded image cache and the frame-staggered request queue.
/// Exclusively owned by one consumer and destroyed with it.
pub struct Thumbnail<R> {
    renderer: R,
    cache: BoundedCache<ThumbnailEntry>,
    queue: FrameQueue,
    options: ThumbnailOptions,
    geometry: Option<Geometry>,
    destroyed: bool,
}

impl<R: PageRenderer> Thumbnail<R> {
    /// Create a generator with default options and cache bounds.
    pub fn new(renderer: R) -> Self {
        Self::with_options(renderer, ThumbnailOptions::default())
    }

    /// Create a generator with explicit options.
    pub fn with_options(renderer: R, options: ThumbnailOptions) -> Self {
        Self {
            renderer,
            cache: BoundedCache::new(),
            queue: FrameQueue::new(),
            options,
            geometry: None,
            destroyed: false,
        }
    }

    /// Compute the thumbnail geometry from the first page.
    ///
    /// Returns the scaled thumbnail height in pixels. Fails with
    /// [`ThumbnailError::InvalidDimensions`] when the first page reports
    /// unusable dimensions, in which case the consumer should abort its
    /// own initialization.
    pub fn init(&mut self) -> Result<u32, ThumbnailError> {
        if self.destroyed {
            return Err(ThumbnailError::Destroyed);
        }

        let (width, height) = self
            .renderer
            .page_dimensions(0)
            .map_err(|source| ThumbnailError::Render { page: 0, source })?;

        if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
            return Err(ThumbnailError::InvalidDimensions {
                page: 0,
                width,
                height,
            });
        }

        let scale = THUMBNAIL_TOTAL_WIDTH / width;
        let geometry = Geometry {
            page_ratio: width / height,
            thumbnail_height: (height * scale).ceil() as u32,
        };
        let thumbnail_height = geometry.thumbnail_height;
        self.geometry = Some(geometry);
        Ok(thumbnail_height)
    }

    /// Number of pages in the underlying document.
    pub fn page_count(&self) -> usize {
        self.renderer.page_count()
    }

    /// Scaled thumbnail height, once [`init`](Thumbnail::init) has run.
    pub fn thumbnail_height(&self) -> Option<u32> {
        self.geometry.as_ref().map(|g| g.thumbnail_height)
    }

    /// The cached image for a page, if generation has completed.
    pub fn cached_image(&self, page_index: usize) -> Option<&ThumbnailImage> {
        self.cache
            .get(&page_index.to_string())
            .and_then(|entry| entry.image.as_ref())
    }

    /// Request the thumbnail image for a page.
    ///
    /// At most one generation is ever in flight per page, no matter how
    /// often this is called while one is pending: a cached image resolves
    /// immediately, an in-flight page resolves with the
    /// [`RequestOutcome::InFlight`] sentinel, and only an untouched page
    /// marks its entry in-progress and schedules work on the frame queue.
    pub fn request(&mut self, page_index: usize) -> Result<RequestOutcome, ThumbnailError> {
        if self.destroyed {
            return Err(ThumbnailError::Destroyed);
        }
        if self.geometry.is_none() {
            return Err(ThumbnailError::NotInitialized);
        }

        let key = page_index.to_string();
        let entry = self.cache.get(&key).cloned().unwrap_or_default();

        if entry.image.is_some() {
            return Ok(RequestOutcome::Cached);
        }
        if entry.in_progress {
            return Ok(RequestOutcome::InFlight);
        }

        self.cache.set(
            &key,
            ThumbnailEntry {
                in_progress: true,
                ..entry
            },
        );
        let id = self.queue.schedule(page_index);
        Ok(RequestOutcome::Scheduled(id))
    }

    /// Drain one pending generation request.
    ///
    /// Runs the rasterization for the oldest non-cancelled request,
    /// updates the cache, and returns the completion record. Returns
    /// `None` when no work is pending. Intended to be driven once per
    /// animation frame by the host.
    pub fn process_next(&mut self) -> Option<Completion> {
        if self.destroyed {
            return None;
        }

        let (request_id, page_index) = self.queue.pop_next()?;
        let key = page_index.to_string();

        let result = self.generate(page_index);
        match &result {
            Ok(image) => {
                self.cache.set(
                    &key,
                    ThumbnailEntry {
                        in_progress: false,
                        image: Some(image.clone()),
                    },
                );
            }
            Err(err) => {
                // Reset instead of leaving the entry stuck in-progress.
                debug!(page_index, %err, "thumbnail generation failed; entry reset");
                self.cache.unset(&key);
            }
        }

        Some(Completion {
            request_id,
            page_index,
            result,
        })
    }

    /// Cancel one pending request by id and reset its page's cache
    /// entry so a later request can schedule fresh work.
    pub fn cancel(&mut self, id: RequestId) -> bool {
        match self.queue.cancel(id) {
            Some(page_index) => {
                self.cache.unset(&page_index.to_string());
                true
            }
            None => false,
        }
    }

    /// Number of pending generation requests.
    pub fn pending_requests(&self) -> usize {
        self.queue.len()
    }

    /// Cancel pending requests and release the cache.
    ///
    /// Safe to call more than once. Requests scheduled before the call
    /// can never execute afterwards.
    pub fn destroy(&mut self) {
        self.queue.cancel_all();
        self.queue.clear();
        self.cache.destroy();
        self.destroyed = true;
    }

    fn generate(&self, page_index: usize) -> Result<ThumbnailImage, ThumbnailError> {
        let geometry = self.geometry.as_ref().ok_or(ThumbnailError::NotInitialized)?;
        let image_width = self.options.max_width.unwrap_or(THUMBNAIL_IMAGE_WIDTH);

        let (width, height) = self
            .renderer
            .page_dimensions(page_index)
            .map_err(|source| ThumbnailError::Render {
                page: page_index,
                source,
            })?;
        if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
            return Err(ThumbnailError::InvalidDimensions {
                page: page_index,
                width,
                height,
            });
        }

        // The current page's ratio may differ from the first page's. A
        // page more portrait than the first is clamped to the shared
        // thumbnail height; otherwise it keeps the full image width.
        let current_ratio = width / height;
        let (target_width, target_height) = if current_ratio < geometry.page_ratio {
            let target_height = (image_width as f64 / geometry.page_ratio).ceil();
            ((target_height * current_ratio) as u32, target_height as u32)
        } else {
            (
                image_width,
                (image_width as f64 / current_ratio).ceil() as u32,
            )
        };

        self.renderer
            .rasterize(page_index, target_width, target_height)
            .map_err(|source| ThumbnailError::Render {
                page: page_index,
                source,
            })
    }
}
