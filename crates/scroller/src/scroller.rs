//! Windowed virtual renderer.
//!
//! Out of `total_items` virtual rows, only `max_rendered_items` are ever
//! materialized: the rows that fit the viewport plus a lookahead and
//! lookbehind buffer. The reported list height always covers the full
//! collection, so the scroll position stays meaningful no matter how
//! sparse the materialized set is.
//!
//! Scroll handling is last-write-wins: only the final observed offset
//! matters, and a re-render is triggered only once the offset has moved
//! more than one viewport height (`max_buffer_height`) away from the
//! last offset acted upon.

use std::ops::Range;

use tracing::{debug, error};

use crate::config::{RenderItemFn, ScrollerConfig, WindowCallback, WindowInfo};
use crate::error::{ConfigError, ScrollerError};

/// Counters describing render activity. Primarily for tests and
/// diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollerStats {
    /// Number of completed render passes (including the initial one).
    pub render_passes: u64,
    /// Total rows built across all passes.
    pub rows_rendered: u64,
    /// Render callbacks that failed and produced an empty row.
    pub row_errors: u64,
}

/// A materialized row.
///
/// Positioned absolutely within the virtual list; `content` is `None`
/// when the render callback returned nothing or failed.
#[derive(Debug)]
pub struct Row<N> {
    index: usize,
    top: f64,
    height: f64,
    content: Option<N>,
}

impl<N> Row<N> {
    /// Item index of this row within the full collection.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Pixel offset of the row top within the virtual list.
    pub fn top(&self) -> f64 {
        self.top
    }

    /// Row height in pixels.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Row content, if the render callback produced any.
    pub fn content(&self) -> Option<&N> {
        self.content.as_ref()
    }

    /// Mutable row content.
    pub fn content_mut(&mut self) -> Option<&mut N> {
        self.content.as_mut()
    }
}

struct State<N> {
    total_items: usize,
    item_height: f64,
    container_height: f64,
    margin_top: f64,
    margin_bottom: f64,
    buffered_item_multiplier: usize,

    // Derived from the fields above; recomputed on resize.
    total_view_items: usize,
    max_buffer_height: f64,
    max_rendered_items: usize,

    scroll_top: f64,
    /// Last scroll offset a render pass was triggered for.
    previous_scroll_top: f64,
    start_offset: usize,
    rows: Vec<Row<N>>,

    render_item_fn: RenderItemFn<N>,
    on_scroll_end: Option<WindowCallback>,
    stats: ScrollerStats,
}

enum Phase<N> {
    Uninitialized,
    Initialized(Box<State<N>>),
    Destroyed,
}

/// Windowed list renderer over a fixed-size item collection.
///
/// Lifecycle: `Uninitialized -> Initialized -> Destroyed`. [`init`]
/// may be called once; [`destroy`] is idempotent and safe in any phase.
///
/// [`init`]: VirtualScroller::init
/// [`destroy`]: VirtualScroller::destroy
pub struct VirtualScroller<N> {
    phase: Phase<N>,
}

impl<N> VirtualScroller<N> {
    /// Create an uninitialized scroller.
    pub fn new() -> Self {
        Self {
            phase: Phase::Uninitialized,
        }
    }

    /// Initialize the scroller and run the first render pass.
    ///
    /// Validates the configuration synchronously before any row work;
    /// each missing or invalid field yields a descriptive
    /// [`ConfigError`]. On success the initial window is materialized,
    /// anchored at `initial_row_index`, and the `on_init` callback (if
    /// any) receives the window info.
    pub fn init(&mut self, mut config: ScrollerConfig<N>) -> Result<(), ScrollerError> {
        match self.phase {
            Phase::Uninitialized => {}
            Phase::Initialized(_) => return Err(ScrollerError::AlreadyInitialized),
            Phase::Destroyed => return Err(ScrollerError::Destroyed),
        }

        config.validate()?;
        let render_item_fn = config
            .render_item_fn
            .take()
            .ok_or(ConfigError::MissingRenderItemFn)?;

        let total_view_items = (config.container_height / config.item_height).ceil() as usize;
        let max_buffer_height = total_view_items as f64 * config.item_height;
        let max_rendered_items = total_view_items * config.buffered_item_multiplier;

        let initial_index = config.initial_row_index.min(config.total_items - 1);
        let full_height = config.total_items as f64 * config.item_height
            + config.margin_top
            + config.margin_bottom;
        let max_scroll = (full_height - config.container_height).max(0.0);
        let scroll_top = (initial_index as f64 * config.item_height).min(max_scroll);

        let mut state = State {
            total_items: config.total_items,
            item_height: config.item_height,
            container_height: config.container_height,
            margin_top: config.margin_top,
            margin_bottom: config.margin_bottom,
            buffered_item_multiplier: config.buffered_item_multiplier,
            total_view_items,
            max_buffer_height,
            max_rendered_items,
            scroll_top,
            previous_scroll_top: scroll_top,
            start_offset: 0,
            rows: Vec::new(),
            render_item_fn,
            on_scroll_end: config.on_scroll_end.take(),
            stats: ScrollerStats::default(),
        };

        Self::render_window(&mut state, initial_index);
        let info = Self::window_info_of(&state);
        self.phase = Phase::Initialized(Box::new(state));

        if let Some(mut on_init) = config.on_init.take() {
            on_init(&info);
        }

        Ok(())
    }

    /// Feed a new scroll offset to the scroller.
    ///
    /// Offsets within `max_buffer_height` of the last acted-upon offset
    /// are absorbed by the pre-rendered buffer and trigger no work.
    /// Larger movements re-render the window anchored one viewport above
    /// the new position, then fire `on_scroll_end`.
    pub fn on_scroll(&mut self, scroll_top: f64) -> Result<(), ScrollerError> {
        let state = self.state_mut()?;
        state.scroll_top = scroll_top;

        let delta = (scroll_top - state.previous_scroll_top).abs();
        if delta <= state.max_buffer_height {
            return Ok(());
        }

        // Anchor one viewport above the scroll position so scrolling
        // back up within the new window stays smooth.
        let first_index = ((scroll_top / state.item_height).floor() as i64
            - state.total_view_items as i64)
            .max(0) as usize;

        Self::render_window(state, first_index);
        state.previous_scroll_top = scroll_top;
        Self::fire_scroll_end(state);
        Ok(())
    }

    /// Update the viewport height and dependent derived quantities.
    ///
    /// Re-renders only when the currently materialized window violates
    /// the new `max_rendered_items` bound.
    pub fn resize(&mut self, new_container_height: f64) -> Result<(), ScrollerError> {
        if !new_container_height.is_finite() || new_container_height <= 0.0 {
            return Err(ConfigError::InvalidContainerHeight(new_container_height).into());
        }

        let state = self.state_mut()?;
        state.container_height = new_container_height;
        state.total_view_items = (state.container_height / state.item_height).ceil() as usize;
        state.max_buffer_height = state.total_view_items as f64 * state.item_height;
        state.max_rendered_items = state.total_view_items * state.buffered_item_multiplier;

        if state.rows.len() > state.max_rendered_items {
            let offset = state.start_offset;
            Self::render_window(state, offset);
        }
        Ok(())
    }

    /// Scroll so that row `index` is visible.
    ///
    /// For a row inside the materialized window this only moves the
    /// scroll offset. A target outside the window triggers the same
    /// windowing recalculation as a user-driven scroll.
    pub fn scroll_into_view(&mut self, index: usize) -> Result<(), ScrollerError> {
        let state = self.state_mut()?;
        let index = index.min(state.total_items - 1);

        let row_top = index as f64 * state.item_height + state.margin_top;
        let row_bottom = row_top + state.item_height;

        let materialized =
            index >= state.start_offset && index < state.start_offset + state.rows.len();
        if materialized {
            if row_top < state.scroll_top {
                state.scroll_top = row_top;
            } else if row_bottom > state.scroll_top + state.container_height {
                state.scroll_top = row_bottom - state.container_height;
            }
            return Ok(());
        }

        let max_scroll = (Self::full_height_of(state) - state.container_height).max(0.0);
        state.scroll_top = row_top.min(max_scroll);

        let first_index = ((state.scroll_top / state.item_height).floor() as i64
            - state.total_view_items as i64)
            .max(0) as usize;

        Self::render_window(state, first_index);
        state.previous_scroll_top = state.scroll_top;
        Self::fire_scroll_end(state);
        Ok(())
    }

    /// The currently materialized rows, in index order. Empty when the
    /// scroller is not initialized.
    pub fn rows(&self) -> &[Row<N>] {
        self.state().map(|s| s.rows.as_slice()).unwrap_or(&[])
    }

    /// Materialized rows whose position falls inside the current
    /// viewport. Consumers use this to prioritize on-screen items for
    /// expensive async content generation.
    pub fn visible_items(&self) -> Vec<&Row<N>> {
        let Some(state) = self.state() else {
            return Vec::new();
        };
        let viewport_bottom = state.scroll_top + state.container_height;
        state
            .rows
            .iter()
            .filter(|row| row.top < viewport_bottom && row.top + row.height > state.scroll_top)
            .collect()
    }

    /// Mutable access to the content of the materialized row for item
    /// `index`, or `None` when that row is not in the window.
    pub fn item_content_mut(&mut self, index: usize) -> Option<&mut N> {
        let state = match &mut self.phase {
            Phase::Initialized(state) => state,
            _ => return None,
        };
        if index < state.start_offset {
            return None;
        }
        state
            .rows
            .get_mut(index - state.start_offset)
            .and_then(|row| row.content.as_mut())
    }

    /// Snapshot of the current window, or `None` when not initialized.
    pub fn window_info(&self) -> Option<WindowInfo> {
        self.state().map(Self::window_info_of)
    }

    /// Full height of the virtual list (`total_items * item_height`
    /// plus margins), independent of how many rows are materialized.
    pub fn list_height(&self) -> f64 {
        self.state().map(Self::full_height_of).unwrap_or(0.0)
    }

    /// Current scroll offset.
    pub fn scroll_top(&self) -> f64 {
        self.state().map(|s| s.scroll_top).unwrap_or(0.0)
    }

    /// Rows that fit the viewport simultaneously.
    pub fn total_view_items(&self) -> usize {
        self.state().map(|s| s.total_view_items).unwrap_or(0)
    }

    /// Scroll distance that must accumulate before a re-render.
    pub fn max_buffer_height(&self) -> f64 {
        self.state().map(|s| s.max_buffer_height).unwrap_or(0.0)
    }

    /// Upper bound on materialized rows.
    pub fn max_rendered_items(&self) -> usize {
        self.state().map(|s| s.max_rendered_items).unwrap_or(0)
    }

    /// Render activity counters.
    pub fn stats(&self) -> ScrollerStats {
        self.state().map(|s| s.stats).unwrap_or_default()
    }

    /// Whether `init` has completed successfully.
    pub fn is_initialized(&self) -> bool {
        matches!(self.phase, Phase::Initialized(_))
    }

    /// Tear down the scroller and release all materialized rows.
    ///
    /// Idempotent, and safe to call on a never-initialized instance.
    pub fn destroy(&mut self) {
        self.phase = Phase::Destroyed;
    }

    fn state(&self) -> Option<&State<N>> {
        match &self.phase {
            Phase::Initialized(state) => Some(state),
            _ => None,
        }
    }

    fn state_mut(&mut self) -> Result<&mut State<N>, ScrollerError> {
        match &mut self.phase {
            Phase::Initialized(state) => Ok(state),
            Phase::Uninitialized => Err(ScrollerError::NotInitialized),
            Phase::Destroyed => Err(ScrollerError::Destroyed),
        }
    }

    /// Build the window starting at `offset` and swap it in atomically,
    /// so a partially built window is never observable.
    fn render_window(state: &mut State<N>, offset: usize) {
        let offset = offset.min(state.total_items.saturating_sub(1));
        let count = state.max_rendered_items.min(state.total_items - offset);

        let mut rows = Vec::with_capacity(count);
        for index in offset..offset + count {
            let content = match (state.render_item_fn)(index) {
                Ok(content) => content,
                Err(err) => {
                    // A single bad item must not break the window.
                    error!(index, %err, "render_item_fn failed; row left empty");
                    state.stats.row_errors += 1;
                    None
                }
            };
            rows.push(Row {
                index,
                top: state.item_height * index as f64 + state.margin_top,
                height: state.item_height,
                content,
            });
        }

        state.rows = rows;
        state.start_offset = offset;
        state.stats.render_passes += 1;
        state.stats.rows_rendered += count as u64;
        debug!(offset, count, "rendered window");
    }

    fn fire_scroll_end(state: &mut State<N>) {
        // Taken out for the duration of the call so the callback cannot
        // alias the state borrow.
        if let Some(mut callback) = state.on_scroll_end.take() {
            let info = Self::window_info_of(state);
            callback(&info);
            state.on_scroll_end = Some(callback);
        }
    }

    fn window_info_of(state: &State<N>) -> WindowInfo {
        WindowInfo {
            start_offset: state.start_offset,
            count: state.rows.len(),
            visible: Self::visible_range_of(state),
        }
    }

    fn visible_range_of(state: &State<N>) -> Range<usize> {
        let first = ((state.scroll_top - state.margin_top) / state.item_height)
            .floor()
            .max(0.0) as usize;
        let last = ((state.scroll_top + state.container_height - state.margin_top)
            / state.item_height)
            .ceil()
            .max(0.0) as usize;
        first.min(state.total_items)..last.min(state.total_items)
    }

    fn full_height_of(state: &State<N>) -> f64 {
        state.total_items as f64 * state.item_height + state.margin_top + state.margin_bottom
    }
}

impl<N> Default for VirtualScroller<N> {
    fn default() -> Self {
        Self::new()
    }
}
