//! Configuration surface for [`VirtualScroller`](crate::VirtualScroller).

use std::ops::Range;

use crate::error::ConfigError;

/// Default multiplier applied to the visible row count to size the
/// materialized window (visible rows plus lookahead/lookbehind buffer).
pub const DEFAULT_BUFFERED_ITEM_MULTIPLIER: usize = 3;

/// Boxed error type for consumer callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Per-row content callback.
///
/// Invoked once per materialized row. `Ok(None)` produces a structurally
/// present but empty row; an `Err` is logged by the scroller and treated
/// the same way. Must not block - heavy work belongs to an async
/// generation pipeline that fills the row in later.
pub type RenderItemFn<N> = Box<dyn FnMut(usize) -> Result<Option<N>, BoxError>>;

/// Callback receiving the current render window info (`on_init`,
/// `on_scroll_end`).
pub type WindowCallback = Box<dyn FnMut(&WindowInfo)>;

/// Snapshot of the materialized window handed to window callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Index of the first materialized row.
    pub start_offset: usize,
    /// Number of materialized rows.
    pub count: usize,
    /// Item indices currently inside the viewport. A subset of the
    /// materialized window; consumers use it to prioritize on-screen
    /// work over merely buffered rows.
    pub visible: Range<usize>,
}

impl WindowInfo {
    /// Item indices of the materialized window.
    pub fn window(&self) -> Range<usize> {
        self.start_offset..self.start_offset + self.count
    }
}

/// Configuration for [`VirtualScroller::init`](crate::VirtualScroller::init).
///
/// Required fields are `total_items`, `item_height`, `container_height`
/// and `render_item_fn`; everything else has defaults. Validation runs
/// synchronously inside `init` and reports a descriptive
/// [`ConfigError`] per missing or invalid field.
pub struct ScrollerConfig<N> {
    /// Number of virtual rows. Fixed for the session.
    pub total_items: usize,
    /// Pixel height of every row. Fixed for the session.
    pub item_height: f64,
    /// Pixel height of the visible viewport at init time.
    pub container_height: f64,
    /// Required per-row content callback.
    pub render_item_fn: Option<RenderItemFn<N>>,
    /// Extra pixel offset before the first row.
    pub margin_top: f64,
    /// Extra pixel offset after the last row.
    pub margin_bottom: f64,
    /// Window anchor on first render.
    pub initial_row_index: usize,
    /// Multiplier on the visible row count controlling how many rows
    /// stay materialized; trades memory for fewer re-renders.
    pub buffered_item_multiplier: usize,
    /// Invoked once after the first render pass.
    pub on_init: Option<WindowCallback>,
    /// Invoked after each scroll-triggered render pass.
    pub on_scroll_end: Option<WindowCallback>,
}

impl<N> ScrollerConfig<N> {
    /// Create a config with all required fields set.
    pub fn new(
        total_items: usize,
        item_height: f64,
        container_height: f64,
        render_item_fn: impl FnMut(usize) -> Result<Option<N>, BoxError> + 'static,
    ) -> Self {
        Self {
            total_items,
            item_height,
            container_height,
            render_item_fn: Some(Box::new(render_item_fn)),
            ..Self::empty()
        }
    }

    /// Create a config with nothing set; fails validation until the
    /// required fields are filled in.
    pub fn empty() -> Self {
        Self {
            total_items: 0,
            item_height: 0.0,
            container_height: 0.0,
            render_item_fn: None,
            margin_top: 0.0,
            margin_bottom: 0.0,
            initial_row_index: 0,
            buffered_item_multiplier: DEFAULT_BUFFERED_ITEM_MULTIPLIER,
            on_init: None,
            on_scroll_end: None,
        }
    }

    /// Set both top and bottom margins to `margin`.
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin_top = margin;
        self.margin_bottom = margin;
        self
    }

    /// Anchor the first render at `index` instead of row zero.
    pub fn with_initial_row_index(mut self, index: usize) -> Self {
        self.initial_row_index = index;
        self
    }

    /// Override the buffered-item multiplier.
    pub fn with_buffered_item_multiplier(mut self, multiplier: usize) -> Self {
        self.buffered_item_multiplier = multiplier;
        self
    }

    /// Set the `on_init` callback.
    pub fn on_init(mut self, callback: impl FnMut(&WindowInfo) + 'static) -> Self {
        self.on_init = Some(Box::new(callback));
        self
    }

    /// Set the `on_scroll_end` callback.
    pub fn on_scroll_end(mut self, callback: impl FnMut(&WindowInfo) + 'static) -> Self {
        self.on_scroll_end = Some(Box::new(callback));
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.total_items == 0 {
            return Err(ConfigError::InvalidTotalItems);
        }
        if !self.item_height.is_finite() || self.item_height <= 0.0 {
            return Err(ConfigError::InvalidItemHeight(self.item_height));
        }
        if !self.container_height.is_finite() || self.container_height <= 0.0 {
            return Err(ConfigError::InvalidContainerHeight(self.container_height));
        }
        if self.render_item_fn.is_none() {
            return Err(ConfigError::MissingRenderItemFn);
        }
        if self.buffered_item_multiplier == 0 {
            return Err(ConfigError::InvalidBufferedItemMultiplier);
        }
        Ok(())
    }
}

impl<N> Default for ScrollerConfig<N> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ScrollerConfig<()> {
        ScrollerConfig::new(10, 100.0, 500.0, |_| Ok(Some(())))
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_empty_config_reports_total_items_first() {
        let config: ScrollerConfig<()> = ScrollerConfig::empty();
        assert_eq!(config.validate(), Err(ConfigError::InvalidTotalItems));
    }

    #[test]
    fn test_zero_item_height_rejected() {
        let mut config = valid_config();
        config.item_height = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidItemHeight(0.0)));
    }

    #[test]
    fn test_non_finite_dimensions_rejected() {
        let mut config = valid_config();
        config.item_height = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidItemHeight(_))
        ));

        let mut config = valid_config();
        config.container_height = f64::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidContainerHeight(_))
        ));
    }

    #[test]
    fn test_missing_render_item_fn_rejected() {
        let mut config = valid_config();
        config.render_item_fn = None;
        assert_eq!(config.validate(), Err(ConfigError::MissingRenderItemFn));
    }

    #[test]
    fn test_zero_multiplier_rejected() {
        let config = valid_config().with_buffered_item_multiplier(0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidBufferedItemMultiplier)
        );
    }

    #[test]
    fn test_window_info_window_range() {
        let info = WindowInfo {
            start_offset: 10,
            count: 15,
            visible: 12..17,
        };
        assert_eq!(info.window(), 10..25);
    }
}
