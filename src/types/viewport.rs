use crate::types::mode::ModeConfig;

/// Scroll state of the ruler viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Viewport width in pixels.
    pub width: f32,
    scroll: f32,
    leftmost_index: usize,
}

impl Viewport {
    pub fn new(width: f32) -> Self {
        Self {
            width,
            scroll: 0.0,
            leftmost_index: 0,
        }
    }

    /// Current offset of the viewport into the content.
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    /// Tick index of the leftmost visible tick.
    pub fn leftmost_index(&self) -> usize {
        self.leftmost_index
    }

    pub fn center(&self) -> f32 {
        self.width / 2.0
    }

    /// Clamp and commit a scroll offset, recomputing the leftmost tick.
    pub fn set_scroll(&mut self, raw: f32, config: &ModeConfig) {
        let max = (config.content_width - self.width).max(0.0);
        self.scroll = raw.clamp(0.0, max);
        self.leftmost_index = if self.scroll < config.origin_offset {
            0
        } else {
            ((self.scroll - config.origin_offset) / config.tick_width) as usize
        };
    }

    pub fn scroll_by(&mut self, delta: f32, config: &ModeConfig) {
        self.set_scroll(self.scroll + delta, config);
    }

    pub fn to_screen(&self, position: f32) -> f32 {
        position - self.scroll
    }

    /// Whether a timeline-space position is within one tick of the screen.
    /// Items outside this window are repositioned without a transition.
    pub fn is_on_screen(&self, position: f32, tick_width: f32) -> bool {
        let screen = position - self.scroll;
        screen > -tick_width && screen < self.width + tick_width
    }
}
