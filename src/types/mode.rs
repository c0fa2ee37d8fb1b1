use serde::{Deserialize, Serialize};

/// Minimum time increment a cursor or item can land on, in milliseconds.
pub const TIME_QUANTUM_MS: i64 = 200;

/// Tick width in normal mode, in pixels.
pub const NORMAL_TICK_WIDTH: f32 = 100.0;

/// Tick duration in normal mode, in milliseconds.
pub const NORMAL_TICK_MS: i64 = 200;

/// Every how many ticks a text label sits in normal mode; doubles as the
/// playback rate (ticks per second).
pub const NORMAL_TICKS_PER_LABEL: usize = 5;

/// Fixed tick count in full mode.
pub const FULL_TICK_COUNT: usize = 10;

/// Tick duration in full mode, in milliseconds.
pub const FULL_TICK_MS: i64 = 60_000;

/// Every how many ticks a text label sits in full mode.
pub const FULL_TICKS_PER_LABEL: usize = 2;

/// Layout mode of the ruler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Fine-grained, one tick per quantum, scrollable.
    Normal,
    /// The whole timeline compressed into a fixed number of coarse ticks.
    Full,
}

/// How a fractional tick position resolves to an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// The index currently under the position.
    Truncate,
    /// The nearest index; used to decide snap direction.
    Nearest,
}

/// Host-measured geometry the ruler is laid out against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RulerLayout {
    /// Longest representable time, in seconds.
    pub max_time_secs: u32,
    /// Width of the visible viewport, in pixels.
    pub viewport_width: f32,
    /// Pixel offset of tick 0 from the left edge of the content.
    pub origin_offset: f32,
    /// Padding after the last tick.
    pub end_padding: f32,
}

impl RulerLayout {
    pub fn new(viewport_width: f32) -> Self {
        Self {
            max_time_secs: 600,
            viewport_width,
            origin_offset: 0.0,
            end_padding: 0.0,
        }
    }
}

/// Per-mode layout constants. Immutable once built; a mode switch builds a
/// fresh config and re-projects every position through it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {
    pub mode: Mode,
    pub tick_width: f32,
    pub tick_duration_ms: i64,
    /// Tick indices run `0..=total_ticks`.
    pub total_ticks: usize,
    pub ticks_per_label: usize,
    pub ms_per_pixel: f32,
    pub origin_offset: f32,
    /// Pixel span of the ticks, `total_ticks * tick_width`.
    pub ruler_span: f32,
    /// Full content width including origin offset and end padding.
    pub content_width: f32,
    pub end_padding: f32,
}

impl ModeConfig {
    pub fn new(mode: Mode, layout: &RulerLayout) -> Self {
        let max_ms = layout.max_time_secs as i64 * 1000;
        let (tick_width, tick_duration_ms, total_ticks, ticks_per_label, ruler_span) = match mode {
            Mode::Normal => {
                let total = (max_ms / NORMAL_TICK_MS) as usize;
                let span = total as f32 * NORMAL_TICK_WIDTH;
                (
                    NORMAL_TICK_WIDTH,
                    NORMAL_TICK_MS,
                    total,
                    NORMAL_TICKS_PER_LABEL,
                    span,
                )
            }
            Mode::Full => {
                let span = layout.viewport_width - layout.origin_offset - layout.end_padding;
                (
                    span / FULL_TICK_COUNT as f32,
                    FULL_TICK_MS,
                    FULL_TICK_COUNT,
                    FULL_TICKS_PER_LABEL,
                    span,
                )
            }
        };
        Self {
            mode,
            tick_width,
            tick_duration_ms,
            total_ticks,
            ticks_per_label,
            ms_per_pixel: max_ms as f32 / ruler_span,
            origin_offset: layout.origin_offset,
            ruler_span,
            content_width: layout.origin_offset + ruler_span + layout.end_padding,
            end_padding: layout.end_padding,
        }
    }

    pub fn is_full(&self) -> bool {
        self.mode == Mode::Full
    }

    /// Milliseconds at a timeline-space position, truncated to the quantum.
    /// For live reads; use [`Self::position_to_time_rounded`] to finalize.
    pub fn position_to_time(&self, position: f32) -> i64 {
        if position <= self.origin_offset {
            return 0;
        }
        let raw = ((position - self.origin_offset) * self.ms_per_pixel) as i64;
        raw / TIME_QUANTUM_MS * TIME_QUANTUM_MS
    }

    /// Milliseconds at a position, rounding the pixel-derived millisecond
    /// before quantum truncation. Truncating a position that itself came
    /// out of [`Self::time_to_position`] can otherwise drop a whole quantum
    /// to float error in full mode.
    pub fn position_to_time_rounded(&self, position: f32) -> i64 {
        if position <= self.origin_offset {
            return 0;
        }
        let raw = ((position - self.origin_offset) * self.ms_per_pixel).round() as i64;
        raw / TIME_QUANTUM_MS * TIME_QUANTUM_MS
    }

    /// Timeline-space position of a time.
    pub fn time_to_position(&self, time_ms: i64) -> f32 {
        time_ms as f32 / self.ms_per_pixel + self.origin_offset
    }

    /// Tick index at a position, clamped to `[0, total_ticks]`.
    pub fn position_to_index(&self, position: f32, rounding: Rounding) -> usize {
        if position <= self.origin_offset {
            return 0;
        }
        let ticks = (position - self.origin_offset) / self.tick_width;
        let index = match rounding {
            Rounding::Truncate => ticks as usize,
            Rounding::Nearest => ticks.round() as usize,
        };
        index.min(self.total_ticks)
    }

    pub fn index_to_position(&self, index: usize) -> f32 {
        self.origin_offset + index as f32 * self.tick_width
    }

    /// Nominal time of a tick index.
    pub fn index_to_time(&self, index: usize) -> i64 {
        index as i64 * self.tick_duration_ms
    }

    /// Clamp a position into the addressable extent of the ruler.
    pub fn clamp_position(&self, position: f32) -> f32 {
        position.clamp(self.origin_offset, self.origin_offset + self.ruler_span)
    }

    /// Snap a position onto the quantum grid; returns the aligned position
    /// and its time. A residual of at least half a quantum rounds up.
    pub fn snap_position(&self, position: f32) -> (f32, i64) {
        let clamped = self.clamp_position(position);
        let mut time = ((clamped - self.origin_offset) * self.ms_per_pixel).round() as i64;
        let residual = time % TIME_QUANTUM_MS;
        if residual > 0 {
            let bump = if residual >= TIME_QUANTUM_MS / 2 { 1 } else { 0 };
            time = (time / TIME_QUANTUM_MS + bump) * TIME_QUANTUM_MS;
        }
        (self.time_to_position(time), time)
    }
}
