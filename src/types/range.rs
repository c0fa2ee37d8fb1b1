use serde::{Deserialize, Serialize};

use crate::types::mode::{ModeConfig, Rounding};

/// One draggable end of the A-B selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub visible: bool,
    /// Timeline-space pixel position.
    pub position: f32,
    pub time: i64,
}

impl Marker {
    fn hidden(config: &ModeConfig) -> Self {
        Self {
            visible: false,
            position: config.origin_offset,
            time: 0,
        }
    }

    fn place(&mut self, position: f32, config: &ModeConfig) {
        self.position = position;
        self.time = config.position_to_time_rounded(position);
    }
}

/// The optional A-B sub-interval bounding playback and playhead movement.
///
/// Invariant: whenever B is visible, A is visible and A ≤ B. Every mutation
/// below preserves it, including the adjustments after structural edits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeSelector {
    a: Marker,
    b: Marker,
}

impl RangeSelector {
    pub fn new(config: &ModeConfig) -> Self {
        Self {
            a: Marker::hidden(config),
            b: Marker::hidden(config),
        }
    }

    pub fn is_a_visible(&self) -> bool {
        self.a.visible
    }

    pub fn is_b_visible(&self) -> bool {
        self.b.visible
    }

    pub fn a_position(&self) -> f32 {
        self.a.position
    }

    pub fn b_position(&self) -> f32 {
        self.b.position
    }

    pub fn a_time(&self) -> i64 {
        self.a.time
    }

    pub fn b_time(&self) -> i64 {
        self.b.time
    }

    pub fn set_a(&mut self, position: f32, config: &ModeConfig) {
        self.a.visible = true;
        self.a.place(position, config);
    }

    /// B requires A and lands at or after it.
    pub fn set_b(&mut self, position: f32, config: &ModeConfig) -> bool {
        if !self.a.visible {
            return false;
        }
        self.b.visible = true;
        self.b.place(position.max(self.a.position), config);
        true
    }

    pub fn reset(&mut self, config: &ModeConfig) {
        self.a = Marker::hidden(config);
        self.b = Marker::hidden(config);
    }

    /// Where an in-flight A drag may go: between the origin and B, or the
    /// last item when no B is set.
    pub fn clamp_a(&self, target: f32, last_item_position: f32, config: &ModeConfig) -> f32 {
        let upper = if self.b.visible {
            self.b.position
        } else {
            last_item_position
        };
        target.clamp(config.origin_offset, upper)
    }

    /// Where an in-flight B drag may go: between A and the last item.
    pub fn clamp_b(&self, target: f32, last_item_position: f32) -> f32 {
        target.clamp(self.a.position, last_item_position)
    }

    pub fn drag_a(&mut self, target: f32, last_item_position: f32, config: &ModeConfig) {
        if self.a.visible {
            self.a.position = self.clamp_a(target, last_item_position, config);
        }
    }

    pub fn drag_b(&mut self, target: f32, last_item_position: f32) {
        if self.b.visible {
            self.b.position = self.clamp_b(target, last_item_position);
        }
    }

    /// Commit an A drag: clamp, then snap onto the quantum grid.
    pub fn release_a(&mut self, target: f32, last_item_position: f32, config: &ModeConfig) {
        if self.a.visible {
            let clamped = self.clamp_a(target, last_item_position, config);
            let (position, _) = config.snap_position(clamped);
            self.a.place(position, config);
        }
    }

    pub fn release_b(&mut self, target: f32, last_item_position: f32, config: &ModeConfig) {
        if self.b.visible {
            let clamped = self.clamp_b(target, last_item_position);
            let (position, _) = config.snap_position(clamped);
            self.b.place(position, config);
        }
    }

    /// Keep the markers pointing at meaningful ticks after the item at
    /// `deleted_index` goes away.
    pub fn on_delete(
        &mut self,
        deleted_index: usize,
        last_index: usize,
        playhead_position: f32,
        config: &ModeConfig,
    ) {
        if !self.a.visible {
            return;
        }
        let a_index = config.position_to_index(self.a.position, Rounding::Nearest);
        let b_index = config.position_to_index(self.b.position, Rounding::Nearest);
        if !self.b.visible {
            if deleted_index == 0 {
                self.reset(config);
            } else if deleted_index == a_index && deleted_index == last_index {
                let target = (playhead_position - config.tick_width).max(config.origin_offset);
                self.a.place(target, config);
            }
        } else if (deleted_index == b_index && a_index == b_index) || deleted_index == 0 {
            self.reset(config);
        } else if (a_index..=b_index).contains(&deleted_index) {
            let target = (self.b.position - config.tick_width).max(self.a.position);
            self.b.place(target, config);
        }
    }

    /// A new item inside the range extends B forward one tick, so the
    /// range absorbs the insertion.
    pub fn on_insert(&mut self, inserted_position: f32, config: &ModeConfig) {
        if self.b.visible
            && inserted_position >= self.a.position
            && inserted_position <= self.b.position
        {
            let target = config.clamp_position(self.b.position + config.tick_width);
            self.b.place(target, config);
        }
    }

    /// Bound a playhead position into the selected range.
    pub fn clamp_playhead(&self, position: f32) -> f32 {
        let mut bounded = position;
        if self.a.visible {
            bounded = bounded.max(self.a.position);
        }
        if self.b.visible {
            bounded = bounded.min(self.b.position);
        }
        bounded
    }

    /// Recompute pixel positions from times after a mode switch.
    pub fn reproject(&mut self, config: &ModeConfig) {
        self.a.position = config.time_to_position(self.a.time);
        self.b.position = config.time_to_position(self.b.time);
    }
}
