use crate::types::mode::ModeConfig;

/// A time cursor: the playhead, and the visually distinct play cursor the
/// engine shows while it runs. Single source of truth for "what time is
/// indicated", independent of play state.
#[derive(Debug, Clone, PartialEq)]
pub struct Playhead {
    /// Timeline-space pixel position.
    position: f32,
    time: i64,
    pub visible: bool,
    pub dragging: bool,
    /// Screen-space ghost shown while a drag is in flight; the logical
    /// position commits on release.
    drag_position: Option<f32>,
    /// Last time reported to listeners; repeated landings on the same
    /// resolved time produce at most one notification.
    last_notified_ms: i64,
}

impl Playhead {
    pub fn new(config: &ModeConfig) -> Self {
        Self {
            position: config.origin_offset,
            time: 0,
            visible: true,
            dragging: false,
            drag_position: None,
            last_notified_ms: 0,
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn drag_position(&self) -> Option<f32> {
        self.drag_position
    }

    fn note_time(&mut self, time_ms: i64) -> Option<i64> {
        if self.last_notified_ms != time_ms {
            self.last_notified_ms = time_ms;
            Some(time_ms)
        } else {
            None
        }
    }

    /// Place the cursor directly on a timeline position (play frames, span
    /// resets). No notification; the caller reports index changes itself.
    pub fn set_position(&mut self, position: f32, config: &ModeConfig) {
        self.position = position;
        self.time = config.position_to_time_rounded(position);
    }

    /// Follow an in-flight drag at `screen_target`. In normal mode only the
    /// on-screen ghost moves and the logical position commits on release;
    /// full mode commits live and reports time changes as they happen.
    pub fn move_to(&mut self, screen_target: f32, scroll: f32, config: &ModeConfig) -> Option<i64> {
        let fixed = config.clamp_position(scroll + screen_target);
        self.drag_position = Some(fixed - scroll);
        if config.is_full() {
            self.position = fixed;
            let time_ms = config.position_to_time(fixed);
            self.time = time_ms;
            return self.note_time(time_ms);
        }
        None
    }

    /// Commit a drag release: clamp, snap onto the quantum grid, and report
    /// the landing time if it differs from the previous one.
    pub fn update_position(
        &mut self,
        screen_target: f32,
        scroll: f32,
        config: &ModeConfig,
    ) -> Option<i64> {
        let fixed = config.clamp_position(scroll + screen_target);
        let (position, time_ms) = config.snap_position(fixed);
        self.position = position;
        self.time = time_ms;
        self.drag_position = None;
        self.note_time(time_ms)
    }

    /// Recompute the pixel position from the time after a mode switch.
    pub fn reproject(&mut self, config: &ModeConfig) {
        self.position = config.time_to_position(self.time);
    }

    /// Back to time zero; reports the change unless already there.
    pub fn reset(&mut self, config: &ModeConfig) -> Option<i64> {
        self.position = config.origin_offset;
        self.time = 0;
        self.drag_position = None;
        self.note_time(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::mode::{Mode, ModeConfig, RulerLayout};

    fn config() -> ModeConfig {
        ModeConfig::new(Mode::Normal, &RulerLayout::new(1000.0))
    }

    #[test]
    fn test_update_position_snaps_and_notifies_once() {
        let config = config();
        let mut playhead = Playhead::new(&config);
        assert_eq!(playhead.update_position(149.0, 0.0, &config), Some(200));
        assert_eq!(playhead.position(), 100.0);
        assert_eq!(playhead.time(), 200);
        // Same resolved tick again: no second notification.
        assert_eq!(playhead.update_position(110.0, 0.0, &config), None);
    }

    #[test]
    fn test_update_position_half_residual_rounds_up() {
        let config = config();
        let mut playhead = Playhead::new(&config);
        assert_eq!(playhead.update_position(150.0, 0.0, &config), Some(400));
        assert_eq!(playhead.position(), 200.0);
    }

    #[test]
    fn test_first_zero_landing_is_not_notified() {
        let config = config();
        let mut playhead = Playhead::new(&config);
        assert_eq!(playhead.update_position(0.0, 0.0, &config), None);
        assert_eq!(playhead.update_position(100.0, 0.0, &config), Some(200));
        assert_eq!(playhead.reset(&config), Some(0));
        assert_eq!(playhead.reset(&config), None);
    }

    #[test]
    fn test_move_to_keeps_logical_position_in_normal_mode() {
        let config = config();
        let mut playhead = Playhead::new(&config);
        assert_eq!(playhead.move_to(340.0, 60.0, &config), None);
        assert_eq!(playhead.position(), config.origin_offset);
        assert_eq!(playhead.drag_position(), Some(340.0));
        assert_eq!(playhead.update_position(340.0, 60.0, &config), Some(400));
        assert_eq!(playhead.drag_position(), None);
    }

    #[test]
    fn test_move_to_commits_live_in_full_mode() {
        let config = ModeConfig::new(Mode::Full, &RulerLayout::new(1000.0));
        let mut playhead = Playhead::new(&config);
        // 0.7 px is 420 ms of raw time, truncated to 400.
        assert_eq!(playhead.move_to(0.7, 0.0, &config), Some(400));
        assert_eq!(playhead.position(), 0.7);
        assert_eq!(playhead.move_to(0.7, 0.0, &config), None);
    }

    #[test]
    fn test_update_position_clamps_to_ruler_extent() {
        let config = config();
        let mut playhead = Playhead::new(&config);
        playhead.update_position(-500.0, 0.0, &config);
        assert_eq!(playhead.position(), 0.0);
        playhead.update_position(config.ruler_span + 900.0, 0.0, &config);
        assert_eq!(playhead.time(), 600_000);
    }

    #[test]
    fn test_reproject_preserves_time() {
        let normal = config();
        let full = ModeConfig::new(Mode::Full, &RulerLayout::new(1000.0));
        let mut playhead = Playhead::new(&normal);
        playhead.update_position(400.0, 0.0, &normal);
        assert_eq!(playhead.time(), 800);
        playhead.reproject(&full);
        assert_eq!(playhead.time(), 800);
        assert_eq!(playhead.position(), full.time_to_position(800));
    }
}
