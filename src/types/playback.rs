/// Structural-edit guard. Exactly one mutation may be in flight; calls
/// arriving while one is running are rejected, not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    InProgress,
}

/// Playback lifecycle. `Stopping` covers the post-cancel fix-up of the
/// animated strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Idle,
    /// Centering the viewport before the cursor starts moving.
    Preparing,
    Playing,
    Stopping,
}

/// How the play cursor is driven across the span. Chosen once per play
/// session from the host's animations-enabled capability; both strategies
/// produce the same sequence of time-changed events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    Animated,
    #[default]
    Stepped,
}

/// What to do once a centering scroll lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CenterFollowUp {
    #[default]
    None,
    /// Start the cursor moving (fresh session).
    BeginPlay,
    /// Re-enter the preparing phase (repeat loop).
    RestartLoop,
}

/// Span being played: the whole timeline, or the A-B range when B is set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaySpan {
    pub start_index: usize,
    pub end_index: usize,
    pub start_position: f32,
    pub end_position: f32,
}

/// Mutable state of one play session.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSession {
    pub state: PlayState,
    pub strategy: Strategy,
    pub repeat: bool,
    pub span: PlaySpan,
    /// Tick index the cursor most recently reported.
    pub current_index: usize,
    /// Screen-space base the play animation values are relative to.
    pub anim_base: f32,
    /// Start already signalled; keeps `PlayStarted` to once per session.
    pub start_signalled: bool,
    pub cancelled: bool,
    pub center_follow_up: CenterFollowUp,
    /// A mode switch stopped playback and wants it resumed in the new mode.
    pub continue_in_new_mode: bool,
    /// Playback just resumed after a mode switch; suppresses the duplicate
    /// initial time-changed report.
    pub resumed_after_mode_switch: bool,
}

impl PlaybackSession {
    pub fn begin(strategy: Strategy, repeat: bool) -> Self {
        Self {
            state: PlayState::Preparing,
            strategy,
            repeat,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.state != PlayState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_begin() {
        let session = PlaybackSession::begin(Strategy::Animated, true);
        assert_eq!(session.state, PlayState::Preparing);
        assert!(session.is_active());
        assert!(session.repeat);
        assert!(!session.start_signalled);
    }

    #[test]
    fn test_idle_session_is_inactive() {
        assert!(!PlaybackSession::default().is_active());
    }
}
