//! The seam between the core and the platform. The core never runs
//! animations or timers itself; it pushes [`HostRequest`]s into an outbox
//! the host drains, and the host reports progress back through
//! [`crate::TimeRuler::animation_frame`], [`crate::TimeRuler::animation_finished`]
//! and [`crate::TimeRuler::timer_fired`]. A cancelled animation must not
//! report `animation_finished`; the core already carried on.

use uuid::Uuid;

/// Animations the core asks the host to run. At most one of each kind is
/// live at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationToken {
    /// Scroll that recenters the viewport on the cursor.
    Center,
    /// The continuous playback interpolation of the animated strategy.
    Play,
    /// Post-cancel correction onto the next tick.
    FixUp,
    /// Fade-in of a freshly added item.
    ItemShow,
    /// Fade-out of the item being deleted.
    ItemHide,
}

/// Deferred callbacks the core schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerToken {
    /// Cadence of the stepped strategy.
    PlayStep,
    /// Delay that keeps the final frame visible before the span resets.
    Settle,
}

/// Requests drained by the host and executed with platform facilities.
#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
    StartAnimation {
        token: AnimationToken,
        from: f32,
        to: f32,
        duration_ms: u64,
    },
    CancelAnimation {
        token: AnimationToken,
    },
    StartTimer {
        token: TimerToken,
        delay_ms: u64,
    },
    CancelTimer {
        token: TimerToken,
    },
    /// Slide the given items by `delta` pixels on screen. Fire-and-forget:
    /// the model already holds the final positions, this only smooths the
    /// transition for items currently visible.
    ShiftItems { ids: Vec<Uuid>, delta: f32 },
    /// Redraw wanted.
    Invalidate,
}
