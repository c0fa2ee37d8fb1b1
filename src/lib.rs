//! A horizontally scrollable time-ruler widget core: discrete time items
//! placed on ticks, a draggable playhead, an A-B range selection and a
//! playback engine, in two layout modes (fine-grained scrollable and
//! whole-timeline compressed).
//!
//! Rendering, gesture recognition and platform animation run in the host;
//! the core exchanges [`host::HostRequest`] values and callbacks with it
//! and reports state changes through [`RulerEvent`]s.

pub mod host;
pub mod ops;
pub mod ruler;
pub mod types;

pub use ruler::TimeRuler;
pub use types::events::RulerEvent;
pub use types::mode::{Mode, ModeConfig, RulerLayout};
pub use types::time_item::{PlacedItem, TimeItem};

/// Result type for ruler operations.
pub type Result<T> = std::result::Result<T, Rejected>;

/// Reasons an operation was refused. A rejected call is a no-op: it never
/// corrupts state, and callers are free to ignore the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejected {
    #[error("playback is active")]
    Playing,

    #[error("not available in full mode")]
    FullMode,

    #[error("timeline is at capacity")]
    AtCapacity,

    #[error("another edit is still in progress")]
    EditInProgress,

    #[error("timeline has no items")]
    Empty,

    #[error("target time is beyond the last item")]
    BeyondLastItem,

    #[error("no item at the current tick")]
    NoItemHere,

    #[error("range A is not set")]
    RangeAMissing,
}
