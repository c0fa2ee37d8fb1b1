use crate::types::time_item::TimeItem;

/// Notifications drained by the host after each call into the ruler.
///
/// Guards are always released before an event becomes observable, so a
/// handler may re-enter the ruler (for example, start a new play cycle from
/// `PlayStopped`) without deadlocking.
#[derive(Debug, Clone, PartialEq)]
pub enum RulerEvent {
    /// An item finished its insert transition.
    ItemAdded,
    /// An item finished its removal transition.
    ItemDeleted,
    SizeChanged(usize),
    SelectionChanged {
        selected: bool,
        item: Option<TimeItem>,
    },
    /// Second tap on the item the playhead already pointed at.
    ItemClicked { index: usize, item: TimeItem },
    /// Fired once per play session, regardless of repeats.
    PlayStarted,
    PlayStopped,
    /// Fired once per tick-index change during playback, not per frame.
    PlayTimeChanged { time_ms: i64, item: TimeItem },
    /// Playhead movement outside playback.
    TimeChanged {
        time_ms: i64,
        item: Option<TimeItem>,
    },
    RangeASet,
    RangeBSet,
    RangeReset,
}
