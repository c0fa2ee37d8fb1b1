use log::{debug, warn};
use serde_json::Value;

use crate::host::{AnimationToken, HostRequest, TimerToken};
use crate::ops::edit_ops;
use crate::types::events::RulerEvent;
use crate::types::mode::{Mode, ModeConfig, Rounding, RulerLayout, TIME_QUANTUM_MS};
use crate::types::model::TimelineModel;
use crate::types::playback::{
    CenterFollowUp, EditState, PlaySpan, PlayState, PlaybackSession, Strategy,
};
use crate::types::playhead::Playhead;
use crate::types::range::RangeSelector;
use crate::types::time_item::{EMPTY_ITEM_COLOR, EMPTY_ITEM_FLAG, PlacedItem, TimeItem};
use crate::types::viewport::Viewport;
use crate::{Rejected, Result};

/// Milliseconds between steps of the stepped strategy.
const STEP_INTERVAL_MS: u64 = 200;

/// Pause on the final frame before the span resets, animated strategy.
const SETTLE_ANIMATED_MS: u64 = 500;

/// Pause on the final frame before the span resets, stepped strategy.
const SETTLE_STEPPED_MS: u64 = 200;

/// Duration of item fades and recenter scrolls.
const TRANSITION_MS: u64 = 300;

/// Completion data for the structural edit currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingEdit {
    Add,
    Delete { index: usize },
}

/// The time ruler core: items on ticks, playhead, A-B range and playback,
/// behind a host that does the actual drawing, gestures and animation.
///
/// All mutation happens on one logical thread. After every call the host
/// drains [`Self::drain_requests`] and [`Self::drain_events`]; requests are
/// executed with platform facilities which call back in through
/// [`Self::animation_frame`], [`Self::animation_finished`] and
/// [`Self::timer_fired`].
#[derive(Debug)]
pub struct TimeRuler {
    layout: RulerLayout,
    config: ModeConfig,
    model: TimelineModel,
    range: RangeSelector,
    playhead: Playhead,
    play_cursor: Playhead,
    viewport: Viewport,
    session: PlaybackSession,
    edit: EditState,
    pending_edit: Option<PendingEdit>,
    /// Host capability, sampled once per play session.
    animations_enabled: bool,
    /// Tick the playhead resolved to after the previous interaction; a tap
    /// only counts as a click when it lands on this tick again.
    last_tap_index: Option<usize>,
    /// Scroll to restore when leaving full mode without a time change.
    saved_scroll: f32,
    time_changed_since_switch: bool,
    events: Vec<RulerEvent>,
    requests: Vec<HostRequest>,
}

impl TimeRuler {
    pub fn new(layout: RulerLayout) -> Self {
        let config = ModeConfig::new(Mode::Normal, &layout);
        let mut play_cursor = Playhead::new(&config);
        play_cursor.visible = false;
        Self {
            layout,
            config,
            model: TimelineModel::new(),
            range: RangeSelector::new(&config),
            playhead: Playhead::new(&config),
            play_cursor,
            viewport: Viewport::new(layout.viewport_width),
            session: PlaybackSession::default(),
            edit: EditState::Idle,
            pending_edit: None,
            animations_enabled: true,
            last_tap_index: None,
            saved_scroll: 0.0,
            time_changed_since_switch: false,
            events: Vec::new(),
            requests: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Host plumbing
    // ------------------------------------------------------------------

    pub fn drain_events(&mut self) -> Vec<RulerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn drain_requests(&mut self) -> Vec<HostRequest> {
        std::mem::take(&mut self.requests)
    }

    /// Whether the platform runs animations at 1x. Sampled once per
    /// `play()` call to choose the playback strategy.
    pub fn set_animations_enabled(&mut self, enabled: bool) {
        self.animations_enabled = enabled;
    }

    fn emit(&mut self, event: RulerEvent) {
        self.events.push(event);
    }

    fn request(&mut self, request: HostRequest) {
        self.requests.push(request);
    }

    fn invalidate(&mut self) {
        self.requests.push(HostRequest::Invalidate);
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    /// Time under the playhead, rounded onto the quantum grid.
    pub fn current_time(&self) -> i64 {
        self.config.position_to_time_rounded(self.playhead.position())
    }

    /// Item under the playhead, if its tick holds one.
    pub fn current_item(&self) -> Option<&TimeItem> {
        self.model
            .get(self.item_index_for_time(self.current_time()))
            .map(|placed| &placed.item)
    }

    pub fn range_a_time(&self) -> Option<i64> {
        self.range.is_a_visible().then(|| self.range.a_time())
    }

    pub fn range_b_time(&self) -> Option<i64> {
        self.range.is_b_visible().then(|| self.range.b_time())
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_active()
    }

    pub fn is_full_mode(&self) -> bool {
        self.config.is_full()
    }

    /// Whether every tick already holds an item.
    pub fn is_full(&self) -> bool {
        self.model.at_capacity(&self.config)
    }

    pub fn has_items(&self) -> bool {
        !self.model.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.model.len()
    }

    pub fn items(&self) -> &[PlacedItem] {
        self.model.items()
    }

    pub fn time_items(&self) -> Vec<TimeItem> {
        self.model.time_items()
    }

    pub fn playhead(&self) -> &Playhead {
        &self.playhead
    }

    pub fn play_cursor(&self) -> &Playhead {
        &self.play_cursor
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn range(&self) -> &RangeSelector {
        &self.range
    }

    pub fn mode_config(&self) -> &ModeConfig {
        &self.config
    }

    /// Pixel span the renderer fills as "occupied" in full mode, from the
    /// origin to the last item.
    pub fn full_mode_span_px(&self) -> Option<(f32, f32)> {
        let last = self.model.last()?;
        Some((
            self.config.origin_offset,
            self.config.time_to_position(last.time),
        ))
    }

    /// Tick index the playhead resolves to, nearest policy.
    fn current_index(&self) -> usize {
        self.config
            .position_to_index(self.playhead.position(), Rounding::Nearest)
    }

    /// Items sit one per quantum regardless of mode, so the item index of a
    /// time is independent of the tick layout.
    fn item_index_for_time(&self, time_ms: i64) -> usize {
        (time_ms / TIME_QUANTUM_MS) as usize
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Append or insert an item at the tick under the playhead. The edit
    /// completes when the host finishes the item's show transition.
    pub fn add_item(&mut self, flag: i32, color: u32, data: Option<Value>) -> Result<()> {
        self.guard_not_playing("add")?;
        if self.config.is_full() {
            warn!("add rejected: full mode");
            return Err(Rejected::FullMode);
        }
        if self.model.at_capacity(&self.config) {
            warn!("add rejected: timeline is full");
            return Err(Rejected::AtCapacity);
        }
        if self.edit == EditState::InProgress {
            warn!("add rejected: edit in progress");
            return Err(Rejected::EditInProgress);
        }
        self.edit = EditState::InProgress;
        self.pending_edit = Some(PendingEdit::Add);
        let item = TimeItem::new(flag, color, data);
        let position = self.playhead.position();
        let index = self.config.position_to_index(position, Rounding::Nearest);
        if self.model.len() <= index {
            self.model
                .append_with_fill(item, position, index, &self.config);
            self.request(HostRequest::StartAnimation {
                token: AnimationToken::ItemShow,
                from: 0.0,
                to: 1.0,
                duration_ms: TRANSITION_MS,
            });
            self.advance_playhead_after_append();
            self.last_tap_index = Some(index + 1);
        } else {
            let plan = edit_ops::plan_shift(
                self.model.items(),
                index,
                self.config.tick_width,
                &self.viewport,
                &self.config,
            );
            self.model
                .shift_tail(index, self.config.tick_width, &self.config);
            self.model.insert(index, item, position, &self.config);
            if !plan.animated.is_empty() {
                self.request(HostRequest::ShiftItems {
                    ids: plan.animated,
                    delta: plan.delta,
                });
            }
            self.request(HostRequest::StartAnimation {
                token: AnimationToken::ItemShow,
                from: 0.0,
                to: 1.0,
                duration_ms: TRANSITION_MS,
            });
            self.range.on_insert(position, &self.config);
        }
        self.invalidate();
        Ok(())
    }

    /// Append a blank placeholder item.
    pub fn add_empty_item(&mut self) -> Result<()> {
        self.add_item(EMPTY_ITEM_FLAG, EMPTY_ITEM_COLOR, None)
    }

    /// After an append the playhead advances one tick; once it passes the
    /// screen center the ruler scrolls so the next tick stays centered.
    fn advance_playhead_after_append(&mut self) {
        let scroll = self.viewport.scroll();
        if self.playhead.position() >= self.viewport.center() {
            let target = self.playhead.position() + self.config.tick_width - self.viewport.center();
            self.request(HostRequest::StartAnimation {
                token: AnimationToken::Center,
                from: scroll,
                to: target,
                duration_ms: TRANSITION_MS,
            });
            if self.current_index() != self.config.total_ticks {
                let screen = self.playhead.position() + self.config.tick_width - scroll;
                if let Some(time_ms) = self.playhead.update_position(screen, scroll, &self.config) {
                    self.emit_time_changed(time_ms);
                }
            }
        } else {
            let screen = self.viewport.to_screen(self.playhead.position()) + self.config.tick_width;
            if let Some(time_ms) = self.playhead.update_position(screen, scroll, &self.config) {
                self.emit_time_changed(time_ms);
            }
        }
    }

    /// Delete the item at the tick under the playhead. Subsequent items
    /// shift back immediately; the removal commits when the host finishes
    /// the hide transition.
    pub fn delete_current(&mut self) -> Result<()> {
        self.guard_not_playing("delete")?;
        if self.config.is_full() {
            warn!("delete rejected: full mode");
            return Err(Rejected::FullMode);
        }
        let index = self.current_index();
        if index >= self.model.len() {
            debug!("delete rejected: no item at tick {index}");
            return Err(Rejected::NoItemHere);
        }
        if self.edit == EditState::InProgress {
            warn!("delete rejected: edit in progress");
            return Err(Rejected::EditInProgress);
        }
        self.edit = EditState::InProgress;
        self.pending_edit = Some(PendingEdit::Delete { index });
        let last_index = self.model.len() - 1;
        self.range
            .on_delete(index, last_index, self.playhead.position(), &self.config);
        let plan = edit_ops::plan_shift(
            self.model.items(),
            index + 1,
            -self.config.tick_width,
            &self.viewport,
            &self.config,
        );
        self.model
            .shift_tail(index + 1, -self.config.tick_width, &self.config);
        if !plan.animated.is_empty() {
            self.request(HostRequest::ShiftItems {
                ids: plan.animated,
                delta: plan.delta,
            });
        }
        self.request(HostRequest::StartAnimation {
            token: AnimationToken::ItemHide,
            from: 1.0,
            to: 0.0,
            duration_ms: TRANSITION_MS,
        });
        self.invalidate();
        Ok(())
    }

    fn finish_add(&mut self) {
        if self.pending_edit != Some(PendingEdit::Add) {
            return;
        }
        self.pending_edit = None;
        self.edit = EditState::Idle;
        self.emit(RulerEvent::ItemAdded);
        self.emit(RulerEvent::SizeChanged(self.model.len()));
        self.sync_selection();
        self.model.assert_consistent(&self.config);
    }

    fn finish_delete(&mut self) {
        let Some(PendingEdit::Delete { index }) = self.pending_edit.take() else {
            return;
        };
        self.model.remove(index);
        self.edit = EditState::Idle;
        self.emit(RulerEvent::ItemDeleted);
        let follower = self.model.get(index).map(|placed| placed.item.clone());
        match follower {
            Some(item) => self.emit(RulerEvent::SelectionChanged {
                selected: true,
                item: Some(item),
            }),
            None => self.emit(RulerEvent::SelectionChanged {
                selected: false,
                item: None,
            }),
        }
        self.emit(RulerEvent::SizeChanged(self.model.len()));
        self.sync_selection();
        self.model.assert_consistent(&self.config);
    }

    /// Clear the timeline and re-zero scroll, playhead and markers.
    pub fn reset(&mut self) -> Result<()> {
        self.guard_not_playing("reset")?;
        self.model.clear();
        self.viewport.set_scroll(0.0, &self.config);
        self.edit = EditState::Idle;
        self.pending_edit = None;
        self.last_tap_index = None;
        if self.range.is_a_visible() {
            self.range.reset(&self.config);
        }
        if let Some(time_ms) = self.playhead.reset(&self.config) {
            self.emit_time_changed(time_ms);
        }
        self.invalidate();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Range selection
    // ------------------------------------------------------------------

    /// Place marker A at the playhead.
    pub fn set_range_a(&mut self) -> Result<()> {
        self.guard_range_edit()?;
        self.range.set_a(self.playhead.position(), &self.config);
        self.emit(RulerEvent::RangeASet);
        self.invalidate();
        Ok(())
    }

    /// Place marker B at the playhead; requires A.
    pub fn set_range_b(&mut self) -> Result<()> {
        self.guard_range_edit()?;
        if !self.range.set_b(self.playhead.position(), &self.config) {
            warn!("set B rejected: A is not set");
            return Err(Rejected::RangeAMissing);
        }
        self.emit(RulerEvent::RangeBSet);
        self.invalidate();
        Ok(())
    }

    fn guard_range_edit(&self) -> Result<()> {
        self.guard_not_playing("range")?;
        let Some(last) = self.model.last() else {
            warn!("range rejected: no items");
            return Err(Rejected::Empty);
        };
        let time = self.config.position_to_time(self.playhead.position());
        if time > last.time {
            warn!("range rejected: playhead beyond last item");
            return Err(Rejected::BeyondLastItem);
        }
        Ok(())
    }

    pub fn reset_range(&mut self) -> Result<()> {
        self.guard_not_playing("range reset")?;
        self.range.reset(&self.config);
        self.emit(RulerEvent::RangeReset);
        self.invalidate();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pointer entry points (gesture recognition lives in the host)
    // ------------------------------------------------------------------

    fn interactions_blocked(&self) -> bool {
        self.session.is_active() || self.edit == EditState::InProgress
    }

    /// Clamp a screen-space playhead target against the visible markers.
    fn bound_to_range(&self, screen_x: f32) -> f32 {
        let scroll = self.viewport.scroll();
        let mut bounded = screen_x;
        if self.range.is_a_visible() {
            bounded = bounded.max(self.range.a_position() - scroll);
        }
        if self.range.is_b_visible() {
            bounded = bounded.min(self.range.b_position() - scroll);
        }
        bounded
    }

    /// Track an in-flight playhead drag at `screen_x`.
    pub fn drag_playhead(&mut self, screen_x: f32) {
        if self.interactions_blocked() {
            return;
        }
        self.playhead.dragging = true;
        let bounded = self.bound_to_range(screen_x);
        if let Some(time_ms) =
            self.playhead
                .move_to(bounded, self.viewport.scroll(), &self.config)
        {
            self.emit_time_changed(time_ms);
        }
        self.invalidate();
    }

    /// Commit a playhead drag at `screen_x`: snap to the grid and report
    /// the landing time once.
    pub fn release_playhead(&mut self, screen_x: f32) {
        if self.interactions_blocked() {
            return;
        }
        self.playhead.dragging = false;
        let bounded = self.bound_to_range(screen_x);
        if let Some(time_ms) =
            self.playhead
                .update_position(bounded, self.viewport.scroll(), &self.config)
        {
            self.emit_time_changed(time_ms);
        }
        self.last_tap_index = Some(self.current_index());
        self.invalidate();
    }

    /// A tap at `screen_x`. `on_item` reports whether the host's hit test
    /// found the tap inside the item dot under that tick. The first tap on
    /// a new item only moves the playhead; a second tap on the same item
    /// performs the click.
    pub fn tap(&mut self, screen_x: f32, on_item: bool) {
        if self.interactions_blocked() {
            return;
        }
        let bounded = self.bound_to_range(screen_x);
        if let Some(time_ms) =
            self.playhead
                .update_position(bounded, self.viewport.scroll(), &self.config)
        {
            self.emit_time_changed(time_ms);
        }
        let index = self.current_index();
        if on_item && self.last_tap_index == Some(index) {
            if let Some(placed) = self.model.get(index) {
                let item = placed.item.clone();
                self.emit(RulerEvent::ItemClicked { index, item });
            }
        }
        self.last_tap_index = Some(index);
        self.invalidate();
    }

    pub fn drag_range_a(&mut self, screen_x: f32) {
        if self.interactions_blocked() {
            return;
        }
        let Some(last) = self.model.last().map(|placed| placed.position) else {
            return;
        };
        let target = self.viewport.scroll() + screen_x;
        self.range.drag_a(target, last, &self.config);
        self.invalidate();
    }

    pub fn release_range_a(&mut self, screen_x: f32) {
        if self.interactions_blocked() {
            return;
        }
        let Some(last) = self.model.last().map(|placed| placed.position) else {
            return;
        };
        let target = self.viewport.scroll() + screen_x;
        self.range.release_a(target, last, &self.config);
        self.clamp_playhead_into_range();
        self.invalidate();
    }

    pub fn drag_range_b(&mut self, screen_x: f32) {
        if self.interactions_blocked() {
            return;
        }
        let Some(last) = self.model.last().map(|placed| placed.position) else {
            return;
        };
        let target = self.viewport.scroll() + screen_x;
        self.range.drag_b(target, last);
        self.invalidate();
    }

    pub fn release_range_b(&mut self, screen_x: f32) {
        if self.interactions_blocked() {
            return;
        }
        let Some(last) = self.model.last().map(|placed| placed.position) else {
            return;
        };
        let target = self.viewport.scroll() + screen_x;
        self.range.release_b(target, last, &self.config);
        self.clamp_playhead_into_range();
        self.invalidate();
    }

    /// After a marker moved, push the playhead back inside [A, B].
    fn clamp_playhead_into_range(&mut self) {
        let position = self.playhead.position();
        let bounded = self.range.clamp_playhead(position);
        if bounded != position {
            let scroll = self.viewport.scroll();
            let screen = bounded - scroll;
            if let Some(time_ms) = self.playhead.update_position(screen, scroll, &self.config) {
                self.emit_time_changed(time_ms);
            }
        }
    }

    /// Host-driven scroll (drag delta or fling step).
    pub fn set_scroll(&mut self, raw: f32) {
        if self.interactions_blocked() {
            return;
        }
        self.viewport.set_scroll(raw, &self.config);
        self.invalidate();
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.set_scroll(self.viewport.scroll() + delta);
    }

    // ------------------------------------------------------------------
    // Mode switching
    // ------------------------------------------------------------------

    /// Switch between the fine scrollable layout and the compressed
    /// whole-timeline layout. A switch mid-play stops cleanly in the old
    /// coordinate space and resumes in the new one; the logical time is
    /// preserved exactly while every pixel position is recomputed.
    pub fn set_full_mode(&mut self, full: bool) {
        if self.edit == EditState::InProgress || self.config.is_full() == full {
            return;
        }
        let mode = if full { Mode::Full } else { Mode::Normal };
        if !self.session.is_active() {
            self.switch_mode(mode);
            return;
        }
        if !self.config.is_full() {
            match self.session.state {
                PlayState::Preparing => {
                    // Still centering; no cursor motion to unwind.
                    self.request(HostRequest::CancelAnimation {
                        token: AnimationToken::Center,
                    });
                    self.session.center_follow_up = CenterFollowUp::None;
                    self.switch_mode(mode);
                    self.play_in_full_mode();
                }
                PlayState::Stopping => {
                    // A fix-up is already unwinding the cursor; let it carry
                    // the continuation into the new mode.
                    self.session.continue_in_new_mode = true;
                }
                _ => match self.session.strategy {
                    Strategy::Animated => {
                        self.session.continue_in_new_mode = true;
                        self.begin_cancel();
                    }
                    Strategy::Stepped => {
                        self.request(HostRequest::CancelTimer {
                            token: TimerToken::PlayStep,
                        });
                        self.switch_mode(mode);
                        self.play_in_full_mode();
                    }
                },
            }
        } else {
            self.request(HostRequest::CancelTimer {
                token: TimerToken::PlayStep,
            });
            self.switch_mode(mode);
            let target = self.playhead.position() - self.viewport.center();
            self.viewport.set_scroll(target, &self.config);
            self.session.resumed_after_mode_switch = true;
            self.session.state = PlayState::Preparing;
            self.prepare_play();
        }
    }

    fn switch_mode(&mut self, mode: Mode) {
        self.config = ModeConfig::new(mode, &self.layout);
        self.playhead.reproject(&self.config);
        self.play_cursor.reproject(&self.config);
        self.range.reproject(&self.config);
        self.model.reproject(&self.config);
        if self.config.is_full() {
            self.saved_scroll = self.viewport.scroll();
            self.viewport.set_scroll(0.0, &self.config);
        } else {
            let scroll = if self.time_changed_since_switch {
                self.playhead.position() - self.viewport.center()
            } else {
                self.saved_scroll
            };
            self.viewport.set_scroll(scroll, &self.config);
        }
        self.time_changed_since_switch = false;
        self.invalidate();
    }

    // ------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------

    /// Start playback over the whole timeline, or the A-B range when B is
    /// set. `repeat` loops back to the span start on completion.
    pub fn play(&mut self, repeat: bool) -> Result<()> {
        if self.model.is_empty() {
            warn!("play rejected: no items");
            return Err(Rejected::Empty);
        }
        if self.session.is_active() {
            warn!("play rejected: already playing");
            return Err(Rejected::Playing);
        }
        let strategy = if self.animations_enabled {
            Strategy::Animated
        } else {
            Strategy::Stepped
        };
        self.session = PlaybackSession::begin(strategy, repeat);
        if self.config.is_full() {
            self.play_in_full_mode();
        } else {
            self.prepare_play();
        }
        Ok(())
    }

    /// Stop playback. The animated strategy first corrects the cursor onto
    /// the next tick so the displayed time never ends up off-grid.
    pub fn stop_play(&mut self) {
        if !self.session.is_active() {
            return;
        }
        self.session.repeat = false;
        self.session.center_follow_up = CenterFollowUp::None;
        self.request(HostRequest::CancelTimer {
            token: TimerToken::Settle,
        });
        if self.session.state == PlayState::Preparing {
            self.request(HostRequest::CancelAnimation {
                token: AnimationToken::Center,
            });
            self.end_session_and_stop();
            return;
        }
        if !self.config.is_full() {
            match self.session.strategy {
                Strategy::Animated => self.begin_cancel(),
                Strategy::Stepped => {
                    self.request(HostRequest::CancelTimer {
                        token: TimerToken::PlayStep,
                    });
                    self.end_session_and_stop();
                }
            }
        } else {
            self.request(HostRequest::CancelTimer {
                token: TimerToken::PlayStep,
            });
            self.end_session_and_stop();
        }
    }

    fn end_session_and_stop(&mut self) {
        self.playhead.visible = true;
        self.play_cursor.visible = false;
        self.session.state = PlayState::Idle;
        self.invalidate();
        self.emit(RulerEvent::PlayStopped);
        self.sync_selection();
    }

    /// Normal-mode entry: work out the span, then center the viewport on
    /// the cursor before any motion starts.
    fn prepare_play(&mut self) {
        self.session.cancelled = false;
        let last_position = match self.model.last() {
            Some(placed) => placed.position,
            None => {
                debug_assert!(false, "prepare_play with empty model");
                return;
            }
        };
        let mut start = self.playhead.position();
        // Beyond the last item there is nothing to play; start from the top.
        if start > last_position {
            start = self.config.origin_offset;
        }
        let (end_index, end_position) = if self.range.is_b_visible() {
            (
                self.config
                    .position_to_index(self.range.b_position(), Rounding::Nearest),
                self.range.b_position(),
            )
        } else {
            // A dangling A without B does not bound playback.
            self.range.reset(&self.config);
            (self.model.len() - 1, last_position)
        };
        self.play_cursor.set_position(start, &self.config);
        let start_index = self.config.position_to_index(start, Rounding::Truncate);
        self.session.span = PlaySpan {
            start_index,
            end_index,
            start_position: start,
            end_position,
        };
        self.session.current_index = start_index;
        let screen = self.viewport.to_screen(start);
        if (screen - self.viewport.center()).abs() > f32::EPSILON {
            self.session.center_follow_up = CenterFollowUp::BeginPlay;
            self.request(HostRequest::StartAnimation {
                token: AnimationToken::Center,
                from: self.viewport.scroll(),
                to: start - self.viewport.center(),
                duration_ms: TRANSITION_MS,
            });
        } else {
            self.do_play();
        }
    }

    /// Begin cursor motion across the prepared span.
    fn do_play(&mut self) {
        let start = self.session.span.start_position;
        let total_move = if self.range.is_b_visible() {
            self.range.b_position() - start
        } else {
            (self.model.len() - 1 - self.session.span.start_index) as f32 * self.config.tick_width
        };
        let duration_ms = (total_move / self.config.tick_width
            / self.config.ticks_per_label as f32
            * 1000.0)
            .max(0.0) as u64;
        self.session.anim_base = self.viewport.to_screen(self.play_cursor.position());
        self.play_cursor.visible = true;
        self.playhead.visible = false;
        self.session.state = PlayState::Playing;
        match self.session.strategy {
            Strategy::Animated => {
                let from = self.viewport.scroll();
                self.request(HostRequest::StartAnimation {
                    token: AnimationToken::Play,
                    from,
                    to: from + total_move,
                    duration_ms,
                });
                self.signal_start();
            }
            Strategy::Stepped => {
                self.invalidate();
                self.signal_start();
                self.request(HostRequest::StartTimer {
                    token: TimerToken::PlayStep,
                    delay_ms: STEP_INTERVAL_MS,
                });
            }
        }
        if !self.session.resumed_after_mode_switch {
            let index = self
                .config
                .position_to_index(self.play_cursor.position(), Rounding::Nearest);
            self.emit_play_time(index, self.config.index_to_time(index));
        } else {
            self.session.resumed_after_mode_switch = false;
        }
    }

    /// Full-mode playback walks the item list directly on a step timer.
    fn play_in_full_mode(&mut self) {
        self.session.state = PlayState::Playing;
        self.play_cursor.visible = true;
        self.playhead.visible = false;
        let last_time = match self.model.last() {
            Some(placed) => placed.time,
            None => {
                debug_assert!(false, "play_in_full_mode with empty model");
                return;
            }
        };
        let start_time = self
            .config
            .position_to_time_rounded(self.playhead.position());
        let mut start_position = self.config.time_to_position(start_time);
        let mut start_index = self.model.index_at_time(start_time);
        let mut end_position = self.config.time_to_position(last_time);
        let mut end_index = self.model.len() - 1;
        if start_position > end_position {
            start_position = self.config.origin_offset;
            start_index = Some(0);
        }
        if self.range.is_b_visible() {
            let end_time = self.config.position_to_time(self.range.b_position());
            end_position = self.config.time_to_position(end_time);
            if let Some(index) = self.model.index_at_time(end_time) {
                end_index = index;
            }
        } else {
            self.range.reset(&self.config);
        }
        let start_index = start_index.unwrap_or(0);
        self.session.span = PlaySpan {
            start_index,
            end_index,
            start_position,
            end_position,
        };
        self.session.current_index = start_index;
        self.play_cursor.set_position(start_position, &self.config);
        self.playhead.set_position(start_position, &self.config);
        self.invalidate();
        self.signal_start();
        if let Some(time_ms) = self.model.get(start_index).map(|placed| placed.time) {
            self.emit_play_time(start_index, time_ms);
        }
        self.request(HostRequest::StartTimer {
            token: TimerToken::PlayStep,
            delay_ms: STEP_INTERVAL_MS,
        });
    }

    fn signal_start(&mut self) {
        if !self.session.start_signalled {
            self.session.start_signalled = true;
            self.emit(RulerEvent::PlayStarted);
        }
    }

    fn emit_play_time(&mut self, index: usize, time_ms: i64) {
        self.time_changed_since_switch = true;
        let item = self.model.get(index).map(|placed| placed.item.clone());
        debug_assert!(item.is_some(), "play index {index} outside the model");
        if let Some(item) = item {
            self.emit(RulerEvent::PlayTimeChanged { time_ms, item });
        }
    }

    /// Scroll the ruler whenever the cursor has drifted past the screen
    /// center, keeping it centered for the rest of the span.
    fn recenter_on_cursor(&mut self) {
        let drift = self.viewport.to_screen(self.play_cursor.position()) - self.viewport.center();
        if drift > 0.0 {
            let scroll = self.viewport.scroll() + drift;
            self.viewport.set_scroll(scroll, &self.config);
        }
    }

    fn play_frame(&mut self, value: f32) {
        if self.session.state != PlayState::Playing {
            return;
        }
        self.play_cursor
            .set_position(value + self.session.anim_base, &self.config);
        self.recenter_on_cursor();
        self.playhead
            .set_position(self.play_cursor.position(), &self.config);
        let index = self
            .config
            .position_to_index(self.play_cursor.position(), Rounding::Truncate);
        if index != self.session.current_index {
            self.session.current_index = index;
            self.emit_play_time(index, self.config.index_to_time(index));
        }
        self.invalidate();
    }

    /// One 200 ms step of the stepped strategy in normal mode.
    fn stepped_step(&mut self) {
        if self.session.state != PlayState::Playing {
            return;
        }
        self.session.current_index += 1;
        let end = self.session.span.end_index;
        if self.session.current_index > end {
            self.finish_span();
            return;
        }
        let index = self.session.current_index;
        let time_ms = match self.model.get(index) {
            Some(placed) => placed.time,
            None => {
                debug_assert!(false, "step index {index} outside the model");
                return;
            }
        };
        let position = self.config.time_to_position(time_ms);
        self.play_cursor.set_position(position, &self.config);
        self.recenter_on_cursor();
        self.playhead.set_position(position, &self.config);
        self.emit_play_time(index, self.config.index_to_time(index));
        if index == end {
            self.finish_span();
            return;
        }
        self.request(HostRequest::StartTimer {
            token: TimerToken::PlayStep,
            delay_ms: STEP_INTERVAL_MS,
        });
        self.invalidate();
    }

    /// Stepped-strategy completion: hide the cursor right away, then hold
    /// the final frame briefly before the span resets.
    fn finish_span(&mut self) {
        self.invalidate();
        if !self.session.repeat {
            self.play_cursor.visible = false;
            self.playhead.visible = true;
        }
        self.request(HostRequest::StartTimer {
            token: TimerToken::Settle,
            delay_ms: SETTLE_STEPPED_MS,
        });
    }

    /// One 200 ms step of full-mode playback.
    fn full_mode_step(&mut self) {
        if self.session.state != PlayState::Playing {
            return;
        }
        self.time_changed_since_switch = true;
        self.session.current_index += 1;
        let end = self.session.span.end_index;
        if self.session.current_index > end {
            self.finish_full_span();
            return;
        }
        let index = self.session.current_index;
        let time_ms = match self.model.get(index) {
            Some(placed) => placed.time,
            None => {
                debug_assert!(false, "step index {index} outside the model");
                return;
            }
        };
        let position = self.config.time_to_position(time_ms);
        self.play_cursor.set_position(position, &self.config);
        self.playhead.set_position(position, &self.config);
        self.emit_play_time(index, time_ms);
        if index == end {
            self.finish_full_span();
            return;
        }
        self.request(HostRequest::StartTimer {
            token: TimerToken::PlayStep,
            delay_ms: STEP_INTERVAL_MS,
        });
        self.invalidate();
    }

    /// Full-mode completion restarts or stops without a settle delay.
    fn finish_full_span(&mut self) {
        if self.session.repeat {
            self.reset_play_time_full();
            self.play_in_full_mode();
        } else {
            self.play_cursor.visible = false;
            self.playhead.visible = true;
            self.reset_play_time_full();
            self.session.state = PlayState::Idle;
            self.invalidate();
            self.emit(RulerEvent::PlayStopped);
            self.sync_selection();
        }
    }

    /// Move both cursors back to the span start and scroll there; on
    /// arrival either the loop restarts or nothing more happens.
    fn reset_play_time(&mut self) {
        let target = if self.range.is_b_visible() {
            self.playhead
                .set_position(self.range.a_position(), &self.config);
            self.playhead.position() - self.viewport.center()
        } else {
            self.playhead
                .set_position(self.config.origin_offset, &self.config);
            -self.config.origin_offset
        };
        self.play_cursor
            .set_position(self.playhead.position(), &self.config);
        let repeating = self.session.is_active() && self.session.repeat;
        self.session.center_follow_up = if repeating {
            CenterFollowUp::RestartLoop
        } else {
            CenterFollowUp::None
        };
        if repeating {
            self.session.state = PlayState::Preparing;
        }
        self.request(HostRequest::StartAnimation {
            token: AnimationToken::Center,
            from: self.viewport.scroll(),
            to: target,
            duration_ms: TRANSITION_MS,
        });
    }

    fn reset_play_time_full(&mut self) {
        let start_position = if self.range.is_a_visible() && self.range.is_b_visible() {
            self.range.a_position()
        } else {
            match self.model.get(0) {
                Some(placed) => self.config.time_to_position(placed.time),
                None => self.config.origin_offset,
            }
        };
        self.playhead.set_position(start_position, &self.config);
        self.play_cursor.set_position(start_position, &self.config);
        self.invalidate();
    }

    /// Cancel the animated strategy. The interpolation stops mid-flight,
    /// leaving the cursor off-grid; a short corrective animation lands it
    /// on the next tick before the cursor is hidden.
    fn begin_cancel(&mut self) {
        self.session.cancelled = true;
        self.session.state = PlayState::Stopping;
        self.request(HostRequest::CancelAnimation {
            token: AnimationToken::Play,
        });
        let position = self.play_cursor.position();
        let off_grid = (position - self.config.origin_offset) % self.config.tick_width > 0.0;
        if off_grid {
            let mut next = self.config.position_to_index(position, Rounding::Nearest) + 1;
            if next > self.model.len() - 1 {
                next -= 1;
            }
            let target = self.config.index_to_position(next);
            let offset = target - position;
            let duration_ms = (offset / self.config.tick_width
                / self.config.ticks_per_label as f32
                * 1000.0)
                .max(0.0) as u64;
            self.request(HostRequest::StartAnimation {
                token: AnimationToken::FixUp,
                from: position,
                to: target,
                duration_ms,
            });
        } else {
            self.fixup_finished();
        }
    }

    fn fixup_finished(&mut self) {
        self.playhead.visible = true;
        self.play_cursor.visible = false;
        self.session.state = PlayState::Idle;
        self.invalidate();
        if self.session.continue_in_new_mode {
            self.session.continue_in_new_mode = false;
            let mode = if self.config.is_full() {
                Mode::Normal
            } else {
                Mode::Full
            };
            self.switch_mode(mode);
            self.play_in_full_mode();
        } else {
            self.emit(RulerEvent::PlayStopped);
            self.sync_selection();
        }
    }

    fn center_finished(&mut self) {
        match std::mem::take(&mut self.session.center_follow_up) {
            CenterFollowUp::BeginPlay => {
                if !self.config.is_full() {
                    self.do_play();
                }
            }
            CenterFollowUp::RestartLoop => {
                if !self.config.is_full() {
                    self.session.state = PlayState::Preparing;
                    self.prepare_play();
                }
            }
            CenterFollowUp::None => {
                if !self.session.is_active() {
                    self.playhead.visible = true;
                    self.play_cursor.visible = false;
                    self.invalidate();
                }
            }
        }
    }

    /// The settle delay after a span completed has elapsed.
    fn settle_elapsed(&mut self) {
        if !self.session.is_active() {
            return;
        }
        if self.session.repeat {
            self.reset_play_time();
        } else {
            self.play_cursor.visible = false;
            self.playhead.visible = true;
            self.session.state = PlayState::Idle;
            self.reset_play_time();
            self.emit(RulerEvent::PlayStopped);
            self.sync_selection();
        }
    }

    // ------------------------------------------------------------------
    // Driver callbacks
    // ------------------------------------------------------------------

    /// Progress of a host-run animation.
    pub fn animation_frame(&mut self, token: AnimationToken, value: f32) {
        match token {
            AnimationToken::Center => {
                self.viewport.set_scroll(value, &self.config);
                self.invalidate();
            }
            AnimationToken::Play => self.play_frame(value),
            AnimationToken::FixUp => {
                self.play_cursor.set_position(value, &self.config);
                self.playhead.set_position(value, &self.config);
                self.invalidate();
            }
            // Item fades are render-only.
            AnimationToken::ItemShow | AnimationToken::ItemHide => {}
        }
    }

    /// Natural completion of a host-run animation. Cancelled animations
    /// must not report completion.
    pub fn animation_finished(&mut self, token: AnimationToken) {
        match token {
            AnimationToken::Center => self.center_finished(),
            AnimationToken::Play => {
                if !self.session.cancelled {
                    self.request(HostRequest::StartTimer {
                        token: TimerToken::Settle,
                        delay_ms: SETTLE_ANIMATED_MS,
                    });
                }
            }
            AnimationToken::FixUp => self.fixup_finished(),
            AnimationToken::ItemShow => self.finish_add(),
            AnimationToken::ItemHide => self.finish_delete(),
        }
    }

    /// A scheduled timer fired.
    pub fn timer_fired(&mut self, token: TimerToken) {
        match token {
            TimerToken::PlayStep => {
                if self.config.is_full() {
                    self.full_mode_step();
                } else {
                    self.stepped_step();
                }
            }
            TimerToken::Settle => self.settle_elapsed(),
        }
    }

    // ------------------------------------------------------------------
    // Shared internals
    // ------------------------------------------------------------------

    fn guard_not_playing(&self, what: &str) -> Result<()> {
        if self.session.is_active() {
            warn!("{what} rejected: playback is active");
            Err(Rejected::Playing)
        } else {
            Ok(())
        }
    }

    /// Report a playhead time change together with the selection it implies.
    fn emit_time_changed(&mut self, time_ms: i64) {
        self.time_changed_since_switch = true;
        let index = self.item_index_for_time(time_ms);
        let item = self.model.get(index).map(|placed| placed.item.clone());
        let selected = item.is_some();
        self.emit(RulerEvent::TimeChanged {
            time_ms,
            item: item.clone(),
        });
        self.emit(RulerEvent::SelectionChanged { selected, item });
        self.sync_selection();
    }

    fn sync_selection(&mut self) {
        let index = self.item_index_for_time(self.current_time());
        self.model.sync_selection(index, self.session.is_active());
    }
}
