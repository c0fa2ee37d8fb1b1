use serde::{Deserialize, Serialize};

use crate::types::mode::ModeConfig;
use crate::types::time_item::{PlacedItem, TimeItem};

/// Ordered collection of placed time items.
///
/// Positions are strictly increasing and spaced by exactly one tick width;
/// blank items are synthesized to fill index gaps so the i-th entry is
/// always the item on tick i. Mutations here are the storage half of an
/// edit; the ruler drives the surrounding guard and transition choreography.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineModel {
    items: Vec<PlacedItem>,
}

impl TimelineModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The model holds at most one item per tick index, `0..=total_ticks`.
    pub fn at_capacity(&self, config: &ModeConfig) -> bool {
        self.items.len() == config.total_ticks + 1
    }

    pub fn get(&self, index: usize) -> Option<&PlacedItem> {
        self.items.get(index)
    }

    pub fn last(&self) -> Option<&PlacedItem> {
        self.items.last()
    }

    pub fn items(&self) -> &[PlacedItem] {
        &self.items
    }

    pub fn time_items(&self) -> Vec<TimeItem> {
        self.items.iter().map(|placed| placed.item.clone()).collect()
    }

    /// Index of the item sitting exactly on `time_ms`, if any.
    pub fn index_at_time(&self, time_ms: i64) -> Option<usize> {
        self.items.iter().position(|placed| placed.time == time_ms)
    }

    /// Append at `index`, synthesizing blank items for any gap between the
    /// current last entry and `index`.
    pub fn append_with_fill(
        &mut self,
        item: TimeItem,
        position: f32,
        index: usize,
        config: &ModeConfig,
    ) {
        for gap in self.items.len()..index {
            let gap_position = config.index_to_position(gap);
            self.items
                .push(PlacedItem::new(TimeItem::empty(), gap_position, config));
        }
        self.items.push(PlacedItem::new(item, position, config));
    }

    /// Move every item from `from_index` on by `delta` pixels.
    pub fn shift_tail(&mut self, from_index: usize, delta: f32, config: &ModeConfig) {
        for placed in self.items.iter_mut().skip(from_index) {
            placed.shift_by(delta, config);
        }
    }

    pub fn insert(&mut self, index: usize, item: TimeItem, position: f32, config: &ModeConfig) {
        self.items.insert(index, PlacedItem::new(item, position, config));
    }

    pub fn remove(&mut self, index: usize) -> PlacedItem {
        self.items.remove(index)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Recompute every pixel position from its time after a mode switch.
    pub fn reproject(&mut self, config: &ModeConfig) {
        for placed in &mut self.items {
            placed.position = config.time_to_position(placed.time);
        }
    }

    /// Mark the item under the playhead; everything else is deselected,
    /// and nothing is selected while playback runs.
    pub fn sync_selection(&mut self, playhead_index: usize, playing: bool) {
        for (index, placed) in self.items.iter_mut().enumerate() {
            placed.selected = !playing && index == playhead_index;
        }
    }

    /// Index-consistency invariant: item i sits on tick i, positions
    /// strictly increasing, count within capacity. Violations indicate a
    /// broken edit elsewhere, so this asserts rather than recovers.
    pub fn assert_consistent(&self, config: &ModeConfig) {
        if cfg!(debug_assertions) {
            assert!(
                self.items.len() <= config.total_ticks + 1,
                "item count {} exceeds capacity {}",
                self.items.len(),
                config.total_ticks + 1
            );
            for (index, placed) in self.items.iter().enumerate() {
                let expected = config.index_to_position(index);
                assert!(
                    (placed.position - expected).abs() < 0.5,
                    "item {} at {} expected {}",
                    index,
                    placed.position,
                    expected
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::mode::{Mode, RulerLayout};
    use serde_json::json;

    fn config() -> ModeConfig {
        ModeConfig::new(Mode::Normal, &RulerLayout::new(1000.0))
    }

    fn item(flag: i32) -> TimeItem {
        TimeItem::new(flag, 0xFFFF_0000, Some(json!(flag)))
    }

    #[test]
    fn test_append_with_fill_synthesizes_gap_items() {
        let config = config();
        let mut model = TimelineModel::new();
        model.append_with_fill(item(1), 300.0, 3, &config);
        assert_eq!(model.len(), 4);
        for index in 0..3 {
            let placed = model.get(index).unwrap();
            assert!(placed.item.is_empty());
            assert_eq!(placed.position, index as f32 * 100.0);
            assert_eq!(placed.time, index as i64 * 200);
        }
        assert_eq!(model.get(3).unwrap().item.flag, 1);
        assert_eq!(model.get(3).unwrap().time, 600);
        model.assert_consistent(&config);
    }

    #[test]
    fn test_insert_shifts_tail_forward_one_tick() {
        let config = config();
        let mut model = TimelineModel::new();
        for index in 0..3 {
            model.append_with_fill(item(index as i32), index as f32 * 100.0, index, &config);
        }
        model.shift_tail(1, config.tick_width, &config);
        model.insert(1, item(9), 100.0, &config);
        assert_eq!(model.len(), 4);
        assert_eq!(model.get(1).unwrap().item.flag, 9);
        assert_eq!(model.get(2).unwrap().item.flag, 1);
        assert_eq!(model.get(2).unwrap().position, 200.0);
        assert_eq!(model.get(3).unwrap().time, 600);
        model.assert_consistent(&config);
    }

    #[test]
    fn test_remove_shifts_tail_back_one_tick() {
        let config = config();
        let mut model = TimelineModel::new();
        for index in 0..3 {
            model.append_with_fill(item(index as i32), index as f32 * 100.0, index, &config);
        }
        model.shift_tail(2, -config.tick_width, &config);
        let removed = model.remove(1);
        assert_eq!(removed.item.flag, 1);
        assert_eq!(model.len(), 2);
        assert_eq!(model.get(1).unwrap().item.flag, 2);
        assert_eq!(model.get(1).unwrap().position, 100.0);
        assert_eq!(model.get(1).unwrap().time, 200);
        model.assert_consistent(&config);
    }

    #[test]
    fn test_reproject_preserves_time() {
        let normal = config();
        let full = ModeConfig::new(Mode::Full, &RulerLayout::new(1000.0));
        let mut model = TimelineModel::new();
        for index in 0..4 {
            model.append_with_fill(item(index as i32), index as f32 * 100.0, index, &normal);
        }
        model.reproject(&full);
        for index in 0..4 {
            let placed = model.get(index).unwrap();
            assert_eq!(placed.time, index as i64 * 200);
            assert_eq!(placed.position, full.time_to_position(placed.time));
        }
        model.reproject(&normal);
        model.assert_consistent(&normal);
    }

    #[test]
    fn test_capacity_bound() {
        let layout = RulerLayout {
            max_time_secs: 1,
            ..RulerLayout::new(1000.0)
        };
        let config = ModeConfig::new(Mode::Normal, &layout);
        assert_eq!(config.total_ticks, 5);
        let mut model = TimelineModel::new();
        for index in 0..=5 {
            assert!(!model.at_capacity(&config));
            model.append_with_fill(item(index as i32), index as f32 * 100.0, index, &config);
        }
        assert!(model.at_capacity(&config));
    }

    #[test]
    fn test_index_at_time() {
        let config = config();
        let mut model = TimelineModel::new();
        for index in 0..3 {
            model.append_with_fill(item(index as i32), index as f32 * 100.0, index, &config);
        }
        assert_eq!(model.index_at_time(400), Some(2));
        assert_eq!(model.index_at_time(600), None);
    }
}
