use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::types::mode::ModeConfig;

/// Flag carried by blank filler items.
pub const EMPTY_ITEM_FLAG: i32 = -1;

/// Color of blank filler items (white, ARGB).
pub const EMPTY_ITEM_COLOR: u32 = 0xFFFF_FFFF;

/// Payload attached to one tick of the ruler. Replaced on edit, never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeItem {
    pub flag: i32,
    /// ARGB color the renderer fills the item dot with.
    pub color: u32,
    pub data: Option<Value>,
}

impl TimeItem {
    pub fn new(flag: i32, color: u32, data: Option<Value>) -> Self {
        Self { flag, color, data }
    }

    /// Filler for ticks between the last item and an appended one.
    pub fn empty() -> Self {
        Self::new(EMPTY_ITEM_FLAG, EMPTY_ITEM_COLOR, None)
    }

    /// An item without payload is a blank placeholder.
    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }
}

/// A time item placed on a tick. Owned by the model; the i-th entry always
/// sits on tick i.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
    /// Stable identity, used by the host to address in-flight shift
    /// transitions while indices move.
    pub id: Uuid,
    pub item: TimeItem,
    /// Timeline-space pixel position of the tick this item sits on.
    pub position: f32,
    /// Time of the tick, in milliseconds.
    pub time: i64,
    pub selected: bool,
}

impl PlacedItem {
    pub fn new(item: TimeItem, position: f32, config: &ModeConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            time: config.position_to_time(position),
            item,
            position,
            selected: false,
        }
    }

    /// Move one edit shift; time follows the new tick.
    pub fn shift_by(&mut self, delta: f32, config: &ModeConfig) {
        self.position += delta;
        self.time = config.position_to_time(self.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::mode::{Mode, RulerLayout};
    use serde_json::json;

    #[test]
    fn test_empty_item() {
        let item = TimeItem::empty();
        assert!(item.is_empty());
        assert_eq!(item.flag, EMPTY_ITEM_FLAG);
        assert!(!TimeItem::new(3, 0xFF00_0000, Some(json!("device"))).is_empty());
    }

    #[test]
    fn test_placed_item_time_follows_position() {
        let config = ModeConfig::new(Mode::Normal, &RulerLayout::new(1000.0));
        let mut placed = PlacedItem::new(TimeItem::empty(), 300.0, &config);
        assert_eq!(placed.time, 600);
        placed.shift_by(config.tick_width, &config);
        assert_eq!(placed.position, 400.0);
        assert_eq!(placed.time, 800);
    }

    #[test]
    fn test_item_serialization_round_trip() {
        let item = TimeItem::new(7, 0xFFAA_0000, Some(json!({ "device": 7 })));
        let text = serde_json::to_string(&item).unwrap();
        let back: TimeItem = serde_json::from_str(&text).unwrap();
        assert_eq!(back, item);
    }
}
