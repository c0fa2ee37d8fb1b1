use uuid::Uuid;

use crate::types::mode::ModeConfig;
use crate::types::time_item::PlacedItem;
use crate::types::viewport::Viewport;

/// How a one-tick shift of the items at and after an edit point splits
/// between animated and instant movement. Items currently on screen slide
/// over in a transition; off-screen items are repositioned directly. The
/// final positions are identical either way.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftPlan {
    pub animated: Vec<Uuid>,
    pub instant: Vec<Uuid>,
    pub delta: f32,
}

impl ShiftPlan {
    pub fn is_empty(&self) -> bool {
        self.animated.is_empty() && self.instant.is_empty()
    }
}

/// Split the items from `from_index` on by their current visibility.
pub fn plan_shift(
    items: &[PlacedItem],
    from_index: usize,
    delta: f32,
    viewport: &Viewport,
    config: &ModeConfig,
) -> ShiftPlan {
    let mut animated = Vec::new();
    let mut instant = Vec::new();
    for placed in items.iter().skip(from_index) {
        if viewport.is_on_screen(placed.position, config.tick_width) {
            animated.push(placed.id);
        } else {
            instant.push(placed.id);
        }
    }
    ShiftPlan {
        animated,
        instant,
        delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::mode::{Mode, RulerLayout};
    use crate::types::time_item::TimeItem;

    fn fixtures() -> (Vec<PlacedItem>, Viewport, ModeConfig) {
        let config = ModeConfig::new(Mode::Normal, &RulerLayout::new(1000.0));
        let items = (0..20)
            .map(|index| {
                PlacedItem::new(TimeItem::empty(), config.index_to_position(index), &config)
            })
            .collect();
        (items, Viewport::new(1000.0), config)
    }

    #[test]
    fn test_all_visible_items_animate() {
        let (items, viewport, config) = fixtures();
        let plan = plan_shift(&items[..5], 1, config.tick_width, &viewport, &config);
        assert_eq!(plan.animated.len(), 4);
        assert!(plan.instant.is_empty());
        assert_eq!(plan.delta, config.tick_width);
    }

    #[test]
    fn test_offscreen_items_move_instantly() {
        let (items, mut viewport, config) = fixtures();
        viewport.set_scroll(500.0, &config);
        let plan = plan_shift(&items, 0, -config.tick_width, &viewport, &config);
        // Visible window spans (400, 1600) exclusive: ticks 5..=15.
        assert_eq!(plan.animated.len(), 11);
        assert_eq!(plan.instant.len(), 9);
        for id in &plan.instant {
            let placed = items.iter().find(|placed| placed.id == *id).unwrap();
            assert!(!viewport.is_on_screen(placed.position, config.tick_width));
        }
    }

    #[test]
    fn test_plan_from_past_the_end_is_empty() {
        let (items, viewport, config) = fixtures();
        let plan = plan_shift(&items, items.len(), config.tick_width, &viewport, &config);
        assert!(plan.is_empty());
    }
}
