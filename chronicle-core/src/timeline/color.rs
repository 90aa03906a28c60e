//! Color assignment for characters and lanes.
//!
//! The allocator is the only state the timeline keeps between layout runs:
//! lane colors are cached so a place keeps its color across refreshes. It
//! is cleared whenever a project is replaced so nothing leaks between
//! projects.

use std::collections::{HashMap, HashSet};

use rand::Rng;

/// Colors handed to characters at creation, in order.
pub const CHARACTER_PALETTE: [&str; 10] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
    "#BB8FCE", "#85C1E9",
];

/// Pastel colors handed to place lanes, in order of first layout.
pub const LANE_PALETTE: [&str; 12] = [
    "#FDE2E4", "#C9E4DE", "#F0EFEB", "#D0E6A5", "#FFEDB5", "#E6E6FA", "#FFE5D9", "#D7E9B9",
    "#F8F3D4", "#DCEEF2", "#FFEFD5", "#F3E8FF",
];

/// Fixed color of the synthetic no-place lane.
pub const NO_PLACE_COLOR: &str = "#D5D7DD";

/// Allocates character colors (unique until the palette runs out, then
/// random) and stable per-place lane colors.
#[derive(Debug, Clone, Default)]
pub struct ColorAllocator {
    used_character_colors: HashSet<String>,
    lane_colors: HashMap<String, String>,
}

impl ColorAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a color already present in loaded data so it is not handed
    /// out a second time.
    pub fn mark_character_color_used(&mut self, color: &str) {
        if !color.is_empty() {
            self.used_character_colors.insert(color.to_uppercase());
        }
    }

    /// Next character color: the first unused palette entry, or a random
    /// color once all ten are taken.
    pub fn character_color(&mut self) -> String {
        for color in CHARACTER_PALETTE {
            if !self.used_character_colors.contains(color) {
                self.used_character_colors.insert(color.to_string());
                return color.to_string();
            }
        }
        let color = random_color();
        self.used_character_colors.insert(color.clone());
        color
    }

    /// Color for a lane. `stored` is the color persisted on the place, if
    /// any; it wins over a fresh palette pick so lanes stay stable across
    /// sessions, and the cache makes them stable across layout runs.
    pub fn lane_color(&mut self, lane_id: &str, stored: Option<&str>) -> String {
        if lane_id == crate::timeline::layout::NO_PLACE_LANE {
            return NO_PLACE_COLOR.to_string();
        }
        if let Some(color) = self.lane_colors.get(lane_id) {
            return color.clone();
        }
        let color = match stored.filter(|c| !c.is_empty()) {
            Some(color) => color.to_string(),
            None => {
                let assigned = self.lane_colors.len();
                LANE_PALETTE[assigned % LANE_PALETTE.len()].to_string()
            }
        };
        self.lane_colors.insert(lane_id.to_string(), color.clone());
        color
    }

    /// Forget everything; called when a project is replaced.
    pub fn clear(&mut self) {
        self.used_character_colors.clear();
        self.lane_colors.clear();
    }
}

fn random_color() -> String {
    let mut rng = rand::thread_rng();
    format!("#{:06X}", rng.gen_range(0..0x100_0000u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_colors_unique_until_exhausted() {
        let mut colors = ColorAllocator::new();
        let mut seen = HashSet::new();
        for _ in 0..CHARACTER_PALETTE.len() {
            assert!(seen.insert(colors.character_color()));
        }
        // Past the palette, colors are random but still well-formed.
        let fallback = colors.character_color();
        assert_eq!(fallback.len(), 7);
        assert!(fallback.starts_with('#'));
    }

    #[test]
    fn test_loaded_colors_are_not_reissued() {
        let mut colors = ColorAllocator::new();
        colors.mark_character_color_used(CHARACTER_PALETTE[0]);
        assert_eq!(colors.character_color(), CHARACTER_PALETTE[1]);
    }

    #[test]
    fn test_lane_colors_stable_per_place() {
        let mut colors = ColorAllocator::new();
        let first = colors.lane_color("PLA001", None);
        let second = colors.lane_color("PLA002", None);
        assert_ne!(first, second);
        assert_eq!(colors.lane_color("PLA001", None), first);

        colors.clear();
        assert_eq!(colors.lane_color("PLA002", None), first);
    }

    #[test]
    fn test_stored_color_wins() {
        let mut colors = ColorAllocator::new();
        assert_eq!(colors.lane_color("PLA001", Some("#123456")), "#123456");
        assert_eq!(colors.lane_color("PLA001", None), "#123456");
    }

    #[test]
    fn test_no_place_lane_color_is_fixed() {
        let mut colors = ColorAllocator::new();
        assert_eq!(
            colors.lane_color(crate::timeline::layout::NO_PLACE_LANE, None),
            NO_PLACE_COLOR
        );
    }
}
