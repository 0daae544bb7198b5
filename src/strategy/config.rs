//! Underlay strategy configuration

use super::quad::Color;

/// Underlay strategy options
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    /// Solid quads of this color drawn above the underlay are treated as
    /// transparent when accumulating the content rect
    pub background_color: Color,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            background_color: Color::BLACK,
        }
    }
}

impl StrategyConfig {
    /// Set the background color
    pub fn background_color(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }
}
