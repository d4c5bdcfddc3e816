//! Persian/Arabic text preparation for PDF output
//!
//! Text goes through two steps before it is drawn:
//! 1. letters are replaced with their joined presentation forms ([`arabic`])
//! 2. the result is reordered from logical to visual order ([`bidi`])

pub mod arabic;
pub mod bidi;

pub use arabic::ArabicReshaper;
pub use bidi::{has_rtl, reorder_visual};

use crate::config::ShapingConfig;

/// Shapes cell and label text for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextShaper {
    /// When false text is passed through untouched
    enabled: bool,
    /// Letter reshaper
    reshaper: ArabicReshaper,
}

impl TextShaper {
    /// Create a shaper with default reshaper options
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            reshaper: ArabicReshaper::default(),
        }
    }

    /// Create a shaper from the `[shaping]` configuration section
    pub fn from_config(config: &ShapingConfig) -> Self {
        Self {
            enabled: config.enabled,
            reshaper: ArabicReshaper {
                delete_harakat: config.delete_harakat,
                support_ligatures: config.support_ligatures,
                rial_sign: config.rial_sign,
            },
        }
    }

    /// Whether shaping is applied
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Prepare text for drawing
    pub fn shape(&self, text: &str) -> String {
        if !self.enabled || !has_rtl(text) {
            return text.to_string();
        }
        reorder_visual(&self.reshaper.reshape(text))
    }
}

impl Default for TextShaper {
    fn default() -> Self {
        Self::new(true)
    }
}
