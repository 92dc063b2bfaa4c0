use serde::{Deserialize, Serialize};

/// Fonts and page layout of exported documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStyles {
    pub body_font: String,
    pub heading_font: String,
    /// Body text size in points.
    pub body_size: usize,
    pub heading1_size: usize,
    pub heading2_size: usize,
    pub heading3_size: usize,
    /// Uniform page margin in centimetres.
    pub margin_cm: f64,
}

impl Default for DocumentStyles {
    fn default() -> Self {
        Self {
            body_font: "Arial".to_string(),
            heading_font: "Arial".to_string(),
            body_size: 11,
            heading1_size: 16,
            heading2_size: 13,
            heading3_size: 11,
            // ABNT page margin.
            margin_cm: 2.5,
        }
    }
}

impl DocumentStyles {
    /// Page margin in twentieths of a point, as OOXML expects.
    pub fn margin_twips(&self) -> i32 {
        (self.margin_cm / 2.54 * 1440.0).round() as i32
    }
}
