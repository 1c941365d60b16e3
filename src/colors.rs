use ratatui::style::Color;
use std::collections::HashMap;

/// Light pastels, readable behind black text.
pub const DEFAULT_PALETTE: [Color; 10] = [
    Color::Rgb(0xa7, 0xf3, 0xd0),
    Color::Rgb(0xbf, 0xdb, 0xfe),
    Color::Rgb(0xfe, 0xca, 0xca),
    Color::Rgb(0xfe, 0xd7, 0xaa),
    Color::Rgb(0xdb, 0xea, 0xfe),
    Color::Rgb(0xfe, 0xf0, 0x8a),
    Color::Rgb(0xe9, 0xd5, 0xff),
    Color::Rgb(0xba, 0xe6, 0xfd),
    Color::Rgb(0xfb, 0xcf, 0xe8),
    Color::Rgb(0xcc, 0xfb, 0xf1),
];

/// Session-scoped course title → color map.
///
/// Colors are handed out in first-seen order and wrap around the palette, so
/// the Nth distinct title gets `palette[(N - 1) % palette.len()]`. Both views
/// must share one instance for a title to keep its color across mode
/// switches.
#[derive(Debug, Clone)]
pub struct CourseColors {
    palette: Vec<Color>,
    assigned: HashMap<String, Color>,
}

impl Default for CourseColors {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE.to_vec())
    }
}

impl CourseColors {
    /// An empty palette falls back to [`DEFAULT_PALETTE`].
    pub fn new(palette: Vec<Color>) -> Self {
        let palette = if palette.is_empty() {
            DEFAULT_PALETTE.to_vec()
        } else {
            palette
        };
        Self {
            palette,
            assigned: HashMap::new(),
        }
    }

    pub fn color_for(&mut self, title: &str) -> Color {
        if let Some(color) = self.assigned.get(title) {
            return *color;
        }
        let color = self.palette[self.assigned.len() % self.palette.len()];
        self.assigned.insert(title.to_string(), color);
        color
    }
}
