use serde::{Deserialize, Serialize};

/// Kind of travel an item records. The numeric codes are part of the
/// submit interface and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Flight = 0,
    Hotel = 1,
    Bus = 2,
    Other = 3,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Flight,
        Category::Hotel,
        Category::Bus,
        Category::Other,
    ];

    /// Resolve a wire code. Anything outside 0..=3 is rejected, never clamped.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Category::Flight),
            1 => Some(Category::Hotel),
            2 => Some(Category::Bus),
            3 => Some(Category::Other),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Flight => "flight",
            Category::Hotel => "hotel",
            Category::Bus => "bus",
            Category::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "flight" => Some(Category::Flight),
            "hotel" => Some(Category::Hotel),
            "bus" => Some(Category::Bus),
            "other" => Some(Category::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
