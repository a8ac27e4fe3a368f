// 🏷️ Categories - the closed set every expense belongs to
//
// The set is fixed: Food, Transportation, Entertainment, Shopping, Bills,
// Health, Other. Free text only enters at the parsing boundary below.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Food,
    Transportation,
    Entertainment,
    Shopping,
    Bills,
    Health,
    Other,
}

/// Glyph shown for anything that is not a known category
pub const DEFAULT_ICON: &str = "📦";

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 7] = [
        Category::Food,
        Category::Transportation,
        Category::Entertainment,
        Category::Shopping,
        Category::Bills,
        Category::Health,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Bills => "Bills",
            Category::Health => "Health",
            Category::Other => "Other",
        }
    }

    /// Display glyph for this category
    pub fn icon(&self) -> &'static str {
        match self {
            Category::Food => "🍔",
            Category::Transportation => "🚗",
            Category::Entertainment => "🎬",
            Category::Shopping => "🛍️",
            Category::Bills => "📄",
            Category::Health => "💊",
            Category::Other => DEFAULT_ICON,
        }
    }

    pub fn next(&self) -> Self {
        let i = self.index();
        Category::ALL[(i + 1) % Category::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        let i = self.index();
        Category::ALL[(i + Category::ALL.len() - 1) % Category::ALL.len()]
    }

    fn index(&self) -> usize {
        Category::ALL
            .iter()
            .position(|c| c == self)
            .unwrap_or(0)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for text that names no category
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}' (expected one of: Food, Transportation, Entertainment, Shopping, Bills, Health, Other)")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Glyph lookup at the string boundary.
///
/// Unknown text falls back to the "Other" glyph instead of failing; with the
/// closed enum this path is only reachable from untyped input.
pub fn icon_for(category: &str) -> &'static str {
    category
        .parse::<Category>()
        .map(|c| c.icon())
        .unwrap_or(DEFAULT_ICON)
}

// ============================================================================
// FILTER
// ============================================================================

/// Which records are visible and totaled: everything, or one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Filter {
    #[default]
    All,
    Category(Category),
}

impl Filter {
    /// "All" followed by every category, in display order
    pub fn choices() -> Vec<Filter> {
        std::iter::once(Filter::All)
            .chain(Category::ALL.iter().copied().map(Filter::Category))
            .collect()
    }

    pub fn matches(&self, category: Category) -> bool {
        match self {
            Filter::All => true,
            Filter::Category(c) => *c == category,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Category(c) => c.as_str(),
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Filter::All => Filter::Category(Category::ALL[0]),
            Filter::Category(Category::Other) => Filter::All,
            Filter::Category(c) => Filter::Category(c.next()),
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Filter::All => Filter::Category(Category::Other),
            Filter::Category(Category::Food) => Filter::All,
            Filter::Category(c) => Filter::Category(c.previous()),
        }
    }
}

impl From<Category> for Filter {
    fn from(category: Category) -> Self {
        Filter::Category(category)
    }
}

impl From<Filter> for String {
    fn from(filter: Filter) -> Self {
        filter.label().to_string()
    }
}

impl TryFrom<String> for Filter {
    type Error = UnknownCategory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Filter {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Filter::All)
        } else {
            s.parse::<Category>().map(Filter::Category)
        }
    }
}
