use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    #[serde(rename = "💎")]
    Diamond,
    #[serde(rename = "🔥")]
    Fire,
    #[serde(rename = "⭐")]
    Star,
    #[serde(rename = "💰")]
    MoneyBag,
    #[serde(rename = "🎯")]
    Target,
    #[serde(rename = "🏆")]
    Trophy,
    #[serde(rename = "⚡")]
    Lightning,
    #[serde(rename = "🎁")]
    Gift,
    #[serde(rename = "👑")]
    Crown,
}

impl Symbol {
    pub const ALL: [Symbol; 9] = [
        Symbol::Diamond,
        Symbol::Fire,
        Symbol::Star,
        Symbol::MoneyBag,
        Symbol::Target,
        Symbol::Trophy,
        Symbol::Lightning,
        Symbol::Gift,
        Symbol::Crown,
    ];

    pub fn from_index(i: u8) -> Self {
        Self::ALL[i as usize % Self::ALL.len()]
    }

    pub fn to_index(self) -> u8 {
        self as u8
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Symbol::Diamond => "💎",
            Symbol::Fire => "🔥",
            Symbol::Star => "⭐",
            Symbol::MoneyBag => "💰",
            Symbol::Target => "🎯",
            Symbol::Trophy => "🏆",
            Symbol::Lightning => "⚡",
            Symbol::Gift => "🎁",
            Symbol::Crown => "👑",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.emoji())
    }
}

pub const GRID_SIZE: usize = 9;
pub const GRID_WIDTH: usize = 3;

/// Cells that win when they all show the same symbol: rows, columns, diagonals.
pub const WIN_PATTERNS: [[u8; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// The fixed line a winning card is drawn on (middle row).
pub const WINNING_LINE: [u8; 3] = [3, 4, 5];
