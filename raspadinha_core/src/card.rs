use crate::{
    error::{GameError, GameResult},
    money::Money,
    outcome::{PrizeType, CARD_COST},
    rng::RandomSource,
    symbols::{Symbol, GRID_SIZE, GRID_WIDTH, WINNING_LINE, WIN_PATTERNS},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Draws per cell before falling back to the first symbol that keeps the card losing.
pub const MAX_DRAWS_PER_CELL: usize = 64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Position {
    pub x: u8,
    pub y: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScratchBlock {
    pub id: u8,
    pub symbol: Symbol,
    pub position: Position,
}

impl ScratchBlock {
    pub fn new(id: u8, symbol: Symbol) -> Self {
        let w = GRID_WIDTH as u8;
        Self {
            id,
            symbol,
            position: Position { x: id % w, y: id / w },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScratchCard {
    pub id: String,
    pub cost: Money,
    pub grid: Vec<ScratchBlock>,
    pub is_completed: bool,
    pub has_won: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize_amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize_type: Option<PrizeType>,
    #[serde(default)]
    pub revealed: [bool; GRID_SIZE],
}

impl ScratchCard {
    fn from_symbols(symbols: [Symbol; GRID_SIZE]) -> Self {
        let grid = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| ScratchBlock::new(i as u8, *s))
            .collect();
        Self {
            id: format!("card_{}", uuid::Uuid::new_v4().simple()),
            cost: CARD_COST,
            grid,
            is_completed: false,
            has_won: false,
            prize_amount: None,
            prize_type: None,
            revealed: [false; GRID_SIZE],
        }
    }

    pub fn symbol_at(&self, id: u8) -> Option<Symbol> {
        self.grid.get(id as usize).map(|b| b.symbol)
    }

    /// First pattern showing three identical symbols, ignoring what has been revealed.
    pub fn winning_line(&self) -> Option<[u8; 3]> {
        WIN_PATTERNS.iter().copied().find(|p| self.line_matches(p))
    }

    fn line_matches(&self, pattern: &[u8; 3]) -> bool {
        let mut symbols = pattern.iter().map(|&i| self.symbol_at(i));
        match symbols.next().flatten() {
            Some(first) => symbols.all(|s| s == Some(first)),
            None => false,
        }
    }

    /// Scratches one block. Returns the winning line once all of its cells are revealed.
    pub fn reveal(&mut self, id: u8) -> GameResult<Option<[u8; 3]>> {
        let slot = self
            .revealed
            .get_mut(id as usize)
            .ok_or(GameError::InvalidBlock(id))?;
        *slot = true;
        Ok(self.revealed_winning_line())
    }

    pub fn revealed_winning_line(&self) -> Option<[u8; 3]> {
        if !self.has_won {
            return None;
        }
        WIN_PATTERNS.iter().copied().find(|p| {
            p.iter().all(|&i| self.revealed[i as usize]) && self.line_matches(p)
        })
    }

    pub fn reveal_all(&mut self) {
        self.revealed = [true; GRID_SIZE];
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.revealed.iter().all(|r| *r)
    }
}

pub fn generate_winning_card<R: RandomSource + ?Sized>(
    prize_amount: Money,
    prize_type: PrizeType,
    rng: &mut R,
) -> ScratchCard {
    let winning = Symbol::ALL[rng.pick(Symbol::ALL.len())];
    let mut symbols = [winning; GRID_SIZE];
    for (i, slot) in symbols.iter_mut().enumerate() {
        if !WINNING_LINE.contains(&(i as u8)) {
            *slot = Symbol::ALL[rng.pick(Symbol::ALL.len())];
        }
    }
    let mut card = ScratchCard::from_symbols(symbols);
    card.has_won = true;
    card.prize_amount = Some(prize_type.fixed_value().unwrap_or(prize_amount));
    card.prize_type = Some(prize_type);
    card
}

pub fn generate_losing_card<R: RandomSource + ?Sized>(rng: &mut R) -> ScratchCard {
    let mut grid: [Option<Symbol>; GRID_SIZE] = [None; GRID_SIZE];
    for cell in 0..GRID_SIZE {
        grid[cell] = Some(draw_non_winning(&grid, cell, rng));
    }
    let symbols = grid.map(|s| s.unwrap_or(Symbol::ALL[0]));
    ScratchCard::from_symbols(symbols)
}

fn draw_non_winning<R: RandomSource + ?Sized>(
    grid: &[Option<Symbol>; GRID_SIZE],
    cell: usize,
    rng: &mut R,
) -> Symbol {
    for _ in 0..MAX_DRAWS_PER_CELL {
        let candidate = Symbol::ALL[rng.pick(Symbol::ALL.len())];
        if !completes_line(grid, cell, candidate) {
            return candidate;
        }
    }
    // At most four lines cross a cell, so at least five symbols stay available.
    warn!(cell, "random draws exhausted, using deterministic fill");
    Symbol::ALL
        .into_iter()
        .find(|s| !completes_line(grid, cell, *s))
        .unwrap_or(Symbol::ALL[0])
}

/// Whether placing `symbol` at `cell` completes any line with three identical symbols.
pub fn completes_line(grid: &[Option<Symbol>; GRID_SIZE], cell: usize, symbol: Symbol) -> bool {
    WIN_PATTERNS
        .iter()
        .filter(|p| p.contains(&(cell as u8)))
        .any(|p| {
            p.iter()
                .filter(|&&i| i as usize != cell)
                .all(|&i| grid[i as usize] == Some(symbol))
        })
}
