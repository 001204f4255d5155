//! Board primitives: coordinates, the per-player shot-tracking grid, and
//! the border ("halo") around a set of cells.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::bitboard::{BitBoard, BitBoardError};
use crate::config::BOARD_SIZE;

/// Bitboard type used for every 10×10 grid.
pub type BB = BitBoard<u128, { BOARD_SIZE as usize }>;

const GRID_SIZE: u8 = BOARD_SIZE;

/// A cell coordinate: `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: u8,
    pub y: u8,
}

impl Position {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Whether the position lies on the 10×10 board.
    pub const fn on_board(&self) -> bool {
        self.x < GRID_SIZE && self.y < GRID_SIZE
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One cell of a shot-tracking grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub x: u8,
    pub y: u8,
    pub is_shot: bool,
}

/// A player's record of the opponent cells they have fired at.
///
/// Cells only ever go from unshot to shot.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct ShotGrid {
    shots: BB,
}

impl ShotGrid {
    pub fn new() -> Self {
        Self { shots: BB::new() }
    }

    /// Grid with every position in `iter` already marked.
    pub fn from_positions<I>(iter: I) -> Result<Self, BitBoardError>
    where
        I: IntoIterator<Item = Position>,
    {
        let mut grid = Self::new();
        grid.mark_all(iter)?;
        Ok(grid)
    }

    pub fn is_shot(&self, pos: Position) -> Result<bool, BitBoardError> {
        self.shots.get(pos.x as usize, pos.y as usize)
    }

    /// Mark `pos` as shot. Returns `true` if it had not been shot before.
    pub fn mark(&mut self, pos: Position) -> Result<bool, BitBoardError> {
        self.shots.set(pos.x as usize, pos.y as usize)
    }

    pub fn mark_all<I>(&mut self, iter: I) -> Result<(), BitBoardError>
    where
        I: IntoIterator<Item = Position>,
    {
        for pos in iter {
            self.mark(pos)?;
        }
        Ok(())
    }

    pub fn shot_count(&self) -> usize {
        self.shots.count_ones()
    }

    pub fn is_exhausted(&self) -> bool {
        self.shots.is_full()
    }

    /// Cells not yet fired at, in row-major order.
    pub fn untargeted(&self) -> Vec<Position> {
        self.shots
            .iter_clear()
            .map(|(x, y)| Position::new(x as u8, y as u8))
            .collect()
    }

    /// Row-major 10×10 view, `cells()[y][x]`.
    pub fn cells(&self) -> Vec<Vec<GridCell>> {
        (0..GRID_SIZE)
            .map(|y| {
                (0..GRID_SIZE)
                    .map(|x| GridCell {
                        x,
                        y,
                        is_shot: self.shots.get(x as usize, y as usize).unwrap_or(false),
                    })
                    .collect()
            })
            .collect()
    }

    pub fn bits(&self) -> BB {
        self.shots
    }
}

impl fmt::Debug for ShotGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShotGrid {:?}", self.shots)
    }
}

/// A fresh grid with no cell shot.
pub fn new_shot_grid() -> ShotGrid {
    ShotGrid::new()
}

/// The one-cell-thick rectangle around `cells`, clipped to the board, minus
/// the cells themselves. Row-major order.
pub fn halo<I>(cells: I) -> Vec<Position>
where
    I: IntoIterator<Item = Position>,
{
    let cells: Vec<Position> = cells.into_iter().collect();
    let (Some(min_x), Some(max_x)) = (
        cells.iter().map(|p| p.x).min(),
        cells.iter().map(|p| p.x).max(),
    ) else {
        return Vec::new();
    };
    let (Some(min_y), Some(max_y)) = (
        cells.iter().map(|p| p.y).min(),
        cells.iter().map(|p| p.y).max(),
    ) else {
        return Vec::new();
    };

    let last = GRID_SIZE - 1;
    let xs = min_x.saturating_sub(1)..=max_x.saturating_add(1).min(last);
    let ys = min_y.saturating_sub(1)..=max_y.saturating_add(1).min(last);

    let mut border = Vec::new();
    for y in ys {
        for x in xs.clone() {
            let pos = Position::new(x, y);
            if !cells.contains(&pos) {
                border.push(pos);
            }
        }
    }
    border
}
