//! Ship placements, in-game ships, and placement validation.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{BOARD_SIZE, CLASSIC_FLEET};
use crate::grid::{halo, Position, ShotGrid};

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Kind of ship, named by size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShipKind {
    Small,
    Medium,
    Large,
    Huge,
}

impl ShipKind {
    pub const ALL: [ShipKind; 4] = [
        ShipKind::Small,
        ShipKind::Medium,
        ShipKind::Large,
        ShipKind::Huge,
    ];

    /// Number of cells a ship of this kind occupies.
    pub const fn length(self) -> u8 {
        match self {
            ShipKind::Small => 1,
            ShipKind::Medium => 2,
            ShipKind::Large => 3,
            ShipKind::Huge => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ShipKind::Small => "small",
            ShipKind::Medium => "medium",
            ShipKind::Large => "large",
            ShipKind::Huge => "huge",
        }
    }
}

impl fmt::Display for ShipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A ship as declared by a client: anchor cell, direction and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipPlacement {
    pub anchor: Position,
    pub orientation: Orientation,
    pub length: u8,
    pub kind: ShipKind,
}

impl ShipPlacement {
    /// Placement whose length is taken from `kind`.
    pub fn new(x: u8, y: u8, orientation: Orientation, kind: ShipKind) -> Self {
        Self {
            anchor: Position::new(x, y),
            orientation,
            length: kind.length(),
            kind,
        }
    }

    /// Cells covered by the placement, walking away from the anchor.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.length).map(move |i| match self.orientation {
            Orientation::Horizontal => {
                Position::new(self.anchor.x.saturating_add(i), self.anchor.y)
            }
            Orientation::Vertical => Position::new(self.anchor.x, self.anchor.y.saturating_add(i)),
        })
    }
}

/// One occupied cell of an in-game ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipCell {
    pub x: u8,
    pub y: u8,
    pub alive: bool,
}

/// A ship inside a game, tracking which of its cells are still afloat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub orientation: Orientation,
    pub length: u8,
    pub kind: ShipKind,
    pub cells: Vec<ShipCell>,
}

impl Ship {
    /// Whether any cell of the ship sits at `pos`.
    pub fn occupies(&self, pos: Position) -> bool {
        self.cells.iter().any(|c| c.x == pos.x && c.y == pos.y)
    }

    /// Mark the cell at `pos` as hit. Returns `false` if the ship has no cell there.
    pub fn hit(&mut self, pos: Position) -> bool {
        match self.cells.iter_mut().find(|c| c.x == pos.x && c.y == pos.y) {
            Some(cell) => {
                cell.alive = false;
                true
            }
            None => false,
        }
    }

    pub fn is_sunk(&self) -> bool {
        self.cells.iter().all(|c| !c.alive)
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells.iter().map(|c| Position::new(c.x, c.y))
    }

    /// On-board cells bordering the ship, excluding the ship itself.
    pub fn halo(&self) -> Vec<Position> {
        halo(self.positions())
    }
}

/// Expand a placement into the ship it describes, every cell alive.
///
/// No bounds checking happens here: cells past the board edge are kept as
/// declared. Validation is the job of [`validate_fleet`].
pub fn expand_ship(placement: &ShipPlacement) -> Ship {
    Ship {
        orientation: placement.orientation,
        length: placement.length,
        kind: placement.kind,
        cells: placement
            .positions()
            .map(|p| ShipCell {
                x: p.x,
                y: p.y,
                alive: true,
            })
            .collect(),
    }
}

/// How strictly submitted fleets are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "net", derive(clap::ValueEnum))]
pub enum PlacementPolicy {
    /// Accept any declaration, including ships that leave the board.
    #[default]
    Permissive,
    /// Ships must be on the board, sized by kind, and neither overlap nor touch.
    Strict,
    /// `Strict` plus the exact classic fleet (1 huge, 2 large, 3 medium, 4 small).
    Classic,
}

/// Reasons a fleet fails validation. Indices refer to the submitted list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementError {
    OutOfBounds { index: usize },
    LengthMismatch { index: usize, kind: ShipKind, length: u8 },
    Overlap { first: usize, second: usize },
    Touching { first: usize, second: usize },
    FleetComposition { kind: ShipKind, expected: usize, found: usize },
    /// Random generation gave up.
    UnableToPlace,
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementError::OutOfBounds { index } => {
                write!(f, "ship #{} extends past the board", index)
            }
            PlacementError::LengthMismatch {
                index,
                kind,
                length,
            } => write!(
                f,
                "ship #{} is {} but has length {} (expected {})",
                index,
                kind,
                length,
                kind.length()
            ),
            PlacementError::Overlap { first, second } => {
                write!(f, "ships #{} and #{} overlap", first, second)
            }
            PlacementError::Touching { first, second } => {
                write!(f, "ships #{} and #{} touch", first, second)
            }
            PlacementError::FleetComposition {
                kind,
                expected,
                found,
            } => write!(f, "expected {} {} ship(s), found {}", expected, kind, found),
            PlacementError::UnableToPlace => write!(f, "unable to place fleet"),
        }
    }
}

impl std::error::Error for PlacementError {}

/// Check `placements` against `policy`.
pub fn validate_fleet(
    policy: PlacementPolicy,
    placements: &[ShipPlacement],
) -> Result<(), PlacementError> {
    if policy == PlacementPolicy::Permissive {
        return Ok(());
    }

    let mut footprints = Vec::with_capacity(placements.len());
    for (index, placement) in placements.iter().enumerate() {
        if placement.length != placement.kind.length() {
            return Err(PlacementError::LengthMismatch {
                index,
                kind: placement.kind,
                length: placement.length,
            });
        }
        let ship = expand_ship(placement);
        let cells = ShotGrid::from_positions(ship.positions())
            .map_err(|_| PlacementError::OutOfBounds { index })?;
        let border = ShotGrid::from_positions(ship.halo())
            .map_err(|_| PlacementError::OutOfBounds { index })?;
        footprints.push((cells, border));
    }

    for (second, (cells, _)) in footprints.iter().enumerate() {
        for (first, (other_cells, other_border)) in footprints[..second].iter().enumerate() {
            if !(cells.bits() & other_cells.bits()).is_empty() {
                return Err(PlacementError::Overlap { first, second });
            }
            if !(cells.bits() & other_border.bits()).is_empty() {
                return Err(PlacementError::Touching { first, second });
            }
        }
    }

    if policy == PlacementPolicy::Classic {
        for (kind, expected) in CLASSIC_FLEET {
            let found = placements.iter().filter(|p| p.kind == kind).count();
            if found != expected {
                return Err(PlacementError::FleetComposition {
                    kind,
                    expected,
                    found,
                });
            }
        }
    }
    Ok(())
}

/// Maximum fleet layouts tried before giving up on random generation.
const FLEET_ATTEMPTS: usize = 50;
/// Maximum anchors tried per ship within a single layout.
const SHIP_ATTEMPTS: usize = 100;

/// Generate a random classic fleet that passes [`PlacementPolicy::Classic`].
pub fn random_fleet<R: Rng>(rng: &mut R) -> Result<Vec<ShipPlacement>, PlacementError> {
    for _ in 0..FLEET_ATTEMPTS {
        if let Some(fleet) = try_random_fleet(rng) {
            return Ok(fleet);
        }
    }
    Err(PlacementError::UnableToPlace)
}

fn try_random_fleet<R: Rng>(rng: &mut R) -> Option<Vec<ShipPlacement>> {
    // Cells taken by placed ships or their borders.
    let mut blocked = ShotGrid::new();
    let mut fleet = Vec::new();

    for (kind, count) in CLASSIC_FLEET {
        for _ in 0..count {
            let placement = random_placement(rng, kind, &blocked)?;
            let ship = expand_ship(&placement);
            blocked.mark_all(ship.positions().chain(ship.halo())).ok()?;
            fleet.push(placement);
        }
    }
    Some(fleet)
}

/// Returns a random placement of `kind` that avoids every `blocked` cell.
fn random_placement<R: Rng>(
    rng: &mut R,
    kind: ShipKind,
    blocked: &ShotGrid,
) -> Option<ShipPlacement> {
    let len = kind.length();
    for _ in 0..SHIP_ATTEMPTS {
        let orientation = if rng.random() {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        let (max_x, max_y) = match orientation {
            Orientation::Horizontal => (BOARD_SIZE - len, BOARD_SIZE - 1),
            Orientation::Vertical => (BOARD_SIZE - 1, BOARD_SIZE - len),
        };
        let x = rng.random_range(0..=max_x);
        let y = rng.random_range(0..=max_y);
        let placement = ShipPlacement::new(x, y, orientation, kind);
        if placement.positions().all(|p| !blocked.is_shot(p).unwrap_or(true)) {
            return Some(placement);
        }
    }
    None
}
