use crate::ship::{PlacementPolicy, ShipKind};

pub const BOARD_SIZE: u8 = 10;

/// Ship kinds of the classic fleet with how many of each are required.
pub const CLASSIC_FLEET: [(ShipKind, usize); 4] = [
    (ShipKind::Huge, 1),
    (ShipKind::Large, 2),
    (ShipKind::Medium, 3),
    (ShipKind::Small, 4),
];

/// Total number of ships in the classic fleet.
pub const CLASSIC_FLEET_SIZE: usize = 1 + 2 + 3 + 4;

/// Environment variable read by [`crate::init_logging`].
pub const LOG_ENV: &str = "BATTLESHIP_LOG";

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Placement policy of the `serve` command. Under `Permissive`, sinking one
/// of two touching or overlapping ships marks cells of the other as misses,
/// and that game can never finish.
pub const SERVE_PLACEMENT: PlacementPolicy = PlacementPolicy::Strict;

/// Runtime settings for a server instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub placement: PlacementPolicy,
    /// Fixed seed for the random-attack RNG; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            placement: PlacementPolicy::Permissive,
            seed: None,
        }
    }
}
