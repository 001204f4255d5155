mod bitboard;
mod common;
mod config;
pub mod coordinator;
mod game;
mod grid;
mod lobby;
mod logging;
mod players;
pub mod protocol;
mod rooms;
mod ship;

#[cfg(feature = "net")]
pub mod bot;
#[cfg(feature = "net")]
pub mod server;
#[cfg(feature = "net")]
pub mod transport;

pub use bitboard::{BitBoard, BitBoardError};
pub use common::*;
pub use config::*;
pub use coordinator::{Audience, Coordinator, Dispatch, Session};
pub use game::*;
pub use grid::*;
pub use lobby::*;
pub use logging::{init_logging, parse_level};
pub use players::*;
pub use protocol::*;
pub use rooms::*;
pub use ship::*;

#[cfg(feature = "net")]
pub use bot::{play_demo, BotOutcome, RandomBot};
#[cfg(feature = "net")]
pub use server::Server;
#[cfg(feature = "net")]
pub use transport::{InMemoryTransport, TcpTransport, Transport, MAX_FRAME_SIZE};
