#[cfg(not(feature = "net"))]
fn main() {}

#[cfg(feature = "net")]
use battleship_server::{
    init_logging, play_demo, PlacementPolicy, Server, ServerConfig, DEFAULT_BIND,
    SERVE_PLACEMENT,
};

#[cfg(feature = "net")]
use clap::Parser;
#[cfg(feature = "net")]
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "net")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
#[cfg(feature = "net")]
enum Commands {
    /// Accept clients over TCP and host their games.
    Serve {
        #[arg(long, default_value = DEFAULT_BIND)]
        bind: String,
        #[arg(long, value_enum, default_value_t = SERVE_PLACEMENT)]
        placement: PlacementPolicy,
        #[arg(long, help = "Fix RNG seed for reproducible random attacks (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
    /// Run the server in-process and let two random bots play one game.
    Demo {
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, value_enum, default_value_t = PlacementPolicy::Classic)]
        placement: PlacementPolicy,
    },
}

#[cfg(feature = "net")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            placement,
            seed,
        } => {
            let config = ServerConfig {
                bind,
                placement,
                seed,
            };
            let listener = TcpListener::bind(&config.bind).await?;
            println!("Battleship server listening on {} ({:?} placement)", config.bind, placement);
            if let Some(s) = seed {
                println!("Using fixed seed: {} (random attacks will be reproducible)", s);
            }
            Server::new(&config).run(listener).await?;
        }
        Commands::Demo { seed, placement } => {
            let config = ServerConfig {
                placement,
                seed,
                ..ServerConfig::default()
            };
            if let Some(s) = seed {
                println!("Using fixed seed: {}", s);
            }
            let server = Server::new(&config);
            let outcomes = play_demo(&server, seed).await?;
            let names = ["Alice", "Bob"];
            for (name, outcome) in names.iter().zip(outcomes.iter()) {
                println!(
                    "{:<5} {} after {} shot(s)",
                    name,
                    if outcome.won { "won" } else { "lost" },
                    outcome.shots
                );
            }
            for entry in server.coordinator().lobby().players().leaderboard() {
                println!("leaderboard: {} {}", entry.name, entry.wins);
            }
        }
    }
    Ok(())
}
