use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::Server;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Milliseconds between broadcast ticks
    #[arg(short, long, default_value_t = shared::TICK_INTERVAL_MS, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,

    /// Side length of the square grid
    #[arg(short, long, default_value_t = shared::GRID_SIZE as u16, value_parser = clap::value_parser!(u16).range(1..=100))]
    grid_size: u16,

    /// Number of players required to start the game
    #[arg(short, long, default_value_t = shared::MAX_PLAYERS as u8, value_parser = clap::value_parser!(u8).range(1..=254))]
    max_players: u8,

    /// Snapshots kept for rebasing deltas of lagging clients
    #[arg(long, default_value_t = shared::HISTORY_LEN)]
    history_len: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ServerConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        tick_interval: Duration::from_millis(args.tick_ms),
        grid_size: usize::from(args.grid_size),
        max_players: usize::from(args.max_players),
        history_len: args.history_len,
    };
    info!(
        "Starting server: {0}x{0} grid, {1} players, {2} ms ticks",
        config.grid_size,
        config.max_players,
        config.tick_interval.as_millis()
    );

    let mut server = Server::new(config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
