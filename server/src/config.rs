use shared::{DEFAULT_PORT, GRID_SIZE, HISTORY_LEN, MAX_PLAYERS, TICK_INTERVAL_MS};
use std::time::Duration;

/// Runtime settings for a game server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the UDP socket binds to
    pub bind_addr: String,
    /// Interval between broadcast ticks
    pub tick_interval: Duration,
    /// Side length of the square grid
    pub grid_size: usize,
    /// Players required before the game starts
    pub max_players: usize,
    /// Snapshots retained for rebasing deltas of lagging clients
    pub history_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            tick_interval: Duration::from_millis(TICK_INTERVAL_MS),
            grid_size: GRID_SIZE,
            max_players: MAX_PLAYERS,
            history_len: HISTORY_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:12000");
        assert_eq!(config.tick_interval, Duration::from_millis(50));
        assert_eq!(config.grid_size, 20);
        assert_eq!(config.max_players, 4);
        assert_eq!(config.history_len, 50);
    }
}
