//! Runtime configuration and environment loading.
use std::env;
use std::time::Duration;

/// Settings shared by the lobby and every room it spawns.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// How long a room waits for decisions before resolving the round anyway.
    pub decision_timeout: Duration,
    /// Two players are paired only if their games-played counts differ by
    /// strictly less than this.
    pub match_window: u32,
    pub event_buffer_size: usize,
    pub room_buffer_size: usize,
    pub outbound_buffer_size: usize,
    /// How long a room waits on a full outbound queue before it treats the
    /// player as disconnected.
    pub send_timeout: Duration,
    /// Fixed RNG seed for every battle. Each room derives its own seed when unset.
    pub battle_seed: Option<u64>,
    pub field_rows: u8,
    pub field_columns: u8,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            decision_timeout: Duration::from_secs(30),
            match_window: 20,
            event_buffer_size: 100,
            room_buffer_size: 32,
            outbound_buffer_size: 64,
            send_timeout: Duration::from_secs(5),
            battle_seed: None,
            field_rows: 2,
            field_columns: 3,
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `DUEL_DECISION_TIMEOUT_MS` - Decision window in milliseconds (default: 30000)
    /// - `DUEL_MATCH_WINDOW` - Games-played difference bound (default: 20)
    /// - `DUEL_EVENT_BUFFER` - Event bus capacity per topic (default: 100)
    /// - `DUEL_SEND_TIMEOUT_MS` - Wait on a full player queue in milliseconds (default: 5000)
    /// - `DUEL_BATTLE_SEED` - Fixed battle seed (default: per room)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(millis) = read_env::<u64>("DUEL_DECISION_TIMEOUT_MS") {
            config.decision_timeout = Duration::from_millis(millis.max(1));
        }
        if let Some(window) = read_env::<u32>("DUEL_MATCH_WINDOW") {
            config.match_window = window;
        }
        if let Some(capacity) = read_env::<usize>("DUEL_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        if let Some(millis) = read_env::<u64>("DUEL_SEND_TIMEOUT_MS") {
            config.send_timeout = Duration::from_millis(millis.max(1));
        }
        config.battle_seed = read_env::<u64>("DUEL_BATTLE_SEED");

        config
    }

    pub fn with_decision_timeout(mut self, timeout: Duration) -> Self {
        self.decision_timeout = timeout;
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn with_outbound_buffer(mut self, capacity: usize) -> Self {
        self.outbound_buffer_size = capacity.max(1);
        self
    }

    pub fn with_match_window(mut self, window: u32) -> Self {
        self.match_window = window;
        self
    }

    pub fn with_battle_seed(mut self, seed: u64) -> Self {
        self.battle_seed = Some(seed);
        self
    }

    pub fn with_field(mut self, rows: u8, columns: u8) -> Self {
        self.field_rows = rows;
        self.field_columns = columns;
        self
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
