use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Bot configuration, read once from the environment.
/// Storage and logging settings live in `sheetcore::config`.

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Public URL Telegram should post updates to
/// Read from WEBHOOK_URL environment variable
pub static WEBHOOK_URL: Lazy<Option<String>> = Lazy::new(|| non_empty_var("WEBHOOK_URL"));

/// Address the webhook server listens on
/// Read from WEBHOOK_ADDR environment variable
/// Default: 0.0.0.0:8080
pub static WEBHOOK_ADDR: Lazy<String> =
    Lazy::new(|| env::var("WEBHOOK_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()));

/// Shared secret Telegram echoes in X-Telegram-Bot-Api-Secret-Token
/// Read from WEBHOOK_SECRET environment variable
pub static WEBHOOK_SECRET: Lazy<Option<String>> = Lazy::new(|| non_empty_var("WEBHOOK_SECRET"));

/// LTA DataMall account key for bus arrivals
/// Read from LTA_ACCOUNT_KEY environment variable
pub static LTA_ACCOUNT_KEY: Lazy<String> = Lazy::new(|| env::var("LTA_ACCOUNT_KEY").unwrap_or_default());

/// Bus arrival endpoint
/// Read from LTA_API_URL environment variable
pub static LTA_API_URL: Lazy<String> = Lazy::new(|| {
    env::var("LTA_API_URL")
        .unwrap_or_else(|_| "https://datamall2.mytransport.sg/ltaodataservice/v3/BusArrival".to_string())
});

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Sheet names and headers used by the features
pub mod sheets {
    pub const USERS: &str = "users";
    pub const USERS_HEADERS: &[&str] = &["user_id", "username", "first_name", "display_name", "joined_at"];

    pub const BUS_FAVOURITES: &str = "bus_favourites";
    pub const BUS_FAVOURITES_HEADERS: &[&str] = &["user_id", "stop_codes..."];

    pub const GAMES: &str = "games";
    pub const GAMES_HEADERS: &[&str] = &["user_id", "answer", "guesses", "status"];

    pub const FRIENDS: &str = "friends";
    pub const FRIENDS_HEADERS: &[&str] = &["pair_key", "user_id", "friend_id", "status"];
}

/// Word game configuration
pub mod game {
    pub const WORD_LENGTH: usize = 5;
    pub const MAX_GUESSES: usize = 6;
}

/// Bus feature configuration
pub mod bus {
    /// Maximum saved stops per user
    pub const MAX_FAVOURITES: usize = 10;
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Telegram and bus API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}
