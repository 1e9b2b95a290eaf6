pub mod controller;
pub mod error;
pub mod game_events;
pub mod game_session;
pub mod leaderboard;
pub mod memory;
pub mod questions;
pub mod score_keeper;
pub mod scoring;
pub mod store;
pub mod word_bank;

// Re-export main components
pub use controller::*;
pub use error::*;
pub use game_events::*;
pub use game_session::*;
pub use leaderboard::*;
pub use memory::*;
pub use questions::*;
pub use score_keeper::*;
pub use scoring::*;
pub use store::*;
pub use word_bank::*;

use quiz_types::Timestamp;

/// Wall clock in milliseconds since the Unix epoch
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}
