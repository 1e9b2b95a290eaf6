pub mod prelude;

pub mod game_records;
pub mod leaderboard;
pub mod questions;
pub mod users;
