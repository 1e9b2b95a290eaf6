pub use super::game_records::Entity as GameRecords;
pub use super::leaderboard::Entity as Leaderboard;
pub use super::questions::Entity as Questions;
pub use super::users::Entity as Users;
