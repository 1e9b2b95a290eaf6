pub mod errors;
pub mod game;
pub mod messages;
pub mod question;
pub mod user;

// Re-export all types
pub use errors::*;
pub use game::*;
pub use messages::*;
pub use question::*;
pub use user::*;

/// Opaque account id issued by the authentication provider
pub type UserId = String;
pub type QuestionId = String;
/// Milliseconds since the Unix epoch
pub type Timestamp = i64;
