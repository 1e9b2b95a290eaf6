pub mod question_repository;
pub mod score_repository;

pub use question_repository::QuestionRepository;
pub use score_repository::ScoreRepository;
