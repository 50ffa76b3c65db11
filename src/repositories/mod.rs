//! # Repositories
//!
//! This module contains repository structs encapsulating SeaORM operations
//! for each table.

pub mod attempt;
pub mod feedback;
pub mod question;
pub mod solution_step;
pub mod sync_log;

pub use attempt::AttemptRepository;
pub use feedback::FeedbackRepository;
pub use question::QuestionRepository;
pub use solution_step::SolutionStepRepository;
pub use sync_log::SyncLogRepository;
