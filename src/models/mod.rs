// Models module - Database entity representations

pub mod movie;
pub mod petition;
pub mod review;
pub mod review_report;
pub mod vote;

pub use movie::Movie;
pub use petition::Petition;
pub use review::Review;
pub use review_report::ReviewReport;
pub use vote::{Vote, VoteType};
