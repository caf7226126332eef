//! Repository layer.

pub mod account;
pub mod audit;
pub mod moderation;
pub mod poll;
pub mod post;
pub mod report;
pub mod vote;

pub use account::AccountRepository;
pub use audit::IdentityAuditRepository;
pub use moderation::ModerationRepository;
pub use poll::{PollRepository, PollVoteRepository};
pub use post::PostRepository;
pub use report::PostReportRepository;
pub use vote::PostVoteRepository;
