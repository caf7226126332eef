//! SeaORM entities.

pub mod account;
pub mod account_ban;
pub mod identity_audit;
pub mod poll;
pub mod poll_vote;
pub mod post;
pub mod post_report;
pub mod post_vote;

pub use account::Entity as Account;
pub use account_ban::Entity as AccountBan;
pub use identity_audit::Entity as IdentityAudit;
pub use poll::Entity as Poll;
pub use poll_vote::Entity as PollVote;
pub use post::Entity as Post;
pub use post_report::Entity as PostReport;
pub use post_vote::Entity as PostVote;
