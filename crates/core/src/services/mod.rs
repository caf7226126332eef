//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod ban;
pub mod identity;
pub mod jobs;
pub mod moderation;
pub mod poll;
pub mod post;
pub mod pseudonym;
pub mod report;
pub mod vote;

pub use account::{AccountService, CreateAccountInput, UpdateAccountInput};
pub use ban::{BanPropagator, SweepOutcome};
pub use identity::{IdentityService, ResolvedIdentity};
pub use jobs::{Job, JobSender, JobService, JobWorkerContext};
pub use moderation::{CreateBanInput, ModerationService};
pub use poll::{CreatePollInput, PollService, PollStatus};
pub use post::{CreatePostInput, PostService};
pub use pseudonym::PseudonymService;
pub use report::{ReportOutcome, ReportService};
pub use vote::{VoteOutcome, VoteService};
