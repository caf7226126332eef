//! Poll service.

use chrono::{Duration, Utc};
use quad_common::{AppError, AppResult, IdGenerator};
use quad_db::{
    entities::{poll, poll_vote},
    repositories::{AccountRepository, PollRepository, PollVoteRepository, PostRepository},
};
use sea_orm::Set;
use serde_json::json;

/// Fewest choices a poll can offer.
const MIN_POLL_CHOICES: usize = 2;
/// Most choices a poll can offer.
const MAX_POLL_CHOICES: usize = 10;
/// Longest allowed choice text in bytes.
const MAX_CHOICE_LENGTH: usize = 100;
/// Longest allowed poll lifetime, 30 days.
const MAX_POLL_DURATION_SECS: i64 = 2_592_000;

/// Input for creating a poll.
pub struct CreatePollInput {
    pub choices: Vec<String>,
    /// Duration in seconds, None for a poll that never expires.
    pub expires_in: Option<i64>,
}

/// Poll with the viewer's ballot.
pub struct PollStatus {
    pub poll: poll::Model,
    pub my_choice: Option<i32>,
    pub is_expired: bool,
}

/// Poll service for business logic.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
    vote_repo: PollVoteRepository,
    post_repo: PostRepository,
    account_repo: AccountRepository,
    id_gen: IdGenerator,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(
        poll_repo: PollRepository,
        vote_repo: PollVoteRepository,
        post_repo: PostRepository,
        account_repo: AccountRepository,
    ) -> Self {
        Self {
            poll_repo,
            vote_repo,
            post_repo,
            account_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Attach a poll to a post.
    pub async fn create(
        &self,
        actor_account_id: &str,
        post_id: &str,
        input: CreatePollInput,
    ) -> AppResult<poll::Model> {
        // Validate choices
        if input.choices.len() < MIN_POLL_CHOICES {
            return Err(AppError::BadRequest(
                "Poll must have at least 2 choices".to_string(),
            ));
        }
        if input.choices.len() > MAX_POLL_CHOICES {
            return Err(AppError::BadRequest(
                "Poll cannot have more than 10 choices".to_string(),
            ));
        }
        for choice in &input.choices {
            if choice.trim().is_empty() {
                return Err(AppError::BadRequest(
                    "Poll choices cannot be empty".to_string(),
                ));
            }
            if choice.len() > MAX_CHOICE_LENGTH {
                return Err(AppError::BadRequest(
                    "Poll choice is too long (max 100 chars)".to_string(),
                ));
            }
        }

        if let Some(seconds) = input.expires_in
            && seconds <= 0
        {
            return Err(AppError::BadRequest(
                "Poll duration must be positive".to_string(),
            ));
        }

        let actor = self.account_repo.get_by_id(actor_account_id).await?;
        if actor.is_banned {
            return Err(AppError::Forbidden(
                "Banned accounts cannot create polls".to_string(),
            ));
        }

        let post = self.post_repo.get_by_id(post_id).await?;
        if post.reply_id.is_some() {
            return Err(AppError::BadRequest(
                "Polls can only be attached to top-level posts".to_string(),
            ));
        }

        // Authorship is checked against the cached pseudonym; an account
        // that never wrote anything cannot be the author
        if actor.pseudonym.as_deref() != Some(post.author_pseudonym.as_str()) {
            return Err(AppError::Forbidden(
                "Only the author can attach a poll".to_string(),
            ));
        }

        if self.poll_repo.find_by_post_id(post_id).await?.is_some() {
            return Err(AppError::BadRequest(
                "Post already has a poll".to_string(),
            ));
        }

        let expires_at = input.expires_in.map(|seconds| {
            let duration = Duration::seconds(seconds.min(MAX_POLL_DURATION_SECS));
            (Utc::now() + duration).into()
        });

        // Initialize votes array with zeros
        let votes = json!(vec![0i32; input.choices.len()]);

        let model = poll::ActiveModel {
            post_id: Set(post_id.to_string()),
            choices: Set(json!(input.choices)),
            votes: Set(votes),
            voters_count: Set(0),
            expires_at: Set(expires_at),
        };

        match self.poll_repo.create(model).await {
            Ok(created) => Ok(created),
            // Lost a race against another create attempt for the same post
            Err(AppError::Conflict(_)) => Err(AppError::BadRequest(
                "Post already has a poll".to_string(),
            )),
            Err(e) => Err(e),
        }
    }

    /// Get a poll by post ID.
    pub async fn get(&self, post_id: &str) -> AppResult<poll::Model> {
        self.poll_repo.get_by_post_id(post_id).await
    }

    /// Get a poll with the viewer's ballot filled in.
    pub async fn status(
        &self,
        post_id: &str,
        viewer_pseudonym: Option<&str>,
    ) -> AppResult<PollStatus> {
        let poll = self.poll_repo.get_by_post_id(post_id).await?;

        let my_choice = match viewer_pseudonym {
            Some(pseudonym) => self.ballot_of(post_id, pseudonym).await?,
            None => None,
        };

        let is_expired = poll
            .expires_at
            .as_ref()
            .is_some_and(|exp| *exp < Utc::now());

        Ok(PollStatus {
            poll,
            my_choice,
            is_expired,
        })
    }

    /// Cast a ballot.
    ///
    /// The tally is recomputed from the stored ballots rather than
    /// incremented in place, so concurrent ballots converge on the same
    /// counts no matter which update lands last.
    pub async fn vote(
        &self,
        post_id: &str,
        voter_pseudonym: &str,
        choice: i32,
    ) -> AppResult<poll::Model> {
        let poll = self.poll_repo.get_by_post_id(post_id).await?;

        if let Some(ref expires_at) = poll.expires_at
            && *expires_at < Utc::now()
        {
            return Err(AppError::BadRequest("Poll has expired".to_string()));
        }

        let choices: Vec<String> = serde_json::from_value(poll.choices.clone())
            .map_err(|e| AppError::Internal(format!("Invalid poll choices: {e}")))?;

        if choice < 0 || choice >= choices.len() as i32 {
            return Err(AppError::BadRequest("Invalid poll choice".to_string()));
        }

        if self
            .vote_repo
            .find_by_post_and_voter(post_id, voter_pseudonym)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest(
                "Already voted in this poll".to_string(),
            ));
        }

        let model = poll_vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post_id.to_string()),
            voter_pseudonym: Set(voter_pseudonym.to_string()),
            choice: Set(choice),
            created_at: Set(Utc::now().into()),
        };

        match self.vote_repo.create(model).await {
            Ok(_) => {}
            // The unique index caught a concurrent duplicate
            Err(AppError::Conflict(_)) => {
                return Err(AppError::BadRequest(
                    "Already voted in this poll".to_string(),
                ));
            }
            Err(e) => return Err(e),
        }

        let ballots = self.vote_repo.find_by_post(post_id).await?;
        let votes = tally_ballots(choices.len(), &ballots);
        let voters_count = ballots.len() as i32;

        let mut active: poll::ActiveModel = poll.into();
        active.votes = Set(json!(votes));
        active.voters_count = Set(voters_count);

        self.poll_repo.update(active).await
    }

    /// Get the viewer's ballot, if any.
    pub async fn ballot_of(
        &self,
        post_id: &str,
        voter_pseudonym: &str,
    ) -> AppResult<Option<i32>> {
        Ok(self
            .vote_repo
            .find_by_post_and_voter(post_id, voter_pseudonym)
            .await?
            .map(|ballot| ballot.choice))
    }
}

/// Count ballots per choice. Ballots pointing outside the choice list
/// are skipped rather than corrupting the tally.
fn tally_ballots(choice_count: usize, ballots: &[poll_vote::Model]) -> Vec<i32> {
    let mut votes = vec![0i32; choice_count];
    for ballot in ballots {
        if let Some(slot) = usize::try_from(ballot.choice)
            .ok()
            .and_then(|index| votes.get_mut(index))
        {
            *slot += 1;
        }
    }
    votes
}
