//! Vote service.
//!
//! One vote per (post, pseudonym), enforced by the ledger's unique
//! index. Casting toggles: a repeat of the same value retracts, a
//! different value switches. Tallies on the post are denormalized
//! counters adjusted alongside every ledger write.

use std::sync::atomic::Ordering;

use quad_common::{AppError, AppResult, IdGenerator, get_metrics};
use quad_db::{
    entities::post_vote::{self, VoteValue},
    repositories::{PostRepository, PostVoteRepository},
};
use sea_orm::Set;
use serde::Serialize;

/// Up-vote count at which a post counts as trending.
pub const TRENDING_THRESHOLD: i32 = 10;

/// Attempts before giving up on a contended vote toggle.
const MAX_CAST_ATTEMPTS: u32 = 3;

/// Outcome of a vote cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub up_votes: i32,
    pub down_votes: i32,
    /// The caller's vote after the cast; `None` when it was retracted.
    pub effective: Option<VoteValue>,
    pub trending: bool,
}

/// What a cast does, given the voter's existing vote.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CastAction {
    Insert,
    Retract,
    Switch { from: VoteValue },
}

fn next_action(existing: Option<&VoteValue>, requested: &VoteValue) -> CastAction {
    match existing {
        None => CastAction::Insert,
        Some(current) if current == requested => CastAction::Retract,
        Some(current) => CastAction::Switch {
            from: current.clone(),
        },
    }
}

/// Whether an up-vote tally makes a post trending.
#[must_use]
pub const fn is_trending(up_votes: i32) -> bool {
    up_votes >= TRENDING_THRESHOLD
}

/// Vote service for casting and reading votes.
#[derive(Clone)]
pub struct VoteService {
    vote_repo: PostVoteRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub fn new(vote_repo: PostVoteRepository, post_repo: PostRepository) -> Self {
        Self {
            vote_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Cast a vote on a post.
    ///
    /// Concurrent casts by the same pseudonym race on the ledger row;
    /// every write is guarded by the state it read, and a lost guard
    /// re-reads and retries. Whatever interleaving wins, the pseudonym
    /// ends with at most one vote and the tallies match the ledger.
    pub async fn cast(
        &self,
        post_id: &str,
        voter_pseudonym: &str,
        value: VoteValue,
    ) -> AppResult<VoteOutcome> {
        // The post must exist before any ledger write
        self.post_repo.get_by_id(post_id).await?;

        let mut effective = None;
        let mut settled = false;

        for _ in 0..MAX_CAST_ATTEMPTS {
            let existing = self
                .vote_repo
                .find_by_post_and_voter(post_id, voter_pseudonym)
                .await?;

            match next_action(existing.as_ref().map(|v| &v.value), &value) {
                CastAction::Insert => {
                    let model = post_vote::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        post_id: Set(post_id.to_string()),
                        voter_pseudonym: Set(voter_pseudonym.to_string()),
                        value: Set(value.clone()),
                        created_at: Set(chrono::Utc::now().into()),
                    };
                    match self.vote_repo.create(model).await {
                        Ok(_) => {
                            self.adjust_tally(post_id, &value, 1).await?;
                            effective = Some(value.clone());
                            settled = true;
                        }
                        // A concurrent cast inserted first; re-read and retry
                        Err(AppError::Conflict(_)) => continue,
                        Err(e) => return Err(e),
                    }
                }
                CastAction::Retract => {
                    let rows = self
                        .vote_repo
                        .delete_if_value(post_id, voter_pseudonym, value.clone())
                        .await?;
                    if rows == 0 {
                        continue;
                    }
                    self.adjust_tally(post_id, &value, -1).await?;
                    effective = None;
                    settled = true;
                }
                CastAction::Switch { from } => {
                    let rows = self
                        .vote_repo
                        .swap_value(post_id, voter_pseudonym, from.clone(), value.clone())
                        .await?;
                    if rows == 0 {
                        continue;
                    }
                    self.adjust_tally(post_id, &from, -1).await?;
                    self.adjust_tally(post_id, &value, 1).await?;
                    effective = Some(value.clone());
                    settled = true;
                }
            }

            if settled {
                break;
            }
        }

        if !settled {
            return Err(AppError::Conflict(
                "Vote is being changed concurrently, try again".to_string(),
            ));
        }

        let post = self.post_repo.get_by_id(post_id).await?;

        get_metrics().votes_cast.fetch_add(1, Ordering::Relaxed);

        Ok(VoteOutcome {
            up_votes: post.up_votes,
            down_votes: post.down_votes,
            effective,
            trending: is_trending(post.up_votes),
        })
    }

    /// Get a pseudonym's current vote on a post.
    pub async fn vote_of(
        &self,
        post_id: &str,
        voter_pseudonym: &str,
    ) -> AppResult<Option<post_vote::Model>> {
        self.vote_repo
            .find_by_post_and_voter(post_id, voter_pseudonym)
            .await
    }

    async fn adjust_tally(&self, post_id: &str, value: &VoteValue, delta: i32) -> AppResult<()> {
        match (value, delta >= 0) {
            (VoteValue::Up, true) => self.post_repo.increment_up_votes(post_id).await,
            (VoteValue::Up, false) => self.post_repo.decrement_up_votes(post_id).await,
            (VoteValue::Down, true) => self.post_repo.increment_down_votes(post_id).await,
            (VoteValue::Down, false) => self.post_repo.decrement_down_votes(post_id).await,
        }
    }
}
