//! Ban propagation.
//!
//! A ban hides everything a pseudonym has written; a lift restores it,
//! except content a moderator hid explicitly. The sweep applies both to
//! expired temporary bans in bulk and re-hides anything a still-banned
//! account slipped through, so a half-finished propagation heals on the
//! next run.

use chrono::{DateTime, FixedOffset};
use quad_common::{AppError, AppResult};
use quad_db::{
    entities::{account, account_ban},
    repositories::{AccountRepository, ModerationRepository, PostRepository},
};
use sea_orm::Set;

/// Attempts per bulk update before a propagation failure surfaces.
const MAX_PROPAGATION_ATTEMPTS: u32 = 3;

/// Accounts handled per sweep run.
const SWEEP_BATCH_SIZE: u64 = 100;

/// Actor recorded on ban records lifted by the expiry sweep.
const SWEEP_ACTOR: &str = "system";

/// Outcome of one expiry sweep run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Expired temporary bans lifted.
    pub bans_lifted: u64,
    /// Posts hidden again because their author is still banned.
    pub posts_rehidden: u64,
}

/// Propagates ban state onto the content ledger.
#[derive(Clone)]
pub struct BanPropagator {
    post_repo: PostRepository,
    account_repo: AccountRepository,
    moderation_repo: ModerationRepository,
}

impl BanPropagator {
    /// Create a new ban propagator.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        account_repo: AccountRepository,
        moderation_repo: ModerationRepository,
    ) -> Self {
        Self {
            post_repo,
            account_repo,
            moderation_repo,
        }
    }

    /// Hide everything the pseudonym has written.
    ///
    /// Returns the number of posts hidden. The caller treats an error as
    /// a failed ban, so transient failures are retried here first.
    pub async fn apply(&self, pseudonym: &str) -> AppResult<u64> {
        let mut last_err = None;
        for attempt in 1..=MAX_PROPAGATION_ATTEMPTS {
            match self.post_repo.hide_all_by_pseudonym(pseudonym).await {
                Ok(rows) => {
                    tracing::info!(rows, "Hid content for banned account");
                    return Ok(rows);
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "Ban propagation attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| AppError::Internal("Ban propagation failed".to_string())))
    }

    /// Restore everything hidden by a ban on this pseudonym.
    ///
    /// Posts a moderator hid explicitly stay hidden.
    pub async fn lift(&self, pseudonym: &str) -> AppResult<u64> {
        let mut last_err = None;
        for attempt in 1..=MAX_PROPAGATION_ATTEMPTS {
            match self.post_repo.unhide_all_by_pseudonym(pseudonym).await {
                Ok(rows) => {
                    tracing::info!(rows, "Restored content for unbanned account");
                    return Ok(rows);
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "Lift propagation attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| AppError::Internal("Lift propagation failed".to_string())))
    }

    /// Run one expiry sweep.
    ///
    /// Lifts temporary bans that have expired by `now`, then re-hides
    /// content belonging to accounts that are still banned. Per-account
    /// failures are logged and retried on the next run; the ban state
    /// flag is cleared last, so an interrupted lift stays visible to the
    /// next sweep.
    pub async fn sweep(&self, now: DateTime<FixedOffset>) -> AppResult<SweepOutcome> {
        let mut outcome = SweepOutcome::default();

        let expired = self
            .account_repo
            .find_expired_temp_bans(now, SWEEP_BATCH_SIZE)
            .await?;
        for account in expired {
            if let Err(e) = self.lift_expired(&account, now).await {
                tracing::warn!(
                    error = %e,
                    account_id = %account.id,
                    "Failed to lift expired ban, will retry next sweep"
                );
                continue;
            }
            outcome.bans_lifted += 1;
        }

        let banned = self.account_repo.find_banned(SWEEP_BATCH_SIZE).await?;
        for account in banned {
            let Some(ref pseudonym) = account.pseudonym else {
                continue;
            };
            match self.post_repo.hide_all_by_pseudonym(pseudonym).await {
                Ok(rows) => {
                    if rows > 0 {
                        tracing::warn!(
                            account_id = %account.id,
                            rows,
                            "Re-hid content posted while banned"
                        );
                    }
                    outcome.posts_rehidden += rows;
                }
                Err(e) => {
                    tracing::warn!(error = %e, account_id = %account.id, "Re-hide pass failed");
                }
            }
        }

        Ok(outcome)
    }

    async fn lift_expired(
        &self,
        account: &account::Model,
        now: DateTime<FixedOffset>,
    ) -> AppResult<()> {
        if let Some(ref pseudonym) = account.pseudonym {
            self.lift(pseudonym).await?;
        }

        if let Some(ban) = self.moderation_repo.find_active_ban(&account.id).await? {
            let mut active: account_ban::ActiveModel = ban.into();
            active.lifted_at = Set(Some(now));
            active.lifted_by = Set(Some(SWEEP_ACTOR.to_string()));
            self.moderation_repo.update_ban(active).await?;
        }

        self.account_repo.set_ban_state(&account.id, false, None).await?;

        tracing::info!(account_id = %account.id, "Lifted expired ban");
        Ok(())
    }
}
