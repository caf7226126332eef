//! Identity resolution service.
//!
//! The only path from a pseudonym back to an account. Every resolution
//! is verified against the derivation before anything is revealed, and
//! every reveal leaves an audit record.

use std::sync::atomic::Ordering;

use quad_common::{AppError, AppResult, IdGenerator, get_metrics};
use quad_db::{
    entities::identity_audit,
    repositories::{AccountRepository, IdentityAuditRepository, PostRepository},
};
use sea_orm::Set;
use serde::Serialize;

use super::pseudonym::PseudonymService;

/// A resolved post author, revealed to staff.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIdentity {
    pub account_id: String,
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
    pub pseudonym: String,
    /// Always true on a successful resolution; a failed verification is
    /// an error, never a response.
    pub hash_verified: bool,
}

/// Identity service for resolving pseudonyms to accounts.
#[derive(Clone)]
pub struct IdentityService {
    account_repo: AccountRepository,
    post_repo: PostRepository,
    audit_repo: IdentityAuditRepository,
    pseudonym_service: PseudonymService,
    id_gen: IdGenerator,
}

impl IdentityService {
    /// Create a new identity service.
    #[must_use]
    pub const fn new(
        account_repo: AccountRepository,
        post_repo: PostRepository,
        audit_repo: IdentityAuditRepository,
        pseudonym_service: PseudonymService,
    ) -> Self {
        Self {
            account_repo,
            post_repo,
            audit_repo,
            pseudonym_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Resolve the author of a post to their real account.
    ///
    /// The stored link is never trusted on its own: the pseudonym must
    /// also re-derive from the resolved account's identity. A link that
    /// fails re-derivation means tampered or corrupted data and is
    /// surfaced as an integrity error.
    pub async fn resolve_post_author(
        &self,
        actor_id: &str,
        post_id: &str,
    ) -> AppResult<ResolvedIdentity> {
        let actor = self.account_repo.get_by_id(actor_id).await?;
        if !actor.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only moderators can resolve identities".to_string(),
            ));
        }

        let post = self.post_repo.get_by_id(post_id).await?;

        let account = self
            .account_repo
            .find_by_pseudonym(&post.author_pseudonym)
            .await?
            .ok_or_else(|| {
                get_metrics().integrity_failures.fetch_add(1, Ordering::Relaxed);
                AppError::Integrity(format!("No account owns the pseudonym on post {post_id}"))
            })?;

        if !self
            .pseudonym_service
            .verify_derivation(&account, &post.author_pseudonym)?
        {
            get_metrics().integrity_failures.fetch_add(1, Ordering::Relaxed);
            return Err(AppError::Integrity(format!(
                "Pseudonym on post {} does not re-derive from account {}",
                post_id, account.id
            )));
        }

        self.write_audit(actor_id, post_id, &post.author_pseudonym, &account.id)
            .await;

        get_metrics().identities_resolved.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            actor_id = %actor_id,
            post_id = %post_id,
            resolved_account_id = %account.id,
            "Identity resolved"
        );

        Ok(ResolvedIdentity {
            account_id: account.id,
            email: account.email,
            username: account.username,
            display_name: account.display_name,
            pseudonym: post.author_pseudonym,
            hash_verified: true,
        })
    }

    /// Browse the audit trail of past resolutions.
    pub async fn audit_trail(
        &self,
        actor_id: &str,
        filter_actor: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<identity_audit::Model>> {
        let actor = self.account_repo.get_by_id(actor_id).await?;
        if !actor.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only moderators can view the audit trail".to_string(),
            ));
        }

        match filter_actor {
            Some(id) => self.audit_repo.find_by_actor(id, limit).await,
            None => self.audit_repo.find_recent(limit, offset).await,
        }
    }

    /// Append the audit record for a resolution.
    ///
    /// A reveal that already happened cannot be taken back, so a failed
    /// audit write is logged loudly rather than unwinding the response.
    async fn write_audit(
        &self,
        actor_id: &str,
        post_id: &str,
        pseudonym: &str,
        resolved_account_id: &str,
    ) {
        let model = identity_audit::ActiveModel {
            id: Set(self.id_gen.generate()),
            actor_id: Set(actor_id.to_string()),
            post_id: Set(post_id.to_string()),
            pseudonym: Set(pseudonym.to_string()),
            resolved_account_id: Set(resolved_account_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        if let Err(e) = self.audit_repo.create(model).await {
            tracing::error!(
                error = %e,
                actor_id = %actor_id,
                post_id = %post_id,
                "Failed to write identity audit record"
            );
        }
    }
}
