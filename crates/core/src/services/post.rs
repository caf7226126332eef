//! Post service.

use std::sync::atomic::Ordering;

use quad_common::{AppError, AppResult, IdGenerator, alias_for, get_metrics};
use quad_db::{
    entities::post,
    repositories::{AccountRepository, PostRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::pseudonym::PseudonymService;

/// Post service for the board.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    account_repo: AccountRepository,
    pseudonym_service: PseudonymService,
    id_gen: IdGenerator,
}

/// Input for creating a post or comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostInput {
    /// Title for top-level posts; ignored on comments.
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 8192))]
    pub text: String,

    /// Post under the anonymous alias instead of the display name.
    #[serde(default = "default_anonymous")]
    pub anonymous: bool,

    /// Parent post id when creating a comment.
    pub reply_id: Option<String>,
}

const fn default_anonymous() -> bool {
    true
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        account_repo: AccountRepository,
        pseudonym_service: PseudonymService,
    ) -> Self {
        Self {
            post_repo,
            account_repo,
            pseudonym_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post or comment.
    ///
    /// The stored row carries the author's pseudonym and a display name
    /// frozen at creation time. Later profile edits, bans, or alias pool
    /// changes never rewrite what a published post shows.
    pub async fn create(
        &self,
        author_account_id: &str,
        input: CreatePostInput,
    ) -> AppResult<post::Model> {
        input.validate()?;

        let account = self.account_repo.get_by_id(author_account_id).await?;
        if account.is_banned {
            return Err(AppError::Forbidden(
                "Banned accounts cannot post".to_string(),
            ));
        }

        let pseudonym = self.pseudonym_service.ensure_pseudonym(&account).await?;

        let display_alias = if input.anonymous {
            alias_for(&pseudonym).to_string()
        } else {
            account
                .display_name
                .clone()
                .unwrap_or_else(|| account.username.clone())
        };

        let parent = match input.reply_id.as_deref() {
            Some(parent_id) => Some(self.post_repo.get_by_id(parent_id).await?),
            None => None,
        };

        // Comments never carry a title
        let title = if parent.is_some() { None } else { input.title };

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_pseudonym: Set(pseudonym),
            display_alias: Set(display_alias),
            is_anonymous: Set(input.anonymous),
            title: Set(title),
            text: Set(input.text),
            reply_id: Set(input.reply_id),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        let created = self.post_repo.create(model).await?;

        if let Some(parent) = parent {
            if let Err(e) = self.post_repo.increment_replies_count(&parent.id).await {
                tracing::warn!(error = %e, post_id = %parent.id, "Failed to bump replies count");
            }
        }

        get_metrics().posts_created.fetch_add(1, Ordering::Relaxed);

        Ok(created)
    }

    /// Get a post by id.
    ///
    /// Hidden posts do not exist for ordinary readers; only staff see
    /// them, marked as hidden.
    pub async fn get(&self, post_id: &str, include_hidden: bool) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.hidden && !include_hidden {
            return Err(AppError::PostNotFound(post_id.to_string()));
        }
        Ok(post)
    }

    /// List the board: top-level posts, newest first.
    pub async fn board(
        &self,
        limit: u64,
        until_id: Option<&str>,
        include_hidden: bool,
    ) -> AppResult<Vec<post::Model>> {
        self.post_repo
            .find_board(limit, until_id, include_hidden)
            .await
    }

    /// List comments under a post, oldest first.
    pub async fn replies(&self, post_id: &str, include_hidden: bool) -> AppResult<Vec<post::Model>> {
        // The parent must be visible to the caller
        self.get(post_id, include_hidden).await?;
        self.post_repo.find_replies(post_id, include_hidden).await
    }
}
