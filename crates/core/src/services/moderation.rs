//! Moderation service for post review and account bans.

use std::sync::atomic::Ordering;

use quad_common::{AppError, AppResult, IdGenerator, get_metrics};
use quad_db::{
    entities::{account::AccountRole, account_ban, post, post_report},
    repositories::{
        AccountRepository, ModerationRepository, PostReportRepository, PostRepository,
    },
};
use sea_orm::Set;

use super::ban::BanPropagator;

/// Input for banning an account.
pub struct CreateBanInput {
    pub account_id: String,
    pub reason: String,
    /// Duration in seconds, None for permanent.
    pub duration: Option<i64>,
}

/// Moderation service for handling flagged posts and bans.
#[derive(Clone)]
pub struct ModerationService {
    moderation_repo: ModerationRepository,
    account_repo: AccountRepository,
    post_repo: PostRepository,
    report_repo: PostReportRepository,
    ban_propagator: BanPropagator,
    id_gen: IdGenerator,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(
        moderation_repo: ModerationRepository,
        account_repo: AccountRepository,
        post_repo: PostRepository,
        report_repo: PostReportRepository,
        ban_propagator: BanPropagator,
    ) -> Self {
        Self {
            moderation_repo,
            account_repo,
            post_repo,
            report_repo,
            ban_propagator,
            id_gen: IdGenerator::new(),
        }
    }

    // ========== Post Moderation ==========

    /// Hide a post from ordinary readers.
    pub async fn hide_post(&self, moderator_id: &str, post_id: &str) -> AppResult<()> {
        let moderator = self.account_repo.get_by_id(moderator_id).await?;
        if !moderator.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only moderators can hide posts".to_string(),
            ));
        }

        self.post_repo.get_by_id(post_id).await?;
        self.post_repo.hide_by_moderator(post_id).await
    }

    /// Make a moderator-hidden post visible again.
    ///
    /// A ban outlives the unhide: when the author is currently banned
    /// the post stays hidden and only the moderator marker is cleared.
    pub async fn unhide_post(&self, moderator_id: &str, post_id: &str) -> AppResult<()> {
        let moderator = self.account_repo.get_by_id(moderator_id).await?;
        if !moderator.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only moderators can unhide posts".to_string(),
            ));
        }

        let post = self.post_repo.get_by_id(post_id).await?;

        let author_banned = match self
            .account_repo
            .find_by_pseudonym(&post.author_pseudonym)
            .await?
        {
            Some(author) => author.is_banned,
            None => false,
        };

        self.post_repo.unhide_by_moderator(post_id, author_banned).await
    }

    /// Clear the flagged marker on a post.
    ///
    /// Reports and tallies are untouched; the post will not re-flag until
    /// a further report crosses the threshold again.
    pub async fn unflag_post(&self, moderator_id: &str, post_id: &str) -> AppResult<()> {
        let moderator = self.account_repo.get_by_id(moderator_id).await?;
        if !moderator.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only moderators can unflag posts".to_string(),
            ));
        }

        self.post_repo.get_by_id(post_id).await?;
        self.post_repo.unflag(post_id).await
    }

    /// Get the review queue of flagged posts.
    pub async fn flagged_posts(
        &self,
        moderator_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        let moderator = self.account_repo.get_by_id(moderator_id).await?;
        if !moderator.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only moderators can view the review queue".to_string(),
            ));
        }

        self.post_repo.find_flagged(limit, offset).await
    }

    /// List the reports filed against a post.
    pub async fn reports_for_post(
        &self,
        moderator_id: &str,
        post_id: &str,
        limit: u64,
    ) -> AppResult<Vec<post_report::Model>> {
        let moderator = self.account_repo.get_by_id(moderator_id).await?;
        if !moderator.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only moderators can view reports".to_string(),
            ));
        }

        self.post_repo.get_by_id(post_id).await?;
        self.report_repo.find_by_post(post_id, limit).await
    }

    // ========== Account Bans ==========

    /// Ban an account.
    ///
    /// The account's content disappears in the same call; a ban whose
    /// propagation failed is a failed ban and surfaces as an error.
    pub async fn ban_account(
        &self,
        moderator_id: &str,
        input: CreateBanInput,
    ) -> AppResult<account_ban::Model> {
        let moderator = self.account_repo.get_by_id(moderator_id).await?;
        if !moderator.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only moderators can ban accounts".to_string(),
            ));
        }

        // Can't ban yourself
        if moderator_id == input.account_id {
            return Err(AppError::BadRequest("Cannot ban yourself".to_string()));
        }

        // Check target account exists
        let target = self.account_repo.get_by_id(&input.account_id).await?;

        // Can't ban administrators
        if target.role == AccountRole::Administrator {
            return Err(AppError::Forbidden(
                "Cannot ban an administrator".to_string(),
            ));
        }

        // Check if already banned
        if target.is_banned {
            return Err(AppError::BadRequest(
                "Account is already banned".to_string(),
            ));
        }

        // Validate reason
        let reason = input.reason.trim();
        if reason.is_empty() {
            return Err(AppError::BadRequest("Ban reason is required".to_string()));
        }
        if reason.len() > 2000 {
            return Err(AppError::BadRequest("Ban reason too long".to_string()));
        }

        if let Some(duration) = input.duration {
            if duration <= 0 {
                return Err(AppError::BadRequest(
                    "Ban duration must be positive".to_string(),
                ));
            }
        }

        let expires_at = input
            .duration
            .map(|d| chrono::Utc::now() + chrono::Duration::seconds(d));

        let id = self.id_gen.generate();
        let model = account_ban::ActiveModel {
            id: Set(id),
            account_id: Set(input.account_id.clone()),
            moderator_id: Set(moderator_id.to_string()),
            reason: Set(reason.to_string()),
            created_at: Set(chrono::Utc::now().into()),
            expires_at: Set(expires_at.map(std::convert::Into::into)),
            lifted_at: Set(None),
            lifted_by: Set(None),
        };

        let ban = self.moderation_repo.create_ban(model).await?;

        self.account_repo
            .set_ban_state(&input.account_id, true, expires_at.map(std::convert::Into::into))
            .await?;

        if let Some(ref pseudonym) = target.pseudonym {
            self.ban_propagator.apply(pseudonym).await?;
        }

        get_metrics().bans_applied.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            account_id = %ban.account_id,
            moderator_id = %moderator_id,
            permanent = ban.expires_at.is_none(),
            "Account banned"
        );

        Ok(ban)
    }

    /// Lift an account's ban.
    pub async fn unban_account(
        &self,
        moderator_id: &str,
        account_id: &str,
    ) -> AppResult<()> {
        let moderator = self.account_repo.get_by_id(moderator_id).await?;
        if !moderator.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only moderators can unban accounts".to_string(),
            ));
        }

        let target = self.account_repo.get_by_id(account_id).await?;
        if !target.is_banned {
            return Err(AppError::BadRequest("Account is not banned".to_string()));
        }

        if let Some(ban) = self.moderation_repo.find_active_ban(account_id).await? {
            let mut model: account_ban::ActiveModel = ban.into();
            model.lifted_at = Set(Some(chrono::Utc::now().into()));
            model.lifted_by = Set(Some(moderator_id.to_string()));
            self.moderation_repo.update_ban(model).await?;
        }

        self.account_repo.set_ban_state(account_id, false, None).await?;

        if let Some(ref pseudonym) = target.pseudonym {
            self.ban_propagator.lift(pseudonym).await?;
        }

        get_metrics().bans_lifted.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            account_id = %account_id,
            moderator_id = %moderator_id,
            "Account ban lifted"
        );

        Ok(())
    }

    /// Get ban history for an account.
    pub async fn ban_history(
        &self,
        moderator_id: &str,
        account_id: &str,
    ) -> AppResult<Vec<account_ban::Model>> {
        let moderator = self.account_repo.get_by_id(moderator_id).await?;
        if !moderator.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only moderators can view ban history".to_string(),
            ));
        }

        self.account_repo.get_by_id(account_id).await?;
        self.moderation_repo.find_bans_for_account(account_id).await
    }

    /// Get all active bans.
    pub async fn active_bans(
        &self,
        moderator_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<account_ban::Model>> {
        let moderator = self.account_repo.get_by_id(moderator_id).await?;
        if !moderator.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only moderators can view active bans".to_string(),
            ));
        }

        self.moderation_repo.find_active_bans(limit, offset).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quad_db::entities::account;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_account(id: &str, role: AccountRole, banned: bool) -> account::Model {
        account::Model {
            id: id.to_string(),
            email: format!("{id}@college.edu"),
            email_lower: format!("{id}@college.edu"),
            username: id.to_string(),
            display_name: None,
            password_hash: "$argon2id$test".to_string(),
            token: "test_token".to_string(),
            pseudonym: Some(format!("{id}pseudonym")),
            role,
            reported_count: 0,
            is_banned: banned,
            ban_expires_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_ban(id: &str, account_id: &str) -> account_ban::Model {
        account_ban::Model {
            id: id.to_string(),
            account_id: account_id.to_string(),
            moderator_id: "mod1".to_string(),
            reason: "Repeated harassment".to_string(),
            created_at: Utc::now().into(),
            expires_at: None,
            lifted_at: None,
            lifted_by: None,
        }
    }

    fn create_test_service(
        moderation_db: Arc<sea_orm::DatabaseConnection>,
        account_db: Arc<sea_orm::DatabaseConnection>,
        post_db: Arc<sea_orm::DatabaseConnection>,
        report_db: Arc<sea_orm::DatabaseConnection>,
    ) -> ModerationService {
        let account_repo = AccountRepository::new(account_db);
        let post_repo = PostRepository::new(post_db.clone());
        let propagator = BanPropagator::new(
            PostRepository::new(post_db),
            account_repo.clone(),
            ModerationRepository::new(moderation_db.clone()),
        );
        ModerationService::new(
            ModerationRepository::new(moderation_db),
            account_repo,
            post_repo,
            PostReportRepository::new(report_db),
            propagator,
        )
    }

    fn empty_db() -> Arc<sea_orm::DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn ban_input(account_id: &str, duration: Option<i64>) -> CreateBanInput {
        CreateBanInput {
            account_id: account_id.to_string(),
            reason: "Repeated harassment".to_string(),
            duration,
        }
    }

    #[tokio::test]
    async fn test_ban_requires_staff() {
        let member = create_test_account("member1", AccountRole::Member, false);
        let account_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[member]])
                .into_connection(),
        );

        let service = create_test_service(empty_db(), account_db, empty_db(), empty_db());

        let result = service.ban_account("member1", ban_input("target1", None)).await;
        match result {
            Err(AppError::Forbidden(msg)) => assert_eq!(msg, "Only moderators can ban accounts"),
            _ => panic!("Expected Forbidden error"),
        }
    }

    #[tokio::test]
    async fn test_ban_rejects_self() {
        let moderator = create_test_account("mod1", AccountRole::Moderator, false);
        let account_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[moderator]])
                .into_connection(),
        );

        let service = create_test_service(empty_db(), account_db, empty_db(), empty_db());

        let result = service.ban_account("mod1", ban_input("mod1", None)).await;
        match result {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Cannot ban yourself"),
            _ => panic!("Expected BadRequest error"),
        }
    }

    #[tokio::test]
    async fn test_ban_rejects_administrator_target() {
        let moderator = create_test_account("mod1", AccountRole::Moderator, false);
        let admin = create_test_account("admin1", AccountRole::Administrator, false);
        let account_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[moderator], [admin]])
                .into_connection(),
        );

        let service = create_test_service(empty_db(), account_db, empty_db(), empty_db());

        let result = service.ban_account("mod1", ban_input("admin1", None)).await;
        match result {
            Err(AppError::Forbidden(msg)) => assert_eq!(msg, "Cannot ban an administrator"),
            _ => panic!("Expected Forbidden error"),
        }
    }

    #[tokio::test]
    async fn test_ban_rejects_already_banned() {
        let moderator = create_test_account("mod1", AccountRole::Moderator, false);
        let target = create_test_account("target1", AccountRole::Member, true);
        let account_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[moderator], [target]])
                .into_connection(),
        );

        let service = create_test_service(empty_db(), account_db, empty_db(), empty_db());

        let result = service.ban_account("mod1", ban_input("target1", None)).await;
        match result {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Account is already banned"),
            _ => panic!("Expected BadRequest error"),
        }
    }

    #[tokio::test]
    async fn test_ban_rejects_empty_reason() {
        let moderator = create_test_account("mod1", AccountRole::Moderator, false);
        let target = create_test_account("target1", AccountRole::Member, false);
        let account_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[moderator], [target]])
                .into_connection(),
        );

        let service = create_test_service(empty_db(), account_db, empty_db(), empty_db());

        let input = CreateBanInput {
            account_id: "target1".to_string(),
            reason: "   ".to_string(),
            duration: None,
        };

        let result = service.ban_account("mod1", input).await;
        match result {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Ban reason is required"),
            _ => panic!("Expected BadRequest error"),
        }
    }

    #[tokio::test]
    async fn test_ban_rejects_negative_duration() {
        let moderator = create_test_account("mod1", AccountRole::Moderator, false);
        let target = create_test_account("target1", AccountRole::Member, false);
        let account_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[moderator], [target]])
                .into_connection(),
        );

        let service = create_test_service(empty_db(), account_db, empty_db(), empty_db());

        let result = service
            .ban_account("mod1", ban_input("target1", Some(-60)))
            .await;
        match result {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Ban duration must be positive"),
            _ => panic!("Expected BadRequest error"),
        }
    }

    #[tokio::test]
    async fn test_ban_hides_content_and_records() {
        let moderator = create_test_account("mod1", AccountRole::Moderator, false);
        let target = create_test_account("target1", AccountRole::Member, false);
        let ban = create_test_ban("ban1", "target1");

        let account_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[moderator], [target]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let moderation_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[ban]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 4,
                }])
                .into_connection(),
        );

        let service = create_test_service(moderation_db, account_db, post_db, empty_db());

        let ban = service
            .ban_account("mod1", ban_input("target1", None))
            .await
            .unwrap();
        assert_eq!(ban.account_id, "target1");
        assert!(ban.expires_at.is_none());
        assert!(ban.lifted_at.is_none());
    }

    #[tokio::test]
    async fn test_unban_rejects_not_banned() {
        let moderator = create_test_account("mod1", AccountRole::Moderator, false);
        let target = create_test_account("target1", AccountRole::Member, false);
        let account_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[moderator], [target]])
                .into_connection(),
        );

        let service = create_test_service(empty_db(), account_db, empty_db(), empty_db());

        let result = service.unban_account("mod1", "target1").await;
        match result {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Account is not banned"),
            _ => panic!("Expected BadRequest error"),
        }
    }

    #[tokio::test]
    async fn test_unban_restores_content() {
        let moderator = create_test_account("mod1", AccountRole::Moderator, false);
        let target = create_test_account("target1", AccountRole::Member, true);
        let ban = create_test_ban("ban1", "target1");
        let mut lifted = ban.clone();
        lifted.lifted_at = Some(Utc::now().into());
        lifted.lifted_by = Some("mod1".to_string());

        let account_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[moderator], [target]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let moderation_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[ban], [lifted]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 4,
                }])
                .into_connection(),
        );

        let service = create_test_service(moderation_db, account_db, post_db, empty_db());

        service.unban_account("mod1", "target1").await.unwrap();
    }

    #[tokio::test]
    async fn test_hide_post_requires_staff() {
        let member = create_test_account("member1", AccountRole::Member, false);
        let account_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[member]])
                .into_connection(),
        );

        let service = create_test_service(empty_db(), account_db, empty_db(), empty_db());

        let result = service.hide_post("member1", "post1").await;
        match result {
            Err(AppError::Forbidden(_)) => {}
            _ => panic!("Expected Forbidden error"),
        }
    }

    #[tokio::test]
    async fn test_flagged_posts_requires_staff() {
        let member = create_test_account("member1", AccountRole::Member, false);
        let account_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[member]])
                .into_connection(),
        );

        let service = create_test_service(empty_db(), account_db, empty_db(), empty_db());

        let result = service.flagged_posts("member1", 10, 0).await;
        match result {
            Err(AppError::Forbidden(_)) => {}
            _ => panic!("Expected Forbidden error"),
        }
    }

    #[tokio::test]
    async fn test_admin_can_moderate() {
        let admin = create_test_account("admin1", AccountRole::Administrator, false);
        let account_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[admin]])
                .into_connection(),
        );
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(empty_db(), account_db, post_db, empty_db());

        let queue = service.flagged_posts("admin1", 10, 0).await.unwrap();
        assert!(queue.is_empty());
    }
}
