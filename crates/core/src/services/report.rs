//! Report service.
//!
//! Reports are one-shot per (post, pseudonym). Crossing the threshold
//! flags the post for review exactly once, whatever order concurrent
//! reports land in, and credits the flag to the author's account.

use std::sync::atomic::Ordering;

use quad_common::{AppError, AppResult, IdGenerator, get_metrics};
use quad_db::{
    entities::post_report,
    repositories::{AccountRepository, PostReportRepository, PostRepository},
};
use sea_orm::Set;
use serde::Serialize;

/// Distinct reports at which a post is flagged for review.
pub const FLAG_THRESHOLD: i32 = 3;

/// Outcome of filing a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutcome {
    pub report_count: i32,
    pub flagged: bool,
    /// True when this pseudonym had already reported the post.
    pub already_reported: bool,
}

/// Report service for filing and listing reports.
#[derive(Clone)]
pub struct ReportService {
    report_repo: PostReportRepository,
    post_repo: PostRepository,
    account_repo: AccountRepository,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub fn new(
        report_repo: PostReportRepository,
        post_repo: PostRepository,
        account_repo: AccountRepository,
    ) -> Self {
        Self {
            report_repo,
            post_repo,
            account_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// File a report against a post.
    ///
    /// Filing is idempotent per pseudonym: a duplicate changes nothing
    /// and reports the current tallies back.
    pub async fn file(&self, post_id: &str, reporter_pseudonym: &str) -> AppResult<ReportOutcome> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if self
            .report_repo
            .has_reported(post_id, reporter_pseudonym)
            .await?
        {
            return Ok(ReportOutcome {
                report_count: post.report_count,
                flagged: post.flagged,
                already_reported: true,
            });
        }

        let model = post_report::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post_id.to_string()),
            reporter_pseudonym: Set(reporter_pseudonym.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        match self.report_repo.create(model).await {
            Ok(_) => {}
            Err(AppError::Conflict(_)) => {
                // Raced against this pseudonym's own duplicate
                let fresh = self.post_repo.get_by_id(post_id).await?;
                return Ok(ReportOutcome {
                    report_count: fresh.report_count,
                    flagged: fresh.flagged,
                    already_reported: true,
                });
            }
            Err(e) => return Err(e),
        }

        self.post_repo.increment_report_count(post_id).await?;

        // Exactly one report crosses the threshold and performs the flip
        let flipped = self
            .post_repo
            .mark_flagged_if_threshold(post_id, FLAG_THRESHOLD)
            .await?;
        if flipped {
            self.bump_author_reported_count(&post.author_pseudonym, post_id)
                .await;
            get_metrics().posts_flagged.fetch_add(1, Ordering::Relaxed);
        }

        get_metrics().reports_filed.fetch_add(1, Ordering::Relaxed);

        let fresh = self.post_repo.get_by_id(post_id).await?;
        Ok(ReportOutcome {
            report_count: fresh.report_count,
            flagged: fresh.flagged,
            already_reported: false,
        })
    }

    /// Whether a pseudonym has reported a post.
    pub async fn has_reported(&self, post_id: &str, reporter_pseudonym: &str) -> AppResult<bool> {
        self.report_repo
            .has_reported(post_id, reporter_pseudonym)
            .await
    }

    /// Credit the flag to the author's account.
    ///
    /// The flag itself is already set; a failed credit is logged and
    /// absorbed rather than failing the report that caused it.
    async fn bump_author_reported_count(&self, author_pseudonym: &str, post_id: &str) {
        let author = match self.account_repo.find_by_pseudonym(author_pseudonym).await {
            Ok(Some(author)) => author,
            Ok(None) => {
                tracing::warn!(post_id = %post_id, "Flagged post has no resolvable author");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, post_id = %post_id, "Failed to look up flagged post's author");
                return;
            }
        };

        if let Err(e) = self
            .account_repo
            .increment_reported_count(&author.id)
            .await
        {
            tracing::warn!(error = %e, account_id = %author.id, "Failed to bump author reported count");
        }
    }
}
