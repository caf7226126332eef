//! Metrics collection for quad.
//!
//! Provides application-level metrics for monitoring performance,
//! tracking usage patterns, and debugging issues.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global metrics instance.
static METRICS: std::sync::OnceLock<Arc<Metrics>> = std::sync::OnceLock::new();

/// Get the global metrics instance.
pub fn get_metrics() -> &'static Arc<Metrics> {
    METRICS.get_or_init(|| Arc::new(Metrics::new()))
}

/// Application metrics collector.
#[derive(Debug)]
pub struct Metrics {
    // === Request Metrics ===
    /// Total HTTP requests received
    pub http_requests_total: AtomicU64,
    /// Active HTTP requests
    pub http_requests_active: AtomicU64,
    /// HTTP requests by status code category (2xx, 4xx, 5xx)
    pub http_requests_2xx: AtomicU64,
    pub http_requests_4xx: AtomicU64,
    pub http_requests_5xx: AtomicU64,
    /// Total request latency in microseconds
    pub http_request_latency_us_total: AtomicU64,
    /// Request count for average calculation
    pub http_request_latency_count: AtomicU64,

    // === Database Metrics ===
    /// Database errors that surfaced to a caller
    pub db_errors_total: AtomicU64,

    // === Content Metrics ===
    /// Accounts registered
    pub accounts_registered: AtomicU64,
    /// Posts created
    pub posts_created: AtomicU64,
    /// Votes cast (including retractions and switches)
    pub votes_cast: AtomicU64,
    /// Reports filed
    pub reports_filed: AtomicU64,
    /// Posts auto-flagged by the report threshold
    pub posts_flagged: AtomicU64,

    // === Moderation Metrics ===
    /// Account bans applied
    pub bans_applied: AtomicU64,
    /// Account bans lifted
    pub bans_lifted: AtomicU64,
    /// Identity resolutions performed
    pub identities_resolved: AtomicU64,
    /// Identity resolutions that failed the integrity check
    pub integrity_failures: AtomicU64,

    // === Job Queue Metrics ===
    /// Jobs enqueued
    pub jobs_enqueued: AtomicU64,
    /// Jobs completed
    pub jobs_completed: AtomicU64,
    /// Jobs failed
    pub jobs_failed: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            http_requests_total: AtomicU64::new(0),
            http_requests_active: AtomicU64::new(0),
            http_requests_2xx: AtomicU64::new(0),
            http_requests_4xx: AtomicU64::new(0),
            http_requests_5xx: AtomicU64::new(0),
            http_request_latency_us_total: AtomicU64::new(0),
            http_request_latency_count: AtomicU64::new(0),

            db_errors_total: AtomicU64::new(0),

            accounts_registered: AtomicU64::new(0),
            posts_created: AtomicU64::new(0),
            votes_cast: AtomicU64::new(0),
            reports_filed: AtomicU64::new(0),
            posts_flagged: AtomicU64::new(0),

            bans_applied: AtomicU64::new(0),
            bans_lifted: AtomicU64::new(0),
            identities_resolved: AtomicU64::new(0),
            integrity_failures: AtomicU64::new(0),

            jobs_enqueued: AtomicU64::new(0),
            jobs_completed: AtomicU64::new(0),
            jobs_failed: AtomicU64::new(0),
        }
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, status_code: u16, latency: Duration) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);

        match status_code {
            200..=299 => self.http_requests_2xx.fetch_add(1, Ordering::Relaxed),
            400..=499 => self.http_requests_4xx.fetch_add(1, Ordering::Relaxed),
            500..=599 => self.http_requests_5xx.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };

        self.http_request_latency_us_total
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        self.http_request_latency_count
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Start tracking an active request.
    pub fn start_request(&self) {
        self.http_requests_active.fetch_add(1, Ordering::Relaxed);
    }

    /// End tracking an active request.
    pub fn end_request(&self) {
        self.http_requests_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a database error.
    pub fn record_db_error(&self) {
        self.db_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            http_requests_total: self.http_requests_total.load(Ordering::Relaxed),
            http_requests_active: self.http_requests_active.load(Ordering::Relaxed),
            http_requests_2xx: self.http_requests_2xx.load(Ordering::Relaxed),
            http_requests_4xx: self.http_requests_4xx.load(Ordering::Relaxed),
            http_requests_5xx: self.http_requests_5xx.load(Ordering::Relaxed),
            http_request_latency_avg_us: self.average_latency_us(),

            db_errors_total: self.db_errors_total.load(Ordering::Relaxed),

            accounts_registered: self.accounts_registered.load(Ordering::Relaxed),
            posts_created: self.posts_created.load(Ordering::Relaxed),
            votes_cast: self.votes_cast.load(Ordering::Relaxed),
            reports_filed: self.reports_filed.load(Ordering::Relaxed),
            posts_flagged: self.posts_flagged.load(Ordering::Relaxed),

            bans_applied: self.bans_applied.load(Ordering::Relaxed),
            bans_lifted: self.bans_lifted.load(Ordering::Relaxed),
            identities_resolved: self.identities_resolved.load(Ordering::Relaxed),
            integrity_failures: self.integrity_failures.load(Ordering::Relaxed),

            jobs_enqueued: self.jobs_enqueued.load(Ordering::Relaxed),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
        }
    }

    /// Calculate average HTTP request latency.
    fn average_latency_us(&self) -> u64 {
        let total = self.http_request_latency_us_total.load(Ordering::Relaxed);
        let count = self.http_request_latency_count.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    /// Export metrics in Prometheus format.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut output = String::new();

        // HTTP metrics
        output.push_str("# HELP quad_http_requests_total Total HTTP requests\n");
        output.push_str("# TYPE quad_http_requests_total counter\n");
        output.push_str(&format!(
            "quad_http_requests_total {}\n",
            snapshot.http_requests_total
        ));

        output.push_str("# HELP quad_http_requests_active Active HTTP requests\n");
        output.push_str("# TYPE quad_http_requests_active gauge\n");
        output.push_str(&format!(
            "quad_http_requests_active {}\n",
            snapshot.http_requests_active
        ));

        output.push_str("# HELP quad_http_requests_by_status HTTP requests by status\n");
        output.push_str("# TYPE quad_http_requests_by_status counter\n");
        output.push_str(&format!(
            "quad_http_requests_by_status{{status=\"2xx\"}} {}\n",
            snapshot.http_requests_2xx
        ));
        output.push_str(&format!(
            "quad_http_requests_by_status{{status=\"4xx\"}} {}\n",
            snapshot.http_requests_4xx
        ));
        output.push_str(&format!(
            "quad_http_requests_by_status{{status=\"5xx\"}} {}\n",
            snapshot.http_requests_5xx
        ));

        output.push_str("# HELP quad_http_request_latency_avg_us Average request latency\n");
        output.push_str("# TYPE quad_http_request_latency_avg_us gauge\n");
        output.push_str(&format!(
            "quad_http_request_latency_avg_us {}\n",
            snapshot.http_request_latency_avg_us
        ));

        // Database metrics
        output.push_str("# HELP quad_db_errors_total Database errors\n");
        output.push_str("# TYPE quad_db_errors_total counter\n");
        output.push_str(&format!(
            "quad_db_errors_total {}\n",
            snapshot.db_errors_total
        ));

        // Content metrics
        output.push_str("# HELP quad_accounts_registered Accounts registered\n");
        output.push_str("# TYPE quad_accounts_registered counter\n");
        output.push_str(&format!(
            "quad_accounts_registered {}\n",
            snapshot.accounts_registered
        ));

        output.push_str("# HELP quad_posts_created Posts created\n");
        output.push_str("# TYPE quad_posts_created counter\n");
        output.push_str(&format!("quad_posts_created {}\n", snapshot.posts_created));

        output.push_str("# HELP quad_votes_cast Votes cast\n");
        output.push_str("# TYPE quad_votes_cast counter\n");
        output.push_str(&format!("quad_votes_cast {}\n", snapshot.votes_cast));

        output.push_str("# HELP quad_reports_filed Reports filed\n");
        output.push_str("# TYPE quad_reports_filed counter\n");
        output.push_str(&format!("quad_reports_filed {}\n", snapshot.reports_filed));

        output.push_str("# HELP quad_posts_flagged Posts auto-flagged\n");
        output.push_str("# TYPE quad_posts_flagged counter\n");
        output.push_str(&format!("quad_posts_flagged {}\n", snapshot.posts_flagged));

        // Moderation metrics
        output.push_str("# HELP quad_bans_applied Account bans applied\n");
        output.push_str("# TYPE quad_bans_applied counter\n");
        output.push_str(&format!("quad_bans_applied {}\n", snapshot.bans_applied));

        output.push_str("# HELP quad_bans_lifted Account bans lifted\n");
        output.push_str("# TYPE quad_bans_lifted counter\n");
        output.push_str(&format!("quad_bans_lifted {}\n", snapshot.bans_lifted));

        output.push_str("# HELP quad_identities_resolved Identity resolutions performed\n");
        output.push_str("# TYPE quad_identities_resolved counter\n");
        output.push_str(&format!(
            "quad_identities_resolved {}\n",
            snapshot.identities_resolved
        ));

        output.push_str("# HELP quad_integrity_failures Identity integrity check failures\n");
        output.push_str("# TYPE quad_integrity_failures counter\n");
        output.push_str(&format!(
            "quad_integrity_failures {}\n",
            snapshot.integrity_failures
        ));

        // Job queue metrics
        output.push_str("# HELP quad_jobs_enqueued Jobs enqueued\n");
        output.push_str("# TYPE quad_jobs_enqueued counter\n");
        output.push_str(&format!("quad_jobs_enqueued {}\n", snapshot.jobs_enqueued));

        output.push_str("# HELP quad_jobs_completed Jobs completed\n");
        output.push_str("# TYPE quad_jobs_completed counter\n");
        output.push_str(&format!("quad_jobs_completed {}\n", snapshot.jobs_completed));

        output.push_str("# HELP quad_jobs_failed Jobs failed\n");
        output.push_str("# TYPE quad_jobs_failed counter\n");
        output.push_str(&format!("quad_jobs_failed {}\n", snapshot.jobs_failed));

        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of all metrics at a point in time.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    // HTTP
    pub http_requests_total: u64,
    pub http_requests_active: u64,
    pub http_requests_2xx: u64,
    pub http_requests_4xx: u64,
    pub http_requests_5xx: u64,
    pub http_request_latency_avg_us: u64,

    // Database
    pub db_errors_total: u64,

    // Content
    pub accounts_registered: u64,
    pub posts_created: u64,
    pub votes_cast: u64,
    pub reports_filed: u64,
    pub posts_flagged: u64,

    // Moderation
    pub bans_applied: u64,
    pub bans_lifted: u64,
    pub identities_resolved: u64,
    pub integrity_failures: u64,

    // Jobs
    pub jobs_enqueued: u64,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
}

/// Timer guard for measuring operation duration.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration since timer start.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
