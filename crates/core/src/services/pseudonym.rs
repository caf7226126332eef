//! Pseudonym service.
//!
//! Owns the derive-and-cache lifecycle: an account gets its pseudonym
//! on first write and keeps it forever. The cached column is the single
//! source of truth once set; derivation only ever fills it in.

use quad_common::{AppError, AppResult, Config, pseudonym::derive_pseudonym_with_nonce};
use quad_db::{entities::account, repositories::AccountRepository};

/// Derivation attempts before a pseudonym collision is treated as fatal.
const MAX_DERIVE_ATTEMPTS: u32 = 5;

/// Pseudonym service for deriving and caching account pseudonyms.
#[derive(Clone)]
pub struct PseudonymService {
    account_repo: AccountRepository,
    secret: String,
}

impl PseudonymService {
    /// Create a new pseudonym service.
    #[must_use]
    pub fn new(account_repo: AccountRepository, config: &Config) -> Self {
        Self {
            account_repo,
            secret: config.anonymity.server_secret.clone(),
        }
    }

    /// Get the pseudonym for an account, deriving and caching it on first use.
    ///
    /// The first writer to store a pseudonym wins every race: once any
    /// call has cached a value for the account, every later call returns
    /// that value, so an author can never split across two pseudonyms.
    pub async fn ensure_pseudonym(&self, account: &account::Model) -> AppResult<String> {
        if let Some(ref pseudonym) = account.pseudonym {
            return Ok(pseudonym.clone());
        }

        for attempt in 0..MAX_DERIVE_ATTEMPTS {
            let candidate =
                derive_pseudonym_with_nonce(&account.id, &account.email, &self.secret, attempt)?;

            match self
                .account_repo
                .set_pseudonym_if_absent(&account.id, &candidate)
                .await
            {
                Ok(rows) if rows > 0 => return Ok(candidate),
                Ok(_) => {
                    // Another writer cached a pseudonym first; theirs wins.
                    let stored = self.account_repo.get_by_id(&account.id).await?;
                    return stored.pseudonym.ok_or_else(|| {
                        AppError::Internal(format!(
                            "Account {} lost the pseudonym race but has none stored",
                            account.id
                        ))
                    });
                }
                Err(AppError::Conflict(_)) => {
                    // The candidate belongs to a different account.
                    tracing::warn!(
                        account_id = %account.id,
                        attempt = attempt,
                        "Pseudonym collision, deriving with next nonce"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Internal(format!(
            "Pseudonym collision limit reached for account {}",
            account.id
        )))
    }

    /// Get the pseudonym for an account by id.
    pub async fn ensure_pseudonym_by_id(&self, account_id: &str) -> AppResult<String> {
        let account = self.account_repo.get_by_id(account_id).await?;
        self.ensure_pseudonym(&account).await
    }

    /// Check whether a pseudonym is one this account could have derived.
    ///
    /// Collisions during caching can shift an account onto a nonce
    /// attempt, so verification re-derives every attempt a writer could
    /// have persisted.
    pub fn verify_derivation(&self, account: &account::Model, pseudonym: &str) -> AppResult<bool> {
        for attempt in 0..MAX_DERIVE_ATTEMPTS {
            let candidate =
                derive_pseudonym_with_nonce(&account.id, &account.email, &self.secret, attempt)?;
            if candidate == pseudonym {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quad_common::config::{AnonymityConfig, DatabaseConfig, ServerConfig};
    use quad_common::pseudonym::{derive_pseudonym, is_valid_pseudonym};
    use quad_db::entities::account::AccountRole;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    const TEST_SECRET: &str = "test-secret-key";

    fn create_test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                url: "http://localhost:3000".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/test".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            anonymity: AnonymityConfig {
                server_secret: TEST_SECRET.to_string(),
                ban_sweep_interval_secs: 300,
            },
        }
    }

    fn create_test_account(id: &str, pseudonym: Option<&str>) -> account::Model {
        account::Model {
            id: id.to_string(),
            email: format!("{id}@college.edu"),
            email_lower: format!("{id}@college.edu"),
            username: id.to_string(),
            display_name: Some("Test Account".to_string()),
            password_hash: "$argon2id$test".to_string(),
            token: "test_token".to_string(),
            pseudonym: pseudonym.map(std::string::ToString::to_string),
            role: AccountRole::Member,
            reported_count: 0,
            is_banned: false,
            ban_expires_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_service(db: Arc<sea_orm::DatabaseConnection>) -> PseudonymService {
        let config = create_test_config();
        PseudonymService::new(AccountRepository::new(db), &config)
    }

    #[tokio::test]
    async fn test_ensure_pseudonym_returns_cached_value() {
        // No queries expected: the cached column short-circuits
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_test_service(db);

        let account = create_test_account("acc1", Some("cachedcachedcachedcachedcachedca"));

        let result = service.ensure_pseudonym(&account).await.unwrap();
        assert_eq!(result, "cachedcachedcachedcachedcachedca");
    }

    #[tokio::test]
    async fn test_ensure_pseudonym_derives_and_stores() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = create_test_service(db);

        let account = create_test_account("acc1", None);

        let result = service.ensure_pseudonym(&account).await.unwrap();
        assert!(is_valid_pseudonym(&result));
        assert_eq!(
            result,
            derive_pseudonym("acc1", "acc1@college.edu", TEST_SECRET).unwrap()
        );
    }

    #[tokio::test]
    async fn test_ensure_pseudonym_lost_race_reads_stored_value() {
        let winner = create_test_account("acc1", Some("winnerwinnerwinnerwinnerwinnerwi"));
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .append_query_results([[winner]])
                .into_connection(),
        );
        let service = create_test_service(db);

        let account = create_test_account("acc1", None);

        let result = service.ensure_pseudonym(&account).await.unwrap();
        assert_eq!(result, "winnerwinnerwinnerwinnerwinnerwi");
    }

    #[tokio::test]
    async fn test_ensure_pseudonym_lost_race_without_stored_value_fails() {
        let ghost = create_test_account("acc1", None);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .append_query_results([[ghost]])
                .into_connection(),
        );
        let service = create_test_service(db);

        let account = create_test_account("acc1", None);

        let result = service.ensure_pseudonym(&account).await;
        match result {
            Err(AppError::Internal(_)) => {}
            _ => panic!("Expected Internal error"),
        }
    }

    #[tokio::test]
    async fn test_ensure_pseudonym_by_id_loads_account() {
        let account = create_test_account("acc1", Some("storedstoredstoredstoredstoredst"));
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[account]])
                .into_connection(),
        );
        let service = create_test_service(db);

        let result = service.ensure_pseudonym_by_id("acc1").await.unwrap();
        assert_eq!(result, "storedstoredstoredstoredstoredst");
    }

    #[test]
    fn test_verify_derivation_accepts_every_nonce_attempt() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_test_service(db);
        let account = create_test_account("acc1", None);

        for attempt in 0..MAX_DERIVE_ATTEMPTS {
            let candidate = derive_pseudonym_with_nonce(
                "acc1",
                "acc1@college.edu",
                TEST_SECRET,
                attempt,
            )
            .unwrap();
            assert!(service.verify_derivation(&account, &candidate).unwrap());
        }
    }

    #[test]
    fn test_verify_derivation_rejects_foreign_pseudonym() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_test_service(db);
        let account = create_test_account("acc1", None);

        let foreign = derive_pseudonym("acc2", "acc2@college.edu", TEST_SECRET).unwrap();
        assert!(!service.verify_derivation(&account, &foreign).unwrap());
    }
}
