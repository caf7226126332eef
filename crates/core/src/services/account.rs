//! Account service.

use std::sync::atomic::Ordering;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use quad_common::{AppError, AppResult, IdGenerator, get_metrics};
use quad_db::{entities::account, repositories::AccountRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Account service for registration and authentication.
#[derive(Clone)]
pub struct AccountService {
    account_repo: AccountRepository,
    id_gen: IdGenerator,
}

/// Input for registering a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountInput {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 64))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 128))]
    pub display_name: Option<String>,
}

/// Input for updating an account.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountInput {
    #[validate(length(max = 128))]
    pub display_name: Option<String>,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(account_repo: AccountRepository) -> Self {
        Self {
            account_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account.
    pub async fn register(&self, input: CreateAccountInput) -> AppResult<account::Model> {
        input.validate()?;

        // Check if the email is taken (case-insensitive)
        if self.account_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        // Check if the username is taken
        if self
            .account_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest("Username already taken".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let token = self.id_gen.generate_token();

        let model = account::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(input.email.clone()),
            email_lower: Set(input.email.to_lowercase()),
            username: Set(input.username),
            display_name: Set(input.display_name),
            password_hash: Set(password_hash),
            token: Set(token),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        let account = self.account_repo.create(model).await?;

        get_metrics()
            .accounts_registered
            .fetch_add(1, Ordering::Relaxed);

        Ok(account)
    }

    /// Get an account by ID.
    pub async fn get(&self, id: &str) -> AppResult<account::Model> {
        self.account_repo.get_by_id(id).await
    }

    /// Authenticate an account by email and password.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<account::Model> {
        let account = self
            .account_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &account.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(account)
    }

    /// Authenticate an account by API token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<account::Model> {
        self.account_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Regenerate an account's authentication token.
    pub async fn regenerate_token(&self, account_id: &str) -> AppResult<String> {
        let account = self.account_repo.get_by_id(account_id).await?;
        let new_token = self.id_gen.generate_token();

        let mut active: account::ActiveModel = account.into();
        active.token = Set(new_token.clone());
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.account_repo.update(active).await?;

        Ok(new_token)
    }

    /// Update an account's profile.
    ///
    /// Profile fields never feed pseudonym derivation, so edits here can
    /// never re-link or change an author's pseudonym.
    pub async fn update(&self, id: &str, input: UpdateAccountInput) -> AppResult<account::Model> {
        input.validate()?;

        let account = self.account_repo.get_by_id(id).await?;
        let mut active: account::ActiveModel = account.into();

        if let Some(display_name) = input.display_name {
            active.display_name = Set(Some(display_name));
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.account_repo.update(active).await
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
