//! Account registration, credential verification and token issue

use chrono::Utc;
use sha2::{Digest, Sha256};
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{Principal, PrincipalClaims, RegisterUser, Role, User},
    repository::Repository,
};

/// One-way deterministic password digest (hex-encoded SHA-256)
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new account.
    ///
    /// Anyone may create a Student account; other roles need an
    /// Administrator as `actor`.
    pub async fn register(&self, actor: Option<&Principal>, request: RegisterUser) -> AppResult<User> {
        let request = request.normalized();
        request.validate()?;

        if request.password.chars().count() < self.config.min_password_length {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                self.config.min_password_length
            )));
        }
        if request.password != request.password_confirmation {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }

        let role = request.role.unwrap_or(Role::Student);
        if role != Role::Student {
            match actor {
                Some(principal) => principal.require_admin()?,
                None => {
                    return Err(AppError::Authorization(
                        "Only administrators can create staff or administrator accounts".to_string(),
                    ))
                }
            }
        }

        let user = User {
            username: request.username,
            password_hash: hash_password(&request.password),
            full_name: request.full_name,
            email: request.email,
            role,
            created_date: Utc::now(),
        };
        self.repository.users.insert(&user).await?;

        tracing::info!(username = %user.username, role = %user.role, "Account registered");
        Ok(user)
    }

    /// Check a username/password pair, returning the account's role and name
    pub async fn verify(&self, username: &str, password: &str) -> AppResult<(Role, String)> {
        let user = self.authenticate(username, password).await?;
        Ok((user.role, user.full_name))
    }

    /// Verify credentials and issue a bearer token for the principal
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(String, Principal)> {
        let user = self.authenticate(username, password).await?;
        let principal = Principal::from(&user);

        let token = PrincipalClaims::new(&principal, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!(username = %principal.username, "User logged in");
        Ok((token, principal))
    }

    /// Resolve a bearer token into the principal it was issued for
    pub fn principal_from_token(&self, token: &str) -> AppResult<Principal> {
        PrincipalClaims::from_token(token, &self.config.jwt_secret)
            .map(PrincipalClaims::principal)
            .map_err(|e| AppError::Authentication(e.to_string()))
    }

    /// List every account (administrators only)
    pub async fn list_users(&self, principal: &Principal) -> AppResult<Vec<User>> {
        principal.require_admin()?;
        self.repository.users.list_all().await
    }

    // Unknown user and wrong password fail identically.
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<User> {
        let user = self
            .repository
            .users
            .get_by_username(username.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if user.password_hash != hash_password(password) {
            tracing::warn!(username = %user.username, "Rejected login attempt");
            return Err(AppError::InvalidCredentials);
        }
        Ok(user)
    }
}
