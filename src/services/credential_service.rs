use std::sync::Arc;

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::auth::{PasswordError, PasswordHasher};
use crate::database::models::{NewUser, User};
use crate::database::store::{Storage, StoreError};

#[derive(Debug, Error)]
pub enum CredentialError {
    /// Unknown user and wrong password look the same to the caller.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field contains a NUL character: {0}")]
    NulCharacter(&'static str),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Registers users and checks their passwords. Plaintext passwords are hashed
/// before they reach the store and are never logged.
#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn Storage>,
    hasher: PasswordHasher,
    /// Verified against when the username is unknown, so a miss costs one
    /// Argon2 verification like a hit does.
    dummy_hash: Arc<OnceCell<String>>,
}

impl CredentialService {
    pub fn new(users: Arc<dyn Storage>) -> Self {
        Self {
            users,
            hasher: PasswordHasher::new(),
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    async fn burn_verification(&self, password: &str) -> Result<(), CredentialError> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| async { self.hasher.hash_password("unknown-user-placeholder") })
            .await?;
        self.hasher.verify_password(password, hash)?;
        Ok(())
    }

    pub async fn register(&self, registration: Registration) -> Result<User, CredentialError> {
        let username = registration.username.trim();
        let email = registration.email.trim();
        if username.is_empty() {
            return Err(CredentialError::MissingField("username"));
        }
        if email.is_empty() {
            return Err(CredentialError::MissingField("email"));
        }
        if registration.password.is_empty() {
            return Err(CredentialError::MissingField("password"));
        }
        if username.contains('\0') {
            return Err(CredentialError::NulCharacter("username"));
        }
        if email.contains('\0') {
            return Err(CredentialError::NulCharacter("email"));
        }

        let password_hash = self.hasher.hash_password(&registration.password)?;
        let user = self
            .users
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        info!("Registered user '{}' ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, CredentialError> {
        // A NUL byte can never name a stored user
        let found = if username.contains('\0') {
            None
        } else {
            self.users.find_user_by_username(username).await?
        };
        let Some(user) = found else {
            self.burn_verification(password).await?;
            debug!("Login rejected: unknown user");
            return Err(CredentialError::InvalidCredentials);
        };

        if !self.hasher.verify_password(password, &user.password_hash)? {
            debug!("Login rejected: password mismatch for user {}", user.id);
            return Err(CredentialError::InvalidCredentials);
        }

        Ok(user)
    }
}
