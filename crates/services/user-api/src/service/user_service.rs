//! User service - account use cases.
//!
//! Validates presence of required input, hashes passwords and delegates to
//! the repository. Nothing that fails validation reaches storage.

use async_trait::async_trait;
use std::sync::Arc;

use common::{AppError, AppResult};
use domain::{
    NewUser, Password, User, UserChanges, MSG_CREATE_FIELDS_REQUIRED, MSG_EMPTY_PASSWORD_UPDATE,
    MSG_NO_UPDATE_DATA, MSG_UPDATE_ID_REQUIRED, MSG_USER_ID_REQUIRED,
};

use crate::repository::UserRepository;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create a new account from a plaintext password
    async fn create_user(
        &self,
        name: String,
        email: String,
        plain_password: String,
    ) -> AppResult<User>;

    /// Find a user by ID. A missing user is `Ok(None)`.
    async fn find_user(&self, id: &str) -> AppResult<Option<User>>;

    /// List all users ordered by name
    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Update any subset of name, email and password
    async fn update_user(
        &self,
        id: &str,
        name: Option<String>,
        email: Option<String>,
        plain_password: Option<String>,
    ) -> AppResult<User>;

    /// Hard delete a user
    async fn remove_user(&self, id: &str) -> AppResult<()>;
}

/// Concrete implementation of UserService using repository.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
}

impl UserManager {
    /// Create new user service instance with repository
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

/// Hash on the blocking pool; Argon2 is deliberately slow.
async fn hash_password(plain_password: String) -> AppResult<String> {
    let password = tokio::task::spawn_blocking(move || Password::new(&plain_password))
        .await
        .map_err(|e| AppError::internal(format!("password hashing task failed: {}", e)))??;
    Ok(password.into_string())
}

#[async_trait]
impl UserService for UserManager {
    async fn create_user(
        &self,
        name: String,
        email: String,
        plain_password: String,
    ) -> AppResult<User> {
        if name.is_empty() || email.is_empty() || plain_password.is_empty() {
            return Err(AppError::validation(MSG_CREATE_FIELDS_REQUIRED));
        }

        let password_hash = hash_password(plain_password).await?;
        let user = self
            .repo
            .create(NewUser { name, email }, password_hash)
            .await?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    async fn find_user(&self, id: &str) -> AppResult<Option<User>> {
        if id.is_empty() {
            return Err(AppError::validation(MSG_USER_ID_REQUIRED));
        }

        tracing::debug!(user_id = %id, "Looking up user");
        self.repo.find_by_id(id).await
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.repo.list().await
    }

    async fn update_user(
        &self,
        id: &str,
        name: Option<String>,
        email: Option<String>,
        plain_password: Option<String>,
    ) -> AppResult<User> {
        if id.is_empty() {
            return Err(AppError::validation(MSG_UPDATE_ID_REQUIRED));
        }
        if matches!(plain_password.as_deref(), Some("")) {
            return Err(AppError::validation(MSG_EMPTY_PASSWORD_UPDATE));
        }

        let changes = UserChanges { name, email };
        if changes.is_empty() && plain_password.is_none() {
            return Err(AppError::validation(MSG_NO_UPDATE_DATA));
        }

        let password_hash = match plain_password {
            Some(plain) => Some(hash_password(plain).await?),
            None => None,
        };

        let user = self.repo.update(id, changes, password_hash).await?;

        tracing::info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    async fn remove_user(&self, id: &str) -> AppResult<()> {
        if id.is_empty() {
            return Err(AppError::validation(MSG_USER_ID_REQUIRED));
        }

        self.repo.delete(id).await?;

        tracing::info!(user_id = %id, "User removed");
        Ok(())
    }
}
