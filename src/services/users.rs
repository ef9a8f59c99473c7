use std::sync::Arc;

use uuid::Uuid;

use crate::auth::{AuthenticatedUser, PasswordEncoder};
use crate::error::{AppError, AppResult};
use crate::models::{User, UserDto, UserInput};
use crate::repository::UserRepository;

/// Account management: signup, profile reads, and self-service update/delete.
pub struct UserService {
    users: Arc<dyn UserRepository>,
    encoder: PasswordEncoder,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, encoder: PasswordEncoder) -> Self {
        Self { users, encoder }
    }

    /// Registers a new account. The password is stored as a bcrypt hash only.
    pub async fn create_user(&self, input: UserInput) -> AppResult<UserDto> {
        self.ensure_email_free(&input.email, None).await?;
        let hash = self.encoder.hash(&input.password)?;
        let user = self.users.save(User::new(&input, hash)).await?;
        log::info!("user {} registered", user.id);
        Ok(UserDto::from(&user))
    }

    pub async fn get_user(&self, id: Uuid) -> AppResult<UserDto> {
        Ok(UserDto::from(&self.load(id).await?))
    }

    pub async fn get_users(&self) -> AppResult<Vec<UserDto>> {
        let users = self.users.find_all().await?;
        Ok(users.iter().map(UserDto::from).collect())
    }

    /// Replaces the caller's own profile, password included.
    pub async fn update_user(&self, id: Uuid, input: UserInput, caller: &AuthenticatedUser) -> AppResult<UserDto> {
        ensure_self(id, caller)?;
        let mut user = self.load(id).await?;
        self.ensure_email_free(&input.email, Some(id)).await?;

        user.email = input.email;
        user.first_name = input.first_name;
        user.last_name = input.last_name;
        user.password_hash = self.encoder.hash(&input.password)?;

        let user = self.users.save(user).await?;
        log::info!("user {} updated", user.id);
        Ok(UserDto::from(&user))
    }

    /// Removes the caller's own account. Fails with `Conflict` while tasks reference it.
    pub async fn delete_user(&self, id: Uuid, caller: &AuthenticatedUser) -> AppResult<()> {
        ensure_self(id, caller)?;
        self.load(id).await?;
        self.users.delete(id).await?;
        log::info!("user {} deleted", id);
        Ok(())
    }

    async fn load(&self, id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))
    }

    async fn ensure_email_free(&self, email: &str, owner: Option<Uuid>) -> AppResult<()> {
        match self.users.find_by_email(email).await? {
            Some(existing) if Some(existing.id) != owner => {
                Err(AppError::Conflict("Email already registered".into()))
            }
            _ => Ok(()),
        }
    }
}

fn ensure_self(id: Uuid, caller: &AuthenticatedUser) -> AppResult<()> {
    if caller.id != id {
        return Err(AppError::Forbidden("You can only modify your own account".into()));
    }
    Ok(())
}
