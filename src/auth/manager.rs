use std::sync::Arc;

use crate::auth::password::PasswordEncoder;
use crate::auth::token::JwtHelper;
use crate::auth::AuthResponse;
use crate::error::AppError;
use crate::models::User;
use crate::repository::UserRepository;

/// Checks email/password credentials and issues tokens for the login endpoint.
pub struct AuthenticationManager {
    users: Arc<dyn UserRepository>,
    encoder: PasswordEncoder,
    tokens: Arc<JwtHelper>,
}

impl AuthenticationManager {
    pub fn new(users: Arc<dyn UserRepository>, encoder: PasswordEncoder, tokens: Arc<JwtHelper>) -> Self {
        Self {
            users,
            encoder,
            tokens,
        }
    }

    /// Resolves the user owning these credentials.
    ///
    /// Unknown emails and wrong passwords produce the same `Unauthorized` error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let invalid = || AppError::Unauthorized("Invalid credentials".into());
        let user = self.users.find_by_email(email).await?.ok_or_else(invalid)?;
        if !self.encoder.verify(password, &user.password_hash)? {
            return Err(invalid());
        }
        Ok(user)
    }

    /// Authenticates and returns a fresh token for the user.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self.authenticate(email, password).await?;
        let token = self.tokens.issue(user.id, &user.email)?;
        log::info!("user {} logged in", user.id);
        Ok(AuthResponse {
            token,
            user_id: user.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserInput;
    use crate::repository::MemoryStore;

    async fn manager_with_user() -> (AuthenticationManager, Arc<JwtHelper>) {
        let store = Arc::new(MemoryStore::new());
        let encoder = PasswordEncoder::new(4);
        let input = UserInput {
            email: "login@example.com".into(),
            first_name: "Log".into(),
            last_name: "In".into(),
            password: "password123".into(),
        };
        let user = User::new(&input, encoder.hash(&input.password).unwrap());
        store.save(user).await.unwrap();

        let tokens = Arc::new(JwtHelper::new("manager_secret", 1));
        (
            AuthenticationManager::new(store, encoder, Arc::clone(&tokens)),
            tokens,
        )
    }

    #[actix_rt::test]
    async fn test_login_issues_token_for_valid_credentials() {
        let (manager, tokens) = manager_with_user().await;
        let response = manager.login("login@example.com", "password123").await.unwrap();
        let claims = tokens.validate(&response.token).unwrap();
        assert_eq!(claims.sub, response.user_id);
        assert_eq!(claims.email, "login@example.com");
    }

    #[actix_rt::test]
    async fn test_bad_credentials_are_unauthorized() {
        let (manager, _) = manager_with_user().await;
        assert!(matches!(
            manager.login("login@example.com", "wrong").await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            manager.login("nobody@example.com", "password123").await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
