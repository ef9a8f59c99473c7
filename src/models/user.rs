use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A registered account. Referenced by tasks as author and executor.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// bcrypt hash, never serialized.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(input: &UserInput, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: input.email.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// External representation of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: user.created_at,
        }
    }
}

/// Signup and profile-update payload.
#[derive(Debug, Deserialize, Validate)]
pub struct UserInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 3, max = 100))]
    pub password: String, // This password field here is for input, it won't be stored directly in User model
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn input(email: &str, password: &str) -> UserInput {
        UserInput {
            email: email.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_user_input_validation() {
        assert!(input("test@example.com", "password123").validate().is_ok());

        // Test invalid email
        assert!(input("invalid-email", "password123").validate().is_err());

        // Test short password
        assert!(input("test@example.com", "pw").validate().is_err());

        let mut blank_name = input("test@example.com", "password123");
        blank_name.first_name = String::new();
        assert!(blank_name.validate().is_err());
    }

    #[test]
    fn test_dto_hides_password_hash() {
        let user = User::new(&input("test@example.com", "password123"), "$2b$hash".into());
        let json = serde_json::to_value(UserDto::from(&user)).unwrap();
        assert_eq!(json["email"], "test@example.com");
        assert!(json.get("password_hash").is_none());
    }
}
