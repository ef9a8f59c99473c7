pub mod extractors;
pub mod manager;
pub mod matcher;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use manager::AuthenticationManager;
pub use matcher::{AntMatcher, PatternError, RequestMatcher};
pub use middleware::AuthMiddleware;
pub use password::PasswordEncoder;
pub use token::{Claims, JwtHelper};

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// User's password.
    #[validate(length(min = 1))]
    pub password: String,
}

/// Response structure after a successful login.
/// Contains the JWT access token and the ID of the authenticated user.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The JWT (JSON Web Token) presented as a bearer credential.
    pub token: String,
    /// The unique identifier of the authenticated user.
    pub user_id: Uuid,
}
