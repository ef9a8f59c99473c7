use crate::error::AppError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject of the token: the user's unique identifier.
    pub sub: Uuid,
    /// The user's email at the time the token was issued.
    pub email: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch) for the token.
    pub exp: usize,
}

/// Issues and validates signed session tokens carrying a user identity.
///
/// Tokens are HS256 JWTs signed with the configured secret. Validation checks the
/// signature and the `exp` claim; nothing is stored server-side.
#[derive(Clone)]
pub struct JwtHelper {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration: chrono::Duration,
}

impl std::fmt::Debug for JwtHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtHelper")
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

impl JwtHelper {
    pub fn new(secret: &str, expiration_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            // Out-of-range lifetimes collapse to zero instead of panicking.
            expiration: chrono::Duration::try_hours(expiration_hours).unwrap_or_else(chrono::Duration::zero),
        }
    }

    /// Generates a token for the given identity.
    ///
    /// # Returns
    /// A `Result` containing the JWT string if successful.
    /// Returns `AppError::InternalServerError` if the expiry overflows or encoding fails.
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, AppError> {
        let now = chrono::Utc::now();
        let expiration = now
            .checked_add_signed(self.expiration)
            .ok_or_else(|| AppError::InternalServerError("Token expiry out of range".into()))?;

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a JWT string and decodes its claims.
    ///
    /// Returns `AppError::Unauthorized` if the token is malformed, its signature is invalid, or it has expired.
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &Validation::default())?.claims;
        Ok(claims)
    }
}
